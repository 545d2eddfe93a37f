//! Criterion benchmarks for sustrato-core DSP primitives
//!
//! Run with: cargo bench -p sustrato-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sustrato_core::{
    BiquadChain, BiquadType, Compressor, EnvelopeFollower, FirstOrderFilter, FirstOrderType,
    ParamSmoother, SmoothingAlgorithm, lowpass_coefficients,
};

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];
const CHANNELS: usize = 2;

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("BiquadChain");

    for sections in [1, 4] {
        for &block_size in BLOCK_SIZES {
            let input = generate_test_signal(block_size);
            let mut out_l = vec![0.0f32; block_size];
            let mut out_r = vec![0.0f32; block_size];

            group.bench_with_input(
                BenchmarkId::new(format!("process_block/{sections}sec"), block_size),
                &block_size,
                |b, _| {
                    let mut chain = BiquadChain::<f32>::new();
                    chain.prepare(CHANNELS, sections, SAMPLE_RATE).unwrap();
                    for s in 0..sections {
                        chain.set_type(s, BiquadType::Peak);
                        chain.set_freq(s, 250.0 * (s + 1) as f64);
                        chain.set_gain_db(s, 3.0);
                    }
                    b.iter(|| {
                        chain.process_block(
                            &[black_box(input.as_slice()), black_box(input.as_slice())],
                            &mut [out_l.as_mut_slice(), out_r.as_mut_slice()],
                        );
                    });
                },
            );
        }
    }

    // Coefficient calculation cost
    group.bench_function("coefficient_calc", |b| {
        b.iter(|| {
            black_box(lowpass_coefficients::<f32>(
                black_box(1000.0),
                black_box(0.707),
                black_box(SAMPLE_RATE),
            ))
        });
    });

    group.finish();
}

fn bench_first_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("FirstOrderFilter");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("process", block_size),
            &block_size,
            |b, _| {
                let mut filter = FirstOrderFilter::<f32>::new();
                filter.prepare(CHANNELS, 2).unwrap();
                filter.set_section_type(0, FirstOrderType::Highpass, 0.001, 1.0);
                filter.set_section_type(1, FirstOrderType::HighShelf, 0.1, 2.0);
                b.iter(|| {
                    for &sample in &input {
                        for ch in 0..CHANNELS {
                            black_box(filter.process_sample(ch, black_box(sample)));
                        }
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_param_smoother(c: &mut Criterion) {
    let mut group = c.benchmark_group("ParamSmoother");

    for (name, algorithm) in [
        ("exponential", SmoothingAlgorithm::exponential()),
        ("exponential_order4", SmoothingAlgorithm::Exponential { order: 4 }),
        ("linear", SmoothingAlgorithm::Linear),
    ] {
        group.bench_function(name, |b| {
            let mut smoother = ParamSmoother::<f32>::new(algorithm, 20.0);
            smoother.prepare(CHANNELS, SAMPLE_RATE).unwrap();
            let mut target = 1.0;
            b.iter(|| {
                target = -target;
                smoother.set_target_all(target);
                for _ in 0..256 {
                    for ch in 0..CHANNELS {
                        black_box(smoother.next_value(ch));
                    }
                }
            });
        });
    }

    group.finish();
}

fn bench_envelope_follower(c: &mut Criterion) {
    let mut group = c.benchmark_group("EnvelopeFollower");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("process", block_size),
            &block_size,
            |b, _| {
                let mut follower = EnvelopeFollower::<f32>::new();
                follower.prepare(1, SAMPLE_RATE).unwrap();
                b.iter(|| {
                    for &sample in &input {
                        black_box(follower.process_sample(0, black_box(sample)));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_compressor(c: &mut Criterion) {
    let mut group = c.benchmark_group("Compressor");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        let mut out_l = vec![0.0f32; block_size];
        let mut out_r = vec![0.0f32; block_size];

        group.bench_with_input(
            BenchmarkId::new("process_block", block_size),
            &block_size,
            |b, _| {
                let mut comp = Compressor::<f32>::compressor(-18.0, 4.0, 6.0, 10.0, 100.0);
                comp.prepare(CHANNELS, SAMPLE_RATE).unwrap();
                b.iter(|| {
                    comp.process_block(
                        &[black_box(input.as_slice()), black_box(input.as_slice())],
                        &mut [out_l.as_mut_slice(), out_r.as_mut_slice()],
                    );
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_biquad,
    bench_first_order,
    bench_param_smoother,
    bench_envelope_follower,
    bench_compressor,
);

criterion_main!(benches);
