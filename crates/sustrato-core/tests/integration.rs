//! Integration tests for sustrato-core DSP primitives.
//!
//! Tests cross-module interactions and verifies DSP accuracy using signal-level
//! measurements: sine wave analysis for filters, exact difference-equation
//! checks for first-order sections, smoother timing, and dynamics
//! ballistics with the gain stage driving real audio.

use sustrato_core::{
    BiquadChain, BiquadType, Compressor, DetectionMode, EnvelopeFollower, FirstOrderCoeffs,
    FirstOrderFilter, FirstOrderType, GainComputer, GainSmoother, Gate, ParamSmoother,
    SmoothingAlgorithm, TimeScale, db_to_linear,
};

const SAMPLE_RATE: f64 = 48000.0;
const TAU: f64 = core::f64::consts::TAU;

/// Generate a sine wave buffer at the given frequency and sample rate.
fn generate_sine(freq_hz: f64, sample_rate: f64, num_samples: usize) -> Vec<f64> {
    (0..num_samples)
        .map(|n| libm::sin(TAU * freq_hz * n as f64 / sample_rate))
        .collect()
}

/// Measure RMS amplitude of a signal buffer.
fn rms(signal: &[f64]) -> f64 {
    let sum_sq: f64 = signal.iter().map(|&s| s * s).sum();
    libm::sqrt(sum_sq / signal.len() as f64)
}

/// Convert linear amplitude to dB.
fn to_db(linear: f64) -> f64 {
    20.0 * libm::log10(linear.max(1e-10))
}

/// Feed a sine through `process` after a reset and return the settled gain in dB.
fn measure_response(mut process: impl FnMut(f64) -> f64, freq_hz: f64) -> f64 {
    let num_samples = 9600;
    let settle_samples = 4800;
    let input = generate_sine(freq_hz, SAMPLE_RATE, num_samples);
    let output: Vec<f64> = input.iter().map(|&s| process(s)).collect();
    to_db(rms(&output[settle_samples..]) / rms(&input[settle_samples..]))
}

// ============================================================================
// 1. Filter frequency responses
// ============================================================================

fn biquad(kind: BiquadType, freq: f64, gain_db: f64) -> BiquadChain<f64> {
    let mut chain = BiquadChain::new();
    chain.prepare(1, 1, SAMPLE_RATE).unwrap();
    chain.set_type(0, kind);
    chain.set_freq(0, freq);
    chain.set_q(0, core::f64::consts::FRAC_1_SQRT_2);
    chain.set_gain_db(0, gain_db);
    chain
}

#[test]
fn biquad_lowpass_frequency_response() {
    let mut chain = biquad(BiquadType::Lowpass, 1000.0, 0.0);

    for &freq in &[50.0, 100.0, 200.0] {
        chain.reset();
        let gain_db = measure_response(|x| chain.process_sample(0, x), freq);
        assert!(
            gain_db.abs() < 0.5,
            "Lowpass passband: {freq} Hz should be ~0 dB, got {gain_db:.2} dB"
        );
    }

    for &freq in &[4000.0, 8000.0, 16000.0] {
        chain.reset();
        let gain_db = measure_response(|x| chain.process_sample(0, x), freq);
        assert!(
            gain_db < -20.0,
            "Lowpass stopband: {freq} Hz should be attenuated, got {gain_db:.1} dB"
        );
    }

    chain.reset();
    let at_cutoff = measure_response(|x| chain.process_sample(0, x), 1000.0);
    assert!(
        (at_cutoff + 3.0).abs() < 0.2,
        "Lowpass at cutoff: expected ~-3 dB, got {at_cutoff:.2} dB"
    );
}

#[test]
fn biquad_highpass_frequency_response() {
    let mut chain = biquad(BiquadType::Highpass, 2000.0, 0.0);

    for &freq in &[8000.0, 12000.0, 16000.0] {
        chain.reset();
        let gain_db = measure_response(|x| chain.process_sample(0, x), freq);
        assert!(gain_db.abs() < 0.5, "Highpass passband: {freq} Hz got {gain_db:.2} dB");
    }

    for &freq in &[100.0, 200.0, 500.0] {
        chain.reset();
        let gain_db = measure_response(|x| chain.process_sample(0, x), freq);
        assert!(gain_db < -20.0, "Highpass stopband: {freq} Hz got {gain_db:.1} dB");
    }
}

#[test]
fn biquad_peak_matches_analytic_response() {
    let mut chain = biquad(BiquadType::Peak, 2000.0, 9.0);
    let coeffs = chain.coeffs(0);
    for &freq in &[300.0, 2000.0, 7000.0] {
        chain.reset();
        let measured = measure_response(|x| chain.process_sample(0, x), freq);
        let analytic = to_db(coeffs.magnitude_at(freq, SAMPLE_RATE));
        assert!(
            (measured - analytic).abs() < 0.1,
            "Peak at {freq} Hz: measured {measured:.2} dB, analytic {analytic:.2} dB"
        );
    }
}

#[test]
fn biquad_cascade_doubles_slope() {
    let mut single = biquad(BiquadType::Lowpass, 1000.0, 0.0);
    let mut double = BiquadChain::<f64>::new();
    double.prepare(1, 2, SAMPLE_RATE).unwrap();
    for section in 0..2 {
        double.set_type(section, BiquadType::Lowpass);
        double.set_freq(section, 1000.0);
        double.set_q(section, core::f64::consts::FRAC_1_SQRT_2);
    }

    let one = measure_response(|x| single.process_sample(0, x), 8000.0);
    let two = measure_response(|x| double.process_sample(0, x), 8000.0);
    assert!((two - 2.0 * one).abs() < 0.5, "cascade: {one:.1} dB x2 != {two:.1} dB");
}

#[test]
fn first_order_lowpass_frequency_response() {
    let cutoff = 1000.0;
    let mut filter = FirstOrderFilter::<f64>::new();
    filter.prepare(1, 1).unwrap();
    filter.set_section_type(0, FirstOrderType::Lowpass, cutoff / SAMPLE_RATE, 1.0);

    let low = measure_response(|x| filter.process_sample(0, x), 50.0);
    assert!(low.abs() < 0.1, "first-order passband got {low:.2} dB");

    filter.reset();
    let at_cutoff = measure_response(|x| filter.process_sample(0, x), cutoff);
    assert!((at_cutoff + 3.0).abs() < 0.2, "first-order cutoff got {at_cutoff:.2} dB");

    // 6 dB/oct: one octave up from 4 kHz loses roughly 6 dB more
    filter.reset();
    let a = measure_response(|x| filter.process_sample(0, x), 4000.0);
    filter.reset();
    let b = measure_response(|x| filter.process_sample(0, x), 8000.0);
    assert!(b < a - 4.0, "first-order slope: {a:.1} dB -> {b:.1} dB");
}

#[test]
fn first_order_shelves_frequency_response() {
    let gain = db_to_linear(6.0);
    let mut low = FirstOrderFilter::<f64>::new();
    low.prepare(1, 1).unwrap();
    low.set_section_type(0, FirstOrderType::LowShelf, 200.0 / SAMPLE_RATE, gain);

    let bass = measure_response(|x| low.process_sample(0, x), 20.0);
    assert!((bass - 6.0).abs() < 0.3, "low shelf at 20 Hz got {bass:.2} dB");
    low.reset();
    let treble = measure_response(|x| low.process_sample(0, x), 15000.0);
    assert!(treble.abs() < 0.3, "low shelf at 15 kHz got {treble:.2} dB");

    let mut allpass = FirstOrderFilter::<f64>::new();
    allpass.prepare(1, 1).unwrap();
    allpass.set_section_type(0, FirstOrderType::Allpass, 0.05, 1.0);
    let flat = measure_response(|x| allpass.process_sample(0, x), 3000.0);
    assert!(flat.abs() < 0.05, "allpass got {flat:.3} dB");
}

// ============================================================================
// 2. First-order difference-equation contracts
// ============================================================================

#[test]
fn first_order_reference_sequences() {
    let cases: [(FirstOrderCoeffs<f64>, [f64; 3], [f64; 3]); 3] = [
        (FirstOrderCoeffs::new(0.5, 0.0, 0.0), [2.0, -4.0, 1.0], [1.0, -2.0, 0.5]),
        (FirstOrderCoeffs::new(0.0, 1.0, 0.0), [1.0, 2.0, 3.0], [0.0, 1.0, 2.0]),
        (FirstOrderCoeffs::new(1.0, 0.0, -0.5), [1.0, 0.0, 0.0], [1.0, 0.5, 0.25]),
    ];

    for (coeffs, input, expected) in cases {
        let mut filter = FirstOrderFilter::new();
        filter.prepare(3, 1).unwrap();
        filter.set_section_coeffs(0, coeffs);
        filter.reset();
        for ch in 0..3 {
            let out: Vec<f64> = input.iter().map(|&x| filter.process_sample(ch, x)).collect();
            assert_eq!(out, expected, "coeffs {coeffs:?} on channel {ch}");
        }
    }
}

#[test]
fn first_order_silence_for_all_shapes() {
    for channels in 1..=4 {
        for sections in 1..=4 {
            let mut filter = FirstOrderFilter::<f32>::new();
            filter.prepare(channels, sections).unwrap();
            filter.reset();
            for ch in 0..channels {
                for _ in 0..8 {
                    assert_eq!(filter.process_sample(ch, 0.0), 0.0);
                }
            }
        }
    }
}

// ============================================================================
// 3. Parameter smoother timing
// ============================================================================

#[test]
fn linear_smoother_exact_after_duration() {
    let mut smoother = ParamSmoother::<f32>::new(SmoothingAlgorithm::Linear, 10.0);
    smoother.prepare(1, SAMPLE_RATE).unwrap();
    smoother.set_target(0, 1.0);
    for n in 1..480 {
        let v = smoother.next_value(0);
        assert!(v < 1.0, "linear ramp arrived early at sample {n}");
    }
    assert_eq!(smoother.next_value(0), 1.0);
    assert!(!smoother.is_smoothing(0));
}

#[test]
fn exponential_smoother_five_time_constants() {
    let mut smoother = ParamSmoother::<f64>::new(SmoothingAlgorithm::exponential(), 10.0);
    smoother.prepare(1, SAMPLE_RATE).unwrap();
    smoother.set_target(0, 1.0);
    let v = smoother.skip(0, 5 * 480);
    assert!(v > 0.99, "after 5 tau got {v}");
}

#[test]
fn higher_order_smoothing_is_slower() {
    let mut first = ParamSmoother::<f64>::new(SmoothingAlgorithm::Exponential { order: 1 }, 10.0);
    let mut second = ParamSmoother::<f64>::new(SmoothingAlgorithm::Exponential { order: 2 }, 10.0);
    first.prepare(1, SAMPLE_RATE).unwrap();
    second.prepare(1, SAMPLE_RATE).unwrap();
    first.set_target(0, 1.0);
    second.set_target(0, 1.0);
    for _ in 0..480 {
        assert!(second.next_value(0) < first.next_value(0));
    }
}

#[test]
fn smoothed_cutoff_sweep_is_click_free() {
    let mut cutoff = ParamSmoother::<f64>::new(SmoothingAlgorithm::Exponential { order: 2 }, 20.0);
    cutoff.prepare(1, SAMPLE_RATE).unwrap();
    cutoff.reset_to(200.0);
    cutoff.set_target(0, 8000.0);

    let mut chain = biquad(BiquadType::Lowpass, 200.0, 0.0);
    let input = generate_sine(440.0, SAMPLE_RATE, 9600);
    let mut previous = 0.0;
    let mut max_jump: f64 = 0.0;
    for &x in &input {
        chain.set_freq(0, cutoff.next_value(0));
        let y = chain.process_sample(0, x);
        max_jump = max_jump.max((y - previous).abs());
        previous = y;
    }
    // a 440 Hz unit sine moves at most 2π·440/48000 ≈ 0.058 per sample
    assert!(max_jump < 0.08, "sweep produced a step of {max_jump}");
}

// ============================================================================
// 4. Dynamics
// ============================================================================

#[test]
fn gain_computer_reference_point() {
    let hard = GainComputer::<f64>::new(-10.0, 4.0, 0.0);
    assert_eq!(hard.compute_db(0.0), -7.5);
    assert_eq!(hard.compute_db(-15.0), 0.0);

    let soft = GainComputer::<f64>::new(-10.0, 4.0, 10.0);
    let at_threshold = soft.compute_db(-10.0);
    assert!(at_threshold < 0.0 && at_threshold > -7.5);
}

#[test]
fn gain_smoother_monotone_and_settles() {
    let mut smoother = GainSmoother::<f64>::new(2.0, 40.0);
    smoother.prepare(1, SAMPLE_RATE).unwrap();

    let mut last = 0.0;
    for _ in 0..9600 {
        let g = smoother.process_sample(0, -10.0);
        assert!(g <= last);
        last = g;
    }
    assert!((last + 10.0).abs() < 0.1);

    for _ in 0..48_000 {
        let g = smoother.process_sample(0, 0.0);
        assert!(g >= last);
        last = g;
    }
    assert!(last.abs() < 0.1);
}

#[test]
fn envelope_modes() {
    let mut env = EnvelopeFollower::<f64>::new();
    env.prepare(1, SAMPLE_RATE).unwrap();
    env.set_mode(DetectionMode::Rms);
    let mut level = 0.0;
    for _ in 0..48_000 {
        level = env.process_sample(0, 1.0);
    }
    assert!((level - 1.0).abs() < 1e-6);

    env.set_mode(DetectionMode::Peak);
    env.set_release_time(50.0, TimeScale::RiseTime);
    let mut last = env.level(0);
    for _ in 0..4800 {
        let l = env.process_sample(0, 0.0);
        assert!(l < last);
        last = l;
    }
}

#[test]
fn compressor_reduces_loud_sine() {
    let mut comp = Compressor::<f64>::compressor(-20.0, 4.0, 0.0, 1.0, 100.0);
    comp.prepare(1, SAMPLE_RATE).unwrap();

    let input = generate_sine(1000.0, SAMPLE_RATE, 48_000);
    let mut output = vec![0.0; input.len()];
    comp.process_block(&[input.as_slice()], &mut [output.as_mut_slice()]);

    // peak 0 dB, 20 dB over: settles near -15 dB of gain
    let reduction = to_db(rms(&output[24_000..]) / rms(&input[24_000..]));
    assert!(
        reduction < -12.0 && reduction > -16.0,
        "compressor gain on a 0 dBFS sine: {reduction:.1} dB"
    );
    assert!(comp.gain_db(0) < -12.0);
}

#[test]
fn gate_silences_noise_floor() {
    let mut gate = Gate::<f64>::gate(-40.0, 80.0, 0.5, 20.0);
    gate.prepare(1, SAMPLE_RATE).unwrap();

    let quiet: Vec<f64> = generate_sine(200.0, SAMPLE_RATE, 24_000)
        .into_iter()
        .map(|s| s * 0.001)
        .collect();
    let mut out = vec![0.0; quiet.len()];
    gate.process_block(&[quiet.as_slice()], &mut [out.as_mut_slice()]);
    assert!(rms(&out[12_000..]) < rms(&quiet[12_000..]) * 1e-3);
}

#[test]
fn gate_passes_signal_above_threshold() {
    let mut gate = Gate::<f64>::gate(-40.0, 80.0, 0.5, 20.0);
    gate.prepare(1, SAMPLE_RATE).unwrap();

    // -26 dBFS, 14 dB over the threshold
    let input: Vec<f64> = generate_sine(200.0, SAMPLE_RATE, 48_000)
        .into_iter()
        .map(|s| s * 0.05)
        .collect();
    let mut output = vec![0.0; input.len()];
    gate.process_block(&[input.as_slice()], &mut [output.as_mut_slice()]);

    for (n, (x, y)) in input.iter().zip(&output).enumerate().skip(4800) {
        assert!((y - x).abs() <= x.abs() * 0.012, "sample {n} attenuated: {x} -> {y}");
    }
    assert_eq!(gate.gain_db(0), 0.0);
}

// ============================================================================
// 5. Channel independence across components
// ============================================================================

#[test]
fn channel_independence() {
    let mut first_order = FirstOrderFilter::<f64>::new();
    first_order.prepare(2, 2).unwrap();
    first_order.set_section_type(0, FirstOrderType::Lowpass, 0.01, 1.0);

    let mut chain = BiquadChain::<f64>::new();
    chain.prepare(2, 1, SAMPLE_RATE).unwrap();
    chain.set_type(0, BiquadType::Bandpass);

    let mut smoother = ParamSmoother::<f64>::new(SmoothingAlgorithm::exponential(), 5.0);
    smoother.prepare(2, SAMPLE_RATE).unwrap();

    let mut comp = Compressor::<f64>::compressor(-30.0, 4.0, 6.0, 1.0, 50.0);
    comp.prepare(2, SAMPLE_RATE).unwrap();

    // Drive channel 0 hard, leave channel 1 idle
    smoother.set_target(0, 1.0);
    for x in generate_sine(500.0, SAMPLE_RATE, 4800) {
        first_order.process_sample(0, x);
        chain.process_sample(0, x);
        smoother.next_value(0);
        comp.process_sample(0, x);
    }

    assert_eq!(first_order.process_sample(1, 0.0), 0.0);
    assert_eq!(chain.process_sample(1, 0.0), 0.0);
    assert_eq!(smoother.next_value(1), 0.0);
    assert_eq!(comp.process_sample(1, 0.0), 0.0);
}
