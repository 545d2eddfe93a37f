//! Sustrato Core - real-time filter and dynamics substrate
//!
//! Multichannel IIR filter engines and a dynamics gain-control pipeline,
//! built on a shared per-channel, per-section state model and click-free
//! parameter smoothing. Every processor follows the same lifecycle:
//!
//! ```text
//! new() → prepare(channels, [sections,] sample_rate) → reset() → process*()
//! ```
//!
//! `prepare` is the only allocating call. Setters and `process*` never
//! allocate, never lock and never fail; out-of-range values are clamped and
//! out-of-range channel/section indices panic.
//!
//! # Components
//!
//! ## Parameter Smoothing
//!
//! - [`ParamSmoother`] - per-channel None / exponential cascade / linear ramp
//!
//! ## Filters
//!
//! - [`FirstOrderFilter`] - cascaded first-order sections ([`FirstOrderCoeffs`] designs)
//! - [`BiquadChain`] - cascaded RBJ cookbook biquads ([`BiquadType`])
//!
//! ## Dynamics
//!
//! - [`EnvelopeFollower`] - Peak / RMS level detection
//! - [`GainComputer`], [`ExpanderCurve`] - static gain curves
//! - [`GainSmoother`] - attack/release in the dB domain
//! - [`GainControl`] - the three composed; [`Compressor`], [`Limiter`], [`Gate`]
//!
//! ## Utilities
//!
//! - [`Sample`] - `f32` / `f64` abstraction
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`ms_to_samples`], [`flush_denormal`]
//! - [`settings`] - validated, optionally serializable settings structs
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc`). Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sustrato-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Features
//!
//! - `std` (default) - link the standard library
//! - `tracing` - debug/warn events from `prepare` and validation (never from `process*`)
//! - `serde` - `Serialize`/`Deserialize` for enums and settings structs
//!
//! # Example
//!
//! ```rust
//! use sustrato_core::{BiquadChain, BiquadType, Compressor, ParamSmoother, SmoothingAlgorithm};
//!
//! let sample_rate = 48000.0;
//! let mut eq = BiquadChain::<f32>::new();
//! eq.prepare(2, 1, sample_rate).unwrap();
//! eq.set_type(0, BiquadType::Lowpass);
//!
//! let mut cutoff = ParamSmoother::<f32>::new(SmoothingAlgorithm::exponential(), 20.0);
//! cutoff.prepare(1, sample_rate).unwrap();
//! cutoff.reset_to(1000.0);
//! cutoff.set_target(0, 4000.0);
//!
//! let mut comp = Compressor::<f32>::compressor(-18.0, 4.0, 6.0, 10.0, 100.0);
//! comp.prepare(2, sample_rate).unwrap();
//!
//! for n in 0..256 {
//!     eq.set_freq(0, f64::from(cutoff.next_value(0)));
//!     for ch in 0..2 {
//!         let x = if n % 64 == 0 { 1.0 } else { 0.0 };
//!         let filtered = eq.process_sample(ch, x);
//!         let _out = filtered * comp.process_sample_linear(ch, filtered);
//!     }
//! }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in processing paths
//! - **No dependencies on std**: `no_std` + `alloc`, `libm` for math
//! - **Static dispatch**: closed enums for variants, generics for the dynamics stages
//! - **Owned, not shared**: processors are not `Clone`; mutation needs `&mut self`

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod arena;
pub mod biquad;
pub mod dynamics;
pub mod envelope;
pub mod error;
pub mod first_order;
pub mod gain_computer;
pub mod gain_smoother;
pub mod math;
pub mod one_pole;
pub mod sample;
pub mod settings;
pub mod smoother;

// Re-export main types at crate root
pub use arena::SectionArena;
pub use biquad::{
    BiquadChain, BiquadCoeffs, BiquadSectionParams, BiquadType, MIN_Q, allpass_coefficients,
    bandpass_coefficients, bandwidth_to_q, high_shelf_coefficients, highpass_coefficients,
    low_shelf_coefficients, lowpass_coefficients, notch_coefficients, peaking_eq_coefficients,
};
pub use dynamics::{
    Compressor, GainControl, GainCurve, GainSmoothing, Gate, LevelDetector, Limiter,
};
pub use envelope::{DetectionMode, EnvelopeFollower};
pub use error::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE, SetupError};
pub use first_order::{FirstOrderCoeffs, FirstOrderFilter, FirstOrderType};
pub use gain_computer::{ExpanderCurve, GainComputer};
pub use gain_smoother::GainSmoother;
pub use math::{LEVEL_FLOOR, db_to_linear, flush_denormal, linear_to_db, ms_to_samples};
pub use one_pole::{Ballistics, TimeScale, decay_coeff};
pub use sample::Sample;
pub use settings::{BiquadSectionSettings, DynamicsSettings, SmootherSettings};
pub use smoother::{MAX_SMOOTHING_ORDER, ParamSmoother, SmoothingAlgorithm};
