//! Mathematical utility functions for DSP.
//!
//! Level conversions and time helpers shared by the filter and dynamics
//! modules. All functions are allocation-free and `no_std` friendly.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Utilities
//!
//! - [`ms_to_samples`] - Time conversion
//! - [`flush_denormal`] - Subnormal protection for feedback registers

use crate::Sample;

/// Floor applied to linear levels before taking the logarithm.
///
/// Corresponds to -200 dB, far below any audible level, and keeps silence
/// from producing `-inf`.
pub const LEVEL_FLOOR: f64 = 1e-10;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use sustrato_core::db_to_linear;
///
/// assert!((db_to_linear(0.0f32) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02f32) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear<T: Sample>(db: T) -> T {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    (db * (T::LN_10() / T::from_f64(20.0))).exp()
}

/// Convert linear gain to decibels.
///
/// Magnitudes below [`LEVEL_FLOOR`] (including zero) are floored, so the
/// result is always finite.
///
/// # Example
/// ```rust
/// use sustrato_core::linear_to_db;
///
/// assert!(linear_to_db(1.0f32).abs() < 0.001);
/// assert!((linear_to_db(0.5f32) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db<T: Sample>(linear: T) -> T {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    linear.max(T::from_f64(LEVEL_FLOOR)).ln() * (T::from_f64(20.0) / T::LN_10())
}

/// Convert milliseconds to (fractional) samples.
#[inline]
pub fn ms_to_samples(ms: f64, sample_rate: f64) -> f64 {
    ms * sample_rate / 1000.0
}

/// Flush subnormal (denormalized) floats to zero.
///
/// Subnormals cause severe slowdowns on most CPUs. Values below 1e-20 are
/// replaced with zero, leaving margin above the IEEE 754 subnormal range.
/// Applied to filter feedback registers, never to returned outputs.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal<T: Sample>(x: T) -> T {
    if x.abs() < T::from_f64(1e-20) {
        T::zero()
    } else {
        x
    }
}
