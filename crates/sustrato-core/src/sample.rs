//! Sample precision abstraction.
//!
//! Every processor in this crate is generic over a [`Sample`] type so one
//! processing graph can run entirely in `f32` (the usual choice for real-time
//! audio) or entirely in `f64` (for long feedback chains or very low cutoffs).
//! The precision is fixed when the processor is constructed and never mixed
//! inside a single instance.
//!
//! Transcendental functions come from [`num_traits::Float`], which routes to
//! `std` or to `libm` depending on the `std` feature, so the crate stays
//! `no_std` compatible.

use core::fmt::Debug;
use num_traits::{Float, FloatConst};

/// Floating-point sample type used throughout the crate.
///
/// Implemented for `f32` and `f64`. The trait is sealed in practice by the
/// conversion methods, which only make sense for IEEE binary floats.
///
/// # Example
///
/// ```rust
/// use sustrato_core::Sample;
///
/// fn half<T: Sample>(x: T) -> T {
///     x * T::from_f64(0.5)
/// }
///
/// assert_eq!(half(3.0f32), 1.5);
/// assert_eq!(half(3.0f64), 1.5);
/// ```
pub trait Sample: Float + FloatConst + Default + Debug + Send + Sync + 'static {
    /// Convert from an `f64` constant, rounding to the nearest representable value.
    fn from_f64(value: f64) -> Self;

    /// Widen to `f64`.
    fn as_f64(self) -> f64;

    /// `2π` in this precision.
    #[inline]
    fn two_pi() -> Self {
        Self::PI() + Self::PI()
    }

    /// `0.5` in this precision.
    #[inline]
    fn half() -> Self {
        Self::from_f64(0.5)
    }
}

impl Sample for f32 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Sample for f64 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_round_trip() {
        assert_eq!(<f32 as Sample>::from_f64(0.25), 0.25f32);
        assert_eq!(<f64 as Sample>::from_f64(0.25), 0.25f64);
        assert_eq!(1.5f32.as_f64(), 1.5);
    }

    #[test]
    fn two_pi_matches_tau() {
        assert!((<f32 as Sample>::two_pi() - core::f32::consts::TAU).abs() < 1e-6);
        assert!((<f64 as Sample>::two_pi() - core::f64::consts::TAU).abs() < 1e-12);
    }
}
