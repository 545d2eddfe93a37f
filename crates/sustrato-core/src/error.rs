//! Setup-time error type.
//!
//! Only configuration that happens off the audio thread can fail with a
//! [`SetupError`]: preparing a processor or validating a settings struct.
//! Index misuse on the process path is a caller bug and panics instead, and
//! numeric edge cases (zero ratio, negative times) are clamped by the setters.

use thiserror::Error;

/// Lowest sample rate accepted by `prepare`, in Hz.
pub const MIN_SAMPLE_RATE: f64 = 1_000.0;

/// Highest sample rate accepted by `prepare`, in Hz.
pub const MAX_SAMPLE_RATE: f64 = 1_536_000.0;

/// Errors reported by `prepare` and settings validation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SetupError {
    /// A processor must have at least one channel.
    #[error("channel count must be at least 1")]
    NoChannels,

    /// A filter chain must have at least one section.
    #[error("section count must be at least 1")]
    NoSections,

    /// Sample rate outside [`MIN_SAMPLE_RATE`]..=[`MAX_SAMPLE_RATE`] or not finite.
    #[error("sample rate {0} Hz is outside the supported range")]
    SampleRate(f64),

    /// Cascade order for exponential smoothing outside `1..=8`.
    #[error("smoothing order {0} is outside 1..=8")]
    SmoothingOrder(u8),

    /// A settings field holds NaN or an infinity where a finite value is required.
    #[error("parameter '{name}' must be finite, got {value}")]
    NonFinite {
        /// Name of the offending field.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Validate a sample rate against the supported range.
pub fn check_sample_rate(sample_rate: f64) -> Result<(), SetupError> {
    if sample_rate.is_finite() && (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
        Ok(())
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!("rejected sample rate {sample_rate} Hz");
        Err(SetupError::SampleRate(sample_rate))
    }
}

/// Validate that a settings value is finite.
pub fn check_finite(name: &'static str, value: f64) -> Result<(), SetupError> {
    if value.is_finite() {
        Ok(())
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!("rejected non-finite parameter {name} = {value}");
        Err(SetupError::NonFinite { name, value })
    }
}
