//! Multi-channel, multi-section first-order IIR filter.
//!
//! Each (channel, section) pair evaluates the direct-form difference equation
//!
//! ```text
//! y[n] = b0*x[n] + b1*x[n-1] - a1*y[n-1]
//! ```
//!
//! and sections within a channel run in cascade, each consuming the previous
//! section's output. Coefficients are installed per section (for every
//! channel) or per (channel, section); they are never smoothed here, so drive
//! time-varying designs through a [`ParamSmoother`](crate::ParamSmoother).
//!
//! The [`FirstOrderCoeffs`] constructors design lowpass, highpass, allpass
//! and shelving sections from a normalized frequency in cycles per sample
//! (`0.5` = Nyquist).

use crate::Sample;
use crate::arena::SectionArena;
use crate::error::SetupError;
use crate::math::{LEVEL_FLOOR, flush_denormal};

/// Lowest normalized frequency accepted by the design functions.
pub const MIN_NORMALIZED_FREQ: f64 = 1e-6;

/// Highest normalized frequency (Nyquist).
pub const MAX_NORMALIZED_FREQ: f64 = 0.5;

/// First-order section topology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FirstOrderType {
    /// 6 dB/oct lowpass.
    #[default]
    Lowpass,
    /// 6 dB/oct highpass.
    Highpass,
    /// Unity-magnitude phase shifter.
    Allpass,
    /// Shelf applying the gain below the corner frequency.
    LowShelf,
    /// Shelf applying the gain above the corner frequency.
    HighShelf,
}

/// Coefficients of one first-order section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstOrderCoeffs<T> {
    /// Feedforward coefficient for `x[n]`.
    pub b0: T,
    /// Feedforward coefficient for `x[n-1]`.
    pub b1: T,
    /// Feedback coefficient for `y[n-1]` (subtracted).
    pub a1: T,
}

impl<T: Sample> Default for FirstOrderCoeffs<T> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<T: Sample> FirstOrderCoeffs<T> {
    /// Coefficients from raw values.
    pub fn new(b0: T, b1: T, a1: T) -> Self {
        Self { b0, b1, a1 }
    }

    /// Passthrough: `(1, 0, 0)`.
    pub fn identity() -> Self {
        Self::new(T::one(), T::zero(), T::zero())
    }

    /// Design a section of the given topology.
    ///
    /// `gain_linear` is only used by the shelving types.
    pub fn design(kind: FirstOrderType, freq: T, gain_linear: T) -> Self {
        match kind {
            FirstOrderType::Lowpass => Self::lowpass(freq),
            FirstOrderType::Highpass => Self::highpass(freq),
            FirstOrderType::Allpass => Self::allpass(freq),
            FirstOrderType::LowShelf => Self::low_shelf(freq, gain_linear),
            FirstOrderType::HighShelf => Self::high_shelf(freq, gain_linear),
        }
    }

    /// Lowpass: `θ = 2πf`, `γ = cos θ / (1 + sin θ)`, `a1 = -γ`, `b0 = b1 = (1 - γ) / 2`.
    ///
    /// Unity gain at DC, -3 dB at `freq`. At `freq = 0.5` the pole and zero
    /// both sit at `z = -1` and the section passes the input through.
    pub fn lowpass(freq: T) -> Self {
        let theta = T::two_pi() * clamp_freq(freq);
        // |γ| ≤ 1 keeps the pole on or inside the unit circle after rounding
        let gamma = (theta.cos() / (T::one() + theta.sin())).max(-T::one()).min(T::one());
        let b = (T::one() - gamma) * T::half();
        Self::new(b, b, -gamma)
    }

    /// Highpass: `x = e^(-2πf)`, `b0 = (1 + x) / 2`, `b1 = -(1 + x) / 2`, `a1 = x`.
    pub fn highpass(freq: T) -> Self {
        let x = (-T::two_pi() * clamp_freq(freq)).exp();
        let b = (T::one() + x) * T::half();
        Self::new(b, -b, x)
    }

    /// Allpass: `x = e^(-2πf)`, `b0 = x`, `b1 = 1`, `a1 = x`.
    pub fn allpass(freq: T) -> Self {
        let x = (-T::two_pi() * clamp_freq(freq)).exp();
        Self::new(x, T::one(), x)
    }

    /// Low shelf with `gain_linear` applied below `freq`.
    ///
    /// Prewarped: `t = tan(πf)`, `s = √g`, `b0 = (g·t + s) / (t + s)`,
    /// `b1 = (g·t - s) / (t + s)`, `a1 = (t - s) / (t + s)`.
    pub fn low_shelf(freq: T, gain_linear: T) -> Self {
        let (gt, s, t, inv_denom) = shelf_terms(freq, gain_linear);
        Self::new((gt + s) * inv_denom, (gt - s) * inv_denom, (t - s) * inv_denom)
    }

    /// High shelf: the low-shelf design with `b1` negated.
    pub fn high_shelf(freq: T, gain_linear: T) -> Self {
        let low = Self::low_shelf(freq, gain_linear);
        Self::new(low.b0, -low.b1, low.a1)
    }

    /// Magnitude response `|H(e^jω)|` at normalized frequency `freq`.
    pub fn magnitude_at(&self, freq: T) -> T {
        let cos_w = (T::two_pi() * freq).cos();
        let two = T::one() + T::one();
        let num = self.b0 * self.b0 + self.b1 * self.b1 + two * self.b0 * self.b1 * cos_w;
        let den = T::one() + self.a1 * self.a1 + two * self.a1 * cos_w;
        (num / den).sqrt()
    }
}

#[inline]
fn clamp_freq<T: Sample>(freq: T) -> T {
    freq.max(T::from_f64(MIN_NORMALIZED_FREQ))
        .min(T::from_f64(MAX_NORMALIZED_FREQ))
}

/// `(g·t, s, t, 1 / (t + s))` shared by both shelves.
#[inline]
fn shelf_terms<T: Sample>(freq: T, gain_linear: T) -> (T, T, T, T) {
    let gain = gain_linear.max(T::from_f64(LEVEL_FLOOR));
    let omega_c = T::two_pi() * clamp_freq(freq);
    // at f = 0.5 the rounded angle can land just past π/2, where tan flips sign
    let t = (omega_c * T::half()).tan().abs();
    let s = gain.sqrt();
    (gain * t, s, t, T::one() / (t + s))
}

#[derive(Debug, Clone, Copy)]
struct FirstOrderSection<T> {
    coeffs: FirstOrderCoeffs<T>,
    /// x[n-1]
    x1: T,
    /// y[n-1]
    y1: T,
}

impl<T: Sample> Default for FirstOrderSection<T> {
    fn default() -> Self {
        Self {
            coeffs: FirstOrderCoeffs::identity(),
            x1: T::zero(),
            y1: T::zero(),
        }
    }
}

impl<T: Sample> FirstOrderSection<T> {
    #[inline]
    fn process(&mut self, input: T) -> T {
        let c = &self.coeffs;
        let output = c.b0 * input + c.b1 * self.x1 - c.a1 * self.y1;
        self.x1 = input;
        self.y1 = flush_denormal(output);
        output
    }

    fn clear(&mut self) {
        self.x1 = T::zero();
        self.y1 = T::zero();
    }
}

/// Cascade of first-order sections for every channel.
///
/// # Example
///
/// ```rust
/// use sustrato_core::{FirstOrderCoeffs, FirstOrderFilter};
///
/// let mut filter = FirstOrderFilter::<f32>::new();
/// filter.prepare(2, 1).unwrap();
/// filter.set_section_coeffs(0, FirstOrderCoeffs::new(0.0, 1.0, 0.0)); // one-sample delay
///
/// assert_eq!(filter.process_sample(0, 1.0), 0.0);
/// assert_eq!(filter.process_sample(0, 2.0), 1.0);
/// assert_eq!(filter.process_sample(1, 5.0), 0.0);
/// ```
#[derive(Debug, Default)]
pub struct FirstOrderFilter<T: Sample> {
    sections: SectionArena<FirstOrderSection<T>>,
}

impl<T: Sample> FirstOrderFilter<T> {
    /// Create an unprepared filter.
    pub fn new() -> Self {
        Self {
            sections: SectionArena::new(),
        }
    }

    /// Allocate `channels × sections` passthrough sections with zeroed state.
    pub fn prepare(&mut self, channels: usize, sections: usize) -> Result<(), SetupError> {
        if channels == 0 {
            return Err(SetupError::NoChannels);
        }
        if sections == 0 {
            return Err(SetupError::NoSections);
        }
        self.sections.prepare(channels, sections);

        #[cfg(feature = "tracing")]
        tracing::debug!("first_order prepared: {channels} ch x {sections} sections");
        Ok(())
    }

    /// Number of prepared channels.
    pub fn channels(&self) -> usize {
        self.sections.channels()
    }

    /// Number of sections per channel.
    pub fn sections(&self) -> usize {
        self.sections.sections()
    }

    /// Install coefficients on `section` for every channel.
    #[track_caller]
    pub fn set_section_coeffs(&mut self, section: usize, coeffs: FirstOrderCoeffs<T>) {
        for record in self.sections.section_mut(section) {
            record.coeffs = coeffs;
        }
    }

    /// Install coefficients on one (channel, section) pair.
    #[track_caller]
    pub fn set_channel_section_coeffs(
        &mut self,
        channel: usize,
        section: usize,
        coeffs: FirstOrderCoeffs<T>,
    ) {
        self.sections.get_mut(channel, section).coeffs = coeffs;
    }

    /// Design and install a topology on `section` for every channel.
    #[track_caller]
    pub fn set_section_type(
        &mut self,
        section: usize,
        kind: FirstOrderType,
        freq: T,
        gain_linear: T,
    ) {
        self.set_section_coeffs(section, FirstOrderCoeffs::design(kind, freq, gain_linear));
    }

    /// Coefficients currently installed on (channel, section).
    #[track_caller]
    pub fn section_coeffs(&self, channel: usize, section: usize) -> FirstOrderCoeffs<T> {
        self.sections.get(channel, section).coeffs
    }

    /// Run one sample of `channel` through its whole cascade.
    #[inline]
    #[track_caller]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        self.sections
            .channel_mut(channel)
            .iter_mut()
            .fold(input, |x, section| section.process(x))
    }

    /// Process one slice per channel; `inputs[ch]` feeds channel `ch`.
    ///
    /// Identical to calling [`process_sample`](Self::process_sample) for each
    /// sample in order.
    ///
    /// # Panics
    ///
    /// Panics if the input and output slice counts or lengths differ, or if
    /// there are more slices than prepared channels.
    #[track_caller]
    pub fn process_block(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        assert_eq!(inputs.len(), outputs.len(), "input/output channel count mismatch");
        for (channel, (input, output)) in inputs.iter().zip(outputs.iter_mut()).enumerate() {
            assert_eq!(input.len(), output.len(), "input/output length mismatch");
            for (x, y) in input.iter().zip(output.iter_mut()) {
                *y = self.process_sample(channel, *x);
            }
        }
    }

    /// Process one slice per channel in place.
    #[track_caller]
    pub fn process_in_place(&mut self, buffers: &mut [&mut [T]]) {
        for (channel, buffer) in buffers.iter_mut().enumerate() {
            for sample in buffer.iter_mut() {
                *sample = self.process_sample(channel, *sample);
            }
        }
    }

    /// Zero all delay registers; coefficients are kept.
    pub fn reset(&mut self) {
        for section in self.sections.iter_mut() {
            section.clear();
        }
    }
}
