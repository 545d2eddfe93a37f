//! Biquad (bi-quadratic) filter sections and multi-channel cascade.
//!
//! Coefficient calculation uses the RBJ Audio EQ Cookbook formulas, evaluated
//! in `f64` and narrowed to the sample type once per design. Processing is
//! Direct Form I:
//!
//! ```text
//! y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
//!                - a1*y[n-1] - a2*y[n-2]
//! ```
//!
//! [`BiquadChain`] holds one [`BiquadSectionParams`] per section (shared by all
//! channels) and one set of delay registers per (channel, section).

use core::f64::consts::PI;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::Sample;
use crate::arena::{SectionArena, check_section};
use crate::error::{SetupError, check_sample_rate};
use crate::math::flush_denormal;

/// Smallest Q accepted by the section setters.
pub const MIN_Q: f64 = 0.025;

/// Shelf and peak gains are limited to ±this many dB.
pub const MAX_GAIN_DB: f64 = 48.0;

/// Lowest design frequency in Hz.
pub const MIN_FREQ_HZ: f64 = 1.0;

/// Design frequencies are limited to this fraction of the sample rate.
pub const MAX_FREQ_RATIO: f64 = 0.499;

/// Second-order section response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BiquadType {
    /// 12 dB/oct lowpass.
    Lowpass,
    /// 12 dB/oct highpass.
    Highpass,
    /// Bandpass with 0 dB peak gain.
    Bandpass,
    /// Band-reject.
    Notch,
    /// Peaking bell (uses gain).
    #[default]
    Peak,
    /// Unity-magnitude phase shifter.
    Allpass,
    /// Low shelf (uses gain).
    LowShelf,
    /// High shelf (uses gain).
    HighShelf,
}

impl BiquadType {
    /// Whether the response depends on the gain parameter.
    pub fn uses_gain(self) -> bool {
        matches!(self, Self::Peak | Self::LowShelf | Self::HighShelf)
    }
}

/// User-facing parameters of one section.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BiquadSectionParams {
    /// Response type.
    pub kind: BiquadType,
    /// Cutoff / center frequency in Hz.
    pub freq_hz: f64,
    /// Quality factor.
    pub q: f64,
    /// Gain in dB for peak and shelf types.
    pub gain_db: f64,
}

impl Default for BiquadSectionParams {
    fn default() -> Self {
        Self {
            kind: BiquadType::Peak,
            freq_hz: 1000.0,
            q: core::f64::consts::FRAC_1_SQRT_2,
            gain_db: 0.0,
        }
    }
}

/// Normalized biquad coefficients (`a0 = 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs<T> {
    /// Feedforward coefficient for `x[n]`.
    pub b0: T,
    /// Feedforward coefficient for `x[n-1]`.
    pub b1: T,
    /// Feedforward coefficient for `x[n-2]`.
    pub b2: T,
    /// Feedback coefficient for `y[n-1]` (subtracted).
    pub a1: T,
    /// Feedback coefficient for `y[n-2]` (subtracted).
    pub a2: T,
}

impl<T: Sample> Default for BiquadCoeffs<T> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<T: Sample> BiquadCoeffs<T> {
    /// Passthrough.
    pub fn identity() -> Self {
        Self {
            b0: T::one(),
            b1: T::zero(),
            b2: T::zero(),
            a1: T::zero(),
            a2: T::zero(),
        }
    }

    /// Normalize raw cookbook coefficients by `a0`.
    pub fn from_raw(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        let a0_inv = 1.0 / a0;
        Self {
            b0: T::from_f64(b0 * a0_inv),
            b1: T::from_f64(b1 * a0_inv),
            b2: T::from_f64(b2 * a0_inv),
            a1: T::from_f64(a1 * a0_inv),
            a2: T::from_f64(a2 * a0_inv),
        }
    }

    /// Design a section from its parameters.
    ///
    /// Frequency is clamped to `[MIN_FREQ_HZ, MAX_FREQ_RATIO · sample_rate]`,
    /// Q to `>= MIN_Q` and gain to `±MAX_GAIN_DB`. A gain-based type at
    /// exactly 0 dB yields [`identity`](Self::identity).
    pub fn design(params: &BiquadSectionParams, sample_rate: f64) -> Self {
        let freq = clamp_freq(params.freq_hz, sample_rate);
        let q = params.q.max(MIN_Q);
        let gain_db = params.gain_db.max(-MAX_GAIN_DB).min(MAX_GAIN_DB);

        match params.kind {
            BiquadType::Lowpass => lowpass_coefficients(freq, q, sample_rate),
            BiquadType::Highpass => highpass_coefficients(freq, q, sample_rate),
            BiquadType::Bandpass => bandpass_coefficients(freq, q, sample_rate),
            BiquadType::Notch => notch_coefficients(freq, q, sample_rate),
            BiquadType::Allpass => allpass_coefficients(freq, q, sample_rate),
            kind if gain_db == 0.0 && kind.uses_gain() => Self::identity(),
            BiquadType::Peak => peaking_eq_coefficients(freq, q, gain_db, sample_rate),
            BiquadType::LowShelf => low_shelf_coefficients(freq, q, gain_db, sample_rate),
            BiquadType::HighShelf => high_shelf_coefficients(freq, q, gain_db, sample_rate),
        }
    }

    /// Magnitude response at `freq_hz`.
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq_hz / sample_rate;
        let (cos1, sin1) = (libm::cos(w), libm::sin(w));
        let (cos2, sin2) = (libm::cos(2.0 * w), libm::sin(2.0 * w));
        let (b0, b1, b2) = (self.b0.as_f64(), self.b1.as_f64(), self.b2.as_f64());
        let (a1, a2) = (self.a1.as_f64(), self.a2.as_f64());

        let num_re = b0 + b1 * cos1 + b2 * cos2;
        let num_im = -(b1 * sin1 + b2 * sin2);
        let den_re = 1.0 + a1 * cos1 + a2 * cos2;
        let den_im = -(a1 * sin1 + a2 * sin2);
        libm::sqrt((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im))
    }
}

/// `(cos ω, α)` for the cookbook formulas.
#[inline]
fn clamp_freq(freq_hz: f64, sample_rate: f64) -> f64 {
    freq_hz.max(MIN_FREQ_HZ).min(MAX_FREQ_RATIO * sample_rate)
}

/// Convert a bandwidth in octaves to Q at `frequency`.
///
/// Uses the cookbook's digital relation
/// `1/Q = 2·sinh(ln 2 / 2 · BW · ω0 / sin ω0)`, so for bandpass and notch
/// sections the -3 dB points land `BW` octaves apart after bilinear warping.
/// Bandwidths are floored at 0.001 octave.
pub fn bandwidth_to_q(bandwidth_octaves: f64, frequency: f64, sample_rate: f64) -> f64 {
    let w0 = 2.0 * core::f64::consts::PI * clamp_freq(frequency, sample_rate) / sample_rate;
    let bw = bandwidth_octaves.max(1e-3);
    let x = core::f64::consts::LN_2 * 0.5 * bw * w0 / libm::sin(w0);
    (0.5 / libm::sinh(x)).max(MIN_Q)
}

fn omega_alpha(frequency: f64, q: f64, sample_rate: f64) -> (f64, f64) {
    let omega = 2.0 * PI * frequency / sample_rate;
    (libm::cos(omega), libm::sin(omega) / (2.0 * q))
}

/// Low-pass coefficients (RBJ cookbook).
pub fn lowpass_coefficients<T: Sample>(
    frequency: f64,
    q: f64,
    sample_rate: f64,
) -> BiquadCoeffs<T> {
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);
    let b1 = 1.0 - cos_omega;
    BiquadCoeffs::from_raw(
        b1 / 2.0,
        b1,
        b1 / 2.0,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
}

/// High-pass coefficients (RBJ cookbook).
pub fn highpass_coefficients<T: Sample>(
    frequency: f64,
    q: f64,
    sample_rate: f64,
) -> BiquadCoeffs<T> {
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);
    let b0 = (1.0 + cos_omega) / 2.0;
    BiquadCoeffs::from_raw(
        b0,
        -(1.0 + cos_omega),
        b0,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
}

/// Band-pass coefficients with constant 0 dB peak gain.
pub fn bandpass_coefficients<T: Sample>(
    frequency: f64,
    q: f64,
    sample_rate: f64,
) -> BiquadCoeffs<T> {
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);
    BiquadCoeffs::from_raw(alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Notch (band-reject) coefficients.
pub fn notch_coefficients<T: Sample>(frequency: f64, q: f64, sample_rate: f64) -> BiquadCoeffs<T> {
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);
    BiquadCoeffs::from_raw(
        1.0,
        -2.0 * cos_omega,
        1.0,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
}

/// All-pass coefficients.
pub fn allpass_coefficients<T: Sample>(
    frequency: f64,
    q: f64,
    sample_rate: f64,
) -> BiquadCoeffs<T> {
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);
    BiquadCoeffs::from_raw(
        1.0 - alpha,
        -2.0 * cos_omega,
        1.0 + alpha,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
}

/// Peaking EQ coefficients. Boosts or cuts `gain_db` around `frequency`.
pub fn peaking_eq_coefficients<T: Sample>(
    frequency: f64,
    q: f64,
    gain_db: f64,
    sample_rate: f64,
) -> BiquadCoeffs<T> {
    let a = libm::pow(10.0, gain_db / 40.0); // sqrt(10^(dB/20))
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);
    BiquadCoeffs::from_raw(
        1.0 + alpha * a,
        -2.0 * cos_omega,
        1.0 - alpha * a,
        1.0 + alpha / a,
        -2.0 * cos_omega,
        1.0 - alpha / a,
    )
}

/// Low-shelf coefficients: `gain_db` below `frequency`, unity above.
pub fn low_shelf_coefficients<T: Sample>(
    frequency: f64,
    q: f64,
    gain_db: f64,
    sample_rate: f64,
) -> BiquadCoeffs<T> {
    let a = libm::pow(10.0, gain_db / 40.0);
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);
    let two_sqrt_a_alpha = 2.0 * libm::sqrt(a) * alpha;
    BiquadCoeffs::from_raw(
        a * ((a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha),
        2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega),
        a * ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha),
        (a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha,
        -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega),
        (a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha,
    )
}

/// High-shelf coefficients: `gain_db` above `frequency`, unity below.
pub fn high_shelf_coefficients<T: Sample>(
    frequency: f64,
    q: f64,
    gain_db: f64,
    sample_rate: f64,
) -> BiquadCoeffs<T> {
    let a = libm::pow(10.0, gain_db / 40.0);
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);
    let two_sqrt_a_alpha = 2.0 * libm::sqrt(a) * alpha;
    BiquadCoeffs::from_raw(
        a * ((a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha),
        -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega),
        a * ((a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha),
        (a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha,
        2.0 * ((a - 1.0) - (a + 1.0) * cos_omega),
        (a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha,
    )
}

/// Direct Form I delay registers.
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState<T> {
    x1: T,
    x2: T,
    y1: T,
    y2: T,
}

impl<T: Sample> BiquadState<T> {
    #[inline]
    fn process(&mut self, c: &BiquadCoeffs<T>, input: T) -> T {
        let output =
            c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = flush_denormal(output);
        output
    }
}

/// Cascade of independently configured biquad sections for every channel.
///
/// Section parameters are shared by all channels; state is per channel.
///
/// # Example
///
/// ```rust
/// use sustrato_core::{BiquadChain, BiquadType};
///
/// let mut eq = BiquadChain::<f32>::new();
/// eq.prepare(2, 2, 48000.0).unwrap();
/// eq.set_type(0, BiquadType::Highpass);
/// eq.set_freq(0, 80.0);
/// eq.set_type(1, BiquadType::Peak);
/// eq.set_freq(1, 2500.0);
/// eq.set_gain_db(1, 3.0);
///
/// let out = eq.process_sample(0, 0.5);
/// assert!(out.is_finite());
/// ```
#[derive(Debug, Default)]
pub struct BiquadChain<T: Sample> {
    state: SectionArena<BiquadState<T>>,
    params: Vec<BiquadSectionParams>,
    coeffs: Vec<BiquadCoeffs<T>>,
    sample_rate: f64,
}

impl<T: Sample> BiquadChain<T> {
    /// Create an unprepared chain.
    pub fn new() -> Self {
        Self {
            state: SectionArena::new(),
            params: Vec::new(),
            coeffs: Vec::new(),
            sample_rate: 0.0,
        }
    }

    /// Allocate state for `channels × sections` and design every section for
    /// `sample_rate`.
    ///
    /// Parameters of sections that existed before are kept; new sections start
    /// at [`BiquadSectionParams::default`]. All delay registers are zeroed.
    pub fn prepare(
        &mut self,
        channels: usize,
        sections: usize,
        sample_rate: f64,
    ) -> Result<(), SetupError> {
        if channels == 0 {
            return Err(SetupError::NoChannels);
        }
        if sections == 0 {
            return Err(SetupError::NoSections);
        }
        check_sample_rate(sample_rate)?;

        self.sample_rate = sample_rate;
        self.state.prepare(channels, sections);
        self.params.resize(sections, BiquadSectionParams::default());
        self.coeffs.clear();
        self.coeffs.extend(
            self.params
                .iter()
                .map(|p| BiquadCoeffs::design(p, sample_rate)),
        );

        #[cfg(feature = "tracing")]
        tracing::debug!("biquad prepared: {channels} ch x {sections} sections @ {sample_rate} Hz");
        Ok(())
    }

    /// Number of prepared channels.
    pub fn channels(&self) -> usize {
        self.state.channels()
    }

    /// Number of sections per channel.
    pub fn sections(&self) -> usize {
        self.state.sections()
    }

    /// Sample rate given to the last successful `prepare`.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Parameters of `section`.
    #[track_caller]
    pub fn section_params(&self, section: usize) -> BiquadSectionParams {
        check_section(section, self.sections());
        self.params[section]
    }

    /// Coefficients currently used by `section`.
    #[track_caller]
    pub fn coeffs(&self, section: usize) -> BiquadCoeffs<T> {
        check_section(section, self.sections());
        self.coeffs[section]
    }

    /// Replace all parameters of `section`.
    #[track_caller]
    pub fn set_section(&mut self, section: usize, params: BiquadSectionParams) {
        self.update(section, |p| {
            *p = BiquadSectionParams {
                q: params.q.max(MIN_Q),
                gain_db: params.gain_db.max(-MAX_GAIN_DB).min(MAX_GAIN_DB),
                ..params
            };
        });
    }

    /// Change the response type of `section`.
    #[track_caller]
    pub fn set_type(&mut self, section: usize, kind: BiquadType) {
        self.update(section, |p| p.kind = kind);
    }

    /// Change the frequency of `section` in Hz.
    ///
    /// The stored value is clamped into the valid band when coefficients are
    /// designed, so it follows a later re-`prepare` at another sample rate.
    #[track_caller]
    pub fn set_freq(&mut self, section: usize, freq_hz: f64) {
        self.update(section, |p| p.freq_hz = freq_hz);
    }

    /// Change the Q of `section` (clamped to `>= MIN_Q`).
    #[track_caller]
    pub fn set_q(&mut self, section: usize, q: f64) {
        self.update(section, |p| p.q = q.max(MIN_Q));
    }

    /// Set the Q of `section` from a bandwidth in octaves at its current
    /// frequency (see [`bandwidth_to_q`]).
    ///
    /// The result is stored as Q, so a later frequency change keeps the Q and
    /// not the bandwidth.
    #[track_caller]
    pub fn set_bandwidth_octaves(&mut self, section: usize, octaves: f64) {
        let sample_rate = self.sample_rate;
        self.update(section, |p| p.q = bandwidth_to_q(octaves, p.freq_hz, sample_rate));
    }

    /// Change the gain of `section` in dB (clamped to `±MAX_GAIN_DB`).
    #[track_caller]
    pub fn set_gain_db(&mut self, section: usize, gain_db: f64) {
        self.update(section, |p| p.gain_db = gain_db.max(-MAX_GAIN_DB).min(MAX_GAIN_DB));
    }

    #[track_caller]
    fn update(&mut self, section: usize, edit: impl FnOnce(&mut BiquadSectionParams)) {
        check_section(section, self.sections());
        let params = &mut self.params[section];
        edit(params);
        self.coeffs[section] = BiquadCoeffs::design(params, self.sample_rate);
    }

    /// Run one sample of `channel` through every section.
    #[inline]
    #[track_caller]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        self.state
            .channel_mut(channel)
            .iter_mut()
            .zip(self.coeffs.iter())
            .fold(input, |x, (state, coeffs)| state.process(coeffs, x))
    }

    /// Process one slice per channel; identical to sequential
    /// [`process_sample`](Self::process_sample) calls.
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

    /// Zero all delay registers; parameters and coefficients are kept.
    pub fn reset(&mut self) {
        self.state.fill_default();
    }
}
