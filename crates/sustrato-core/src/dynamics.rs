//! Gain control stage: level detector → gain curve → gain smoother.
//!
//! # Signal Flow
//!
//! ```text
//! input ─► LevelDetector ─► GainCurve ─► GainSmoothing ─► gain (dB)
//!  (per channel)            (shared)      (per channel)
//! ```
//!
//! The stage only computes the gain; applying it to the audio (and delaying
//! the audio for look-ahead, if wanted) is up to the caller, or done by
//! [`GainControl::process_block`].
//!
//! The three stages are traits so one skeleton serves compressors, limiters
//! and gates. [`Compressor`], [`Limiter`] and [`Gate`] name the common
//! combinations of the built-in implementors.
//!
//! The built-in compressor and limiter use an instantaneous peak detector and
//! put the attack/release ballistics on the gain smoother, in the dB domain.
//! The gate's detector holds peaks with a 0.1 ms attack and 20 ms release so
//! it does not close on the zero crossings of a signal above threshold.
//! Give the detector other times (or switch it to RMS) through
//! [`GainControl::detector_mut`].

use crate::Sample;
use crate::arena::SectionArena;
use crate::envelope::{DetectionMode, EnvelopeFollower};
use crate::error::SetupError;
use crate::gain_computer::{ExpanderCurve, GainComputer};
use crate::gain_smoother::GainSmoother;
use crate::math::db_to_linear;

/// Per-channel level detection.
pub trait LevelDetector<T: Sample> {
    /// Allocate state for `channels` at `sample_rate`.
    fn prepare(&mut self, channels: usize, sample_rate: f64) -> Result<(), SetupError>;

    /// Return every channel to silence.
    fn reset(&mut self);

    /// Feed one sample; returns the detected linear level.
    fn detect(&mut self, channel: usize, input: T) -> T;
}

/// Stateless static curve from linear level to gain change in dB.
pub trait GainCurve<T: Sample> {
    /// Gain change in dB for a linear level.
    fn gain_change_db(&self, level_linear: T) -> T;
}

/// Per-channel smoothing of the gain change.
pub trait GainSmoothing<T: Sample> {
    /// Allocate state for `channels` at `sample_rate`.
    fn prepare(&mut self, channels: usize, sample_rate: f64) -> Result<(), SetupError>;

    /// Return every channel to 0 dB.
    fn reset(&mut self);

    /// Smooth one gain value (dB).
    fn smooth(&mut self, channel: usize, gain_db: T) -> T;
}

impl<T: Sample> LevelDetector<T> for EnvelopeFollower<T> {
    fn prepare(&mut self, channels: usize, sample_rate: f64) -> Result<(), SetupError> {
        EnvelopeFollower::prepare(self, channels, sample_rate)
    }

    fn reset(&mut self) {
        EnvelopeFollower::reset(self, T::zero());
    }

    #[inline]
    fn detect(&mut self, channel: usize, input: T) -> T {
        self.process_sample(channel, input)
    }
}

impl<T: Sample> GainCurve<T> for GainComputer<T> {
    #[inline]
    fn gain_change_db(&self, level_linear: T) -> T {
        GainComputer::gain_change_db(self, level_linear)
    }
}

impl<T: Sample> GainCurve<T> for ExpanderCurve<T> {
    #[inline]
    fn gain_change_db(&self, level_linear: T) -> T {
        ExpanderCurve::gain_change_db(self, level_linear)
    }
}

impl<T: Sample> GainSmoothing<T> for GainSmoother<T> {
    fn prepare(&mut self, channels: usize, sample_rate: f64) -> Result<(), SetupError> {
        GainSmoother::prepare(self, channels, sample_rate)
    }

    fn reset(&mut self) {
        GainSmoother::reset(self, T::zero());
    }

    #[inline]
    fn smooth(&mut self, channel: usize, gain_db: T) -> T {
        self.process_sample(channel, gain_db)
    }
}

/// Feed-forward gain control over independent channels.
///
/// # Example
///
/// ```rust
/// use sustrato_core::Compressor;
///
/// let mut comp = Compressor::<f32>::compressor(-20.0, 4.0, 6.0, 5.0, 80.0);
/// comp.prepare(2, 48000.0).unwrap();
///
/// let mut gain_db = 0.0;
/// for _ in 0..48000 {
///     gain_db = comp.process_sample(0, 1.0);
/// }
/// assert!(gain_db < -10.0);
/// assert_eq!(comp.gain_db(1), 0.0);
/// ```
#[derive(Debug)]
pub struct GainControl<
    T: Sample,
    D = EnvelopeFollower<T>,
    C = GainComputer<T>,
    S = GainSmoother<T>,
> {
    detector: D,
    curve: C,
    smoother: S,
    /// Last output gain per channel (dB)
    meter: SectionArena<T>,
}

/// Detector attack of [`Gate::gate`] in milliseconds.
pub const GATE_DETECTOR_ATTACK_MS: f64 = 0.1;

/// Detector release of [`Gate::gate`] in milliseconds.
pub const GATE_DETECTOR_RELEASE_MS: f64 = 20.0;

/// Downward compressor.
pub type Compressor<T> = GainControl<T>;

/// Compressor with an infinite ratio.
///
/// Same type as [`Compressor`]; the name only documents intent. Build one
/// with [`GainControl::limiter`].
pub type Limiter<T> = GainControl<T>;

/// Gate / downward expander.
pub type Gate<T> = GainControl<T, EnvelopeFollower<T>, ExpanderCurve<T>, GainSmoother<T>>;

impl<T, D, C, S> GainControl<T, D, C, S>
where
    T: Sample,
    D: LevelDetector<T>,
    C: GainCurve<T>,
    S: GainSmoothing<T>,
{
    /// Compose a stage from its parts.
    pub fn new(detector: D, curve: C, smoother: S) -> Self {
        Self {
            detector,
            curve,
            smoother,
            meter: SectionArena::new(),
        }
    }

    /// Prepare detector and smoother for `channels` at `sample_rate`.
    pub fn prepare(&mut self, channels: usize, sample_rate: f64) -> Result<(), SetupError> {
        self.detector.prepare(channels, sample_rate)?;
        self.smoother.prepare(channels, sample_rate)?;
        self.meter.prepare(channels, 1);

        #[cfg(feature = "tracing")]
        tracing::debug!("gain control prepared: {channels} ch @ {sample_rate} Hz");
        Ok(())
    }

    /// Number of prepared channels.
    pub fn channels(&self) -> usize {
        self.meter.channels()
    }

    /// Return detector, smoother and meters to their idle state.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.smoother.reset();
        self.meter.fill_default();
    }

    /// Feed one sample of `channel`; returns the gain to apply, in dB.
    #[inline]
    #[track_caller]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        let level = self.detector.detect(channel, input);
        let target = self.curve.gain_change_db(level);
        let gain = self.smoother.smooth(channel, target);
        *self.meter.get_mut(channel, 0) = gain;
        gain
    }

    /// Like [`process_sample`](Self::process_sample), returning a linear gain.
    #[inline]
    #[track_caller]
    pub fn process_sample_linear(&mut self, channel: usize, input: T) -> T {
        db_to_linear(self.process_sample(channel, input))
    }

    /// Apply the computed gain to one slice per channel.
    ///
    /// Each channel's gain is derived from its own input, so linked-stereo
    /// behavior has to be built by the caller.
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
                *y = *x * self.process_sample_linear(channel, *x);
            }
        }
    }

    /// Gain produced by the last `process_sample` on `channel` (dB).
    #[track_caller]
    pub fn gain_db(&self, channel: usize) -> T {
        *self.meter.get(channel, 0)
    }

    /// The level detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Mutable level detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// The gain curve.
    pub fn curve(&self) -> &C {
        &self.curve
    }

    /// Mutable gain curve; changes take effect on the next sample.
    pub fn curve_mut(&mut self) -> &mut C {
        &mut self.curve
    }

    /// The gain smoother.
    pub fn smoother(&self) -> &S {
        &self.smoother
    }

    /// Mutable gain smoother.
    pub fn smoother_mut(&mut self) -> &mut S {
        &mut self.smoother
    }
}

/// Peak detector that follows the rectified input without lag.
fn instant_peak<T: Sample>() -> EnvelopeFollower<T> {
    let mut detector = EnvelopeFollower::with_times(0.0, 0.0);
    detector.set_mode(DetectionMode::Peak);
    detector
}

impl<T: Sample> GainControl<T> {
    /// Compressor with the given curve and gain ballistics.
    pub fn compressor(
        threshold_db: T,
        ratio: T,
        knee_db: T,
        attack_ms: f64,
        release_ms: f64,
    ) -> Self {
        Self::new(
            instant_peak(),
            GainComputer::new(threshold_db, ratio, knee_db),
            GainSmoother::new(attack_ms, release_ms),
        )
    }

    /// Limiter (infinite ratio) with the given knee and gain ballistics.
    pub fn limiter(threshold_db: T, knee_db: T, attack_ms: f64, release_ms: f64) -> Self {
        Self::new(
            instant_peak(),
            GainComputer::limiter(threshold_db, knee_db),
            GainSmoother::new(attack_ms, release_ms),
        )
    }
}

/// Peak detector for gating: fast attack, release spanning a low-frequency cycle.
fn gate_peak<T: Sample>() -> EnvelopeFollower<T> {
    let mut detector =
        EnvelopeFollower::with_times(GATE_DETECTOR_ATTACK_MS, GATE_DETECTOR_RELEASE_MS);
    detector.set_mode(DetectionMode::Peak);
    detector
}

impl<T: Sample> Gate<T> {
    /// Gate attenuating by `range_db` below `threshold_db`.
    ///
    /// `attack_ms` is the opening time and `release_ms` the closing time, so
    /// they land on the smoother's release and attack slots respectively.
    pub fn gate(threshold_db: T, range_db: T, attack_ms: f64, release_ms: f64) -> Self {
        Self::new(
            gate_peak(),
            ExpanderCurve::gate(threshold_db, range_db),
            GainSmoother::new(release_ms, attack_ms),
        )
    }
}
