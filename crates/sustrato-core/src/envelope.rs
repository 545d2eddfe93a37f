//! Envelope follower for tracking signal amplitude.
//!
//! Used as the level detector of the dynamics stage, and on its own for
//! sidechain metering and envelope-driven effects.
//!
//! The follower is a one-pole per channel with separate attack and release
//! coefficients: when the rectified input is above the stored envelope the
//! attack coefficient is used, otherwise the release coefficient.
//!
//! - [`DetectionMode::Peak`] tracks `|x|`.
//! - [`DetectionMode::Rms`] tracks `x²` and reports the square root, so both
//!   modes output a linear magnitude.

use crate::Sample;
use crate::arena::SectionArena;
use crate::error::{SetupError, check_sample_rate};
use crate::one_pole::{Ballistics, TimeScale};

/// Default attack time in milliseconds.
pub const DEFAULT_ATTACK_MS: f64 = 10.0;

/// Default release time in milliseconds.
pub const DEFAULT_RELEASE_MS: f64 = 100.0;

/// What the follower tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DetectionMode {
    /// Rectified magnitude.
    #[default]
    Peak,
    /// Root of the smoothed mean square.
    Rms,
}

/// Per-channel envelope follower.
///
/// # Example
///
/// ```rust
/// use sustrato_core::{DetectionMode, EnvelopeFollower, TimeScale};
///
/// let mut env = EnvelopeFollower::<f32>::new();
/// env.prepare(2, 48000.0).unwrap();
/// env.set_attack_time(5.0, TimeScale::RiseTime);
/// env.set_mode(DetectionMode::Rms);
///
/// let level = env.process_sample(0, 0.5);
/// assert!(level > 0.0 && level < 0.5);
/// ```
#[derive(Debug)]
pub struct EnvelopeFollower<T: Sample> {
    /// Peak: envelope level; Rms: smoothed mean square
    state: SectionArena<T>,
    ballistics: Ballistics<T>,
    mode: DetectionMode,
    sample_rate: f64,
}

impl<T: Sample> Default for EnvelopeFollower<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> EnvelopeFollower<T> {
    /// Create a peak follower with 10 ms attack and 100 ms release.
    pub fn new() -> Self {
        Self::with_times(DEFAULT_ATTACK_MS, DEFAULT_RELEASE_MS)
    }

    /// Create a peak follower with the given time constants.
    pub fn with_times(attack_ms: f64, release_ms: f64) -> Self {
        let mut ballistics = Ballistics::new(0.0, 0.0);
        ballistics.set_attack(attack_ms, TimeScale::TimeConstant);
        ballistics.set_release(release_ms, TimeScale::TimeConstant);
        Self {
            state: SectionArena::new(),
            ballistics,
            mode: DetectionMode::Peak,
            sample_rate: 0.0,
        }
    }

    /// Allocate per-channel state (zeroed) and derive coefficients.
    pub fn prepare(&mut self, channels: usize, sample_rate: f64) -> Result<(), SetupError> {
        if channels == 0 {
            return Err(SetupError::NoChannels);
        }
        check_sample_rate(sample_rate)?;
        self.sample_rate = sample_rate;
        self.state.prepare(channels, 1);
        self.ballistics.recalculate(sample_rate);

        #[cfg(feature = "tracing")]
        tracing::debug!("envelope prepared: {channels} ch @ {sample_rate} Hz, {:?}", self.mode);
        Ok(())
    }

    /// Number of prepared channels.
    pub fn channels(&self) -> usize {
        self.state.channels()
    }

    /// Set the attack time. Values `<= 0` make the attack instantaneous.
    pub fn set_attack_time(&mut self, time_ms: f64, scale: TimeScale) {
        self.ballistics.set_attack(time_ms, scale);
        self.ballistics.recalculate(self.sample_rate);
    }

    /// Set the release time. Values `<= 0` make the release instantaneous.
    pub fn set_release_time(&mut self, time_ms: f64, scale: TimeScale) {
        self.ballistics.set_release(time_ms, scale);
        self.ballistics.recalculate(self.sample_rate);
    }

    /// Attack time in milliseconds.
    pub fn attack_ms(&self) -> f64 {
        self.ballistics.attack_ms()
    }

    /// Release time in milliseconds.
    pub fn release_ms(&self) -> f64 {
        self.ballistics.release_ms()
    }

    /// Current detection mode.
    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    /// Switch detection mode, converting the stored state so the reported
    /// level does not jump.
    pub fn set_mode(&mut self, mode: DetectionMode) {
        if mode == self.mode {
            return;
        }
        for state in self.state.iter_mut() {
            *state = match mode {
                DetectionMode::Rms => *state * *state,
                DetectionMode::Peak => state.sqrt(),
            };
        }
        self.mode = mode;
    }

    /// Feed one sample of `channel`; returns the updated level (linear).
    #[inline]
    #[track_caller]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        let detected = match self.mode {
            DetectionMode::Peak => input.abs(),
            DetectionMode::Rms => input * input,
        };
        let state = self.state.get_mut(channel, 0);
        *state = self.ballistics.step(*state, detected, detected > *state);
        Self::report(self.mode, *state)
    }

    /// Current level of `channel` without advancing.
    #[track_caller]
    pub fn level(&self, channel: usize) -> T {
        Self::report(self.mode, *self.state.get(channel, 0))
    }

    /// Seed every channel with `value` (a linear level).
    pub fn reset(&mut self, value: T) {
        let seed = self.seed(value);
        for state in self.state.iter_mut() {
            *state = seed;
        }
    }

    /// Seed one channel with `value` (a linear level).
    #[track_caller]
    pub fn reset_channel(&mut self, channel: usize, value: T) {
        let seed = self.seed(value);
        *self.state.get_mut(channel, 0) = seed;
    }

    fn seed(&self, value: T) -> T {
        let level = value.abs();
        match self.mode {
            DetectionMode::Peak => level,
            DetectionMode::Rms => level * level,
        }
    }

    #[inline]
    fn report(mode: DetectionMode, state: T) -> T {
        match mode {
            DetectionMode::Peak => state,
            DetectionMode::Rms => state.sqrt(),
        }
    }
}
