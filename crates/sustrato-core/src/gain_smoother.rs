//! Attack/release smoothing of a gain change in the dB domain.
//!
//! The gain computer's output jumps as soon as the level crosses the
//! threshold; this stage turns it into the audible ballistics. A value below
//! the smoothed state means more gain reduction is requested and uses the
//! attack coefficient, anything else releases.

use crate::Sample;
use crate::arena::SectionArena;
use crate::error::{SetupError, check_sample_rate};
use crate::one_pole::{Ballistics, TimeScale};

/// Per-channel one-pole smoother for gain values in dB.
///
/// # Example
///
/// ```rust
/// use sustrato_core::GainSmoother;
///
/// let mut smoother = GainSmoother::<f32>::new(5.0, 50.0);
/// smoother.prepare(1, 48000.0).unwrap();
///
/// let g = smoother.process_sample(0, -6.0);
/// assert!(g < 0.0 && g > -6.0);
/// ```
#[derive(Debug)]
pub struct GainSmoother<T: Sample> {
    gain_db: SectionArena<T>,
    ballistics: Ballistics<T>,
    sample_rate: f64,
}

impl<T: Sample> Default for GainSmoother<T> {
    /// 10 ms attack, 100 ms release.
    fn default() -> Self {
        Self::new(10.0, 100.0)
    }
}

impl<T: Sample> GainSmoother<T> {
    /// Create with attack and release time constants in milliseconds.
    pub fn new(attack_ms: f64, release_ms: f64) -> Self {
        Self {
            gain_db: SectionArena::new(),
            ballistics: Ballistics::new(attack_ms.max(0.0), release_ms.max(0.0)),
            sample_rate: 0.0,
        }
    }

    /// Allocate per-channel state (0 dB) and derive coefficients.
    pub fn prepare(&mut self, channels: usize, sample_rate: f64) -> Result<(), SetupError> {
        if channels == 0 {
            return Err(SetupError::NoChannels);
        }
        check_sample_rate(sample_rate)?;
        self.sample_rate = sample_rate;
        self.gain_db.prepare(channels, 1);
        self.ballistics.recalculate(sample_rate);
        Ok(())
    }

    /// Number of prepared channels.
    pub fn channels(&self) -> usize {
        self.gain_db.channels()
    }

    /// Set the attack time (gain going down).
    pub fn set_attack_time(&mut self, time_ms: f64, scale: TimeScale) {
        self.ballistics.set_attack(time_ms, scale);
        self.ballistics.recalculate(self.sample_rate);
    }

    /// Set the release time (gain coming back up).
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

    /// Smooth one gain value (dB) for `channel`.
    #[inline]
    #[track_caller]
    pub fn process_sample(&mut self, channel: usize, gain_db: T) -> T {
        let state = self.gain_db.get_mut(channel, 0);
        *state = self.ballistics.step(*state, gain_db, gain_db < *state);
        *state
    }

    /// Current smoothed gain of `channel` in dB.
    #[track_caller]
    pub fn value(&self, channel: usize) -> T {
        *self.gain_db.get(channel, 0)
    }

    /// Seed every channel with `value_db`.
    pub fn reset(&mut self, value_db: T) {
        for state in self.gain_db.iter_mut() {
            *state = value_db;
        }
    }

    /// Seed one channel with `value_db`.
    #[track_caller]
    pub fn reset_channel(&mut self, channel: usize, value_db: T) {
        *self.gain_db.get_mut(channel, 0) = value_db;
    }
}
