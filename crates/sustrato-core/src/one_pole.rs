//! One-pole ballistics shared by the smoothing and dynamics stages.
//!
//! A single-pole IIR lowpass with the difference equation:
//!
//! ```text
//! y[n] = coeff * y[n-1] + (1 - coeff) * x[n]
//! ```
//!
//! where `coeff = exp(-1 / (tau * sample_rate))`. After one time constant
//! `tau` the step response has covered 1 - e^-1 ≈ 63.2% of the distance to
//! the input, after 5·tau about 99.3%.
//!
//! [`Ballistics`] pairs two such coefficients (attack and release) and picks
//! one per sample depending on the direction of travel. The envelope follower
//! and the gain smoother are both built on it; they only differ in which
//! direction counts as "attack".
//!
//! # Reference
//!
//! Julius O. Smith III, "Introduction to Digital Filters with Audio Applications",
//! Section: One-Pole Filter.

use crate::Sample;
use crate::math::flush_denormal;

/// How a time value handed to an attack/release setter is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeScale {
    /// The time is the one-pole time constant `tau` (63% point).
    #[default]
    TimeConstant,
    /// The time is the 10%–90% rise time of the step response.
    ///
    /// A one-pole rises from 10% to 90% in `tau · ln 9`, so the time is divided
    /// by `ln 9 ≈ 2.197` before the coefficient is derived.
    RiseTime,
}

impl TimeScale {
    /// Convert a user-facing time in milliseconds into a time constant in seconds.
    #[inline]
    pub fn time_constant_seconds(self, time_ms: f64) -> f64 {
        let seconds = time_ms / 1000.0;
        match self {
            Self::TimeConstant => seconds,
            Self::RiseTime => seconds / libm::log(9.0),
        }
    }
}

/// Feedback coefficient `exp(-1 / (tau · sample_rate))` for a one-pole.
///
/// Times at or below zero (and NaN) yield `0.0`: the pole collapses and the
/// output follows the input instantly.
#[inline]
pub fn decay_coeff(time_ms: f64, sample_rate: f64, scale: TimeScale) -> f64 {
    let tau = scale.time_constant_seconds(time_ms);
    if tau > 0.0 && sample_rate > 0.0 {
        libm::exp(-1.0 / (tau * sample_rate))
    } else {
        0.0
    }
}

/// Advance a one-pole by one sample: `coeff * state + (1 - coeff) * input`.
///
/// The result is denormal-flushed since it is fed back as the next state.
#[inline]
pub fn one_pole_step<T: Sample>(state: T, input: T, coeff: T) -> T {
    flush_denormal(coeff * state + (T::one() - coeff) * input)
}

/// Attack/release coefficient pair with their source times.
///
/// # Invariants
///
/// - Both coefficients are in `[0, 1)`; `0` means instantaneous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ballistics<T> {
    attack_coeff: T,
    release_coeff: T,
    attack_ms: f64,
    release_ms: f64,
    attack_scale: TimeScale,
    release_scale: TimeScale,
}

impl<T: Sample> Ballistics<T> {
    /// Create ballistics with the given times, raw time-constant scale.
    ///
    /// Coefficients are zero (instant) until [`recalculate`](Self::recalculate)
    /// is called with a sample rate.
    pub fn new(attack_ms: f64, release_ms: f64) -> Self {
        Self {
            attack_coeff: T::zero(),
            release_coeff: T::zero(),
            attack_ms,
            release_ms,
            attack_scale: TimeScale::TimeConstant,
            release_scale: TimeScale::TimeConstant,
        }
    }

    /// Store a new attack time; takes effect on the next `recalculate`.
    pub fn set_attack(&mut self, time_ms: f64, scale: TimeScale) {
        self.attack_ms = time_ms.max(0.0);
        self.attack_scale = scale;
    }

    /// Store a new release time; takes effect on the next `recalculate`.
    pub fn set_release(&mut self, time_ms: f64, scale: TimeScale) {
        self.release_ms = time_ms.max(0.0);
        self.release_scale = scale;
    }

    /// Attack time in milliseconds, as last set.
    pub fn attack_ms(&self) -> f64 {
        self.attack_ms
    }

    /// Release time in milliseconds, as last set.
    pub fn release_ms(&self) -> f64 {
        self.release_ms
    }

    /// Current attack coefficient.
    #[inline]
    pub fn attack_coeff(&self) -> T {
        self.attack_coeff
    }

    /// Current release coefficient.
    #[inline]
    pub fn release_coeff(&self) -> T {
        self.release_coeff
    }

    /// Derive both coefficients for `sample_rate`.
    pub fn recalculate(&mut self, sample_rate: f64) {
        self.attack_coeff =
            T::from_f64(decay_coeff(self.attack_ms, sample_rate, self.attack_scale));
        self.release_coeff =
            T::from_f64(decay_coeff(self.release_ms, sample_rate, self.release_scale));
    }

    /// One step using the attack coefficient when `attacking`, release otherwise.
    #[inline]
    pub fn step(&self, state: T, input: T, attacking: bool) -> T {
        let coeff = if attacking {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        one_pole_step(state, input, coeff)
    }
}
