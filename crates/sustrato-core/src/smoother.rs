//! Multi-channel parameter smoothing for zipper-free changes.
//!
//! Audio parameters (gain, cutoff, threshold) need smooth transitions to
//! avoid audible "zipper noise" when they change. [`ParamSmoother`] holds one
//! trajectory per channel and advances it one sample per call.
//!
//! ## Smoothing Methods
//!
//! - **None**: the target is returned immediately
//! - **Exponential (one-pole lowpass)**: natural decay, optionally cascaded up
//!   to [`MAX_SMOOTHING_ORDER`] stages for a softer start
//! - **Linear**: constant rate of change, exact arrival time
//!
//! ## Usage
//!
//! ```rust
//! use sustrato_core::{ParamSmoother, SmoothingAlgorithm};
//!
//! let mut cutoff = ParamSmoother::<f32>::new(SmoothingAlgorithm::exponential(), 10.0);
//! cutoff.prepare(2, 48000.0).unwrap();
//! cutoff.reset_to(1000.0);
//!
//! // Set new target - smoothing happens as the audio thread pulls values
//! cutoff.set_target(0, 2000.0);
//! for _ in 0..480 {
//!     let smoothed = cutoff.next_value(0);
//!     // Use smoothed for processing...
//! #   let _ = smoothed;
//! }
//! assert!(cutoff.current_value(0) > 1600.0);
//! assert_eq!(cutoff.current_value(1), 1000.0);
//! ```

use crate::Sample;
use crate::arena::SectionArena;
use crate::error::{SetupError, check_sample_rate};
use crate::math::ms_to_samples;

/// Highest cascade order for exponential smoothing.
pub const MAX_SMOOTHING_ORDER: u8 = 8;

/// Smoothing algorithm, fixed per [`ParamSmoother`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SmoothingAlgorithm {
    /// No smoothing: every call returns the target.
    None,
    /// Cascade of `order` identical one-pole lowpass stages (1..=8).
    Exponential {
        /// Number of cascaded stages.
        order: u8,
    },
    /// Linear ramp reaching the target after exactly the configured time.
    Linear,
}

impl SmoothingAlgorithm {
    /// Single-stage exponential smoothing.
    pub const fn exponential() -> Self {
        Self::Exponential { order: 1 }
    }

    /// Check that an exponential cascade order is within `1..=8`.
    pub fn validate(self) -> Result<(), SetupError> {
        match self {
            Self::Exponential { order } if order == 0 || order > MAX_SMOOTHING_ORDER => {
                Err(SetupError::SmoothingOrder(order))
            }
            _ => Ok(()),
        }
    }
}

impl Default for SmoothingAlgorithm {
    fn default() -> Self {
        Self::exponential()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SmootherState<T> {
    current: T,
    target: T,
    /// Exponential cascade registers, held in `f64` so an `f32` smoother
    /// still settles exactly; the last active stage rounds to `current`.
    stages: [f64; MAX_SMOOTHING_ORDER as usize],
    /// Linear increment per sample.
    step: T,
    /// Samples left in the linear ramp.
    remaining: u32,
}

impl<T: Sample> SmootherState<T> {
    fn snap(&mut self, value: T) {
        self.current = value;
        self.target = value;
        self.stages = [value.as_f64(); MAX_SMOOTHING_ORDER as usize];
        self.step = T::zero();
        self.remaining = 0;
    }

    fn start_ramp(&mut self, ramp_samples: u32) {
        if ramp_samples == 0 {
            self.snap(self.target);
        } else {
            self.step = (self.target - self.current) / T::from_f64(f64::from(ramp_samples));
            self.remaining = ramp_samples;
        }
    }
}

/// Per-channel smoothed parameter.
///
/// Each channel owns a current value, a target and the algorithm's
/// intermediate state; the time constant and algorithm are shared.
///
/// # Invariants
///
/// - `next_value` is the only operation that moves `current` toward `target`
/// - `set_target` never changes `current`
#[derive(Debug)]
pub struct ParamSmoother<T: Sample> {
    states: SectionArena<SmootherState<T>>,
    algorithm: SmoothingAlgorithm,
    time_ms: f64,
    sample_rate: f64,
    /// One-pole coefficient per stage (`1` = instant).
    coeff: f64,
    /// Ramp length for linear smoothing.
    ramp_samples: u32,
}

impl<T: Sample> ParamSmoother<T> {
    /// Create an unprepared smoother.
    ///
    /// An invalid cascade order is clamped into `1..=8`; use
    /// [`set_algorithm`](Self::set_algorithm) to get an error instead.
    pub fn new(algorithm: SmoothingAlgorithm, time_ms: f64) -> Self {
        let algorithm = match algorithm {
            SmoothingAlgorithm::Exponential { order } => SmoothingAlgorithm::Exponential {
                order: order.clamp(1, MAX_SMOOTHING_ORDER),
            },
            other => other,
        };
        Self {
            states: SectionArena::new(),
            algorithm,
            time_ms: time_ms.max(0.0),
            sample_rate: 0.0,
            coeff: 1.0,
            ramp_samples: 0,
        }
    }

    /// Allocate state for `channels` and derive coefficients for `sample_rate`.
    ///
    /// All channels start at zero. This is the only allocating call.
    pub fn prepare(&mut self, channels: usize, sample_rate: f64) -> Result<(), SetupError> {
        if channels == 0 {
            return Err(SetupError::NoChannels);
        }
        check_sample_rate(sample_rate)?;

        self.states.prepare(channels, 1);
        self.sample_rate = sample_rate;
        self.recalculate();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "param_smoother prepared: {channels} ch @ {sample_rate} Hz, {:?}, {} ms",
            self.algorithm,
            self.time_ms
        );
        Ok(())
    }

    /// Number of prepared channels.
    pub fn channels(&self) -> usize {
        self.states.channels()
    }

    /// The configured algorithm.
    pub fn algorithm(&self) -> SmoothingAlgorithm {
        self.algorithm
    }

    /// Switch algorithm. In-flight trajectories restart from their current value.
    pub fn set_algorithm(&mut self, algorithm: SmoothingAlgorithm) -> Result<(), SetupError> {
        algorithm.validate()?;
        self.algorithm = algorithm;
        let ramp_samples = self.ramp_samples;
        for state in self.states.iter_mut() {
            let (current, target) = (state.current, state.target);
            state.snap(current);
            state.target = target;
            if algorithm == SmoothingAlgorithm::Linear && current != target {
                state.start_ramp(ramp_samples);
            } else if algorithm == SmoothingAlgorithm::None {
                state.snap(target);
            }
        }
        Ok(())
    }

    /// Smoothing time in milliseconds.
    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    /// Set the smoothing time in milliseconds and recompute coefficients.
    ///
    /// For exponential smoothing this is the time constant of each stage
    /// (63% of the way for a single stage). For linear smoothing it is the
    /// ramp duration; ramps in progress restart from their current value so
    /// they arrive after the new duration. Times `<= 0` mean instant.
    pub fn set_time_ms(&mut self, time_ms: f64) {
        self.time_ms = time_ms.max(0.0);
        self.recalculate();
        if self.algorithm == SmoothingAlgorithm::Linear {
            let ramp_samples = self.ramp_samples;
            for state in self.states.iter_mut() {
                if state.remaining > 0 {
                    state.start_ramp(ramp_samples);
                }
            }
        }
    }

    /// Set a new destination for `channel` without altering its current value.
    #[inline]
    #[track_caller]
    pub fn set_target(&mut self, channel: usize, target: T) {
        let ramp_samples = self.ramp_samples;
        let algorithm = self.algorithm;
        let state = self.states.get_mut(channel, 0);
        if algorithm == SmoothingAlgorithm::Linear {
            if target == state.target {
                return;
            }
            state.target = target;
            state.start_ramp(ramp_samples);
        } else {
            state.target = target;
        }
    }

    /// Set the same target on every channel.
    pub fn set_target_all(&mut self, target: T) {
        for channel in 0..self.channels() {
            self.set_target(channel, target);
        }
    }

    /// Advance `channel` by one sample and return the new value.
    ///
    /// Not idempotent: each call consumes one step of the trajectory.
    #[inline]
    #[track_caller]
    pub fn next_value(&mut self, channel: usize) -> T {
        let coeff = self.coeff;
        let algorithm = self.algorithm;
        let state = self.states.get_mut(channel, 0);
        match algorithm {
            SmoothingAlgorithm::None => {
                state.current = state.target;
            }
            SmoothingAlgorithm::Exponential { order } => {
                // Each stage: y[n] = y[n-1] + coeff * (input - y[n-1]).
                // A step that rounds to no change lands on the input.
                let mut input = state.target.as_f64();
                for stage in &mut state.stages[..usize::from(order)] {
                    let next = *stage + coeff * (input - *stage);
                    *stage = if next == *stage { input } else { next };
                    input = *stage;
                }
                state.current = T::from_f64(input);
            }
            SmoothingAlgorithm::Linear => {
                if state.remaining > 0 {
                    state.current = state.current + state.step;
                    state.remaining -= 1;
                    if state.remaining == 0 {
                        state.current = state.target; // Snap to exact target
                    }
                }
            }
        }
        state.current
    }

    /// Advance `channel` by `samples` steps and return the final value.
    #[track_caller]
    pub fn skip(&mut self, channel: usize, samples: usize) -> T {
        let mut value = self.current_value(channel);
        for _ in 0..samples {
            value = self.next_value(channel);
        }
        value
    }

    /// Current value of `channel` without advancing.
    #[inline]
    #[track_caller]
    pub fn current_value(&self, channel: usize) -> T {
        self.states.get(channel, 0).current
    }

    /// Target value of `channel`.
    #[inline]
    #[track_caller]
    pub fn target_value(&self, channel: usize) -> T {
        self.states.get(channel, 0).target
    }

    /// Check whether `channel` is still moving toward its target.
    #[track_caller]
    pub fn is_smoothing(&self, channel: usize) -> bool {
        let state = self.states.get(channel, 0);
        match self.algorithm {
            SmoothingAlgorithm::None => false,
            SmoothingAlgorithm::Linear => state.remaining > 0,
            SmoothingAlgorithm::Exponential { order } => {
                let target = state.target.as_f64();
                state.stages[..usize::from(order)].iter().any(|&stage| stage != target)
            }
        }
    }

    /// Jump `channel` to `value`: current = target = value, cascade cleared.
    #[track_caller]
    pub fn set_current_and_target(&mut self, channel: usize, value: T) {
        self.states.get_mut(channel, 0).snap(value);
    }

    /// Set every channel's current and target to zero and clear the cascade.
    pub fn reset(&mut self) {
        self.reset_to(T::zero());
    }

    /// Set every channel's current and target to `value` and clear the cascade.
    pub fn reset_to(&mut self, value: T) {
        for state in self.states.iter_mut() {
            state.snap(value);
        }
    }

    /// Recalculate the per-stage coefficient and ramp length.
    ///
    /// A one-pole stage `y[n] = y[n-1] + coeff * (target - y[n-1])` has its
    /// pole at `1 - coeff`. Reaching 1 - e^-1 of the distance after `tau`
    /// seconds requires `coeff = 1 - exp(-1 / (tau * sample_rate))`.
    fn recalculate(&mut self) {
        let samples = ms_to_samples(self.time_ms, self.sample_rate);
        if samples <= 0.0 {
            self.coeff = 1.0;
            self.ramp_samples = 0;
        } else {
            self.coeff = 1.0 - libm::exp(-1.0 / samples);
            self.ramp_samples = libm::round(samples).min(f64::from(u32::MAX)) as u32;
        }
    }
}
