//! Static gain curves: detected level in, gain change in dB out.
//!
//! Both curves are stateless, so one instance can serve every channel of a
//! dynamics stage. Levels are given as linear magnitudes and converted with
//! [`linear_to_db`]; the `*_db` methods take the level already in dB.
//!
//! [`GainComputer`] is the downward compressor / limiter law:
//!
//! ```text
//! L <= T - W/2          : 0
//! L >= T + W/2          : (T - L)(1 - 1/R)
//! otherwise (soft knee) : (1/R - 1)(L - T + W/2)² / (2W)
//! ```
//!
//! [`ExpanderCurve`] mirrors it below the threshold and floors the result at
//! `-range`, which turns it into a gate when the ratio is infinite.

use crate::Sample;
use crate::math::linear_to_db;

/// Compressor / limiter static curve.
///
/// # Invariants
///
/// - `ratio >= 1` (infinity allowed: brick-wall limiter)
/// - `knee_db >= 0`; a zero knee reproduces the hard-knee law exactly
///
/// # Example
///
/// ```rust
/// use sustrato_core::GainComputer;
///
/// let computer = GainComputer::<f32>::new(-10.0, 4.0, 0.0);
/// assert_eq!(computer.compute_db(0.0), -7.5);
/// assert_eq!(computer.compute_db(-20.0), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainComputer<T> {
    threshold_db: T,
    ratio: T,
    knee_db: T,
}

impl<T: Sample> Default for GainComputer<T> {
    /// -18 dB threshold, 4:1, 6 dB knee.
    fn default() -> Self {
        Self::new(T::from_f64(-18.0), T::from_f64(4.0), T::from_f64(6.0))
    }
}

impl<T: Sample> GainComputer<T> {
    /// Create a curve; ratio and knee are clamped to their valid ranges.
    pub fn new(threshold_db: T, ratio: T, knee_db: T) -> Self {
        Self {
            threshold_db,
            ratio: clamp_ratio(ratio),
            knee_db: clamp_knee(knee_db),
        }
    }

    /// Limiter: infinite ratio.
    pub fn limiter(threshold_db: T, knee_db: T) -> Self {
        Self::new(threshold_db, T::infinity(), knee_db)
    }

    /// Threshold in dB.
    pub fn threshold_db(&self) -> T {
        self.threshold_db
    }

    /// Compression ratio.
    pub fn ratio(&self) -> T {
        self.ratio
    }

    /// Knee width in dB.
    pub fn knee_db(&self) -> T {
        self.knee_db
    }

    /// Set the threshold in dB.
    pub fn set_threshold_db(&mut self, threshold_db: T) {
        self.threshold_db = threshold_db;
    }

    /// Set the ratio (clamped to `>= 1`, NaN becomes 1).
    pub fn set_ratio(&mut self, ratio: T) {
        self.ratio = clamp_ratio(ratio);
    }

    /// Set the knee width in dB (clamped to `>= 0`).
    pub fn set_knee_db(&mut self, knee_db: T) {
        self.knee_db = clamp_knee(knee_db);
    }

    /// Gain change in dB (`<= 0`) for a linear input level.
    #[inline]
    pub fn gain_change_db(&self, level_linear: T) -> T {
        self.compute_db(linear_to_db(level_linear))
    }

    /// Gain change in dB (`<= 0`) for an input level in dB.
    #[inline]
    pub fn compute_db(&self, level_db: T) -> T {
        let slope = T::one() - self.ratio.recip();
        let over = level_db - self.threshold_db;
        let half_knee = self.knee_db * T::half();

        if self.knee_db > T::zero() {
            if over <= -half_knee {
                T::zero()
            } else if over >= half_knee {
                -over * slope
            } else {
                let x = over + half_knee;
                -slope * x * x / (self.knee_db + self.knee_db)
            }
        } else if over <= T::zero() {
            T::zero()
        } else {
            -over * slope
        }
    }
}

/// Downward expander / gate static curve.
///
/// Below the threshold the gain falls by `ratio - 1` dB per dB, never below
/// `-range_db`. Above the threshold (and knee) it is 0 dB.
///
/// # Example
///
/// ```rust
/// use sustrato_core::ExpanderCurve;
///
/// let gate = ExpanderCurve::<f64>::gate(-40.0, 60.0);
/// assert_eq!(gate.compute_db(-30.0), 0.0);
/// assert_eq!(gate.compute_db(-50.0), -60.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpanderCurve<T> {
    threshold_db: T,
    ratio: T,
    knee_db: T,
    range_db: T,
}

impl<T: Sample> Default for ExpanderCurve<T> {
    /// -40 dB threshold, 2:1, no knee, 40 dB range.
    fn default() -> Self {
        Self::new(
            T::from_f64(-40.0),
            T::from_f64(2.0),
            T::zero(),
            T::from_f64(40.0),
        )
    }
}

impl<T: Sample> ExpanderCurve<T> {
    /// Create an expander; ratio, knee and range are clamped to their valid ranges.
    pub fn new(threshold_db: T, ratio: T, knee_db: T, range_db: T) -> Self {
        Self {
            threshold_db,
            ratio: clamp_ratio(ratio),
            knee_db: clamp_knee(knee_db),
            range_db: clamp_knee(range_db),
        }
    }

    /// Hard gate: infinite ratio, no knee, attenuating by `range_db` when closed.
    pub fn gate(threshold_db: T, range_db: T) -> Self {
        Self::new(threshold_db, T::infinity(), T::zero(), range_db)
    }

    /// Threshold in dB.
    pub fn threshold_db(&self) -> T {
        self.threshold_db
    }

    /// Expansion ratio.
    pub fn ratio(&self) -> T {
        self.ratio
    }

    /// Knee width in dB.
    pub fn knee_db(&self) -> T {
        self.knee_db
    }

    /// Maximum attenuation in dB (positive).
    pub fn range_db(&self) -> T {
        self.range_db
    }

    /// Set the threshold in dB.
    pub fn set_threshold_db(&mut self, threshold_db: T) {
        self.threshold_db = threshold_db;
    }

    /// Set the ratio (clamped to `>= 1`).
    pub fn set_ratio(&mut self, ratio: T) {
        self.ratio = clamp_ratio(ratio);
    }

    /// Set the knee width in dB.
    pub fn set_knee_db(&mut self, knee_db: T) {
        self.knee_db = clamp_knee(knee_db);
    }

    /// Set the range in dB.
    pub fn set_range_db(&mut self, range_db: T) {
        self.range_db = clamp_knee(range_db);
    }

    /// Gain change in dB for a linear input level.
    #[inline]
    pub fn gain_change_db(&self, level_linear: T) -> T {
        self.compute_db(linear_to_db(level_linear))
    }

    /// Gain change in dB for an input level in dB.
    #[inline]
    pub fn compute_db(&self, level_db: T) -> T {
        let slope = self.ratio - T::one();
        let under = level_db - self.threshold_db;
        let half_knee = self.knee_db * T::half();

        if under >= half_knee {
            return T::zero();
        }
        let gain = if under <= -half_knee {
            under * slope
        } else {
            let x = under - half_knee;
            -slope * x * x / (self.knee_db + self.knee_db)
        };
        // infinite ratio yields -inf (or NaN at 0 * inf); both end at the floor
        gain.max(-self.range_db)
    }
}

#[inline]
fn clamp_ratio<T: Sample>(ratio: T) -> T {
    if ratio.is_nan() { T::one() } else { ratio.max(T::one()) }
}

#[inline]
fn clamp_knee<T: Sample>(knee_db: T) -> T {
    knee_db.max(T::zero())
}
