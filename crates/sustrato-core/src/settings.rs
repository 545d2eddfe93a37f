//! Plain settings structs for hosts that keep presets.
//!
//! Each struct has a [`Default`], a `validate()` that rejects values no
//! setter could make sense of (NaN, infinities where a finite number is
//! required, bad cascade orders) and an `apply_to(..)` that validates and
//! then pushes the values through the processor's own setters, so the usual
//! clamping still applies.
//!
//! With the `serde` feature enabled they derive `Serialize`/`Deserialize`.
//! Loading them from disk is the host's business.

use crate::Sample;
use crate::biquad::{BiquadChain, BiquadSectionParams};
use crate::dynamics::Compressor;
use crate::envelope::DetectionMode;
use crate::error::{SetupError, check_finite};
use crate::one_pole::TimeScale;
use crate::smoother::{ParamSmoother, SmoothingAlgorithm};

/// Settings of a [`ParamSmoother`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SmootherSettings {
    /// Trajectory shape.
    pub algorithm: SmoothingAlgorithm,
    /// Time constant (exponential) or ramp length (linear) in ms.
    pub time_ms: f64,
}

impl Default for SmootherSettings {
    fn default() -> Self {
        Self {
            algorithm: SmoothingAlgorithm::default(),
            time_ms: 10.0,
        }
    }
}

impl SmootherSettings {
    /// Check the settings without touching a processor.
    pub fn validate(&self) -> Result<(), SetupError> {
        self.algorithm.validate()?;
        check_finite("time_ms", self.time_ms)
    }

    /// Build an unprepared smoother from these settings.
    pub fn build<T: Sample>(&self) -> Result<ParamSmoother<T>, SetupError> {
        self.validate()?;
        Ok(ParamSmoother::new(self.algorithm, self.time_ms))
    }

    /// Apply to an existing smoother.
    pub fn apply_to<T: Sample>(&self, smoother: &mut ParamSmoother<T>) -> Result<(), SetupError> {
        self.validate()?;
        smoother.set_algorithm(self.algorithm)?;
        smoother.set_time_ms(self.time_ms);
        Ok(())
    }
}

/// Settings of one biquad section.
pub type BiquadSectionSettings = BiquadSectionParams;

impl BiquadSectionParams {
    /// Check that every numeric field is finite.
    pub fn validate(&self) -> Result<(), SetupError> {
        check_finite("freq_hz", self.freq_hz)?;
        check_finite("q", self.q)?;
        check_finite("gain_db", self.gain_db)
    }

    /// Install on `section` of `chain`.
    ///
    /// # Panics
    ///
    /// Panics if `section` is out of range for the prepared chain.
    #[track_caller]
    pub fn apply_to<T: Sample>(
        &self,
        chain: &mut BiquadChain<T>,
        section: usize,
    ) -> Result<(), SetupError> {
        self.validate()?;
        chain.set_section(section, *self);
        Ok(())
    }
}

/// Settings of a [`Compressor`] / limiter built on the default stage types.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DynamicsSettings {
    /// Threshold in dB.
    pub threshold_db: f64,
    /// Ratio; `f64::INFINITY` for a limiter.
    pub ratio: f64,
    /// Knee width in dB.
    pub knee_db: f64,
    /// Gain attack time in ms.
    pub attack_ms: f64,
    /// Gain release time in ms.
    pub release_ms: f64,
    /// How attack and release times are interpreted.
    pub time_scale: TimeScale,
    /// Detector mode.
    pub detection: DetectionMode,
    /// Detector attack in ms (0 = follow the input).
    pub detector_attack_ms: f64,
    /// Detector release in ms (0 = follow the input).
    pub detector_release_ms: f64,
}

impl Default for DynamicsSettings {
    fn default() -> Self {
        Self {
            threshold_db: -18.0,
            ratio: 4.0,
            knee_db: 6.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            time_scale: TimeScale::TimeConstant,
            detection: DetectionMode::Peak,
            detector_attack_ms: 0.0,
            detector_release_ms: 0.0,
        }
    }
}

impl DynamicsSettings {
    /// Check the settings; the ratio may be infinite but not NaN.
    pub fn validate(&self) -> Result<(), SetupError> {
        check_finite("threshold_db", self.threshold_db)?;
        if self.ratio.is_nan() {
            return Err(SetupError::NonFinite {
                name: "ratio",
                value: self.ratio,
            });
        }
        check_finite("knee_db", self.knee_db)?;
        check_finite("attack_ms", self.attack_ms)?;
        check_finite("release_ms", self.release_ms)?;
        check_finite("detector_attack_ms", self.detector_attack_ms)?;
        check_finite("detector_release_ms", self.detector_release_ms)
    }

    /// Build an unprepared compressor from these settings.
    pub fn build<T: Sample>(&self) -> Result<Compressor<T>, SetupError> {
        self.validate()?;
        let mut stage = Compressor::compressor(
            T::from_f64(self.threshold_db),
            T::from_f64(self.ratio),
            T::from_f64(self.knee_db),
            self.attack_ms,
            self.release_ms,
        );
        self.apply_to(&mut stage)?;
        Ok(stage)
    }

    /// Apply to an existing compressor. Takes effect on the next sample.
    pub fn apply_to<T: Sample>(&self, stage: &mut Compressor<T>) -> Result<(), SetupError> {
        self.validate()?;

        let curve = stage.curve_mut();
        curve.set_threshold_db(T::from_f64(self.threshold_db));
        curve.set_ratio(T::from_f64(self.ratio));
        curve.set_knee_db(T::from_f64(self.knee_db));

        let detector = stage.detector_mut();
        detector.set_mode(self.detection);
        detector.set_attack_time(self.detector_attack_ms, self.time_scale);
        detector.set_release_time(self.detector_release_ms, self.time_scale);

        let smoother = stage.smoother_mut();
        smoother.set_attack_time(self.attack_ms, self.time_scale);
        smoother.set_release_time(self.release_ms, self.time_scale);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biquad::BiquadType;

    #[test]
    fn smoother_settings_round_trip_through_processor() {
        let settings = SmootherSettings {
            algorithm: SmoothingAlgorithm::Linear,
            time_ms: 5.0,
        };
        let mut smoother = settings.build::<f32>().unwrap();
        smoother.prepare(1, 48000.0).unwrap();
        assert_eq!(smoother.algorithm(), SmoothingAlgorithm::Linear);
        assert_eq!(smoother.time_ms(), 5.0);

        let exp = SmootherSettings::default();
        exp.apply_to(&mut smoother).unwrap();
        assert_eq!(smoother.algorithm(), SmoothingAlgorithm::exponential());
    }

    #[test]
    fn smoother_settings_reject_bad_values() {
        let bad_order = SmootherSettings {
            algorithm: SmoothingAlgorithm::Exponential { order: 0 },
            time_ms: 5.0,
        };
        assert_eq!(bad_order.validate(), Err(SetupError::SmoothingOrder(0)));

        let nan_time = SmootherSettings {
            time_ms: f64::NAN,
            ..SmootherSettings::default()
        };
        assert!(matches!(nan_time.validate(), Err(SetupError::NonFinite { name: "time_ms", .. })));
    }

    #[test]
    fn biquad_settings_apply() {
        let mut chain = BiquadChain::<f64>::new();
        chain.prepare(1, 2, 48000.0).unwrap();
        let settings = BiquadSectionSettings {
            kind: BiquadType::LowShelf,
            freq_hz: 200.0,
            q: 0.7,
            gain_db: 3.0,
        };
        settings.apply_to(&mut chain, 1).unwrap();
        assert_eq!(chain.section_params(1), settings);

        let bad = BiquadSectionSettings {
            freq_hz: f64::INFINITY,
            ..settings
        };
        assert!(bad.apply_to(&mut chain, 0).is_err());
        assert_eq!(chain.section_params(0), BiquadSectionParams::default());
    }

    #[test]
    fn dynamics_settings_build() {
        let settings = DynamicsSettings {
            threshold_db: -12.0,
            ratio: f64::INFINITY,
            detection: DetectionMode::Rms,
            detector_attack_ms: 5.0,
            detector_release_ms: 5.0,
            ..DynamicsSettings::default()
        };
        let comp = settings.build::<f64>().unwrap();
        assert_eq!(comp.curve().threshold_db(), -12.0);
        assert!(comp.curve().ratio().is_infinite());
        assert_eq!(comp.detector().mode(), DetectionMode::Rms);
        assert_eq!(comp.smoother().attack_ms(), 10.0);
    }

    #[test]
    fn dynamics_settings_reject_nan_ratio() {
        let settings = DynamicsSettings {
            ratio: f64::NAN,
            ..DynamicsSettings::default()
        };
        assert!(matches!(settings.validate(), Err(SetupError::NonFinite { name: "ratio", .. })));
    }
}
