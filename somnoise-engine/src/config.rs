//! Run configuration: which preset to synthesize and how to master it.
//!
//! Both records are immutable for the run they describe. `validate` is called
//! before any file is touched so configuration errors never leave partial output.

use core::fmt;
use core::str::FromStr;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};

/// Default output sample rate (Hz).
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// The four fixed noise presets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    BrownNoise,
    FanNoise,
    RainWindow,
    OceanWaves,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::BrownNoise,
        Preset::FanNoise,
        Preset::RainWindow,
        Preset::OceanWaves,
    ];

    /// Canonical name, as accepted on the command line and printed in logs.
    pub fn name(self) -> &'static str {
        match self {
            Preset::BrownNoise => "brown_noise",
            Preset::FanNoise => "fan_noise",
            Preset::RainWindow => "rain_window",
            Preset::OceanWaves => "ocean_waves",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = Error;

    /// Accepts the canonical names plus the short forms `brown`, `fan`, `rain`
    /// and `ocean`; case-insensitive, `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        match key.as_str() {
            "brown_noise" | "brown" => Ok(Preset::BrownNoise),
            "fan_noise" | "fan" => Ok(Preset::FanNoise),
            "rain_window" | "rain" => Ok(Preset::RainWindow),
            "ocean_waves" | "ocean" => Ok(Preset::OceanWaves),
            _ => Err(Error::UnknownPreset(s.to_string())),
        }
    }
}

/// What to synthesize: preset, length, rate and (optionally) a seed.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    pub preset: Preset,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    /// `None` seeds from OS entropy; runs are then not reproducible.
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            preset: Preset::BrownNoise,
            duration_seconds: 8.0 * 3600.0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            seed: None,
        }
    }
}

impl GenerationConfig {
    pub fn new(preset: Preset, duration_seconds: f64, sample_rate: u32) -> Self {
        Self { preset, duration_seconds, sample_rate, seed: None }
    }

    pub fn from_hours(preset: Preset, hours: f64, sample_rate: u32) -> Self {
        Self::new(preset, hours * 3600.0, sample_rate)
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.duration_seconds.is_finite() && self.duration_seconds > 0.0) {
            return Err(Error::InvalidDuration(self.duration_seconds));
        }
        if self.sample_rate == 0 {
            return Err(Error::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }

    /// `round(duration_seconds * sample_rate)`.
    pub fn total_frames(&self) -> u64 {
        (self.duration_seconds * f64::from(self.sample_rate)).round() as u64
    }

    /// The run's generator. Owned by the driver; there is no global RNG.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Mastering parameters for one invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterSpec {
    /// `None` or `<= 0` skips the stage.
    pub highpass_hz: Option<f64>,
    /// `None` or `<= 0` skips the stage.
    pub lowpass_hz: Option<f64>,
    pub fade_seconds: u32,
    pub target_rms_dbfs: f64,
    pub peak_ceiling_linear: f64,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            highpass_hz: Some(18.0),
            lowpass_hz: Some(1200.0),
            fade_seconds: 15,
            target_rms_dbfs: -20.0,
            peak_ceiling_linear: 0.98,
        }
    }
}

impl FilterSpec {
    /// Highpass cutoff if the stage is enabled.
    pub fn highpass(&self) -> Option<f64> {
        self.highpass_hz.filter(|&hz| hz > 0.0)
    }

    /// Lowpass cutoff if the stage is enabled.
    pub fn lowpass(&self) -> Option<f64> {
        self.lowpass_hz.filter(|&hz| hz > 0.0)
    }

    pub fn validate(&self, sample_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(Error::InvalidSampleRate(sample_rate));
        }
        let nyquist = f64::from(sample_rate) / 2.0;
        for (name, hz) in [("highpass", self.highpass()), ("lowpass", self.lowpass())] {
            if let Some(hz) = hz {
                if !hz.is_finite() || hz >= nyquist {
                    return Err(Error::InvalidCutoff { name, hz, nyquist });
                }
            }
        }
        let ceiling = self.peak_ceiling_linear;
        if !(ceiling.is_finite() && ceiling > 0.0) {
            return Err(Error::InvalidCeiling(ceiling));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_names_parse_both_ways() {
        for p in Preset::ALL {
            assert_eq!(p.name().parse::<Preset>().unwrap(), p);
        }
        assert_eq!("Ocean".parse::<Preset>().unwrap(), Preset::OceanWaves);
        assert_eq!("rain-window".parse::<Preset>().unwrap(), Preset::RainWindow);
        let err = "pink_noise".parse::<Preset>().unwrap_err();
        assert!(matches!(err, Error::UnknownPreset(ref s) if s == "pink_noise"));
    }

    #[test]
    fn total_frames_rounds() {
        let cfg = GenerationConfig::new(Preset::BrownNoise, 10.0, 8000);
        assert_eq!(cfg.total_frames(), 80_000);
        let cfg = GenerationConfig::new(Preset::BrownNoise, 0.00019, 8000);
        assert_eq!(cfg.total_frames(), 2); // 1.52 → 2
        let cfg = GenerationConfig::from_hours(Preset::FanNoise, 0.5, 44_100);
        assert_eq!(cfg.total_frames(), 79_380_000);
    }

    #[test]
    fn generation_config_rejects_bad_values() {
        let bad = [
            GenerationConfig::new(Preset::BrownNoise, 0.0, 44_100),
            GenerationConfig::new(Preset::BrownNoise, -1.0, 44_100),
            GenerationConfig::new(Preset::BrownNoise, f64::NAN, 44_100),
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(Error::InvalidDuration(_))));
        }
        let cfg = GenerationConfig::new(Preset::BrownNoise, 1.0, 0);
        assert!(matches!(cfg.validate(), Err(Error::InvalidSampleRate(0))));
        assert!(GenerationConfig::default().validate().is_ok());
    }

    #[test]
    fn seeded_rngs_agree() {
        use rand::Rng;
        let cfg = GenerationConfig::new(Preset::RainWindow, 1.0, 8000).with_seed(7);
        let a: u64 = cfg.rng().gen();
        let b: u64 = cfg.rng().gen();
        assert_eq!(a, b);
    }

    #[test]
    fn filter_spec_stage_selection_and_validation() {
        let spec = FilterSpec::default();
        assert_eq!(spec.highpass(), Some(18.0));
        assert_eq!(spec.lowpass(), Some(1200.0));
        assert!(spec.validate(44_100).is_ok());

        let off = FilterSpec { highpass_hz: Some(0.0), lowpass_hz: None, ..FilterSpec::default() };
        assert_eq!(off.highpass(), None);
        assert_eq!(off.lowpass(), None);
        assert!(off.validate(8000).is_ok());

        let too_high = FilterSpec { lowpass_hz: Some(4000.0), ..FilterSpec::default() };
        assert!(matches!(
            too_high.validate(8000),
            Err(Error::InvalidCutoff { name: "lowpass", .. })
        ));

        let no_ceiling = FilterSpec { peak_ceiling_linear: 0.0, ..FilterSpec::default() };
        assert!(matches!(no_ceiling.validate(8000), Err(Error::InvalidCeiling(_))));
    }
}
