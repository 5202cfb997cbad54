use crate::{
    error::{Error, Result},
    metrics::{
        coherence::{CoherenceBands, CoherenceConfig, DEFAULT_SAMPLING_RATE, DEFAULT_WINDOW_S},
        rolling::DEFAULT_STEP_S,
        sync::{AlignmentPolicy, SyncConfig},
    },
    signal::validate_rate,
    spectral::{SpectralMethod, WelchConfig},
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All tunables of an analysis run, loadable from TOML.
///
/// Every field has a default, so a file only needs the values it changes:
///
/// ```toml
/// sampling_rate = 2.0
/// window_size = 60
///
/// [bands.coherence]
/// low = 0.05
/// high = 0.25
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Samples per second of the interval series (Hz).
    pub sampling_rate: f64,
    /// Scoring window in seconds.
    pub window_size: usize,
    /// Rolling hop in seconds.
    pub step_size: usize,
    pub bands: CoherenceBands,
    pub method: SpectralMethod,
    pub welch: WelchConfig,
    pub alignment: AlignmentPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sampling_rate: DEFAULT_SAMPLING_RATE,
            window_size: DEFAULT_WINDOW_S,
            step_size: DEFAULT_STEP_S,
            bands: CoherenceBands::default(),
            method: SpectralMethod::Welch,
            welch: WelchConfig::default(),
            alignment: AlignmentPolicy::Truncate,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        validate_rate(self.sampling_rate)?;
        if self.window_size == 0 {
            return Err(Error::InvalidWindow);
        }
        if self.step_size == 0 {
            return Err(Error::InvalidStep);
        }
        self.bands.validate()?;
        self.welch.validate()
    }

    pub fn coherence(&self) -> CoherenceConfig {
        CoherenceConfig {
            sampling_rate: self.sampling_rate,
            bands: self.bands,
            method: self.method,
            welch: self.welch,
        }
    }

    pub fn sync(&self) -> SyncConfig {
        SyncConfig {
            alignment: self.alignment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::{Detrend, FrequencyBand};

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AnalysisConfig::default());
        assert_eq!(cfg.sampling_rate, 1.0);
        assert_eq!(cfg.window_size, 30);
        assert_eq!(cfg.step_size, 5);
        assert_eq!(cfg.bands.coherence, FrequencyBand::new(0.04, 0.26));
        assert_eq!(cfg.bands.total.high, 0.40);
        assert_eq!(cfg.welch.segment_cap, 256);
        assert_eq!(cfg.welch.detrend, Detrend::Linear);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let cfg = AnalysisConfig::from_toml_str(
            r#"
            sampling_rate = 4.0
            method = "fft"
            alignment = "interpolate"

            [welch]
            segment_cap = 128
            detrend = "constant"

            [bands.coherence]
            low = 0.05
            high = 0.25
            "#,
        )
        .unwrap();
        assert_eq!(cfg.sampling_rate, 4.0);
        assert_eq!(cfg.method, SpectralMethod::Fft);
        assert_eq!(cfg.sync().alignment, AlignmentPolicy::Interpolate);
        assert_eq!(cfg.welch.segment_cap, 128);
        assert_eq!(cfg.welch.overlap, None);
        assert_eq!(cfg.coherence().bands.coherence.low, 0.05);
        assert_eq!(cfg.bands.total, FrequencyBand::new(0.0, 0.40));
        assert_eq!(cfg.window_size, 30);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("sampling_rate = 0.0"),
            Err(Error::InvalidSamplingRate(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("[bands.total]\nlow = 0.5\nhigh = 0.4"),
            Err(Error::InvalidBand { .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("[bands.total]\nlow = 0.05\nhigh = 0.12"),
            Err(Error::InvalidBand { low, high }) if low == 0.04 && high == 0.26
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("step_size = 0"),
            Err(Error::InvalidStep)
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("window_size = \"long\""),
            Err(Error::Config(_))
        ));
    }
}
