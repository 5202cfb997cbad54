//! Heart-rhythm coherence scoring.
//!
//! The score is the share of low-frequency power that sits in the resonant
//! band around 0.1 Hz: `100 · P[0.04, 0.26] / P[0, 0.40]`, clamped to 0–100.

use crate::{
    error::{Error, Result},
    signal::{validate_rate, validate_samples, RRSeries},
    spectral::{estimate_psd, FrequencyBand, SpectralMethod, WelchConfig},
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resonant band used for the numerator of the ratio.
pub const COHERENCE_BAND: FrequencyBand = FrequencyBand::new(0.04, 0.26);
/// Band whose power forms the denominator of the ratio.
pub const TOTAL_BAND: FrequencyBand = FrequencyBand::new(0.0, 0.40);
/// Minimum window, in seconds, for a meaningful score.
pub const DEFAULT_WINDOW_S: usize = 30;
/// One R-R sample per second.
pub const DEFAULT_SAMPLING_RATE: f64 = 1.0;

const MEDIUM_THRESHOLD: f64 = 40.0;
const HIGH_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoherenceBands {
    pub coherence: FrequencyBand,
    pub total: FrequencyBand,
}

impl Default for CoherenceBands {
    fn default() -> Self {
        Self {
            coherence: COHERENCE_BAND,
            total: TOTAL_BAND,
        }
    }
}

impl CoherenceBands {
    /// Both bands must be well formed and the coherence band must sit inside
    /// the total band, so the ratio never exceeds 1.
    pub fn validate(&self) -> Result<()> {
        self.coherence.validate()?;
        self.total.validate()?;
        if self.coherence.low < self.total.low || self.coherence.high > self.total.high {
            return Err(Error::InvalidBand {
                low: self.coherence.low,
                high: self.coherence.high,
            });
        }
        Ok(())
    }
}

/// Everything the scorer needs besides the data itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoherenceConfig {
    /// Samples per second of the interval series.
    pub sampling_rate: f64,
    pub bands: CoherenceBands,
    pub method: SpectralMethod,
    pub welch: WelchConfig,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            sampling_rate: DEFAULT_SAMPLING_RATE,
            bands: CoherenceBands::default(),
            method: SpectralMethod::Welch,
            welch: WelchConfig::default(),
        }
    }
}

impl CoherenceConfig {
    pub fn validate(&self) -> Result<()> {
        validate_rate(self.sampling_rate)?;
        self.bands.validate()?;
        self.welch.validate()
    }

    /// Number of samples spanning `seconds` at the configured rate.
    pub fn samples_for(&self, seconds: usize) -> usize {
        ((seconds as f64 * self.sampling_rate).round() as usize).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoherencePhase {
    Low,
    Medium,
    High,
}

impl CoherencePhase {
    /// Bucket a 0–100 score. Each threshold belongs to the higher bucket.
    pub fn from_score(score: f64) -> Self {
        if score < MEDIUM_THRESHOLD {
            Self::Low
        } else if score < HIGH_THRESHOLD {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for CoherencePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoherenceResult {
    pub score: f64,
    pub peak_power: f64,
    pub total_power: f64,
    pub coherence_ratio: f64,
    pub phase: CoherencePhase,
    pub dominant_frequency: f64,
}

/// What scoring a window produced. Only `Scored` carries a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoherenceOutcome {
    Scored(CoherenceResult),
    /// Fewer intervals than the window requires.
    InsufficientData { available: usize, required: usize },
    /// No power in the total band, so no ratio exists.
    DegenerateSignal,
}

impl CoherenceOutcome {
    pub fn scored(self) -> Option<CoherenceResult> {
        match self {
            Self::Scored(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, Self::Scored(_))
    }
}

/// Score `rr` (milliseconds) over a minimum window of `window_size` seconds.
pub fn coherence_score(
    rr: &RRSeries,
    window_size: usize,
    cfg: &CoherenceConfig,
) -> Result<CoherenceOutcome> {
    if window_size == 0 {
        return Err(Error::InvalidWindow);
    }
    cfg.validate()?;
    let required = cfg.samples_for(window_size);
    if rr.len() < required {
        debug!("coherence: {} intervals < {required} required", rr.len());
        return Ok(CoherenceOutcome::InsufficientData {
            available: rr.len(),
            required,
        });
    }
    validate_samples(&rr.rr)?;

    let ts = rr.to_seconds(cfg.sampling_rate);
    let psd = estimate_psd(&ts, cfg.method, &cfg.welch)?;
    let peak_power = psd.band_power(cfg.bands.coherence);
    let total_power = psd.band_power(cfg.bands.total);
    if total_power == 0.0 {
        debug!("coherence: zero power in total band");
        return Ok(CoherenceOutcome::DegenerateSignal);
    }

    let coherence_ratio = peak_power / total_power;
    let score = (coherence_ratio * 100.0).clamp(0.0, 100.0);
    Ok(CoherenceOutcome::Scored(CoherenceResult {
        score,
        peak_power,
        total_power,
        coherence_ratio,
        phase: CoherencePhase::from_score(score),
        dominant_frequency: psd.dominant_frequency().unwrap_or(0.0),
    }))
}
