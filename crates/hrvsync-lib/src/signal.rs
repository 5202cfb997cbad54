use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Basic typed time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }

    /// Reject a non-positive rate, an empty series, or non-finite samples.
    pub fn validate(&self) -> Result<()> {
        validate_rate(self.fs)?;
        validate_samples(&self.data)
    }
}

/// R-R intervals in milliseconds, one per heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    pub fn new(rr: Vec<f64>) -> Self {
        Self { rr }
    }

    pub fn len(&self) -> usize {
        self.rr.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }

    /// Convert to seconds for spectral analysis, treating each interval as one
    /// sample taken at `fs`.
    pub fn to_seconds(&self, fs: f64) -> TimeSeries {
        TimeSeries {
            fs,
            data: self.rr.iter().map(|ms| ms / 1000.0).collect(),
        }
    }

    pub fn slice(&self, start: usize, len: usize) -> RRSeries {
        RRSeries {
            rr: self.rr[start..start + len].to_vec(),
        }
    }
}

pub(crate) fn validate_rate(fs: f64) -> Result<()> {
    if fs.is_finite() && fs > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidSamplingRate(fs))
    }
}

pub(crate) fn validate_samples(data: &[f64]) -> Result<()> {
    if data.is_empty() {
        return Err(Error::EmptySignal);
    }
    match data.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(Error::NonFiniteSample { index }),
        None => Ok(()),
    }
}
