//! Power spectrum estimation for uniformly sampled series.
//!
//! Two interchangeable estimators are provided: Welch's averaged periodogram
//! (the default everywhere else in the crate) and a direct FFT periodogram of
//! the full signal. Both return non-negative frequencies in ascending order
//! starting at 0 Hz.

use crate::error::{Error, Result};
use crate::signal::TimeSeries;
use log::debug;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::{f64::consts::PI, fmt, str::FromStr};

/// Default cap on the Welch segment length, in samples.
pub const DEFAULT_SEGMENT_CAP: usize = 256;

/// Power versus frequency. `frequencies` and `power` always have equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSpectrum {
    pub frequencies: Vec<f64>,
    pub power: Vec<f64>,
}

impl PowerSpectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Spacing between adjacent bins in Hz.
    pub fn resolution(&self) -> f64 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// Sum of power over bins whose frequency lies inside `band` (inclusive).
    pub fn band_power(&self, band: FrequencyBand) -> f64 {
        self.frequencies
            .iter()
            .zip(&self.power)
            .filter(|(f, _)| band.contains(**f))
            .map(|(_, p)| *p)
            .sum()
    }

    /// Frequency of the largest power value; the lowest frequency wins ties.
    pub fn dominant_frequency(&self) -> Option<f64> {
        let mut best: Option<usize> = None;
        for (i, &p) in self.power.iter().enumerate() {
            match best {
                Some(b) if p <= self.power[b] => {}
                _ => best = Some(i),
            }
        }
        best.map(|i| self.frequencies[i])
    }
}

/// Closed frequency interval `[low, high]` in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low: f64,
    pub high: f64,
}

impl FrequencyBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.low && freq <= self.high
    }

    pub fn validate(&self) -> Result<()> {
        let finite = self.low.is_finite() && self.high.is_finite();
        if finite && self.low >= 0.0 && self.low <= self.high {
            Ok(())
        } else {
            Err(Error::InvalidBand {
                low: self.low,
                high: self.high,
            })
        }
    }
}

/// Which estimator to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectralMethod {
    #[default]
    Welch,
    Fft,
}

impl FromStr for SpectralMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "welch" => Ok(Self::Welch),
            "fft" => Ok(Self::Fft),
            other => Err(format!(
                "unknown spectral method `{other}` (expected welch or fft)"
            )),
        }
    }
}

impl fmt::Display for SpectralMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Welch => f.write_str("welch"),
            Self::Fft => f.write_str("fft"),
        }
    }
}

/// Trend removal applied to every Welch segment before windowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Detrend {
    None,
    Constant,
    #[default]
    Linear,
}

/// Tunables for Welch's method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WelchConfig {
    /// Upper bound on the segment length; shorter signals use their full length.
    pub segment_cap: usize,
    /// Samples shared by consecutive segments. `None` means half a segment.
    pub overlap: Option<usize>,
    pub detrend: Detrend,
}

impl Default for WelchConfig {
    fn default() -> Self {
        Self {
            segment_cap: DEFAULT_SEGMENT_CAP,
            overlap: None,
            detrend: Detrend::Linear,
        }
    }
}

impl WelchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.segment_cap == 0 {
            return Err(Error::InvalidWindow);
        }
        match self.overlap {
            Some(overlap) if overlap >= self.segment_cap => Err(Error::InvalidOverlap {
                overlap,
                segment: self.segment_cap,
            }),
            _ => Ok(()),
        }
    }
}

/// Estimate the power spectrum of `ts` with the selected method.
pub fn estimate_psd(
    ts: &TimeSeries,
    method: SpectralMethod,
    welch: &WelchConfig,
) -> Result<PowerSpectrum> {
    match method {
        SpectralMethod::Welch => welch_psd(ts, welch),
        SpectralMethod::Fft => fft_psd(ts),
    }
}

/// One-sided power spectral density by Welch's method.
///
/// Segments are `min(len, segment_cap)` samples long, detrended, weighted by a
/// periodic Hann window and transformed; their density-scaled periodograms
/// are averaged. A signal shorter than the cap becomes a single segment.
pub fn welch_psd(ts: &TimeSeries, cfg: &WelchConfig) -> Result<PowerSpectrum> {
    ts.validate()?;
    if cfg.segment_cap == 0 {
        return Err(Error::InvalidWindow);
    }
    let n = ts.len();
    let segment = n.min(cfg.segment_cap);
    let overlap = cfg.overlap.unwrap_or(segment / 2);
    if overlap >= segment {
        return Err(Error::InvalidOverlap { overlap, segment });
    }
    let step = segment - overlap;

    let window = hann(segment);
    let scale = 1.0 / (ts.fs * window.iter().map(|w| w * w).sum::<f64>());
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(segment);
    let mut spectrum = r2c.make_output_vec();
    let mut power = vec![0.0; spectrum.len()];
    let nyquist = (segment % 2 == 0).then_some(segment / 2);

    let mut pos = 0;
    let mut segments = 0;
    while pos + segment <= n {
        let mut frame = detrend(&ts.data[pos..pos + segment], cfg.detrend);
        for (x, w) in frame.iter_mut().zip(&window) {
            *x *= w;
        }
        r2c.process(&mut frame, &mut spectrum)?;
        for (k, (acc, val)) in power.iter_mut().zip(&spectrum).enumerate() {
            let sides = if k == 0 || Some(k) == nyquist { 1.0 } else { 2.0 };
            *acc += sides * val.norm_sqr() * scale;
        }
        segments += 1;
        pos += step;
    }
    debug!("welch: {n} samples, {segments} segment(s) of {segment}, step {step}");
    for p in power.iter_mut() {
        *p /= segments as f64;
    }

    let frequencies = (0..power.len())
        .map(|k| k as f64 * ts.fs / segment as f64)
        .collect();
    Ok(PowerSpectrum { frequencies, power })
}

/// Periodogram of the whole signal: `|X(f)|² / N` over non-negative frequencies.
pub fn fft_psd(ts: &TimeSeries) -> Result<PowerSpectrum> {
    ts.validate()?;
    let n = ts.len();
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(n);
    let mut buffer = ts.data.clone();
    let mut spectrum = r2c.make_output_vec();
    r2c.process(&mut buffer, &mut spectrum)?;

    // A full-length DFT has (n + 1) / 2 bins at frequencies >= 0; an even
    // length's Nyquist bin counts as negative.
    let keep = (n + 1) / 2;
    let power = spectrum[..keep]
        .iter()
        .map(|c| c.norm_sqr() / n as f64)
        .collect();
    let frequencies = (0..keep).map(|k| k as f64 * ts.fs / n as f64).collect();
    Ok(PowerSpectrum { frequencies, power })
}

fn detrend(segment: &[f64], policy: Detrend) -> Vec<f64> {
    if policy == Detrend::None {
        return segment.to_vec();
    }
    // Flat input has no fluctuation; keep it exactly zero.
    if segment.iter().all(|&v| v == segment[0]) {
        return vec![0.0; segment.len()];
    }
    match policy {
        Detrend::Constant => {
            let mean = segment.iter().sum::<f64>() / segment.len() as f64;
            segment.iter().map(|v| v - mean).collect()
        }
        _ => {
            let (slope, intercept) = linear_fit(segment);
            segment
                .iter()
                .enumerate()
                .map(|(i, &y)| y - (slope * i as f64 + intercept))
                .collect()
        }
    }
}

/// Least-squares line `(slope, intercept)` over sample indices, fitted around
/// the centre index.
fn linear_fit(segment: &[f64]) -> (f64, f64) {
    let n = segment.len() as f64;
    let mean_y = segment.iter().sum::<f64>() / n;
    if segment.len() < 2 {
        return (0.0, mean_y);
    }
    let mid = (n - 1.0) / 2.0;
    let (sxy, sxx) = segment
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sxy, sxx), (i, &y)| {
            let dx = i as f64 - mid;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });
    let slope = sxy / sxx;
    (slope, mean_y - slope * mid)
}

/// Periodic Hann window, the DFT-even form used for spectral estimation.
fn hann(size: usize) -> Vec<f64> {
    if size <= 1 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / size as f64).cos()))
        .collect()
}
