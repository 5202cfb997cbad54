//! Pairwise synchronization between two simultaneous rhythms.
//!
//! Combines linear (Pearson) correlation with the phase-locking value of the
//! two instantaneous-phase tracks obtained from their analytic signals.

use crate::{error::Result, signal::validate_samples};
use log::warn;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// How two series of different length are brought to a common length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentPolicy {
    /// Drop the tail of the longer series.
    #[default]
    Truncate,
    /// Linearly resample the longer series onto the shorter one's length.
    Interpolate,
}

impl FromStr for AlignmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "truncate" => Ok(Self::Truncate),
            "interpolate" => Ok(Self::Interpolate),
            other => Err(format!(
                "unknown alignment `{other}` (expected truncate or interpolate)"
            )),
        }
    }
}

impl fmt::Display for AlignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncate => f.write_str("truncate"),
            Self::Interpolate => f.write_str("interpolate"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub alignment: AlignmentPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynchronizationResult {
    /// Pearson correlation in [-1, 1]; 0 when undefined.
    pub correlation: f64,
    /// Phase-locking value in [0, 1].
    pub phase_sync_index: f64,
    /// Mean of `correlation` and `phase_sync_index`.
    pub sync_strength: f64,
}

/// Compare two series sample by sample.
///
/// Empty or non-finite input is rejected. Correlation falls back to 0 when
/// it is undefined (fewer than two samples, or a flat series).
pub fn synchronization(a: &[f64], b: &[f64], cfg: &SyncConfig) -> Result<SynchronizationResult> {
    validate_samples(a)?;
    validate_samples(b)?;
    let (a, b) = align(a, b, cfg.alignment);

    let correlation = pearson_correlation(&a, &b).unwrap_or_else(|| {
        warn!(
            "correlation undefined for {} aligned samples (flat or too short); using 0",
            a.len()
        );
        0.0
    });
    let phase_a = instantaneous_phase(&a);
    let phase_b = instantaneous_phase(&b);
    let phase_sync_index = phase_locking_value(&phase_a, &phase_b);

    Ok(SynchronizationResult {
        correlation,
        phase_sync_index,
        sync_strength: (correlation + phase_sync_index) / 2.0,
    })
}

fn align(a: &[f64], b: &[f64], policy: AlignmentPolicy) -> (Vec<f64>, Vec<f64>) {
    let len = a.len().min(b.len());
    match policy {
        AlignmentPolicy::Truncate => (a[..len].to_vec(), b[..len].to_vec()),
        AlignmentPolicy::Interpolate => (resample(a, len), resample(b, len)),
    }
}

/// Linear resampling of `data` onto `len` evenly spaced points spanning the
/// same interval.
pub fn resample(data: &[f64], len: usize) -> Vec<f64> {
    if len == data.len() {
        return data.to_vec();
    }
    if len <= 1 || data.len() == 1 {
        return data.iter().copied().take(1).cycle().take(len).collect();
    }
    let last = data.len() - 1;
    let scale = last as f64 / (len - 1) as f64;
    (0..len)
        .map(|j| {
            let t = j as f64 * scale;
            let i0 = (t.floor() as usize).min(last);
            let i1 = (i0 + 1).min(last);
            let frac = t - i0 as f64;
            data[i0] * (1.0 - frac) + data[i1] * frac
        })
        .collect()
}

/// Pearson correlation of two equal-length series, or `None` when undefined.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some((cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0))
}

/// Analytic signal `x + i·H{x}` computed in the frequency domain.
pub fn analytic_signal(data: &[f64]) -> Vec<Complex<f64>> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);

    let mut buffer: Vec<Complex<f64>> = data.iter().map(|&x| Complex::new(x, 0.0)).collect();
    forward.process(&mut buffer);
    // Keep DC (and Nyquist for even n), double positive bins, zero negative ones.
    let positive_end = (n + 1) / 2;
    for (k, c) in buffer.iter_mut().enumerate() {
        let gain = if k == 0 || (n % 2 == 0 && k == n / 2) {
            1.0
        } else if k < positive_end {
            2.0
        } else {
            0.0
        };
        *c *= gain;
    }
    inverse.process(&mut buffer);
    let norm = 1.0 / n as f64;
    for c in buffer.iter_mut() {
        *c *= norm;
    }
    buffer
}

/// Wrapped instantaneous phase (radians) of the analytic signal.
pub fn instantaneous_phase(data: &[f64]) -> Vec<f64> {
    analytic_signal(data).iter().map(|c| c.arg()).collect()
}

/// Magnitude of the mean unit phasor of the phase differences.
pub fn phase_locking_value(phase_a: &[f64], phase_b: &[f64]) -> f64 {
    let n = phase_a.len().min(phase_b.len());
    if n == 0 {
        return 0.0;
    }
    let (re, im) = phase_a
        .iter()
        .zip(phase_b)
        .fold((0.0, 0.0), |(re, im), (pa, pb)| {
            let d = pa - pb;
            (re + d.cos(), im + d.sin())
        });
    (re / n as f64).hypot(im / n as f64)
}
