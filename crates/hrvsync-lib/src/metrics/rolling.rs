use crate::{
    error::{Error, Result},
    metrics::coherence::{coherence_score, CoherenceConfig, CoherencePhase, CoherenceResult},
    signal::RRSeries,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Default hop between consecutive windows, in seconds.
pub const DEFAULT_STEP_S: usize = 5;

/// One scored window. Field order matches the tabular column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingRecord {
    /// Sample offset of the window start.
    pub timestamp: usize,
    pub coherence_score: f64,
    pub peak_power: f64,
    pub total_power: f64,
    pub coherence_ratio: f64,
    pub phase: CoherencePhase,
    pub dominant_frequency: f64,
}

impl RollingRecord {
    pub fn new(timestamp: usize, result: &CoherenceResult) -> Self {
        Self {
            timestamp,
            coherence_score: result.score,
            peak_power: result.peak_power,
            total_power: result.total_power,
            coherence_ratio: result.coherence_ratio,
            phase: result.phase,
            dominant_frequency: result.dominant_frequency,
        }
    }
}

/// Scores of every window that could be scored, ordered by start offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingCoherenceSeries {
    /// Window length in seconds.
    pub window_size: usize,
    /// Hop between windows in seconds.
    pub step_size: usize,
    pub records: Vec<RollingRecord>,
}

/// Session figures derived from a rolling series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingSummary {
    pub window_count: usize,
    pub peak_score: f64,
    pub mean_score: f64,
    /// Seconds attributed to `high` windows, one step per window.
    pub time_in_coherence: f64,
}

impl RollingCoherenceSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn timestamps(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.timestamp).collect()
    }

    pub fn summary(&self) -> RollingSummary {
        let window_count = self.records.len();
        if window_count == 0 {
            return RollingSummary {
                window_count,
                peak_score: 0.0,
                mean_score: 0.0,
                time_in_coherence: 0.0,
            };
        }
        let peak_score = self
            .records
            .iter()
            .map(|r| r.coherence_score)
            .fold(0.0, f64::max);
        let mean_score =
            self.records.iter().map(|r| r.coherence_score).sum::<f64>() / window_count as f64;
        let high = self
            .records
            .iter()
            .filter(|r| r.phase == CoherencePhase::High)
            .count();
        RollingSummary {
            window_count,
            peak_score,
            mean_score,
            time_in_coherence: (high * self.step_size) as f64,
        }
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for record in &self.records {
            wtr.serialize(record)?;
        }
        if self.records.is_empty() {
            wtr.write_record([
                "timestamp",
                "coherence_score",
                "peak_power",
                "total_power",
                "coherence_ratio",
                "phase",
                "dominant_frequency",
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Start offsets of every full window of `window` samples, `step` apart.
pub fn window_offsets(len: usize, window: usize, step: usize) -> Vec<usize> {
    if window == 0 || step == 0 || len < window {
        return Vec::new();
    }
    (0..=len - window).step_by(step).collect()
}

/// Score overlapping windows of `rr` (milliseconds).
///
/// Windows are `window_size` seconds long and start every `step_size`
/// seconds; a trailing partial window is never evaluated. Windows that cannot
/// be scored are left out of the series rather than recorded as zero.
pub fn rolling_coherence(
    rr: &RRSeries,
    window_size: usize,
    step_size: usize,
    cfg: &CoherenceConfig,
) -> Result<RollingCoherenceSeries> {
    if window_size == 0 {
        return Err(Error::InvalidWindow);
    }
    if step_size == 0 {
        return Err(Error::InvalidStep);
    }
    cfg.validate()?;
    let window = cfg.samples_for(window_size);
    let step = cfg.samples_for(step_size);

    let mut records = Vec::new();
    for start in window_offsets(rr.len(), window, step) {
        let outcome = coherence_score(&rr.slice(start, window), window_size, cfg)?;
        match outcome.scored() {
            Some(result) => records.push(RollingRecord::new(start, &result)),
            None => debug!("rolling: window at {start} skipped ({outcome:?})"),
        }
    }
    Ok(RollingCoherenceSeries {
        window_size,
        step_size,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn resonant(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 1000.0 + 50.0 * (2.0 * PI * 0.1 * i as f64).sin())
            .collect()
    }

    #[test]
    fn offsets_count_full_windows_only() {
        assert_eq!(window_offsets(100, 30, 5).len(), 15);
        assert_eq!(window_offsets(30, 30, 5), vec![0]);
        assert_eq!(window_offsets(29, 30, 5), Vec::<usize>::new());
        assert_eq!(window_offsets(66, 30, 7), vec![0, 7, 14, 21, 28, 35]);
        for len in 30..80 {
            let expected = (len - 30) / 4 + 1;
            assert_eq!(window_offsets(len, 30, 4).len(), expected, "len {len}");
        }
    }

    #[test]
    fn resonant_recording_stays_high() {
        let rr = RRSeries::new(resonant(120));
        let series = rolling_coherence(&rr, 30, 5, &CoherenceConfig::default()).unwrap();
        assert_eq!(series.len(), 19);
        assert_eq!(series.timestamps(), (0..=90).step_by(5).collect::<Vec<_>>());
        assert!(series
            .records
            .iter()
            .all(|r| r.phase == CoherencePhase::High));

        let summary = series.summary();
        assert_eq!(summary.window_count, 19);
        assert_eq!(summary.time_in_coherence, 95.0);
        assert!(summary.peak_score >= summary.mean_score);
    }

    #[test]
    fn unscorable_windows_are_omitted() {
        let mut rr = vec![1000.0; 30];
        rr.extend(resonant(60));
        let series =
            rolling_coherence(&RRSeries::new(rr), 30, 5, &CoherenceConfig::default()).unwrap();
        assert_eq!(series.len(), 12);
        assert_eq!(series.records[0].timestamp, 5);
    }

    #[test]
    fn short_recording_gives_empty_series() {
        let rr = RRSeries::new(resonant(20));
        let series = rolling_coherence(&rr, 30, 5, &CoherenceConfig::default()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.summary().window_count, 0);
    }

    #[test]
    fn zero_step_is_rejected() {
        let rr = RRSeries::new(resonant(60));
        assert!(matches!(
            rolling_coherence(&rr, 30, 0, &CoherenceConfig::default()),
            Err(Error::InvalidStep)
        ));
    }

    #[test]
    fn csv_has_tabular_columns() {
        let rr = RRSeries::new(resonant(40));
        let series = rolling_coherence(&rr, 30, 5, &CoherenceConfig::default()).unwrap();
        let mut out = Vec::new();
        series.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,coherence_score,peak_power,total_power,coherence_ratio,phase,dominant_frequency")
        );
        assert_eq!(lines.count(), 3);
        assert!(text.contains(",high,"));
    }
}
