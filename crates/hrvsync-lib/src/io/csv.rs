use crate::metrics::rolling::RollingCoherenceSeries;
use anyhow::{Context, Result};
use std::{fs::File, io::BufWriter, path::Path};

/// Write a rolling series to a CSV file.
pub fn write_rolling_csv(path: &Path, series: &RollingCoherenceSeries) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    series
        .write_csv(BufWriter::new(file))
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(feature = "polars")]
pub mod polars_io {
    use crate::metrics::rolling::RollingCoherenceSeries;
    use anyhow::Result;
    use polars::prelude::*;

    impl RollingCoherenceSeries {
        /// The rolling table as a data frame, one row per scored window.
        pub fn to_dataframe(&self) -> Result<DataFrame> {
            let col = |f: fn(&crate::metrics::rolling::RollingRecord) -> f64| -> Vec<f64> {
                self.records.iter().map(f).collect()
            };
            let timestamps: Vec<u64> = self.records.iter().map(|r| r.timestamp as u64).collect();
            let phases: Vec<&str> = self.records.iter().map(|r| r.phase.as_str()).collect();
            let df = DataFrame::new(vec![
                Series::new("timestamp".into(), timestamps),
                Series::new("coherence_score".into(), col(|r| r.coherence_score)),
                Series::new("peak_power".into(), col(|r| r.peak_power)),
                Series::new("total_power".into(), col(|r| r.total_power)),
                Series::new("coherence_ratio".into(), col(|r| r.coherence_ratio)),
                Series::new("phase".into(), phases),
                Series::new("dominant_frequency".into(), col(|r| r.dominant_frequency)),
            ])?;
            Ok(df)
        }
    }
}
