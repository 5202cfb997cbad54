//! Heart-rhythm coherence and group synchronization from R-R interval series.

pub mod config;
pub mod error;
pub mod io;
pub mod metrics;
pub mod signal;
pub mod spectral;

pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use metrics::*;
pub use signal::*;
pub use spectral::*;
