use thiserror::Error;

/// Caller misuse detected at the library boundary.
///
/// Short or flat recordings are not errors; scoring reports those through
/// [`crate::metrics::coherence::CoherenceOutcome`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("sampling rate must be positive and finite, got {0}")]
    InvalidSamplingRate(f64),
    #[error("signal contains no samples")]
    EmptySignal,
    #[error("sample {index} is not finite")]
    NonFiniteSample { index: usize },
    #[error("window size must be at least one sample")]
    InvalidWindow,
    #[error("step size must be at least one sample")]
    InvalidStep,
    #[error("overlap of {overlap} samples must be smaller than the {segment}-sample segment")]
    InvalidOverlap { overlap: usize, segment: usize },
    #[error("invalid frequency band [{low}, {high}] Hz")]
    InvalidBand { low: f64, high: f64 },
    #[error("FFT failed: {0}")]
    Fft(#[from] realfft::FftError),
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
