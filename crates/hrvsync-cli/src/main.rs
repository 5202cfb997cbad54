use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use hrvsync_lib::{
    config::AnalysisConfig,
    io::text::{read_f64_series, read_f64_series_or_stdin},
    metrics::{
        coherence::coherence_score,
        group::{group_coherence_summary, group_sync_matrix},
        rolling::rolling_coherence,
        sync::{synchronization, AlignmentPolicy},
    },
    signal::{RRSeries, TimeSeries},
    spectral::{estimate_psd, SpectralMethod},
};
use log::info;
use serde::Serialize;
use std::{
    io,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "hrvsync",
    version,
    about = "Heart-rhythm coherence and group synchronization tools"
)]
struct Cli {
    /// TOML file with analysis settings; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Logging verbosity (e.g., debug, info, warn)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct RateArgs {
    /// Samples per second of the input series
    #[arg(long)]
    fs: Option<f64>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RollingFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Coherence score of newline-delimited R-R intervals (ms) from stdin or --input
    Coherence {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Minimum window in seconds
        #[arg(long)]
        window_size: Option<usize>,
        #[command(flatten)]
        rate: RateArgs,
    },
    /// Power spectrum of a series
    Psd {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        method: Option<SpectralMethod>,
        /// Treat the input as milliseconds and convert to seconds first
        #[arg(long)]
        ms: bool,
        #[command(flatten)]
        rate: RateArgs,
    },
    /// Sliding-window coherence over a long recording
    Rolling {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        window_size: Option<usize>,
        #[arg(long)]
        step_size: Option<usize>,
        #[arg(long, value_enum, default_value = "json")]
        format: RollingFormat,
        #[command(flatten)]
        rate: RateArgs,
    },
    /// Pairwise synchronization of two series
    Sync {
        #[arg(long)]
        a: PathBuf,
        #[arg(long)]
        b: PathBuf,
        #[arg(long)]
        alignment: Option<AlignmentPolicy>,
    },
    /// Synchronization matrix of a group, one --input per participant
    GroupMatrix {
        #[arg(long = "input", required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        alignment: Option<AlignmentPolicy>,
    },
    /// Group summary of per-participant coherence scores
    GroupSummary {
        #[arg(long)]
        scores: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level.as_str())).init();
    let mut cfg = match cli.config.as_deref() {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    match cli.command {
        Commands::Coherence {
            input,
            window_size,
            rate,
        } => {
            apply_overrides(&mut cfg, rate, window_size, None)?;
            cmd_coherence(input.as_deref(), &cfg)?
        }
        Commands::Psd {
            input,
            method,
            ms,
            rate,
        } => {
            if let Some(method) = method {
                cfg.method = method;
            }
            apply_overrides(&mut cfg, rate, None, None)?;
            cmd_psd(input.as_deref(), ms, &cfg)?
        }
        Commands::Rolling {
            input,
            window_size,
            step_size,
            format,
            rate,
        } => {
            apply_overrides(&mut cfg, rate, window_size, step_size)?;
            cmd_rolling(input.as_deref(), format, &cfg)?
        }
        Commands::Sync { a, b, alignment } => {
            if let Some(alignment) = alignment {
                cfg.alignment = alignment;
            }
            cmd_sync(&a, &b, &cfg)?
        }
        Commands::GroupMatrix { inputs, alignment } => {
            if let Some(alignment) = alignment {
                cfg.alignment = alignment;
            }
            cmd_group_matrix(&inputs, &cfg)?
        }
        Commands::GroupSummary { scores } => cmd_group_summary(scores.as_deref())?,
    }
    Ok(())
}

fn apply_overrides(
    cfg: &mut AnalysisConfig,
    rate: RateArgs,
    window_size: Option<usize>,
    step_size: Option<usize>,
) -> Result<()> {
    if let Some(fs) = rate.fs {
        cfg.sampling_rate = fs;
    }
    if let Some(window_size) = window_size {
        cfg.window_size = window_size;
    }
    if let Some(step_size) = step_size {
        cfg.step_size = step_size;
    }
    cfg.validate().context("invalid analysis settings")?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn rr_series_from_input(input: Option<&Path>) -> Result<RRSeries> {
    let rr = read_f64_series_or_stdin(input)?;
    info!("read {} intervals", rr.len());
    Ok(RRSeries { rr })
}

fn cmd_coherence(input: Option<&Path>, cfg: &AnalysisConfig) -> Result<()> {
    let rr = rr_series_from_input(input)?;
    let outcome = coherence_score(&rr, cfg.window_size, &cfg.coherence())?;
    print_json(&outcome)
}

fn cmd_psd(input: Option<&Path>, ms: bool, cfg: &AnalysisConfig) -> Result<()> {
    let data = read_f64_series_or_stdin(input)?;
    let ts = if ms {
        RRSeries { rr: data }.to_seconds(cfg.sampling_rate)
    } else {
        TimeSeries::new(cfg.sampling_rate, data)
    };
    let psd = estimate_psd(&ts, cfg.method, &cfg.welch)?;
    print_json(&psd)
}

fn cmd_rolling(input: Option<&Path>, format: RollingFormat, cfg: &AnalysisConfig) -> Result<()> {
    let rr = rr_series_from_input(input)?;
    let series = rolling_coherence(&rr, cfg.window_size, cfg.step_size, &cfg.coherence())?;
    info!("{} window(s) scored", series.len());
    match format {
        RollingFormat::Json => print_json(&series),
        RollingFormat::Csv => series.write_csv(io::stdout().lock()),
    }
}

fn cmd_sync(a: &Path, b: &Path, cfg: &AnalysisConfig) -> Result<()> {
    let a = read_f64_series(a)?;
    let b = read_f64_series(b)?;
    let result = synchronization(&a, &b, &cfg.sync())?;
    print_json(&result)
}

fn cmd_group_matrix(inputs: &[PathBuf], cfg: &AnalysisConfig) -> Result<()> {
    let signals = inputs
        .iter()
        .map(|path| read_f64_series(path))
        .collect::<Result<Vec<_>>>()?;
    let matrix = group_sync_matrix(&signals, &cfg.sync())?;
    print_json(&matrix)
}

fn cmd_group_summary(scores: Option<&Path>) -> Result<()> {
    let scores = read_f64_series_or_stdin(scores)?;
    print_json(&group_coherence_summary(&scores))
}
