//! EEG monitor
//!
//! Command line entry point for one-shot analysis of recorded EEG and for
//! live monitoring of the simulated stream.
//!
//! # Usage
//!
//! ```bash
//! # Spectrum and statistics of every channel
//! eeg-monitor analyze recording.json
//!
//! # Epileptiform features of two channels
//! eeg-monitor analyze recording.json --kind epilepsy --channels Channel1,Channel2
//!
//! # Thirty seconds of simulated monitoring with the integrated analysis on
//! eeg-monitor stream --seconds 30 --seed 7 --integrated
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use eeg_core::{Montage, Recording};
use eeg_processing::{AnalysisConfig, AnalysisKind, Analyzer};
use eeg_streaming::{start_eeg_stream, AlertSeverity, StreamCommand, StreamConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{sleep, Duration};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// EEG spectral analysis and monitoring
#[derive(Parser, Debug)]
#[command(name = "eeg-monitor")]
#[command(author, version, about = "EEG spectral analysis and live monitoring", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse a recording stored as JSON
    Analyze {
        /// Recording file (`sample_rate` and `channels`)
        recording: PathBuf,

        #[arg(short, long, value_enum, default_value = "spectrum")]
        kind: Kind,

        /// Comma separated channel names, all channels when omitted
        #[arg(short, long, value_delimiter = ',')]
        channels: Vec<String>,

        /// Analysis configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Montage file, the standard eight channel layout when omitted
        #[arg(long)]
        montage: Option<PathBuf>,

        /// Seed for the scorer perturbation
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Monitor the simulated stream
    Stream {
        /// Monitoring duration
        #[arg(short, long, default_value = "10")]
        seconds: u64,

        /// Simulator and scorer seed
        #[arg(long)]
        seed: Option<u64>,

        /// Run the integrated analysis
        #[arg(long)]
        integrated: bool,

        /// Stream configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
    Spectrum,
    Statistics,
    Depression,
    Epilepsy,
    Neurodegenerative,
    Screening,
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn analyze(
    path: &Path,
    kind: Kind,
    channels: Vec<String>,
    config: Option<PathBuf>,
    montage: Option<PathBuf>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let recording: Recording = serde_json::from_str(&read(path)?)
        .with_context(|| format!("invalid recording {}", path.display()))?;
    let config = match config {
        Some(path) => AnalysisConfig::from_json(&read(&path)?)?,
        None => AnalysisConfig::default(),
    };
    let montage = match montage {
        Some(path) => Montage::from_json(&read(&path)?)?,
        None => Montage::default(),
    };

    let channels = if channels.is_empty() {
        recording
            .channel_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        channels
    };
    info!(
        "Analysing {} ({} channels, {:.1} s at {} Hz)",
        path.display(),
        channels.len(),
        recording.duration(),
        recording.sample_rate()
    );

    let analyzer = Analyzer::new(config, montage);
    let mut rng = seeded(seed);
    match kind {
        Kind::Spectrum => {
            print_json(&analyzer.analyze_batch(&recording, &channels, AnalysisKind::Spectrum)?)
        }
        Kind::Statistics => {
            print_json(&analyzer.analyze_batch(&recording, &channels, AnalysisKind::Statistics)?)
        }
        Kind::Depression => print_json(&analyzer.analyze_depression_features(&recording, &channels)?),
        Kind::Epilepsy => print_json(&analyzer.analyze_epilepsy_features(&recording, &channels)?),
        Kind::Neurodegenerative => print_json(&analyzer.analyze_neurodegenerative_features(
            &recording, &channels, &mut rng,
        )?),
        Kind::Screening => print_json(&analyzer.screen_conditions(&recording, &channels, &mut rng)?),
    }
}

async fn stream(
    seconds: u64,
    seed: Option<u64>,
    integrated: bool,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = match config {
        Some(path) => StreamConfig::from_json(&read(&path)?)?,
        None => StreamConfig::default(),
    };
    if seed.is_some() {
        config.simulator.seed = seed;
    }
    config.integrated.enabled |= integrated;

    let (mut alerts, mut results, control) = start_eeg_stream(config).await?;
    control.send(StreamCommand::Start).await?;
    info!("Monitoring for {} s", seconds);

    let deadline = sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,

            alert = alerts.recv() => match alert {
                Ok(alert) => match alert.severity {
                    AlertSeverity::Info => info!("[{}] {}", alert.severity, alert.message),
                    _ => warn!("[{}] {}", alert.severity, alert.message),
                },
                Err(RecvError::Lagged(skipped)) => warn!("Dropped {} alerts", skipped),
                Err(RecvError::Closed) => break,
            },

            output = results.recv() => match output {
                Ok(output) => println!("{}", serde_json::to_string(&output)?),
                Err(RecvError::Lagged(skipped)) => warn!("Dropped {} results", skipped),
                Err(RecvError::Closed) => break,
            },
        }
    }

    control.send(StreamCommand::Shutdown).await?;
    info!("Monitoring finished");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the JSON output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Analyze {
            recording,
            kind,
            channels,
            config,
            montage,
            seed,
        } => analyze(&recording, kind, channels, config, montage, seed),
        Commands::Stream {
            seconds,
            seed,
            integrated,
            config,
        } => stream(seconds, seed, integrated, config).await,
    }
}
