//! EEG stress monitor - headless runner against a simulated board

use anyhow::{bail, Context};
use clap::Parser;
use eeg_monitor::{LogPresentation, MonitorConfig, SessionEnd, SessionLoop};
use eeg_processing::BoardProfile;
use eeg_simulation::{Scenario, StreamingBoard};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Baseline-relative EEG stress monitor
#[derive(Parser, Debug)]
#[command(name = "eeg-monitor")]
#[command(version, about = "Classify EEG windows as stressed or relaxed against a session baseline", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults to the board preset)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Board preset used when no configuration file is given: cyton or ganglion
    #[arg(long, default_value = "cyton")]
    board: String,

    /// Number of monitoring cycles
    #[arg(long)]
    cycles: Option<usize>,

    /// Pause between cycles in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Simulated scenario: relaxed, stressed, stress-onset or alternating
    #[arg(long)]
    scenario: Option<String>,

    /// Seed for the simulated board noise
    #[arg(long)]
    seed: Option<u64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => MonitorConfig::for_board(parse_board(&self.board)?),
        };

        if let Some(cycles) = self.cycles {
            config.session.cycles = cycles;
        }
        if let Some(delay) = self.delay_ms {
            config.session.inter_cycle_delay_ms = delay;
        }
        if let Some(name) = &self.scenario {
            config.simulation.simulation.scenario = name.parse::<Scenario>()?;
        }
        if self.seed.is_some() {
            config.simulation.simulation.seed = self.seed;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn parse_board(name: &str) -> anyhow::Result<BoardProfile> {
    match name.to_ascii_lowercase().as_str() {
        "cyton" => Ok(BoardProfile::Cyton),
        "ganglion" => Ok(BoardProfile::Ganglion),
        other => bail!("unknown board '{}', expected cyton or ganglion", other),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    info!(
        board = %config.processing.name,
        scenario = %config.simulation.simulation.scenario.name,
        "starting EEG stress monitor"
    );

    let board = StreamingBoard::start(config.simulation.clone()).context("starting simulated board")?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current cycle");
            ctrl_c_token.cancel();
        }
    });

    let session = SessionLoop::new(config.session.clone(), board, LogPresentation::new(), cancel)
        .with_processing(config.processing.clone());
    let report = session.run().await.context("session setup failed")?;

    println!("{}", serde_json::to_string_pretty(&report.summary())?);

    if let SessionEnd::Aborted(error) = report.end {
        bail!("session aborted: {}", error);
    }
    Ok(())
}
