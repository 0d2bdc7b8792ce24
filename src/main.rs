//! motion-consensus - debounced motion classification daemon
//!
//! Samples a 3-axis accelerometer into a rolling frame, classifies the frame
//! periodically and prints a label only once recent frames agree.
//!
//! # Usage
//!
//! ```bash
//! # Simulated accelerometer (rest / walk / shake script)
//! cargo run --release
//!
//! # Replay a recorded trace, one JSON decision per line on stdout
//! cargo run --release -- --replay trace.csv --emit-json
//!
//! # Inspect the effective configuration
//! cargo run --release -- print-config
//! ```
//!
//! # Environment Variables
//!
//! - `MOTION_CONSENSUS_CONFIG`: Path to the device TOML config
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use motion_consensus::acquisition::{AccelerometerSource, ReplaySource, SimulatedAccelerometer};
use motion_consensus::config::DeviceConfig;
use motion_consensus::pipeline::{run_supervisor, Pipeline, ReportOptions, TaskName};
use motion_consensus::MotionEnergyClassifier;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "motion-consensus")]
#[command(about = "Debounced consensus voting over streaming accelerometer classifications")]
#[command(version)]
struct CliArgs {
    /// Path to the device config (overrides MOTION_CONSENSUS_CONFIG and ./motion_consensus.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Replay x,y,z rows from a CSV file instead of the simulated sensor
    #[arg(long, value_name = "CSV")]
    replay: Option<PathBuf>,

    /// Seed for the simulated sensor
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Fraction of simulated sensor reads that fail (0.0 - 1.0)
    #[arg(long, default_value = "0.0")]
    fault_rate: f64,

    /// Stop after this many decisions
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Write every decision to stdout as one JSON line
    #[arg(long)]
    emit_json: bool,

    /// Emit logs as JSON
    #[arg(long, env = "MOTION_CONSENSUS_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Print the effective configuration as TOML and exit
    PrintConfig,
    /// Validate the configuration and exit (non-zero on errors)
    CheckConfig,
}

// ============================================================================
// Setup
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr so stdout stays clean for --emit-json
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<DeviceConfig> {
    match path {
        Some(p) => {
            let config = DeviceConfig::load_from_file(p)
                .with_context(|| format!("Failed to load config from {}", p.display()))?;
            info!(path = %p.display(), device = %config.device.name, "Loaded device config");
            Ok(config)
        }
        None => DeviceConfig::load().context("Failed to load device config"),
    }
}

fn build_source(args: &CliArgs, config: &DeviceConfig) -> Result<Box<dyn AccelerometerSource>> {
    if let Some(path) = &args.replay {
        info!("📂 Input: replay trace {}", path.display());
        let source = ReplaySource::load(path)
            .with_context(|| format!("Failed to load replay trace {}", path.display()))?;
        return Ok(Box::new(source));
    }

    if !(0.0..=1.0).contains(&args.fault_rate) {
        return Err(anyhow::anyhow!(
            "--fault-rate must be within [0, 1] (got {})",
            args.fault_rate
        ));
    }

    let rate_hz = 1000.0 / config.sampling.interval_ms as f32;
    info!(
        seed = args.seed,
        fault_rate = args.fault_rate,
        "📥 Input: simulated accelerometer ({:.1} Hz)",
        rate_hz
    );
    Ok(Box::new(
        SimulatedAccelerometer::new(args.seed, rate_hz).with_fault_rate(args.fault_rate),
    ))
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    match &args.command {
        Some(SubCommand::PrintConfig) => {
            let config = load_config(args.config.as_ref())?;
            print!("{}", config.to_toml()?);
            return Ok(());
        }
        Some(SubCommand::CheckConfig) => {
            // Loading validates; any error exits non-zero
            let config = load_config(args.config.as_ref())?;
            println!("✓ Configuration valid ({})", config.device.name);
            return Ok(());
        }
        None => {}
    }

    let config = load_config(args.config.as_ref())?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  motion-consensus - {}", config.device.name);
    info!(
        "  Labels: {} | Frame: {} scalars | Vote: >{} of {}",
        config.model.labels.join(", "),
        config.sampling.frame_size,
        config.smoothing.min_readings_same,
        config.smoothing.readings
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let source = build_source(&args, &config)?;
    let classifier = MotionEnergyClassifier::from_config(&config.model, config.sampling.frame_size);

    let options = ReportOptions {
        emit_json: args.emit_json,
        max_cycles: args.max_cycles,
    };
    let pipeline = Pipeline::new(&config, source, classifier, options)
        .context("Failed to build pipeline")?;
    let counters = pipeline.counters();

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    info!("🔒 Supervisor: Initializing task monitoring");
    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    pipeline.spawn(&mut task_set, &cancel_token, std::io::stdout());

    let outcome = run_supervisor(&mut task_set, cancel_token).await;

    let stats = counters.snapshot();
    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Final statistics");
    info!("    Readings ingested:   {}", stats.readings_ingested);
    info!("    Sensor retries:      {}", stats.sensor_retries);
    info!("    Substituted reads:   {}", stats.sensor_substitutions);
    info!("    Cycles completed:    {}", stats.cycles_completed);
    info!("    Cycles skipped:      {}", stats.cycles_skipped);
    info!("    Records dropped:     {}", stats.records_dropped);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if stats.cycles_skipped > 0 {
        warn!("{} cycles were skipped due to classifier failures", stats.cycles_skipped);
    }

    outcome?;
    info!("✓ motion-consensus shutdown complete");
    Ok(())
}
