//! # Crescendo Robot
//!
//! Runs the robot control core against simulated hardware: loads and
//! validates the configuration, builds the container, schedules the
//! selected autonomous routine and drives the fixed-period cycle until the
//! period budget is spent or Ctrl-C is received.

use clap::Parser;
use crescendo_common::config::LogLevel;
use crescendo_common::consts::DEFAULT_CONFIG_PATH;
use crescendo_common::robot::config::RobotConfig;
use crescendo_common::telemetry::Telemetry;
use crescendo_robot::container::RobotContainer;
use crescendo_robot::cycle::{CycleRunner, rt_setup};
use crescendo_robot::hal::sim::ScriptedInput;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Crescendo robot control core on simulated hardware
#[derive(Parser, Debug)]
#[command(name = "crescendo_robot")]
#[command(version)]
#[command(about = "Command scheduler and subsystem control for the Crescendo robot")]
struct Args {
    /// Path to the robot configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Autonomous routine to run (by name).
    #[arg(long, value_name = "NAME")]
    auto: Option<String>,

    /// Number of periods to run (default: 750, one 15 s autonomous phase at 50 Hz).
    #[arg(long, default_value_t = 750)]
    periods: u64,

    /// CPU core to pin the cycle thread to (`rt` builds only).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    // Tracing comes up after the config so its log level applies.
    let config = RobotConfig::load_validated(&args.config);
    setup_tracing(&args, config.as_ref().ok().map(|c| c.shared.log_level));

    let result = config
        .map_err(Into::into)
        .and_then(|config| run(&args, &config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Crescendo robot shutdown complete");
}

fn run(args: &Args, config: &RobotConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "Config OK: period={}ms, routines={}",
        config.period_ms,
        config.routines.len()
    );

    let (mut container, _sim) = RobotContainer::simulated(config, Telemetry::default())?;
    if let Some(name) = &args.auto {
        container.chooser_mut().select(name.clone());
    }
    container.set_motor_brake(true);
    container.autonomous_init()?;

    rt_setup(args.cpu_core)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut runner = CycleRunner::new(container, ScriptedInput::idle(), running)?
        .with_max_periods(args.periods);
    info!("CycleRunner initialized, running {} periods", args.periods);
    runner.run()?;

    let stats = runner.stats();
    info!(
        "cycles={} avg={}ns min={}ns max={}ns overruns={}",
        stats.cycle_count,
        stats.avg_cycle_ns(),
        if stats.cycle_count == 0 { 0 } else { stats.min_cycle_ns },
        stats.max_cycle_ns,
        stats.overruns
    );

    let mut container = runner.into_container();
    container.disabled_init();
    let arm = &container.ctx().subsystems.arm;
    info!("final arm position {:.3} rot (goal {:?})", arm.position(), arm.goal());
    Ok(())
}

/// Filter directive used when `RUST_LOG` is unset.
fn log_directive(verbose: bool, configured: Option<LogLevel>) -> &'static str {
    if verbose {
        LogLevel::Debug.as_directive()
    } else {
        configured.unwrap_or_default().as_directive()
    }
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: Option<LogLevel>) {
    let directive = log_directive(args.verbose, configured);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
