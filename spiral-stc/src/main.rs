//! Spiral-STC navigator binary.
//!
//! Loads the configuration, brings up the simulated robot and runs the
//! coverage runtime until completion, a safety stop, `q` or Ctrl-C.
//!
//! Keys (type and press enter):
//! - `r`: start covering
//! - `p`: toggle motor power
//! - `l`: toggle obstacle logging
//! - `i`: print status
//! - `q`: quit

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use spiral_stc::commands::create_command_channel;
use spiral_stc::config::{PlanKind, StcConfig};
use spiral_stc::error::{Result, StcError};
use spiral_stc::robot::{SharedDriver, connect_with_retry};
use spiral_stc::shared::{CancellationToken, SharedState};
use spiral_stc::sim::{GridWorld, SimulatedRobot};
use spiral_stc::threads::{spawn_operator, spawn_threads};

/// Configuration file looked up when none is given.
const DEFAULT_CONFIG: &str = "spiral-stc.toml";

#[derive(Parser, Debug)]
#[command(version, about = "Online Spiral-STC coverage navigator")]
struct Args {
    /// TOML configuration file
    config: Option<PathBuf>,

    /// Override the coverage algorithm
    #[arg(long, value_enum)]
    plan: Option<PlanKind>,

    /// Start covering without waiting for 'r'
    #[arg(long)]
    auto_run: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("spiral_stc=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            StcConfig::load(path)?
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            info!("Loading configuration from {}", DEFAULT_CONFIG);
            StcConfig::load(Path::new(DEFAULT_CONFIG))?
        }
        None => {
            info!("Using default configuration");
            StcConfig::default()
        }
    };

    if let Some(plan) = args.plan {
        config.plan.name = plan;
    }
    if args.auto_run {
        config.control.auto_run = true;
    }
    config.validate()?;
    if config.plan.name == PlanKind::SpiralStc && config.sensing.threshold_range < 1.0 {
        warn!(
            "sensing.threshold_range {:.2} stops short of the neighbouring cells",
            config.sensing.threshold_range
        );
    }

    info!("Spiral-STC v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Plan: {}, robot size {:.2}m, cell size {:.2}m",
        config.plan.name.as_str(),
        config.plan.robot_size,
        config.plan.cell_size()
    );

    // Simulated robot
    let world = GridWorld::load(&config.simulation.map_path, config.plan.robot_size)?;
    info!(
        "Map {}: {}x{} squares, {} free",
        config.simulation.map_path,
        world.width(),
        world.height(),
        world.free_squares().len()
    );
    let mut robot = SimulatedRobot::from_config(world, &config.plan, &config.simulation)?;
    connect_with_retry(
        &mut robot,
        config.connection.retry_attempts,
        Duration::from_millis(config.connection.retry_backoff_ms),
    )?;
    let driver: SharedDriver = Arc::new(Mutex::new(robot));

    // Set up shutdown signal handler
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        token.cancel();
    })
    .map_err(|e| StcError::Io(std::io::Error::other(format!("Error setting Ctrl-C handler: {}", e))))?;

    let shared_state = Arc::new(SharedState::new(shutdown));
    let (command_tx, command_rx) = create_command_channel();

    info!("Starting coverage runtime...");
    let handles = spawn_threads(
        config.clone(),
        Arc::clone(&shared_state),
        Arc::clone(&driver),
        command_rx,
    )?;
    // Blocked on stdin; left detached.
    spawn_operator(command_tx)?;

    // Main thread: Monitor and wait for completion
    let check_interval = Duration::from_millis(500);

    loop {
        std::thread::sleep(check_interval);

        if shared_state.is_safety_stop() {
            warn!(
                "Safety stop: {}",
                shared_state
                    .safety_reason()
                    .unwrap_or_else(|| "unknown".to_string())
            );
            break;
        }

        if shared_state.is_coverage_complete() {
            info!("Coverage completed successfully");
            break;
        }

        if shared_state.should_shutdown() {
            info!("Shutdown requested");
            break;
        }

        if handles.any_finished() {
            warn!("A worker thread exited unexpectedly");
            break;
        }
    }

    // Signal shutdown to all threads
    shared_state.signal_shutdown();

    info!("Waiting for threads to finish...");
    if let Err(e) = handles.sensor.join() {
        error!("Sensor thread panicked: {:?}", e);
    }
    if let Err(e) = handles.coverage.join() {
        error!("Coverage thread panicked: {:?}", e);
    }

    match shared_state.report() {
        Some(report) => info!("Coverage report: {}", report),
        None => info!("Coverage never started"),
    }

    info!("Spiral-STC finished");
    Ok(())
}
