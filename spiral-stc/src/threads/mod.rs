//! Multi-threaded runtime for the coverage navigator.
//!
//! Separates concerns into three threads:
//! - Sensor thread: odometry and laser reading, snapshot publishing
//! - Coverage thread: planner decisions, driving, operator commands
//! - Operator thread: keyboard commands from stdin

mod coverage;
mod operator;
mod sensor;

pub use coverage::CoverageThread;
pub use operator::{forward_commands, spawn_operator};
pub use sensor::SensorThread;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::commands::CommandReceiver;
use crate::config::StcConfig;
use crate::error::Result;
use crate::robot::SharedDriver;
use crate::shared::SharedState;

/// Thread handles for the multi-threaded system.
pub struct ThreadHandles {
    pub sensor: JoinHandle<()>,
    pub coverage: JoinHandle<()>,
}

impl ThreadHandles {
    pub fn any_finished(&self) -> bool {
        self.sensor.is_finished() || self.coverage.is_finished()
    }
}

/// Spawn the sensor and coverage threads and return handles.
pub fn spawn_threads(
    config: StcConfig,
    shared_state: Arc<SharedState>,
    driver: SharedDriver,
    commands: CommandReceiver,
) -> Result<ThreadHandles> {
    let sensor_state = Arc::clone(&shared_state);
    let sensor_driver = Arc::clone(&driver);
    let mut sensor_thread = SensorThread::new(&config, sensor_state, sensor_driver);

    let sensor_handle = thread::Builder::new()
        .name("sensor".into())
        .spawn(move || {
            if let Err(e) = sensor_thread.run() {
                tracing::error!("Sensor thread error: {}", e);
            }
        })?;

    let coverage_handle = thread::Builder::new()
        .name("coverage".into())
        .spawn(move || {
            let mut coverage_thread = CoverageThread::new(config, shared_state, driver, commands);
            coverage_thread.run();
        })?;

    Ok(ThreadHandles {
        sensor: sensor_handle,
        coverage: coverage_handle,
    })
}
