//! Robot driver interface.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{Result, StcError};
use crate::geometry::Point;
use crate::sensing::{LaserScan, Odometry};

/// Hardware or simulator behind the navigator.
///
/// Positions are in the odometry frame; the starting-point offset is applied
/// by the caller.
pub trait RobotDriver: Send {
    /// Try to bring the link up once.
    fn connect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    fn set_motor_power(&mut self, on: bool) -> Result<()>;

    fn is_powered(&self) -> bool;

    fn odometry(&mut self) -> Result<Odometry>;

    fn laser_scan(&mut self) -> Result<LaserScan>;

    /// Drive straight to `target` and return once there.
    fn move_to(&mut self, target: Point) -> Result<()>;

    /// Halt immediately.
    fn stop(&mut self) -> Result<()>;
}

/// Driver shared by the sensor and coverage threads.
pub type SharedDriver = Arc<Mutex<dyn RobotDriver>>;

/// Connect, retrying a fixed number of times with a fixed pause.
pub fn connect_with_retry(
    driver: &mut dyn RobotDriver,
    attempts: u32,
    backoff: Duration,
) -> Result<()> {
    for attempt in 1..=attempts {
        match driver.connect() {
            Ok(()) if driver.is_connected() => {
                info!("Robot connected (attempt {}/{})", attempt, attempts);
                return Ok(());
            }
            Ok(()) => warn!("Robot not ready (attempt {}/{})", attempt, attempts),
            Err(e) => warn!("Connection attempt {}/{} failed: {}", attempt, attempts, e),
        }
        if attempt < attempts {
            std::thread::sleep(backoff);
        }
    }
    Err(StcError::Connection(format!(
        "robot not reachable after {} attempts",
        attempts
    )))
}
