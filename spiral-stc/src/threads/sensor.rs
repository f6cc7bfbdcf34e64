//! Sensor thread: odometry and laser reading, snapshot publishing.
//!
//! Each cycle reads odometry and one laser scan, shifts the pose into the
//! plan frame, classifies the sweep into right/ahead/left sectors and
//! publishes both as one [`RobotSnapshot`](crate::shared::RobotSnapshot).

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::StcConfig;
use crate::error::Result;
use crate::geometry::Point;
use crate::plans::Obstacles;
use crate::robot::SharedDriver;
use crate::sensing::{ObstacleDetector, plan_pose};
use crate::shared::SharedState;

/// Sensor thread state and logic.
pub struct SensorThread {
    shared_state: Arc<SharedState>,
    driver: SharedDriver,
    detector: ObstacleDetector,
    starting_point: Point,
    period: Duration,
    /// Last flags reported while obstacle logging is on
    last_logged: Obstacles,
}

impl SensorThread {
    /// Create a new sensor thread.
    pub fn new(config: &StcConfig, shared_state: Arc<SharedState>, driver: SharedDriver) -> Self {
        Self {
            shared_state,
            driver,
            detector: ObstacleDetector::new(&config.sensing, config.plan.robot_size),
            starting_point: config.plan.starting_point(),
            period: Duration::from_millis(config.control.sensor_period_ms),
            last_logged: Obstacles::CLEAR,
        }
    }

    /// Run the sensor thread main loop.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!(
            "Sensor thread started (obstacle reach {:.2}m)",
            self.detector.reach()
        );

        loop {
            let loop_start = Instant::now();

            if self.shared_state.should_shutdown() {
                tracing::info!("Sensor thread shutting down");
                break;
            }

            if let Err(e) = self.sense() {
                tracing::error!("Sensor read failed: {}", e);
                self.shared_state
                    .trigger_safety_stop(format!("sensor read failed: {}", e));
                return Err(e);
            }

            let elapsed = loop_start.elapsed();
            if elapsed < self.period {
                std::thread::sleep(self.period - elapsed);
            }
        }

        Ok(())
    }

    /// Read, classify and publish one snapshot.
    ///
    /// The driver stays locked until the snapshot is published, so a move
    /// that completes afterwards is never paired with an older reading.
    fn sense(&mut self) -> Result<()> {
        let mut driver = self.driver.lock();
        let odometry = driver.odometry()?;
        let scan = driver.laser_scan()?;

        let pose = plan_pose(&odometry, self.starting_point);
        let obstacles = self.detector.detect(&scan);
        self.shared_state.publish(pose, obstacles);
        drop(driver);

        if self.shared_state.is_obstacle_logging() {
            if obstacles.any() && obstacles != self.last_logged {
                tracing::warn!(
                    "Obstacle at ({:.2}, {:.2}): right={} ahead={} left={}",
                    pose.position.x,
                    pose.position.y,
                    obstacles.right,
                    obstacles.ahead,
                    obstacles.left
                );
            }
            self.last_logged = obstacles;
        }
        Ok(())
    }
}
