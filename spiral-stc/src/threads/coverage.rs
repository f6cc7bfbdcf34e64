//! Coverage thread: planner decisions and driving.
//!
//! This thread owns the planner and:
//! - Waits for the run command (or starts at once with `auto_run`)
//! - Feeds each fresh snapshot to the planner
//! - Drives to the chosen target and waits for a snapshot taken after arrival
//! - Handles operator commands between decisions

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::commands::{CommandReceiver, OperatorCommand};
use crate::config::StcConfig;
use crate::error::Result;
use crate::geometry::Point;
use crate::plans::{CoveragePlan, MoveIntent, create_plan};
use crate::robot::SharedDriver;
use crate::shared::{RobotSnapshot, SharedState};

/// Coverage thread state and logic.
pub struct CoverageThread {
    config: StcConfig,
    shared_state: Arc<SharedState>,
    driver: SharedDriver,
    commands: CommandReceiver,
    plan: Option<Box<dyn CoveragePlan>>,
    running: bool,
    /// Newest snapshot already acted upon
    consumed_seq: u64,
    holding: bool,
    last_status_time: Instant,
    status_interval: Duration,
}

impl CoverageThread {
    /// Create a new coverage thread.
    pub fn new(
        config: StcConfig,
        shared_state: Arc<SharedState>,
        driver: SharedDriver,
        commands: CommandReceiver,
    ) -> Self {
        let status_interval = Duration::from_secs(config.control.status_interval_secs);
        Self {
            config,
            shared_state,
            driver,
            commands,
            plan: None,
            running: false,
            consumed_seq: 0,
            holding: false,
            last_status_time: Instant::now(),
            status_interval,
        }
    }

    /// Run the coverage thread main loop.
    pub fn run(&mut self) {
        tracing::info!(
            "Coverage thread started ({}, max {} visits per cell)",
            self.config.plan.name.as_str(),
            self.config.plan.max_visits
        );

        if self.config.control.auto_run {
            self.start();
        } else {
            tracing::info!("Press 'r' to start covering");
        }

        let loop_interval = Duration::from_millis(self.config.control.decision_period_ms);

        loop {
            let loop_start = Instant::now();

            self.drain_commands();

            if self.shared_state.should_shutdown() {
                tracing::info!("Coverage thread shutting down");
                break;
            }

            if self.running && !self.shared_state.is_safety_stop() {
                let snapshot = self.shared_state.snapshot();
                if snapshot.seq > self.consumed_seq {
                    match self.step(snapshot) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => {
                            tracing::error!("Move failed: {}", e);
                            self.running = false;
                            self.shared_state
                                .trigger_safety_stop(format!("move failed: {}", e));
                        }
                    }
                }

                if self.last_status_time.elapsed() >= self.status_interval {
                    self.log_status(&snapshot);
                    self.last_status_time = Instant::now();
                }
            }

            let elapsed = loop_start.elapsed();
            if elapsed < loop_interval {
                std::thread::sleep(loop_interval - elapsed);
            }
        }

        if let Err(e) = self.driver.lock().stop() {
            tracing::error!("Failed to stop robot: {}", e);
        }
        tracing::info!("Coverage thread exited");
    }

    /// One decision; returns true once coverage is complete.
    fn step(&mut self, snapshot: RobotSnapshot) -> Result<bool> {
        self.consumed_seq = snapshot.seq;

        let plan_config = &self.config.plan;
        let plan = self.plan.get_or_insert_with(|| {
            tracing::info!(
                "Planning from ({:.2}, {:.2})",
                snapshot.pose.position.x,
                snapshot.pose.position.y
            );
            create_plan(plan_config, snapshot.pose)
        });

        let intent = plan.next_move(&snapshot.pose, snapshot.obstacles);
        self.shared_state.set_report(plan.report());

        match intent {
            MoveIntent::GoTo(target) => {
                self.holding = false;
                let start = self.config.plan.starting_point();
                let odom_target = Point::new(target.x - start.x, target.y - start.y);
                tracing::debug!("Moving to ({:.2}, {:.2})", target.x, target.y);

                let mut driver = self.driver.lock();
                driver.move_to(odom_target)?;
                // Anything published so far was sensed before arrival.
                self.consumed_seq = self.shared_state.snapshot().seq;
                Ok(false)
            }
            MoveIntent::Hold => {
                if !self.holding {
                    tracing::warn!(
                        "Holding at ({:.2}, {:.2}): way back is blocked",
                        snapshot.pose.position.x,
                        snapshot.pose.position.y
                    );
                    self.holding = true;
                }
                Ok(false)
            }
            MoveIntent::Complete => {
                let report = plan.report();
                tracing::info!("Coverage complete: {}", report);
                self.shared_state.set_report(report);
                self.shared_state.set_coverage_complete();
                self.running = false;
                self.driver.lock().stop()?;
                Ok(true)
            }
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: OperatorCommand) {
        tracing::debug!("Operator command: {:?}", command);
        match command {
            OperatorCommand::Run => {
                if self.running {
                    tracing::info!("Already covering");
                } else {
                    self.start();
                }
            }
            OperatorCommand::TogglePower => {
                let mut driver = self.driver.lock();
                let on = !driver.is_powered();
                match driver.set_motor_power(on) {
                    Ok(()) => {
                        tracing::info!("Motor power {}", if on { "on" } else { "off" });
                        if !on && self.running {
                            self.running = false;
                            tracing::info!("Coverage paused, press 'r' to resume");
                        }
                    }
                    Err(e) => tracing::error!("Failed to switch motor power: {}", e),
                }
            }
            OperatorCommand::ToggleLogging => {
                let on = self.shared_state.toggle_obstacle_logging();
                tracing::info!("Obstacle logging {}", if on { "on" } else { "off" });
            }
            OperatorCommand::Info => self.log_status(&self.shared_state.snapshot()),
            OperatorCommand::Quit => {
                tracing::info!("Quit requested");
                self.shared_state.signal_shutdown();
            }
        }
    }

    /// Power the motors if needed and start deciding.
    fn start(&mut self) {
        let mut driver = self.driver.lock();
        if !driver.is_powered()
            && let Err(e) = driver.set_motor_power(true)
        {
            tracing::error!("Failed to power motors: {}", e);
            return;
        }
        self.running = true;
        tracing::info!("Coverage running");
    }

    /// Log coverage status.
    fn log_status(&self, snapshot: &RobotSnapshot) {
        let progress = self
            .plan
            .as_ref()
            .map(|plan| plan.report().to_string())
            .unwrap_or_else(|| "not started".to_string());
        tracing::info!(
            "Covering: pose=({:.2}, {:.2}, {:.1}°), obstacles=[{}{}{}], scans={}, {}",
            snapshot.pose.position.x,
            snapshot.pose.position.y,
            snapshot.pose.heading.angle().to_degrees(),
            if snapshot.obstacles.right { "R" } else { "-" },
            if snapshot.obstacles.ahead { "A" } else { "-" },
            if snapshot.obstacles.left { "L" } else { "-" },
            self.shared_state.scan_count(),
            progress
        );
    }
}
