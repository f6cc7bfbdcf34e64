//! Shared state for the multi-threaded runtime.
//!
//! Provides thread-safe state between:
//! - Sensor thread (odometry, laser sectors, snapshot publishing)
//! - Coverage thread (planner decisions, driving, operator commands)
//! - Main thread (monitoring, final report)

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::geometry::Pose;
use crate::plans::{CoverageReport, Obstacles};

/// Pose and obstacle flags captured together.
///
/// Published under a single lock so a reader never pairs a pose with flags
/// sensed somewhere else.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RobotSnapshot {
    /// Increases with every publish; 0 means nothing published yet.
    pub seq: u64,
    pub pose: Pose,
    pub obstacles: Obstacles,
}

/// Cooperative stop signal shared by every thread.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Shared state between all threads.
#[derive(Debug, Default)]
pub struct SharedState {
    /// Latest sensed snapshot (updated by sensor thread)
    snapshot: Mutex<RobotSnapshot>,

    /// Shutdown signal for graceful termination
    pub shutdown: CancellationToken,

    /// Safety stop flag
    safety_stop: AtomicBool,

    /// Safety stop reason (if any)
    safety_reason: Mutex<Option<String>>,

    /// Coverage complete flag
    coverage_complete: AtomicBool,

    /// Report obstacle sectors as they are sensed
    obstacle_logging: AtomicBool,

    /// Number of snapshots published (for status reporting)
    scan_count: AtomicU64,

    /// Latest planner report (updated by coverage thread)
    report: Mutex<Option<CoverageReport>>,
}

impl SharedState {
    /// Create new shared state bound to an existing cancellation token.
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            shutdown,
            ..Default::default()
        }
    }

    /// Publish a new snapshot and return its sequence number.
    pub fn publish(&self, pose: Pose, obstacles: Obstacles) -> u64 {
        let mut snapshot = self.snapshot.lock();
        snapshot.seq += 1;
        snapshot.pose = pose;
        snapshot.obstacles = obstacles;
        self.scan_count.fetch_add(1, Ordering::Relaxed);
        snapshot.seq
    }

    /// Copy of the latest snapshot.
    pub fn snapshot(&self) -> RobotSnapshot {
        *self.snapshot.lock()
    }

    /// Trigger safety stop with reason.
    pub fn trigger_safety_stop(&self, reason: String) {
        *self.safety_reason.lock() = Some(reason);
        self.safety_stop.store(true, Ordering::Release);
    }

    /// Check if safety stop is triggered.
    pub fn is_safety_stop(&self) -> bool {
        self.safety_stop.load(Ordering::Acquire)
    }

    /// Get safety stop reason.
    pub fn safety_reason(&self) -> Option<String> {
        self.safety_reason.lock().clone()
    }

    /// Signal shutdown.
    pub fn signal_shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Check if shutdown is signaled.
    pub fn should_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Mark coverage as complete.
    pub fn set_coverage_complete(&self) {
        self.coverage_complete.store(true, Ordering::Release);
    }

    /// Check if coverage is complete.
    pub fn is_coverage_complete(&self) -> bool {
        self.coverage_complete.load(Ordering::Acquire)
    }

    /// Flip obstacle logging, returning the new setting.
    pub fn toggle_obstacle_logging(&self) -> bool {
        !self.obstacle_logging.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn is_obstacle_logging(&self) -> bool {
        self.obstacle_logging.load(Ordering::Acquire)
    }

    /// Get scan count.
    pub fn scan_count(&self) -> u64 {
        self.scan_count.load(Ordering::Relaxed)
    }

    pub fn set_report(&self, report: CoverageReport) {
        *self.report.lock() = Some(report);
    }

    pub fn report(&self) -> Option<CoverageReport> {
        self.report.lock().clone()
    }
}
