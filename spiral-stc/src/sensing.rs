//! Turning raw odometry and laser scans into planner inputs.

use std::f64::consts::FRAC_PI_2;

use crate::config::SensingConfig;
use crate::geometry::{Point, Pose, Vector};
use crate::plans::Obstacles;

/// Odometry reading: position plus planar orientation quaternion.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Odometry {
    pub position: Point,
    /// Quaternion w component
    pub qw: f64,
    /// Quaternion z component
    pub qz: f64,
}

impl Odometry {
    /// Reading for a heading angle in radians.
    pub fn from_heading(position: Point, angle: f64) -> Self {
        Self {
            position,
            qw: (angle / 2.0).cos(),
            qz: (angle / 2.0).sin(),
        }
    }
}

/// Laser sweep, beams ordered from `angle_min` (rightmost) to `angle_max`.
#[derive(Clone, Debug, Default)]
pub struct LaserScan {
    pub angle_min: f64,
    pub angle_max: f64,
    pub range_max: f64,
    pub ranges: Vec<f64>,
}

/// Heading direction encoded by a yaw-only quaternion.
pub fn heading_from_quaternion(qw: f64, qz: f64) -> Vector {
    Vector::new(qw * qw - qz * qz, 2.0 * qw * qz)
}

/// Plan-frame pose: odometry shifted by the starting point.
pub fn plan_pose(odometry: &Odometry, starting_point: Point) -> Pose {
    Pose::new(
        Point::new(
            odometry.position.x + starting_point.x,
            odometry.position.y + starting_point.y,
        ),
        heading_from_quaternion(odometry.qw, odometry.qz),
    )
}

/// Splits a scan into right, front and left sectors and flags the busy ones.
#[derive(Clone, Debug)]
pub struct ObstacleDetector {
    /// Readings at or below this distance count as near.
    reach: f64,
    threshold_count: f64,
}

impl ObstacleDetector {
    /// Readings within `robot_size * threshold_range` count as near.
    pub fn new(config: &SensingConfig, robot_size: f64) -> Self {
        Self {
            reach: robot_size * config.threshold_range,
            threshold_count: config.threshold_count,
        }
    }

    pub fn reach(&self) -> f64 {
        self.reach
    }

    pub fn detect(&self, scan: &LaserScan) -> Obstacles {
        let n = scan.ranges.len();
        if n == 0 {
            return Obstacles::default();
        }
        let span = scan.angle_max - scan.angle_min;
        let (right, left) = sector_sizes(n, span, scan.angle_min, scan.angle_max);
        let front_end = n - left;

        Obstacles {
            right: self.is_busy(&scan.ranges[..right]),
            ahead: self.is_busy(&scan.ranges[right..front_end]),
            left: self.is_busy(&scan.ranges[front_end..]),
        }
    }

    fn is_busy(&self, sector: &[f64]) -> bool {
        if sector.is_empty() {
            return false;
        }
        let near = sector
            .iter()
            .filter(|r| r.is_finite() && **r <= self.reach)
            .count();
        near as f64 >= sector.len() as f64 * self.threshold_count
    }
}

/// Beams in the right and left sectors.
///
/// Each side sector spans twice the sweep beyond ±90°, at least one beam,
/// and together they leave at least one beam for the front.
fn sector_sizes(n: usize, span: f64, angle_min: f64, angle_max: f64) -> (usize, usize) {
    let side = |beyond: f64| -> usize {
        // Nudge so exact fractions do not floor one beam short.
        let beams = (2.0 * n as f64 * beyond / span + 1e-9).floor();
        if beams < 1.0 { 1 } else { beams as usize }
    };
    let mut right = side(-FRAC_PI_2 - angle_min);
    let mut left = side(angle_max - FRAC_PI_2);
    let max_sides = n.saturating_sub(1);
    if right + left > max_sides {
        right = right.min(max_sides / 2);
        left = left.min(max_sides - right);
    }
    (right, left)
}
