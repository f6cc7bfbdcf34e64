//! Configuration loading for the coverage navigator

use crate::error::{Result, StcError};
use crate::geometry::Point;
use serde::Deserialize;
use std::path::Path;

/// Coverage algorithm selected by `plan.name`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    /// Whole-cell spiral traversal.
    #[value(name = "spiral_stc")]
    SpiralStc,
    /// Quadrant-level traversal with partial cell coverage.
    #[value(name = "full_spiral_stc")]
    FullSpiralStc,
}

impl PlanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKind::SpiralStc => "spiral_stc",
            PlanKind::FullSpiralStc => "full_spiral_stc",
        }
    }
}

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StcConfig {
    #[serde(default)]
    pub plan: PlanConfig,
    #[serde(default)]
    pub sensing: SensingConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Planner parameters
#[derive(Clone, Debug, Deserialize)]
pub struct PlanConfig {
    /// Algorithm to run (default: spiral_stc)
    #[serde(default = "default_plan_name")]
    pub name: PlanKind,

    /// Plan-frame X of the odometry origin (meters)
    #[serde(default)]
    pub starting_point_x: f64,

    /// Plan-frame Y of the odometry origin (meters)
    #[serde(default)]
    pub starting_point_y: f64,

    /// Robot footprint edge; cells are twice this size (default: 0.3)
    #[serde(default = "default_robot_size")]
    pub robot_size: f64,

    /// Tolerance used when ordering cell centers (default: 1e-6)
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Entries allowed into a partially covered cell (default: 3)
    #[serde(default = "default_max_visits")]
    pub max_visits: u32,

    /// In-cell moves the full planner may spend per stay walking to
    /// quadrants it has not looked at yet (default: 24)
    #[serde(default = "default_transit_budget")]
    pub transit_budget: u32,
}

/// Laser obstacle classification
#[derive(Clone, Debug, Deserialize)]
pub struct SensingConfig {
    /// Fraction of the robot footprint counted as "near" (default: 0.9)
    #[serde(default = "default_threshold_range")]
    pub threshold_range: f64,

    /// Fraction of near readings that blocks a sector (default: 0.5)
    #[serde(default = "default_threshold_count")]
    pub threshold_count: f64,
}

/// Robot connection settings
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Connection attempts before giving up (default: 6)
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Pause between attempts in milliseconds (default: 500)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

/// Control loop pacing
#[derive(Clone, Debug, Deserialize)]
pub struct ControlConfig {
    /// Sensor thread period in milliseconds (default: 20)
    #[serde(default = "default_sensor_period_ms")]
    pub sensor_period_ms: u64,

    /// Coverage thread period in milliseconds (default: 50)
    #[serde(default = "default_decision_period_ms")]
    pub decision_period_ms: u64,

    /// Interval between progress log lines (default: 3)
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,

    /// Start covering without waiting for the run key
    #[serde(default)]
    pub auto_run: bool,
}

/// Simulated robot and world
#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    /// ASCII occupancy map ('#' blocked, '.' free, 'S' spawn)
    #[serde(default = "default_map_path")]
    pub map_path: String,

    /// Initial heading in degrees, counter-clockwise from +X (default: 90)
    #[serde(default = "default_start_heading_deg")]
    pub start_heading_deg: f64,

    /// First laser beam angle in radians (default: -3π/4)
    #[serde(default = "default_laser_angle_min")]
    pub laser_angle_min: f64,

    /// Last laser beam angle in radians (default: 3π/4)
    #[serde(default = "default_laser_angle_max")]
    pub laser_angle_max: f64,

    /// Beams per scan (default: 181)
    #[serde(default = "default_laser_rays")]
    pub laser_rays: usize,

    /// Maximum laser range in meters (default: 4.0)
    #[serde(default = "default_laser_max_range")]
    pub laser_max_range: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            name: default_plan_name(),
            starting_point_x: 0.0,
            starting_point_y: 0.0,
            robot_size: default_robot_size(),
            epsilon: default_epsilon(),
            max_visits: default_max_visits(),
            transit_budget: default_transit_budget(),
        }
    }
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            threshold_range: default_threshold_range(),
            threshold_count: default_threshold_count(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            sensor_period_ms: default_sensor_period_ms(),
            decision_period_ms: default_decision_period_ms(),
            status_interval_secs: default_status_interval_secs(),
            auto_run: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            map_path: default_map_path(),
            start_heading_deg: default_start_heading_deg(),
            laser_angle_min: default_laser_angle_min(),
            laser_angle_max: default_laser_angle_max(),
            laser_rays: default_laser_rays(),
            laser_max_range: default_laser_max_range(),
        }
    }
}

// Default value functions
fn default_plan_name() -> PlanKind {
    PlanKind::SpiralStc
}
fn default_robot_size() -> f64 {
    0.3
}
fn default_epsilon() -> f64 {
    1e-6
}
fn default_max_visits() -> u32 {
    3
}
fn default_transit_budget() -> u32 {
    24
}
fn default_threshold_range() -> f64 {
    0.9
}
fn default_threshold_count() -> f64 {
    0.5
}
fn default_retry_attempts() -> u32 {
    6
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_sensor_period_ms() -> u64 {
    20
}
fn default_decision_period_ms() -> u64 {
    50
}
fn default_status_interval_secs() -> u64 {
    3
}
fn default_map_path() -> String {
    "maps/room.txt".to_string()
}
fn default_start_heading_deg() -> f64 {
    90.0
}
fn default_laser_angle_min() -> f64 {
    -3.0 * std::f64::consts::FRAC_PI_4
}
fn default_laser_angle_max() -> f64 {
    3.0 * std::f64::consts::FRAC_PI_4
}
fn default_laser_rays() -> usize {
    181
}
fn default_laser_max_range() -> f64 {
    4.0
}

impl PlanConfig {
    /// Edge length of a spanning-tree cell.
    pub fn cell_size(&self) -> f64 {
        2.0 * self.robot_size
    }

    /// Offset added to odometry positions to obtain plan coordinates.
    pub fn starting_point(&self) -> Point {
        Point::new(self.starting_point_x, self.starting_point_y)
    }
}

impl StcConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StcError::Config(format!("Failed to read config file: {}", e)))?;
        let config: StcConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the planners cannot work with.
    pub fn validate(&self) -> Result<()> {
        let plan = &self.plan;
        if !(plan.robot_size > 0.0) {
            return Err(StcError::Config(format!(
                "plan.robot_size must be positive, got {}",
                plan.robot_size
            )));
        }
        // Lattice neighbours would compare equal otherwise.
        if !(plan.epsilon >= 0.0 && plan.epsilon < plan.cell_size() / 2.0) {
            return Err(StcError::Config(format!(
                "plan.epsilon must be in [0, {}), got {}",
                plan.cell_size() / 2.0,
                plan.epsilon
            )));
        }
        if plan.max_visits == 0 {
            return Err(StcError::Config("plan.max_visits must be at least 1".into()));
        }
        if plan.transit_budget == 0 {
            return Err(StcError::Config("plan.transit_budget must be at least 1".into()));
        }
        if !(self.sensing.threshold_range > 0.0) {
            return Err(StcError::Config(
                "sensing.threshold_range must be positive".into(),
            ));
        }
        if !(self.sensing.threshold_count > 0.0 && self.sensing.threshold_count <= 1.0) {
            return Err(StcError::Config(
                "sensing.threshold_count must be in (0, 1]".into(),
            ));
        }
        let sim = &self.simulation;
        if sim.laser_rays < 3 || !(sim.laser_angle_max > sim.laser_angle_min) {
            return Err(StcError::Config(
                "simulation laser needs at least 3 rays over a non-empty sweep".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = StcConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.plan.name, PlanKind::SpiralStc);
        assert_eq!(config.plan.max_visits, 3);
        assert_eq!(config.plan.transit_budget, 24);
        assert_eq!(config.connection.retry_attempts, 6);
        assert_eq!(config.connection.retry_backoff_ms, 500);
        assert!((config.sensing.threshold_range - 0.9).abs() < 1e-12);
        assert!((config.sensing.threshold_count - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[plan]
name = "full_spiral_stc"
starting_point_x = 1.5
robot_size = 0.5
max_visits = 2
transit_budget = 10

[control]
auto_run = true
"#
        )
        .unwrap();

        let config = StcConfig::load(file.path()).unwrap();
        assert_eq!(config.plan.name, PlanKind::FullSpiralStc);
        assert_eq!(config.plan.starting_point(), Point::new(1.5, 0.0));
        assert!((config.plan.cell_size() - 1.0).abs() < 1e-12);
        assert_eq!(config.plan.max_visits, 2);
        assert_eq!(config.plan.transit_budget, 10);
        assert!(config.control.auto_run);
        // Untouched sections keep their defaults
        assert_eq!(config.connection.retry_attempts, 6);
        assert_eq!(config.simulation.laser_rays, 181);
    }

    #[test]
    fn test_rejects_epsilon_of_half_a_cell() {
        let mut config = StcConfig::default();
        config.plan.robot_size = 1.0;
        config.plan.epsilon = 1.0;
        assert!(matches!(config.validate(), Err(StcError::Config(_))));

        config.plan.epsilon = 0.999;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_visits_and_bad_thresholds() {
        let mut config = StcConfig::default();
        config.plan.max_visits = 0;
        assert!(config.validate().is_err());

        let mut config = StcConfig::default();
        config.plan.transit_budget = 0;
        assert!(config.validate().is_err());

        let mut config = StcConfig::default();
        config.sensing.threshold_count = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_plan_name_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[plan]\nname = \"boustrophedon\"").unwrap();
        assert!(matches!(
            StcConfig::load(file.path()),
            Err(StcError::Config(_))
        ));
    }
}
