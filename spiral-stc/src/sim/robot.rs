//! Simulated robot on a [`GridWorld`].
//!
//! Moves complete instantly. The footprint is swept along the straight path
//! and any contact with a blocked square is reported as a bumper hit, with
//! the robot left where it was.

use tracing::debug;

use super::world::GridWorld;
use crate::config::{PlanConfig, SimulationConfig};
use crate::error::{Result, StcError};
use crate::geometry::{Point, Vector};
use crate::robot::RobotDriver;
use crate::sensing::{LaserScan, Odometry};

/// Laser geometry of the simulated range sensor.
#[derive(Clone, Debug)]
pub struct LaserSpec {
    pub angle_min: f64,
    pub angle_max: f64,
    pub rays: usize,
    pub max_range: f64,
}

impl From<&SimulationConfig> for LaserSpec {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            angle_min: config.laser_angle_min,
            angle_max: config.laser_angle_max,
            rays: config.laser_rays,
            max_range: config.laser_max_range,
        }
    }
}

/// [`RobotDriver`] backed by a simulated world.
pub struct SimulatedRobot {
    world: GridWorld,
    laser: LaserSpec,
    footprint: f64,
    /// World position of the odometry origin
    spawn: Point,
    position: Point,
    /// Radians, counter-clockwise from +X
    heading: f64,
    connected: bool,
    powered: bool,
    /// Connection attempts to refuse before answering
    refuse_connects: u32,
    /// World positions the robot has stood at, starting with the spawn
    trail: Vec<Point>,
}

impl SimulatedRobot {
    pub fn new(world: GridWorld, spawn: Point, heading: f64, footprint: f64, laser: LaserSpec) -> Self {
        Self {
            world,
            laser,
            footprint,
            spawn,
            position: spawn,
            heading,
            connected: false,
            powered: false,
            refuse_connects: 0,
            trail: vec![spawn],
        }
    }

    /// Build from configuration; the map must have a spawn square.
    pub fn from_config(
        world: GridWorld,
        plan: &PlanConfig,
        simulation: &SimulationConfig,
    ) -> Result<Self> {
        let spawn = world
            .spawn()
            .ok_or_else(|| StcError::Map("map has no 'S' spawn square".into()))?;
        Ok(Self::new(
            world,
            spawn,
            simulation.start_heading_deg.to_radians(),
            plan.robot_size,
            LaserSpec::from(simulation),
        ))
    }

    /// Refuse the first `attempts` connection attempts.
    pub fn with_refused_connects(mut self, attempts: u32) -> Self {
        self.refuse_connects = attempts;
        self
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn trail(&self) -> &[Point] {
        &self.trail
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(StcError::Driver("robot is not connected".into()))
        }
    }
}

impl RobotDriver for SimulatedRobot {
    fn connect(&mut self) -> Result<()> {
        if self.refuse_connects > 0 {
            self.refuse_connects -= 1;
            return Err(StcError::Connection("simulator not ready".into()));
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn set_motor_power(&mut self, on: bool) -> Result<()> {
        self.ensure_connected()?;
        self.powered = on;
        Ok(())
    }

    fn is_powered(&self) -> bool {
        self.powered
    }

    fn odometry(&mut self) -> Result<Odometry> {
        self.ensure_connected()?;
        let d = self.position - self.spawn;
        Ok(Odometry::from_heading(Point::new(d.x, d.y), self.heading))
    }

    fn laser_scan(&mut self) -> Result<LaserScan> {
        self.ensure_connected()?;
        let LaserSpec {
            angle_min,
            angle_max,
            rays,
            max_range,
        } = self.laser;
        let increment = if rays > 1 {
            (angle_max - angle_min) / (rays - 1) as f64
        } else {
            0.0
        };
        let ranges = (0..rays)
            .map(|i| {
                let angle = self.heading + angle_min + increment * i as f64;
                self.world.ray_cast(self.position, angle, max_range)
            })
            .collect();
        Ok(LaserScan {
            angle_min,
            angle_max,
            range_max: max_range,
            ranges,
        })
    }

    fn move_to(&mut self, target: Point) -> Result<()> {
        self.ensure_connected()?;
        if !self.powered {
            return Err(StcError::Driver("motors are not powered".into()));
        }

        let goal = self.spawn + Vector::new(target.x, target.y);
        if !self.world.is_path_free(self.position, goal, self.footprint) {
            return Err(StcError::Driver(format!(
                "bumper hit between ({:.2}, {:.2}) and ({:.2}, {:.2})",
                self.position.x, self.position.y, goal.x, goal.y
            )));
        }

        let travel = goal - self.position;
        if travel.norm() > 1e-9 {
            self.heading = travel.angle();
        }
        debug!("Simulated move to ({:.2}, {:.2})", goal.x, goal.y);
        self.position = goal;
        self.trail.push(goal);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::connect_with_retry;
    use crate::sensing::{ObstacleDetector, plan_pose};
    use std::f64::consts::FRAC_PI_2;
    use std::time::Duration;

    const MAP: &str = "\
######
#....#
#.##.#
#S...#
######
";

    fn robot() -> SimulatedRobot {
        let world = GridWorld::from_ascii(MAP, 1.0).unwrap();
        let mut robot =
            SimulatedRobot::from_config(world, &PlanConfig { robot_size: 1.0, ..Default::default() }, &SimulationConfig::default())
                .unwrap();
        robot.connect().unwrap();
        robot.set_motor_power(true).unwrap();
        robot
    }

    #[test]
    fn test_odometry_is_relative_to_spawn() {
        let mut robot = robot();
        let odom = robot.odometry().unwrap();
        assert_eq!(odom.position, Point::new(0.0, 0.0));

        robot.move_to(Point::new(1.0, 0.0)).unwrap();
        let pose = plan_pose(&robot.odometry().unwrap(), Point::new(0.0, 0.0));
        assert!(pose.position.approx_eq(Point::new(1.0, 0.0), 1e-9));
        assert_eq!(pose.heading.snapped(), Vector::EAST);
        assert_eq!(robot.trail().len(), 2);
    }

    #[test]
    fn test_bumper_stops_move_into_wall() {
        let mut robot = robot();
        // North of the square east of spawn is the inner wall.
        robot.move_to(Point::new(1.0, 0.0)).unwrap();
        let result = robot.move_to(Point::new(1.0, 1.0));
        assert!(matches!(result, Err(StcError::Driver(_))));
        assert!(robot.position().approx_eq(Point::new(2.5, 1.5), 1e-9));
    }

    #[test]
    fn test_unpowered_robot_refuses_to_move() {
        let mut robot = robot();
        robot.set_motor_power(false).unwrap();
        assert!(robot.move_to(Point::new(1.0, 0.0)).is_err());
    }

    #[test]
    fn test_laser_sees_walls_around_spawn() {
        let mut robot = robot();
        // Spawn faces north (default heading 90°): west wall on the left,
        // corridor ahead, free square to the east on the right.
        let scan = robot.laser_scan().unwrap();
        assert_eq!(scan.ranges.len(), 181);
        let obstacles = ObstacleDetector::new(&Default::default(), 1.0).detect(&scan);
        assert!(obstacles.left);
        assert!(!obstacles.right);
        assert!(!obstacles.ahead);

        robot.heading = -FRAC_PI_2;
        let obstacles = ObstacleDetector::new(&Default::default(), 1.0).detect(&robot.laser_scan().unwrap());
        assert!(obstacles.ahead);
    }

    #[test]
    fn test_refused_connects_are_retried() {
        let world = GridWorld::from_ascii(MAP, 1.0).unwrap();
        let mut robot = SimulatedRobot::from_config(world, &PlanConfig::default(), &SimulationConfig::default())
            .unwrap()
            .with_refused_connects(2);
        connect_with_retry(&mut robot, 3, Duration::from_millis(1)).unwrap();
        assert!(robot.is_connected());
    }

    #[test]
    fn test_map_without_spawn_is_rejected() {
        let world = GridWorld::from_ascii("###\n#.#\n###\n", 1.0).unwrap();
        let result = SimulatedRobot::from_config(world, &PlanConfig::default(), &SimulationConfig::default());
        assert!(matches!(result, Err(StcError::Map(_))));
    }
}
