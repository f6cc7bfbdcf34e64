//! Grid-world simulator standing in for the robot hardware.

mod robot;
mod world;

pub use robot::{LaserSpec, SimulatedRobot};
pub use world::GridWorld;
