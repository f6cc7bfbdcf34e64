//! Spiral-STC - online coverage navigator
//!
//! Covers an unknown planar area with a mobile robot using only the robot's
//! own sensing. The area is divided into cells twice the robot footprint;
//! a spanning tree over the free cells is grown on the fly and the robot
//! circumnavigates it.
//!
//! Two planners are provided:
//!
//! - **Spiral-STC** ([`plans::SpiralStc`]): moves cell to cell and treats a
//!   cell as blocked when any part of it is.
//! - **Full Spiral-STC** ([`plans::FullSpiralStc`]): moves quadrant by
//!   quadrant so partially obstructed cells are covered as far as they can
//!   be, revisiting them a bounded number of times.
//!
//! ## Runtime
//!
//! The binary drives a [`sim::SimulatedRobot`] through three threads (see
//! [`threads`]): a sensor thread publishing pose + obstacle snapshots, a
//! coverage thread owning the planner and an operator thread reading keys.

pub mod commands;
pub mod config;
pub mod error;
pub mod geometry;
pub mod plans;
pub mod robot;
pub mod sensing;
pub mod shared;
pub mod sim;
pub mod threads;

pub use config::{PlanKind, StcConfig};
pub use error::{Result, StcError};
pub use plans::{CoveragePlan, CoverageReport, MoveIntent};
