//! Online coverage planners.
//!
//! Both planners are driven one decision at a time: the caller reports the
//! pose the robot arrived at plus the obstacle flags sensed there, and gets
//! back the next [`MoveIntent`].
//!
//! - [`SpiralStc`]: moves between whole cells and covers each on arrival.
//! - [`FullSpiralStc`]: walks quadrant by quadrant so cells that are partly
//!   obstructed are still covered as far as possible.

mod cell;
mod full_spiral_stc;
mod orientation;
mod spiral_stc;

pub use cell::{Cell, CellId, CellTree, Quadrant, compare_centers};
pub use full_spiral_stc::{FullSpiralStc, ScanPass};
pub use orientation::{Obstacles, Orientation};
pub use spiral_stc::SpiralStc;

use std::fmt;

use crate::config::{PlanConfig, PlanKind};
use crate::geometry::{Point, Pose};

/// What the robot should do next.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveIntent {
    /// Drive in a straight line to this plan-frame point.
    GoTo(Point),
    /// Nothing safe to do with the current snapshot; ask again later.
    Hold,
    /// Coverage finished.
    Complete,
}

/// Coverage state of a discovered cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellStatus {
    /// Every quadrant covered.
    Covered,
    /// Some quadrants left and the cell may still be revisited.
    Partial,
    /// Some quadrants left but the revisit bound has been reached.
    Exhausted,
}

/// Summary of a run, valid at any point but final after completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageReport {
    pub plan: &'static str,
    pub discovered: usize,
    pub covered: usize,
    pub partial: usize,
    pub exhausted: usize,
    /// Quadrants still flagged uncovered across all cells.
    pub uncovered_quadrants: usize,
    pub moves: usize,
    pub backtracks: usize,
    pub complete: bool,
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} cells ({} covered, {} partial, {} exhausted), {} uncovered quadrants, {} moves, {} backtracks{}",
            self.plan,
            self.discovered,
            self.covered,
            self.partial,
            self.exhausted,
            self.uncovered_quadrants,
            self.moves,
            self.backtracks,
            if self.complete { ", complete" } else { "" }
        )
    }
}

/// Common interface of the online planners.
pub trait CoveragePlan: Send {
    fn name(&self) -> &'static str;

    /// Decide the next move from the pose the robot is at and what it senses.
    fn next_move(&mut self, pose: &Pose, obstacles: Obstacles) -> MoveIntent;

    fn is_complete(&self) -> bool;

    fn tree(&self) -> &CellTree;

    fn status(&self, id: CellId) -> CellStatus;

    fn report(&self) -> CoverageReport;
}

/// Tally per-cell statuses into a report.
pub(crate) fn tally(plan: &dyn CoveragePlan, moves: usize, backtracks: usize) -> CoverageReport {
    let mut report = CoverageReport {
        plan: plan.name(),
        discovered: plan.tree().len(),
        moves,
        backtracks,
        complete: plan.is_complete(),
        ..Default::default()
    };
    for (id, cell) in plan.tree().iter() {
        report.uncovered_quadrants += cell.uncovered_count();
        match plan.status(id) {
            CellStatus::Covered => report.covered += 1,
            CellStatus::Partial => report.partial += 1,
            CellStatus::Exhausted => report.exhausted += 1,
        }
    }
    report
}

/// Build the configured planner rooted at the robot's starting pose.
pub fn create_plan(config: &PlanConfig, start: Pose) -> Box<dyn CoveragePlan> {
    match config.name {
        PlanKind::SpiralStc => Box::new(SpiralStc::new(config, start)),
        PlanKind::FullSpiralStc => Box::new(FullSpiralStc::new(config, start)),
    }
}
