//! Spiral-STC: online spanning-tree coverage at cell resolution.
//!
//! Cells are two robot footprints wide and are covered as a whole on arrival.
//! On every arrival the neighbours are scanned right, ahead, left, behind
//! relative to the heading the robot came in with. The first one that is
//! free and not yet covered becomes a new child of the current cell; when
//! none qualifies the robot returns to the parent, and at the root the run
//! is complete.

use tracing::{debug, info, warn};

use super::cell::{CellId, CellTree};
use super::orientation::{Obstacles, Orientation};
use super::{CellStatus, CoveragePlan, CoverageReport, MoveIntent, tally};
use crate::config::PlanConfig;
use crate::geometry::{Point, Pose};

/// Base spiral planner.
pub struct SpiralStc {
    tree: CellTree,
    /// Cell the robot is in, or driving to.
    current: CellId,
    complete: bool,
    moves: usize,
    backtracks: usize,
}

impl SpiralStc {
    /// Root the tree at the cell centered on the starting position.
    pub fn new(config: &PlanConfig, start: Pose) -> Self {
        let mut tree = CellTree::new(config.cell_size(), config.epsilon);
        let root = tree.discover(start.position, None);
        info!(
            "Spiral-STC rooted at ({:.2}, {:.2}), cell size {:.2}m",
            start.position.x,
            start.position.y,
            config.cell_size()
        );
        Self {
            tree,
            current: root,
            complete: false,
            moves: 0,
            backtracks: 0,
        }
    }

    pub fn current(&self) -> CellId {
        self.current
    }

    /// One decision with the robot at rest in the current cell.
    fn scan(&mut self, pose: &Pose, obstacles: Obstacles) -> MoveIntent {
        let here = self.tree.get(self.current).center();
        let size = self.tree.cell_size();
        let heading = pose.heading.snapped();

        self.tree.get_mut(self.current).cover_all();

        let mut orientation = Orientation::AtRightSide;
        for _ in 0..4 {
            let o = orientation.advance();
            if obstacles.is_blocked(o) {
                continue;
            }
            let center = here + o.relative_to(heading) * size;
            match self.tree.find(center) {
                None => {
                    let child = self.tree.discover(center, Some(self.current));
                    debug!(
                        "New cell ({:.2}, {:.2}) {:?} of ({:.2}, {:.2})",
                        center.x, center.y, o, here.x, here.y
                    );
                    return self.enter(child, center);
                }
                Some(id) if !self.tree.get(id).is_fully_covered() => {
                    debug!("Resuming uncovered cell ({:.2}, {:.2})", center.x, center.y);
                    return self.enter(id, center);
                }
                _ => {}
            }
        }

        match self.tree.get(self.current).parent() {
            Some(parent) => {
                let target = self.tree.get(parent).center();
                debug!(
                    "Backtracking ({:.2}, {:.2}) -> ({:.2}, {:.2})",
                    here.x, here.y, target.x, target.y
                );
                self.backtracks += 1;
                self.enter(parent, target)
            }
            None => {
                info!(
                    "Spiral-STC complete: {} cells, {} moves",
                    self.tree.len(),
                    self.moves
                );
                self.complete = true;
                MoveIntent::Complete
            }
        }
    }

    fn enter(&mut self, id: CellId, target: Point) -> MoveIntent {
        self.current = id;
        self.moves += 1;
        MoveIntent::GoTo(target)
    }
}

impl CoveragePlan for SpiralStc {
    fn name(&self) -> &'static str {
        "spiral_stc"
    }

    fn next_move(&mut self, pose: &Pose, obstacles: Obstacles) -> MoveIntent {
        if self.complete {
            return MoveIntent::Complete;
        }

        let expected = self.tree.get(self.current).center();
        if pose.position.distance(expected) > self.tree.cell_size() / 2.0 {
            warn!(
                "Robot at ({:.2}, {:.2}) is not in expected cell ({:.2}, {:.2}), re-issuing",
                pose.position.x, pose.position.y, expected.x, expected.y
            );
            return MoveIntent::GoTo(expected);
        }

        self.scan(pose, obstacles)
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn tree(&self) -> &CellTree {
        &self.tree
    }

    fn status(&self, id: CellId) -> CellStatus {
        if self.tree.get(id).is_fully_covered() {
            CellStatus::Covered
        } else {
            CellStatus::Partial
        }
    }

    fn report(&self) -> CoverageReport {
        tally(self, self.moves, self.backtracks)
    }
}
