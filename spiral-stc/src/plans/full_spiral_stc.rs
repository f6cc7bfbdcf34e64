//! Full Spiral-STC: spanning-tree coverage at quadrant resolution.
//!
//! The robot walks one footprint per move. Inside a cell it sweeps every
//! quadrant it can reach, leaving obstructed ones flagged. It then crosses
//! into the first qualifying neighbour cell (same right, ahead, left, behind
//! order as the base planner) through a pair of edge-adjacent quadrants, or
//! backtracks through the crossing it came in by.
//!
//! A cell that still has uncovered quadrants may be re-entered later, up to
//! `max_visits` entries in total. Past that it is reported as exhausted. A
//! revisit that finds every left-over quadrant still blocked uses up the
//! remaining entries at once.

use tracing::{debug, info, warn};

use super::cell::{CellId, CellTree, Quadrant};
use super::orientation::{Obstacles, Orientation};
use super::{CellStatus, CoveragePlan, CoverageReport, MoveIntent, tally};
use crate::config::PlanConfig;
use crate::geometry::{Point, Pose, Vector};

/// Which entry into a cell a sweep belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanPass {
    /// First entry: sweep the whole cell. Quadrants found blocked stay
    /// flagged for a later revisit.
    Discovery,
    /// Later entry: only left-over quadrants are targeted. If all of them are
    /// still blocked the cell is charged its remaining visits.
    Revisit,
}

#[derive(Clone, Copy, Debug)]
enum Sweep {
    Move(Point),
    Finished { fully_covered: bool },
}

/// How the robot got into a cell; replayed backwards to leave it.
#[derive(Clone, Copy, Debug)]
struct Crossing {
    from_cell: CellId,
    /// Quadrant center in `from_cell`.
    from: Point,
    /// Quadrant center in the entered cell.
    to: Point,
}

#[derive(Debug)]
struct CellLog {
    /// Entries charged against `max_visits`.
    visits: u32,
    entry_heading: Vector,
    /// What the robot saw when it last crossed out of the cell.
    sightings: Sightings,
}

/// Squares sensed during the current stay, `true` when blocked.
#[derive(Debug)]
struct Sightings {
    squares: Vec<(Point, bool)>,
    tolerance: f64,
}

impl Sightings {
    fn new(tolerance: f64) -> Self {
        Self {
            squares: Vec::new(),
            tolerance,
        }
    }

    fn record(&mut self, square: Point, blocked: bool) {
        match self
            .squares
            .iter_mut()
            .find(|(p, _)| p.approx_eq(square, self.tolerance))
        {
            Some(entry) => entry.1 = blocked,
            None => self.squares.push((square, blocked)),
        }
    }

    fn get(&self, square: Point) -> Option<bool> {
        self.squares
            .iter()
            .find(|(p, _)| p.approx_eq(square, self.tolerance))
            .map(|(_, blocked)| *blocked)
    }

    fn is_blocked(&self, square: Point) -> bool {
        self.get(square) == Some(true)
    }

    fn is_free(&self, square: Point) -> bool {
        self.get(square) == Some(false)
    }
}

/// Quadrant-level spiral planner with partial coverage.
pub struct FullSpiralStc {
    tree: CellTree,
    robot_size: f64,
    max_visits: u32,
    /// In-cell transit moves allowed per stay.
    transit_budget: u32,
    /// Root center; every cell center sits on its lattice.
    origin: Point,
    current: CellId,
    /// Indexed by `CellId`.
    logs: Vec<CellLog>,
    returns: Vec<Crossing>,
    sightings: Sightings,
    transits: u32,
    /// Last emitted target, or the start position.
    target: Point,
    complete: bool,
    moves: usize,
    backtracks: usize,
}

impl FullSpiralStc {
    /// The robot starts in the rear-right quadrant of the root cell.
    pub fn new(config: &PlanConfig, start: Pose) -> Self {
        let robot_size = config.robot_size;
        let heading = start.heading.snapped();
        let left = heading.rotate_counterclockwise_right_angle();
        let origin = start.position + (heading + left) * (robot_size / 2.0);

        let mut tree = CellTree::new(config.cell_size(), config.epsilon);
        tree.discover(origin, None);
        info!(
            "Full Spiral-STC rooted at ({:.2}, {:.2}), footprint {:.2}m, max visits {}",
            origin.x, origin.y, robot_size, config.max_visits
        );

        Self {
            tree,
            robot_size,
            max_visits: config.max_visits,
            transit_budget: config.transit_budget,
            origin,
            current: CellId(0),
            logs: vec![CellLog {
                visits: 1,
                entry_heading: heading,
                sightings: Sightings::new(robot_size / 4.0),
            }],
            returns: Vec::new(),
            sightings: Sightings::new(robot_size / 4.0),
            transits: 0,
            target: start.position,
            complete: false,
            moves: 0,
            backtracks: 0,
        }
    }

    pub fn current(&self) -> CellId {
        self.current
    }

    /// Visits charged to `id`: one per entry, the root's start counting as
    /// one, plus whatever a fruitless revisit gave up.
    pub fn visits(&self, id: CellId) -> u32 {
        self.logs[id.0].visits
    }

    fn pass(&self) -> ScanPass {
        if self.visits(self.current) <= 1 {
            ScanPass::Discovery
        } else {
            ScanPass::Revisit
        }
    }

    /// Quadrant center of the current cell nearest to `position`.
    fn snap(&self, position: Point) -> Point {
        let cell = self.tree.get(self.current);
        cell.quadrant_center(cell.quadrant_of(position))
    }

    fn tolerance(&self) -> f64 {
        self.robot_size / 4.0
    }

    fn adjacent(&self, a: Point, b: Point) -> bool {
        (a.distance(b) - self.robot_size).abs() <= self.tolerance()
    }

    fn is_covered_square(&self, square: Point) -> bool {
        self.tree
            .find_containing(self.origin, square)
            .map(|id| {
                let cell = self.tree.get(id);
                cell.contains(square, self.tolerance()) && !cell.is_uncovered(cell.quadrant_of(square))
            })
            .unwrap_or(false)
    }

    /// Sensed free now, or covered earlier and not sensed blocked since.
    fn passable(&self, square: Point) -> bool {
        match self.sightings.get(square) {
            Some(blocked) => !blocked,
            None => self.is_covered_square(square),
        }
    }

    /// First step from `from` to `to` inside the current cell over passable quadrants.
    fn route(&self, from: Point, to: Point) -> Option<Point> {
        if !self.passable(to) {
            return None;
        }
        if self.adjacent(from, to) {
            return Some(to);
        }
        // Diagonal within a 2x2 cell: go round either side.
        [Point::new(to.x, from.y), Point::new(from.x, to.y)]
            .into_iter()
            .find(|m| self.passable(*m))
    }

    fn sense(&mut self, here: Point, heading: Vector, obstacles: Obstacles) {
        let mut orientation = Orientation::AtRightSide;
        for _ in 0..3 {
            let o = orientation.advance();
            let square = here + o.relative_to(heading) * self.robot_size;
            self.sightings.record(square, obstacles.is_blocked(o));
        }
    }

    /// Arrival in the current cell: sweep it, then look for the next cell.
    fn scan(&mut self, here: Point, heading: Vector) -> MoveIntent {
        match self.flexibly_scan(here, heading, self.pass()) {
            Sweep::Move(next) => return MoveIntent::GoTo(next),
            Sweep::Finished { fully_covered } => {
                debug!(fully_covered, "Sweep of cell {:?} finished", self.current)
            }
        }

        if let Some(intent) = self.choose_neighbour(here) {
            return intent;
        }
        self.backtrack(here)
    }

    /// Sweep the uncovered quadrants of the current cell that can be reached.
    fn flexibly_scan(&mut self, here: Point, heading: Vector, pass: ScanPass) -> Sweep {
        let cell = self.tree.get(self.current);

        let mut orientation = Orientation::AtRightSide;
        for _ in 0..3 {
            let o = orientation.advance();
            let square = here + o.relative_to(heading) * self.robot_size;
            if cell.contains(square, self.tolerance())
                && cell.is_uncovered(cell.quadrant_of(square))
                && self.sightings.is_free(square)
            {
                return Sweep::Move(square);
            }
        }

        if self.transits < self.transit_budget {
            for quadrant in cell.uncovered() {
                let goal = cell.quadrant_center(quadrant);
                if self.sightings.is_blocked(goal) {
                    continue;
                }
                // Stand next to it so the sensor gets a look.
                let step = Quadrant::ALL
                    .into_iter()
                    .map(|q| cell.quadrant_center(q))
                    .filter(|m| !m.approx_eq(here, self.tolerance()) && self.adjacent(*m, goal))
                    .find_map(|m| self.route(here, m));
                if let Some(step) = step {
                    self.transits += 1;
                    debug!(
                        ?pass,
                        "Transit to ({:.2}, {:.2}) to look at quadrant {:?}",
                        step.x,
                        step.y,
                        quadrant
                    );
                    return Sweep::Move(step);
                }
            }
        }

        let fully_covered = cell.is_fully_covered();
        let stuck = !fully_covered
            && cell
                .uncovered()
                .all(|q| self.sightings.is_blocked(cell.quadrant_center(q)));
        if pass == ScanPass::Revisit && stuck && self.visits(self.current) < self.max_visits {
            info!(
                "Cell {:?} still blocked on visit {}, giving up on {} quadrants",
                self.current,
                self.visits(self.current),
                cell.uncovered_count()
            );
            self.logs[self.current.0].visits = self.max_visits;
        }

        Sweep::Finished { fully_covered }
    }

    fn qualifies(&self, neighbour: Option<CellId>) -> bool {
        match neighbour {
            None => true,
            Some(id) => {
                !self.tree.get(id).is_fully_covered() && self.visits(id) < self.max_visits
            }
        }
    }

    /// Cross into, or move towards, the first qualifying neighbour cell.
    fn choose_neighbour(&mut self, here: Point) -> Option<MoveIntent> {
        let center = self.tree.get(self.current).center();
        let entry = self.logs[self.current.0].entry_heading;
        let rs = self.robot_size;

        let mut orientation = Orientation::AtRightSide;
        for _ in 0..4 {
            let o = orientation.advance();
            let d = o.relative_to(entry);
            let neighbour_center = center + d * (2.0 * rs);
            let neighbour = self.tree.find(neighbour_center);
            if !self.qualifies(neighbour) {
                continue;
            }

            // Near-side quadrants of this cell, closest to the robot first.
            let side = d.rotate_clockwise_right_angle() * (rs / 2.0);
            let mut near = [center + d * (rs / 2.0) + side, center + d * (rs / 2.0) - side];
            near.sort_by(|a, b| a.distance(here).total_cmp(&b.distance(here)));

            for x in near {
                let entry_square = x + d * rs;
                if self.sightings.is_blocked(entry_square) {
                    continue;
                }
                if x.approx_eq(here, self.tolerance()) {
                    if self.passable(entry_square) {
                        return Some(self.cross(neighbour, neighbour_center, here, entry_square, d));
                    }
                } else if self.transits < self.transit_budget
                    && let Some(step) = self.route(here, x)
                {
                    self.transits += 1;
                    debug!(
                        "Transit to ({:.2}, {:.2}) towards {:?} neighbour",
                        step.x, step.y, o
                    );
                    return Some(MoveIntent::GoTo(step));
                }
            }
        }
        None
    }

    fn cross(
        &mut self,
        neighbour: Option<CellId>,
        neighbour_center: Point,
        from: Point,
        to: Point,
        heading: Vector,
    ) -> MoveIntent {
        let id = match neighbour {
            Some(id) => {
                self.logs[id.0].visits += 1;
                self.logs[id.0].entry_heading = heading;
                debug!(
                    "Re-entering cell ({:.2}, {:.2}), visit {}",
                    neighbour_center.x, neighbour_center.y, self.logs[id.0].visits
                );
                id
            }
            None => {
                let id = self.tree.discover(neighbour_center, Some(self.current));
                self.logs.push(CellLog {
                    visits: 1,
                    entry_heading: heading,
                    sightings: Sightings::new(self.tolerance()),
                });
                debug!(
                    "New cell ({:.2}, {:.2}) entered at ({:.2}, {:.2})",
                    neighbour_center.x, neighbour_center.y, to.x, to.y
                );
                id
            }
        };

        self.returns.push(Crossing {
            from_cell: self.current,
            from,
            to,
        });
        // A fresh entry senses everything again.
        let fresh = Sightings::new(self.tolerance());
        self.logs[self.current.0].sightings = std::mem::replace(&mut self.sightings, fresh);
        self.current = id;
        self.transits = 0;
        MoveIntent::GoTo(to)
    }

    fn backtrack(&mut self, here: Point) -> MoveIntent {
        let Some(crossing) = self.returns.last().copied() else {
            info!(
                "Full Spiral-STC complete: {} cells, {} moves",
                self.tree.len(),
                self.moves
            );
            self.complete = true;
            return MoveIntent::Complete;
        };

        if crossing.to.approx_eq(here, self.tolerance()) {
            if self.sightings.is_blocked(crossing.from) {
                warn!(
                    "Way back to ({:.2}, {:.2}) is blocked, holding",
                    crossing.from.x, crossing.from.y
                );
                return MoveIntent::Hold;
            }
            self.returns.pop();
            self.backtracks += 1;
            // Resume the stay that was interrupted by the crossing.
            let fresh = Sightings::new(self.tolerance());
            self.sightings = std::mem::replace(&mut self.logs[crossing.from_cell.0].sightings, fresh);
            self.current = crossing.from_cell;
            self.transits = 0;
            return MoveIntent::GoTo(crossing.from);
        }

        match self.route(here, crossing.to) {
            Some(step) => MoveIntent::GoTo(step),
            None => {
                warn!(
                    "No free route to ({:.2}, {:.2}) inside the cell, holding",
                    crossing.to.x, crossing.to.y
                );
                MoveIntent::Hold
            }
        }
    }
}

impl CoveragePlan for FullSpiralStc {
    fn name(&self) -> &'static str {
        "full_spiral_stc"
    }

    fn next_move(&mut self, pose: &Pose, obstacles: Obstacles) -> MoveIntent {
        if self.complete {
            return MoveIntent::Complete;
        }

        if pose.position.distance(self.target) > self.robot_size / 2.0 {
            warn!(
                "Robot at ({:.2}, {:.2}) has not reached ({:.2}, {:.2}), re-issuing",
                pose.position.x, pose.position.y, self.target.x, self.target.y
            );
            return MoveIntent::GoTo(self.target);
        }

        let heading = pose.heading.snapped();
        let here = self.snap(pose.position);
        self.sense(here, heading, obstacles);
        let cell = self.tree.get_mut(self.current);
        let quadrant = cell.quadrant_of(here);
        cell.cover(quadrant);

        let intent = self.scan(here, heading);
        if let MoveIntent::GoTo(target) = intent {
            self.target = target;
            self.moves += 1;
        }
        intent
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
        } else if self.visits(id) >= self.max_visits {
            CellStatus::Exhausted
        } else {
            CellStatus::Partial
        }
    }

    fn report(&self) -> CoverageReport {
        tally(self, self.moves, self.backtracks)
    }
}
