//! Grid cells and the spanning tree that links them.
//!
//! Cells live in an arena owned by [`CellTree`] and refer to their parent by
//! [`CellId`]. A second index keeps the ids sorted by center so lookups by
//! position are a binary search.

use std::cmp::Ordering;

use crate::geometry::{Point, Vector};

/// Index of a cell inside its [`CellTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub usize);

/// One quarter of a cell, one robot footprint wide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// (+x, +y)
    I,
    /// (-x, +y)
    II,
    /// (-x, -y)
    III,
    /// (+x, -y)
    IV,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [Quadrant::I, Quadrant::II, Quadrant::III, Quadrant::IV];

    fn index(self) -> usize {
        match self {
            Quadrant::I => 0,
            Quadrant::II => 1,
            Quadrant::III => 2,
            Quadrant::IV => 3,
        }
    }

    /// Unit signs of the quadrant relative to the cell center.
    fn signs(self) -> Vector {
        match self {
            Quadrant::I => Vector::new(1.0, 1.0),
            Quadrant::II => Vector::new(-1.0, 1.0),
            Quadrant::III => Vector::new(-1.0, -1.0),
            Quadrant::IV => Vector::new(1.0, -1.0),
        }
    }
}

/// Spanning-tree node.
#[derive(Clone, Debug)]
pub struct Cell {
    center: Point,
    size: f64,
    /// `true` while the quadrant is still uncovered.
    quadrants: [bool; 4],
    parent: Option<CellId>,
}

impl Cell {
    pub fn new(center: Point, size: f64) -> Self {
        Self {
            center,
            size,
            quadrants: [true; 4],
            parent: None,
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn parent(&self) -> Option<CellId> {
        self.parent
    }

    /// Attach the cell to the tree.
    ///
    /// # Panics
    ///
    /// Panics if the cell already has a parent.
    pub fn set_parent(&mut self, parent: CellId) {
        assert!(
            self.parent.is_none(),
            "cell at ({:.3}, {:.3}) already has parent {:?}",
            self.center.x,
            self.center.y,
            self.parent
        );
        self.parent = Some(parent);
    }

    pub fn is_uncovered(&self, quadrant: Quadrant) -> bool {
        self.quadrants[quadrant.index()]
    }

    pub fn cover(&mut self, quadrant: Quadrant) {
        self.quadrants[quadrant.index()] = false;
    }

    pub fn cover_all(&mut self) {
        self.quadrants = [false; 4];
    }

    pub fn is_fully_covered(&self) -> bool {
        self.quadrants.iter().all(|uncovered| !uncovered)
    }

    pub fn uncovered(&self) -> impl Iterator<Item = Quadrant> + '_ {
        Quadrant::ALL.into_iter().filter(|q| self.is_uncovered(*q))
    }

    pub fn uncovered_count(&self) -> usize {
        self.quadrants.iter().filter(|uncovered| **uncovered).count()
    }

    pub fn quadrant_center(&self, quadrant: Quadrant) -> Point {
        self.center + quadrant.signs() * (self.size / 4.0)
    }

    /// Quadrant holding `point`. Points on an axis fall to the positive side.
    pub fn quadrant_of(&self, point: Point) -> Quadrant {
        let d = point - self.center;
        match (d.x >= 0.0, d.y >= 0.0) {
            (true, true) => Quadrant::I,
            (false, true) => Quadrant::II,
            (false, false) => Quadrant::III,
            (true, false) => Quadrant::IV,
        }
    }

    /// `point` lies inside the cell, with `tolerance` slack on each edge.
    pub fn contains(&self, point: Point, tolerance: f64) -> bool {
        let half = self.size / 2.0 + tolerance;
        (point.x - self.center.x).abs() <= half && (point.y - self.center.y).abs() <= half
    }
}

/// Order two cell centers, treating differences within `epsilon` as equal.
///
/// X is compared first; Y only breaks ties. This is a strict weak ordering
/// as long as distinct centers are more than `2 * epsilon` apart on some axis,
/// which holds on a lattice of cells when `epsilon < size / 2`.
pub fn compare_centers(a: Point, b: Point, epsilon: f64) -> Ordering {
    if (a.x - b.x).abs() > epsilon {
        a.x.total_cmp(&b.x)
    } else if (a.y - b.y).abs() > epsilon {
        a.y.total_cmp(&b.y)
    } else {
        Ordering::Equal
    }
}

/// Arena of discovered cells plus a position index.
#[derive(Clone, Debug)]
pub struct CellTree {
    cells: Vec<Cell>,
    /// Ids sorted by [`compare_centers`].
    order: Vec<CellId>,
    cell_size: f64,
    epsilon: f64,
}

impl CellTree {
    /// # Panics
    ///
    /// Panics unless `0 <= epsilon < cell_size / 2`.
    pub fn new(cell_size: f64, epsilon: f64) -> Self {
        assert!(
            epsilon >= 0.0 && epsilon < cell_size / 2.0,
            "epsilon {} would merge neighbouring cells of size {}",
            epsilon,
            cell_size
        );
        Self {
            cells: Vec::new(),
            order: Vec::new(),
            cell_size,
            epsilon,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn get(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    pub fn get_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellId, &Cell)> + '_ {
        self.cells.iter().enumerate().map(|(i, c)| (CellId(i), c))
    }

    /// Cell whose center matches `center` within epsilon.
    pub fn find(&self, center: Point) -> Option<CellId> {
        self.search(center).ok().map(|pos| self.order[pos])
    }

    /// Cell containing `point`, located by snapping to the lattice around `origin`.
    pub fn find_containing(&self, origin: Point, point: Point) -> Option<CellId> {
        let d = point - origin;
        let center = Point::new(
            origin.x + (d.x / self.cell_size).round() * self.cell_size,
            origin.y + (d.y / self.cell_size).round() * self.cell_size,
        );
        self.find(center)
    }

    /// Create a cell at `center`, optionally linked to `parent`.
    ///
    /// # Panics
    ///
    /// Panics if a cell already exists at `center` or the comparator
    /// disagrees with itself around the insertion point.
    pub fn discover(&mut self, center: Point, parent: Option<CellId>) -> CellId {
        let pos = match self.search(center) {
            Ok(pos) => panic!(
                "cell at ({:.3}, {:.3}) already discovered as {:?}",
                center.x, center.y, self.order[pos]
            ),
            Err(pos) => pos,
        };

        let id = CellId(self.cells.len());
        let mut cell = Cell::new(center, self.cell_size);
        if let Some(parent) = parent {
            assert!(parent.0 < self.cells.len(), "unknown parent {:?}", parent);
            cell.set_parent(parent);
        }

        if pos > 0 {
            self.check_antisymmetric(self.cells[self.order[pos - 1].0].center, center);
        }
        if pos < self.order.len() {
            self.check_antisymmetric(center, self.cells[self.order[pos].0].center);
        }

        self.cells.push(cell);
        self.order.insert(pos, id);
        id
    }

    /// The unique cell without a parent.
    pub fn root(&self) -> Option<CellId> {
        self.iter().find(|(_, c)| c.parent.is_none()).map(|(id, _)| id)
    }

    /// Parent chain of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: CellId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).parent,
            remaining: self.cells.len(),
        }
    }

    fn search(&self, center: Point) -> Result<usize, usize> {
        self.order.binary_search_by(|probe| {
            compare_centers(self.cells[probe.0].center, center, self.epsilon)
        })
    }

    fn check_antisymmetric(&self, lower: Point, upper: Point) {
        let forward = compare_centers(lower, upper, self.epsilon);
        let backward = compare_centers(upper, lower, self.epsilon);
        assert!(
            forward == Ordering::Less && backward == Ordering::Greater,
            "cell ordering is not strict around ({:.3}, {:.3}) and ({:.3}, {:.3})",
            lower.x,
            lower.y,
            upper.x,
            upper.y
        );
    }
}

/// Iterator over a cell's ancestors.
pub struct Ancestors<'a> {
    tree: &'a CellTree,
    next: Option<CellId>,
    /// Guards against a cycle turning this into an endless loop.
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = CellId;

    fn next(&mut self) -> Option<CellId> {
        let id = self.next?;
        assert!(self.remaining > 0, "parent links form a cycle");
        self.remaining -= 1;
        self.next = self.tree.get(id).parent;
        Some(id)
    }
}
