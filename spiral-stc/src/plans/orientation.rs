//! Directions relative to the robot's heading.

use crate::geometry::Vector;

/// Direction relative to the current heading.
///
/// Cycles right → ahead → left → behind → right. Scanning always starts at
/// [`Orientation::AtRightSide`], which is what produces the spiral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    AtRightSide,
    InFront,
    AtLeftSide,
    Behind,
}

impl Orientation {
    pub fn next(self) -> Self {
        match self {
            Orientation::AtRightSide => Orientation::InFront,
            Orientation::InFront => Orientation::AtLeftSide,
            Orientation::AtLeftSide => Orientation::Behind,
            Orientation::Behind => Orientation::AtRightSide,
        }
    }

    /// Returns the current value and moves `self` to its successor.
    pub fn advance(&mut self) -> Self {
        let current = *self;
        *self = current.next();
        current
    }

    /// World direction of this orientation for a robot facing `heading`.
    pub fn relative_to(self, heading: Vector) -> Vector {
        match self {
            Orientation::AtRightSide => heading.rotate_clockwise_right_angle(),
            Orientation::InFront => heading,
            Orientation::AtLeftSide => heading.rotate_counterclockwise_right_angle(),
            Orientation::Behind => -heading,
        }
    }
}

/// Obstacle flags for the three sensed sectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Obstacles {
    pub right: bool,
    pub ahead: bool,
    pub left: bool,
}

impl Obstacles {
    pub const CLEAR: Obstacles = Obstacles {
        right: false,
        ahead: false,
        left: false,
    };

    pub fn new(right: bool, ahead: bool, left: bool) -> Self {
        Self { right, ahead, left }
    }

    /// Unsensed directions are never reported blocked.
    pub fn is_blocked(&self, orientation: Orientation) -> bool {
        match orientation {
            Orientation::AtRightSide => self.right,
            Orientation::InFront => self.ahead,
            Orientation::AtLeftSide => self.left,
            Orientation::Behind => false,
        }
    }

    pub fn any(&self) -> bool {
        self.right || self.ahead || self.left
    }
}
