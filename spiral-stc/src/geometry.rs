//! Plane geometry shared by the planners, sensing and the simulator.

use std::ops::{Add, Mul, Neg, Sub};

/// Position in the plan frame (meters).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Displacement or direction in the plan frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

/// Robot position plus heading direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    pub position: Point,
    pub heading: Vector,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (*self - other).norm()
    }

    /// Both coordinates within `tolerance` of `other`.
    pub fn approx_eq(&self, other: Point, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl Vector {
    pub const EAST: Vector = Vector::new(1.0, 0.0);
    pub const NORTH: Vector = Vector::new(0.0, 1.0);
    pub const WEST: Vector = Vector::new(-1.0, 0.0);
    pub const SOUTH: Vector = Vector::new(0.0, -1.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` radians counter-clockwise from +X.
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn rotate_clockwise_right_angle(&self) -> Self {
        Self::new(self.y, -self.x)
    }

    pub fn rotate_counterclockwise_right_angle(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Nearest grid axis direction. A zero vector snaps to east.
    pub fn snapped(&self) -> Self {
        if self.x == 0.0 && self.y == 0.0 {
            return Self::EAST;
        }
        if self.x.abs() >= self.y.abs() {
            Self::new(self.x.signum(), 0.0)
        } else {
            Self::new(0.0, self.y.signum())
        }
    }
}

impl Pose {
    pub fn new(position: Point, heading: Vector) -> Self {
        Self { position, heading }
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub<Vector> for Point {
    type Output = Point;

    fn sub(self, rhs: Vector) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_right_angle_rotations() {
        assert_eq!(Vector::NORTH.rotate_clockwise_right_angle(), Vector::EAST);
        assert_eq!(Vector::NORTH.rotate_counterclockwise_right_angle(), Vector::WEST);
        assert_eq!(Vector::WEST.rotate_clockwise_right_angle(), Vector::NORTH);
        assert_eq!(Vector::EAST.rotate_counterclockwise_right_angle(), Vector::NORTH);
    }

    #[test]
    fn test_snapped_picks_dominant_axis() {
        assert_eq!(Vector::new(0.9, 0.2).snapped(), Vector::EAST);
        assert_eq!(Vector::new(-0.1, -0.7).snapped(), Vector::SOUTH);
        assert_eq!(Vector::from_angle(100f64.to_radians()).snapped(), Vector::NORTH);
        assert_eq!(Vector::default().snapped(), Vector::EAST);
    }

    #[test]
    fn test_point_vector_arithmetic() {
        let a = Point::new(1.0, 2.0);
        let b = a + Vector::EAST * 2.0;
        assert_eq!(b, Point::new(3.0, 2.0));
        assert_eq!(b - a, Vector::new(2.0, 0.0));
        assert_relative_eq!(a.distance(Point::new(4.0, 6.0)), 5.0);
        assert!(a.approx_eq(Point::new(1.0 + 1e-9, 2.0), 1e-6));
    }
}
