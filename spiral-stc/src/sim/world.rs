//! ASCII occupancy map for the simulated robot.
//!
//! One character is one robot footprint square:
//!
//! ```text
//! #####
//! #..S#
//! #.#.#
//! #####
//! ```
//!
//! `#` is blocked, `.` is free and `S` is the free square the robot spawns
//! in. The first line is the top (highest Y) row. Anything outside the map
//! counts as blocked.

use std::path::Path;

use crate::error::{Result, StcError};
use crate::geometry::{Point, Pose, Vector};
use crate::plans::{Obstacles, Orientation};

/// Shrinks region checks so touching a wall edge is not a collision.
const CONTACT_SLACK: f64 = 1e-6;

/// Occupancy grid of footprint-sized squares.
#[derive(Clone, Debug)]
pub struct GridWorld {
    /// Row-major from the bottom row, `true` when blocked.
    occupied: Vec<bool>,
    width: usize,
    height: usize,
    /// Square edge in meters
    resolution: f64,
    spawn: Option<(usize, usize)>,
}

impl GridWorld {
    /// Parse a map. The bottom-left corner of the map is the world origin.
    pub fn from_ascii(text: &str, resolution: f64) -> Result<Self> {
        if !(resolution > 0.0) {
            return Err(StcError::Map(format!(
                "resolution must be positive, got {}",
                resolution
            )));
        }

        let lines: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();
        let height = lines.len();
        let width = lines.first().map(|l| l.chars().count()).unwrap_or(0);
        if width == 0 {
            return Err(StcError::Map("map is empty".into()));
        }

        let mut occupied = vec![true; width * height];
        let mut spawn = None;
        for (line_index, line) in lines.iter().enumerate() {
            if line.chars().count() != width {
                return Err(StcError::Map(format!(
                    "line {} has {} columns, expected {}",
                    line_index + 1,
                    line.chars().count(),
                    width
                )));
            }
            let row = height - 1 - line_index;
            for (col, ch) in line.chars().enumerate() {
                occupied[row * width + col] = match ch {
                    '#' => true,
                    '.' => false,
                    'S' => {
                        if spawn.replace((col, row)).is_some() {
                            return Err(StcError::Map("more than one spawn square".into()));
                        }
                        false
                    }
                    other => {
                        return Err(StcError::Map(format!(
                            "unexpected '{}' at line {}, column {}",
                            other,
                            line_index + 1,
                            col + 1
                        )));
                    }
                };
            }
        }

        Ok(Self {
            occupied,
            width,
            height,
            resolution,
            spawn,
        })
    }

    /// Load a map file.
    pub fn load<P: AsRef<Path>>(path: P, resolution: f64) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            StcError::Map(format!("Failed to read map {}: {}", path.display(), e))
        })?;
        Self::from_ascii(&text, resolution)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Center of the spawn square, if the map has one.
    pub fn spawn(&self) -> Option<Point> {
        self.spawn.map(|(col, row)| self.square_center(col, row))
    }

    pub fn square_center(&self, col: usize, row: usize) -> Point {
        Point::new(
            (col as f64 + 0.5) * self.resolution,
            (row as f64 + 0.5) * self.resolution,
        )
    }

    fn square_of(&self, point: Point) -> Option<(usize, usize)> {
        let col = (point.x / self.resolution).floor();
        let row = (point.y / self.resolution).floor();
        if col < 0.0 || row < 0.0 || col >= self.width as f64 || row >= self.height as f64 {
            None
        } else {
            Some((col as usize, row as usize))
        }
    }

    /// Check if a world point is blocked. Out of bounds is blocked.
    pub fn is_occupied(&self, point: Point) -> bool {
        match self.square_of(point) {
            Some((col, row)) => self.occupied[row * self.width + col],
            None => true,
        }
    }

    /// No blocked square overlaps the axis-aligned square of edge `side` at `center`.
    pub fn is_region_free(&self, center: Point, side: f64) -> bool {
        let half = side / 2.0 - CONTACT_SLACK;
        let first_col = ((center.x - half) / self.resolution).floor() as i64;
        let last_col = ((center.x + half) / self.resolution).floor() as i64;
        let first_row = ((center.y - half) / self.resolution).floor() as i64;
        let last_row = ((center.y + half) / self.resolution).floor() as i64;

        for row in first_row..=last_row {
            for col in first_col..=last_col {
                if col < 0 || row < 0 || col as usize >= self.width || row as usize >= self.height {
                    return false;
                }
                if self.occupied[row as usize * self.width + col as usize] {
                    return false;
                }
            }
        }
        true
    }

    /// A square of edge `side` can slide from `from` to `to` without touching
    /// anything blocked.
    pub fn is_path_free(&self, from: Point, to: Point, side: f64) -> bool {
        let length = from.distance(to);
        let steps = (length / (self.resolution * 0.25)).ceil().max(1.0) as usize;
        (0..=steps).all(|i| {
            let t = i as f64 / steps as f64;
            self.is_region_free(from + (to - from) * t, side)
        })
    }

    /// Distance to the first blocked point along a ray, or `max_range`.
    pub fn ray_cast(&self, origin: Point, angle: f64, max_range: f64) -> f64 {
        let step = self.resolution * 0.05;
        let direction = Vector::from_angle(angle);
        let mut distance = 0.0;

        while distance < max_range {
            if self.is_occupied(origin + direction * distance) {
                return distance;
            }
            distance += step;
        }
        max_range
    }

    /// Exact obstacle flags for the squares one `step` right, ahead and left
    /// of `pose`, each taken as a region of edge `step`.
    pub fn probe(&self, pose: &Pose, step: f64) -> Obstacles {
        let heading = pose.heading.snapped();
        let blocked = |o: Orientation| {
            !self.is_region_free(pose.position + o.relative_to(heading) * step, step)
        };
        Obstacles::new(
            blocked(Orientation::AtRightSide),
            blocked(Orientation::InFront),
            blocked(Orientation::AtLeftSide),
        )
    }

    /// Centers of all free squares.
    pub fn free_squares(&self) -> Vec<Point> {
        let mut squares = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                if !self.occupied[row * self.width + col] {
                    squares.push(self.square_center(col, row));
                }
            }
        }
        squares
    }
}
