//! Points of a p-dispersion instance.

use serde::{Deserialize, Serialize};

/// A point in the plane with an index that identifies it inside its instance.
///
/// Two points are the same entity only if index and both coordinates match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Position of the point in the instance (0-indexed)
    pub index: usize,
    /// X coordinate
    pub x: i64,
    /// Y coordinate
    pub y: i64,
}

impl Point {
    pub fn new(index: usize, x: i64, y: i64) -> Self {
        Point { index, x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }
}

/// `<index> <x> <y>`, the line format of instance files
impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.index, self.x, self.y)
    }
}
