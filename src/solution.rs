//! Solution representation and manipulation for the PDP.
//!
//! A solution is a subset of the instance's points. Its order only matters for
//! printing; the objective depends on the set alone.

use crate::instance::{Distance, PDPInstance};
use crate::objective::{coordinate_objective, objective};
use crate::point::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Represents a solution to the PDP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Selected points
    pub points: Vec<Point>,
    /// Maximin objective value (minimum pairwise distance)
    pub objective: Distance,
    /// Whether the solution has exactly p distinct points of the instance
    pub feasible: bool,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of accepted interchanges (local search only)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            points: Vec::new(),
            objective: 0,
            feasible: false,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Create a solution from a list of points
    pub fn from_points(instance: &PDPInstance, points: Vec<Point>, algorithm: &str) -> Self {
        let mut solution = Solution {
            points,
            algorithm: algorithm.to_string(),
            ..Solution::new()
        };
        solution.validate(instance);
        solution
    }

    /// Recompute objective and feasibility
    pub fn validate(&mut self, instance: &PDPInstance) {
        let members = self.points.iter().all(|pt| instance.points.get(pt.index) == Some(pt));
        self.objective = if members {
            objective(&self.points, &instance.distances)
        } else {
            coordinate_objective(&self.points)
        };
        self.feasible = self.is_feasible(instance);
    }

    /// Exactly p distinct points, all members of the instance
    pub fn is_feasible(&self, instance: &PDPInstance) -> bool {
        if self.points.len() != instance.p {
            return false;
        }
        let unique: HashSet<usize> = self.points.iter().map(|pt| pt.index).collect();
        unique.len() == self.points.len()
            && self
                .points
                .iter()
                .all(|pt| instance.points.get(pt.index) == Some(pt))
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.points.contains(point)
    }

    /// Indices of the selected points
    pub fn index_set(&self) -> HashSet<usize> {
        self.points.iter().map(|pt| pt.index).collect()
    }

    /// Indices of the selected points in ascending order
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.points.iter().map(|pt| pt.index).collect();
        indices.sort_unstable();
        indices
    }

    /// Remove `mv.removed` and append `mv.added`. The objective is not updated.
    pub fn apply_interchange(&mut self, mv: &Interchange) {
        if let Some(pos) = self.points.iter().position(|pt| *pt == mv.removed) {
            self.points.remove(pos);
        }
        self.points.push(mv.added);
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Objective: {}", self.objective)?;
        writeln!(f, "  Feasible: {}", self.feasible)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Interchanges: {}", iter)?;
        }
        let indices: Vec<usize> = self.points.iter().map(|pt| pt.index).collect();
        writeln!(f, "  S = {:?}", indices)
    }
}

/// A pairwise interchange: one member leaves the solution, one outside point enters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interchange {
    pub removed: Point,
    pub added: Point,
}

impl Interchange {
    pub fn new(removed: Point, added: Point) -> Self {
        Interchange { removed, added }
    }
}
