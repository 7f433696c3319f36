//! Module for representing, generating and persisting PDP instances.
//!
//! An instance is a set of candidate points with unique coordinates, the number
//! `p` of points to select, and the matrix of pairwise distances. Distances are
//! Euclidean, truncated to integers, and computed once per point set.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::point::Point;

/// Truncated Euclidean distance between two points
pub type Distance = u64;

/// Dense, symmetric matrix of pairwise distances stored in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistanceMatrix {
    data: Vec<Distance>,
    size: usize,
}

impl DistanceMatrix {
    /// Compute the truncated Euclidean distance matrix of a point set.
    /// Rows and columns follow the order of `points`.
    pub fn from_points(points: &[Point]) -> Self {
        let n = points.len();
        let mut data = vec![0; n * n];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = points[i].distance(&points[j]) as Distance;
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }

        DistanceMatrix { data, size: n }
    }

    /// Distance between the points at positions `i` and `j`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Distance {
        debug_assert!(i < self.size && j < self.size, "({}, {}) outside a {}x{} matrix", i, j, self.size, self.size);
        self.data[i * self.size + j]
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// One row of the matrix
    pub fn row(&self, i: usize) -> &[Distance] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    /// Position pair of the largest entry. Rows and columns are scanned in
    /// index order and only a strictly larger entry replaces the best, so the
    /// first maximum wins and the lower position comes first.
    pub fn farthest_pair(&self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize, Distance)> = None;

        for i in 0..self.size {
            for j in (i + 1)..self.size {
                let d = self.get(i, j);
                if best.map_or(true, |(_, _, bd)| d > bd) {
                    best = Some((i, j, d));
                }
            }
        }

        best.map(|(i, j, _)| (i, j))
    }
}

/// Represents a complete PDP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PDPInstance {
    /// Name of the instance (file stem when loaded from disk)
    pub name: String,
    /// Number of points to select
    pub p: usize,
    /// Candidate points, `points[i].index == i`
    pub points: Vec<Point>,
    /// Precomputed distance matrix, rebuilt with `set_distances` after deserialization
    #[serde(skip)]
    pub distances: DistanceMatrix,
}

impl PDPInstance {
    /// Build an instance from a point list. Points must be indexed `0..n-1` in order.
    pub fn new(name: &str, p: usize, points: Vec<Point>) -> Self {
        let distances = DistanceMatrix::from_points(&points);
        PDPInstance {
            name: name.to_string(),
            p,
            points,
            distances,
        }
    }

    /// Generate `n` points with distinct integer coordinates in
    /// `[0, x_max] x [0, y_max]`, indexed in generation order.
    ///
    /// Duplicate coordinates are rejected and redrawn, so the caller must make
    /// sure the rectangle has room for `n` points (see `validation`), otherwise
    /// this never returns.
    pub fn random(n: usize, p: usize, x_max: i64, y_max: i64, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut seen: HashSet<(i64, i64)> = HashSet::with_capacity(n);
        let mut points = Vec::with_capacity(n);

        while points.len() < n {
            let x = rng.gen_range(0..=x_max);
            let y = rng.gen_range(0..=y_max);
            if seen.insert((x, y)) {
                points.push(Point::new(points.len(), x, y));
            }
        }

        Self::new(&format!("{}_{}", n, p), p, points)
    }

    /// Number of candidate points
    pub fn n(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> Distance {
        self.distances.get(i, j)
    }

    /// Recompute the distance matrix from the current points
    pub fn set_distances(&mut self) {
        self.distances = DistanceMatrix::from_points(&self.points);
    }

    /// The two points with the largest distance, lower index first
    pub fn farthest_pair(&self) -> Option<(Point, Point)> {
        self.distances
            .farthest_pair()
            .map(|(i, j)| (self.points[i], self.points[j]))
    }

    /// Parse an instance file named `<n>_<p>_<index>.dat` whose lines are `<index> <x> <y>`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| format!("Invalid instance file name: {:?}", path))?
            .to_string();
        let (n, p, _) = parse_instance_name(&name)?;

        let file = File::open(path).map_err(|e| format!("Cannot open file: {}", e))?;
        let reader = BufReader::new(file);

        let mut points = Vec::with_capacity(n);
        let mut seen: HashSet<(i64, i64)> = HashSet::with_capacity(n);

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Read error: {}", e))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(format!("Line {}: expected '<index> <x> <y>'", line_no + 1));
            }
            let index: usize = parts[0]
                .parse()
                .map_err(|_| format!("Line {}: invalid index", line_no + 1))?;
            let x: i64 = parts[1]
                .parse()
                .map_err(|_| format!("Line {}: invalid x coordinate", line_no + 1))?;
            let y: i64 = parts[2]
                .parse()
                .map_err(|_| format!("Line {}: invalid y coordinate", line_no + 1))?;

            if index != points.len() {
                return Err(format!(
                    "Line {}: expected point index {}, found {}",
                    line_no + 1,
                    points.len(),
                    index
                ));
            }
            if !seen.insert((x, y)) {
                return Err(format!("Line {}: duplicate coordinates ({}, {})", line_no + 1, x, y));
            }
            points.push(Point::new(index, x, y));
        }

        if points.len() != n {
            return Err(format!("Expected {} points, found {}", n, points.len()));
        }

        Ok(Self::new(&name, p, points))
    }

    /// Write the instance to `dir/<n>_<p>_<index>.dat` and return the path
    pub fn to_file<P: AsRef<Path>>(&self, dir: P, index: usize) -> Result<PathBuf, String> {
        let path = dir.as_ref().join(instance_filename(self.n(), self.p, index));
        let mut file = File::create(&path).map_err(|e| format!("Cannot create {:?}: {}", path, e))?;
        writeln!(file, "{}", self).map_err(|e| format!("Write error: {}", e))?;
        Ok(path)
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.n();
        let mut min_distance = Distance::MAX;
        let mut max_distance = 0;
        let mut sum = 0f64;
        let mut pairs = 0usize;

        for i in 0..n {
            for j in (i + 1)..n {
                let d = self.distance(i, j);
                min_distance = min_distance.min(d);
                max_distance = max_distance.max(d);
                sum += d as f64;
                pairs += 1;
            }
        }

        let (x_min, x_max) = bounds(self.points.iter().map(|pt| pt.x));
        let (y_min, y_max) = bounds(self.points.iter().map(|pt| pt.y));

        InstanceStatistics {
            name: self.name.clone(),
            n,
            p: self.p,
            x_range: (x_min, x_max),
            y_range: (y_min, y_max),
            min_distance: if pairs == 0 { 0 } else { min_distance },
            avg_distance: if pairs == 0 { 0.0 } else { sum / pairs as f64 },
            max_distance,
        }
    }
}

/// The instance file body: one `<index> <x> <y>` line per point
impl std::fmt::Display for PDPInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines: Vec<String> = self.points.iter().map(|pt| pt.to_string()).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

/// `<n>_<p>_<index>.dat`
pub fn instance_filename(n: usize, p: usize, index: usize) -> String {
    format!("{}_{}_{}.dat", n, p, index)
}

/// Split an instance name `<n>_<p>_<index>` into its numbers
pub fn parse_instance_name(name: &str) -> Result<(usize, usize, usize), String> {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() != 3 {
        return Err(format!("Instance name '{}' is not of the form <n>_<p>_<index>", name));
    }
    let field = |s: &str, what: &str| {
        s.parse::<usize>()
            .map_err(|_| format!("Invalid {} '{}' in instance name '{}'", what, s, name))
    };
    Ok((field(parts[0], "n")?, field(parts[1], "p")?, field(parts[2], "index")?))
}

fn bounds(values: impl Iterator<Item = i64>) -> (i64, i64) {
    values.fold(None, |acc: Option<(i64, i64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
    .unwrap_or((0, 0))
}

/// Statistics about a PDP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub n: usize,
    pub p: usize,
    pub x_range: (i64, i64),
    pub y_range: (i64, i64),
    pub min_distance: Distance,
    pub avg_distance: f64,
    pub max_distance: Distance,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Points: {} (select p = {})", self.n, self.p)?;
        writeln!(f, "  X range: [{}, {}]", self.x_range.0, self.x_range.1)?;
        writeln!(f, "  Y range: [{}, {}]", self.y_range.0, self.y_range.1)?;
        writeln!(f, "  Min distance: {}", self.min_distance)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {}", self.max_distance)
    }
}
