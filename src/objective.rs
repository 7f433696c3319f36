//! Maximin objective and the neighbor queries the heuristics are built on.

use crate::instance::{Distance, DistanceMatrix};
use crate::point::Point;

/// Objective of a subset with fewer than two points
pub const UNBOUNDED: Distance = Distance::MAX;

/// The maximin objective of the PDP: the minimum distance between any two
/// points of the solution. `UNBOUNDED` for fewer than two points.
pub fn objective(solution: &[Point], distances: &DistanceMatrix) -> Distance {
    let mut min = UNBOUNDED;
    for (i, a) in solution.iter().enumerate() {
        for b in &solution[i + 1..] {
            min = min.min(distances.get(a.index, b.index));
        }
    }
    min
}

/// Maximin objective measured on the coordinates, for points that may not
/// belong to the instance the matrix was built from.
pub fn coordinate_objective(solution: &[Point]) -> Distance {
    let mut min = UNBOUNDED;
    for (i, a) in solution.iter().enumerate() {
        for b in &solution[i + 1..] {
            min = min.min(a.distance(b) as Distance);
        }
    }
    min
}

/// Distance between a point and a set: the smallest distance to any member.
pub fn distance_to_set(point: &Point, set: &[Point], distances: &DistanceMatrix) -> Distance {
    set.iter()
        .map(|member| distances.get(point.index, member.index))
        .min()
        .unwrap_or(UNBOUNDED)
}

/// The two closest points of the solution, lower index first.
///
/// Points are visited in ascending index order (rows, then columns) and only a
/// strictly smaller distance replaces the best pair, so ties go to the first
/// pair in that order.
pub fn closest_pair(solution: &[Point], distances: &DistanceMatrix) -> Option<(Point, Point)> {
    let mut sorted = solution.to_vec();
    sorted.sort_by_key(|pt| pt.index);

    let mut best: Option<(Point, Point, Distance)> = None;
    for (i, a) in sorted.iter().enumerate() {
        for b in &sorted[i + 1..] {
            let d = distances.get(a.index, b.index);
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((*a, *b, d));
            }
        }
    }

    best.map(|(a, b, _)| (a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<Point> {
        vec![Point::new(0, 1, 1), Point::new(1, 1, 2), Point::new(2, 1, 4)]
    }

    #[test]
    fn test_objective_function() {
        let pts = points();
        let matrix = DistanceMatrix::from_points(&pts);

        assert_eq!(objective(&pts, &matrix), 1);
        assert_eq!(objective(&[pts[0], pts[2]], &matrix), 3);
        assert_eq!(objective(&[pts[1], pts[2]], &matrix), 2);
    }

    #[test]
    fn test_objective_of_small_sets() {
        let pts = points();
        let matrix = DistanceMatrix::from_points(&pts);

        assert_eq!(objective(&[], &matrix), UNBOUNDED);
        assert_eq!(objective(&[pts[1]], &matrix), UNBOUNDED);
    }

    #[test]
    fn test_collinear_best_pair() {
        let pts = vec![Point::new(0, 1, 1), Point::new(1, 1, 2), Point::new(2, 1, 3)];
        let matrix = DistanceMatrix::from_points(&pts);

        assert_eq!(matrix.row(0), &[0, 1, 2]);
        assert_eq!(matrix.row(1), &[1, 0, 1]);
        assert_eq!(matrix.row(2), &[2, 1, 0]);

        let mut best: Option<((usize, usize), Distance)> = None;
        for i in 0..3 {
            for j in (i + 1)..3 {
                let value = objective(&[pts[i], pts[j]], &matrix);
                if best.map_or(true, |(_, v)| value > v) {
                    best = Some(((i, j), value));
                }
            }
        }
        assert_eq!(best, Some(((0, 2), 2)));
    }

    #[test]
    fn test_closest_pair() {
        let pts = points();
        let matrix = DistanceMatrix::from_points(&pts);

        // order of the solution does not matter
        let shuffled = vec![pts[2], pts[1], pts[0]];
        assert_eq!(closest_pair(&shuffled, &matrix), Some((pts[0], pts[1])));
        assert_eq!(closest_pair(&[pts[2]], &matrix), None);
    }

    #[test]
    fn test_closest_pair_tie_break() {
        // evenly spaced: (0,1) and (1,2) are both at distance 1
        let pts = vec![Point::new(0, 0, 0), Point::new(1, 0, 1), Point::new(2, 0, 2)];
        let matrix = DistanceMatrix::from_points(&pts);

        let (x1, x2) = closest_pair(&[pts[2], pts[1], pts[0]], &matrix).unwrap();
        assert_eq!((x1.index, x2.index), (0, 1));
    }

    #[test]
    fn test_distance_to_set() {
        let pts = points();
        let matrix = DistanceMatrix::from_points(&pts);

        assert_eq!(distance_to_set(&pts[2], &pts[..2], &matrix), 2);
        assert_eq!(distance_to_set(&pts[2], &[], &matrix), UNBOUNDED);
    }
}
