use crate::instance::{Distance, PDPInstance};
use crate::objective::distance_to_set;
use crate::point::Point;
use crate::solution::Solution;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &PDPInstance) -> Solution;
    fn name(&self) -> &str;
}

/// Greedy Construction (GC), farthest-point insertion
///
/// Starts from the two farthest points and repeatedly adds the candidate
/// farthest from the current solution, until p points are selected.
/// Ties go to the first candidate in instance order.
///
/// `2 <= p <= n` is expected and not checked.
pub struct GreedyConstruction;

impl GreedyConstruction {
    pub fn new() -> Self {
        GreedyConstruction
    }

    /// Position in `candidates` of the first candidate with the largest distance
    fn farthest_candidate(dist_to_solution: &[Distance]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (k, &d) in dist_to_solution.iter().enumerate() {
            if best.map_or(true, |b| d > dist_to_solution[b]) {
                best = Some(k);
            }
        }
        best
    }
}

impl Default for GreedyConstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for GreedyConstruction {
    fn construct(&self, instance: &PDPInstance) -> Solution {
        let start = std::time::Instant::now();

        let (first, second) = match instance.farthest_pair() {
            Some(pair) => pair,
            None => return Solution::from_points(instance, instance.points.clone(), self.name()),
        };

        let mut selected = vec![first, second];
        let mut candidates: Vec<Point> = instance
            .points
            .iter()
            .copied()
            .filter(|pt| *pt != first && *pt != second)
            .collect();

        // distance of each candidate to the current solution, lowered after every insertion
        let mut dist_to_solution: Vec<Distance> = candidates
            .iter()
            .map(|c| distance_to_set(c, &selected, &instance.distances))
            .collect();

        while selected.len() < instance.p {
            let best = match Self::farthest_candidate(&dist_to_solution) {
                Some(k) => k,
                None => break,
            };

            let chosen = candidates.remove(best);
            let chosen_distance = dist_to_solution.remove(best);
            log::debug!("GC adds point {} at distance {}", chosen.index, chosen_distance);

            for (c, d) in candidates.iter().zip(dist_to_solution.iter_mut()) {
                *d = (*d).min(instance.distance(c.index, chosen.index));
            }
            selected.push(chosen);
        }

        let mut solution = Solution::from_points(instance, selected, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        "GC"
    }
}

/// Random Construction
///
/// Samples p distinct points uniformly, the baseline the interchange
/// heuristics are compared against when no constructive heuristic is used.
pub struct RandomConstruction {
    pub seed: u64,
}

impl RandomConstruction {
    pub fn new(seed: u64) -> Self {
        RandomConstruction { seed }
    }
}

impl Default for RandomConstruction {
    fn default() -> Self {
        Self::new(42)
    }
}

impl ConstructionHeuristic for RandomConstruction {
    fn construct(&self, instance: &PDPInstance) -> Solution {
        let start = std::time::Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let points: Vec<Point> = instance
            .points
            .choose_multiple(&mut rng, instance.p)
            .copied()
            .collect();

        let mut solution = Solution::from_points(instance, points, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::objective;

    fn create_test_instance() -> PDPInstance {
        PDPInstance::random(60, 8, 100, 100, 11)
    }

    #[test]
    fn test_greedy_construction() {
        let instance = create_test_instance();
        let solution = GreedyConstruction::new().construct(&instance);

        assert_eq!(solution.points.len(), 8);
        assert!(solution.feasible);
        assert_eq!(solution.objective, objective(&solution.points, &instance.distances));

        let (a, b) = instance.farthest_pair().unwrap();
        assert_eq!(solution.points[0], a);
        assert_eq!(solution.points[1], b);
    }

    #[test]
    fn test_greedy_picks_farthest_candidate() {
        // on a line, the midpoint 5 is the farthest from {0, 10}
        let points = vec![
            Point::new(0, 0, 0),
            Point::new(1, 2, 0),
            Point::new(2, 5, 0),
            Point::new(3, 10, 0),
            Point::new(4, 9, 0),
        ];
        let instance = PDPInstance::new("line", 3, points);
        let solution = GreedyConstruction::new().construct(&instance);

        let indices: Vec<usize> = solution.points.iter().map(|pt| pt.index).collect();
        assert_eq!(indices, vec![0, 3, 2]);
        assert_eq!(solution.objective, 5);
    }

    #[test]
    fn test_greedy_tie_goes_to_first_candidate() {
        // points 1 and 2 are both at distance 5 from {0, 3}
        let points = vec![
            Point::new(0, 0, 0),
            Point::new(1, 5, 0),
            Point::new(2, 5, 1),
            Point::new(3, 10, 0),
        ];
        let instance = PDPInstance::new("tie", 3, points);
        let solution = GreedyConstruction::new().construct(&instance);

        assert_eq!(solution.points[2].index, 1);
    }

    #[test]
    fn test_greedy_two_points() {
        let points = vec![Point::new(0, 0, 0), Point::new(1, 4, 3)];
        let instance = PDPInstance::new("pair", 2, points.clone());
        let solution = GreedyConstruction::new().construct(&instance);

        assert_eq!(solution.points, points);
        assert_eq!(solution.objective, 5);
        assert!(solution.feasible);
    }

    #[test]
    fn test_greedy_is_deterministic() {
        let instance = create_test_instance();
        let a = GreedyConstruction::new().construct(&instance);
        let b = GreedyConstruction::new().construct(&instance);
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn test_random_construction() {
        let instance = create_test_instance();
        let a = RandomConstruction::new(5).construct(&instance);
        let b = RandomConstruction::new(5).construct(&instance);

        assert!(a.feasible);
        assert_eq!(a.points.len(), instance.p);
        assert_eq!(a.points, b.points);
    }
}
