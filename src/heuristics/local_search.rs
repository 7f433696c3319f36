//! Local search improvement heuristics for the PDP.
//!
//! Both heuristics interchange one of the two closest points x1, x2 of the
//! solution S with a point outside S:
//! - IF (first pairwise interchange) performs the first improving interchange
//! - IM (best pairwise interchange) scans every outside point and performs the
//!   best one
//!
//! Every accepted interchange strictly raises the integer objective, which is
//! bounded by the largest distance of the instance, so both terminate.

use std::collections::HashSet;

use crate::instance::{Distance, PDPInstance};
use crate::objective::{closest_pair, distance_to_set, objective};
use crate::point::Point;
use crate::solution::{Interchange, Solution};

/// Trait for local search improvement methods
pub trait LocalSearch {
    fn improve(&self, instance: &PDPInstance, solution: &mut Solution) -> bool;
    fn name(&self) -> &str;
}

/// Which improving interchange is performed per iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImprovementPolicy {
    /// Stop at the first improving outside point
    First,
    /// Scan all outside points and keep the best
    Best,
}

/// Outcome of one iteration of the search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// An interchange was applied, the search goes on
    Searching(Interchange),
    /// No improving interchange exists
    Converged,
}

/// Pairwise Interchange Local Search
pub struct PairwiseInterchange {
    pub policy: ImprovementPolicy,
}

impl PairwiseInterchange {
    pub fn new(policy: ImprovementPolicy) -> Self {
        PairwiseInterchange { policy }
    }

    /// First Pairwise Interchange (IF)
    pub fn first_improvement() -> Self {
        Self::new(ImprovementPolicy::First)
    }

    /// Best Pairwise Interchange (IM)
    pub fn best_improvement() -> Self {
        Self::new(ImprovementPolicy::Best)
    }

    /// Run one iteration: find an improving interchange and apply it.
    pub fn step(&self, instance: &PDPInstance, solution: &mut Solution) -> SearchState {
        match self.find_interchange(instance, &solution.points) {
            Some((mv, value)) => {
                solution.apply_interchange(&mv);
                solution.objective = value;
                SearchState::Searching(mv)
            }
            None => SearchState::Converged,
        }
    }

    /// Improve until convergence, calling `observer` after every accepted interchange.
    pub fn improve_with_observer<F>(&self, instance: &PDPInstance, solution: &mut Solution, mut observer: F) -> bool
    where
        F: FnMut(&Interchange, &Solution),
    {
        let start = std::time::Instant::now();
        let initial = objective(&solution.points, &instance.distances);
        solution.objective = initial;

        let mut iterations = 0;
        while let SearchState::Searching(mv) = self.step(instance, solution) {
            iterations += 1;
            log::debug!(
                "{} #{}: point {} out, point {} in, objective {}",
                self.name(),
                iterations,
                mv.removed.index,
                mv.added.index,
                solution.objective
            );
            observer(&mv, &*solution);
        }

        solution.validate(instance);
        solution.iterations = Some(iterations);
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.objective > initial
    }

    /// The interchange this policy accepts from `points`, with its objective value
    fn find_interchange(&self, instance: &PDPInstance, points: &[Point]) -> Option<(Interchange, Distance)> {
        let distances = &instance.distances;
        let (x1, x2) = closest_pair(points, distances)?;

        let without_x1: Vec<Point> = points.iter().copied().filter(|pt| *pt != x1).collect();
        let without_x2: Vec<Point> = points.iter().copied().filter(|pt| *pt != x2).collect();
        let base1 = objective(&without_x1, distances);
        let base2 = objective(&without_x2, distances);

        let members: HashSet<usize> = points.iter().map(|pt| pt.index).collect();
        let outside = instance.points.iter().filter(|pt| !members.contains(&pt.index));

        // f(S) for IF, f(SS) (the running best) for IM
        let mut reference = objective(points, distances);
        let mut best = None;

        for candidate in outside {
            // f(S - x + c) = min(f(S - x), d(c, S - x))
            let f1 = base1.min(distance_to_set(candidate, &without_x1, distances));
            let f2 = base2.min(distance_to_set(candidate, &without_x2, distances));

            let accepted = if f1 > reference && f1 >= f2 {
                Some((Interchange::new(x1, *candidate), f1))
            } else if f2 > reference && f2 >= f1 {
                Some((Interchange::new(x2, *candidate), f2))
            } else {
                None
            };

            if let Some((mv, value)) = accepted {
                match self.policy {
                    ImprovementPolicy::First => return Some((mv, value)),
                    ImprovementPolicy::Best => {
                        reference = value;
                        best = Some((mv, value));
                    }
                }
            }
        }

        best
    }
}

impl LocalSearch for PairwiseInterchange {
    fn improve(&self, instance: &PDPInstance, solution: &mut Solution) -> bool {
        self.improve_with_observer(instance, solution, |_, _| {})
    }

    fn name(&self) -> &str {
        match self.policy {
            ImprovementPolicy::First => "IF",
            ImprovementPolicy::Best => "IM",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::construction::{ConstructionHeuristic, GreedyConstruction, RandomConstruction};

    fn create_test_instance() -> PDPInstance {
        PDPInstance::random(80, 10, 200, 200, 3)
    }

    fn both() -> Vec<PairwiseInterchange> {
        vec![PairwiseInterchange::first_improvement(), PairwiseInterchange::best_improvement()]
    }

    #[test]
    fn test_feasible_and_monotonic() {
        let instance = create_test_instance();

        for search in both() {
            for seed in 0..5 {
                let mut solution = RandomConstruction::new(seed).construct(&instance);
                let before = solution.objective;

                search.improve(&instance, &mut solution);

                assert!(solution.feasible);
                assert_eq!(solution.points.len(), instance.p);
                assert!(solution.objective >= before);
                assert_eq!(solution.objective, objective(&solution.points, &instance.distances));
            }
        }
    }

    #[test]
    fn test_fixed_point() {
        let instance = create_test_instance();

        for search in both() {
            let mut solution = GreedyConstruction::new().construct(&instance);
            search.improve(&instance, &mut solution);
            let converged = solution.clone();

            let improved = search.improve(&instance, &mut solution);

            assert!(!improved);
            assert_eq!(solution.points, converged.points);
            assert_eq!(solution.iterations, Some(0));
        }
    }

    #[test]
    fn test_deterministic() {
        let instance = create_test_instance();

        for search in both() {
            let initial = RandomConstruction::new(9).construct(&instance);
            let mut a = initial.clone();
            let mut b = initial.clone();
            search.improve(&instance, &mut a);
            search.improve(&instance, &mut b);

            assert_eq!(a.points, b.points);
            assert_eq!(a.objective, b.objective);
        }
    }

    #[test]
    fn test_no_outside_candidates() {
        let points = vec![Point::new(0, 0, 0), Point::new(1, 4, 3)];
        let instance = PDPInstance::new("pair", 2, points.clone());

        for search in both() {
            let mut solution = GreedyConstruction::new().construct(&instance);
            assert_eq!(search.step(&instance, &mut solution), SearchState::Converged);
            assert!(!search.improve(&instance, &mut solution));
            assert_eq!(solution.points, points);
        }
    }

    #[test]
    fn test_single_point_solution_converges() {
        let instance = PDPInstance::random(5, 1, 10, 10, 2);
        let mut solution = Solution::from_points(&instance, vec![instance.points[0]], "single");

        for search in both() {
            assert_eq!(search.step(&instance, &mut solution), SearchState::Converged);
        }
    }

    /// Points on a line at 0, 1, 4, 10 and 6; S = {0, 1, 10}, closest pair (0, 1).
    fn line_instance() -> (PDPInstance, Solution) {
        let points = vec![
            Point::new(0, 0, 0),
            Point::new(1, 1, 0),
            Point::new(2, 4, 0),
            Point::new(3, 10, 0),
            Point::new(4, 6, 0),
        ];
        let instance = PDPInstance::new("line", 3, points);
        let start = vec![instance.points[0], instance.points[1], instance.points[3]];
        let solution = Solution::from_points(&instance, start, "start");
        (instance, solution)
    }

    #[test]
    fn test_first_takes_first_improving_candidate() {
        let (instance, mut solution) = line_instance();
        assert_eq!(solution.objective, 1);

        // candidate 2 (x=4): S - x1 + c = {1, 4, 10} -> 3, S - x2 + c = {0, 4, 10} -> 4
        let state = PairwiseInterchange::first_improvement().step(&instance, &mut solution);

        assert_eq!(
            state,
            SearchState::Searching(Interchange::new(instance.points[1], instance.points[2]))
        );
        assert_eq!(solution.objective, 4);
        assert_eq!(solution.sorted_indices(), vec![0, 2, 3]);
    }

    #[test]
    fn test_best_scans_all_candidates() {
        let (instance, mut solution) = line_instance();

        // candidate 4 (x=6): {0, 6, 10} -> 4 ties candidate 2, so the running best stays
        let state = PairwiseInterchange::best_improvement().step(&instance, &mut solution);

        assert_eq!(
            state,
            SearchState::Searching(Interchange::new(instance.points[1], instance.points[2]))
        );
        assert_eq!(solution.objective, 4);
    }

    #[test]
    fn test_best_prefers_larger_improvement() {
        // same line with an extra point at x=5 after x=4
        let points = vec![
            Point::new(0, 0, 0),
            Point::new(1, 1, 0),
            Point::new(2, 4, 0),
            Point::new(3, 10, 0),
            Point::new(4, 5, 0),
        ];
        let instance = PDPInstance::new("line5", 3, points);
        let start = vec![instance.points[0], instance.points[1], instance.points[3]];

        let mut first = Solution::from_points(&instance, start.clone(), "start");
        PairwiseInterchange::first_improvement().step(&instance, &mut first);
        assert_eq!(first.objective, 4);

        let mut best = Solution::from_points(&instance, start, "start");
        PairwiseInterchange::best_improvement().step(&instance, &mut best);
        assert_eq!(best.objective, 5);
        assert_eq!(best.sorted_indices(), vec![0, 3, 4]);
    }

    #[test]
    fn test_equal_trials_evict_lower_index() {
        // x1 = 0 and x2 = 1 are mirror images around the axis through 2 and 3
        let points = vec![
            Point::new(0, 0, 0),
            Point::new(1, 2, 0),
            Point::new(2, 1, 10),
            Point::new(3, 1, -10),
        ];
        let instance = PDPInstance::new("mirror", 3, points);
        let start = vec![instance.points[0], instance.points[1], instance.points[2]];

        for search in both() {
            let mut solution = Solution::from_points(&instance, start.clone(), "start");
            assert_eq!(solution.objective, 2);

            // {1, 2, 3} and {0, 2, 3} both score 10
            let state = search.step(&instance, &mut solution);

            assert_eq!(
                state,
                SearchState::Searching(Interchange::new(instance.points[0], instance.points[3]))
            );
            assert_eq!(solution.objective, 10);
            assert_eq!(solution.sorted_indices(), vec![1, 2, 3]);
        }
    }

    /// Same acceptance rules, every trial subset evaluated from scratch
    fn full_recompute_search(instance: &PDPInstance, mut points: Vec<Point>, policy: ImprovementPolicy) -> Vec<Point> {
        let distances = &instance.distances;
        loop {
            let Some((x1, x2)) = closest_pair(&points, distances) else {
                return points;
            };
            let mut reference = objective(&points, distances);
            let mut chosen: Option<(Point, Point)> = None;

            for c in instance.points.iter().filter(|c| !points.contains(c)) {
                let trial = |x: Point| {
                    let mut t: Vec<Point> = points.iter().copied().filter(|pt| *pt != x).collect();
                    t.push(*c);
                    objective(&t, distances)
                };
                let (f1, f2) = (trial(x1), trial(x2));

                let accepted = if f1 > reference && f1 >= f2 {
                    Some((x1, f1))
                } else if f2 > reference && f2 >= f1 {
                    Some((x2, f2))
                } else {
                    None
                };

                if let Some((x, value)) = accepted {
                    chosen = Some((x, *c));
                    if policy == ImprovementPolicy::First {
                        break;
                    }
                    reference = value;
                }
            }

            match chosen {
                Some((x, c)) => {
                    points.retain(|pt| *pt != x);
                    points.push(c);
                }
                None => return points,
            }
        }
    }

    #[test]
    fn test_matches_full_recomputation() {
        for seed in 0..30 {
            let instance = PDPInstance::random(30, 5, 40, 40, seed);

            for search in both() {
                let start = RandomConstruction::new(seed).construct(&instance);
                let expected = full_recompute_search(&instance, start.points.clone(), search.policy);

                let mut solution = start;
                search.improve(&instance, &mut solution);

                assert_eq!(solution.points, expected, "seed {} {:?}", seed, search.policy);
                assert_eq!(solution.objective, objective(&expected, &instance.distances));
            }
        }
    }

    #[test]
    fn test_observer_sees_every_interchange() {
        let instance = create_test_instance();
        let mut solution = RandomConstruction::new(1).construct(&instance);
        let mut seen = Vec::new();

        PairwiseInterchange::best_improvement().improve_with_observer(&instance, &mut solution, |mv, sol| {
            assert!(sol.contains(&mv.added));
            seen.push(sol.objective);
        });

        assert_eq!(Some(seen.len()), solution.iterations);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }
}
