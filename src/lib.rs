//! PDP Solver Library
//!
//! Heuristics for the p-dispersion problem (PDP): select p of n points in the
//! plane so that the minimum distance between selected points is as large as
//! possible.
//!
//! # Features
//!
//! - Random instance generation with unique integer coordinates
//! - Greedy farthest-point construction (GC) and a random baseline
//! - First (IF) and best (IM) pairwise interchange local search
//! - Experiment runner with CSV export
//! - SVG visualization
//!
//! # Example
//!
//! ```no_run
//! use pdp_solver::instance::PDPInstance;
//! use pdp_solver::heuristics::construction::{ConstructionHeuristic, GreedyConstruction};
//! use pdp_solver::heuristics::local_search::{LocalSearch, PairwiseInterchange};
//!
//! // Load instance
//! let instance = PDPInstance::from_file("instances/100_10_0.dat").unwrap();
//!
//! // Construct initial solution
//! let mut solution = GreedyConstruction::new().construct(&instance);
//!
//! // Improve with IM
//! PairwiseInterchange::best_improvement().improve(&instance, &mut solution);
//!
//! println!("Objective: {}", solution.objective);
//! ```

pub mod point;
pub mod instance;
pub mod objective;
pub mod solution;
pub mod heuristics;
pub mod validation;
pub mod benchmark;
pub mod visualization;

pub use instance::PDPInstance;
pub use point::Point;
pub use solution::Solution;
