//! Heuristics module for the PDP.
//!
//! This module exports the construction and interchange heuristics, and the
//! selectors used to pick them by name.

pub mod construction;
pub mod local_search;

pub use construction::*;
pub use local_search::*;

use serde::{Deserialize, Serialize};

/// Constructive heuristic choices
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ConstructiveKind {
    /// p points sampled uniformly
    Random,
    /// Greedy farthest-point construction (GC)
    Greedy,
}

impl ConstructiveKind {
    pub fn build(self, seed: u64) -> Box<dyn ConstructionHeuristic + Send + Sync> {
        match self {
            ConstructiveKind::Random => Box::new(RandomConstruction::new(seed)),
            ConstructiveKind::Greedy => Box::new(GreedyConstruction::new()),
        }
    }

    /// Name used in result files
    pub fn short_name(self) -> &'static str {
        match self {
            ConstructiveKind::Random => "random",
            ConstructiveKind::Greedy => "GC",
        }
    }
}

/// Local search choices
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LocalSearchKind {
    /// First pairwise interchange (IF)
    FirstInterchange,
    /// Best pairwise interchange (IM)
    BestInterchange,
}

impl LocalSearchKind {
    pub fn build(self) -> PairwiseInterchange {
        match self {
            LocalSearchKind::FirstInterchange => PairwiseInterchange::first_improvement(),
            LocalSearchKind::BestInterchange => PairwiseInterchange::best_improvement(),
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            LocalSearchKind::FirstInterchange => "IF",
            LocalSearchKind::BestInterchange => "IM",
        }
    }
}
