//! Region scoring: castle placement and frontier targets
//!
//! Scoring functions are stateless and only read the map. `ScoreCache`
//! memoizes them against the map's ownership version.

pub mod cache;
pub mod candidate;
pub mod castle;
pub mod frontier;
pub mod normalize;
pub mod safety;

pub use cache::{ScoreCache, ScoringMode};
pub use candidate::{ScoredCandidate, SubScores};
pub use castle::{castle_candidates, cluster_members, score_castle_cluster, score_castle_individual};
pub use frontier::{get_frontier_targets, score_frontier, score_frontier_target};
pub use safety::safety_score;
