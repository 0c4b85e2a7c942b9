//! Scored candidates and their explainable breakdown

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::RegionId;

/// Named sub-scores, each in [0, 1]; sub-scores a mode does not use stay 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub population: f64,
    pub resources: f64,
    pub level: f64,
    pub size: f64,
    pub safety: f64,
    pub ownership: f64,
}

/// A region paired with its overall value in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub region: RegionId,
    pub value: f64,
    pub breakdown: SubScores,
}

impl ScoredCandidate {
    /// Defined result for a candidate with nothing to score
    pub fn zero(region: RegionId) -> Self {
        Self {
            region,
            value: 0.0,
            breakdown: SubScores::default(),
        }
    }
}

/// Highest value first, ties by ascending region id
pub fn sort_by_value(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        OrderedFloat(b.value)
            .cmp(&OrderedFloat(a.value))
            .then(a.region.cmp(&b.region))
    });
}
