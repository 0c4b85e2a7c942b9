//! Frontier / army-target scoring
//!
//! Base values are distance-agnostic so one target list serves every army;
//! movement cost is applied per army by the turn orchestrator.

use std::collections::BTreeSet;

use crate::core::config::FrontierScoringConfig;
use crate::core::types::{is_hostile, PlayerId, RegionId, ResourceKind};
use crate::map::RegionMap;
use crate::scoring::candidate::{sort_by_value, ScoredCandidate, SubScores};
use crate::scoring::normalize::{combine, normalize_linear, resource_score};

/// Regions `player` does not own, can enter, and that border one of its regions
pub fn get_frontier_targets<M: RegionMap + ?Sized>(map: &M, player: PlayerId) -> BTreeSet<RegionId> {
    let mut targets = BTreeSet::new();
    for owned in map
        .region_ids()
        .into_iter()
        .filter(|&id| map.owner(id) == Some(player))
    {
        for neighbor in map.neighbors(owned) {
            if map.owner(neighbor) != Some(player) && map.is_passable_for(neighbor, player) {
                targets.insert(neighbor);
            }
        }
    }
    targets
}

/// Base value of attacking `target` as `player`
///
/// Unknown or impassable targets score zero.
pub fn score_frontier_target<M: RegionMap + ?Sized>(
    map: &M,
    target: RegionId,
    player: PlayerId,
    config: &FrontierScoringConfig,
) -> ScoredCandidate {
    let Some(region) = map.region(target) else {
        return ScoredCandidate::zero(target);
    };
    if !map.is_passable_for(target, player) {
        return ScoredCandidate::zero(target);
    }

    let ranges = &config.ranges;
    let ownership = if is_hostile(region.owner, player) {
        config.hostile_ownership
    } else if region.owner.is_none() {
        config.neutral_ownership
    } else {
        0.0
    };

    let breakdown = SubScores {
        population: normalize_linear(f64::from(region.population), ranges.population),
        resources: resource_score(
            |k: ResourceKind| f64::from(region.yield_of(k)),
            ranges,
            &config.resources,
        ),
        level: normalize_linear(f64::from(region.level), ranges.level),
        ownership: ownership.clamp(0.0, 1.0),
        ..SubScores::default()
    };

    let w = &config.weights;
    let value = combine(&[
        (w.population, breakdown.population),
        (w.resources, breakdown.resources),
        (w.level, breakdown.level),
        (w.ownership, breakdown.ownership),
    ]);

    ScoredCandidate {
        region: target,
        value,
        breakdown,
    }
}

/// Score every frontier target of `player`, best first
pub fn score_frontier<M: RegionMap + ?Sized>(
    map: &M,
    player: PlayerId,
    config: &FrontierScoringConfig,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = get_frontier_targets(map, player)
        .into_iter()
        .map(|id| score_frontier_target(map, id, player, config))
        .collect();
    sort_by_value(&mut scored);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Region, RegionGraph, Terrain};

    const ME: PlayerId = PlayerId(1);
    const ENEMY: PlayerId = PlayerId(2);

    fn frontier_map() -> RegionGraph {
        let mut g = RegionGraph::new();
        g.add_region(Region::new(RegionId(1), Terrain::Plains).with_owner(ME));
        g.add_region(Region::new(RegionId(2), Terrain::Plains));
        g.add_region(Region::new(RegionId(3), Terrain::Plains).with_owner(ENEMY));
        g.add_region(Region::new(RegionId(4), Terrain::Plains).with_owner(ME));
        g.add_region(Region::new(RegionId(5), Terrain::Mountains));
        g.add_region(Region::new(RegionId(6), Terrain::Plains));
        g.with_edges(&[(1, 2), (2, 3), (3, 4), (1, 5), (3, 6)]).unwrap()
    }

    #[test]
    fn test_frontier_targets() {
        let targets = get_frontier_targets(&frontier_map(), ME);
        assert_eq!(targets, BTreeSet::from([RegionId(2), RegionId(3)]));
    }

    #[test]
    fn test_closed_border_removes_target() {
        let mut g = frontier_map();
        g.close_border(ME, RegionId(3));
        assert_eq!(get_frontier_targets(&g, ME), BTreeSet::from([RegionId(2)]));
    }

    #[test]
    fn test_hostile_outranks_identical_neutral() {
        let g = frontier_map();
        let config = FrontierScoringConfig::default();
        let neutral = score_frontier_target(&g, RegionId(2), ME, &config);
        let hostile = score_frontier_target(&g, RegionId(3), ME, &config);
        assert_eq!(neutral.breakdown.ownership, 0.5);
        assert_eq!(hostile.breakdown.ownership, 1.0);
        assert!(hostile.value > neutral.value);

        let ranked = score_frontier(&g, ME, &config);
        assert_eq!(ranked[0].region, RegionId(3));
    }

    #[test]
    fn test_impassable_target_scores_zero() {
        let g = frontier_map();
        let scored = score_frontier_target(&g, RegionId(5), ME, &FrontierScoringConfig::default());
        assert_eq!(scored.value, 0.0);
    }

    #[test]
    fn test_no_owned_regions_no_targets() {
        let g = frontier_map();
        assert!(get_frontier_targets(&g, PlayerId(9)).is_empty());
    }
}
