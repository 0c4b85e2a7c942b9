//! Safety sub-score: distance to the nearest hostile region

use ahash::AHashMap;

use crate::core::config::SafetyConfig;
use crate::core::types::{is_hostile, PlayerId, RegionId};
use crate::map::RegionMap;
use crate::pathfinding::hop_distances;

/// `1 - e^(-max(distance - floor, 0) / decay)`, clamped to [0, 1]
pub fn safety_score(distance: u32, config: &SafetyConfig) -> f64 {
    if config.decay <= 0.0 {
        return 0.0;
    }
    let excess = f64::from(distance.saturating_sub(config.floor_hops));
    (1.0 - (-excess / config.decay).exp()).clamp(0.0, 1.0)
}

/// Hop distance from every reachable region to the nearest region hostile to `player`
pub fn hostile_distances<M: RegionMap + ?Sized>(
    map: &M,
    player: PlayerId,
) -> AHashMap<RegionId, u32> {
    let hostile = map
        .region_ids()
        .into_iter()
        .filter(|&id| is_hostile(map.owner(id), player));
    hop_distances(map, hostile)
}

/// Distance of the closest member of `regions`
///
/// Regions no hostile can reach, or an empty hostile set, fall back to
/// `config.no_hostile_distance`.
pub fn nearest_hostile(
    distances: &AHashMap<RegionId, u32>,
    regions: &[RegionId],
    config: &SafetyConfig,
) -> u32 {
    regions
        .iter()
        .filter_map(|id| distances.get(id).copied())
        .min()
        .unwrap_or(config.no_hostile_distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Region, RegionGraph, Terrain};

    #[test]
    fn test_safety_monotonic_in_distance() {
        let config = SafetyConfig::default();
        let mut previous = -1.0;
        for d in 0..50 {
            let s = safety_score(d, &config);
            assert!(s >= previous);
            assert!((0.0..=1.0).contains(&s));
            previous = s;
        }
        assert_eq!(safety_score(0, &config), 0.0);
        assert_eq!(safety_score(config.floor_hops, &config), 0.0);
    }

    #[test]
    fn test_no_hostiles_is_safe() {
        let config = SafetyConfig::default();
        let mut graph = RegionGraph::new();
        graph.add_region(Region::new(RegionId(1), Terrain::Plains).with_owner(PlayerId(1)));
        let distances = hostile_distances(&graph, PlayerId(1));
        let d = nearest_hostile(&distances, &[RegionId(1)], &config);
        assert_eq!(d, config.no_hostile_distance);
        assert!(safety_score(d, &config) > 0.999);
    }
}
