//! Castle-placement scoring
//!
//! A candidate is judged together with its cluster: the region itself plus
//! its traversable, unclaimed neighbors. The individual variant applies the
//! same formulas to a single region and is meant for display.

use ahash::AHashMap;

use crate::core::config::{CastleScoringConfig, ScoreRanges};
use crate::core::types::{PlayerId, RegionId, ResourceKind};
use crate::map::RegionMap;
use crate::scoring::candidate::{sort_by_value, ScoredCandidate, SubScores};
use crate::scoring::normalize::{combine, normalize_linear, resource_score};
use crate::scoring::safety::{hostile_distances, nearest_hostile, safety_score};

/// Cluster members: the candidate (if passable) plus passable neutral neighbors
pub fn cluster_members<M: RegionMap + ?Sized>(map: &M, candidate: RegionId) -> Vec<RegionId> {
    let Some(region) = map.region(candidate) else {
        return Vec::new();
    };

    let mut members = Vec::new();
    if region.is_passable() {
        members.push(candidate);
    }
    members.extend(map.neighbors(candidate).into_iter().filter(|&n| {
        map.region(n)
            .is_some_and(|r| r.is_passable() && r.owner.is_none())
    }));
    members
}

/// Aggregated cluster attributes
#[derive(Debug, Clone, Default)]
struct Aggregate {
    population: f64,
    resources: AHashMap<ResourceKind, f64>,
    average_level: f64,
    size: usize,
}

fn aggregate<M: RegionMap + ?Sized>(map: &M, members: &[RegionId]) -> Aggregate {
    let mut agg = Aggregate::default();
    let mut level_sum = 0.0;
    for region in members.iter().filter_map(|&id| map.region(id)) {
        agg.population += f64::from(region.population);
        for kind in ResourceKind::ALL {
            *agg.resources.entry(kind).or_insert(0.0) += f64::from(region.yield_of(kind));
        }
        level_sum += f64::from(region.level);
        agg.size += 1;
    }
    if agg.size > 0 {
        agg.average_level = level_sum / agg.size as f64;
    }
    agg
}

fn score_members<M: RegionMap + ?Sized>(
    map: &M,
    candidate: RegionId,
    members: &[RegionId],
    ranges: &ScoreRanges,
    distances: &AHashMap<RegionId, u32>,
    config: &CastleScoringConfig,
) -> ScoredCandidate {
    let agg = aggregate(map, members);
    if agg.size == 0 {
        return ScoredCandidate::zero(candidate);
    }

    let distance = nearest_hostile(distances, members, &config.safety);
    let breakdown = SubScores {
        population: normalize_linear(agg.population, ranges.population),
        resources: resource_score(
            |k| agg.resources.get(&k).copied().unwrap_or(0.0),
            ranges,
            &config.resources,
        ),
        level: normalize_linear(agg.average_level, ranges.level),
        // A single region always fills its own (degenerate) size range
        size: if ranges.size.max <= ranges.size.min {
            1.0
        } else {
            normalize_linear(agg.size as f64, ranges.size)
        },
        safety: safety_score(distance, &config.safety),
        ownership: 0.0,
    };

    let w = &config.weights;
    let value = combine(&[
        (w.population, breakdown.population),
        (w.resources, breakdown.resources),
        (w.level, breakdown.level),
        (w.size, breakdown.size),
        (w.safety, breakdown.safety),
    ]);

    ScoredCandidate {
        region: candidate,
        value,
        breakdown,
    }
}

/// Cluster score of `candidate` for a castle founded by `player`
pub fn score_castle_cluster<M: RegionMap + ?Sized>(
    map: &M,
    candidate: RegionId,
    player: PlayerId,
    config: &CastleScoringConfig,
) -> ScoredCandidate {
    let distances = hostile_distances(map, player);
    let members = cluster_members(map, candidate);
    score_members(map, candidate, &members, &config.cluster_ranges, &distances, config)
}

/// Single-region score using per-region ranges (display/comparison only)
pub fn score_castle_individual<M: RegionMap + ?Sized>(
    map: &M,
    region: RegionId,
    player: PlayerId,
    config: &CastleScoringConfig,
) -> ScoredCandidate {
    let distances = hostile_distances(map, player);
    let members: Vec<RegionId> = map
        .region(region)
        .filter(|r| r.is_passable())
        .map(|r| vec![r.id])
        .unwrap_or_default();
    score_members(map, region, &members, &config.individual_ranges, &distances, config)
}

/// Cluster scores for every region `player` could found a castle in
///
/// Candidates are neutral or owned by `player`, hold no castle yet, and are
/// passable. Best first.
pub fn castle_candidates<M: RegionMap + ?Sized>(
    map: &M,
    player: PlayerId,
    config: &CastleScoringConfig,
) -> Vec<ScoredCandidate> {
    let distances = hostile_distances(map, player);
    let mut scored: Vec<ScoredCandidate> = map
        .region_ids()
        .into_iter()
        .filter(|&id| {
            map.region(id).is_some_and(|r| {
                r.is_passable() && !r.is_castle() && (r.owner.is_none() || r.owner == Some(player))
            })
        })
        .map(|id| {
            let members = cluster_members(map, id);
            score_members(map, id, &members, &config.cluster_ranges, &distances, config)
        })
        .collect();
    sort_by_value(&mut scored);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{CastleTier, Region, RegionGraph, Terrain};

    const ME: PlayerId = PlayerId(1);
    const ENEMY: PlayerId = PlayerId(2);

    fn sample() -> RegionGraph {
        // 1 (candidate) touches 2 (neutral), 3 (mine), 4 (mountains), 5 (neutral)
        let mut g = RegionGraph::new();
        g.add_region(
            Region::new(RegionId(1), Terrain::Plains)
                .with_population(2_000)
                .with_yield(ResourceKind::Food, 6)
                .with_level(3),
        );
        g.add_region(Region::new(RegionId(2), Terrain::Forest).with_population(1_000));
        g.add_region(Region::new(RegionId(3), Terrain::Plains).with_owner(ME));
        g.add_region(Region::new(RegionId(4), Terrain::Mountains));
        g.add_region(Region::new(RegionId(5), Terrain::Hills).with_yield(ResourceKind::Iron, 3));
        g.with_edges(&[(1, 2), (1, 3), (1, 4), (1, 5)]).unwrap()
    }

    #[test]
    fn test_cluster_excludes_claimed_and_impassable() {
        let g = sample();
        assert_eq!(
            cluster_members(&g, RegionId(1)),
            vec![RegionId(1), RegionId(2), RegionId(5)]
        );
    }

    #[test]
    fn test_impassable_candidate_alone_scores_zero() {
        let mut g = RegionGraph::new();
        g.add_region(Region::new(RegionId(1), Terrain::Mountains));
        let scored = score_castle_cluster(&g, RegionId(1), ME, &CastleScoringConfig::default());
        assert_eq!(scored, ScoredCandidate::zero(RegionId(1)));
    }

    #[test]
    fn test_cluster_aggregates_resources() {
        let g = sample();
        let config = CastleScoringConfig::default();
        let scored = score_castle_cluster(&g, RegionId(1), ME, &config);
        assert!(scored.breakdown.resources > 0.0);
        assert!((scored.breakdown.size - 2.0 / 6.0).abs() < 1e-9);
        assert!(scored.breakdown.safety > 0.999);
        assert!(scored.value > 0.0 && scored.value <= 1.0);
    }

    #[test]
    fn test_nearby_enemy_lowers_safety() {
        let config = CastleScoringConfig::default();
        let calm = score_castle_cluster(&sample(), RegionId(1), ME, &config);

        let mut g = sample();
        g.add_region(Region::new(RegionId(6), Terrain::Plains).with_owner(ENEMY));
        g.connect(RegionId(5), RegionId(6)).unwrap();
        let threatened = score_castle_cluster(&g, RegionId(1), ME, &config);

        assert!(threatened.breakdown.safety < calm.breakdown.safety);
        assert!(threatened.value < calm.value);
    }

    #[test]
    fn test_individual_uses_region_only() {
        let g = sample();
        let scored = score_castle_individual(&g, RegionId(1), ME, &CastleScoringConfig::default());
        assert_eq!(scored.breakdown.size, 1.0);
        assert!((scored.breakdown.level - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_candidates_skip_castles_and_foreign_land() {
        let mut g = sample();
        g.add_region(Region::new(RegionId(7), Terrain::Plains).with_castle(CastleTier::Outpost));
        g.add_region(Region::new(RegionId(8), Terrain::Plains).with_owner(ENEMY));
        let ids: Vec<RegionId> = castle_candidates(&g, ME, &CastleScoringConfig::default())
            .into_iter()
            .map(|c| c.region)
            .collect();
        assert!(ids.contains(&RegionId(1)));
        assert!(ids.contains(&RegionId(3)));
        assert!(!ids.contains(&RegionId(4)));
        assert!(!ids.contains(&RegionId(7)));
        assert!(!ids.contains(&RegionId(8)));
    }
}
