//! Score cache keyed by (region, mode, player) and the map's ownership version
//!
//! Entries recorded under an older ownership version are never returned.
//! Changes to non-ownership attributes (population, yields) are not
//! versioned; call `clear` after such edits.

use ahash::AHashMap;

use crate::core::config::AiConfig;
use crate::core::types::{PlayerId, RegionId};
use crate::map::RegionMap;
use crate::scoring::candidate::{sort_by_value, ScoredCandidate};
use crate::scoring::castle::{score_castle_cluster, score_castle_individual};
use crate::scoring::frontier::{get_frontier_targets, score_frontier_target};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoringMode {
    CastleCluster,
    CastleIndividual,
    Frontier,
}

type CacheKey = (RegionId, ScoringMode, PlayerId);

#[derive(Debug, Default)]
pub struct ScoreCache {
    entries: AHashMap<CacheKey, (u64, ScoredCandidate)>,
    hits: u64,
    misses: u64,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached score, if recorded under `version`
    pub fn get(
        &self,
        version: u64,
        region: RegionId,
        mode: ScoringMode,
        player: PlayerId,
    ) -> Option<&ScoredCandidate> {
        self.entries
            .get(&(region, mode, player))
            .filter(|(v, _)| *v == version)
            .map(|(_, c)| c)
    }

    pub fn insert(
        &mut self,
        version: u64,
        mode: ScoringMode,
        player: PlayerId,
        candidate: ScoredCandidate,
    ) {
        self.entries
            .insert((candidate.region, mode, player), (version, candidate));
    }

    /// Score `region` in `mode`, reusing a current entry when there is one
    pub fn get_or_score<M: RegionMap + ?Sized>(
        &mut self,
        map: &M,
        region: RegionId,
        mode: ScoringMode,
        player: PlayerId,
        config: &AiConfig,
    ) -> ScoredCandidate {
        let version = map.ownership_version();
        if let Some(hit) = self.get(version, region, mode, player) {
            let hit = hit.clone();
            self.hits += 1;
            return hit;
        }
        self.misses += 1;

        let scored = match mode {
            ScoringMode::CastleCluster => score_castle_cluster(map, region, player, &config.castle),
            ScoringMode::CastleIndividual => {
                score_castle_individual(map, region, player, &config.castle)
            }
            ScoringMode::Frontier => score_frontier_target(map, region, player, &config.frontier),
        };
        self.insert(version, mode, player, scored.clone());
        scored
    }

    /// Frontier candidates of `player`, best first, through the cache
    pub fn frontier<M: RegionMap + ?Sized>(
        &mut self,
        map: &M,
        player: PlayerId,
        config: &AiConfig,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = get_frontier_targets(map, player)
            .into_iter()
            .map(|id| self.get_or_score(map, id, ScoringMode::Frontier, player, config))
            .collect();
        sort_by_value(&mut scored);
        scored
    }

    /// Drop every entry not recorded under `current_version`
    pub fn prune(&mut self, current_version: u64) {
        self.entries.retain(|_, (v, _)| *v == current_version);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
