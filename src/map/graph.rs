//! Region graph - undirected adjacency plus per-player entering costs
//!
//! Edges carry no weight. The cost of a step is the entering cost of the
//! destination region for the traveling player.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::error::{ConquestError, Result};
use crate::core::types::{Owner, PlayerId, RegionId};
use crate::map::region::Region;

/// Read access to the map, as provided by the map/ownership subsystem
///
/// Pathfinding and scoring only ever read through this trait.
pub trait RegionMap {
    fn region(&self, id: RegionId) -> Option<&Region>;

    /// All region ids in ascending order
    fn region_ids(&self) -> Vec<RegionId>;

    /// Adjacent regions in ascending order (empty for unknown ids)
    fn neighbors(&self, id: RegionId) -> Vec<RegionId>;

    fn owner(&self, id: RegionId) -> Owner {
        self.region(id).and_then(|r| r.owner)
    }

    /// Terrain cost to enter a region, independent of who travels
    fn base_entering_cost(&self, id: RegionId) -> Option<u32> {
        self.region(id).and_then(|r| r.terrain.entering_cost())
    }

    /// Cost for `player` to enter `id`; `None` means impassable for that player
    fn entering_cost(&self, id: RegionId, _player: PlayerId) -> Option<u32> {
        self.base_entering_cost(id)
    }

    /// Bumped on every ownership change
    fn ownership_version(&self) -> u64;

    fn is_passable_for(&self, id: RegionId, player: PlayerId) -> bool {
        self.entering_cost(id, player).is_some()
    }
}

/// The strategic map: regions, adjacency, and ownership version
#[derive(Debug, Clone, Default)]
pub struct RegionGraph {
    regions: BTreeMap<RegionId, Region>,
    adjacency: BTreeMap<RegionId, BTreeSet<RegionId>>,
    /// Regions a player may not enter regardless of terrain
    closed_borders: BTreeSet<(PlayerId, RegionId)>,
    ownership_version: u64,
}

impl RegionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a region
    pub fn add_region(&mut self, region: Region) {
        self.adjacency.entry(region.id).or_default();
        self.regions.insert(region.id, region);
    }

    /// Connect two regions; the edge is undirected and self-loops are ignored
    pub fn connect(&mut self, a: RegionId, b: RegionId) -> Result<()> {
        for id in [a, b] {
            if !self.regions.contains_key(&id) {
                return Err(ConquestError::RegionNotFound(id));
            }
        }
        if a == b {
            return Ok(());
        }
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        Ok(())
    }

    /// Builder-style helper for tests and fixtures
    pub fn with_edges(mut self, edges: &[(u32, u32)]) -> Result<Self> {
        for &(a, b) in edges {
            self.connect(RegionId(a), RegionId(b))?;
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.regions.contains_key(&id)
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Lookup that reports a missing region as an error
    pub fn region_checked(&self, id: RegionId) -> Result<&Region> {
        self.regions.get(&id).ok_or(ConquestError::RegionNotFound(id))
    }

    /// Mutable access for non-ownership attributes (population, recruit pool)
    ///
    /// Ownership must change through `set_owner`.
    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(&id)
    }

    /// Change a region's owner; returns whether anything changed
    pub fn set_owner(&mut self, id: RegionId, owner: Owner) -> Result<bool> {
        let region = self
            .regions
            .get_mut(&id)
            .ok_or(ConquestError::RegionNotFound(id))?;
        if region.owner == owner {
            return Ok(false);
        }
        region.owner = owner;
        self.ownership_version += 1;
        Ok(true)
    }

    /// Regions owned by `player`, ascending
    pub fn owned_by(&self, player: PlayerId) -> Vec<RegionId> {
        self.regions
            .values()
            .filter(|r| r.is_owned_by(player))
            .map(|r| r.id)
            .collect()
    }

    /// Forbid `player` from entering `region`
    pub fn close_border(&mut self, player: PlayerId, region: RegionId) {
        self.closed_borders.insert((player, region));
    }

    pub fn open_border(&mut self, player: PlayerId, region: RegionId) {
        self.closed_borders.remove(&(player, region));
    }

    /// Players that own at least one region, ascending
    pub fn players(&self) -> Vec<PlayerId> {
        self.regions
            .values()
            .filter_map(|r| r.owner)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl RegionMap for RegionGraph {
    fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    fn region_ids(&self) -> Vec<RegionId> {
        self.regions.keys().copied().collect()
    }

    fn neighbors(&self, id: RegionId) -> Vec<RegionId> {
        self.adjacency
            .get(&id)
            .map(|n| n.iter().copied().collect())
            .unwrap_or_default()
    }

    fn entering_cost(&self, id: RegionId, player: PlayerId) -> Option<u32> {
        if self.closed_borders.contains(&(player, id)) {
            return None;
        }
        self.base_entering_cost(id)
    }

    fn ownership_version(&self) -> u64 {
        self.ownership_version
    }
}
