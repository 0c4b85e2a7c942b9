//! Region - atomic territorial unit and node of the region graph

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{Owner, PlayerId, RegionId, ResourceKind};

/// Lowest administrative level
pub const MIN_LEVEL: u8 = 1;
/// Highest administrative level
pub const MAX_LEVEL: u8 = 5;

/// Terrain kinds; exactly one of them is impassable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Plains,
    Coast,
    River,
    Forest,
    Hills,
    Desert,
    Marsh,
    Mountains,
}

impl Terrain {
    /// Movement points needed to enter a region of this terrain
    ///
    /// `None` means impassable.
    pub fn entering_cost(&self) -> Option<u32> {
        match self {
            Self::Plains | Self::Coast | Self::River => Some(1),
            Self::Forest | Self::Hills | Self::Desert => Some(2),
            Self::Marsh => Some(3),
            Self::Mountains => None,
        }
    }

    pub fn is_passable(&self) -> bool {
        self.entering_cost().is_some()
    }
}

impl Default for Terrain {
    fn default() -> Self {
        Self::Plains
    }
}

/// Castle tier (0 = no castle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CastleTier {
    None = 0,
    Outpost = 1,
    Castle = 2,
    Fortress = 3,
    Citadel = 4,
}

impl CastleTier {
    pub const ALL: [CastleTier; 5] = [
        CastleTier::None,
        CastleTier::Outpost,
        CastleTier::Castle,
        CastleTier::Fortress,
        CastleTier::Citadel,
    ];

    pub fn is_castle(&self) -> bool {
        *self != CastleTier::None
    }

    pub fn ordinal(&self) -> u8 {
        *self as u8
    }
}

impl Default for CastleTier {
    fn default() -> Self {
        Self::None
    }
}

/// A region on the strategic map
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    #[serde(default)]
    pub name: String,

    /// Change through `RegionGraph::set_owner` so score caches see it
    #[serde(default)]
    pub owner: Owner,
    #[serde(default)]
    pub population: u32,
    /// Per-turn yields; a missing kind yields zero
    #[serde(default)]
    pub yields: AHashMap<ResourceKind, u32>,
    /// Administrative level, 1-5
    #[serde(default = "default_level")]
    pub level: u8,
    #[serde(default)]
    pub castle: CastleTier,
    #[serde(default)]
    pub terrain: Terrain,

    /// Recruits available this cycle; regenerated outside this crate
    #[serde(default)]
    pub recruit_pool: u32,
}

fn default_level() -> u8 {
    MIN_LEVEL
}

impl Region {
    pub fn new(id: RegionId, terrain: Terrain) -> Self {
        Self {
            id,
            name: format!("Region {}", id.0),
            owner: None,
            population: 0,
            yields: AHashMap::new(),
            level: MIN_LEVEL,
            castle: CastleTier::None,
            terrain,
            recruit_pool: 0,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_population(mut self, population: u32) -> Self {
        self.population = population;
        self
    }

    pub fn with_yield(mut self, kind: ResourceKind, amount: u32) -> Self {
        self.yields.insert(kind, amount);
        self
    }

    /// Level is clamped to 1-5
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        self
    }

    pub fn with_castle(mut self, castle: CastleTier) -> Self {
        self.castle = castle;
        self
    }

    pub fn with_recruit_pool(mut self, pool: u32) -> Self {
        self.recruit_pool = pool;
        self
    }

    /// Yield of one resource kind (zero when absent)
    pub fn yield_of(&self, kind: ResourceKind) -> u32 {
        self.yields.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_passable(&self) -> bool {
        self.terrain.is_passable()
    }

    pub fn is_castle(&self) -> bool {
        self.castle.is_castle()
    }

    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }
}
