//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a region (node of the region graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// Unique identifier for a player (human or AI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// Unique identifier for an army
///
/// Stable for the whole session; per-army randomness is seeded from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArmyId(pub u32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for ArmyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

/// Owner of a region: `None` is neutral
pub type Owner = Option<PlayerId>;

/// True if `owner` is another player (neutral is not hostile)
pub fn is_hostile(owner: Owner, player: PlayerId) -> bool {
    matches!(owner, Some(p) if p != player)
}

/// Resource kinds produced by regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Soft currency
    Gold,
    /// The consumable; armies eat it every turn
    Food,
    /// Construction material
    Wood,
    /// Military material
    Iron,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Gold,
        ResourceKind::Food,
        ResourceKind::Wood,
        ResourceKind::Iron,
    ];

    /// Resources that make up a recruitment budget
    pub const TRADEABLE: [ResourceKind; 3] =
        [ResourceKind::Gold, ResourceKind::Wood, ResourceKind::Iron];

    pub fn is_tradeable(&self) -> bool {
        !matches!(self, ResourceKind::Food)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostility() {
        let me = PlayerId(1);
        assert!(!is_hostile(None, me));
        assert!(!is_hostile(Some(me), me));
        assert!(is_hostile(Some(PlayerId(2)), me));
    }

    #[test]
    fn test_id_ordering() {
        assert!(RegionId(1) < RegionId(2));
        assert_eq!(format!("{}", ArmyId(7)), "A7");
    }

    #[test]
    fn test_tradeable_resources() {
        assert!(ResourceKind::TRADEABLE.iter().all(|r| r.is_tradeable()));
        assert!(!ResourceKind::Food.is_tradeable());
    }
}
