//! Unit catalogue: static costs, upkeep, combat stats, and ideal compositions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::economy::budget::BudgetComposition;
use crate::map::CastleTier;

/// Unit kinds, cheapest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Peasants,
    Spearmen,
    Swordsmen,
    Archers,
    Crossbowmen,
    Horsemen,
    Knights,
    MountedKnights,
    RoyalGuard,
}

/// Unit counts per kind
pub type UnitCounts = BTreeMap<UnitKind, u32>;

/// Static per-unit data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Recruitment cost of one unit
    pub cost: BudgetComposition,
    /// Food eaten per unit per turn, in tenths
    pub food_upkeep_tenths: u32,
    /// Percent chance per round to land a hit
    pub attack: u32,
    /// Percent chance to deflect a hit
    pub defense: u32,
}

impl UnitKind {
    pub const ALL: [UnitKind; 9] = [
        UnitKind::Peasants,
        UnitKind::Spearmen,
        UnitKind::Swordsmen,
        UnitKind::Archers,
        UnitKind::Crossbowmen,
        UnitKind::Horsemen,
        UnitKind::Knights,
        UnitKind::MountedKnights,
        UnitKind::RoyalGuard,
    ];

    /// The unit kind that costs nothing to recruit
    pub const FREE: UnitKind = UnitKind::Peasants;

    pub fn stats(&self) -> UnitStats {
        let (gold, wood, iron, food_upkeep_tenths, attack, defense) = match self {
            Self::Peasants => (0, 0, 0, 1, 5, 10),
            Self::Spearmen => (1, 0, 0, 1, 10, 25),
            Self::Swordsmen => (2, 0, 0, 1, 30, 40),
            Self::Archers => (3, 1, 0, 1, 25, 15),
            Self::Crossbowmen => (2, 1, 0, 1, 20, 15),
            Self::Horsemen => (5, 0, 0, 2, 30, 30),
            Self::Knights => (10, 0, 1, 2, 60, 60),
            Self::MountedKnights => (15, 0, 1, 4, 65, 60),
            Self::RoyalGuard => (20, 0, 1, 3, 80, 80),
        };
        UnitStats {
            cost: BudgetComposition::new(gold, wood, iron),
            food_upkeep_tenths,
            attack,
            defense,
        }
    }

    pub fn is_free(&self) -> bool {
        self.stats().cost.is_zero()
    }
}

/// Ideal recruitment mix for a castle tier, in percent (sums to 100)
pub fn ideal_composition(tier: CastleTier) -> &'static [(UnitKind, u32)] {
    use UnitKind::*;
    match tier {
        CastleTier::None => &[(Peasants, 100)],
        CastleTier::Outpost => &[(Peasants, 40), (Spearmen, 30), (Archers, 20), (Swordsmen, 10)],
        CastleTier::Castle => &[
            (Peasants, 30),
            (Spearmen, 25),
            (Swordsmen, 15),
            (Archers, 15),
            (Crossbowmen, 10),
            (Horsemen, 5),
        ],
        CastleTier::Fortress => &[
            (Peasants, 20),
            (Spearmen, 20),
            (Swordsmen, 15),
            (Archers, 10),
            (Crossbowmen, 10),
            (Horsemen, 15),
            (Knights, 10),
        ],
        CastleTier::Citadel => &[
            (Peasants, 10),
            (Spearmen, 15),
            (Swordsmen, 15),
            (Archers, 10),
            (Crossbowmen, 10),
            (Horsemen, 15),
            (Knights, 10),
            (MountedKnights, 10),
            (RoyalGuard, 5),
        ],
    }
}

/// Saturates at `u32::MAX`
pub fn total_units(units: &UnitCounts) -> u32 {
    units.values().fold(0u32, |acc, n| acc.saturating_add(*n))
}

/// Food eaten per turn by `units`, rounded up to whole units of food
pub fn food_upkeep(units: &UnitCounts) -> u32 {
    let tenths: u64 = units
        .iter()
        .map(|(kind, count)| u64::from(kind.stats().food_upkeep_tenths) * u64::from(*count))
        .sum();
    u32::try_from(tenths.div_ceil(10)).unwrap_or(u32::MAX)
}

/// Add `extra` into `units`, dropping zero entries
pub fn merge_units(units: &mut UnitCounts, extra: &UnitCounts) {
    for (&kind, &count) in extra {
        if count > 0 {
            let entry = units.entry(kind).or_insert(0);
            *entry = entry.saturating_add(count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compositions_sum_to_100() {
        for tier in CastleTier::ALL {
            let total: u32 = ideal_composition(tier).iter().map(|(_, p)| p).sum();
            assert_eq!(total, 100, "{tier:?}");
        }
    }

    #[test]
    fn test_only_peasants_are_free() {
        for kind in UnitKind::ALL {
            assert_eq!(kind.is_free(), kind == UnitKind::FREE, "{kind:?}");
        }
    }

    #[test]
    fn test_food_upkeep_rounds_up() {
        let units = UnitCounts::from([(UnitKind::Peasants, 15), (UnitKind::Knights, 1)]);
        // 15 * 0.1 + 1 * 0.2 = 1.7
        assert_eq!(food_upkeep(&units), 2);
        assert_eq!(food_upkeep(&UnitCounts::new()), 0);
    }

    #[test]
    fn test_huge_counts_saturate_instead_of_overflowing() {
        let knights = UnitCounts::from([(UnitKind::MountedKnights, u32::MAX)]);
        // 4_294_967_295 * 0.4 rounded up
        assert_eq!(food_upkeep(&knights), 1_717_986_918);

        let mut units = UnitCounts::from([(UnitKind::Peasants, u32::MAX), (UnitKind::Spearmen, u32::MAX)]);
        assert_eq!(total_units(&units), u32::MAX);
        merge_units(&mut units, &UnitCounts::from([(UnitKind::Peasants, 10)]));
        assert_eq!(units[&UnitKind::Peasants], u32::MAX);
        let elite = UnitCounts::from([
            (UnitKind::Horsemen, u32::MAX),
            (UnitKind::Knights, u32::MAX),
            (UnitKind::MountedKnights, u32::MAX),
            (UnitKind::RoyalGuard, u32::MAX),
        ]);
        assert_eq!(food_upkeep(&elite), u32::MAX);
    }

    #[test]
    fn test_merge_units() {
        let mut units = UnitCounts::from([(UnitKind::Spearmen, 2)]);
        merge_units(
            &mut units,
            &UnitCounts::from([(UnitKind::Spearmen, 3), (UnitKind::Archers, 0)]),
        );
        assert_eq!(units, UnitCounts::from([(UnitKind::Spearmen, 5)]));
        assert_eq!(total_units(&units), 5);
    }
}
