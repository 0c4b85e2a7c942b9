//! Resource needs estimator
//!
//! A pure projection of a player's economy: income from owned regions,
//! food eaten by armies, and a priority multiplier per resource kind that
//! grows when a resource is running short.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::config::NeedsConfig;
use crate::core::types::{PlayerId, ResourceKind};
use crate::economy::units::food_upkeep;
use crate::map::RegionMap;
use crate::turn::army::Army;

/// Stockpile of one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEconomy {
    pub player: PlayerId,
    #[serde(default)]
    pub stock: BTreeMap<ResourceKind, u32>,
}

impl PlayerEconomy {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            stock: BTreeMap::new(),
        }
    }

    pub fn with_stock(mut self, kind: ResourceKind, amount: u32) -> Self {
        self.stock.insert(kind, amount);
        self
    }

    pub fn stock_of(&self, kind: ResourceKind) -> u32 {
        self.stock.get(&kind).copied().unwrap_or(0)
    }
}

/// Projection for a single resource kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceNeed {
    pub income: u32,
    pub consumption: u32,
    /// `income - consumption`
    pub net: i64,
    /// Turns of stock per unit of net change; 0 (critical) unless net is positive
    pub coverage: f64,
    /// Always >= 1.0
    pub multiplier: f64,
}

/// Needs for every resource kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceNeeds {
    pub needs: BTreeMap<ResourceKind, ResourceNeed>,
}

impl ResourceNeeds {
    pub fn get(&self, kind: ResourceKind) -> Option<&ResourceNeed> {
        self.needs.get(&kind)
    }

    pub fn multipliers(&self) -> BTreeMap<ResourceKind, f64> {
        self.needs
            .iter()
            .map(|(kind, need)| (*kind, need.multiplier))
            .collect()
    }
}

/// Project income, consumption and multipliers for `economy.player`
pub fn estimate_needs<'a, M: RegionMap + ?Sized>(
    map: &M,
    armies: impl IntoIterator<Item = &'a Army>,
    economy: &PlayerEconomy,
    config: &NeedsConfig,
) -> ResourceNeeds {
    let player = economy.player;

    let mut income: BTreeMap<ResourceKind, u64> = BTreeMap::new();
    let divisor = config.gold_per_population_divisor.max(1);
    for region in map
        .region_ids()
        .into_iter()
        .filter_map(|id| map.region(id))
        .filter(|r| r.is_owned_by(player))
    {
        for kind in ResourceKind::ALL {
            *income.entry(kind).or_insert(0) += u64::from(region.yield_of(kind));
        }
        *income.entry(ResourceKind::Gold).or_insert(0) += u64::from(region.population / divisor);
    }

    let food_eaten: u64 = armies
        .into_iter()
        .filter(|a| a.owner == player)
        .map(|a| u64::from(food_upkeep(&a.units)))
        .sum();

    let needs = ResourceKind::ALL
        .into_iter()
        .map(|kind| {
            let income = clamp_u32(income.get(&kind).copied().unwrap_or(0));
            let consumption = if kind == ResourceKind::Food {
                clamp_u32(food_eaten)
            } else {
                0
            };
            let need = project(kind, income, consumption, economy.stock_of(kind), config);
            (kind, need)
        })
        .collect();

    ResourceNeeds { needs }
}

fn project(
    kind: ResourceKind,
    income: u32,
    consumption: u32,
    stock: u32,
    config: &NeedsConfig,
) -> ResourceNeed {
    let net = i64::from(income) - i64::from(consumption);
    let coverage = if net > 0 {
        f64::from(stock) / net as f64
    } else {
        0.0
    };

    let mut multiplier = 1.0;
    if net < 0 {
        multiplier *= config.deficit_boost;
    }
    if coverage < config.target_coverage_turns {
        multiplier *= config.low_coverage_boost;
    }
    let floor = config.stock_floors.get(&kind).copied().unwrap_or(0);
    if stock < floor {
        multiplier *= config.low_stock_boost;
    }

    ResourceNeed {
        income,
        consumption,
        net,
        coverage,
        multiplier: multiplier.max(1.0),
    }
}

fn clamp_u32(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}
