//! Armies on the strategic map
//!
//! An army is a stack of units standing in one region. It spends movement
//! points entering regions and may hold a recruitment budget while it sits
//! at a castle.

use serde::{Deserialize, Serialize};

use crate::core::types::{ArmyId, PlayerId, RegionId};
use crate::economy::budget::BudgetComposition;
use crate::economy::units::{total_units, UnitCounts};

/// Movement points per turn unless a scenario says otherwise
pub const DEFAULT_MOVEMENT_POINTS: u32 = 4;

fn default_movement() -> u32 {
    DEFAULT_MOVEMENT_POINTS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Army {
    pub id: ArmyId,
    #[serde(default)]
    pub name: String,
    pub owner: PlayerId,
    pub region: RegionId,
    /// Left this turn
    #[serde(default)]
    pub movement_points: u32,
    #[serde(default = "default_movement")]
    pub max_movement_points: u32,
    #[serde(default)]
    pub units: UnitCounts,

    /// Assigned by the budget allocator; `None` away from a castle
    #[serde(default)]
    pub budget: Option<BudgetComposition>,
    #[serde(default)]
    pub recruit_cap: u32,
}

impl Army {
    pub fn new(id: ArmyId, owner: PlayerId, region: RegionId) -> Self {
        Self {
            id,
            name: format!("Army {}", id.0),
            owner,
            region,
            movement_points: DEFAULT_MOVEMENT_POINTS,
            max_movement_points: DEFAULT_MOVEMENT_POINTS,
            units: UnitCounts::new(),
            budget: None,
            recruit_cap: 0,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Sets both current and maximum movement
    pub fn with_movement(mut self, points: u32) -> Self {
        self.movement_points = points;
        self.max_movement_points = points;
        self
    }

    pub fn with_units(mut self, units: UnitCounts) -> Self {
        self.units = units;
        self
    }

    /// Restore full movement; called at the start of the owner's turn
    pub fn reset_movement(&mut self) {
        self.movement_points = self.max_movement_points;
    }

    /// Spend `cost` movement points if there are enough
    pub fn spend_movement(&mut self, cost: u32) -> bool {
        match self.movement_points.checked_sub(cost) {
            Some(left) => {
                self.movement_points = left;
                true
            }
            None => false,
        }
    }

    pub fn can_move(&self) -> bool {
        self.movement_points > 0
    }

    pub fn size(&self) -> u32 {
        total_units(&self.units)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}
