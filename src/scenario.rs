//! Load game states from JSON scenario files
//!
//! Scenarios are fixtures for the simulator binary and tests:
//!
//! ```json
//! {
//!   "regions": [{ "id": 1, "owner": 1, "terrain": "plains", "castle": "outpost" }],
//!   "edges": [[1, 2]],
//!   "armies": [{ "id": 1, "owner": 1, "region": 1, "units": { "spearmen": 20 } }],
//!   "economies": [{ "player": 1, "stock": { "gold": 300 } }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::core::error::{ConquestError, Result};
use crate::core::types::RegionId;
use crate::economy::needs::PlayerEconomy;
use crate::map::region::{MAX_LEVEL, MIN_LEVEL};
use crate::map::{Region, RegionGraph};
use crate::turn::army::Army;
use crate::turn::state::GameState;

/// Raw scenario file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub regions: Vec<Region>,
    #[serde(default)]
    pub edges: Vec<(u32, u32)>,
    #[serde(default)]
    pub armies: Vec<Army>,
    #[serde(default)]
    pub economies: Vec<PlayerEconomy>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Reject duplicate ids and references to unknown regions
    pub fn validate(&self) -> Result<()> {
        let mut regions = BTreeSet::new();
        for region in &self.regions {
            if !regions.insert(region.id) {
                return Err(ConquestError::InvalidScenario(format!(
                    "duplicate region {}",
                    region.id
                )));
            }
        }

        for &(a, b) in &self.edges {
            for id in [a, b] {
                if !regions.contains(&RegionId(id)) {
                    return Err(ConquestError::InvalidScenario(format!(
                        "edge ({a}, {b}) references unknown region {}",
                        RegionId(id)
                    )));
                }
            }
        }

        let mut armies = BTreeSet::new();
        for army in &self.armies {
            if !armies.insert(army.id) {
                return Err(ConquestError::InvalidScenario(format!(
                    "duplicate army {}",
                    army.id
                )));
            }
            if !regions.contains(&army.region) {
                return Err(ConquestError::InvalidScenario(format!(
                    "{} stands in unknown region {}",
                    army.id, army.region
                )));
            }
        }

        let mut players = BTreeSet::new();
        for economy in &self.economies {
            if !players.insert(economy.player) {
                return Err(ConquestError::InvalidScenario(format!(
                    "duplicate economy for {}",
                    economy.player
                )));
            }
        }
        Ok(())
    }

    /// Build the game state; region levels are clamped into range
    pub fn into_state(self) -> Result<GameState> {
        self.validate()?;

        let mut map = RegionGraph::new();
        for mut region in self.regions {
            region.level = region.level.clamp(MIN_LEVEL, MAX_LEVEL);
            if region.name.is_empty() {
                region.name = format!("Region {}", region.id.0);
            }
            map.add_region(region);
        }
        for (a, b) in self.edges {
            map.connect(RegionId(a), RegionId(b))?;
        }

        let mut state = GameState::new(map);
        for mut army in self.armies {
            if army.name.is_empty() {
                army.name = format!("Army {}", army.id.0);
            }
            state.add_army(army);
        }
        for economy in self.economies {
            state.add_economy(economy);
        }
        Ok(state)
    }
}

/// Read a scenario file straight into a game state
pub fn load_state(path: &Path) -> Result<GameState> {
    Scenario::load(path)?.into_state()
}
