//! Game state the AI plays on: the map, every army, and player stockpiles

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::battle::auto::garrison;
use crate::battle::resolver::BattleRequest;
use crate::core::error::{ConquestError, Result};
use crate::core::types::{ArmyId, Owner, PlayerId, RegionId, ResourceKind};
use crate::economy::budget::{allocate_recruitment_budgets, apply_recruitment_budgets, BudgetComposition};
use crate::economy::needs::PlayerEconomy;
use crate::economy::recruitment::{recruit_for_army, RecruitmentPlan};
use crate::economy::units::{merge_units, UnitCounts};
use crate::map::{RegionGraph, RegionMap};
use crate::turn::army::Army;

#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub map: RegionGraph,
    pub armies: BTreeMap<ArmyId, Army>,
    pub economies: BTreeMap<PlayerId, PlayerEconomy>,
}

impl GameState {
    pub fn new(map: RegionGraph) -> Self {
        Self {
            map,
            armies: BTreeMap::new(),
            economies: BTreeMap::new(),
        }
    }

    pub fn add_army(&mut self, army: Army) {
        self.armies.insert(army.id, army);
    }

    pub fn add_economy(&mut self, economy: PlayerEconomy) {
        self.economies.insert(economy.player, economy);
    }

    pub fn army(&self, id: ArmyId) -> Result<&Army> {
        self.armies.get(&id).ok_or(ConquestError::ArmyNotFound(id))
    }

    pub fn army_mut(&mut self, id: ArmyId) -> Result<&mut Army> {
        self.armies.get_mut(&id).ok_or(ConquestError::ArmyNotFound(id))
    }

    pub fn economy(&self, player: PlayerId) -> Result<&PlayerEconomy> {
        self.economies
            .get(&player)
            .ok_or(ConquestError::PlayerNotFound(player))
    }

    pub fn armies_of(&self, player: PlayerId) -> impl Iterator<Item = &Army> {
        self.armies.values().filter(move |a| a.owner == player)
    }

    pub fn armies_at(&self, region: RegionId) -> impl Iterator<Item = &Army> {
        self.armies.values().filter(move |a| a.region == region)
    }

    /// Everyone who owns a region, an army or a stockpile, ascending
    pub fn players(&self) -> Vec<PlayerId> {
        let mut players: BTreeSet<PlayerId> = self.map.players().into_iter().collect();
        players.extend(self.armies.values().map(|a| a.owner));
        players.extend(self.economies.keys().copied());
        players.into_iter().collect()
    }

    pub fn is_eliminated(&self, player: PlayerId) -> bool {
        self.map.owned_by(player).is_empty()
    }

    pub fn reset_movement(&mut self, player: PlayerId) {
        self.armies
            .values_mut()
            .filter(|a| a.owner == player)
            .for_each(Army::reset_movement);
    }

    /// Armies of the region's owner standing in it
    pub fn defending_armies(&self, region: RegionId) -> Vec<ArmyId> {
        let Some(owner) = self.map.region(region).and_then(|r| r.owner) else {
            return Vec::new();
        };
        self.armies_at(region)
            .filter(|a| a.owner == owner)
            .map(|a| a.id)
            .collect()
    }

    /// Battle for `attacker` entering `region`: local militia plus defending armies
    pub fn battle_request(
        &self,
        attacker: ArmyId,
        region: RegionId,
        garrison_divisor: u32,
    ) -> Result<BattleRequest> {
        let army = self.army(attacker)?;
        let target = self.map.region_checked(region)?;

        let mut defender_units = garrison(target.population, garrison_divisor);
        for id in self.defending_armies(region) {
            if let Some(defender) = self.armies.get(&id) {
                merge_units(&mut defender_units, &defender.units);
            }
        }

        Ok(BattleRequest {
            attacker,
            attacker_owner: army.owner,
            region,
            attacker_units: army.units.clone(),
            defender_owner: target.owner,
            defender_units,
        })
    }

    /// Remove the defending armies of a region that just fell
    pub fn destroy_defenders(&mut self, region: RegionId) -> usize {
        let fallen = self.defending_armies(region);
        for id in &fallen {
            self.armies.remove(id);
        }
        fallen.len()
    }

    /// Replace an army's units with battle survivors; an emptied army is removed
    pub fn apply_survivors(&mut self, army: ArmyId, survivors: UnitCounts) {
        if survivors.values().all(|n| *n == 0) {
            debug!("{} destroyed", army);
            self.armies.remove(&army);
        } else if let Some(a) = self.armies.get_mut(&army) {
            a.units = survivors;
        }
    }

    /// One recruitment cycle for `player`
    ///
    /// Budgets come from the player's tradeable stock and go to armies at
    /// the player's castles; spending is taken out of the stock.
    pub fn recruit(&mut self, player: PlayerId) -> BTreeMap<ArmyId, RecruitmentPlan> {
        let total = self
            .economies
            .get(&player)
            .map(|e| BudgetComposition::from_stock(&e.stock))
            .unwrap_or_default();

        let budgets = allocate_recruitment_budgets(&self.map, self.armies.values(), player, total);
        apply_recruitment_budgets(self.armies.values_mut(), player, &budgets);

        let mut plans = BTreeMap::new();
        for id in budgets.keys() {
            let Some(army) = self.armies.get_mut(id) else {
                continue;
            };
            let Some(region) = self.map.region_mut(army.region) else {
                warn!("{} stands in unknown region {}", army.id, army.region);
                continue;
            };
            let plan = recruit_for_army(army, region.castle);
            plan.apply(army, region);
            plans.insert(*id, plan);
        }

        if let Some(economy) = self.economies.get_mut(&player) {
            let spent: BudgetComposition = plans.values().map(|p| p.spent).sum();
            for kind in ResourceKind::TRADEABLE {
                if let Some(stock) = economy.stock.get_mut(&kind) {
                    *stock = stock.saturating_sub(spent.get(kind));
                }
            }
        }

        plans
    }

    /// Region count per owner (`None` = neutral)
    pub fn ownership_tally(&self) -> BTreeMap<Owner, usize> {
        let mut tally = BTreeMap::new();
        for region in self.map.regions() {
            *tally.entry(region.owner).or_insert(0) += 1;
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::units::UnitKind;
    use crate::map::{CastleTier, Region, Terrain};

    const ME: PlayerId = PlayerId(1);
    const ENEMY: PlayerId = PlayerId(2);

    fn state() -> GameState {
        let mut g = RegionGraph::new();
        g.add_region(
            Region::new(RegionId(1), Terrain::Plains)
                .with_owner(ME)
                .with_castle(CastleTier::Outpost)
                .with_recruit_pool(100),
        );
        g.add_region(
            Region::new(RegionId(2), Terrain::Plains)
                .with_owner(ENEMY)
                .with_population(1_000),
        );
        let mut state = GameState::new(g.with_edges(&[(1, 2)]).unwrap());
        state.add_army(Army::new(ArmyId(1), ME, RegionId(1)));
        state.add_army(
            Army::new(ArmyId(2), ENEMY, RegionId(2))
                .with_units(UnitCounts::from([(UnitKind::Spearmen, 5)])),
        );
        state
    }

    #[test]
    fn test_battle_request_includes_garrison_and_defenders() {
        let state = state();
        let request = state.battle_request(ArmyId(1), RegionId(2), 100).unwrap();
        assert_eq!(request.defender_owner, Some(ENEMY));
        assert_eq!(
            request.defender_units,
            UnitCounts::from([(UnitKind::Peasants, 10), (UnitKind::Spearmen, 5)])
        );
        assert!(state.battle_request(ArmyId(9), RegionId(2), 100).is_err());
    }

    #[test]
    fn test_destroy_defenders() {
        let mut state = state();
        assert_eq!(state.destroy_defenders(RegionId(2)), 1);
        assert!(state.army(ArmyId(2)).is_err());
    }

    #[test]
    fn test_recruit_spends_stock() {
        let mut state = state();
        state.add_economy(
            PlayerEconomy::new(ME)
                .with_stock(ResourceKind::Gold, 500)
                .with_stock(ResourceKind::Wood, 50),
        );
        let plans = state.recruit(ME);
        let plan = &plans[&ArmyId(1)];
        assert_eq!(plan.total(), 100);
        assert_eq!(state.army(ArmyId(1)).unwrap().size(), 100);
        assert_eq!(state.map.region(RegionId(1)).unwrap().recruit_pool, 0);

        let economy = state.economy(ME).unwrap();
        assert_eq!(economy.stock_of(ResourceKind::Gold), 500 - plan.spent.gold);
        assert_eq!(economy.stock_of(ResourceKind::Wood), 50 - plan.spent.wood);
    }

    #[test]
    fn test_players_and_tally() {
        let state = state();
        assert_eq!(state.players(), vec![ME, ENEMY]);
        assert!(!state.is_eliminated(ME));
        assert!(state.is_eliminated(PlayerId(3)));
        assert_eq!(state.ownership_tally().get(&Some(ME)), Some(&1));
    }
}
