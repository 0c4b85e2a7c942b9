//! Battle-resolution collaborator interface
//!
//! The orchestrator hands over a `BattleRequest` when an army enters a
//! region it does not own, then awaits the returned receiver. Only the
//! final owner of the region matters to the AI; surviving attackers are
//! reported as a courtesy.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::core::types::{ArmyId, Owner, PlayerId, RegionId};
use crate::economy::units::UnitCounts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRequest {
    pub attacker: ArmyId,
    pub attacker_owner: PlayerId,
    pub region: RegionId,
    pub attacker_units: UnitCounts,
    pub defender_owner: Owner,
    pub defender_units: UnitCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// Owner of the region once the battle is over
    pub final_owner: Owner,
    /// Surviving attackers, when the resolver tracks them
    pub attacker_units: Option<UnitCounts>,
}

impl BattleOutcome {
    /// Outcome that leaves the region with its current owner
    pub fn unchanged(request: &BattleRequest) -> Self {
        Self {
            final_owner: request.defender_owner,
            attacker_units: None,
        }
    }

    pub fn attacker_won(&self, request: &BattleRequest) -> bool {
        self.final_owner == Some(request.attacker_owner)
            && request.defender_owner != Some(request.attacker_owner)
    }
}

/// External battle resolution
///
/// `begin` must not block. The outcome arrives on the returned receiver;
/// dropping the sender counts as "no ownership change".
pub trait BattleResolver {
    fn begin(&mut self, request: BattleRequest) -> oneshot::Receiver<BattleOutcome>;
}

/// Resolver that never changes ownership; used when battles are disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct DefenderAlwaysHolds;

impl BattleResolver for DefenderAlwaysHolds {
    fn begin(&mut self, request: BattleRequest) -> oneshot::Receiver<BattleOutcome> {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(BattleOutcome::unchanged(&request));
        rx
    }
}
