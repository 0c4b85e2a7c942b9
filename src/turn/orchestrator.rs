//! Turn orchestrator: one AI player's turn as an explicit state machine
//!
//! ```text
//! Idle -> ScoringFrontier -> SelectingBestMove -> ExecutingMove
//!              ^                    ^                  |
//!              |                    +-- no conquest ---+
//!              +------- conquest ---- AwaitingBattleOutcome
//! ```
//!
//! Exactly one army moves at a time and targets are only re-scored between
//! moves. The only suspension point is the wait for a battle outcome, which
//! is bounded by `turn.battle_timeout_ms`.

use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::battle::resolver::{BattleOutcome, BattleResolver};
use crate::core::config::{AiConfig, TurnConfig};
use crate::core::types::{ArmyId, PlayerId, RegionId};
use crate::map::RegionMap;
use crate::pathfinding::{find_path, trim_path_to_budget};
use crate::scoring::{ScoreCache, ScoredCandidate};
use crate::turn::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    Idle,
    ScoringFrontier,
    SelectingBestMove,
    ExecutingMove,
    AwaitingBattleOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEndReason {
    /// The frontier had nothing left to take
    NoCandidates,
    /// No army could reach any remaining target
    NoReachableMoves,
    /// The player owned no regions when the frontier was scored
    PlayerEliminated,
    /// `turn.max_moves_per_turn` reached
    MoveLimit,
}

/// One executed move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub army: ArmyId,
    pub target: RegionId,
    pub final_score: f64,
    /// Path actually walked, starting at the army's origin
    pub walked: Vec<RegionId>,
    /// Region conquered on the way, if any
    pub conquered: Option<RegionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub player: PlayerId,
    pub transitions: Vec<TurnPhase>,
    pub moves: Vec<MoveRecord>,
    pub conquered: Vec<RegionId>,
    pub battles: u32,
    pub timeouts: u32,
    /// Invalid army or region references passed over
    pub skipped: u32,
    pub end_reason: TurnEndReason,
}

impl TurnReport {
    fn new(player: PlayerId) -> Self {
        Self {
            player,
            transitions: Vec::new(),
            moves: Vec::new(),
            conquered: Vec::new(),
            battles: 0,
            timeouts: 0,
            skipped: 0,
            end_reason: TurnEndReason::NoCandidates,
        }
    }
}

/// Best (army, target) pair found by `SelectingBestMove`
#[derive(Debug, Clone, PartialEq)]
pub struct MoveChoice {
    pub army: ArmyId,
    pub target: RegionId,
    pub path: Vec<RegionId>,
    pub path_cost: u32,
    pub final_score: f64,
}

/// Seed of an army's random term, stable across calls
pub fn army_seed(army: ArmyId, player: PlayerId, salt: u64) -> u64 {
    // splitmix64 finalizer
    let mut z = salt ^ ((u64::from(army.0) << 32) | u64::from(player.0));
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Random term in `[0, random_jitter)` for one army
pub fn army_jitter(army: ArmyId, player: PlayerId, config: &TurnConfig) -> f64 {
    if config.random_jitter <= 0.0 {
        return 0.0;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(army_seed(army, player, config.seed_salt));
    rng.gen_range(0.0..config.random_jitter)
}

/// `base * 100 + jitter - path cost`
pub fn final_score(base: f64, jitter: f64, path_cost: u32) -> f64 {
    base * 100.0 + jitter - f64::from(path_cost)
}

/// Per-turn bookkeeping
#[derive(Debug, Default)]
struct TurnScratch {
    moved: BTreeSet<ArmyId>,
    conquered: BTreeSet<RegionId>,
    jitter: BTreeMap<ArmyId, f64>,
}

pub struct TurnOrchestrator {
    config: AiConfig,
    cache: ScoreCache,
    phase: TurnPhase,
}

impl TurnOrchestrator {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            cache: ScoreCache::new(),
            phase: TurnPhase::Idle,
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    fn enter(&mut self, phase: TurnPhase, report: &mut TurnReport) {
        debug!("{}: {:?} -> {:?}", report.player, self.phase, phase);
        self.phase = phase;
        report.transitions.push(phase);
    }

    fn finish(&mut self, reason: TurnEndReason, mut report: TurnReport) -> TurnReport {
        report.end_reason = reason;
        self.enter(TurnPhase::Idle, &mut report);
        info!(
            "{} ends turn ({:?}): {} moves, {} conquests, {} battles",
            report.player,
            reason,
            report.moves.len(),
            report.conquered.len(),
            report.battles
        );
        report
    }

    /// Play `player`'s turn to completion
    ///
    /// Movement points are used as found; call `GameState::reset_movement`
    /// (or use `run_round`) to start a fresh turn.
    pub async fn run_turn<R: BattleResolver + ?Sized>(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        resolver: &mut R,
    ) -> TurnReport {
        let mut report = TurnReport::new(player);
        let mut scratch = TurnScratch::default();
        let mut candidates: Vec<ScoredCandidate> = Vec::new();
        let mut executed = 0u32;

        info!("{} starts turn", player);
        self.enter(TurnPhase::ScoringFrontier, &mut report);

        loop {
            match self.phase {
                TurnPhase::ScoringFrontier => {
                    if state.is_eliminated(player) {
                        return self.finish(TurnEndReason::PlayerEliminated, report);
                    }
                    self.cache.prune(state.map.ownership_version());
                    candidates = self
                        .cache
                        .frontier(&state.map, player, &self.config)
                        .into_iter()
                        .filter(|c| !scratch.conquered.contains(&c.region))
                        .collect();
                    debug!("{} has {} frontier candidates", player, candidates.len());
                    if candidates.is_empty() {
                        return self.finish(TurnEndReason::NoCandidates, report);
                    }
                    self.enter(TurnPhase::SelectingBestMove, &mut report);
                }
                TurnPhase::SelectingBestMove => {
                    if executed >= self.config.turn.max_moves_per_turn {
                        return self.finish(TurnEndReason::MoveLimit, report);
                    }
                    let Some(choice) =
                        self.select_best_move(state, player, &candidates, &mut scratch, &mut report)
                    else {
                        return self.finish(TurnEndReason::NoReachableMoves, report);
                    };
                    self.enter(TurnPhase::ExecutingMove, &mut report);

                    let conquered = self
                        .execute_move(state, player, choice, resolver, &mut scratch, &mut report)
                        .await;
                    executed += 1;

                    let next = if conquered {
                        TurnPhase::ScoringFrontier
                    } else {
                        TurnPhase::SelectingBestMove
                    };
                    self.enter(next, &mut report);
                }
                // Entered only from within `execute_move`
                TurnPhase::Idle | TurnPhase::ExecutingMove | TurnPhase::AwaitingBattleOutcome => {
                    return self.finish(TurnEndReason::NoReachableMoves, report);
                }
            }
        }
    }

    /// Highest `final_score` over every movable army and every remaining candidate
    ///
    /// Ties go to the lower army id, then the lower region id.
    fn select_best_move(
        &self,
        state: &GameState,
        player: PlayerId,
        candidates: &[ScoredCandidate],
        scratch: &mut TurnScratch,
        report: &mut TurnReport,
    ) -> Option<MoveChoice> {
        let mut best: Option<MoveChoice> = None;

        let movable: Vec<(ArmyId, RegionId)> = state
            .armies_of(player)
            .filter(|a| !scratch.moved.contains(&a.id) && a.can_move())
            .map(|a| (a.id, a.region))
            .collect();

        for (army, origin) in movable {
            if state.map.region(origin).is_none() {
                warn!("{} is in unknown region {}, skipping", army, origin);
                report.skipped += 1;
                scratch.moved.insert(army);
                continue;
            }
            let jitter = *scratch
                .jitter
                .entry(army)
                .or_insert_with(|| army_jitter(army, player, &self.config.turn));

            let mut targets: Vec<&ScoredCandidate> = candidates.iter().collect();
            targets.sort_by_key(|c| c.region);
            for candidate in targets {
                if scratch.conquered.contains(&candidate.region) {
                    continue;
                }
                let path = find_path(&state.map, origin, candidate.region, player);
                if !path.reachable || path.path.len() < 2 {
                    continue;
                }
                let score = final_score(candidate.value, jitter, path.cost);
                let better = best
                    .as_ref()
                    .map_or(true, |b| OrderedFloat(score) > OrderedFloat(b.final_score));
                if better {
                    best = Some(MoveChoice {
                        army,
                        target: candidate.region,
                        path: path.path,
                        path_cost: path.cost,
                        final_score: score,
                    });
                }
            }
        }

        if let Some(choice) = &best {
            debug!(
                "{} picks {} -> {} (score {:.2}, cost {})",
                player, choice.army, choice.target, choice.final_score, choice.path_cost
            );
        }
        best
    }

    /// Walk the chosen path within the army's movement points
    ///
    /// Returns true if a region changed hands to `player`.
    async fn execute_move<R: BattleResolver + ?Sized>(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        choice: MoveChoice,
        resolver: &mut R,
        scratch: &mut TurnScratch,
        report: &mut TurnReport,
    ) -> bool {
        let Some(movement) = state.armies.get(&choice.army).map(|a| a.movement_points) else {
            warn!("{} vanished before moving, skipping", choice.army);
            report.skipped += 1;
            scratch.moved.insert(choice.army);
            return false;
        };

        let trimmed = trim_path_to_budget(&state.map, &choice.path, player, movement);
        let mut walked = trimmed.first().map(|o| vec![*o]).unwrap_or_default();
        let mut conquered = None;

        for &step in trimmed.iter().skip(1) {
            let Some(cost) = state.map.entering_cost(step, player) else {
                break;
            };
            let Some(army) = state.armies.get_mut(&choice.army) else {
                break;
            };
            if !army.spend_movement(cost) {
                break;
            }

            if state.map.owner(step) == Some(player) {
                army.region = step;
                walked.push(step);
                continue;
            }

            // Neutral or hostile: the battle decides whether we get in
            let outcome = self.fight(state, player, choice.army, step, resolver, report).await;
            match outcome {
                Some(outcome) if outcome.final_owner == Some(player) => {
                    let fallen = state.destroy_defenders(step);
                    if let Err(e) = state.map.set_owner(step, Some(player)) {
                        warn!("Could not take {}: {}", step, e);
                        report.skipped += 1;
                    } else {
                        if let Some(army) = state.armies.get_mut(&choice.army) {
                            army.region = step;
                        }
                        if let Some(survivors) = outcome.attacker_units {
                            state.apply_survivors(choice.army, survivors);
                        }
                        info!(
                            "{} takes {} with {} ({} defending armies destroyed)",
                            player, step, choice.army, fallen
                        );
                        walked.push(step);
                        scratch.conquered.insert(step);
                        report.conquered.push(step);
                        conquered = Some(step);
                    }
                }
                Some(outcome) => {
                    if outcome.final_owner != state.map.owner(step) {
                        if let Err(e) = state.map.set_owner(step, outcome.final_owner) {
                            warn!("Could not record owner of {}: {}", step, e);
                        }
                    }
                    if let Some(survivors) = outcome.attacker_units {
                        state.apply_survivors(choice.army, survivors);
                    }
                    self.halt(state, choice.army);
                }
                None => self.halt(state, choice.army),
            }
            break;
        }

        if conquered.is_none() {
            scratch.moved.insert(choice.army);
        }
        report.moves.push(MoveRecord {
            army: choice.army,
            target: choice.target,
            final_score: choice.final_score,
            walked,
            conquered,
        });
        conquered.is_some()
    }

    /// Hand the battle to the resolver and wait, at most `battle_timeout_ms`
    async fn fight<R: BattleResolver + ?Sized>(
        &mut self,
        state: &GameState,
        player: PlayerId,
        army: ArmyId,
        region: RegionId,
        resolver: &mut R,
        report: &mut TurnReport,
    ) -> Option<BattleOutcome> {
        let request = match state.battle_request(army, region, self.config.battle.garrison_divisor) {
            Ok(request) => request,
            Err(e) => {
                warn!("{} cannot attack {}: {}", army, region, e);
                report.skipped += 1;
                return None;
            }
        };

        self.enter(TurnPhase::AwaitingBattleOutcome, report);
        report.battles += 1;
        debug!("{} ({}) attacks {} held by {:?}", army, player, region, request.defender_owner);

        let limit = Duration::from_millis(self.config.turn.battle_timeout_ms);
        let receiver = resolver.begin(request);
        match tokio::time::timeout(limit, receiver).await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(_)) => {
                warn!("Battle at {} abandoned by resolver; no ownership change", region);
                None
            }
            Err(_) => {
                warn!("Battle at {} timed out after {:?}; no ownership change", region, limit);
                report.timeouts += 1;
                None
            }
        }
    }

    /// Movement for the turn ends
    fn halt(&self, state: &mut GameState, army: ArmyId) {
        if let Some(a) = state.armies.get_mut(&army) {
            a.movement_points = 0;
        }
    }

    /// Every player's turn in order
    ///
    /// Each player's armies get fresh movement first; one player's
    /// conquests are applied before the next player scores anything.
    pub async fn run_round<R: BattleResolver + ?Sized>(
        &mut self,
        state: &mut GameState,
        players: &[PlayerId],
        resolver: &mut R,
    ) -> Vec<TurnReport> {
        let mut reports = Vec::with_capacity(players.len());
        for &player in players {
            state.reset_movement(player);
            reports.push(self.run_turn(state, player, resolver).await);
        }
        reports
    }
}

/// `run_round` with a fresh orchestrator
pub async fn run_round<R: BattleResolver + ?Sized>(
    state: &mut GameState,
    players: &[PlayerId],
    resolver: &mut R,
    config: &AiConfig,
) -> Vec<TurnReport> {
    TurnOrchestrator::new(config.clone())
        .run_round(state, players, resolver)
        .await
}
