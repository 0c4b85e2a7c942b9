//! Turn orchestration integration tests

use conquest_ai::battle::{AutoResolver, BattleOutcome, BattleRequest, BattleResolver};
use conquest_ai::core::types::{ArmyId, PlayerId, RegionId};
use conquest_ai::core::AiConfig;
use conquest_ai::economy::UnitKind;
use conquest_ai::map::{Region, RegionGraph, RegionMap, Terrain};
use conquest_ai::scenario::load_state;
use conquest_ai::turn::*;
use std::path::PathBuf;
use tokio::sync::oneshot;

const ME: PlayerId = PlayerId(1);
const RIVAL: PlayerId = PlayerId(2);

/// Always hands the region to the attacker
#[derive(Default)]
struct AttackerWins {
    requests: Vec<BattleRequest>,
}

impl BattleResolver for AttackerWins {
    fn begin(&mut self, request: BattleRequest) -> oneshot::Receiver<BattleOutcome> {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(BattleOutcome {
            final_owner: Some(request.attacker_owner),
            attacker_units: None,
        });
        self.requests.push(request);
        rx
    }
}

/// Holds on to every sender and never answers
#[derive(Default)]
struct NeverAnswers {
    pending: Vec<oneshot::Sender<BattleOutcome>>,
}

impl BattleResolver for NeverAnswers {
    fn begin(&mut self, _request: BattleRequest) -> oneshot::Receiver<BattleOutcome> {
        let (tx, rx) = oneshot::channel();
        self.pending.push(tx);
        rx
    }
}

/// Reports that some third player ended up holding the region
struct ThirdPartyWins(PlayerId);

impl BattleResolver for ThirdPartyWins {
    fn begin(&mut self, _request: BattleRequest) -> oneshot::Receiver<BattleOutcome> {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(BattleOutcome {
            final_owner: Some(self.0),
            attacker_units: None,
        });
        rx
    }
}

fn line_state(owned: &[u32], len: u32) -> GameState {
    let mut graph = RegionGraph::new();
    for id in 1..=len {
        let region = Region::new(RegionId(id), Terrain::Plains);
        graph.add_region(if owned.contains(&id) {
            region.with_owner(ME)
        } else {
            region
        });
    }
    for id in 1..len {
        graph.connect(RegionId(id), RegionId(id + 1)).unwrap();
    }
    GameState::new(graph)
}

fn scenario_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/scenarios/two_kingdoms.json")
}

#[tokio::test]
async fn test_single_army_conquers_along_line() {
    let mut state = line_state(&[1], 4);
    state.add_army(Army::new(ArmyId(1), ME, RegionId(1)).with_movement(3));

    let mut resolver = AttackerWins::default();
    let mut orchestrator = TurnOrchestrator::new(AiConfig::default());
    let report = orchestrator.run_turn(&mut state, ME, &mut resolver).await;

    assert_eq!(report.conquered, vec![RegionId(2), RegionId(3), RegionId(4)]);
    assert_eq!(report.battles, 3);
    assert_eq!(report.end_reason, TurnEndReason::NoCandidates);
    assert_eq!(report.moves.len(), 3);

    let targets: Vec<RegionId> = resolver.requests.iter().map(|r| r.region).collect();
    assert_eq!(targets, vec![RegionId(2), RegionId(3), RegionId(4)]);
    assert!(resolver.requests.iter().all(|r| r.defender_owner.is_none()));

    let army = state.army(ArmyId(1)).unwrap();
    assert_eq!(army.region, RegionId(4));
    assert_eq!(army.movement_points, 0);
    assert!((1..=4).all(|id| state.map.owner(RegionId(id)) == Some(ME)));

    // Rescoring happens after each conquest
    let rescored = report
        .transitions
        .iter()
        .filter(|p| **p == TurnPhase::ScoringFrontier)
        .count();
    assert_eq!(rescored, 4);
    assert_eq!(report.transitions.last(), Some(&TurnPhase::Idle));
}

#[tokio::test]
async fn test_movement_runs_out_before_target() {
    // Own 1 and 2; the only target is 3, two steps away with one movement point
    let mut state = line_state(&[1, 2], 4);
    state.add_army(Army::new(ArmyId(1), ME, RegionId(1)).with_movement(1));

    let mut resolver = AttackerWins::default();
    let mut orchestrator = TurnOrchestrator::new(AiConfig::default());
    let report = orchestrator.run_turn(&mut state, ME, &mut resolver).await;

    assert_eq!(report.battles, 0);
    assert!(report.conquered.is_empty());
    assert_eq!(report.end_reason, TurnEndReason::NoReachableMoves);
    assert_eq!(report.moves[0].target, RegionId(3));
    assert_eq!(report.moves[0].walked, vec![RegionId(1), RegionId(2)]);
    assert_eq!(state.army(ArmyId(1)).unwrap().region, RegionId(2));
    assert_eq!(state.map.owner(RegionId(3)), None);
}

#[tokio::test(start_paused = true)]
async fn test_battle_timeout_leaves_ownership_unchanged() {
    let mut state = line_state(&[1], 3);
    state.add_army(Army::new(ArmyId(1), ME, RegionId(1)));

    let mut resolver = NeverAnswers::default();
    let mut orchestrator = TurnOrchestrator::new(AiConfig::default());
    let report = orchestrator.run_turn(&mut state, ME, &mut resolver).await;

    assert_eq!(report.battles, 1);
    assert_eq!(report.timeouts, 1);
    assert!(report.conquered.is_empty());
    assert_eq!(report.end_reason, TurnEndReason::NoReachableMoves);
    assert_eq!(state.map.owner(RegionId(2)), None);

    let army = state.army(ArmyId(1)).unwrap();
    assert_eq!(army.region, RegionId(1));
    assert_eq!(army.movement_points, 0);
    assert_eq!(resolver.pending.len(), 1);
}

#[tokio::test]
async fn test_closer_army_moves_first() {
    let mut state = line_state(&[1, 2], 3);
    state.add_army(Army::new(ArmyId(1), ME, RegionId(1)));
    state.add_army(Army::new(ArmyId(2), ME, RegionId(2)));

    let mut config = AiConfig::default();
    config.turn.random_jitter = 0.0;
    let mut resolver = AttackerWins::default();
    let mut orchestrator = TurnOrchestrator::new(config);
    let report = orchestrator.run_turn(&mut state, ME, &mut resolver).await;

    assert_eq!(report.moves.len(), 1);
    assert_eq!(report.moves[0].army, ArmyId(2));
    assert_eq!(report.moves[0].walked, vec![RegionId(2), RegionId(3)]);
    assert_eq!(report.conquered, vec![RegionId(3)]);
    assert_eq!(report.end_reason, TurnEndReason::NoCandidates);
    assert_eq!(resolver.requests[0].attacker, ArmyId(2));
    assert_eq!(state.army(ArmyId(1)).unwrap().region, RegionId(1));
}

#[tokio::test]
async fn test_third_party_owner_is_recorded_and_attacker_halts() {
    let third = PlayerId(3);
    let mut state = line_state(&[1], 3);
    state.add_army(Army::new(ArmyId(1), ME, RegionId(1)));

    let mut orchestrator = TurnOrchestrator::new(AiConfig::default());
    let report = orchestrator
        .run_turn(&mut state, ME, &mut ThirdPartyWins(third))
        .await;

    assert_eq!(report.battles, 1);
    assert!(report.conquered.is_empty());
    assert_eq!(report.moves[0].walked, vec![RegionId(1)]);
    assert_eq!(report.moves[0].conquered, None);
    assert_eq!(report.end_reason, TurnEndReason::NoReachableMoves);
    assert_eq!(state.map.owner(RegionId(2)), Some(third));

    let army = state.army(ArmyId(1)).unwrap();
    assert_eq!(army.region, RegionId(1));
    assert_eq!(army.movement_points, 0);
}

#[tokio::test]
async fn test_eliminated_player_ends_immediately() {
    let mut state = line_state(&[], 3);
    state.add_army(Army::new(ArmyId(1), ME, RegionId(1)));

    let mut orchestrator = TurnOrchestrator::new(AiConfig::default());
    let report = orchestrator
        .run_turn(&mut state, ME, &mut AttackerWins::default())
        .await;

    assert_eq!(report.end_reason, TurnEndReason::PlayerEliminated);
    assert_eq!(
        report.transitions,
        vec![TurnPhase::ScoringFrontier, TurnPhase::Idle]
    );
    assert!(report.moves.is_empty());
}

#[tokio::test]
async fn test_round_applies_conquests_before_next_player() {
    let mut graph = RegionGraph::new();
    graph.add_region(Region::new(RegionId(1), Terrain::Plains).with_owner(ME));
    graph.add_region(Region::new(RegionId(2), Terrain::Plains).with_owner(RIVAL));
    let mut state = GameState::new(graph.with_edges(&[(1, 2)]).unwrap());
    state.add_army(
        Army::new(ArmyId(1), ME, RegionId(1)).with_units([(UnitKind::Spearmen, 10)].into()),
    );
    state.add_army(
        Army::new(ArmyId(2), RIVAL, RegionId(2)).with_units([(UnitKind::Peasants, 5)].into()),
    );

    let mut resolver = AttackerWins::default();
    let reports = run_round(&mut state, &[ME, RIVAL], &mut resolver, &AiConfig::default()).await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].conquered, vec![RegionId(2)]);
    assert_eq!(reports[1].player, RIVAL);
    assert_eq!(reports[1].end_reason, TurnEndReason::PlayerEliminated);

    // The rival's army was defending the region and fell with it
    assert_eq!(resolver.requests[0].defender_owner, Some(RIVAL));
    assert_eq!(
        resolver.requests[0].defender_units.get(&UnitKind::Peasants),
        Some(&5)
    );
    assert!(state.army(ArmyId(2)).is_err());
    assert!(state.is_eliminated(RIVAL));
}

async fn play_scenario(rounds: u32, seed: u64) -> (Vec<TurnReport>, GameState) {
    let config = AiConfig::default();
    let mut state = load_state(&scenario_path()).unwrap();
    let mut resolver = AutoResolver::new(seed, config.battle.clone());
    let mut orchestrator = TurnOrchestrator::new(config);
    let mut all = Vec::new();

    for _ in 0..rounds {
        let players: Vec<PlayerId> = state
            .players()
            .into_iter()
            .filter(|p| !state.is_eliminated(*p))
            .collect();
        for &player in &players {
            state.recruit(player);
        }
        all.extend(orchestrator.run_round(&mut state, &players, &mut resolver).await);
    }
    (all, state)
}

#[tokio::test]
async fn test_scenario_play_is_deterministic() {
    let (first, first_state) = play_scenario(4, 11).await;
    let (second, second_state) = play_scenario(4, 11).await;

    assert_eq!(first, second);
    assert_eq!(first_state.ownership_tally(), second_state.ownership_tally());
    assert_eq!(first_state.armies, second_state.armies);

    let total: usize = first_state.ownership_tally().values().sum();
    assert_eq!(total, 12);
    assert!(first.iter().any(|r| !r.moves.is_empty()));
}

#[test]
fn test_default_config_file_matches_defaults() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/ai/default.toml");
    let loaded = AiConfig::load(&path).unwrap();
    let defaults = AiConfig::default();

    assert_eq!(loaded.turn.seed_salt, defaults.turn.seed_salt);
    assert_eq!(loaded.turn.battle_timeout_ms, defaults.turn.battle_timeout_ms);
    assert_eq!(loaded.turn.max_moves_per_turn, defaults.turn.max_moves_per_turn);
    assert_eq!(loaded.turn.random_jitter, defaults.turn.random_jitter);
    assert_eq!(loaded.battle.max_rounds, defaults.battle.max_rounds);
    assert_eq!(loaded.battle.garrison_divisor, defaults.battle.garrison_divisor);
    assert_eq!(loaded.needs.stock_floors, defaults.needs.stock_floors);
}
