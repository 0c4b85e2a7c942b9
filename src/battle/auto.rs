//! Reference auto-resolver: simultaneous rounds of probabilistic hits
//!
//! Each round every unit kind lands a binomial number of hits from its
//! attack chance. Hits are split over the enemy's unit kinds in proportion
//! to their counts, and each hit kills unless the target's defense deflects
//! it. Both sides' losses are applied after both sides have attacked.
//!
//! All draws are per unit kind, so a round costs the same for ten peasants
//! as for ten million.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Binomial, Distribution};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::debug;

use crate::battle::resolver::{BattleOutcome, BattleRequest, BattleResolver};
use crate::core::config::AutoBattleConfig;
use crate::economy::units::{total_units, UnitCounts, UnitKind};

/// What happened in one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u32,
    /// Hits landed by each side, before defense
    pub attacker_hits: u64,
    pub defender_hits: u64,
    /// Hits assigned per unit kind of the side receiving them
    pub hits_on_defender: UnitCounts,
    pub hits_on_attacker: UnitCounts,
    pub defender_losses: UnitCounts,
    pub attacker_losses: UnitCounts,
    /// Both sides after this round's losses
    pub attacker: UnitCounts,
    pub defender: UnitCounts,
}

/// Survivors of a simulated battle and its round-by-round history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleReport {
    pub attacker: UnitCounts,
    pub defender: UnitCounts,
    pub rounds: u32,
    pub history: Vec<RoundReport>,
}

impl BattleReport {
    /// Attacker wins only by wiping out the defender and surviving
    pub fn attacker_wins(&self) -> bool {
        total_units(&self.defender) == 0 && total_units(&self.attacker) > 0
    }
}

/// Peasant militia of a region nobody defends with an army
pub fn garrison(population: u32, divisor: u32) -> UnitCounts {
    let peasants = population / divisor.max(1);
    let mut units = UnitCounts::new();
    if peasants > 0 {
        units.insert(UnitKind::Peasants, peasants);
    }
    units
}

pub fn simulate_battle<R: Rng + ?Sized>(
    attacker: &UnitCounts,
    defender: &UnitCounts,
    max_rounds: u32,
    rng: &mut R,
) -> BattleReport {
    fight(attacker, defender, max_rounds, rng, || true)
}

/// Battle loop; `keep_going` is checked before every round
fn fight<R: Rng + ?Sized, F: FnMut() -> bool>(
    attacker: &UnitCounts,
    defender: &UnitCounts,
    max_rounds: u32,
    rng: &mut R,
    mut keep_going: F,
) -> BattleReport {
    let mut a = alive(attacker);
    let mut d = alive(defender);
    let mut history = Vec::new();
    let mut rounds = 0;

    while rounds < max_rounds && !a.is_empty() && !d.is_empty() && keep_going() {
        rounds += 1;
        let attacker_hits = roll_hits(&a, rng);
        let hits_on_defender = assign_hits(&d, attacker_hits, rng);
        let defender_losses = resolve_hits(&d, &hits_on_defender, rng);

        let defender_hits = roll_hits(&d, rng);
        let hits_on_attacker = assign_hits(&a, defender_hits, rng);
        let attacker_losses = resolve_hits(&a, &hits_on_attacker, rng);

        apply_losses(&mut d, &defender_losses);
        apply_losses(&mut a, &attacker_losses);

        history.push(RoundReport {
            round: rounds,
            attacker_hits,
            defender_hits,
            hits_on_defender,
            hits_on_attacker,
            defender_losses,
            attacker_losses,
            attacker: a.clone(),
            defender: d.clone(),
        });
    }

    BattleReport {
        attacker: a,
        defender: d,
        rounds,
        history,
    }
}

fn alive(units: &UnitCounts) -> UnitCounts {
    units
        .iter()
        .filter(|(_, n)| **n > 0)
        .map(|(k, n)| (*k, *n))
        .collect()
}

fn binomial<R: Rng + ?Sized>(rng: &mut R, trials: u64, p: f64) -> u64 {
    if trials == 0 || p <= 0.0 {
        return 0;
    }
    if p >= 1.0 {
        return trials;
    }
    match Binomial::new(trials, p) {
        Ok(dist) => dist.sample(rng),
        Err(_) => 0,
    }
}

fn roll_hits<R: Rng + ?Sized>(units: &UnitCounts, rng: &mut R) -> u64 {
    units
        .iter()
        .map(|(kind, count)| binomial(rng, u64::from(*count), percent(kind.stats().attack)))
        .sum()
}

/// Split `hits` over the target's kinds in proportion to their counts
///
/// Multinomial draw as a chain of conditional binomials; the last kind
/// takes whatever is left.
fn assign_hits<R: Rng + ?Sized>(target: &UnitCounts, hits: u64, rng: &mut R) -> UnitCounts {
    let mut assigned = UnitCounts::new();
    let mut left_hits = hits;
    let mut left_units: u64 = target.values().map(|n| u64::from(*n)).sum();

    for (kind, count) in target {
        if left_hits == 0 || left_units == 0 {
            break;
        }
        let count = u64::from(*count);
        let share = if count >= left_units {
            left_hits
        } else {
            binomial(rng, left_hits, count as f64 / left_units as f64)
        };
        left_units -= count;
        left_hits -= share;
        if share > 0 {
            assigned.insert(*kind, u32::try_from(share).unwrap_or(u32::MAX));
        }
    }
    assigned
}

/// Hits that get past defense, capped at the units actually there
fn resolve_hits<R: Rng + ?Sized>(
    target: &UnitCounts,
    assigned: &UnitCounts,
    rng: &mut R,
) -> UnitCounts {
    let mut losses = UnitCounts::new();
    for (kind, hits) in assigned {
        let present = target.get(kind).copied().unwrap_or(0);
        let penetrate = 1.0 - percent(kind.stats().defense);
        let kills = binomial(rng, u64::from(*hits), penetrate).min(u64::from(present));
        if kills > 0 {
            losses.insert(*kind, kills as u32);
        }
    }
    losses
}

fn apply_losses(units: &mut UnitCounts, losses: &UnitCounts) {
    for (kind, lost) in losses {
        if let Some(count) = units.get_mut(kind) {
            *count = count.saturating_sub(*lost);
        }
    }
    units.retain(|_, n| *n > 0);
}

fn percent(value: u32) -> f64 {
    (f64::from(value) / 100.0).clamp(0.0, 1.0)
}

fn outcome_of(
    request: &BattleRequest,
    max_rounds: u32,
    seed: u64,
    keep_going: impl FnMut() -> bool,
) -> BattleOutcome {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let report = fight(
        &request.attacker_units,
        &request.defender_units,
        max_rounds,
        &mut rng,
        keep_going,
    );
    let final_owner = if report.attacker_wins() {
        Some(request.attacker_owner)
    } else {
        request.defender_owner
    };
    debug!(
        "Battle at {}: {} vs {:?} after {} rounds, {} attackers left, {} defenders left",
        request.region,
        request.attacker,
        request.defender_owner,
        report.rounds,
        total_units(&report.attacker),
        total_units(&report.defender)
    );
    BattleOutcome {
        final_owner,
        attacker_units: Some(report.attacker),
    }
}

/// Resolves battles with `simulate_battle` on tokio's blocking pool
///
/// Each battle gets its own seed, drawn from the resolver's generator in
/// the order battles begin, so a replay with the same seed gives the same
/// outcomes whichever thread runs them.
#[derive(Debug, Clone)]
pub struct AutoResolver {
    rng: ChaCha8Rng,
    config: AutoBattleConfig,
}

impl AutoResolver {
    pub fn new(seed: u64, config: AutoBattleConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        }
    }

    /// Settle a battle on the calling thread
    pub fn resolve(&mut self, request: &BattleRequest) -> BattleOutcome {
        let seed = self.rng.gen();
        outcome_of(request, self.config.max_rounds, seed, || true)
    }
}

impl BattleResolver for AutoResolver {
    fn begin(&mut self, request: BattleRequest) -> oneshot::Receiver<BattleOutcome> {
        let (tx, rx) = oneshot::channel();
        let seed: u64 = self.rng.gen();
        let max_rounds = self.config.max_rounds;

        let job = move || {
            // Give up once the orchestrator has stopped waiting
            let outcome = outcome_of(&request, max_rounds, seed, || !tx.is_closed());
            let _ = tx.send(outcome);
        };
        match tokio::runtime::Handle::try_current() {
            // Detached; the result travels over the channel
            Ok(handle) => drop(handle.spawn_blocking(job)),
            Err(_) => job(),
        }
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ArmyId, PlayerId, RegionId};

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn request(attacker_units: UnitCounts, defender_units: UnitCounts) -> BattleRequest {
        BattleRequest {
            attacker: ArmyId(1),
            attacker_owner: PlayerId(1),
            region: RegionId(2),
            attacker_units,
            defender_owner: None,
            defender_units,
        }
    }

    #[test]
    fn test_overwhelming_force_wins() {
        let attacker = UnitCounts::from([(UnitKind::RoyalGuard, 200)]);
        let defender = UnitCounts::from([(UnitKind::Peasants, 20)]);
        let report = simulate_battle(&attacker, &defender, 1_000, &mut rng());
        assert!(report.attacker_wins());
        assert!(report.rounds > 0);
        assert!(total_units(&report.attacker) <= 200);
    }

    #[test]
    fn test_undefended_region_falls_without_fighting() {
        let attacker = UnitCounts::from([(UnitKind::Peasants, 1)]);
        let report = simulate_battle(&attacker, &UnitCounts::new(), 1_000, &mut rng());
        assert!(report.attacker_wins());
        assert_eq!(report.rounds, 0);
        assert!(report.history.is_empty());
    }

    #[test]
    fn test_empty_attacker_never_wins() {
        let report = simulate_battle(&UnitCounts::new(), &UnitCounts::new(), 1_000, &mut rng());
        assert!(!report.attacker_wins());
    }

    #[test]
    fn test_round_limit_is_a_draw() {
        let attacker = UnitCounts::from([(UnitKind::Peasants, 50)]);
        let defender = UnitCounts::from([(UnitKind::Peasants, 50)]);
        let report = simulate_battle(&attacker, &defender, 1, &mut rng());
        assert_eq!(report.rounds, 1);
        // 50 peasants cannot all die in one round at 5% attack
        assert!(!report.attacker_wins());
    }

    #[test]
    fn test_same_seed_same_result() {
        let attacker = UnitCounts::from([(UnitKind::Swordsmen, 30), (UnitKind::Archers, 10)]);
        let defender = UnitCounts::from([(UnitKind::Spearmen, 40)]);
        let first = simulate_battle(&attacker, &defender, 1_000, &mut rng());
        let second = simulate_battle(&attacker, &defender, 1_000, &mut rng());
        assert_eq!(first, second);
    }

    #[test]
    fn test_history_tracks_every_round() {
        let attacker = UnitCounts::from([(UnitKind::Swordsmen, 40), (UnitKind::Archers, 20)]);
        let defender = UnitCounts::from([(UnitKind::Peasants, 60), (UnitKind::Spearmen, 10)]);
        let report = simulate_battle(&attacker, &defender, 1_000, &mut rng());

        assert_eq!(report.history.len(), report.rounds as usize);
        let last = report.history.last().unwrap();
        assert_eq!(last.attacker, report.attacker);
        assert_eq!(last.defender, report.defender);

        let mut defender_left = total_units(&defender);
        for (i, round) in report.history.iter().enumerate() {
            assert_eq!(round.round, i as u32 + 1);
            let assigned: u64 = round.hits_on_defender.values().map(|n| u64::from(*n)).sum();
            assert_eq!(assigned, round.attacker_hits);
            for (kind, lost) in &round.defender_losses {
                assert!(lost <= round.hits_on_defender.get(kind).unwrap_or(&0));
            }
            defender_left -= total_units(&round.defender_losses);
            assert_eq!(total_units(&round.defender), defender_left);
        }
    }

    #[test]
    fn test_huge_armies_cost_per_kind_not_per_unit() {
        let attacker = UnitCounts::from([(UnitKind::Peasants, 3_000_000)]);
        let defender = garrison(u32::MAX, 100);
        let report = simulate_battle(&attacker, &defender, 1_000, &mut rng());
        assert!(report.rounds > 0);
        assert!(total_units(&report.attacker) < 3_000_000);
        assert!(total_units(&report.defender) < total_units(&defender));
    }

    #[test]
    fn test_fight_stops_when_told() {
        let attacker = UnitCounts::from([(UnitKind::Peasants, 500)]);
        let defender = UnitCounts::from([(UnitKind::Peasants, 500)]);
        let mut checks = 0;
        let report = fight(&attacker, &defender, 1_000, &mut rng(), || {
            checks += 1;
            checks <= 2
        });
        assert_eq!(report.rounds, 2);
    }

    #[test]
    fn test_garrison() {
        assert_eq!(garrison(2_550, 100), UnitCounts::from([(UnitKind::Peasants, 25)]));
        assert!(garrison(99, 100).is_empty());
    }

    #[tokio::test]
    async fn test_resolver_reports_new_owner() {
        let mut resolver = AutoResolver::new(7, AutoBattleConfig::default());
        let req = request(
            UnitCounts::from([(UnitKind::Knights, 100)]),
            garrison(500, 100),
        );
        let outcome = resolver.begin(req).await.unwrap();
        assert_eq!(outcome.final_owner, Some(PlayerId(1)));
        assert!(outcome.attacker_units.is_some());
    }

    #[tokio::test]
    async fn test_background_and_inline_resolution_agree() {
        let req = request(
            UnitCounts::from([(UnitKind::Swordsmen, 30), (UnitKind::Archers, 10)]),
            UnitCounts::from([(UnitKind::Spearmen, 40)]),
        );
        let inline = AutoResolver::new(9, AutoBattleConfig::default()).resolve(&req);
        let background = AutoResolver::new(9, AutoBattleConfig::default())
            .begin(req)
            .await
            .unwrap();
        assert_eq!(inline, background);
    }

    #[test]
    fn test_begin_without_runtime_answers_inline() {
        let mut resolver = AutoResolver::new(3, AutoBattleConfig::default());
        let mut rx = resolver.begin(request(
            UnitCounts::from([(UnitKind::Knights, 10)]),
            UnitCounts::new(),
        ));
        let outcome = rx.try_recv().unwrap();
        assert_eq!(outcome.final_owner, Some(PlayerId(1)));
    }
}
