//! Conquest Sim - runs AI players against each other on a scenario
//!
//! Each round every surviving player collects income, recruits at its
//! castles, and plays a turn. Battles are settled by the auto-resolver.

use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use conquest_ai::battle::AutoResolver;
use conquest_ai::core::error::Result;
use conquest_ai::core::types::{PlayerId, RegionId};
use conquest_ai::core::AiConfig;
use conquest_ai::economy::estimate_needs;
use conquest_ai::pathfinding::corridor_centrality;
use conquest_ai::scenario::load_state;
use conquest_ai::turn::{GameState, TurnOrchestrator};

/// Conquest Sim - AI players compete for regions
#[derive(Parser, Debug)]
#[command(name = "conquest-sim")]
#[command(about = "Run AI players against each other on a JSON scenario")]
struct Args {
    /// Scenario file (JSON)
    #[arg(long)]
    scenario: PathBuf,

    /// AI configuration (TOML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rounds to play
    #[arg(long, default_value_t = 10)]
    rounds: u32,

    /// Seed for battle resolution
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Log every decision
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "conquest_ai=debug,conquest_sim=debug"
    } else {
        "conquest_ai=info,conquest_sim=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match &args.config {
        Some(path) => AiConfig::load(path)?,
        None => AiConfig::default(),
    };
    let mut state = load_state(&args.scenario)?;
    info!(
        "Loaded {} regions, {} armies from {}",
        state.map.len(),
        state.armies.len(),
        args.scenario.display()
    );

    let mut resolver = AutoResolver::new(args.seed, config.battle.clone());
    let mut orchestrator = TurnOrchestrator::new(config.clone());

    for round in 1..=args.rounds {
        let players: Vec<PlayerId> = state
            .players()
            .into_iter()
            .filter(|p| !state.is_eliminated(*p))
            .collect();
        if players.len() < 2 {
            info!("Round {}: {} player(s) left, stopping", round, players.len());
            break;
        }

        info!("=== Round {} ===", round);
        for &player in &players {
            collect_income(&mut state, player, &config);
            let plans = state.recruit(player);
            let recruited: u32 = plans.values().map(|p| p.total()).sum();
            if recruited > 0 {
                info!("{} recruits {} units in {} armies", player, recruited, plans.len());
            }
        }

        let reports = orchestrator
            .run_round(&mut state, &players, &mut resolver)
            .await;
        for report in &reports {
            println!(
                "Round {:>3} {}: {} moves, took {:?}, {} battles ({} timed out), ended {:?}",
                round,
                report.player,
                report.moves.len(),
                report.conquered,
                report.battles,
                report.timeouts,
                report.end_reason
            );
        }
    }

    report_corridors(&state, &config);

    println!("\nFinal ownership:");
    for (owner, count) in state.ownership_tally() {
        match owner {
            Some(player) => println!("  {}: {} regions", player, count),
            None => println!("  neutral: {} regions", count),
        }
    }
    Ok(())
}

/// Add one turn of net income to the player's stock
fn collect_income(state: &mut GameState, player: PlayerId, config: &AiConfig) {
    let Ok(economy) = state.economy(player) else {
        return;
    };
    let needs = estimate_needs(&state.map, state.armies.values(), economy, &config.needs);
    for (kind, need) in &needs.needs {
        debug!(
            "{} {:?}: net {:+}, coverage {:.1}, multiplier {:.2}",
            player, kind, need.net, need.coverage, need.multiplier
        );
    }

    if let Some(economy) = state.economies.get_mut(&player) {
        for (kind, need) in needs.needs {
            let stock = economy.stock.entry(kind).or_insert(0);
            let updated = i64::from(*stock) + need.net;
            *stock = u32::try_from(updated.max(0)).unwrap_or(u32::MAX);
        }
    }
}

/// Log the regions that sit on the most shortest paths between castles
fn report_corridors(state: &GameState, config: &AiConfig) {
    let castles: BTreeSet<RegionId> = state
        .map
        .regions()
        .filter(|r| r.is_castle())
        .map(|r| r.id)
        .collect();
    if castles.len() < 2 {
        return;
    }

    let centrality = corridor_centrality(&state.map, &castles, None, &config.centrality);
    let mut ranked: Vec<(RegionId, f64)> = centrality.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    for (region, value) in ranked.into_iter().take(5) {
        info!("Corridor {}: {:.2}", region, value);
    }
}
