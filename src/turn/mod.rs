//! Turn processing: armies, game state, and the per-player orchestrator

pub mod army;
pub mod orchestrator;
pub mod state;

pub use army::Army;
pub use orchestrator::{
    army_jitter, army_seed, final_score, run_round, MoveChoice, MoveRecord, TurnEndReason,
    TurnOrchestrator, TurnPhase, TurnReport,
};
pub use state::GameState;
