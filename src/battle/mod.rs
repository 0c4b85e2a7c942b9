//! Battle resolution as seen by the strategic AI
//!
//! The AI only starts battles and reads their outcome. `AutoResolver` is a
//! self-contained reference implementation of the collaborator.

pub mod auto;
pub mod resolver;

pub use auto::{garrison, simulate_battle, AutoResolver, BattleReport, RoundReport};
pub use resolver::{BattleOutcome, BattleRequest, BattleResolver, DefenderAlwaysHolds};
