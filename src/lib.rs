//! Conquest AI - strategic decision engine for a territory-conquest game
//!
//! Evaluates regions, picks conquest targets, paths armies under movement
//! budgets, and splits shared resources among recruiting armies.

pub mod battle;
pub mod core;
pub mod economy;
pub mod map;
pub mod pathfinding;
pub mod scenario;
pub mod scoring;
pub mod turn;
