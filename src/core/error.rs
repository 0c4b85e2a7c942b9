use thiserror::Error;

use crate::core::types::{ArmyId, PlayerId, RegionId};

#[derive(Error, Debug)]
pub enum ConquestError {
    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    #[error("Army not found: {0}")]
    ArmyNotFound(ArmyId),

    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConquestError>;
