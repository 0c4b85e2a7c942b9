pub mod config;
pub mod error;
pub mod types;

pub use config::AiConfig;
pub use error::{ConquestError, Result};
pub use types::{is_hostile, ArmyId, Owner, PlayerId, RegionId, ResourceKind};
