//! AI configuration with documented defaults
//!
//! Scoring weights and thresholds are configuration data. Every section
//! deserializes with `#[serde(default)]`, so a TOML file only needs to
//! name the values it overrides.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::core::error::{ConquestError, Result};
use crate::core::types::ResourceKind;

const WEIGHT_EPSILON: f64 = 1e-6;

/// Inclusive value range used for linear min-max normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Expected ranges for every normalized input of a scoring mode
///
/// There is no single default: a partial table in TOML is merged over
/// `cluster()` or `individual()` depending on the field it fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRanges {
    pub population: ValueRange,
    pub level: ValueRange,
    pub size: ValueRange,
    pub resources: BTreeMap<ResourceKind, ValueRange>,
}

impl ScoreRanges {
    /// Ranges for a candidate plus its unclaimed neighbors
    pub fn cluster() -> Self {
        Self {
            population: ValueRange::new(0.0, 30_000.0),
            level: ValueRange::new(1.0, 5.0),
            size: ValueRange::new(1.0, 7.0),
            resources: BTreeMap::from([
                (ResourceKind::Gold, ValueRange::new(0.0, 60.0)),
                (ResourceKind::Food, ValueRange::new(0.0, 90.0)),
                (ResourceKind::Wood, ValueRange::new(0.0, 60.0)),
                (ResourceKind::Iron, ValueRange::new(0.0, 30.0)),
            ]),
        }
    }

    /// Ranges for a single region
    pub fn individual() -> Self {
        Self {
            population: ValueRange::new(0.0, 6_000.0),
            level: ValueRange::new(1.0, 5.0),
            size: ValueRange::new(1.0, 1.0),
            resources: BTreeMap::from([
                (ResourceKind::Gold, ValueRange::new(0.0, 12.0)),
                (ResourceKind::Food, ValueRange::new(0.0, 18.0)),
                (ResourceKind::Wood, ValueRange::new(0.0, 12.0)),
                (ResourceKind::Iron, ValueRange::new(0.0, 6.0)),
            ]),
        }
    }

    pub fn resource(&self, kind: ResourceKind) -> ValueRange {
        self.resources
            .get(&kind)
            .copied()
            .unwrap_or(ValueRange::new(0.0, 0.0))
    }

    fn validate(&self, label: &str) -> Result<()> {
        for (name, range) in [("population", self.population), ("level", self.level)] {
            if range.max <= range.min {
                return Err(ConquestError::InvalidConfig(format!(
                    "{label}.{name}: max ({}) must exceed min ({})",
                    range.max, range.min
                )));
            }
        }
        // A degenerate size range is allowed: single regions always have size 1.
        if self.size.max < self.size.min {
            return Err(ConquestError::InvalidConfig(format!(
                "{label}.size: max ({}) is below min ({})",
                self.size.max, self.size.min
            )));
        }
        for (kind, range) in &self.resources {
            if range.max <= range.min {
                return Err(ConquestError::InvalidConfig(format!(
                    "{label}.resources.{kind:?}: max ({}) must exceed min ({})",
                    range.max, range.min
                )));
            }
        }
        Ok(())
    }
}

/// A ranges table as written; absent entries keep the mode's defaults
#[derive(Deserialize)]
struct PartialRanges {
    population: Option<ValueRange>,
    level: Option<ValueRange>,
    size: Option<ValueRange>,
    #[serde(default)]
    resources: BTreeMap<ResourceKind, ValueRange>,
}

impl PartialRanges {
    fn over(self, mut base: ScoreRanges) -> ScoreRanges {
        if let Some(range) = self.population {
            base.population = range;
        }
        if let Some(range) = self.level {
            base.level = range;
        }
        if let Some(range) = self.size {
            base.size = range;
        }
        base.resources.extend(self.resources);
        base
    }
}

fn cluster_ranges<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<ScoreRanges, D::Error> {
    Ok(PartialRanges::deserialize(deserializer)?.over(ScoreRanges::cluster()))
}

fn individual_ranges<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<ScoreRanges, D::Error> {
    Ok(PartialRanges::deserialize(deserializer)?.over(ScoreRanges::individual()))
}

/// How per-resource normalizations combine into the resource sub-score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceScoreConfig {
    /// Weighted mean over these kinds forms the primary term
    pub primary_weights: BTreeMap<ResourceKind, f64>,
    /// High-value kind scored as a separate bonus term
    pub bonus_kind: ResourceKind,
    pub primary_share: f64,
    pub bonus_share: f64,
}

impl Default for ResourceScoreConfig {
    fn default() -> Self {
        Self {
            primary_weights: BTreeMap::from([
                (ResourceKind::Food, 0.4),
                (ResourceKind::Wood, 0.3),
                (ResourceKind::Gold, 0.3),
            ]),
            bonus_kind: ResourceKind::Iron,
            primary_share: 0.8,
            bonus_share: 0.2,
        }
    }
}

impl ResourceScoreConfig {
    fn validate(&self, label: &str) -> Result<()> {
        check_weights(
            &format!("{label}.resources.primary_weights"),
            self.primary_weights.values().copied(),
        )?;
        check_weights(
            &format!("{label}.resources shares"),
            [self.primary_share, self.bonus_share],
        )
    }
}

/// Safety sub-score: `1 - e^(-max(distance - floor, 0) / decay)`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Hops that earn no safety at all
    pub floor_hops: u32,
    pub decay: f64,
    /// Distance assumed when no hostile region exists or none is reachable
    pub no_hostile_distance: u32,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            floor_hops: 1,
            decay: 3.0,
            no_hostile_distance: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CastleWeights {
    pub population: f64,
    pub resources: f64,
    pub level: f64,
    pub size: f64,
    pub safety: f64,
}

impl Default for CastleWeights {
    fn default() -> Self {
        Self {
            population: 0.30,
            resources: 0.30,
            level: 0.10,
            size: 0.10,
            safety: 0.20,
        }
    }
}

/// Castle-placement scoring (cluster and individual variants)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CastleScoringConfig {
    pub weights: CastleWeights,
    #[serde(deserialize_with = "cluster_ranges")]
    pub cluster_ranges: ScoreRanges,
    #[serde(deserialize_with = "individual_ranges")]
    pub individual_ranges: ScoreRanges,
    pub resources: ResourceScoreConfig,
    pub safety: SafetyConfig,
}

impl Default for CastleScoringConfig {
    fn default() -> Self {
        Self {
            weights: CastleWeights::default(),
            cluster_ranges: ScoreRanges::cluster(),
            individual_ranges: ScoreRanges::individual(),
            resources: ResourceScoreConfig::default(),
            safety: SafetyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierWeights {
    pub population: f64,
    pub resources: f64,
    pub level: f64,
    pub ownership: f64,
}

impl Default for FrontierWeights {
    fn default() -> Self {
        Self {
            population: 0.30,
            resources: 0.35,
            level: 0.15,
            ownership: 0.20,
        }
    }
}

/// Frontier / army-target scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierScoringConfig {
    pub weights: FrontierWeights,
    #[serde(deserialize_with = "individual_ranges")]
    pub ranges: ScoreRanges,
    pub resources: ResourceScoreConfig,
    /// Ownership sub-score of an enemy-held target
    pub hostile_ownership: f64,
    /// Ownership sub-score of a neutral target
    pub neutral_ownership: f64,
}

impl Default for FrontierScoringConfig {
    fn default() -> Self {
        Self {
            weights: FrontierWeights::default(),
            ranges: ScoreRanges::individual(),
            resources: ResourceScoreConfig::default(),
            hostile_ownership: 1.0,
            neutral_ownership: 0.5,
        }
    }
}

/// Resource-needs multipliers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    /// Applied when projected net change per turn is negative
    pub deficit_boost: f64,
    /// Applied when coverage falls below `target_coverage_turns`
    pub low_coverage_boost: f64,
    /// Applied when stock is below the per-kind floor
    pub low_stock_boost: f64,
    pub target_coverage_turns: f64,
    pub stock_floors: BTreeMap<ResourceKind, u32>,
    /// Each owned region pays `population / divisor` gold per turn
    pub gold_per_population_divisor: u32,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            deficit_boost: 1.5,
            low_coverage_boost: 1.25,
            low_stock_boost: 1.5,
            target_coverage_turns: 5.0,
            stock_floors: BTreeMap::from([
                (ResourceKind::Gold, 100),
                (ResourceKind::Food, 50),
                (ResourceKind::Wood, 30),
                (ResourceKind::Iron, 20),
            ]),
            gold_per_population_divisor: 100,
        }
    }
}

/// Turn orchestration knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Upper bound (exclusive) of the per-army random term
    pub random_jitter: f64,
    /// Mixed into every per-army seed
    pub seed_salt: u64,
    /// Bounded wait for the battle collaborator
    pub battle_timeout_ms: u64,
    /// Hard stop for a single player's turn
    pub max_moves_per_turn: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            random_jitter: 10.0,
            seed_salt: 0x5eed,
            battle_timeout_ms: 5_000,
            max_moves_per_turn: 64,
        }
    }
}

/// Corridor-centrality overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralityConfig {
    /// `true`: classic Brandes credit split by shortest-path multiplicity.
    /// `false`: an intermediate gains 1 per pair if it lies on any shortest path.
    pub multiplicity_weighted: bool,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            multiplicity_weighted: true,
        }
    }
}

/// Reference auto-resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoBattleConfig {
    pub max_rounds: u32,
    /// Neutral and undefended regions field `population / divisor` peasants
    pub garrison_divisor: u32,
}

impl Default for AutoBattleConfig {
    fn default() -> Self {
        Self {
            max_rounds: 1_000,
            garrison_divisor: 100,
        }
    }
}

/// Complete AI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub castle: CastleScoringConfig,
    pub frontier: FrontierScoringConfig,
    pub needs: NeedsConfig,
    pub turn: TurnConfig,
    pub centrality: CentralityConfig,
    pub battle: AutoBattleConfig,
}

impl AiConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AiConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let c = &self.castle.weights;
        check_weights(
            "castle.weights",
            [c.population, c.resources, c.level, c.size, c.safety],
        )?;
        let f = &self.frontier.weights;
        check_weights(
            "frontier.weights",
            [f.population, f.resources, f.level, f.ownership],
        )?;

        self.castle.cluster_ranges.validate("castle.cluster_ranges")?;
        self.castle.individual_ranges.validate("castle.individual_ranges")?;
        self.frontier.ranges.validate("frontier.ranges")?;
        self.castle.resources.validate("castle")?;
        self.frontier.resources.validate("frontier")?;

        if self.castle.safety.decay <= 0.0 {
            return Err(ConquestError::InvalidConfig(
                "castle.safety.decay must be positive".into(),
            ));
        }
        if self.turn.battle_timeout_ms == 0 {
            return Err(ConquestError::InvalidConfig(
                "turn.battle_timeout_ms must be positive".into(),
            ));
        }
        if self.turn.random_jitter < 0.0 {
            return Err(ConquestError::InvalidConfig(
                "turn.random_jitter must not be negative".into(),
            ));
        }
        if self.needs.gold_per_population_divisor == 0 || self.battle.garrison_divisor == 0 {
            return Err(ConquestError::InvalidConfig(
                "divisors must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn check_weights(label: &str, weights: impl IntoIterator<Item = f64>) -> Result<()> {
    let mut sum = 0.0;
    for w in weights {
        if w < 0.0 || !w.is_finite() {
            return Err(ConquestError::InvalidConfig(format!(
                "{label}: weight {w} must be a non-negative number"
            )));
        }
        sum += w;
    }
    if (sum - 1.0).abs() > WEIGHT_EPSILON {
        return Err(ConquestError::InvalidConfig(format!(
            "{label}: weights sum to {sum:.6}, expected 1"
        )));
    }
    Ok(())
}
