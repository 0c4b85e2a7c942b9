//! Normalization machinery shared by both scoring modes

use crate::core::config::{ResourceScoreConfig, ScoreRanges, ValueRange};
use crate::core::types::ResourceKind;

/// Linear min-max normalization clamped to [0, 1]
///
/// A degenerate range (max <= min) yields 0.
pub fn normalize_linear(value: f64, range: ValueRange) -> f64 {
    if range.max <= range.min {
        return 0.0;
    }
    ((value - range.min) / (range.max - range.min)).clamp(0.0, 1.0)
}

/// Resource sub-score from per-kind totals
///
/// Primary kinds form a weighted mean scaled by `primary_share`; the bonus
/// kind contributes `bonus_share` on its own.
pub fn resource_score(
    amount_of: impl Fn(ResourceKind) -> f64,
    ranges: &ScoreRanges,
    config: &ResourceScoreConfig,
) -> f64 {
    let weight_sum: f64 = config.primary_weights.values().sum();
    let primary = if weight_sum > 0.0 {
        config
            .primary_weights
            .iter()
            .map(|(&kind, &w)| w * normalize_linear(amount_of(kind), ranges.resource(kind)))
            .sum::<f64>()
            / weight_sum
    } else {
        0.0
    };
    let bonus = normalize_linear(
        amount_of(config.bonus_kind),
        ranges.resource(config.bonus_kind),
    );

    (config.primary_share * primary + config.bonus_share * bonus).clamp(0.0, 1.0)
}

/// Weighted sum of `(weight, score)` pairs clamped to [0, 1]
pub fn combine(parts: &[(f64, f64)]) -> f64 {
    parts
        .iter()
        .map(|(w, s)| w * s)
        .sum::<f64>()
        .clamp(0.0, 1.0)
}
