// Weighted composite of normalized feature scores.

use crate::config::FeatureWeights;
use crate::scoring::features::Feature;
use crate::scoring::normalize::{NormalizedScores, NEUTRAL_SCORE};

/// Raw composite: `sum(normalized[f] * weight[f])` over every configured
/// feature, substituting 50 for features absent from `scores`. Roughly 0-100,
/// unrounded.
pub fn raw_composite(scores: &NormalizedScores, weights: &FeatureWeights) -> f64 {
    Feature::ALL
        .iter()
        .map(|&f| scores.get(f).unwrap_or(NEUTRAL_SCORE) * weights.weight(f))
        .sum()
}
