// Breakout scoring pipeline: filter, extract, normalize, aggregate, adjust,
// rank. Each stage returns new values; input records are only borrowed.

pub mod adjust;
pub mod advisory;
pub mod aggregate;
pub mod features;
pub mod filter;
pub mod normalize;
pub mod rank;

use serde::Serialize;
use tracing::debug;

use crate::config::ModelConfig;
use crate::record::PlayerRecord;

use self::adjust::AdjustmentFactors;
use self::advisory::Advisory;
use self::features::FeatureVector;
use self::normalize::NormalizedScores;
use self::rank::{ConfidenceTier, QualityTier, Rankable};

/// One scored hitter with everything needed to explain the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPlayer {
    pub rank: usize,
    pub breakout_score: i32,
    pub quality_tier: QualityTier,
    pub confidence_tier: ConfidenceTier,
    pub record: PlayerRecord,
    pub features: FeatureVector,
    pub normalized: NormalizedScores,
    pub factors: AdjustmentFactors,
    pub advisory: Advisory,
}

impl Rankable for RankedPlayer {
    fn score(&self) -> i32 {
        self.breakout_score
    }

    fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }
}

/// Score a cohort for `prediction_year`.
///
/// Pure: the same cohort and config always produce the same output, and the
/// cohort is left untouched. An empty cohort, or one the filter empties,
/// yields an empty ranking.
pub fn score_cohort(
    cohort: &[PlayerRecord],
    prediction_year: i32,
    config: &ModelConfig,
) -> Vec<RankedPlayer> {
    // ---- 1. Filter ----
    let eligible = filter::filter_cohort(cohort, prediction_year, &config.filter);
    if eligible.is_empty() {
        debug!(prediction_year, "no eligible hitters after filtering");
        return Vec::new();
    }

    // ---- 2. Features ----
    let vectors: Vec<FeatureVector> = eligible
        .iter()
        .map(|r| features::extract_features(r, prediction_year))
        .collect();

    // ---- 3. Normalize (against the filtered cohort only) ----
    let normalized = normalize::normalize_cohort(&vectors);

    // ---- 4-5. Aggregate and adjust ----
    let players: Vec<RankedPlayer> = eligible
        .into_iter()
        .zip(vectors)
        .zip(normalized)
        .map(|((record, features), normalized)| {
            let raw = aggregate::raw_composite(&normalized, &config.weights);
            let factors = adjust::adjust(record, raw, config);
            let advisory = advisory::annotate(record, &features, prediction_year, &config.advisory);
            RankedPlayer {
                rank: 0,
                breakout_score: factors.final_score,
                quality_tier: QualityTier::from_score(factors.final_score, &config.tiers),
                confidence_tier: ConfidenceTier::from_pa(record.pa, &config.tiers),
                record: record.clone(),
                features,
                normalized,
                factors,
                advisory,
            }
        })
        .collect();

    // ---- 6. Rank ----
    let ranked = rank::rank_players(players);
    debug!(
        prediction_year,
        scored = ranked.len(),
        top = ranked.first().map(|p| p.breakout_score),
        "cohort scored"
    );
    ranked
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
