// Cohort-relative min-max normalization to a 0-100 scale.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::scoring::features::{Feature, FeatureVector};

/// Score given to a player whose raw value for a feature is missing.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Per-feature 0-100 scores for one player, meaningful only within the cohort
/// they were computed from. A feature with no data anywhere in the cohort is
/// absent rather than defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedScores(BTreeMap<Feature, f64>);

impl NormalizedScores {
    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.0.get(&feature).copied()
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        self.0.insert(feature, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.0.iter().map(|(&f, &v)| (f, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Min and max of the non-null values in one feature column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    /// Returns `None` when the column has no values at all.
    pub fn of(values: &[Option<f64>]) -> Option<Self> {
        values.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some(FeatureRange { min: v, max: v }),
            Some(r) => Some(FeatureRange {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
        })
    }

    /// Scale a value into 0-100. A zero-width range is treated as width 1.
    pub fn scale(&self, value: f64) -> f64 {
        let mut range = self.max - self.min;
        if range == 0.0 {
            range = 1.0;
        }
        (value - self.min) / range * 100.0
    }
}

/// Normalize one feature column. Returns `None` if no player has a value;
/// otherwise one score per input, with missing values mapped to 50.
pub fn normalize_feature(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let range = FeatureRange::of(values)?;
    Some(
        values
            .iter()
            .map(|v| match v {
                Some(v) => range.scale(*v),
                None => NEUTRAL_SCORE,
            })
            .collect(),
    )
}

/// Normalize every feature independently across the cohort.
pub fn normalize_cohort(vectors: &[FeatureVector]) -> Vec<NormalizedScores> {
    let mut scores = vec![NormalizedScores::default(); vectors.len()];

    for feature in Feature::ALL {
        let column: Vec<Option<f64>> = vectors.iter().map(|fv| fv.get(feature)).collect();
        let Some(normalized) = normalize_feature(&column) else {
            continue;
        };
        for (player, value) in scores.iter_mut().zip(normalized) {
            player.set(feature, value);
        }
    }

    scores
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
