// Final ordering and display tiers.

use serde::Serialize;

use crate::config::TierConfig;

/// Quality bucket derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityTier {
    Elite,
    High,
    Med,
    Low,
}

impl QualityTier {
    pub fn from_score(score: i32, cfg: &TierConfig) -> Self {
        if score >= cfg.elite_score {
            QualityTier::Elite
        } else if score >= cfg.high_score {
            QualityTier::High
        } else if score >= cfg.med_score {
            QualityTier::Med
        } else {
            QualityTier::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityTier::Elite => "ELITE",
            QualityTier::High => "HIGH",
            QualityTier::Med => "MED",
            QualityTier::Low => "LOW",
        }
    }
}

/// How much the sample behind a score can be trusted, from plate appearances
/// alone. `Spec` covers the same range as the sample-size floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceTier {
    High,
    Med,
    Low,
    Spec,
}

impl ConfidenceTier {
    pub fn from_pa(pa: Option<u32>, cfg: &TierConfig) -> Self {
        match pa {
            Some(pa) if pa >= cfg.confidence_high_pa => ConfidenceTier::High,
            Some(pa) if pa >= cfg.confidence_med_pa => ConfidenceTier::Med,
            Some(pa) if pa >= cfg.confidence_low_pa => ConfidenceTier::Low,
            _ => ConfidenceTier::Spec,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "HIGH",
            ConfidenceTier::Med => "MED",
            ConfidenceTier::Low => "LOW",
            ConfidenceTier::Spec => "SPEC",
        }
    }
}

/// Anything that carries a final score and a rank slot.
pub trait Rankable {
    fn score(&self) -> i32;
    fn set_rank(&mut self, rank: usize);
}

/// Sort descending by score, keeping input order among ties, and assign
/// 1-based ranks.
pub fn rank_players<T: Rankable>(mut players: Vec<T>) -> Vec<T> {
    // `sort_by` is stable.
    players.sort_by(|a, b| b.score().cmp(&a.score()));
    for (i, p) in players.iter_mut().enumerate() {
        p.set_rank(i + 1);
    }
    players
}
