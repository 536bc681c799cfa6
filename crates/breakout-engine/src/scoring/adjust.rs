// Multiplicative adjustments applied to the raw composite score.
//
// Age and sample size are step functions read from config. The elite-profile
// composite is a fixed, ordered table of named rules; each rule looks at the
// player's precomputed signals and either contributes a multiplier or
// abstains. The composite is the product of every contribution.

use serde::Serialize;

use crate::config::{AdjustmentConfig, EliteConfig, ModelConfig};
use crate::record::PlayerRecord;

// ---------------------------------------------------------------------------
// Step functions
// ---------------------------------------------------------------------------

/// Age-curve multiplier. Bands are ascending by `max_age`; anything past the
/// last band gets `age_beyond`.
pub fn age_multiplier(age: Option<u32>, cfg: &AdjustmentConfig) -> f64 {
    let Some(age) = age else {
        return cfg.age_unknown;
    };
    cfg.age_bands
        .iter()
        .find(|band| age <= band.max_age)
        .map_or(cfg.age_beyond, |band| band.multiplier)
}

/// Sample-size multiplier. Bands are descending by `min_pa`; unknown PA and
/// anything under the last band gets `sample_floor`.
pub fn sample_size_multiplier(pa: Option<u32>, cfg: &AdjustmentConfig) -> f64 {
    let Some(pa) = pa else {
        return cfg.sample_floor;
    };
    cfg.sample_bands
        .iter()
        .find(|band| pa >= band.min_pa)
        .map_or(cfg.sample_floor, |band| band.multiplier)
}

// ---------------------------------------------------------------------------
// Elite-profile signals
// ---------------------------------------------------------------------------

/// Threshold checks for one player. Missing inputs make the matching signal
/// false, except `k_rate_stable`, which is true when the change is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EliteSignals {
    pub hard_hit: bool,
    pub barrel: bool,
    pub bat_speed: bool,
    pub contact: bool,
    pub k_rate_stable: bool,
    pub barrel_gain: bool,
    pub hard_hit_gain: bool,
    pub chase_gain: bool,
    pub k_rate_explosion: bool,
    pub young_talent_profile: bool,
    pub age: Option<u32>,
}

impl EliteSignals {
    pub fn evaluate(record: &PlayerRecord, cfg: &EliteConfig) -> Self {
        let above = |v: Option<f64>, t: f64| v.is_some_and(|v| v > t);
        let k_delta = record.k_rate_improvement();

        EliteSignals {
            hard_hit: above(record.hard_hit_rate, cfg.hard_hit_threshold),
            barrel: above(record.barrel_rate, cfg.barrel_threshold),
            bat_speed: above(record.bat_speed, cfg.bat_speed_threshold),
            contact: record.k_rate.is_some_and(|k| k < cfg.k_rate_threshold),
            k_rate_stable: k_delta.map_or(true, |d| d >= cfg.k_rate_stable_floor),
            barrel_gain: above(record.barrel_improvement(), cfg.barrel_gain_threshold),
            hard_hit_gain: above(record.hard_hit_improvement(), cfg.hard_hit_gain_threshold),
            chase_gain: above(record.chase_improvement(), cfg.chase_gain_threshold),
            k_rate_explosion: k_delta.is_some_and(|d| d < cfg.k_rate_explosion_threshold),
            young_talent_profile: above(record.hard_hit_rate, cfg.young_talent_hard_hit)
                && above(record.barrel_rate, cfg.young_talent_barrel),
            age: record.age,
        }
    }

    /// How many of the four current-skill thresholds are met.
    pub fn skills_met(&self) -> usize {
        [self.hard_hit, self.barrel, self.bat_speed, self.contact]
            .iter()
            .filter(|&&met| met)
            .count()
    }

    /// Improvements that count as sustainable: barrel and hard-hit gains only
    /// when strikeouts held steady, chase gains always.
    pub fn sustained_gains(&self) -> usize {
        [
            self.barrel_gain && self.k_rate_stable,
            self.hard_hit_gain && self.k_rate_stable,
            self.chase_gain,
        ]
        .iter()
        .filter(|&&met| met)
        .count()
    }
}

// ---------------------------------------------------------------------------
// Elite-profile rules
// ---------------------------------------------------------------------------

/// A named contribution to the elite-profile composite.
#[derive(Clone, Copy)]
pub struct EliteRule {
    pub name: &'static str,
    apply: fn(&EliteSignals, &EliteConfig) -> Option<f64>,
}

impl EliteRule {
    pub fn apply(&self, signals: &EliteSignals, cfg: &EliteConfig) -> Option<f64> {
        (self.apply)(signals, cfg)
    }
}

impl std::fmt::Debug for EliteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EliteRule").field("name", &self.name).finish()
    }
}

/// Every elite-profile rule, in evaluation order. Order does not change the
/// product, only the order rules are reported in.
pub const ELITE_RULES: &[EliteRule] = &[
    EliteRule { name: "elite_hard_hit", apply: elite_hard_hit },
    EliteRule { name: "elite_barrel", apply: elite_barrel },
    EliteRule { name: "elite_bat_speed", apply: elite_bat_speed },
    EliteRule { name: "elite_contact", apply: elite_contact },
    EliteRule { name: "barrel_breakout", apply: barrel_breakout },
    EliteRule { name: "hard_hit_breakout", apply: hard_hit_breakout },
    EliteRule { name: "chase_breakout", apply: chase_breakout },
    EliteRule { name: "k_rate_explosion", apply: k_rate_explosion },
    EliteRule { name: "all_skills", apply: all_skills },
    EliteRule { name: "sustained_gains", apply: sustained_gains },
    EliteRule { name: "young_talent", apply: young_talent },
];

fn elite_hard_hit(s: &EliteSignals, c: &EliteConfig) -> Option<f64> {
    s.hard_hit.then_some(c.hard_hit_bonus)
}

fn elite_barrel(s: &EliteSignals, c: &EliteConfig) -> Option<f64> {
    s.barrel.then_some(c.barrel_bonus)
}

fn elite_bat_speed(s: &EliteSignals, c: &EliteConfig) -> Option<f64> {
    s.bat_speed.then_some(c.bat_speed_bonus)
}

fn elite_contact(s: &EliteSignals, c: &EliteConfig) -> Option<f64> {
    s.contact.then_some(c.k_rate_bonus)
}

fn barrel_breakout(s: &EliteSignals, c: &EliteConfig) -> Option<f64> {
    (s.barrel_gain && s.k_rate_stable).then_some(c.barrel_gain_bonus)
}

fn hard_hit_breakout(s: &EliteSignals, c: &EliteConfig) -> Option<f64> {
    (s.hard_hit_gain && s.k_rate_stable).then_some(c.hard_hit_gain_bonus)
}

fn chase_breakout(s: &EliteSignals, c: &EliteConfig) -> Option<f64> {
    s.chase_gain.then_some(c.chase_gain_bonus)
}

fn k_rate_explosion(s: &EliteSignals, c: &EliteConfig) -> Option<f64> {
    s.k_rate_explosion.then_some(c.k_rate_explosion_penalty)
}

fn all_skills(s: &EliteSignals, c: &EliteConfig) -> Option<f64> {
    (s.skills_met() == 4).then_some(c.all_skills_bonus)
}

fn sustained_gains(s: &EliteSignals, c: &EliteConfig) -> Option<f64> {
    (s.sustained_gains() >= c.sustained_gains_min).then_some(c.sustained_gains_bonus)
}

fn young_talent(s: &EliteSignals, c: &EliteConfig) -> Option<f64> {
    if !s.young_talent_profile {
        return None;
    }
    let age = s.age?;
    c.young_talent_scale
        .iter()
        .find(|band| age <= band.max_age)
        .map(|band| band.multiplier)
}

/// A rule that fired, with the multiplier it contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedRule {
    pub name: &'static str,
    pub multiplier: f64,
}

/// Evaluate every elite rule and fold the contributions by multiplication.
/// Returns the composite (1.0 when nothing fires) and the rules that fired.
pub fn elite_multiplier(record: &PlayerRecord, cfg: &EliteConfig) -> (f64, Vec<AppliedRule>) {
    let signals = EliteSignals::evaluate(record, cfg);
    let applied: Vec<AppliedRule> = ELITE_RULES
        .iter()
        .filter_map(|rule| {
            rule.apply(&signals, cfg).map(|multiplier| AppliedRule {
                name: rule.name,
                multiplier,
            })
        })
        .collect();
    let product = applied.iter().map(|r| r.multiplier).product();
    (product, applied)
}

// ---------------------------------------------------------------------------
// Combined factors
// ---------------------------------------------------------------------------

/// Every multiplier that went into a player's final score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentFactors {
    pub raw_score: f64,
    pub raw_score_rounded: i32,
    pub age: f64,
    pub sample_size: f64,
    pub elite: f64,
    pub elite_rules: Vec<AppliedRule>,
    pub final_score: i32,
}

/// Apply age, sample-size and elite-profile multipliers to `raw_score`.
pub fn adjust(record: &PlayerRecord, raw_score: f64, config: &ModelConfig) -> AdjustmentFactors {
    let age = age_multiplier(record.age, &config.adjustments);
    let sample_size = sample_size_multiplier(record.pa, &config.adjustments);
    let (elite, elite_rules) = elite_multiplier(record, &config.elite);

    AdjustmentFactors {
        raw_score,
        raw_score_rounded: raw_score.round() as i32,
        age,
        sample_size,
        elite,
        elite_rules,
        final_score: (raw_score * age * sample_size * elite).round() as i32,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
