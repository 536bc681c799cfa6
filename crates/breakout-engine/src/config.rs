// Model configuration loading and validation (config/model.toml).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::scoring::features::Feature;

/// Name of the model configuration file inside `config/` and `defaults/`.
pub const MODEL_FILE: &str = "model.toml";

/// Tolerance for the weights-sum-to-one check.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("model config not found at {path}")]
    NotFound { path: PathBuf },

    #[error("model config {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid model config field `{field}`: {message}")]
    Invalid { field: String, message: String },

    #[error("no model config under {dir}: expected config/model.toml or defaults/model.toml")]
    NoModel { dir: PathBuf },

    #[error("failed to seed {target} from defaults: {source}")]
    Seed {
        target: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Top-level model config
// ---------------------------------------------------------------------------

/// Everything the scoring pipeline reads besides the cohort itself.
///
/// Passed by reference into every stage; two configs (say, two model
/// versions) can be scored side by side without interfering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub weights: FeatureWeights,
    pub filter: FilterConfig,
    pub adjustments: AdjustmentConfig,
    pub elite: EliteConfig,
    pub tiers: TierConfig,
    pub advisory: AdvisoryConfig,
}

// ---------------------------------------------------------------------------
// [weights]
// ---------------------------------------------------------------------------

/// Static weight per scored feature. Must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    pub hard_hit_rate: f64,
    pub barrel_rate: f64,
    pub bat_speed: f64,
    pub barrel_improvement: f64,
    pub hard_hit_improvement: f64,
    pub chase_improvement: f64,
    pub k_rate_inverse: f64,
    pub chase_rate_inverse: f64,
    pub xwoba_surplus: f64,
    pub xwoba_level: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        FeatureWeights {
            hard_hit_rate: 0.14,
            barrel_rate: 0.14,
            bat_speed: 0.09,
            barrel_improvement: 0.15,
            hard_hit_improvement: 0.10,
            chase_improvement: 0.08,
            k_rate_inverse: 0.10,
            chase_rate_inverse: 0.10,
            xwoba_surplus: 0.07,
            xwoba_level: 0.03,
        }
    }
}

impl FeatureWeights {
    pub fn weight(&self, feature: Feature) -> f64 {
        match feature {
            Feature::HardHitRate => self.hard_hit_rate,
            Feature::BarrelRate => self.barrel_rate,
            Feature::BatSpeed => self.bat_speed,
            Feature::BarrelImprovement => self.barrel_improvement,
            Feature::HardHitImprovement => self.hard_hit_improvement,
            Feature::ChaseImprovement => self.chase_improvement,
            Feature::KRateInverse => self.k_rate_inverse,
            Feature::ChaseRateInverse => self.chase_rate_inverse,
            Feature::XwobaSurplus => self.xwoba_surplus,
            Feature::XwobaLevel => self.xwoba_level,
        }
    }

    pub fn sum(&self) -> f64 {
        Feature::ALL.iter().map(|&f| self.weight(f)).sum()
    }
}

// ---------------------------------------------------------------------------
// [filter]
// ---------------------------------------------------------------------------

/// Who is excluded from the cohort before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// A primary position containing any of these is a pitcher.
    pub pitcher_tokens: Vec<String>,
    /// A primary position equal to any of these is a pitcher.
    pub pitcher_exact: Vec<String>,
    /// wOBA strictly above this marks an established star.
    pub established_woba: f64,
    /// Players younger than this (strictly) count as young.
    pub young_age_limit: u32,
    /// Fewer plate appearances than this (strictly) counts as a limited sample.
    pub limited_sample_pa: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            pitcher_tokens: vec!["SP".into(), "RP".into()],
            pitcher_exact: vec!["P".into()],
            established_woba: 0.350,
            young_age_limit: 24,
            limited_sample_pa: 400,
        }
    }
}

// ---------------------------------------------------------------------------
// [adjustments]
// ---------------------------------------------------------------------------

/// One step of the age curve: applies to ages `<= max_age` not covered by an
/// earlier band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeBand {
    pub max_age: u32,
    pub multiplier: f64,
}

/// One step of the sample-size curve: applies to `pa >= min_pa` not covered by
/// an earlier band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleBand {
    pub min_pa: u32,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentConfig {
    /// Ascending by `max_age`.
    pub age_bands: Vec<AgeBand>,
    /// Ages past the last band.
    pub age_beyond: f64,
    pub age_unknown: f64,
    /// Descending by `min_pa`.
    pub sample_bands: Vec<SampleBand>,
    /// Below the last band, or PA unknown.
    pub sample_floor: f64,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        AdjustmentConfig {
            age_bands: vec![
                AgeBand { max_age: 23, multiplier: 1.15 },
                AgeBand { max_age: 26, multiplier: 1.25 },
                AgeBand { max_age: 28, multiplier: 1.00 },
                AgeBand { max_age: 30, multiplier: 0.85 },
            ],
            age_beyond: 0.70,
            age_unknown: 1.00,
            sample_bands: vec![
                SampleBand { min_pa: 500, multiplier: 1.00 },
                SampleBand { min_pa: 300, multiplier: 0.95 },
                SampleBand { min_pa: 200, multiplier: 0.85 },
                SampleBand { min_pa: 150, multiplier: 0.75 },
            ],
            sample_floor: 0.60,
        }
    }
}

// ---------------------------------------------------------------------------
// [elite]
// ---------------------------------------------------------------------------

/// Thresholds and multipliers for the elite-profile composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliteConfig {
    pub hard_hit_threshold: f64,
    pub hard_hit_bonus: f64,
    pub barrel_threshold: f64,
    pub barrel_bonus: f64,
    pub bat_speed_threshold: f64,
    pub bat_speed_bonus: f64,
    /// Strikeout rate strictly below this earns the contact bonus.
    pub k_rate_threshold: f64,
    pub k_rate_bonus: f64,

    /// `k_rate_improvement >= k_rate_stable_floor` (or unknown) is "stable".
    pub k_rate_stable_floor: f64,
    pub barrel_gain_threshold: f64,
    pub barrel_gain_bonus: f64,
    pub hard_hit_gain_threshold: f64,
    pub hard_hit_gain_bonus: f64,
    pub chase_gain_threshold: f64,
    pub chase_gain_bonus: f64,

    /// `k_rate_improvement` strictly below this triggers the penalty.
    pub k_rate_explosion_threshold: f64,
    pub k_rate_explosion_penalty: f64,

    pub all_skills_bonus: f64,
    pub sustained_gains_min: usize,
    pub sustained_gains_bonus: f64,

    pub young_talent_hard_hit: f64,
    pub young_talent_barrel: f64,
    /// Ascending by `max_age`; ages past the last entry get no bonus.
    pub young_talent_scale: Vec<AgeBand>,
}

impl Default for EliteConfig {
    fn default() -> Self {
        EliteConfig {
            hard_hit_threshold: 0.45,
            hard_hit_bonus: 1.10,
            barrel_threshold: 0.10,
            barrel_bonus: 1.10,
            bat_speed_threshold: 73.0,
            bat_speed_bonus: 1.08,
            k_rate_threshold: 0.20,
            k_rate_bonus: 1.08,
            k_rate_stable_floor: -0.03,
            barrel_gain_threshold: 0.02,
            barrel_gain_bonus: 1.15,
            hard_hit_gain_threshold: 0.03,
            hard_hit_gain_bonus: 1.12,
            chase_gain_threshold: 0.02,
            chase_gain_bonus: 1.10,
            k_rate_explosion_threshold: -0.05,
            k_rate_explosion_penalty: 0.75,
            all_skills_bonus: 1.15,
            sustained_gains_min: 2,
            sustained_gains_bonus: 1.20,
            young_talent_hard_hit: 0.55,
            young_talent_barrel: 0.13,
            young_talent_scale: vec![
                AgeBand { max_age: 21, multiplier: 1.40 },
                AgeBand { max_age: 22, multiplier: 1.30 },
                AgeBand { max_age: 23, multiplier: 1.20 },
                AgeBand { max_age: 24, multiplier: 1.10 },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// [tiers]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub elite_score: i32,
    pub high_score: i32,
    pub med_score: i32,
    pub confidence_high_pa: u32,
    pub confidence_med_pa: u32,
    pub confidence_low_pa: u32,
}

impl Default for TierConfig {
    fn default() -> Self {
        TierConfig {
            elite_score: 80,
            high_score: 68,
            med_score: 55,
            confidence_high_pa: 400,
            confidence_med_pa: 200,
            confidence_low_pa: 150,
        }
    }
}

// ---------------------------------------------------------------------------
// [advisory]
// ---------------------------------------------------------------------------

/// Thresholds for the diagnostic annotations. None of these touch the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    pub k_rate_severe: f64,
    pub k_rate_moderate: f64,
    pub chase_severe: f64,
    pub chase_high: f64,
    pub chase_moderate: f64,

    pub surplus_discount_min_surplus: f64,
    pub surplus_discount_high: f64,
    pub surplus_discount_moderate: f64,

    pub career_regression_deviation: f64,
    pub career_regression_multiplier: f64,
    pub career_bounce_back_deviation: f64,
    pub career_bounce_back_multiplier: f64,

    pub sophomore_max_service: u32,
    pub sophomore_woba: f64,

    pub bat_speed_upside: f64,
    pub bat_speed_upside_max_barrel: f64,
    pub launch_angle_change: f64,
    pub pull_rate_shift_ban: f64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        AdvisoryConfig {
            k_rate_severe: 0.30,
            k_rate_moderate: 0.25,
            chase_severe: 0.33,
            chase_high: 0.30,
            chase_moderate: 0.27,
            surplus_discount_min_surplus: 0.035,
            surplus_discount_high: 0.70,
            surplus_discount_moderate: 0.85,
            career_regression_deviation: 0.040,
            career_regression_multiplier: 0.85,
            career_bounce_back_deviation: -0.030,
            career_bounce_back_multiplier: 1.10,
            sophomore_max_service: 3,
            sophomore_woba: 0.340,
            bat_speed_upside: 73.0,
            bat_speed_upside_max_barrel: 0.08,
            launch_angle_change: 3.0,
            pull_rate_shift_ban: 0.45,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Parse and validate a model config from TOML text. `path` is only used for
/// error messages.
pub fn parse_config(text: &str, path: &Path) -> Result<ModelConfig, ConfigError> {
    let config: ModelConfig = toml::from_str(text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load and validate a model config from an explicit file.
pub fn load_config_file(path: &Path) -> Result<ModelConfig, ConfigError> {
    let text = read_file(path)?;
    parse_config(&text, path)
}

/// Load `config/model.toml` relative to `base_dir` without seeding defaults.
pub fn load_config_from(base_dir: &Path) -> Result<ModelConfig, ConfigError> {
    load_config_file(&base_dir.join("config").join(MODEL_FILE))
}

/// Copy `defaults/model.toml` to `config/model.toml` when the latter is
/// missing. Returns the seeded path, or `None` when a model was already in
/// place. An existing `config/model.toml` is never overwritten.
pub fn seed_model_config(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let default_model = base_dir.join("defaults").join(MODEL_FILE);
    let config_dir = base_dir.join("config");
    let target = config_dir.join(MODEL_FILE);

    if !default_model.is_file() {
        if target.is_file() {
            return Ok(None);
        }
        return Err(ConfigError::NoModel {
            dir: base_dir.to_path_buf(),
        });
    }

    let seed_err = |source: std::io::Error| ConfigError::Seed {
        target: target.clone(),
        source,
    };
    std::fs::create_dir_all(&config_dir).map_err(seed_err)?;

    // create_new so a model written concurrently is left alone.
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => return Err(seed_err(e)),
    };
    let content = std::fs::read(&default_model).map_err(seed_err)?;
    std::io::Write::write_all(&mut dest, &content).map_err(seed_err)?;

    info!("seeded {} from {}", target.display(), default_model.display());
    Ok(Some(target))
}

/// Convenience wrapper: loads config relative to the current working directory,
/// seeding `config/` from `defaults/` first.
pub fn load_config() -> Result<ModelConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::NotFound {
        path: PathBuf::from("."),
    })?;
    seed_model_config(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::NotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        message: message.into(),
    }
}

fn check_multiplier(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, format!("must be a finite value > 0, got {value}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check the invariants every stage relies on.
pub fn validate(config: &ModelConfig) -> Result<(), ConfigError> {
    // Weights
    let w = &config.weights;
    for feature in Feature::ALL {
        let val = w.weight(feature);
        if !val.is_finite() || val < 0.0 {
            return Err(invalid(
                format!("weights.{}", feature.config_key()),
                format!("must be >= 0, got {val}"),
            ));
        }
    }
    let sum = w.sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(invalid("weights", format!("must sum to 1.0, got {sum}")));
    }

    // Filter
    let f = &config.filter;
    if !f.established_woba.is_finite() {
        return Err(invalid("filter.established_woba", "must be finite"));
    }
    if f.pitcher_tokens.is_empty() && f.pitcher_exact.is_empty() {
        return Err(invalid(
            "filter.pitcher_tokens",
            "at least one pitcher position marker is required",
        ));
    }

    // Adjustments
    let a = &config.adjustments;
    if a.age_bands.is_empty() {
        return Err(invalid("adjustments.age_bands", "must not be empty"));
    }
    if a.age_bands.windows(2).any(|p| p[0].max_age >= p[1].max_age) {
        return Err(invalid(
            "adjustments.age_bands",
            "max_age must be strictly ascending",
        ));
    }
    for band in &a.age_bands {
        check_multiplier("adjustments.age_bands.multiplier", band.multiplier)?;
    }
    check_multiplier("adjustments.age_beyond", a.age_beyond)?;
    check_multiplier("adjustments.age_unknown", a.age_unknown)?;

    if a.sample_bands.is_empty() {
        return Err(invalid("adjustments.sample_bands", "must not be empty"));
    }
    if a.sample_bands.windows(2).any(|p| p[0].min_pa <= p[1].min_pa) {
        return Err(invalid(
            "adjustments.sample_bands",
            "min_pa must be strictly descending",
        ));
    }
    for band in &a.sample_bands {
        check_multiplier("adjustments.sample_bands.multiplier", band.multiplier)?;
    }
    check_multiplier("adjustments.sample_floor", a.sample_floor)?;

    // Elite
    let e = &config.elite;
    let elite_multipliers: &[(&str, f64)] = &[
        ("elite.hard_hit_bonus", e.hard_hit_bonus),
        ("elite.barrel_bonus", e.barrel_bonus),
        ("elite.bat_speed_bonus", e.bat_speed_bonus),
        ("elite.k_rate_bonus", e.k_rate_bonus),
        ("elite.barrel_gain_bonus", e.barrel_gain_bonus),
        ("elite.hard_hit_gain_bonus", e.hard_hit_gain_bonus),
        ("elite.chase_gain_bonus", e.chase_gain_bonus),
        ("elite.k_rate_explosion_penalty", e.k_rate_explosion_penalty),
        ("elite.all_skills_bonus", e.all_skills_bonus),
        ("elite.sustained_gains_bonus", e.sustained_gains_bonus),
    ];
    for (name, val) in elite_multipliers {
        check_multiplier(name, *val)?;
    }
    if e
        .young_talent_scale
        .windows(2)
        .any(|p| p[0].max_age >= p[1].max_age)
    {
        return Err(invalid(
            "elite.young_talent_scale",
            "max_age must be strictly ascending",
        ));
    }
    for band in &e.young_talent_scale {
        check_multiplier("elite.young_talent_scale.multiplier", band.multiplier)?;
    }

    // Tiers
    let t = &config.tiers;
    if !(t.elite_score > t.high_score && t.high_score > t.med_score) {
        return Err(invalid(
            "tiers",
            "elite_score > high_score > med_score must hold",
        ));
    }
    if !(t.confidence_high_pa > t.confidence_med_pa && t.confidence_med_pa > t.confidence_low_pa) {
        return Err(invalid(
            "tiers",
            "confidence_high_pa > confidence_med_pa > confidence_low_pa must hold",
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
