// Feature extraction: raw record -> the named values the model scores on.

use serde::{Deserialize, Serialize};

use crate::record::{resolve_seasons, PlayerRecord};

// ---------------------------------------------------------------------------
// Feature names
// ---------------------------------------------------------------------------

/// A scored feature. Serializes with the camelCase names used in output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    HardHitRate,
    BarrelRate,
    BatSpeed,
    BarrelImprovement,
    HardHitImprovement,
    ChaseImprovement,
    KRateInverse,
    ChaseRateInverse,
    XwobaSurplus,
    XwobaLevel,
}

impl Feature {
    /// Every feature, in weight-table order.
    pub const ALL: [Feature; 10] = [
        Feature::HardHitRate,
        Feature::BarrelRate,
        Feature::BatSpeed,
        Feature::BarrelImprovement,
        Feature::HardHitImprovement,
        Feature::ChaseImprovement,
        Feature::KRateInverse,
        Feature::ChaseRateInverse,
        Feature::XwobaSurplus,
        Feature::XwobaLevel,
    ];

    /// Display name, matching the serialized form.
    pub fn name(&self) -> &'static str {
        match self {
            Feature::HardHitRate => "hardHitRate",
            Feature::BarrelRate => "barrelRate",
            Feature::BatSpeed => "batSpeed",
            Feature::BarrelImprovement => "barrelImprovement",
            Feature::HardHitImprovement => "hardHitImprovement",
            Feature::ChaseImprovement => "chaseImprovement",
            Feature::KRateInverse => "kRateInverse",
            Feature::ChaseRateInverse => "chaseRateInverse",
            Feature::XwobaSurplus => "xwobaSurplus",
            Feature::XwobaLevel => "xwobaLevel",
        }
    }

    /// Key under `[weights]` in model.toml.
    pub fn config_key(&self) -> &'static str {
        match self {
            Feature::HardHitRate => "hard_hit_rate",
            Feature::BarrelRate => "barrel_rate",
            Feature::BatSpeed => "bat_speed",
            Feature::BarrelImprovement => "barrel_improvement",
            Feature::HardHitImprovement => "hard_hit_improvement",
            Feature::ChaseImprovement => "chase_improvement",
            Feature::KRateInverse => "k_rate_inverse",
            Feature::ChaseRateInverse => "chase_rate_inverse",
            Feature::XwobaSurplus => "xwoba_surplus",
            Feature::XwobaLevel => "xwoba_level",
        }
    }
}

// ---------------------------------------------------------------------------
// Feature vector
// ---------------------------------------------------------------------------

/// Per-player feature values. Missing inputs stay `None`; nothing is imputed
/// at this stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    pub hard_hit_rate: Option<f64>,
    pub barrel_rate: Option<f64>,
    pub bat_speed: Option<f64>,
    pub barrel_improvement: Option<f64>,
    pub hard_hit_improvement: Option<f64>,
    pub chase_improvement: Option<f64>,
    pub k_rate_inverse: Option<f64>,
    pub chase_rate_inverse: Option<f64>,
    pub xwoba_surplus: Option<f64>,
    pub xwoba_level: Option<f64>,
}

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> Option<f64> {
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
}

/// Build the feature vector for one record. `prediction_year` picks which
/// season's xwOBA/wOBA feed `xwobaLevel` and `xwobaSurplus`.
pub fn extract_features(record: &PlayerRecord, prediction_year: i32) -> FeatureVector {
    let seasons = resolve_seasons(record, prediction_year);

    let xwoba_surplus = match (seasons.current_xwoba, seasons.current_woba) {
        (Some(x), Some(w)) => Some(x - w),
        _ => None,
    };

    FeatureVector {
        hard_hit_rate: record.hard_hit_rate,
        barrel_rate: record.barrel_rate,
        bat_speed: record.bat_speed,
        barrel_improvement: record.barrel_improvement(),
        hard_hit_improvement: record.hard_hit_improvement(),
        chase_improvement: record.chase_improvement(),
        k_rate_inverse: record.k_rate.map(|k| 1.0 - k),
        chase_rate_inverse: record.chase_rate.map(|c| 1.0 - c),
        xwoba_surplus,
        xwoba_level: seasons.current_xwoba,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
