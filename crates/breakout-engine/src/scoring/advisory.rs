// Diagnostic annotations for hosts that explain a ranking.
//
// Nothing here feeds back into `breakout_score`. The surplus-reliability
// discount in particular is reported alongside the score, not applied to it.

use serde::Serialize;

use crate::config::AdvisoryConfig;
use crate::record::{gain, resolve_seasons, PlayerRecord};
use crate::scoring::features::FeatureVector;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Severe,
    High,
    Moderate,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Severe => "severe",
            RiskLevel::High => "high",
            RiskLevel::Moderate => "moderate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerTrend {
    /// Well above the career norm; expect some give-back.
    RegressionRisk,
    /// Well below the career norm; a rebound is plausible.
    BounceBack,
    Neutral,
}

/// Current season measured against the player's career wOBA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CareerContext {
    pub trend: CareerTrend,
    pub deviation: f64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStage {
    Rookie,
    Developing,
    Established,
    Veteran,
}

impl ServiceStage {
    pub fn from_years(years: u32) -> Self {
        match years {
            0..=1 => ServiceStage::Rookie,
            2..=3 => ServiceStage::Developing,
            4..=6 => ServiceStage::Established,
            _ => ServiceStage::Veteran,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleDirection {
    Raised,
    Lowered,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaunchAngleShift {
    pub direction: AngleDirection,
    pub delta: f64,
}

/// Every advisory annotation for one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub k_rate_risk: Option<RiskLevel>,
    pub chase_risk: Option<RiskLevel>,
    /// 1.0 when the xwOBA surplus can be taken at face value.
    pub surplus_reliability: f64,
    pub discounted_surplus: Option<f64>,
    pub career_context: Option<CareerContext>,
    pub sophomore_slump: bool,
    pub service_stage: Option<ServiceStage>,
    pub bat_speed_upside: bool,
    pub launch_angle_shift: Option<LaunchAngleShift>,
    pub shift_ban_beneficiary: bool,
    pub xwoba_trajectory: Option<f64>,
}

impl Advisory {
    /// Short, human-readable flags for the annotations that fired, in a
    /// fixed order. Empty when nothing is worth mentioning.
    pub fn notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if let Some(level) = self.k_rate_risk {
            notes.push(format!("K% risk {}", level.label()));
        }
        if let Some(level) = self.chase_risk {
            notes.push(format!("chase risk {}", level.label()));
        }
        if self.surplus_reliability < 1.0 {
            notes.push(format!("surplus x{:.2}", self.surplus_reliability));
        }
        if let Some(ctx) = self.career_context {
            match ctx.trend {
                CareerTrend::RegressionRisk => notes.push("regression risk".to_string()),
                CareerTrend::BounceBack => notes.push("bounce-back".to_string()),
                CareerTrend::Neutral => {}
            }
        }
        if self.sophomore_slump {
            notes.push("sophomore slump".to_string());
        }
        if self.bat_speed_upside {
            notes.push("bat speed upside".to_string());
        }
        if let Some(shift) = self.launch_angle_shift {
            let dir = match shift.direction {
                AngleDirection::Raised => "up",
                AngleDirection::Lowered => "down",
            };
            notes.push(format!("LA {dir} {:.1}°", shift.delta.abs()));
        }
        if self.shift_ban_beneficiary {
            notes.push("pull hitter".to_string());
        }
        notes
    }
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

pub fn k_rate_risk(k_rate: Option<f64>, cfg: &AdvisoryConfig) -> Option<RiskLevel> {
    match k_rate? {
        k if k >= cfg.k_rate_severe => Some(RiskLevel::Severe),
        k if k >= cfg.k_rate_moderate => Some(RiskLevel::Moderate),
        _ => None,
    }
}

pub fn chase_risk(chase_rate: Option<f64>, cfg: &AdvisoryConfig) -> Option<RiskLevel> {
    match chase_rate? {
        c if c > cfg.chase_severe => Some(RiskLevel::Severe),
        c if c > cfg.chase_high => Some(RiskLevel::High),
        c if c > cfg.chase_moderate => Some(RiskLevel::Moderate),
        _ => None,
    }
}

/// How far to trust a positive xwOBA surplus given the player's chase rate.
pub fn surplus_reliability(surplus: Option<f64>, chase_rate: Option<f64>, cfg: &AdvisoryConfig) -> f64 {
    let (Some(surplus), Some(chase)) = (surplus, chase_rate) else {
        return 1.0;
    };
    if surplus <= cfg.surplus_discount_min_surplus {
        return 1.0;
    }
    if chase > cfg.chase_high {
        cfg.surplus_discount_high
    } else if chase >= cfg.chase_moderate {
        cfg.surplus_discount_moderate
    } else {
        1.0
    }
}

pub fn career_context(
    current_woba: Option<f64>,
    career_woba: Option<f64>,
    cfg: &AdvisoryConfig,
) -> Option<CareerContext> {
    let deviation = current_woba? - career_woba?;
    let (trend, multiplier) = if deviation >= cfg.career_regression_deviation {
        (CareerTrend::RegressionRisk, cfg.career_regression_multiplier)
    } else if deviation <= cfg.career_bounce_back_deviation {
        (CareerTrend::BounceBack, cfg.career_bounce_back_multiplier)
    } else {
        (CareerTrend::Neutral, 1.0)
    };
    Some(CareerContext {
        trend,
        deviation,
        multiplier,
    })
}

pub fn sophomore_slump(years_of_service: Option<u32>, current_woba: Option<f64>, cfg: &AdvisoryConfig) -> bool {
    let early_career = years_of_service.is_some_and(|y| (1..=cfg.sophomore_max_service).contains(&y));
    early_career && current_woba.is_some_and(|w| w >= cfg.sophomore_woba)
}

pub fn launch_angle_shift(
    current: Option<f64>,
    prior: Option<f64>,
    cfg: &AdvisoryConfig,
) -> Option<LaunchAngleShift> {
    let delta = gain(current, prior)?;
    if delta.abs() < cfg.launch_angle_change {
        return None;
    }
    let direction = if delta > 0.0 {
        AngleDirection::Raised
    } else {
        AngleDirection::Lowered
    };
    Some(LaunchAngleShift { direction, delta })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Compute every annotation for one player.
pub fn annotate(
    record: &PlayerRecord,
    features: &FeatureVector,
    prediction_year: i32,
    cfg: &AdvisoryConfig,
) -> Advisory {
    let seasons = resolve_seasons(record, prediction_year);
    let reliability = surplus_reliability(features.xwoba_surplus, record.chase_rate, cfg);

    Advisory {
        k_rate_risk: k_rate_risk(record.k_rate, cfg),
        chase_risk: chase_risk(record.chase_rate, cfg),
        surplus_reliability: reliability,
        discounted_surplus: features.xwoba_surplus.map(|s| s * reliability),
        career_context: career_context(seasons.current_woba, record.career_woba, cfg),
        sophomore_slump: sophomore_slump(record.years_of_service, seasons.current_woba, cfg),
        service_stage: record.years_of_service.map(ServiceStage::from_years),
        bat_speed_upside: record.bat_speed.is_some_and(|s| s >= cfg.bat_speed_upside)
            && record
                .barrel_rate
                .is_some_and(|b| b < cfg.bat_speed_upside_max_barrel),
        launch_angle_shift: launch_angle_shift(record.launch_angle, record.prior.launch_angle, cfg),
        shift_ban_beneficiary: record.pull_rate.is_some_and(|p| p >= cfg.pull_rate_shift_ban),
        xwoba_trajectory: gain(seasons.current_xwoba, seasons.prior_xwoba),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
