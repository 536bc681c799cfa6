// Raw hitter records as handed to the scoring engine, plus the one place
// that decides which season's numbers count as "current" and "prior".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One year-keyed stat line as supplied by a provider (e.g. `wOBA_2025`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonLine {
    pub woba: Option<f64>,
    pub xwoba: Option<f64>,
}

/// Rate stats for the season before the current one, used for trajectory
/// features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorSeason {
    pub hard_hit_rate: Option<f64>,
    pub barrel_rate: Option<f64>,
    pub k_rate: Option<f64>,
    pub chase_rate: Option<f64>,
    pub launch_angle: Option<f64>,
    pub xwoba: Option<f64>,
    pub woba: Option<f64>,
}

/// A single hitter as ingested. Rates are fractions (0.45 = 45%), bat speed
/// is in mph and launch angle in degrees.
///
/// The engine only ever borrows records; nothing downstream writes to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub team: String,
    pub position: String,
    pub age: Option<u32>,
    pub pa: Option<u32>,

    pub xwoba: Option<f64>,
    pub woba: Option<f64>,
    pub hard_hit_rate: Option<f64>,
    pub barrel_rate: Option<f64>,
    pub k_rate: Option<f64>,
    pub chase_rate: Option<f64>,
    pub pull_rate: Option<f64>,
    pub bat_speed: Option<f64>,
    pub launch_angle: Option<f64>,

    pub prior: PriorSeason,
    pub seasons: BTreeMap<i32, SeasonLine>,

    pub career_woba: Option<f64>,
    pub years_of_service: Option<u32>,
}

/// wOBA/xwOBA pinned to a prediction year: `current` is `year - 1`,
/// `prior` is `year - 2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResolvedSeasons {
    pub current_woba: Option<f64>,
    pub prior_woba: Option<f64>,
    pub current_xwoba: Option<f64>,
    pub prior_xwoba: Option<f64>,
}

// ---------------------------------------------------------------------------
// Year resolution
// ---------------------------------------------------------------------------

/// Select the current and prior season lines for `prediction_year`.
///
/// Year-keyed lines win; the flat current-season fields and `prior.*` fill
/// in when a provider did not supply a line for that year.
pub fn resolve_seasons(record: &PlayerRecord, prediction_year: i32) -> ResolvedSeasons {
    let current = record.seasons.get(&(prediction_year - 1));
    let prior = record.seasons.get(&(prediction_year - 2));

    ResolvedSeasons {
        current_woba: current.and_then(|s| s.woba).or(record.woba),
        prior_woba: prior.and_then(|s| s.woba).or(record.prior.woba),
        current_xwoba: current.and_then(|s| s.xwoba).or(record.xwoba),
        prior_xwoba: prior.and_then(|s| s.xwoba).or(record.prior.xwoba),
    }
}

/// The wOBA used to decide whether a player is already established:
/// the flat current-season value, then the resolved current season, then
/// the resolved prior season.
pub fn representative_woba(record: &PlayerRecord, prediction_year: i32) -> Option<f64> {
    let resolved = resolve_seasons(record, prediction_year);
    record
        .woba
        .or(resolved.current_woba)
        .or(resolved.prior_woba)
}

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// `current - prior` for stats where higher is better.
pub fn gain(current: Option<f64>, prior: Option<f64>) -> Option<f64> {
    Some(current? - prior?)
}

/// `prior - current` for stats where lower is better (strikeouts, chases),
/// so a positive result is always an improvement.
pub fn reduction(current: Option<f64>, prior: Option<f64>) -> Option<f64> {
    Some(prior? - current?)
}

impl PlayerRecord {
    /// Year-over-year strikeout-rate improvement; negative means the player
    /// is striking out more.
    pub fn k_rate_improvement(&self) -> Option<f64> {
        reduction(self.k_rate, self.prior.k_rate)
    }

    pub fn barrel_improvement(&self) -> Option<f64> {
        gain(self.barrel_rate, self.prior.barrel_rate)
    }

    pub fn hard_hit_improvement(&self) -> Option<f64> {
        gain(self.hard_hit_rate, self.prior.hard_hit_rate)
    }

    pub fn chase_improvement(&self) -> Option<f64> {
        reduction(self.chase_rate, self.prior.chase_rate)
    }
}

/// Map NaN and infinities to `None`. Every ingestion path funnels numbers
/// through here.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
