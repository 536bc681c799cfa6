// Cohort sources: provider CSV exports, JSON record arrays, and the SQLite
// store of curated historical datasets.

pub mod csv;
pub mod json;
pub mod sqlite;

use std::path::Path;

use tracing::info;

use crate::record::PlayerRecord;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: ::csv::Error },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cohort must be a sequence of player records, got {found}")]
    NotASequence { found: &'static str },

    #[error("invalid record at index {index}: {message}")]
    InvalidRecord { index: usize, message: String },

    #[error("unsupported cohort file {path}: expected a .csv or .json extension")]
    UnsupportedFormat { path: String },
}

/// Load a cohort from a `.csv` or `.json` file, picking the parser by
/// extension.
pub fn load_cohort_file(path: &Path) -> Result<Vec<PlayerRecord>, CohortError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let records = match ext.as_deref() {
        Some("csv") => csv::load_cohort_csv(path)?,
        Some("json") => {
            let text = std::fs::read_to_string(path).map_err(|e| CohortError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            json::parse_cohort(&text)?
        }
        _ => {
            return Err(CohortError::UnsupportedFormat {
                path: path.display().to_string(),
            })
        }
    };

    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Provider `%` columns are percentages (45.2) regardless of magnitude, so a
/// 0.8% barrel rate stays 0.008 and never masquerades as a fraction.
pub(crate) fn percent_to_fraction(value: Option<f64>) -> Option<f64> {
    value.map(|v| v / 100.0)
}

/// Non-negative, finite counts only; fractional counts are rounded.
pub(crate) fn as_count(value: Option<f64>) -> Option<u32> {
    value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u32)
}

/// Which stat a year-keyed column or key holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SeasonStat {
    Woba,
    Xwoba,
}

/// Parse year-keyed names such as `wOBA_2025`, `xwoba2024` or `woba25`.
/// Two-digit years are taken as 20xx.
pub(crate) fn season_key(key: &str) -> Option<(SeasonStat, i32)> {
    let lower = key.to_ascii_lowercase();
    let (stat, rest) = if let Some(rest) = lower.strip_prefix("xwoba") {
        (SeasonStat::Xwoba, rest)
    } else if let Some(rest) = lower.strip_prefix("woba") {
        (SeasonStat::Woba, rest)
    } else {
        return None;
    };
    let digits = rest.strip_prefix('_').unwrap_or(rest);
    if !(digits.len() == 2 || digits.len() == 4) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = digits.parse().ok()?;
    Some((stat, if digits.len() == 2 { 2000 + year } else { year }))
}
