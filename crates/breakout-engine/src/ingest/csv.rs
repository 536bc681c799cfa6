// Provider CSV export loading.
//
// One row per hitter. `%` columns hold percentages and are scaled to
// fractions column-wide, whatever the cell's magnitude. Any
// number of `wOBA_<year>` / `xwOBA_<year>` columns are folded into the
// record's year-keyed season lines; other unknown columns are ignored.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::ingest::{as_count, percent_to_fraction, season_key, CohortError, SeasonStat};
use crate::record::{finite, PlayerRecord, PriorSeason, SeasonLine};

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private)
// ---------------------------------------------------------------------------

/// Provider hitter row. Numeric cells that fail to parse become `None`
/// through `csv::invalid_option` instead of rejecting the row.
#[derive(Debug, Deserialize)]
struct RawHitterRow {
    #[serde(rename = "Name", alias = "name")]
    name: String,
    #[serde(rename = "Team", alias = "team")]
    team: String,
    #[serde(rename = "Pos", alias = "POS", alias = "Position", alias = "position")]
    position: String,

    #[serde(rename = "Age", alias = "age", default, deserialize_with = "::csv::invalid_option")]
    age: Option<f64>,
    #[serde(rename = "PA", alias = "pa", default, deserialize_with = "::csv::invalid_option")]
    pa: Option<f64>,

    #[serde(rename = "xwOBA", alias = "xwoba", default, deserialize_with = "::csv::invalid_option")]
    xwoba: Option<f64>,
    #[serde(rename = "wOBA", alias = "woba", default, deserialize_with = "::csv::invalid_option")]
    woba: Option<f64>,
    #[serde(rename = "HardHit%", default, deserialize_with = "::csv::invalid_option")]
    hard_hit: Option<f64>,
    #[serde(rename = "Barrel%", default, deserialize_with = "::csv::invalid_option")]
    barrel: Option<f64>,
    #[serde(rename = "K%", default, deserialize_with = "::csv::invalid_option")]
    k: Option<f64>,
    #[serde(rename = "Chase%", default, deserialize_with = "::csv::invalid_option")]
    chase: Option<f64>,
    #[serde(rename = "Pull%", default, deserialize_with = "::csv::invalid_option")]
    pull: Option<f64>,
    #[serde(rename = "BatSpeed", default, deserialize_with = "::csv::invalid_option")]
    bat_speed: Option<f64>,
    #[serde(rename = "LaunchAngle", default, deserialize_with = "::csv::invalid_option")]
    launch_angle: Option<f64>,

    #[serde(rename = "PrevHardHit%", default, deserialize_with = "::csv::invalid_option")]
    prev_hard_hit: Option<f64>,
    #[serde(rename = "PrevBarrel%", default, deserialize_with = "::csv::invalid_option")]
    prev_barrel: Option<f64>,
    #[serde(rename = "PrevK%", default, deserialize_with = "::csv::invalid_option")]
    prev_k: Option<f64>,
    #[serde(rename = "PrevChase%", default, deserialize_with = "::csv::invalid_option")]
    prev_chase: Option<f64>,
    #[serde(rename = "PrevLaunchAngle", default, deserialize_with = "::csv::invalid_option")]
    prev_launch_angle: Option<f64>,
    #[serde(rename = "PrevxwOBA", default, deserialize_with = "::csv::invalid_option")]
    prev_xwoba: Option<f64>,
    #[serde(rename = "PrevwOBA", default, deserialize_with = "::csv::invalid_option")]
    prev_woba: Option<f64>,

    #[serde(rename = "CareerwOBA", default, deserialize_with = "::csv::invalid_option")]
    career_woba: Option<f64>,
    #[serde(rename = "Service", default, deserialize_with = "::csv::invalid_option")]
    service: Option<f64>,
}

impl RawHitterRow {
    fn into_record(self, seasons: BTreeMap<i32, SeasonLine>) -> PlayerRecord {
        let rate = |v: Option<f64>| percent_to_fraction(finite(v));
        PlayerRecord {
            name: self.name,
            team: self.team,
            position: self.position,
            age: as_count(self.age),
            pa: as_count(self.pa),
            xwoba: finite(self.xwoba),
            woba: finite(self.woba),
            hard_hit_rate: rate(self.hard_hit),
            barrel_rate: rate(self.barrel),
            k_rate: rate(self.k),
            chase_rate: rate(self.chase),
            pull_rate: rate(self.pull),
            bat_speed: finite(self.bat_speed),
            launch_angle: finite(self.launch_angle),
            prior: PriorSeason {
                hard_hit_rate: rate(self.prev_hard_hit),
                barrel_rate: rate(self.prev_barrel),
                k_rate: rate(self.prev_k),
                chase_rate: rate(self.prev_chase),
                launch_angle: finite(self.prev_launch_angle),
                xwoba: finite(self.prev_xwoba),
                woba: finite(self.prev_woba),
            },
            seasons,
            career_woba: finite(self.career_woba),
            years_of_service: as_count(self.service),
        }
    }
}

/// A `wOBA_<year>` / `xwOBA_<year>` column and where it sits in the row.
#[derive(Debug, Clone, Copy)]
struct SeasonColumn {
    index: usize,
    stat: SeasonStat,
    year: i32,
}

fn season_columns(headers: &::csv::StringRecord) -> Vec<SeasonColumn> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(index, h)| season_key(h).map(|(stat, year)| SeasonColumn { index, stat, year }))
        .collect()
}

fn season_lines(row: &::csv::StringRecord, columns: &[SeasonColumn]) -> BTreeMap<i32, SeasonLine> {
    let mut seasons: BTreeMap<i32, SeasonLine> = BTreeMap::new();
    for col in columns {
        let value = finite(row.get(col.index).and_then(|cell| cell.parse::<f64>().ok()));
        let Some(value) = value else {
            continue;
        };
        let line = seasons.entry(col.year).or_default();
        match col.stat {
            SeasonStat::Woba => line.woba = Some(value),
            SeasonStat::Xwoba => line.xwoba = Some(value),
        }
    }
    seasons
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

pub(crate) fn load_cohort_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, ::csv::Error> {
    let mut reader = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_reader(rdr);
    let headers = reader.headers()?.clone();
    let columns = season_columns(&headers);

    let mut records = Vec::new();
    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("skipping unreadable CSV row: {}", e);
                continue;
            }
        };
        let raw: RawHitterRow = match row.deserialize(Some(&headers)) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed hitter row: {}", e);
                continue;
            }
        };
        if raw.name.is_empty() {
            warn!("skipping hitter row with empty name");
            continue;
        }
        let seasons = season_lines(&row, &columns);
        records.push(raw.into_record(seasons));
    }
    Ok(records)
}

/// Load a cohort from a provider CSV export.
pub fn load_cohort_csv(path: &Path) -> Result<Vec<PlayerRecord>, CohortError> {
    let file = std::fs::File::open(path).map_err(|e| CohortError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_cohort_from_reader(file).map_err(|e| CohortError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
