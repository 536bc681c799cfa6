// SQLite store for curated historical cohorts.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use tracing::info;

use crate::record::{finite, PlayerRecord, PriorSeason, SeasonLine};

/// SQLite-backed storage of named cohorts ("datasets"), e.g. one per
/// historical season used for back-testing.
pub struct HistoricalStore {
    conn: Mutex<Connection>,
}

impl HistoricalStore {
    /// Open (or create) a store at `path` and ensure the schema exists.
    /// Pass `":memory:"` for an ephemeral store.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS hitters (
                dataset           TEXT    NOT NULL,
                ordinal           INTEGER NOT NULL,
                name              TEXT    NOT NULL,
                team              TEXT    NOT NULL,
                position          TEXT    NOT NULL,
                age               INTEGER,
                pa                INTEGER,
                xwoba             REAL,
                woba              REAL,
                hard_hit_rate     REAL,
                barrel_rate       REAL,
                k_rate            REAL,
                chase_rate        REAL,
                pull_rate         REAL,
                bat_speed         REAL,
                launch_angle      REAL,
                prev_hard_hit_rate REAL,
                prev_barrel_rate  REAL,
                prev_k_rate       REAL,
                prev_chase_rate   REAL,
                prev_launch_angle REAL,
                prev_xwoba        REAL,
                prev_woba         REAL,
                career_woba       REAL,
                years_of_service  INTEGER,
                PRIMARY KEY (dataset, ordinal)
            );

            CREATE TABLE IF NOT EXISTS season_lines (
                dataset TEXT    NOT NULL,
                ordinal INTEGER NOT NULL,
                season  INTEGER NOT NULL,
                woba    REAL,
                xwoba   REAL,
                PRIMARY KEY (dataset, ordinal, season),
                FOREIGN KEY (dataset, ordinal) REFERENCES hitters(dataset, ordinal)
                    ON DELETE CASCADE
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Replace the dataset `dataset` with `records`, in one transaction.
    /// Record order is preserved.
    pub fn save_cohort(&self, dataset: &str, records: &[PlayerRecord]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin save transaction")?;

        tx.execute("DELETE FROM season_lines WHERE dataset = ?1", params![dataset])
            .context("failed to clear season lines")?;
        tx.execute("DELETE FROM hitters WHERE dataset = ?1", params![dataset])
            .context("failed to clear hitters")?;

        for (ordinal, r) in records.iter().enumerate() {
            let ordinal = ordinal as i64;
            tx.execute(
                "INSERT INTO hitters (
                    dataset, ordinal, name, team, position, age, pa,
                    xwoba, woba, hard_hit_rate, barrel_rate, k_rate, chase_rate,
                    pull_rate, bat_speed, launch_angle,
                    prev_hard_hit_rate, prev_barrel_rate, prev_k_rate, prev_chase_rate,
                    prev_launch_angle, prev_xwoba, prev_woba,
                    career_woba, years_of_service)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                         ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)",
                params![
                    dataset,
                    ordinal,
                    r.name,
                    r.team,
                    r.position,
                    r.age,
                    r.pa,
                    finite(r.xwoba),
                    finite(r.woba),
                    finite(r.hard_hit_rate),
                    finite(r.barrel_rate),
                    finite(r.k_rate),
                    finite(r.chase_rate),
                    finite(r.pull_rate),
                    finite(r.bat_speed),
                    finite(r.launch_angle),
                    finite(r.prior.hard_hit_rate),
                    finite(r.prior.barrel_rate),
                    finite(r.prior.k_rate),
                    finite(r.prior.chase_rate),
                    finite(r.prior.launch_angle),
                    finite(r.prior.xwoba),
                    finite(r.prior.woba),
                    finite(r.career_woba),
                    r.years_of_service,
                ],
            )
            .with_context(|| format!("failed to insert hitter {}", r.name))?;

            for (season, line) in &r.seasons {
                tx.execute(
                    "INSERT INTO season_lines (dataset, ordinal, season, woba, xwoba)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![dataset, ordinal, season, finite(line.woba), finite(line.xwoba)],
                )
                .with_context(|| format!("failed to insert {season} line for {}", r.name))?;
            }
        }

        tx.commit().context("failed to commit cohort")?;
        info!("Saved {} records to dataset {}", records.len(), dataset);
        Ok(())
    }

    /// Load a dataset in the order it was saved. An unknown dataset loads
    /// as an empty cohort.
    pub fn load_cohort(&self, dataset: &str) -> Result<Vec<PlayerRecord>> {
        let conn = self.conn();

        let mut seasons: HashMap<i64, BTreeMap<i32, SeasonLine>> = HashMap::new();
        {
            let mut stmt = conn
                .prepare(
                    "SELECT ordinal, season, woba, xwoba FROM season_lines
                     WHERE dataset = ?1 ORDER BY ordinal, season",
                )
                .context("failed to prepare season line query")?;
            let rows = stmt
                .query_map(params![dataset], |row| {
                    let ordinal: i64 = row.get(0)?;
                    let season: i32 = row.get(1)?;
                    let line = SeasonLine {
                        woba: finite(row.get(2)?),
                        xwoba: finite(row.get(3)?),
                    };
                    Ok((ordinal, season, line))
                })
                .context("failed to query season lines")?
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("failed to map season line rows")?;
            for (ordinal, season, line) in rows {
                seasons.entry(ordinal).or_default().insert(season, line);
            }
        }

        let mut stmt = conn
            .prepare(
                "SELECT ordinal, name, team, position, age, pa,
                        xwoba, woba, hard_hit_rate, barrel_rate, k_rate, chase_rate,
                        pull_rate, bat_speed, launch_angle,
                        prev_hard_hit_rate, prev_barrel_rate, prev_k_rate, prev_chase_rate,
                        prev_launch_angle, prev_xwoba, prev_woba,
                        career_woba, years_of_service
                 FROM hitters WHERE dataset = ?1 ORDER BY ordinal",
            )
            .context("failed to prepare hitter query")?;

        let rows = stmt
            .query_map(params![dataset], |row| {
                let ordinal: i64 = row.get(0)?;
                Ok((ordinal, record_from_row(row)?))
            })
            .context("failed to query hitters")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map hitter rows")?;

        Ok(rows
            .into_iter()
            .map(|(ordinal, mut record)| {
                record.seasons = seasons.remove(&ordinal).unwrap_or_default();
                record
            })
            .collect())
    }

    /// Names of every stored dataset, sorted.
    pub fn list_datasets(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT DISTINCT dataset FROM hitters ORDER BY dataset")
            .context("failed to prepare dataset query")?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .context("failed to query datasets")?
            .collect::<std::result::Result<Vec<String>, _>>()
            .context("failed to map dataset rows")?;
        Ok(names)
    }
}

fn real(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    Ok(finite(row.get(idx)?))
}

/// Columns 1.. of the hitter query; `seasons` is attached by the caller.
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<PlayerRecord> {
    Ok(PlayerRecord {
        name: row.get(1)?,
        team: row.get(2)?,
        position: row.get(3)?,
        age: row.get(4)?,
        pa: row.get(5)?,
        xwoba: real(row, 6)?,
        woba: real(row, 7)?,
        hard_hit_rate: real(row, 8)?,
        barrel_rate: real(row, 9)?,
        k_rate: real(row, 10)?,
        chase_rate: real(row, 11)?,
        pull_rate: real(row, 12)?,
        bat_speed: real(row, 13)?,
        launch_angle: real(row, 14)?,
        prior: PriorSeason {
            hard_hit_rate: real(row, 15)?,
            barrel_rate: real(row, 16)?,
            k_rate: real(row, 17)?,
            chase_rate: real(row, 18)?,
            launch_angle: real(row, 19)?,
            xwoba: real(row, 20)?,
            woba: real(row, 21)?,
        },
        seasons: BTreeMap::new(),
        career_woba: real(row, 22)?,
        years_of_service: row.get(23)?,
    })
}
