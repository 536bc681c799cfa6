// Breakout CLI entry point.
//
// 1. Initialize tracing (stderr; stdout carries the ranking)
// 2. Load model config (explicit file, or config/ under the cwd)
// 3. Load the cohort (CSV/JSON file or a stored dataset)
// 4. Score each prediction year on a blocking task
// 5. Render as a text table or JSON

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use breakout_engine::config::{self, ModelConfig};
use breakout_engine::ingest::{self, sqlite::HistoricalStore};
use breakout_engine::{score_cohort, PlayerRecord, RankedPlayer};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "breakout")]
#[command(about = "Rank hitters by their likelihood of a breakout season", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a cohort for one or more prediction years
    Score {
        /// Cohort file (.csv or .json)
        #[arg(long, conflicts_with = "db")]
        input: Option<PathBuf>,

        /// SQLite store holding saved datasets
        #[arg(long, requires = "dataset")]
        db: Option<PathBuf>,

        /// Dataset name inside the store
        #[arg(long)]
        dataset: Option<String>,

        /// Prediction year; repeat for several (default: current year)
        #[arg(long = "year")]
        years: Vec<i32>,

        /// Model config file (default: config/model.toml, seeded if missing)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,

        /// Only show the top N players
        #[arg(long)]
        top: Option<usize>,
    },

    /// Save a cohort file into the store under a dataset name
    Import {
        /// Cohort file (.csv or .json)
        #[arg(long)]
        input: PathBuf,

        /// SQLite store path
        #[arg(long)]
        db: PathBuf,

        /// Dataset name to create or replace
        #[arg(long)]
        dataset: String,
    },

    /// List the datasets in a store
    Datasets {
        /// SQLite store path
        #[arg(long)]
        db: PathBuf,
    },
}

/// Where the cohort comes from.
#[derive(Debug, Clone, PartialEq)]
enum CohortSource {
    File(PathBuf),
    Store { db: PathBuf, dataset: String },
}

impl CohortSource {
    fn from_args(input: Option<PathBuf>, db: Option<PathBuf>, dataset: Option<String>) -> Result<Self> {
        match (input, db, dataset) {
            (Some(path), None, _) => Ok(CohortSource::File(path)),
            (None, Some(db), Some(dataset)) => Ok(CohortSource::Store { db, dataset }),
            (None, Some(_), None) => bail!("--db requires --dataset"),
            (Some(_), Some(_), _) => bail!("use either --input or --db, not both"),
            (None, None, _) => bail!("no cohort given: pass --input <file> or --db <path> --dataset <name>"),
        }
    }

    fn load(&self) -> Result<Vec<PlayerRecord>> {
        match self {
            CohortSource::File(path) => ingest::load_cohort_file(path)
                .with_context(|| format!("failed to load cohort from {}", path.display())),
            CohortSource::Store { db, dataset } => {
                let store = open_store(db)?;
                let records = store
                    .load_cohort(dataset)
                    .with_context(|| format!("failed to load dataset {dataset}"))?;
                info!("Loaded {} records from dataset {}", records.len(), dataset);
                Ok(records)
            }
        }
    }
}

fn open_store(path: &Path) -> Result<HistoricalStore> {
    let path_str = path
        .to_str()
        .with_context(|| format!("database path is not valid UTF-8: {}", path.display()))?;
    HistoricalStore::open(path_str).context("failed to open database")
}

fn load_model_config(path: Option<&Path>) -> Result<ModelConfig> {
    let config = match path {
        Some(p) => config::load_config_file(p),
        None => config::load_config(),
    };
    config.context("failed to load model configuration")
}

/// Requested years, deduplicated in first-seen order; the current calendar
/// year when none were given.
fn prediction_years(requested: &[i32], current_year: i32) -> Vec<i32> {
    if requested.is_empty() {
        return vec![current_year];
    }
    let mut years = Vec::with_capacity(requested.len());
    for &y in requested {
        if !years.contains(&y) {
            years.push(y);
        }
    }
    years
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct YearRanking {
    prediction_year: i32,
    players: Vec<RankedPlayer>,
}

/// Score every year concurrently. The engine is synchronous, so each year
/// runs on the blocking pool against shared read-only inputs.
async fn score_years(
    cohort: Arc<Vec<PlayerRecord>>,
    config: Arc<ModelConfig>,
    years: &[i32],
) -> Result<Vec<YearRanking>> {
    let handles: Vec<_> = years
        .iter()
        .map(|&year| {
            let cohort = Arc::clone(&cohort);
            let config = Arc::clone(&config);
            tokio::task::spawn_blocking(move || YearRanking {
                prediction_year: year,
                players: score_cohort(&cohort, year, &config),
            })
        })
        .collect();

    let mut rankings = Vec::with_capacity(handles.len());
    for handle in handles {
        let ranking = handle.await.context("scoring task failed")?;
        info!(
            "Scored {} hitters for {}",
            ranking.players.len(),
            ranking.prediction_year
        );
        rankings.push(ranking);
    }
    Ok(rankings)
}

fn format_rate(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

fn format_count(value: Option<u32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn render_table(ranking: &YearRanking, top: Option<usize>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Breakout candidates for {} ({} scored)\n",
        ranking.prediction_year,
        ranking.players.len()
    ));
    out.push_str(&format!(
        "{:>4}  {:<24} {:<4} {:<5} {:>3} {:>4} {:>6} {:>5}  {:<5} {:<4}  {}\n",
        "Rank", "Player", "Team", "Pos", "Age", "PA", "xwOBA", "Score", "Tier", "Conf", "Notes"
    ));
    let limit = top.unwrap_or(usize::MAX);
    for p in ranking.players.iter().take(limit) {
        out.push_str(&format!(
            "{:>4}  {:<24} {:<4} {:<5} {:>3} {:>4} {:>6} {:>5}  {:<5} {:<4}  {}\n",
            p.rank,
            p.record.name,
            p.record.team,
            p.record.position,
            format_count(p.record.age),
            format_count(p.record.pa),
            format_rate(p.features.xwoba_level),
            p.breakout_score,
            p.quality_tier.label(),
            p.confidence_tier.label(),
            p.advisory.notes().join(", "),
        ));
    }
    out
}

fn truncate(mut rankings: Vec<YearRanking>, top: Option<usize>) -> Vec<YearRanking> {
    if let Some(n) = top {
        for r in &mut rankings {
            r.players.truncate(n);
        }
    }
    rankings
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            input,
            db,
            dataset,
            years,
            config,
            json,
            top,
        } => {
            let model = load_model_config(config.as_deref())?;
            let source = CohortSource::from_args(input, db, dataset)?;
            let cohort = source.load()?;
            let years = prediction_years(&years, chrono::Local::now().year());

            let rankings = score_years(Arc::new(cohort), Arc::new(model), &years).await?;

            if json {
                let rankings = truncate(rankings, top);
                let text = serde_json::to_string_pretty(&rankings)
                    .context("failed to serialize rankings")?;
                println!("{text}");
            } else {
                for (i, ranking) in rankings.iter().enumerate() {
                    if i > 0 {
                        println!();
                    }
                    print!("{}", render_table(ranking, top));
                }
            }
        }

        Commands::Import { input, db, dataset } => {
            let records = ingest::load_cohort_file(&input)
                .with_context(|| format!("failed to load cohort from {}", input.display()))?;
            let store = open_store(&db)?;
            store
                .save_cohort(&dataset, &records)
                .with_context(|| format!("failed to save dataset {dataset}"))?;
            println!("Imported {} records into dataset {}", records.len(), dataset);
        }

        Commands::Datasets { db } => {
            let store = open_store(&db)?;
            for name in store.list_datasets()? {
                println!("{name}");
            }
        }
    }

    Ok(())
}

/// Initialize tracing on stderr so stdout stays clean for output.
fn init_tracing() -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("breakout=info,breakout_engine=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
