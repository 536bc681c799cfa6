// Library root: re-exports all modules so integration tests and the CLI
// can access the crate's public API.

pub mod config;
pub mod ingest;
pub mod record;
pub mod scoring;

pub use config::ModelConfig;
pub use record::PlayerRecord;
pub use scoring::{score_cohort, RankedPlayer};
