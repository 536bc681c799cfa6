// Integration tests for the breakout engine.
//
// These exercise the public API end to end: cohort loading from the CSV and
// JSON fixtures, the SQLite store, configuration defaults, and the scoring
// pipeline's cohort-level guarantees (relativity, determinism, monotonicity,
// filtering, multiplier tables and ranking order).

use std::path::Path;

use breakout_engine::config::{self, FeatureWeights, ModelConfig};
use breakout_engine::ingest::sqlite::HistoricalStore;
use breakout_engine::ingest::{self, CohortError};
use breakout_engine::record::{PlayerRecord, PriorSeason};
use breakout_engine::scoring::adjust::{age_multiplier, sample_size_multiplier};
use breakout_engine::scoring::features::Feature;
use breakout_engine::scoring::normalize::{normalize_feature, NEUTRAL_SCORE};
use breakout_engine::scoring::rank::QualityTier;
use breakout_engine::{score_cohort, RankedPlayer};

// ===========================================================================
// Test helpers
// ===========================================================================

/// Fixture directory path (relative to the package root, which is the cwd
/// for `cargo test`).
const FIXTURES: &str = "tests/fixtures";

const YEAR: i32 = 2026;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn hitter(name: &str, age: u32, pa: u32) -> PlayerRecord {
    PlayerRecord {
        name: name.to_string(),
        team: "TST".to_string(),
        position: "OF".to_string(),
        age: Some(age),
        pa: Some(pa),
        ..Default::default()
    }
}

fn names(ranked: &[RankedPlayer]) -> Vec<&str> {
    ranked.iter().map(|p| p.record.name.as_str()).collect()
}

fn find<'a>(ranked: &'a [RankedPlayer], name: &str) -> &'a RankedPlayer {
    ranked
        .iter()
        .find(|p| p.record.name == name)
        .unwrap_or_else(|| panic!("{name} should be ranked"))
}

/// Player A: every feature at the cohort maximum.
fn player_a() -> PlayerRecord {
    PlayerRecord {
        hard_hit_rate: Some(0.55),
        barrel_rate: Some(0.12),
        k_rate: Some(0.15),
        chase_rate: Some(0.22),
        bat_speed: Some(75.0),
        xwoba: Some(0.370),
        woba: Some(0.340),
        prior: PriorSeason {
            hard_hit_rate: Some(0.50),
            barrel_rate: Some(0.09),
            k_rate: Some(0.17),
            chase_rate: Some(0.25),
            ..Default::default()
        },
        ..hitter("Player A", 25, 600)
    }
}

/// Player B: every feature at the cohort minimum.
fn player_b() -> PlayerRecord {
    PlayerRecord {
        hard_hit_rate: Some(0.35),
        barrel_rate: Some(0.04),
        k_rate: Some(0.32),
        chase_rate: Some(0.35),
        bat_speed: Some(68.0),
        xwoba: Some(0.290),
        woba: Some(0.310),
        prior: PriorSeason {
            hard_hit_rate: Some(0.37),
            barrel_rate: Some(0.05),
            k_rate: Some(0.25),
            chase_rate: Some(0.34),
            ..Default::default()
        },
        ..hitter("Player B", 33, 150)
    }
}

// ===========================================================================
// Configuration
// ===========================================================================

#[test]
fn default_weights_sum_to_one() {
    let weights = ModelConfig::default().weights;
    assert!((weights.sum() - 1.0).abs() < config::WEIGHT_SUM_TOLERANCE);
    for f in Feature::ALL {
        assert!(weights.weight(f) > 0.0, "{} has no weight", f.name());
    }
}

#[test]
fn custom_weights_change_the_ranking() {
    let mut slugger = hitter("Slugger", 27, 550);
    slugger.hard_hit_rate = Some(0.50);
    slugger.barrel_rate = Some(0.06);
    let mut barreler = hitter("Barreler", 27, 550);
    barreler.hard_hit_rate = Some(0.38);
    barreler.barrel_rate = Some(0.12);

    let cfg = ModelConfig {
        weights: FeatureWeights {
            hard_hit_rate: 0.0,
            barrel_rate: 1.0,
            bat_speed: 0.0,
            barrel_improvement: 0.0,
            hard_hit_improvement: 0.0,
            chase_improvement: 0.0,
            k_rate_inverse: 0.0,
            chase_rate_inverse: 0.0,
            xwoba_surplus: 0.0,
            xwoba_level: 0.0,
        },
        ..Default::default()
    };
    config::validate(&cfg).expect("barrel-only weights are valid");

    let ranked = score_cohort(&[slugger, barreler], YEAR, &cfg);
    assert_eq!(names(&ranked), vec!["Barreler", "Slugger"]);
    assert_eq!(ranked[1].breakout_score, 0);
}

// ===========================================================================
// Normalization
// ===========================================================================

#[test]
fn normalized_scores_stay_in_bounds_with_neutral_nulls() {
    let values = [Some(0.31), None, Some(0.58), Some(0.44), Some(0.31), None];
    let scores = normalize_feature(&values).unwrap();
    assert_eq!(scores.len(), values.len());
    for s in &scores {
        assert!((0.0..=100.0).contains(s));
    }
    assert_eq!(scores[0], 0.0);
    assert_eq!(scores[2], 100.0);
    assert_eq!(scores[1], NEUTRAL_SCORE);
    assert_eq!(scores[5], NEUTRAL_SCORE);
}

#[test]
fn normalization_is_cohort_relative() {
    let mut target = hitter("Target", 27, 550);
    target.hard_hit_rate = Some(0.45);

    let mut weak = hitter("Weak", 27, 550);
    weak.hard_hit_rate = Some(0.30);
    let mut strong = hitter("Strong", 27, 550);
    strong.hard_hit_rate = Some(0.60);

    let cfg = ModelConfig::default();
    let with_weak = score_cohort(&[target.clone(), weak], YEAR, &cfg);
    let with_strong = score_cohort(&[target, strong], YEAR, &cfg);

    let a = find(&with_weak, "Target").normalized.get(Feature::HardHitRate);
    let b = find(&with_strong, "Target").normalized.get(Feature::HardHitRate);
    assert_eq!(a, Some(100.0));
    assert_eq!(b, Some(0.0));
}

// ===========================================================================
// Scoring guarantees
// ===========================================================================

#[test]
fn scoring_is_deterministic() {
    let cohort = ingest::load_cohort_file(&Path::new(FIXTURES).join("cohort.csv")).unwrap();
    let cfg = ModelConfig::default();
    let first = score_cohort(&cohort, YEAR, &cfg);
    let second = score_cohort(&cohort, YEAR, &cfg);
    assert_eq!(first, second);
}

#[test]
fn raising_one_feature_never_lowers_the_score() {
    let make = |hard_hit: f64| {
        let mut low = hitter("Low", 27, 550);
        low.hard_hit_rate = Some(0.30);
        let mut mid = hitter("Mid", 27, 550);
        mid.hard_hit_rate = Some(hard_hit);
        let mut high = hitter("High", 27, 550);
        high.hard_hit_rate = Some(0.60);
        vec![low, mid, high]
    };

    let cfg = ModelConfig::default();
    let mut last = i32::MIN;
    for hh in [0.40, 0.42, 0.44, 0.46, 0.48, 0.50] {
        let ranked = score_cohort(&make(hh), YEAR, &cfg);
        let score = find(&ranked, "Mid").breakout_score;
        assert!(score >= last, "score fell from {last} to {score} at hard-hit {hh}");
        last = score;
    }
}

#[test]
fn filter_cases() {
    let mut pitcher = hitter("Starter", 27, 10);
    pitcher.position = "SP".to_string();

    let mut young_star = hitter("Young Star", 23, 350);
    young_star.woba = Some(0.400);

    let mut veteran_star = hitter("Veteran Star", 26, 500);
    veteran_star.woba = Some(0.400);

    let ranked = score_cohort(&[pitcher, young_star, veteran_star], YEAR, &ModelConfig::default());
    assert_eq!(names(&ranked), vec!["Young Star"]);
}

#[test]
fn multiplier_tables_are_exact() {
    let cfg = ModelConfig::default().adjustments;
    let ages = [(21, 1.15), (23, 1.15), (24, 1.25), (25, 1.25), (27, 1.00), (28, 1.00), (29, 0.85), (30, 0.85), (31, 0.70), (33, 0.70)];
    for (age, expected) in ages {
        assert_eq!(age_multiplier(Some(age), &cfg), expected, "age {age}");
    }
    assert_eq!(age_multiplier(None, &cfg), 1.00);

    let samples = [(600, 1.00), (500, 1.00), (499, 0.95), (350, 0.95), (250, 0.85), (200, 0.85), (175, 0.75), (150, 0.75), (149, 0.60), (80, 0.60)];
    for (pa, expected) in samples {
        assert_eq!(sample_size_multiplier(Some(pa), &cfg), expected, "pa {pa}");
    }
    assert_eq!(sample_size_multiplier(None, &cfg), 0.60);
}

#[test]
fn end_to_end_two_player_scenario() {
    let ranked = score_cohort(&[player_b(), player_a()], YEAR, &ModelConfig::default());
    assert_eq!(names(&ranked), vec!["Player A", "Player B"]);

    let a = find(&ranked, "Player A");
    let b = find(&ranked, "Player B");

    for f in Feature::ALL {
        assert_eq!(a.normalized.get(f), Some(100.0), "A {}", f.name());
        assert_eq!(b.normalized.get(f), Some(0.0), "B {}", f.name());
    }

    assert!(approx_eq(a.factors.raw_score, 100.0));
    assert_eq!(a.factors.raw_score_rounded, 100);
    assert_eq!(a.factors.age, 1.25);
    assert_eq!(a.factors.sample_size, 1.00);
    assert!(a.factors.elite > 1.0);
    let fired: Vec<&str> = a.factors.elite_rules.iter().map(|r| r.name).collect();
    for rule in ["elite_hard_hit", "elite_barrel", "elite_bat_speed", "elite_contact", "all_skills"] {
        assert!(fired.contains(&rule), "{rule} should fire for A");
    }
    assert_eq!(a.quality_tier, QualityTier::Elite);

    assert!(approx_eq(b.factors.raw_score, 0.0));
    assert_eq!(b.factors.age, 0.70);
    assert_eq!(b.factors.sample_size, 0.75);
    assert_eq!(b.breakout_score, 0);
    assert!(a.breakout_score > b.breakout_score);
}

#[test]
fn ties_keep_input_order() {
    let cohort: Vec<PlayerRecord> = ["First", "Second", "Third"]
        .into_iter()
        .map(|n| hitter(n, 27, 550))
        .collect();
    let ranked = score_cohort(&cohort, YEAR, &ModelConfig::default());

    assert_eq!(names(&ranked), vec!["First", "Second", "Third"]);
    let ranks: Vec<usize> = ranked.iter().map(|p| p.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert!(ranked.iter().all(|p| p.breakout_score == 50));
}

#[test]
fn retained_young_star_earns_young_talent_bonus() {
    let mut phenom = hitter("Phenom", 22, 280);
    phenom.woba = Some(0.385);
    phenom.hard_hit_rate = Some(0.57);
    phenom.barrel_rate = Some(0.15);

    let mut other = hitter("Other", 27, 520);
    other.hard_hit_rate = Some(0.40);
    other.barrel_rate = Some(0.07);

    let ranked = score_cohort(&[other, phenom], YEAR, &ModelConfig::default());
    let phenom = find(&ranked, "Phenom");
    let bonus = phenom
        .factors
        .elite_rules
        .iter()
        .find(|r| r.name == "young_talent")
        .expect("young_talent should fire");
    assert_eq!(bonus.multiplier, 1.30);
}

// ===========================================================================
// Fixture cohorts
// ===========================================================================

#[test]
fn csv_fixture_scores_end_to_end() {
    let cohort = ingest::load_cohort_file(&Path::new(FIXTURES).join("cohort.csv")).unwrap();
    assert_eq!(cohort.len(), 8);

    let ranked = score_cohort(&cohort, YEAR, &ModelConfig::default());
    assert_eq!(ranked.len(), 5);

    let listed = names(&ranked);
    for excluded in ["Ace Starter", "Relief Arm", "Established Star"] {
        assert!(!listed.contains(&excluded), "{excluded} should be filtered");
    }

    let mut top_two = listed[..2].to_vec();
    top_two.sort_unstable();
    assert_eq!(top_two, vec!["Rising Outfielder", "Young Phenom"]);
    assert_eq!(listed.last().copied(), Some("Struggling Slugger"));

    let ranks: Vec<usize> = ranked.iter().map(|p| p.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    assert!(ranked.windows(2).all(|w| w[0].breakout_score >= w[1].breakout_score));

    let slugger = find(&ranked, "Struggling Slugger");
    assert!(slugger
        .factors
        .elite_rules
        .iter()
        .any(|r| r.name == "k_rate_explosion"));
    assert!(slugger.advisory.k_rate_risk.is_some());
}

#[test]
fn json_fixture_matches_csv_fixture() {
    let from_csv = ingest::load_cohort_file(&Path::new(FIXTURES).join("cohort.csv")).unwrap();
    let from_json = ingest::load_cohort_file(&Path::new(FIXTURES).join("cohort.json")).unwrap();
    assert_eq!(from_csv.len(), from_json.len());

    let cfg = ModelConfig::default();
    let csv_ranked = score_cohort(&from_csv, YEAR, &cfg);
    let json_ranked = score_cohort(&from_json, YEAR, &cfg);
    assert_eq!(names(&csv_ranked), names(&json_ranked));
    for (c, j) in csv_ranked.iter().zip(&json_ranked) {
        assert!((c.breakout_score - j.breakout_score).abs() <= 1);
    }
}

#[test]
fn fixture_year_lines_feed_trajectory() {
    let cohort = ingest::load_cohort_file(&Path::new(FIXTURES).join("cohort.csv")).unwrap();
    let ranked = score_cohort(&cohort, YEAR, &ModelConfig::default());
    let rising = find(&ranked, "Rising Outfielder");
    // 2025 falls back to the flat xwOBA (.362); 2024 comes from the year column (.320).
    assert!(approx_eq(rising.advisory.xwoba_trajectory.unwrap(), 0.362 - 0.320));
}

#[test]
fn malformed_json_cohort_fails_fast() {
    let err = ingest::json::parse_cohort(r#"{"players": []}"#).unwrap_err();
    assert!(matches!(err, CohortError::NotASequence { .. }));
}

#[test]
fn stored_dataset_scores_like_the_file() {
    let cohort = ingest::load_cohort_file(&Path::new(FIXTURES).join("cohort.csv")).unwrap();
    let store = HistoricalStore::open(":memory:").unwrap();
    store.save_cohort("fixture", &cohort).unwrap();
    let loaded = store.load_cohort("fixture").unwrap();
    assert_eq!(loaded, cohort);

    let cfg = ModelConfig::default();
    assert_eq!(score_cohort(&loaded, YEAR, &cfg), score_cohort(&cohort, YEAR, &cfg));
}

#[test]
fn empty_input_degrades_gracefully() {
    assert!(score_cohort(&[], YEAR, &ModelConfig::default()).is_empty());

    let mut only_pitchers = hitter("Closer", 29, 0);
    only_pitchers.position = "RP".to_string();
    assert!(score_cohort(&[only_pitchers], YEAR, &ModelConfig::default()).is_empty());
}
