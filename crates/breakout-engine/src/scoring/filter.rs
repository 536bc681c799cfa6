// Cohort filter: drop pitchers and already-established hitters.

use tracing::debug;

use crate::config::FilterConfig;
use crate::record::{representative_woba, PlayerRecord};

/// True if the primary position (the first of a `/`- or `,`-separated list)
/// marks a pitcher.
pub fn is_pitcher(position: &str, cfg: &FilterConfig) -> bool {
    let primary = position
        .split(['/', ','])
        .next()
        .unwrap_or("")
        .trim()
        .to_uppercase();
    cfg.pitcher_tokens.iter().any(|t| primary.contains(t.as_str()))
        || cfg.pitcher_exact.iter().any(|p| primary == *p)
}

/// True if the player is already a proven hitter and therefore not a breakout
/// candidate. Young players on a limited sample are kept regardless of wOBA,
/// and an unknown wOBA never excludes anyone.
pub fn is_established_star(record: &PlayerRecord, prediction_year: i32, cfg: &FilterConfig) -> bool {
    let Some(woba) = representative_woba(record, prediction_year) else {
        return false;
    };
    if woba <= cfg.established_woba {
        return false;
    }
    let young = record.age.is_some_and(|age| age < cfg.young_age_limit);
    let limited_sample = record.pa.map_or(true, |pa| pa < cfg.limited_sample_pa);
    !(young && limited_sample)
}

/// Apply both exclusion rules, preserving input order.
pub fn filter_cohort<'a>(
    records: &'a [PlayerRecord],
    prediction_year: i32,
    cfg: &FilterConfig,
) -> Vec<&'a PlayerRecord> {
    let mut pitchers = 0usize;
    let mut stars = 0usize;

    let kept: Vec<&PlayerRecord> = records
        .iter()
        .filter(|r| {
            if is_pitcher(&r.position, cfg) {
                pitchers += 1;
                return false;
            }
            if is_established_star(r, prediction_year, cfg) {
                stars += 1;
                return false;
            }
            true
        })
        .collect();

    debug!(
        total = records.len(),
        kept = kept.len(),
        pitchers,
        stars,
        "cohort filtered"
    );
    kept
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn hitter(position: &str, age: Option<u32>, pa: Option<u32>, woba: Option<f64>) -> PlayerRecord {
        PlayerRecord {
            name: "Test".into(),
            team: "TST".into(),
            position: position.into(),
            age,
            pa,
            woba,
            ..Default::default()
        }
    }

    #[test]
    fn pitchers_are_detected() {
        let cfg = FilterConfig::default();
        assert!(is_pitcher("SP", &cfg));
        assert!(is_pitcher("RP", &cfg));
        assert!(is_pitcher("P", &cfg));
        assert!(is_pitcher("sp/rp", &cfg));
        assert!(!is_pitcher("SS", &cfg));
        assert!(!is_pitcher("1B/DH", &cfg));
        assert!(!is_pitcher("DH/P", &cfg));
    }

    #[test]
    fn starting_pitcher_always_excluded() {
        let cfg = FilterConfig::default();
        let records = vec![hitter("SP", Some(22), Some(10), None)];
        assert!(filter_cohort(&records, 2026, &cfg).is_empty());
    }

    #[test]
    fn young_limited_sample_star_is_retained() {
        let cfg = FilterConfig::default();
        let rec = hitter("CF", Some(23), Some(350), Some(0.400));
        assert!(!is_established_star(&rec, 2026, &cfg));
    }

    #[test]
    fn established_star_is_excluded() {
        let cfg = FilterConfig::default();
        let rec = hitter("RF", Some(26), Some(500), Some(0.400));
        assert!(is_established_star(&rec, 2026, &cfg));
    }

    #[test]
    fn young_but_full_sample_star_is_excluded() {
        let cfg = FilterConfig::default();
        let rec = hitter("SS", Some(22), Some(600), Some(0.380));
        assert!(is_established_star(&rec, 2026, &cfg));
    }

    #[test]
    fn unknown_woba_fails_open() {
        let cfg = FilterConfig::default();
        let rec = hitter("C", Some(31), Some(600), None);
        assert!(!is_established_star(&rec, 2026, &cfg));
    }

    #[test]
    fn threshold_is_strict() {
        let cfg = FilterConfig::default();
        let rec = hitter("2B", Some(29), Some(600), Some(0.350));
        assert!(!is_established_star(&rec, 2026, &cfg));
    }

    #[test]
    fn filter_preserves_order() {
        let cfg = FilterConfig::default();
        let mut a = hitter("1B", Some(27), Some(500), Some(0.320));
        a.name = "A".into();
        let mut b = hitter("RP", Some(27), Some(0), None);
        b.name = "B".into();
        let mut c = hitter("LF", Some(25), Some(450), Some(0.300));
        c.name = "C".into();
        let records = vec![a, b, c];
        let kept: Vec<&str> = filter_cohort(&records, 2026, &cfg)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(kept, vec!["A", "C"]);
    }
}
