// JSON cohort parsing.
//
// Input is a top-level array of player objects. Keys are accepted in
// camelCase or snake_case. Numeric fields are lenient (numbers, numeric
// strings, null); a value of any other shape is read as unknown. The
// structural checks are strict: the cohort must be an array and every
// element must carry string identity fields.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::ingest::{as_count, season_key, CohortError, SeasonStat};
use crate::record::{finite, PlayerRecord, PriorSeason, SeasonLine};

type Object = Map<String, Value>;

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn lenient_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    finite(n)
}

/// First key from `keys` present in `obj`, read as a lenient number.
fn number(obj: &Object, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .and_then(lenient_number)
}

/// Rate fields are fractions (0.452) and are taken as given.
fn rate(obj: &Object, keys: &[&str]) -> Option<f64> {
    number(obj, keys)
}

fn required_string(obj: &Object, keys: &[&str], index: usize) -> Result<String, CohortError> {
    match keys.iter().find_map(|k| obj.get(*k)) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(CohortError::InvalidRecord {
            index,
            message: format!("`{}` must be a string, got {}", keys[0], kind_of(other)),
        }),
        None => Err(CohortError::InvalidRecord {
            index,
            message: format!("missing `{}`", keys[0]),
        }),
    }
}

fn parse_prior(obj: &Object) -> PriorSeason {
    // Nested `prior` object wins; flat `prev*` keys are the fallback.
    let nested = obj.get("prior").and_then(Value::as_object);
    let pick = |nested_keys: &[&str], flat_keys: &[&str]| {
        nested
            .and_then(|p| number(p, nested_keys))
            .or_else(|| number(obj, flat_keys))
    };
    let pick_rate = |nested_keys: &[&str], flat_keys: &[&str]| pick(nested_keys, flat_keys);

    PriorSeason {
        hard_hit_rate: pick_rate(
            &["hardHitRate", "hard_hit_rate"],
            &["prevHardHitRate", "prev_hard_hit_rate"],
        ),
        barrel_rate: pick_rate(
            &["barrelRate", "barrel_rate"],
            &["prevBarrelRate", "prev_barrel_rate"],
        ),
        k_rate: pick_rate(&["kRate", "k_rate"], &["prevKRate", "prev_k_rate"]),
        chase_rate: pick_rate(
            &["chaseRate", "chase_rate"],
            &["prevChaseRate", "prev_chase_rate"],
        ),
        launch_angle: pick(
            &["launchAngle", "launch_angle"],
            &["prevLaunchAngle", "prev_launch_angle"],
        ),
        xwoba: pick(&["xwoba", "xwOBA"], &["prevXwoba", "prev_xwoba"]),
        woba: pick(&["woba", "wOBA"], &["prevWoba", "prev_woba"]),
    }
}

fn parse_seasons(obj: &Object) -> BTreeMap<i32, SeasonLine> {
    let mut seasons: BTreeMap<i32, SeasonLine> = BTreeMap::new();

    if let Some(map) = obj.get("seasons").and_then(Value::as_object) {
        for (year, line) in map {
            let (Ok(year), Some(line)) = (year.trim().parse::<i32>(), line.as_object()) else {
                continue;
            };
            let entry = seasons.entry(year).or_default();
            entry.woba = number(line, &["woba", "wOBA"]);
            entry.xwoba = number(line, &["xwoba", "xwOBA"]);
        }
    }

    // Year-suffixed keys (`woba_2025`, `xwOBA24`) fill whatever the
    // `seasons` map left unset.
    for (key, value) in obj {
        let Some((stat, year)) = season_key(key) else {
            continue;
        };
        let Some(v) = lenient_number(value) else {
            continue;
        };
        let entry = seasons.entry(year).or_default();
        let slot = match stat {
            SeasonStat::Woba => &mut entry.woba,
            SeasonStat::Xwoba => &mut entry.xwoba,
        };
        slot.get_or_insert(v);
    }

    seasons.retain(|_, line| line.woba.is_some() || line.xwoba.is_some());
    seasons
}

fn parse_record(index: usize, value: &Value) -> Result<PlayerRecord, CohortError> {
    let obj = value.as_object().ok_or_else(|| CohortError::InvalidRecord {
        index,
        message: format!("expected an object, got {}", kind_of(value)),
    })?;

    Ok(PlayerRecord {
        name: required_string(obj, &["name"], index)?,
        team: required_string(obj, &["team"], index)?,
        position: required_string(obj, &["position", "pos"], index)?,
        age: as_count(number(obj, &["age"])),
        pa: as_count(number(obj, &["pa", "PA", "plateAppearances", "plate_appearances"])),
        xwoba: number(obj, &["xwoba", "xwOBA"]),
        woba: number(obj, &["woba", "wOBA"]),
        hard_hit_rate: rate(obj, &["hardHitRate", "hard_hit_rate"]),
        barrel_rate: rate(obj, &["barrelRate", "barrel_rate"]),
        k_rate: rate(obj, &["kRate", "k_rate"]),
        chase_rate: rate(obj, &["chaseRate", "chase_rate"]),
        pull_rate: rate(obj, &["pullRate", "pull_rate"]),
        bat_speed: number(obj, &["batSpeed", "bat_speed"]),
        launch_angle: number(obj, &["launchAngle", "launch_angle"]),
        prior: parse_prior(obj),
        seasons: parse_seasons(obj),
        career_woba: number(obj, &["careerWoba", "career_woba"]),
        years_of_service: as_count(number(obj, &["yearsOfService", "years_of_service", "service"])),
    })
}

/// Parse a cohort from JSON text.
///
/// Fails fast when the top level is not an array or an element is not a
/// player object; never fails on a bad numeric value.
pub fn parse_cohort(text: &str) -> Result<Vec<PlayerRecord>, CohortError> {
    let root: Value = serde_json::from_str(text)?;
    let items = match root {
        Value::Array(items) => items,
        other => {
            return Err(CohortError::NotASequence {
                found: kind_of(&other),
            })
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_record(index, item))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_record() {
        let text = r#"[{
            "name": "Test Hitter", "team": "TST", "position": "SS",
            "age": 24, "pa": 512,
            "xwoba": 0.341, "woba": 0.322,
            "hardHitRate": 0.46, "barrelRate": 0.11, "kRate": 0.21,
            "chaseRate": 0.27, "pullRate": 0.41, "batSpeed": 73.2,
            "launchAngle": 14.5,
            "prior": { "hardHitRate": 0.41, "kRate": 0.24, "launchAngle": 10.0 },
            "careerWoba": 0.315, "yearsOfService": 2
        }]"#;
        let records = parse_cohort(text).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.position, "SS");
        assert_eq!(r.age, Some(24));
        assert_eq!(r.pa, Some(512));
        assert_eq!(r.hard_hit_rate, Some(0.46));
        assert_eq!(r.bat_speed, Some(73.2));
        assert_eq!(r.prior.hard_hit_rate, Some(0.41));
        assert_eq!(r.prior.launch_angle, Some(10.0));
        assert_eq!(r.prior.barrel_rate, None);
        assert_eq!(r.career_woba, Some(0.315));
        assert_eq!(r.years_of_service, Some(2));
    }

    #[test]
    fn snake_case_and_flat_prior_keys() {
        let text = r#"[{
            "name": "Snake", "team": "TST", "pos": "1B",
            "hard_hit_rate": 0.40, "prev_hard_hit_rate": 0.35, "prev_k_rate": 0.2
        }]"#;
        let r = &parse_cohort(text).unwrap()[0];
        assert_eq!(r.position, "1B");
        assert_eq!(r.hard_hit_rate, Some(0.40));
        assert_eq!(r.prior.hard_hit_rate, Some(0.35));
        assert_eq!(r.prior.k_rate, Some(0.2));
    }

    #[test]
    fn lenient_numbers() {
        let text = r#"[{
            "name": "Lenient", "team": "TST", "position": "C",
            "age": "27", "pa": null, "hardHitRate": "n/a", "barrelRate": [1],
            "batSpeed": " 71.5 "
        }]"#;
        let r = &parse_cohort(text).unwrap()[0];
        assert_eq!(r.age, Some(27));
        assert_eq!(r.pa, None);
        assert_eq!(r.hard_hit_rate, None);
        assert_eq!(r.barrel_rate, None);
        assert_eq!(r.bat_speed, Some(71.5));
    }

    #[test]
    fn seasons_map_and_year_suffixed_keys() {
        let text = r#"[{
            "name": "Years", "team": "TST", "position": "CF",
            "seasons": { "2025": { "woba": 0.330, "xwoba": 0.352 } },
            "woba_2024": 0.301, "xwOBA_2024": 0.318, "woba_2025": 0.999
        }]"#;
        let r = &parse_cohort(text).unwrap()[0];
        assert_eq!(r.seasons.len(), 2);
        // The explicit map wins over a suffixed key for the same year.
        assert_eq!(r.seasons[&2025].woba, Some(0.330));
        assert_eq!(r.seasons[&2024].xwoba, Some(0.318));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let text = r#"[{ "name": "X", "team": "T", "position": "LF", "sprintSpeed": 29.1, "notes": {"a": 1} }]"#;
        assert_eq!(parse_cohort(text).unwrap().len(), 1);
    }

    #[test]
    fn non_array_top_level_fails_fast() {
        let err = parse_cohort(r#"{"name": "X"}"#).unwrap_err();
        assert!(matches!(err, CohortError::NotASequence { found: "an object" }));

        let err = parse_cohort("42").unwrap_err();
        assert!(matches!(err, CohortError::NotASequence { found: "a number" }));
    }

    #[test]
    fn non_object_element_is_invalid() {
        let err = parse_cohort(r#"[{"name": "A", "team": "T", "position": "C"}, 7]"#).unwrap_err();
        match err {
            CohortError::InvalidRecord { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_or_mistyped_identity_is_invalid() {
        let err = parse_cohort(r#"[{"team": "T", "position": "C"}]"#).unwrap_err();
        assert!(matches!(err, CohortError::InvalidRecord { index: 0, .. }));

        let err = parse_cohort(r#"[{"name": 5, "team": "T", "position": "C"}]"#).unwrap_err();
        assert!(err.to_string().contains("`name` must be a string"));
    }

    #[test]
    fn malformed_json_is_json_error() {
        assert!(matches!(parse_cohort("[{"), Err(CohortError::Json(_))));
    }

    #[test]
    fn empty_array_is_empty_cohort() {
        assert!(parse_cohort("[]").unwrap().is_empty());
    }
}
