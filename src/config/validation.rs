//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility checks on calibration values.
//!
//! Raw TOML is first parsed into `toml::Value` and its key tree compared
//! against the known field names, producing "did you mean?" warnings.
//! Serde deserialization runs afterwards. Warnings never reject a config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

const THRESHOLD_FIELDS: [&str; 4] = ["down_enter", "down_exit", "up_enter", "up_exit"];

/// Returns the complete set of valid dotted key paths for `CoachConfig`.
///
/// Maintained by hand alongside coach_config.rs.
pub fn known_config_keys() -> HashSet<String> {
    let sections: &[(&str, &[&str])] = &[
        (
            "filter",
            &[
                "buffer_capacity",
                "velocity_history",
                "confidence_floor",
                "outlier_jump",
                "assumed_fps",
            ],
        ),
        (
            "physics",
            &[
                "body_height_m",
                "reference_shoulder_width",
                "depth_min",
                "depth_max",
                "gravity",
                "target_velocity",
            ],
        ),
        ("visibility", &["required_floor"]),
        (
            "rep_counter",
            &[
                "transition_frames",
                "min_rep_ms",
                "max_rep_ms",
                "rep_cooldown_ms",
                "ideal_rep_ms",
                "valid_quality",
                "squats",
                "pushups",
                "lunges",
            ],
        ),
        (
            "feedback",
            &[
                "high_cooldown_ms",
                "medium_cooldown_ms",
                "low_cooldown_ms",
                "positive_cooldown_ms",
                "mistake_repeat_ms",
                "escalation_count",
            ],
        ),
        (
            "adaptive",
            &[
                "window",
                "min_samples",
                "fatigue_window",
                "fatigue_drop",
                "fatigue_severity_gain",
                "injury_min_samples",
                "rom_excess_ratio",
                "rom_risk",
                "tempo_ratio",
                "tempo_risk",
                "fatigue_risk_weight",
                "default_form_threshold",
                "default_rom_threshold",
                "default_tempo_threshold",
            ],
        ),
    ];

    let mut keys = HashSet::new();
    for (section, fields) in sections {
        keys.insert((*section).to_string());
        for field in *fields {
            keys.insert(format!("{section}.{field}"));
        }
    }
    for exercise in ["squats", "pushups", "lunges"] {
        for field in THRESHOLD_FIELDS {
            keys.insert(format!("rep_counter.{exercise}.{field}"));
        }
    }
    keys
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Dotted paths of every key in a parsed config file, sections included,
/// sorted so warnings come out in a stable order.
///
/// `[rep_counter.squats] down_enter = 135.0` yields `rep_counter`,
/// `rep_counter.squats` and `rep_counter.squats.down_enter`. Values that are
/// not tables (arrays included) are treated as leaves.
pub fn config_key_paths(root: &toml::Value) -> Vec<String> {
    let Some(table) = root.as_table() else {
        return Vec::new();
    };
    let mut paths = Vec::new();
    let mut pending: Vec<(String, &toml::Table)> = vec![(String::new(), table)];
    while let Some((section, table)) = pending.pop() {
        for (key, value) in table {
            let path = if section.is_empty() {
                key.clone()
            } else {
                format!("{section}.{key}")
            };
            if let Some(nested) = value.as_table() {
                pending.push((path.clone(), nested));
            }
            paths.push(path);
        }
    }
    paths.sort();
    paths
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<String>) -> Option<String> {
    known
        .iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by(|(ka, da), (kb, db)| da.cmp(db).then_with(|| ka.cmp(kb)))
        .map(|(k, _)| k.clone())
}

// ============================================================================
// Unknown Key Validation
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Parse errors yield no warnings here; serde reports them afterwards.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    config_key_paths(&value)
        .into_iter()
        .filter(|key| !known.contains(key))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Plausibility
// ============================================================================

/// Flag calibration values that parse and validate but look implausible.
pub fn validate_physical_ranges(config: &super::CoachConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut check = |field: &str, value: f64, lo: f64, hi: f64, unit: &str| {
        if value.is_finite() && !(lo..=hi).contains(&value) {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                message: format!("{field} = {value:.2} is outside typical range ({lo}-{hi} {unit})"),
                suggestion: None,
            });
        }
    };

    check("physics.body_height_m", config.physics.body_height_m, 1.0, 2.3, "m");
    check("filter.assumed_fps", config.filter.assumed_fps, 10.0, 120.0, "fps");
    check("physics.target_velocity", config.physics.target_velocity, 0.1, 2.0, "m/s");
    check("physics.gravity", config.physics.gravity, 9.7, 9.9, "m/s²");
    check(
        "rep_counter.ideal_rep_ms",
        config.rep_counter.ideal_rep_ms as f64,
        500.0,
        6000.0,
        "ms",
    );

    for (name, t) in [
        ("rep_counter.squats", config.rep_counter.squats),
        ("rep_counter.pushups", config.rep_counter.pushups),
        ("rep_counter.lunges", config.rep_counter.lunges),
    ] {
        check(&format!("{name}.down_enter"), t.down_enter, 30.0, 180.0, "deg");
        check(&format!("{name}.up_enter"), t.up_enter, 30.0, 180.0, "deg");
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("window", "window"), 0);
        assert_eq!(levenshtein("windw", "window"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_config_key_paths_include_sections_and_leaves() {
        let toml: toml::Value = r#"
            [rep_counter]
            min_rep_ms = 250
            [rep_counter.squats]
            down_enter = 135.0
            [visibility]
            required_floor = 0.7
        "#
        .parse()
        .unwrap();
        assert_eq!(
            config_key_paths(&toml),
            vec![
                "rep_counter",
                "rep_counter.min_rep_ms",
                "rep_counter.squats",
                "rep_counter.squats.down_enter",
                "visibility",
                "visibility.required_floor",
            ]
        );
    }

    #[test]
    fn test_config_key_paths_of_scalar_is_empty() {
        assert!(config_key_paths(&toml::Value::Integer(3)).is_empty());
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[feedback]
low_coldown_ms = 7000
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "feedback.low_coldown_ms");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("feedback.low_cooldown_ms")
        );
    }

    #[test]
    fn test_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[filter]
buffer_capacity = 12

[rep_counter.pushups]
down_enter = 100.0
down_exit = 115.0
up_enter = 150.0
up_exit = 140.0

[adaptive]
window = 20
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {warnings:?}");
    }

    #[test]
    fn test_unknown_section_without_close_match() {
        let warnings = validate_unknown_keys("[nutrition]\ncalories = 2000\n");
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.suggestion.is_none()));
    }

    #[test]
    fn test_known_keys_cover_every_default_field() {
        let raw = crate::config::CoachConfig::default().to_toml().unwrap();
        let warnings = validate_unknown_keys(&raw);
        assert!(
            warnings.is_empty(),
            "Serialized defaults must only contain known keys: {warnings:?}"
        );
    }

    #[test]
    fn test_physical_ranges_defaults_clean() {
        let config = crate::config::CoachConfig::default();
        let warnings = validate_physical_ranges(&config);
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {warnings:?}");
    }

    #[test]
    fn test_physical_range_body_height_suspicious() {
        let mut config = crate::config::CoachConfig::default();
        config.physics.body_height_m = 4.0;
        let warnings = validate_physical_ranges(&config);
        assert!(warnings.iter().any(|w| w.field == "physics.body_height_m"));
    }
}
