//! Config Validation Tests
//!
//! TOML loading, typo detection and consistency validation, exercised
//! independently from the analysis pipeline.

use std::io::Write;

use formsense::config::validation::{suggest_correction, known_config_keys, validate_unknown_keys};
use formsense::config::{CoachConfig, ConfigError};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_feedback_section_warns_with_suggestion() {
    let toml_str = r#"
[feedback]
high_coldown_ms = 1500
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("high_coldown_ms"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("feedback.high_cooldown_ms")
    );
}

#[test]
fn typo_in_threshold_table_warns() {
    let toml_str = r#"
[rep_counter.squats]
down_enter = 140.0
down_exit = 150.0
up_enter = 155.0
up_exti = 145.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("rep_counter.squats.up_exit")
    );
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[filter]
buffer_capacity = 12
outlier_jump = 0.2

[visibility]
required_floor = 0.75

[rep_counter]
transition_frames = 3
min_rep_ms = 400

[rep_counter.pushups]
down_enter = 100.0
down_exit = 110.0
up_enter = 150.0
up_exit = 140.0

[adaptive]
window = 40
"#;
    assert!(validate_unknown_keys(toml_str).is_empty());
}

#[test]
fn unrelated_key_gets_no_suggestion() {
    let known = known_config_keys();
    assert!(suggest_correction("completely_unrelated_setting", &known).is_none());
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn partial_file_fills_defaults() {
    let file = write_config(
        r#"
[feedback]
escalation_count = 5
"#,
    );
    let config = CoachConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.feedback.escalation_count, 5);
    assert_eq!(config.feedback.low_cooldown_ms, 6_000);
    assert_eq!(config.filter.buffer_capacity, 10);
    assert_eq!(config.rep_counter.squats, CoachConfig::default().rep_counter.squats);
}

#[test]
fn typo_warns_but_still_loads() {
    let file = write_config(
        r#"
[adaptive]
fatige_window = 4
"#,
    );
    let config = CoachConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.adaptive.fatigue_window, 5);
}

#[test]
fn malformed_toml_is_parse_error() {
    let file = write_config("[filter\nbuffer_capacity = ");
    let err = CoachConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CoachConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}

#[test]
fn save_and_reload_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("formsense.toml");
    let mut config = CoachConfig::default();
    config.rep_counter.transition_frames = 3;
    config.physics.target_velocity = 0.4;
    config.save_to_file(&path).unwrap();

    let reloaded = CoachConfig::load_from_file(&path).unwrap();
    assert_eq!(reloaded, config);
}

// ============================================================================
// Consistency Validation
// ============================================================================

#[test]
fn defaults_validate() {
    assert!(CoachConfig::default().validate().is_ok());
}

#[test]
fn inverted_hysteresis_collects_every_error() {
    let file = write_config(
        r#"
[rep_counter]
min_rep_ms = 20000

[rep_counter.squats]
down_enter = 160.0
down_exit = 150.0
up_enter = 155.0
up_exit = 165.0
"#,
    );
    let err = CoachConfig::load_from_file(file.path()).unwrap_err();
    let ConfigError::Validation(errors) = err else {
        panic!("expected validation error, got {err}");
    };
    assert!(errors.iter().any(|e| e.contains("down_enter") && e.contains("down_exit")));
    assert!(errors.iter().any(|e| e.contains("up_exit") && e.contains("up_enter")));
    assert!(errors.iter().any(|e| e.contains("min_rep_ms")));
    assert!(errors.len() >= 4);
}

#[test]
fn zero_cooldown_rejected() {
    let mut config = CoachConfig::default();
    config.feedback.high_cooldown_ms = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("feedback.high_cooldown_ms"));
}

#[test]
fn non_finite_value_rejected() {
    let mut config = CoachConfig::default();
    config.physics.gravity = f64::NAN;
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
}
