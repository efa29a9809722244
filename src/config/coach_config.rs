//! Coach Configuration - every analysis constant as a tunable TOML value
//!
//! Each section implements `Default` with the values the pipeline was tuned
//! with, so running without a config file changes nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::types::Exercise;

/// Environment variable naming a config file to load first.
pub const CONFIG_ENV_VAR: &str = "FORMSENSE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "formsense.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an analysis session.
///
/// Load with `CoachConfig::load()` which searches:
/// 1. `$FORMSENSE_CONFIG` env var
/// 2. `./formsense.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CoachConfig {
    /// Landmark ring buffer and outlier gate
    #[serde(default)]
    pub filter: FilterConfig,

    /// Calibration constants for velocity/power estimates
    #[serde(default)]
    pub physics: PhysicsConfig,

    /// Required-joint visibility
    #[serde(default)]
    pub visibility: VisibilityConfig,

    /// Rep state machine timing and hysteresis thresholds
    #[serde(default)]
    pub rep_counter: RepCounterConfig,

    /// Delivery cooldowns and fault escalation
    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// Rolling-window learner for fatigue and injury risk
    #[serde(default)]
    pub adaptive: AdaptiveConfig,
}

impl CoachConfig {
    /// Load configuration using the standard search order:
    /// 1. `$FORMSENSE_CONFIG` environment variable
    /// 2. `./formsense.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded coach config from {CONFIG_ENV_VAR}");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {CONFIG_ENV_VAR}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded coach config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file. Unknown keys only warn.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Coach config saved");
        Ok(())
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Every number must be finite
    /// - Hysteresis bands must be ordered (see `PhaseThresholds::check`)
    /// - Cooldowns, windows and buffer sizes must be positive
    /// - `min_rep_ms < max_rep_ms`
    /// - Visibility and confidence floors lie in `0..=1`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        for (name, value) in self.float_fields() {
            if !value.is_finite() {
                errors.push(format!("{name}: value must be finite (got {value})"));
            }
        }

        let f = &self.filter;
        if f.buffer_capacity < 3 {
            errors.push(format!(
                "filter.buffer_capacity: need at least 3 frames for a 2-frame velocity lag (got {})",
                f.buffer_capacity
            ));
        }
        if f.velocity_history < 2 {
            errors.push(format!(
                "filter.velocity_history: need at least 2 samples for acceleration (got {})",
                f.velocity_history
            ));
        }
        Self::check_unit_interval(f.confidence_floor, "filter.confidence_floor", &mut errors);
        Self::check_positive(f.outlier_jump, "filter.outlier_jump", &mut errors);
        Self::check_positive(f.assumed_fps, "filter.assumed_fps", &mut errors);

        let p = &self.physics;
        Self::check_positive(p.body_height_m, "physics.body_height_m", &mut errors);
        Self::check_positive(
            p.reference_shoulder_width,
            "physics.reference_shoulder_width",
            &mut errors,
        );
        if p.depth_min > p.depth_max {
            errors.push(format!(
                "physics.depth_min ({:.2}) must be <= depth_max ({:.2})",
                p.depth_min, p.depth_max
            ));
        }

        Self::check_unit_interval(self.visibility.required_floor, "visibility.required_floor", &mut errors);

        let r = &self.rep_counter;
        if r.transition_frames == 0 {
            errors.push("rep_counter.transition_frames must be >= 1".to_string());
        }
        if r.min_rep_ms >= r.max_rep_ms {
            errors.push(format!(
                "rep_counter.min_rep_ms ({}) must be < max_rep_ms ({})",
                r.min_rep_ms, r.max_rep_ms
            ));
        }
        if r.ideal_rep_ms == 0 {
            errors.push("rep_counter.ideal_rep_ms must be > 0".to_string());
        }
        r.squats.check("rep_counter.squats", &mut errors);
        r.pushups.check("rep_counter.pushups", &mut errors);
        r.lunges.check("rep_counter.lunges", &mut errors);

        let fb = &self.feedback;
        for (name, ms) in [
            ("feedback.high_cooldown_ms", fb.high_cooldown_ms),
            ("feedback.medium_cooldown_ms", fb.medium_cooldown_ms),
            ("feedback.low_cooldown_ms", fb.low_cooldown_ms),
            ("feedback.positive_cooldown_ms", fb.positive_cooldown_ms),
            ("feedback.mistake_repeat_ms", fb.mistake_repeat_ms),
        ] {
            if ms == 0 {
                errors.push(format!("{name} must be > 0"));
            }
        }
        if fb.high_cooldown_ms > fb.medium_cooldown_ms || fb.medium_cooldown_ms > fb.low_cooldown_ms {
            errors.push(format!(
                "feedback cooldowns must escalate high <= medium <= low (got {}/{}/{})",
                fb.high_cooldown_ms, fb.medium_cooldown_ms, fb.low_cooldown_ms
            ));
        }
        if fb.escalation_count == 0 {
            errors.push("feedback.escalation_count must be >= 1".to_string());
        }

        let a = &self.adaptive;
        if a.min_samples == 0 || a.min_samples > a.window {
            errors.push(format!(
                "adaptive.min_samples ({}) must be in 1..=window ({})",
                a.min_samples, a.window
            ));
        }
        if a.fatigue_window == 0 || a.fatigue_window * 2 > a.window {
            errors.push(format!(
                "adaptive.fatigue_window ({}) must be >= 1 and fit twice in window ({})",
                a.fatigue_window, a.window
            ));
        }
        Self::check_positive(a.fatigue_drop, "adaptive.fatigue_drop", &mut errors);

        for w in super::validation::validate_physical_ranges(self) {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn float_fields(&self) -> Vec<(&'static str, f64)> {
        let mut fields = vec![
            ("filter.confidence_floor", self.filter.confidence_floor),
            ("filter.outlier_jump", self.filter.outlier_jump),
            ("filter.assumed_fps", self.filter.assumed_fps),
            ("physics.body_height_m", self.physics.body_height_m),
            ("physics.reference_shoulder_width", self.physics.reference_shoulder_width),
            ("physics.depth_min", self.physics.depth_min),
            ("physics.depth_max", self.physics.depth_max),
            ("physics.gravity", self.physics.gravity),
            ("physics.target_velocity", self.physics.target_velocity),
            ("visibility.required_floor", self.visibility.required_floor),
            ("rep_counter.valid_quality", self.rep_counter.valid_quality),
            ("adaptive.fatigue_drop", self.adaptive.fatigue_drop),
            ("adaptive.fatigue_severity_gain", self.adaptive.fatigue_severity_gain),
            ("adaptive.rom_excess_ratio", self.adaptive.rom_excess_ratio),
            ("adaptive.rom_risk", self.adaptive.rom_risk),
            ("adaptive.tempo_ratio", self.adaptive.tempo_ratio),
            ("adaptive.tempo_risk", self.adaptive.tempo_risk),
            ("adaptive.fatigue_risk_weight", self.adaptive.fatigue_risk_weight),
            ("adaptive.default_form_threshold", self.adaptive.default_form_threshold),
            ("adaptive.default_rom_threshold", self.adaptive.default_rom_threshold),
            ("adaptive.default_tempo_threshold", self.adaptive.default_tempo_threshold),
        ];
        for (name, t) in [
            ("rep_counter.squats", &self.rep_counter.squats),
            ("rep_counter.pushups", &self.rep_counter.pushups),
            ("rep_counter.lunges", &self.rep_counter.lunges),
        ] {
            fields.push((name, t.down_enter));
            fields.push((name, t.down_exit));
            fields.push((name, t.up_enter));
            fields.push((name, t.up_exit));
        }
        fields
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if value.is_finite() && value <= 0.0 {
            errors.push(format!("{name}: must be > 0 (got {value})"));
        }
    }

    fn check_unit_interval(value: f64, name: &str, errors: &mut Vec<String>) {
        if value.is_finite() && !(0.0..=1.0).contains(&value) {
            errors.push(format!("{name}: must be within 0..=1 (got {value})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Filter
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Frames kept in the landmark ring buffer
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Velocity samples kept per joint
    #[serde(default = "default_velocity_history")]
    pub velocity_history: usize,
    /// Joints at or below this visibility are ignored by smoothing and the outlier gate
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,
    /// Per-frame displacement (normalized units) that marks a frame as a glitch
    #[serde(default = "default_outlier_jump")]
    pub outlier_jump: f64,
    /// Nominal frame rate used when timestamps are missing
    #[serde(default = "default_assumed_fps")]
    pub assumed_fps: f64,
}

fn default_buffer_capacity() -> usize { 10 }
fn default_velocity_history() -> usize { 5 }
fn default_confidence_floor() -> f64 { 0.5 }
fn default_outlier_jump() -> f64 { 0.15 }
fn default_assumed_fps() -> f64 { 30.0 }

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            velocity_history: default_velocity_history(),
            confidence_floor: default_confidence_floor(),
            outlier_jump: default_outlier_jump(),
            assumed_fps: default_assumed_fps(),
        }
    }
}

impl FilterConfig {
    /// Nominal seconds between frames.
    pub fn nominal_dt(&self) -> f64 {
        1.0 / self.assumed_fps
    }
}

// ============================================================================
// Physics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Metres per normalized image unit
    #[serde(default = "default_body_height_m")]
    pub body_height_m: f64,
    /// Normalized shoulder width at the reference camera distance
    #[serde(default = "default_reference_shoulder_width")]
    pub reference_shoulder_width: f64,
    #[serde(default = "default_depth_min")]
    pub depth_min: f64,
    #[serde(default = "default_depth_max")]
    pub depth_max: f64,
    /// m/s²
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    /// Cruise speed (m/s) that scores full smoothness
    #[serde(default = "default_target_velocity")]
    pub target_velocity: f64,
}

fn default_body_height_m() -> f64 { 1.7 }
fn default_reference_shoulder_width() -> f64 { 0.15 }
fn default_depth_min() -> f64 { 0.5 }
fn default_depth_max() -> f64 { 2.0 }
fn default_gravity() -> f64 { 9.81 }
fn default_target_velocity() -> f64 { 0.5 }

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            body_height_m: default_body_height_m(),
            reference_shoulder_width: default_reference_shoulder_width(),
            depth_min: default_depth_min(),
            depth_max: default_depth_max(),
            gravity: default_gravity(),
            target_velocity: default_target_velocity(),
        }
    }
}

// ============================================================================
// Visibility
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityConfig {
    /// Required joints below this visibility abort the frame
    #[serde(default = "default_required_floor")]
    pub required_floor: f64,
}

fn default_required_floor() -> f64 { 0.8 }

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            required_floor: default_required_floor(),
        }
    }
}

// ============================================================================
// Rep Counter
// ============================================================================

/// Enter/exit angles (degrees) for the down and up phases.
///
/// A section in TOML must give all four values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseThresholds {
    /// Angle below which a descent starts counting frames
    pub down_enter: f64,
    /// Angle above which a pending descent is cancelled
    pub down_exit: f64,
    /// Angle above which an ascent starts counting frames
    pub up_enter: f64,
    /// Angle below which a pending ascent is cancelled
    pub up_exit: f64,
}

impl PhaseThresholds {
    pub const fn new(down_enter: f64, down_exit: f64, up_enter: f64, up_exit: f64) -> Self {
        Self {
            down_enter,
            down_exit,
            up_enter,
            up_exit,
        }
    }

    fn check(&self, name: &str, errors: &mut Vec<String>) {
        if self.down_enter >= self.down_exit {
            errors.push(format!(
                "{name}: down_enter ({:.1}) must be < down_exit ({:.1})",
                self.down_enter, self.down_exit
            ));
        }
        if self.up_exit >= self.up_enter {
            errors.push(format!(
                "{name}: up_exit ({:.1}) must be < up_enter ({:.1})",
                self.up_exit, self.up_enter
            ));
        }
        if self.down_enter >= self.up_enter {
            errors.push(format!(
                "{name}: down_enter ({:.1}) must be < up_enter ({:.1})",
                self.down_enter, self.up_enter
            ));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepCounterConfig {
    /// Consecutive frames needed to confirm a transition
    #[serde(default = "default_transition_frames")]
    pub transition_frames: u32,
    #[serde(default = "default_min_rep_ms")]
    pub min_rep_ms: u64,
    #[serde(default = "default_max_rep_ms")]
    pub max_rep_ms: u64,
    /// Minimum spacing between two counted reps
    #[serde(default = "default_rep_cooldown_ms")]
    pub rep_cooldown_ms: u64,
    /// Rep duration that scores full tempo
    #[serde(default = "default_ideal_rep_ms")]
    pub ideal_rep_ms: u64,
    /// Overall quality above which a rep is "valid"
    #[serde(default = "default_valid_quality")]
    pub valid_quality: f64,
    /// Knee angle (average of both legs)
    #[serde(default = "default_squat_thresholds")]
    pub squats: PhaseThresholds,
    /// Elbow angle (average of both arms)
    #[serde(default = "default_pushup_thresholds")]
    pub pushups: PhaseThresholds,
    /// Front knee angle
    #[serde(default = "default_lunge_thresholds")]
    pub lunges: PhaseThresholds,
}

fn default_transition_frames() -> u32 { 2 }
fn default_min_rep_ms() -> u64 { 300 }
fn default_max_rep_ms() -> u64 { 15_000 }
fn default_rep_cooldown_ms() -> u64 { 500 }
fn default_ideal_rep_ms() -> u64 { 2_000 }
fn default_valid_quality() -> f64 { 45.0 }
fn default_squat_thresholds() -> PhaseThresholds { PhaseThresholds::new(140.0, 150.0, 155.0, 145.0) }
fn default_pushup_thresholds() -> PhaseThresholds { PhaseThresholds::new(110.0, 120.0, 150.0, 140.0) }
fn default_lunge_thresholds() -> PhaseThresholds { PhaseThresholds::new(120.0, 130.0, 150.0, 140.0) }

impl RepCounterConfig {
    /// Hysteresis thresholds for a rep-counted exercise; `None` for holds.
    pub fn thresholds_for(&self, exercise: Exercise) -> Option<PhaseThresholds> {
        match exercise {
            Exercise::Squats => Some(self.squats),
            Exercise::Pushups => Some(self.pushups),
            Exercise::Lunges => Some(self.lunges),
            Exercise::Plank => None,
        }
    }
}

impl Default for RepCounterConfig {
    fn default() -> Self {
        Self {
            transition_frames: default_transition_frames(),
            min_rep_ms: default_min_rep_ms(),
            max_rep_ms: default_max_rep_ms(),
            rep_cooldown_ms: default_rep_cooldown_ms(),
            ideal_rep_ms: default_ideal_rep_ms(),
            valid_quality: default_valid_quality(),
            squats: default_squat_thresholds(),
            pushups: default_pushup_thresholds(),
            lunges: default_lunge_thresholds(),
        }
    }
}

// ============================================================================
// Feedback
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_high_cooldown_ms")]
    pub high_cooldown_ms: u64,
    #[serde(default = "default_medium_cooldown_ms")]
    pub medium_cooldown_ms: u64,
    #[serde(default = "default_low_cooldown_ms")]
    pub low_cooldown_ms: u64,
    /// Positive feedback may be delivered this often regardless of priority
    #[serde(default = "default_positive_cooldown_ms")]
    pub positive_cooldown_ms: u64,
    /// Minimum gap before the same fault counts as a new occurrence
    #[serde(default = "default_mistake_repeat_ms")]
    pub mistake_repeat_ms: u64,
    /// Occurrences after which a fault escalates to a detailed explanation
    #[serde(default = "default_escalation_count")]
    pub escalation_count: u32,
}

fn default_high_cooldown_ms() -> u64 { 2_000 }
fn default_medium_cooldown_ms() -> u64 { 4_000 }
fn default_low_cooldown_ms() -> u64 { 6_000 }
fn default_positive_cooldown_ms() -> u64 { 1_500 }
fn default_mistake_repeat_ms() -> u64 { 12_000 }
fn default_escalation_count() -> u32 { 3 }

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            high_cooldown_ms: default_high_cooldown_ms(),
            medium_cooldown_ms: default_medium_cooldown_ms(),
            low_cooldown_ms: default_low_cooldown_ms(),
            positive_cooldown_ms: default_positive_cooldown_ms(),
            mistake_repeat_ms: default_mistake_repeat_ms(),
            escalation_count: default_escalation_count(),
        }
    }
}

// ============================================================================
// Adaptive Model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    /// Reps kept in the rolling window
    #[serde(default = "default_window")]
    pub window: usize,
    /// Below this many reps, thresholds fall back to beginner defaults
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Size of each half of the fatigue comparison
    #[serde(default = "default_fatigue_window")]
    pub fatigue_window: usize,
    /// Form-score drop (points) that flags fatigue
    #[serde(default = "default_fatigue_drop")]
    pub fatigue_drop: f64,
    /// Severity points per point of drop
    #[serde(default = "default_fatigue_severity_gain")]
    pub fatigue_severity_gain: f64,
    /// Reps needed before injury risk is estimated
    #[serde(default = "default_injury_min_samples")]
    pub injury_min_samples: usize,
    /// ROM above `mean × ratio` adds `rom_risk`
    #[serde(default = "default_rom_excess_ratio")]
    pub rom_excess_ratio: f64,
    #[serde(default = "default_rom_risk")]
    pub rom_risk: f64,
    /// Tempo below `mean × ratio` adds `tempo_risk`
    #[serde(default = "default_tempo_ratio")]
    pub tempo_ratio: f64,
    #[serde(default = "default_tempo_risk")]
    pub tempo_risk: f64,
    /// Share of fatigue severity added to injury risk
    #[serde(default = "default_fatigue_risk_weight")]
    pub fatigue_risk_weight: f64,
    #[serde(default = "default_form_threshold")]
    pub default_form_threshold: f64,
    /// Degrees
    #[serde(default = "default_rom_threshold")]
    pub default_rom_threshold: f64,
    /// Seconds
    #[serde(default = "default_tempo_threshold")]
    pub default_tempo_threshold: f64,
}

fn default_window() -> usize { 30 }
fn default_min_samples() -> usize { 5 }
fn default_fatigue_window() -> usize { 5 }
fn default_fatigue_drop() -> f64 { 15.0 }
fn default_fatigue_severity_gain() -> f64 { 5.0 }
fn default_injury_min_samples() -> usize { 10 }
fn default_rom_excess_ratio() -> f64 { 1.2 }
fn default_rom_risk() -> f64 { 30.0 }
fn default_tempo_ratio() -> f64 { 0.6 }
fn default_tempo_risk() -> f64 { 25.0 }
fn default_fatigue_risk_weight() -> f64 { 0.3 }
fn default_form_threshold() -> f64 { 70.0 }
fn default_rom_threshold() -> f64 { 90.0 }
fn default_tempo_threshold() -> f64 { 2.0 }

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            min_samples: default_min_samples(),
            fatigue_window: default_fatigue_window(),
            fatigue_drop: default_fatigue_drop(),
            fatigue_severity_gain: default_fatigue_severity_gain(),
            injury_min_samples: default_injury_min_samples(),
            rom_excess_ratio: default_rom_excess_ratio(),
            rom_risk: default_rom_risk(),
            tempo_ratio: default_tempo_ratio(),
            tempo_risk: default_tempo_risk(),
            fatigue_risk_weight: default_fatigue_risk_weight(),
            default_form_threshold: default_form_threshold(),
            default_rom_threshold: default_rom_threshold(),
            default_tempo_threshold: default_tempo_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = CoachConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: CoachConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config, CoachConfig::default());
        assert_eq!(config.filter.buffer_capacity, 10);
        assert_eq!(config.rep_counter.rep_cooldown_ms, 500);
        assert_eq!(config.feedback.mistake_repeat_ms, 12_000);
        assert_eq!(config.adaptive.window, 30);
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[rep_counter]
transition_frames = 3

[rep_counter.lunges]
down_enter = 110.0
down_exit = 125.0
up_enter = 155.0
up_exit = 145.0
"#;
        let config: CoachConfig = toml::from_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.rep_counter.transition_frames, 3);
        assert_eq!(config.rep_counter.lunges.down_enter, 110.0);
        // Untouched values keep their defaults
        assert_eq!(config.rep_counter.squats, default_squat_thresholds());
        assert_eq!(config.rep_counter.min_rep_ms, 300);
        assert_eq!(config.physics.body_height_m, 1.7);
    }

    #[test]
    fn test_validation_catches_inverted_hysteresis() {
        let mut config = CoachConfig::default();
        config.rep_counter.squats.down_exit = 130.0;
        config.rep_counter.squats.down_enter = 135.0;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("rep_counter.squats")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_catches_rep_window_and_nan() {
        let mut config = CoachConfig::default();
        config.rep_counter.min_rep_ms = 20_000;
        config.physics.gravity = f64::NAN;
        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation failure");
        };
        assert!(errors.iter().any(|e| e.contains("min_rep_ms")));
        assert!(errors.iter().any(|e| e.contains("physics.gravity")));
    }

    #[test]
    fn test_validation_catches_unordered_cooldowns() {
        let mut config = CoachConfig::default();
        config.feedback.high_cooldown_ms = 9_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_toml() {
        let original = CoachConfig::default();
        let toml_str = original.to_toml().expect("serialization should work");
        let roundtripped: CoachConfig =
            toml::from_str(&toml_str).expect("deserialization should work");
        assert_eq!(original, roundtripped);
    }

    #[test]
    fn test_thresholds_for_plank_is_none() {
        let rc = RepCounterConfig::default();
        assert!(rc.thresholds_for(Exercise::Plank).is_none());
        assert_eq!(rc.thresholds_for(Exercise::Pushups), Some(rc.pushups));
    }

    #[test]
    fn test_squat_default_thresholds() {
        // Descend below 140°, rise past 155°
        let squats = RepCounterConfig::default().squats;
        assert_eq!(squats, PhaseThresholds::new(140.0, 150.0, 155.0, 145.0));
        let mut errors = Vec::new();
        squats.check("rep_counter.squats", &mut errors);
        assert!(errors.is_empty(), "{errors:?}");
    }
}
