//! Repetition phases, per-rep quality and running rep statistics

use serde::{Deserialize, Serialize};

/// Position in the rep cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    #[default]
    Up,
    TransitionDown,
    Down,
    TransitionUp,
    /// Isometric hold; never counts reps
    Holding,
}

impl RepPhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            RepPhase::Up => "up",
            RepPhase::TransitionDown => "transition_down",
            RepPhase::Down => "down",
            RepPhase::TransitionUp => "transition_up",
            RepPhase::Holding => "holding",
        }
    }

    /// Between leaving the top and returning to it.
    pub fn is_working(&self) -> bool {
        matches!(
            self,
            RepPhase::TransitionDown | RepPhase::Down | RepPhase::TransitionUp
        )
    }
}

impl std::fmt::Display for RepPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Hysteresis state owned by the rep state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RepState {
    pub phase: RepPhase,
    /// Confidence of the last confirmed transition (0..=1)
    pub confidence: f64,
    /// Frames that have satisfied the pending transition's entry condition
    pub consecutive_frame_count: u32,
    /// Timestamp of the last confirmed transition (ms)
    pub last_transition_ms: Option<u64>,
}

/// Quality of one completed rep. All scores are 0..=100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RepQuality {
    pub form_score: f64,
    pub depth_score: f64,
    pub stability_score: f64,
    pub tempo_score: f64,
    pub overall_score: f64,
    /// Whether the rep met the quality bar; counting never depends on it
    pub is_valid: bool,
    /// Time the rep was counted (ms)
    pub timestamp_ms: u64,
    /// Elapsed ms between the confirmed descent and the count
    pub duration_ms: u64,
}

/// Direction of recent rep quality.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityTrend {
    Improving,
    #[default]
    Stable,
    Declining,
}

impl std::fmt::Display for QualityTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityTrend::Improving => write!(f, "improving"),
            QualityTrend::Stable => write!(f, "stable"),
            QualityTrend::Declining => write!(f, "declining"),
        }
    }
}

/// Running statistics over the session's rep history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RepStats {
    pub total_reps: u32,
    pub valid_reps: u32,
    pub invalid_reps: u32,
    pub average_quality: f64,
    pub best_quality: f64,
    /// 100 − population standard deviation of overall quality
    pub consistency: f64,
    pub trend: QualityTrend,
}
