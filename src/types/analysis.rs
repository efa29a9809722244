//! Derived per-frame snapshots and the `AnalysisResult` output contract

use super::{Exercise, Fault, Feedback, Landmark, QualityTrend, RepPhase, RepQuality};
use serde::{Deserialize, Serialize};

/// Whole-body motion estimate for one frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PhysicsSnapshot {
    /// m/s, hip/knee centre
    pub velocity: f64,
    /// m/s², hip
    pub acceleration: f64,
    /// kg·m/s
    pub momentum: f64,
    /// 0..=100
    pub stability: f64,
    /// Watts
    pub power_output: f64,
}

/// 3D joint angles in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct JointAngles {
    pub left_knee: f64,
    pub right_knee: f64,
    pub left_elbow: f64,
    pub right_elbow: f64,
    pub left_hip: f64,
    pub right_hip: f64,
}

impl JointAngles {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("left_knee", self.left_knee),
            ("right_knee", self.right_knee),
            ("left_elbow", self.left_elbow),
            ("right_elbow", self.right_elbow),
            ("left_hip", self.left_hip),
            ("right_hip", self.right_hip),
        ]
        .into_iter()
    }

    pub fn avg_knee(&self) -> f64 {
        (self.left_knee + self.right_knee) / 2.0
    }

    pub fn avg_hip(&self) -> f64 {
        (self.left_hip + self.right_hip) / 2.0
    }

    pub fn avg_elbow(&self) -> f64 {
        (self.left_elbow + self.right_elbow) / 2.0
    }
}

/// Posture summary for one frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BiomechanicalSnapshot {
    pub joint_angles: JointAngles,
    pub range_of_motion: f64,
    /// Mean |left − right| over knee, elbow and hip (degrees)
    pub asymmetry: f64,
    /// 0..=100
    pub balance_score: f64,
    /// Relative camera distance estimate (0.5..=2.0)
    pub depth_estimate: f64,
}

/// Movement quality breakdown, 0..=100 each.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct MovementQuality {
    pub overall: f64,
    pub smoothness: f64,
    pub control: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct FatigueStatus {
    pub is_fatigued: bool,
    /// 0..=100
    pub severity: f64,
}

/// Everything the caller gets back for one frame.
///
/// `physics`, `biomechanics` and `movement_quality` are `None` when the
/// frame could not be analysed (unknown exercise, hidden joints).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub exercise: Option<Exercise>,
    pub timestamp_ms: u64,
    pub phase: RepPhase,
    pub rep_counted: bool,
    /// Reps counted by the session so far, including this frame
    pub rep_count: u32,
    pub mistake: Option<Fault>,
    /// 0..=100
    pub form_score: f64,
    pub physics: Option<PhysicsSnapshot>,
    pub biomechanics: Option<BiomechanicalSnapshot>,
    pub movement_quality: Option<MovementQuality>,
    pub fatigue: FatigueStatus,
    /// 0..=100
    pub injury_risk: f64,
    pub improvement_trend: QualityTrend,
    /// Present on the frame that counted a rep
    pub rep_quality: Option<RepQuality>,
    pub feedback: Feedback,
    /// Scheduler verdict: hand `feedback.voice_message` to the voice layer
    pub should_deliver: bool,
    /// Filter-smoothed landmarks for overlay drawing
    pub smoothed_landmarks: Vec<Landmark>,
}

impl AnalysisResult {
    /// A result carrying only feedback; used for frames that were not analysed.
    pub fn bare(
        exercise: Option<Exercise>,
        timestamp_ms: u64,
        phase: RepPhase,
        rep_count: u32,
        feedback: Feedback,
    ) -> Self {
        Self {
            exercise,
            timestamp_ms,
            phase,
            rep_counted: false,
            rep_count,
            mistake: None,
            form_score: 0.0,
            physics: None,
            biomechanics: None,
            movement_quality: None,
            fatigue: FatigueStatus::default(),
            injury_risk: 0.0,
            improvement_trend: QualityTrend::Stable,
            rep_quality: None,
            feedback,
            should_deliver: false,
            smoothed_landmarks: Vec::new(),
        }
    }
}
