//! Coaching feedback produced for every analysed frame

use serde::{Deserialize, Serialize};

/// Tone of a feedback message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Critical,
    Adjustment,
    Positive,
    #[default]
    Info,
    Encouragement,
    Warning,
}

/// Coarse injury-risk tier. Ordered so the larger of two tiers wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Delivery priority consumed by the feedback scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Immediate,
    High,
    Medium,
    #[default]
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Immediate => write!(f, "immediate"),
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// One coaching message. Produced every frame; delivery is decided separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Feedback {
    /// Short on-screen text
    pub message: String,
    /// Sentence read out by the voice layer when delivered
    pub voice_message: String,
    #[serde(rename = "type")]
    pub kind: FeedbackType,
    /// Joint indices to highlight in the overlay
    pub problem_landmarks: Vec<usize>,
    /// 0..=1
    pub confidence: f64,
    pub biomechanical_risk: RiskLevel,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progressive_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actionable_cue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_explanation: Option<String>,
}

impl Feedback {
    pub fn new(kind: FeedbackType, message: impl Into<String>, voice_message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            voice_message: voice_message.into(),
            kind,
            confidence: 1.0,
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.biomechanical_risk = risk;
        self
    }

    /// Confidence is clamped into `0..=1`.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn with_landmarks(mut self, landmarks: &[usize]) -> Self {
        self.problem_landmarks = landmarks.to_vec();
        self
    }

    /// Immediate priority or critical tone: bypasses every cooldown.
    pub fn is_urgent(&self) -> bool {
        self.priority == Priority::Immediate || self.kind == FeedbackType::Critical
    }
}
