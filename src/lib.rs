//! FormSense: Real-Time Exercise Form Analysis
//!
//! Turns a stream of 33-point pose landmarks into per-frame coaching:
//! phase tracking, rep counting, technique faults, risk estimates and
//! throttled feedback.
//!
//! ## Architecture
//!
//! - **Acquisition**: landmark stream filter (outlier gate, smoothing, kinematics)
//! - **Physics Engine**: joint angles, motion metrics and posture summary
//! - **Agents**: rep state machine and per-exercise fault rule tables
//! - **Baseline**: adaptive thresholds, fatigue and injury risk
//! - **Feedback**: coaching text, escalation and delivery scheduling
//! - **Pipeline**: `AnalysisSession`, the per-frame entry point
//! - **Debrief**: end-of-workout summary

pub mod acquisition;
pub mod agents;
pub mod baseline;
pub mod config;
pub mod debrief;
pub mod feedback;
pub mod physics_engine;
pub mod pipeline;
pub mod types;

// Re-export configuration
pub use config::CoachConfig;

// Re-export commonly used types
pub use types::{
    AnalysisResult, Exercise, Fault, Feedback, FeedbackType, Landmark, LandmarkFrame, Priority,
    RepPhase, RepQuality, RiskLevel,
};

// Re-export the session entry point
pub use debrief::SessionSummary;
pub use pipeline::AnalysisSession;
