//! Coaching feedback: wording and delivery
//!
//! - `coaching`: hints, cues, explanations and rep encouragement
//! - `scheduler`: cooldown-based delivery, fault escalation, learning phase

pub mod coaching;
pub mod scheduler;

pub use scheduler::{CoachProgress, FeedbackScheduler};
