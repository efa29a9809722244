//! Post-workout debrief: aggregate a finished session into a summary the
//! surrounding application can store or display.
//!
//! The caller decides when the workout is over; building a summary does not
//! modify the session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pipeline::AnalysisSession;
use crate::types::{Exercise, Fault, QualityTrend};

/// Efficiency reported when no frame was analysed.
pub const DEFAULT_EFFICIENCY: f64 = 85.0;

/// Score reported when there is nothing to average.
pub const EMPTY_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub exercise: Option<Exercise>,
    /// First to last frame timestamp (seconds)
    pub duration_s: f64,
    pub total_reps: u32,
    pub valid_reps: u32,
    pub calories: f64,
    pub average_form_score: f64,
    /// Mean physics velocity over analysed frames (m/s)
    pub average_velocity: f64,
    /// Watts
    pub peak_power: f64,
    pub consistency: f64,
    pub biomechanical_efficiency: f64,
    pub hold_seconds: f64,
    pub quality_trend: QualityTrend,
    pub fault_counts: BTreeMap<Fault, u32>,
    pub learning_phase: bool,
}

impl SessionSummary {
    pub fn from_session(session: &AnalysisSession, body_weight_kg: f64) -> Self {
        let totals = session.totals();
        let stats = session.rep_stats();
        let exercise = session.exercise();
        let isometric = exercise.is_some_and(|e| e.is_isometric());

        let duration_ms = match (totals.first_timestamp_ms, totals.last_timestamp_ms) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => 0,
        };
        let hours = duration_ms as f64 / 3_600_000.0;
        let weight = if body_weight_kg.is_finite() {
            body_weight_kg.max(0.0)
        } else {
            0.0
        };
        let calories = exercise.map_or(0.0, |e| e.met() * weight * hours);

        let history = session.rep_history();
        let average_form_score = if isometric {
            totals.mean_form().unwrap_or(EMPTY_SCORE)
        } else if history.is_empty() {
            EMPTY_SCORE
        } else {
            history.iter().map(|q| q.form_score).sum::<f64>() / history.len() as f64
        };

        let consistency = if isometric {
            match (totals.form_min, totals.form_max) {
                (Some(min), Some(max)) => (EMPTY_SCORE - (max - min)).clamp(0.0, 100.0),
                _ => EMPTY_SCORE,
            }
        } else if stats.total_reps == 0 {
            EMPTY_SCORE
        } else {
            stats.consistency
        };

        let frames = totals.analysed_frames as f64;
        let (average_velocity, biomechanical_efficiency) = if totals.analysed_frames == 0 {
            (0.0, DEFAULT_EFFICIENCY)
        } else {
            (totals.velocity_sum / frames, totals.efficiency_sum / frames)
        };

        let progress = session.progress();
        Self {
            exercise,
            duration_s: duration_ms as f64 / 1000.0,
            total_reps: stats.total_reps,
            valid_reps: stats.valid_reps,
            calories,
            average_form_score,
            average_velocity,
            peak_power: totals.peak_power,
            consistency,
            biomechanical_efficiency,
            hold_seconds: totals.hold_ms as f64 / 1000.0,
            quality_trend: session.trend(),
            fault_counts: session.scheduler().fault_counts(),
            learning_phase: progress.learning_phase,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoachConfig;
    use crate::types::{joints, Landmark, LandmarkFrame, RepPhase, LANDMARK_COUNT};

    fn plank_frame(ts: u64) -> LandmarkFrame {
        let mut l = vec![Landmark::new(0.5, 0.5, 0.0, 1.0); LANDMARK_COUNT];
        l[joints::LEFT_SHOULDER] = Landmark::new(0.2, 0.5, 0.0, 1.0);
        l[joints::RIGHT_SHOULDER] = Landmark::new(0.2, 0.5, 0.0, 1.0);
        l[joints::LEFT_HIP] = Landmark::new(0.5, 0.5, 0.0, 1.0);
        l[joints::RIGHT_HIP] = Landmark::new(0.5, 0.5, 0.0, 1.0);
        l[joints::LEFT_ANKLE] = Landmark::new(0.8, 0.5, 0.0, 1.0);
        l[joints::RIGHT_ANKLE] = Landmark::new(0.8, 0.5, 0.0, 1.0);
        LandmarkFrame::new(ts, l)
    }

    #[test]
    fn test_empty_session_defaults() {
        let session = AnalysisSession::new(CoachConfig::default());
        let summary = SessionSummary::from_session(&session, 70.0);
        assert_eq!(summary.exercise, None);
        assert_eq!(summary.calories, 0.0);
        assert_eq!(summary.average_form_score, 100.0);
        assert_eq!(summary.consistency, 100.0);
        assert_eq!(summary.biomechanical_efficiency, 85.0);
    }

    #[test]
    fn test_plank_hold_and_calories() {
        let mut session = AnalysisSession::new(CoachConfig::default());
        for i in 0..=60 {
            session.analyze("plank", &plank_frame(i * 1_000), RepPhase::Holding, 0, 60.0);
        }
        let summary = SessionSummary::from_session(&session, 60.0);
        assert_eq!(summary.exercise, Some(Exercise::Plank));
        assert!((summary.duration_s - 60.0).abs() < 1e-9);
        assert!((summary.hold_seconds - 60.0).abs() < 1e-9);
        // 3.0 MET × 60 kg × 1/60 h
        assert!((summary.calories - 3.0).abs() < 1e-9);
        assert_eq!(summary.total_reps, 0);
        assert!(summary.to_json().is_ok_and(|j| j.contains("\"hold_seconds\"")));
    }
}
