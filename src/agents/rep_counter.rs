//! Rep State Machine
//!
//! Turns a continuous driving angle (knee for squats and lunges, elbow for
//! push-ups) into discrete phase transitions and counted repetitions.
//!
//! ```text
//!   Up ──(angle < down.enter × N)──▶ TransitionDown ──▶ Down
//!    ▲                                                   │
//!    └──── count ◀── TransitionUp ◀──(angle > up.enter × N)
//! ```
//!
//! Pending transitions are cancelled when the angle crosses back over the
//! exit threshold. A rep is counted on the confirmed return to `Up` only if
//! its duration lies in `[min_rep_ms, max_rep_ms]` and `rep_cooldown_ms` has
//! passed since the previous counted rep. Quality never suppresses a count.
//! Isometric exercises stay in `Holding`.

use statrs::statistics::Statistics;
use tracing::{debug, info};

use crate::config::{PhaseThresholds, RepCounterConfig};
use crate::types::{
    joints, Exercise, LandmarkFrame, QualityTrend, RepPhase, RepQuality, RepState, RepStats,
};

/// Reps considered by the quality trend.
pub const TREND_WINDOW: usize = 5;
/// Band (quality points) inside which the trend is reported as stable.
pub const TREND_BAND: f64 = 5.0;

// ============================================================================
// Update Outcome
// ============================================================================

/// What a single `update` call did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RepUpdate {
    pub phase: RepPhase,
    pub counted: bool,
    /// This frame confirmed the descent into `Down`
    pub descent_confirmed: bool,
    pub confidence: f64,
    /// Quality of the rep counted on this frame
    pub quality: Option<RepQuality>,
    /// Angle range (max − min) covered by the counted rep
    pub range_of_motion: Option<f64>,
}

/// Extremes seen since the machine left `Up`.
#[derive(Debug, Clone, Copy)]
struct RepWindow {
    min_angle: f64,
    max_angle: f64,
    worst_form: f64,
}

impl RepWindow {
    fn open(angle: f64, form_score: f64) -> Self {
        Self {
            min_angle: angle,
            max_angle: angle,
            worst_form: form_score,
        }
    }

    fn observe(&mut self, angle: f64, form_score: f64) {
        self.min_angle = self.min_angle.min(angle);
        self.max_angle = self.max_angle.max(angle);
        self.worst_form = self.worst_form.min(form_score);
    }
}

// ============================================================================
// State Machine
// ============================================================================

#[derive(Debug, Clone)]
pub struct RepStateMachine {
    exercise: Exercise,
    /// `None` for isometric exercises
    thresholds: Option<PhaseThresholds>,
    config: RepCounterConfig,
    state: RepState,
    rep_count: u32,
    valid_reps: u32,
    invalid_reps: u32,
    history: Vec<RepQuality>,
    last_rep_ms: Option<u64>,
    window: Option<RepWindow>,
}

impl RepStateMachine {
    pub fn new(exercise: Exercise, config: &RepCounterConfig) -> Self {
        Self {
            exercise,
            thresholds: config.thresholds_for(exercise),
            config: config.clone(),
            state: Self::initial_state(exercise),
            rep_count: 0,
            valid_reps: 0,
            invalid_reps: 0,
            history: Vec::new(),
            last_rep_ms: None,
            window: None,
        }
    }

    fn initial_state(exercise: Exercise) -> RepState {
        RepState {
            phase: if exercise.is_isometric() {
                RepPhase::Holding
            } else {
                RepPhase::Up
            },
            confidence: 1.0,
            consecutive_frame_count: 0,
            last_transition_ms: None,
        }
    }

    /// Feed one frame's driving angle and form score.
    pub fn update(
        &mut self,
        angle: f64,
        form_score: f64,
        frame: &LandmarkFrame,
        timestamp_ms: u64,
    ) -> RepUpdate {
        let Some(t) = self.thresholds else {
            return RepUpdate {
                phase: RepPhase::Holding,
                confidence: 1.0,
                ..RepUpdate::default()
            };
        };

        let angle = if angle.is_finite() { angle } else { 180.0 };
        let mut outcome = RepUpdate::default();

        match self.state.phase {
            RepPhase::Up | RepPhase::TransitionDown => {
                if angle < t.down_enter {
                    if self.state.phase == RepPhase::Up {
                        self.window = Some(RepWindow::open(angle, form_score));
                    }
                    self.observe(angle, form_score);
                    self.state.consecutive_frame_count += 1;
                    self.state.phase = RepPhase::TransitionDown;

                    if self.state.consecutive_frame_count >= self.config.transition_frames {
                        self.state.phase = RepPhase::Down;
                        self.state.consecutive_frame_count = 0;
                        self.state.last_transition_ms = Some(timestamp_ms);
                        self.state.confidence = transition_confidence(angle, t.down_enter);
                        outcome.descent_confirmed = true;
                        debug!(
                            exercise = %self.exercise,
                            angle = format!("{angle:.1}"),
                            "Descent confirmed"
                        );
                    }
                } else if self.state.phase == RepPhase::TransitionDown {
                    self.observe(angle, form_score);
                    if angle > t.down_exit {
                        self.state.phase = RepPhase::Up;
                        self.state.consecutive_frame_count = 0;
                        self.window = None;
                        debug!(exercise = %self.exercise, "Descent cancelled");
                    }
                }
            }
            RepPhase::Down | RepPhase::TransitionUp => {
                self.observe(angle, form_score);
                if angle > t.up_enter {
                    self.state.consecutive_frame_count += 1;
                    self.state.phase = RepPhase::TransitionUp;

                    if self.state.consecutive_frame_count >= self.config.transition_frames {
                        self.complete_rep(angle, frame, timestamp_ms, &mut outcome);
                        self.state.phase = RepPhase::Up;
                        self.state.consecutive_frame_count = 0;
                        self.state.last_transition_ms = Some(timestamp_ms);
                        self.state.confidence = transition_confidence(angle, t.up_enter);
                        self.window = None;
                    }
                } else if angle < t.up_exit && self.state.phase == RepPhase::TransitionUp {
                    self.state.phase = RepPhase::Down;
                    self.state.consecutive_frame_count = 0;
                    debug!(exercise = %self.exercise, "Ascent cancelled");
                }
            }
            RepPhase::Holding => {}
        }

        outcome.phase = self.state.phase;
        outcome.confidence = self.state.confidence;
        outcome
    }

    fn observe(&mut self, angle: f64, form_score: f64) {
        if let Some(window) = self.window.as_mut() {
            window.observe(angle, form_score);
        }
    }

    /// Apply the timing gates and, when they pass, count and score the rep.
    fn complete_rep(
        &mut self,
        angle: f64,
        frame: &LandmarkFrame,
        timestamp_ms: u64,
        outcome: &mut RepUpdate,
    ) {
        let since_transition = self
            .state
            .last_transition_ms
            .map_or(0, |ts| timestamp_ms.saturating_sub(ts));
        let in_window = (self.config.min_rep_ms..=self.config.max_rep_ms).contains(&since_transition);
        let cooled = self
            .last_rep_ms
            .map_or(true, |ts| timestamp_ms.saturating_sub(ts) >= self.config.rep_cooldown_ms);

        if !(in_window && cooled) {
            debug!(
                exercise = %self.exercise,
                duration_ms = since_transition,
                in_window,
                cooled,
                "Ascent confirmed without counting"
            );
            return;
        }

        let window = self.window.unwrap_or_else(|| RepWindow::open(angle, 100.0));
        let quality = self.score_rep(window, frame, since_transition, timestamp_ms);

        self.rep_count += 1;
        if quality.is_valid {
            self.valid_reps += 1;
        } else {
            self.invalid_reps += 1;
        }
        self.history.push(quality);
        self.last_rep_ms = Some(timestamp_ms);

        info!(
            exercise = %self.exercise,
            rep = self.rep_count,
            quality = format!("{:.1}", quality.overall_score),
            duration_ms = since_transition,
            "Rep counted"
        );

        outcome.counted = true;
        outcome.quality = Some(quality);
        outcome.range_of_motion = Some(window.max_angle - window.min_angle);
    }

    fn score_rep(
        &self,
        window: RepWindow,
        frame: &LandmarkFrame,
        duration_ms: u64,
        timestamp_ms: u64,
    ) -> RepQuality {
        let form_score = window.worst_form.clamp(0.0, 100.0);
        let depth_score = ((180.0 - window.min_angle) * 1.5).clamp(0.0, 100.0);
        let stability_score = (frame.mean_visibility(&joints::CORE) * 100.0).clamp(0.0, 100.0);

        let ideal = self.config.ideal_rep_ms as f64;
        let deviation = (duration_ms as f64 - ideal).abs() / ideal;
        let tempo_score = (100.0 - deviation * 50.0).max(0.0);

        let overall_score =
            form_score * 0.4 + depth_score * 0.25 + stability_score * 0.2 + tempo_score * 0.15;

        RepQuality {
            form_score,
            depth_score,
            stability_score,
            tempo_score,
            overall_score,
            is_valid: overall_score > self.config.valid_quality,
            timestamp_ms,
            duration_ms,
        }
    }

    // ========================================================================
    // Accessors & Statistics
    // ========================================================================

    pub fn exercise(&self) -> Exercise {
        self.exercise
    }

    pub fn phase(&self) -> RepPhase {
        self.state.phase
    }

    pub fn state(&self) -> &RepState {
        &self.state
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn history(&self) -> &[RepQuality] {
        &self.history
    }

    pub fn stats(&self) -> RepStats {
        let scores: Vec<f64> = self.history.iter().map(|q| q.overall_score).collect();
        let (average_quality, best_quality) = if scores.is_empty() {
            (0.0, 0.0)
        } else {
            (
                scores.iter().mean(),
                scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            )
        };
        let consistency = if scores.len() > 1 {
            (100.0 - scores.iter().population_std_dev()).max(0.0)
        } else {
            100.0
        };

        RepStats {
            total_reps: self.rep_count,
            valid_reps: self.valid_reps,
            invalid_reps: self.invalid_reps,
            average_quality,
            best_quality,
            consistency,
            trend: self.quality_trend(),
        }
    }

    /// Compare the older and newer halves of the last five reps.
    pub fn quality_trend(&self) -> QualityTrend {
        if self.history.len() < TREND_WINDOW {
            return QualityTrend::Stable;
        }
        let recent = &self.history[self.history.len() - TREND_WINDOW..];
        let (older, newer) = recent.split_at(TREND_WINDOW / 2);
        let older_mean = older.iter().map(|q| q.overall_score).mean();
        let newer_mean = newer.iter().map(|q| q.overall_score).mean();
        let diff = newer_mean - older_mean;

        if diff > TREND_BAND {
            QualityTrend::Improving
        } else if diff < -TREND_BAND {
            QualityTrend::Declining
        } else {
            QualityTrend::Stable
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.exercise, &self.config);
    }
}

/// Confidence grows with the margin past the threshold.
fn transition_confidence(angle: f64, threshold: f64) -> f64 {
    (0.5 + (angle - threshold).abs() / 100.0).min(1.0)
}

// ============================================================================
// Tests
// ============================================================================
