//! Analysis Session - one workout's complete per-frame pipeline
//!
//! ```text
//! frame ─▶ exercise lookup ─▶ visibility gate ─▶ stream filter
//!       ─▶ physics + biomechanics ─▶ idle gate ─▶ fault rules
//!       ─▶ rep state machine ─▶ adaptive model ─▶ overrides
//!       ─▶ feedback scheduler ─▶ AnalysisResult
//! ```
//!
//! The session owns every piece of mutable state (filter buffer, rep
//! machine, fault counters, adaptive window, summary accumulators).
//! Concurrent users need separate sessions. `analyze` never fails; degraded
//! input is reported through the result's feedback and confidence.

use tracing::{debug, info, warn};

use crate::acquisition::{FrameVerdict, LandmarkStreamFilter};
use crate::agents::fault_rules::{body_line_angle, RuleOutcome};
use crate::agents::{FaultRuleEngine, RepStateMachine, RepUpdate, RuleContext};
use crate::baseline::{assess_movement_quality, AdaptiveMetric, AdaptiveRiskModel, RepSample};
use crate::config::CoachConfig;
use crate::feedback::coaching::rep_announcement;
use crate::feedback::{CoachProgress, FeedbackScheduler};
use crate::physics_engine::{biomechanical_risk, compute_biomechanics, compute_physics, joint_stability};
use crate::types::{
    joints, AnalysisResult, BiomechanicalSnapshot, Exercise, Fault, Feedback, FeedbackType,
    Landmark, LandmarkFrame, MovementQuality, PhysicsSnapshot, Priority, QualityTrend, RepPhase,
    RepQuality, RepStats, RiskLevel,
};

// ============================================================================
// Gate & Override Thresholds
// ============================================================================

/// Limits for the idle gate and the session-level overrides
pub mod session_thresholds {
    /// Joint angles at or above this count as the standing/start position (deg)
    pub const START_POSITION_DEG: f64 = 165.0;
    /// Push-up body line at or above this counts as the start position (deg)
    pub const PUSHUP_START_BODY_LINE: f64 = 170.0;

    /// Injury risk that replaces feedback with a critical warning
    pub const INJURY_CRITICAL: f64 = 60.0;
    /// Injury risk that raises the risk tier to at least medium
    pub const INJURY_ELEVATED: f64 = 40.0;
    /// Form score cap while injury risk is critical
    pub const INJURY_FORM_CAP: f64 = 50.0;
    /// Fatigue severity that triggers the rest suggestion
    pub const FATIGUE_WARNING_SEVERITY: f64 = 50.0;

    pub const EXCELLENT_QUALITY: f64 = 85.0;
    pub const EXCELLENT_FORM: f64 = 80.0;
    pub const SMOOTHNESS_MIN: f64 = 60.0;
    pub const SMOOTHNESS_FORM_MIN: f64 = 70.0;
    /// Form below the personal threshold but above this is "below standard"
    pub const BELOW_STANDARD_FLOOR: f64 = 50.0;
    /// Every Nth rep may suggest progression
    pub const CHALLENGE_EVERY_REPS: u32 = 10;
    pub const CHALLENGE_FORM: f64 = 85.0;

    /// Confidence attached to degraded-input feedback
    pub const DEGRADED_CONFIDENCE: f64 = 0.3;
}

use session_thresholds as st;

/// Minimum physics velocity (m/s) that counts as movement before the
/// first rep. `None` disables the idle gate.
pub fn motion_floor(exercise: Exercise) -> Option<f64> {
    match exercise {
        Exercise::Squats | Exercise::Lunges => Some(0.01),
        Exercise::Pushups => Some(0.05),
        Exercise::Plank => None,
    }
}

fn in_start_position(exercise: Exercise, bio: &BiomechanicalSnapshot, frame: &LandmarkFrame) -> bool {
    let a = &bio.joint_angles;
    match exercise {
        Exercise::Squats => a.avg_knee() >= st::START_POSITION_DEG && a.avg_hip() >= st::START_POSITION_DEG,
        Exercise::Pushups => {
            a.avg_elbow() >= st::START_POSITION_DEG && body_line_angle(frame) >= st::PUSHUP_START_BODY_LINE
        }
        Exercise::Lunges => a.left_knee.min(a.right_knee) >= st::START_POSITION_DEG,
        Exercise::Plank => false,
    }
}

fn ready_prompt(exercise: Exercise) -> &'static str {
    match exercise {
        Exercise::Squats => {
            "I can see you clearly. Begin your squat by bending your knees and hips. Go down slowly and controlled."
        }
        Exercise::Pushups => "I can see you clearly. Lower your chest toward the floor with your body in a straight line.",
        Exercise::Lunges => {
            "I can see you clearly. Step one leg forward and lower your body by bending both knees to 90 degrees."
        }
        Exercise::Plank => "Hold a straight line from shoulders to ankles.",
    }
}

/// The angle that drives an exercise's rep machine.
fn driving_angle(exercise: Exercise, bio: &BiomechanicalSnapshot, frame: &LandmarkFrame) -> f64 {
    let a = &bio.joint_angles;
    match exercise {
        Exercise::Squats => a.avg_knee(),
        Exercise::Pushups => a.avg_elbow(),
        Exercise::Lunges => {
            if frame.joint(joints::LEFT_ANKLE).x < frame.joint(joints::RIGHT_ANKLE).x {
                a.left_knee
            } else {
                a.right_knee
            }
        }
        Exercise::Plank => body_line_angle(frame),
    }
}

// ============================================================================
// Summary Accumulators
// ============================================================================

/// Running totals the session summary is built from.
#[derive(Debug, Clone, Default)]
pub struct SessionTotals {
    pub first_timestamp_ms: Option<u64>,
    pub last_timestamp_ms: Option<u64>,
    pub analysed_frames: u64,
    pub velocity_sum: f64,
    pub peak_power: f64,
    /// Sum of per-frame `(balance + (100 − 2·asymmetry)) / 2`
    pub efficiency_sum: f64,
    /// Form scores of frames where rules were evaluated
    pub form_sum: f64,
    pub form_frames: u64,
    pub form_min: Option<f64>,
    pub form_max: Option<f64>,
    pub hold_ms: u64,
    last_hold_ms: Option<u64>,
}

impl SessionTotals {
    fn mark(&mut self, timestamp_ms: u64) {
        self.first_timestamp_ms.get_or_insert(timestamp_ms);
        self.last_timestamp_ms = Some(
            self.last_timestamp_ms
                .map_or(timestamp_ms, |last| last.max(timestamp_ms)),
        );
    }

    fn add_frame(&mut self, physics: &PhysicsSnapshot, bio: &BiomechanicalSnapshot) {
        self.analysed_frames += 1;
        if physics.velocity.is_finite() {
            self.velocity_sum += physics.velocity;
        }
        if physics.power_output.is_finite() {
            self.peak_power = self.peak_power.max(physics.power_output);
        }
        let efficiency = (bio.balance_score + (100.0 - 2.0 * bio.asymmetry)) / 2.0;
        self.efficiency_sum += efficiency.clamp(0.0, 100.0);
    }

    fn add_form(&mut self, form_score: f64) {
        self.form_sum += form_score;
        self.form_frames += 1;
        self.form_min = Some(self.form_min.map_or(form_score, |m| m.min(form_score)));
        self.form_max = Some(self.form_max.map_or(form_score, |m| m.max(form_score)));
    }

    fn hold(&mut self, timestamp_ms: u64) {
        if let Some(last) = self.last_hold_ms {
            self.hold_ms += timestamp_ms.saturating_sub(last);
        }
        self.last_hold_ms = Some(timestamp_ms);
    }

    fn break_hold(&mut self) {
        self.last_hold_ms = None;
    }

    /// Mean form over rule-evaluated frames, if any.
    pub fn mean_form(&self) -> Option<f64> {
        (self.form_frames > 0).then(|| self.form_sum / self.form_frames as f64)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Exercise-scoped components, rebuilt when the exercise changes.
#[derive(Debug, Clone)]
struct ActiveExercise {
    exercise: Exercise,
    machine: RepStateMachine,
    rules: FaultRuleEngine,
}

#[derive(Debug, Clone)]
pub struct AnalysisSession {
    config: CoachConfig,
    filter: LandmarkStreamFilter,
    active: Option<ActiveExercise>,
    scheduler: FeedbackScheduler,
    adaptive: AdaptiveRiskModel,
    totals: SessionTotals,
    last_form_score: f64,
    last_injury_risk: f64,
}

impl AnalysisSession {
    pub fn new(config: CoachConfig) -> Self {
        Self {
            filter: LandmarkStreamFilter::new(config.filter.clone()),
            scheduler: FeedbackScheduler::new(config.feedback.clone()),
            adaptive: AdaptiveRiskModel::new(config.adaptive.clone()),
            active: None,
            totals: SessionTotals::default(),
            last_form_score: 0.0,
            last_injury_risk: 0.0,
            config,
        }
    }

    /// Clear all workout state, keeping the configuration.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// Analyse one frame.
    ///
    /// `current_phase` and `rep_count` are the caller's view; they are echoed
    /// back only when the exercise id is unknown. Otherwise the session's
    /// own state machine is authoritative.
    pub fn analyze(
        &mut self,
        exercise_id: &str,
        frame: &LandmarkFrame,
        current_phase: RepPhase,
        rep_count: u32,
        body_weight_kg: f64,
    ) -> AnalysisResult {
        let ts = frame.timestamp_ms;

        let Some(exercise) = Exercise::from_id(exercise_id) else {
            warn!(exercise_id, "Unknown exercise requested");
            let feedback = Feedback::new(
                FeedbackType::Warning,
                "Unknown Exercise",
                "This exercise is not recognized. Please select a different exercise.",
            )
            .with_priority(Priority::Immediate)
            .with_confidence(0.0);
            let mut result = AnalysisResult::bare(None, ts, current_phase, rep_count, feedback);
            result.should_deliver = true;
            return result;
        };

        self.ensure_exercise(exercise);
        self.totals.mark(ts);

        let (phase, session_reps) = self.machine_view();
        if rep_count != session_reps {
            debug!(caller = rep_count, session = session_reps, "Caller rep count differs from session");
        }

        // Visibility gate; gated frames never reach the filter buffer
        let floor = self.config.visibility.required_floor;
        if !frame.is_complete() || !frame.all_visible(exercise.required_joints(), floor) {
            self.totals.break_hold();
            return self.poor_visibility(exercise, ts, phase, session_reps);
        }

        // Stream filter
        if let FrameVerdict::Rejected { joint, .. } = self.filter.push(frame) {
            let feedback = Feedback::new(FeedbackType::Info, "Re-acquiring", "")
                .with_confidence(st::DEGRADED_CONFIDENCE);
            let mut result = AnalysisResult::bare(Some(exercise), ts, phase, session_reps, feedback);
            result.form_score = self.last_form_score;
            debug!(joint, ts, "Frame skipped by outlier gate");
            return result;
        }

        let dt = self.filter.last_dt();
        let physics = compute_physics(
            frame,
            self.filter.previous(),
            dt,
            &self.filter,
            body_weight_kg,
            &self.config.physics,
        );
        let bio = compute_biomechanics(frame, &self.config.physics);
        let bio_risk = biomechanical_risk(&physics, &bio);
        let smoothed = self.filter.smoothed_frame();
        self.totals.add_frame(&physics, &bio);

        // Idle gate
        if let Some(floor) = motion_floor(exercise) {
            if session_reps == 0
                && phase == RepPhase::Up
                && physics.velocity < floor
                && in_start_position(exercise, &bio, frame)
            {
                return self.ready(exercise, ts, physics, bio, smoothed);
            }
        }

        // Fault rules
        let evaluate = exercise.is_isometric() || phase.is_working();
        let knee_stability = joint_stability(
            &self.filter,
            joints::LEFT_KNEE,
            frame.joint(joints::LEFT_KNEE).visibility,
        );
        let outcome = if evaluate {
            let ctx = RuleContext::new(frame, &physics, &bio, phase, knee_stability);
            self.rules(exercise).evaluate(&ctx)
        } else {
            RuleOutcome {
                fault: None,
                form_score: 100.0,
                feedback: Feedback::new(FeedbackType::Info, "", ""),
            }
        };
        let fault = outcome.fault;
        let mut form_score = outcome.form_score;
        let mut feedback = match fault {
            Some(f) => self.scheduler.coach_fault(outcome.feedback, f, ts),
            None => outcome.feedback,
        };
        feedback.biomechanical_risk = feedback.biomechanical_risk.max(bio_risk);
        if evaluate {
            self.totals.add_form(form_score);
        }

        // Rep state machine
        let angle = driving_angle(exercise, &bio, frame);
        let update = self
            .active
            .as_mut()
            .map(|a| a.machine.update(angle, form_score, frame, ts))
            .unwrap_or_default();
        let reps_now = self.machine_view().1;

        if update.descent_confirmed && fault.is_none() {
            feedback = Feedback::new(FeedbackType::Info, "Down...", "Descending");
        }
        if exercise.is_isometric() {
            self.totals.hold(ts);
        }

        let counted_risk = self.on_rep(&update, reps_now, fault, &mut feedback);

        // Adaptive overrides
        let fatigue = self.adaptive.fatigue();
        let movement_quality =
            assess_movement_quality(form_score, &physics, &bio, self.config.physics.target_velocity);

        if let Some(risk) = counted_risk {
            if risk > st::INJURY_CRITICAL && !feedback.is_urgent() {
                feedback = Feedback::new(
                    FeedbackType::Critical,
                    "High Injury Risk",
                    "Warning! Your movement pattern shows high injury risk. Slow down, reduce range of motion, and focus on controlled movements.",
                )
                .with_priority(Priority::Immediate)
                .with_risk(RiskLevel::High);
                form_score = form_score.min(st::INJURY_FORM_CAP);
            } else if risk > st::INJURY_ELEVATED {
                feedback.biomechanical_risk = feedback.biomechanical_risk.max(RiskLevel::Medium);
            }
        }

        if !feedback.is_urgent() {
            if fatigue.is_fatigued && fatigue.severity > st::FATIGUE_WARNING_SEVERITY {
                feedback = Feedback::new(
                    FeedbackType::Warning,
                    "Fatigue Detected",
                    "Your form is dropping due to fatigue. Consider a short rest to keep quality up and prevent injury.",
                )
                .with_priority(Priority::High)
                .with_risk(RiskLevel::Medium)
                .with_landmarks(&feedback.problem_landmarks);
            } else if evaluate && fault.is_none() && !update.counted && !update.descent_confirmed {
                if let Some(fb) = self.quality_override(form_score, &movement_quality) {
                    feedback = fb;
                }
            } else if evaluate && fault.is_some() && !update.counted {
                let personal = self.adaptive.threshold(AdaptiveMetric::FormScore);
                if form_score < personal && form_score > st::BELOW_STANDARD_FLOOR {
                    feedback = Feedback::new(
                        FeedbackType::Adjustment,
                        "Below Your Standard",
                        format!(
                            "Your form is at {form_score:.0}, but you typically perform better. Focus on your usual quality."
                        ),
                    )
                    .with_priority(Priority::Medium)
                    .with_confidence(0.85)
                    .with_landmarks(&feedback.problem_landmarks);
                }
            }
        }

        if update.counted && !feedback.is_urgent() {
            if let Some(fb) = self.challenge(reps_now, form_score) {
                feedback = fb;
            }
        }

        self.scheduler.observe(&feedback);
        let should_deliver = self.scheduler.should_deliver(&feedback, ts, update.counted);
        self.last_form_score = form_score;

        AnalysisResult {
            exercise: Some(exercise),
            timestamp_ms: ts,
            phase: update.phase,
            rep_counted: update.counted,
            rep_count: reps_now,
            mistake: fault,
            form_score: form_score.clamp(0.0, 100.0),
            physics: Some(physics),
            biomechanics: Some(bio),
            movement_quality: Some(movement_quality),
            fatigue,
            injury_risk: self.last_injury_risk,
            improvement_trend: self.trend(),
            rep_quality: update.quality,
            feedback,
            should_deliver,
            smoothed_landmarks: smoothed,
        }
    }

    // ========================================================================
    // Pipeline Steps
    // ========================================================================

    fn ensure_exercise(&mut self, exercise: Exercise) {
        if self.active.as_ref().map(|a| a.exercise) == Some(exercise) {
            return;
        }
        if let Some(previous) = self.active.as_ref() {
            info!(from = %previous.exercise, to = %exercise, "Exercise changed, starting fresh workout state");
            self.scheduler.reset();
            self.adaptive.reset();
            self.totals = SessionTotals::default();
            self.last_form_score = 0.0;
            self.last_injury_risk = 0.0;
        } else {
            info!(exercise = %exercise, "Session started");
        }
        self.active = Some(ActiveExercise {
            exercise,
            machine: RepStateMachine::new(exercise, &self.config.rep_counter),
            rules: FaultRuleEngine::new(exercise),
        });
    }

    fn machine_view(&self) -> (RepPhase, u32) {
        self.active
            .as_ref()
            .map_or((RepPhase::Up, 0), |a| (a.machine.phase(), a.machine.rep_count()))
    }

    fn rules(&self, exercise: Exercise) -> FaultRuleEngine {
        self.active
            .as_ref()
            .map_or_else(|| FaultRuleEngine::new(exercise), |a| a.rules)
    }

    /// Feed a counted rep to the adaptive model and announce it.
    /// Returns the injury risk predicted for that rep.
    fn on_rep(
        &mut self,
        update: &RepUpdate,
        rep_number: u32,
        fault: Option<Fault>,
        feedback: &mut Feedback,
    ) -> Option<f64> {
        if !update.counted {
            return None;
        }
        let quality = update.quality?;
        let sample = RepSample {
            form_score: quality.form_score,
            range_of_motion: update.range_of_motion.unwrap_or(0.0),
            tempo_s: quality.duration_ms as f64 / 1000.0,
        };
        let risk = self.adaptive.injury_risk(&sample);
        self.adaptive.record(sample);
        self.last_injury_risk = risk;

        if !feedback.is_urgent() {
            let announcement = rep_announcement(rep_number, quality.overall_score, fault);
            *feedback = Feedback::new(announcement.kind, announcement.message, announcement.voice)
                .with_priority(Priority::Medium)
                .with_risk(announcement.risk)
                .with_confidence(0.95);
        }
        Some(risk)
    }

    fn quality_override(
        &self,
        form_score: f64,
        quality: &MovementQuality,
    ) -> Option<Feedback> {
        if quality.overall > st::EXCELLENT_QUALITY && form_score > st::EXCELLENT_FORM {
            Some(
                Feedback::new(
                    FeedbackType::Positive,
                    "Excellent Form!",
                    format!(
                        "Outstanding! Smooth {:.0}%, controlled {:.0}%, efficient {:.0}%. Keep it up!",
                        quality.smoothness, quality.control, quality.efficiency
                    ),
                )
                .with_priority(Priority::Medium),
            )
        } else if quality.smoothness < st::SMOOTHNESS_MIN && form_score > st::SMOOTHNESS_FORM_MIN {
            Some(
                Feedback::new(
                    FeedbackType::Adjustment,
                    "Improve Smoothness",
                    "Your form is good, but try to move more smoothly through the whole range of motion.",
                )
                .with_priority(Priority::Medium)
                .with_confidence(0.9),
            )
        } else {
            None
        }
    }

    fn challenge(&self, reps: u32, form_score: f64) -> Option<Feedback> {
        let due = reps > 0 && reps % st::CHALLENGE_EVERY_REPS == 0;
        let session_mean = self.totals.mean_form().unwrap_or(form_score);
        (due && form_score > st::CHALLENGE_FORM && session_mean > st::CHALLENGE_FORM).then(|| {
            Feedback::new(
                FeedbackType::Positive,
                "Ready for a Challenge",
                format!(
                    "Amazing work! {reps} reps with excellent form. You might be ready to increase difficulty or add weight."
                ),
            )
            .with_priority(Priority::Low)
        })
    }

    fn poor_visibility(&mut self, exercise: Exercise, ts: u64, phase: RepPhase, reps: u32) -> AnalysisResult {
        let (prompt, voice) = exercise.reposition_prompt();
        let feedback = Feedback::new(FeedbackType::Warning, prompt, voice)
            .with_priority(Priority::Immediate)
            .with_risk(RiskLevel::High)
            .with_confidence(st::DEGRADED_CONFIDENCE);
        let should_deliver = self.scheduler.should_deliver(&feedback, ts, false);
        self.last_form_score = 0.0;

        let mut result = AnalysisResult::bare(Some(exercise), ts, phase, reps, feedback);
        result.mistake = Some(Fault::PoorVisibility);
        result.should_deliver = should_deliver;
        result
    }

    fn ready(
        &mut self,
        exercise: Exercise,
        ts: u64,
        physics: PhysicsSnapshot,
        bio: BiomechanicalSnapshot,
        smoothed: Vec<Landmark>,
    ) -> AnalysisResult {
        let feedback = Feedback::new(FeedbackType::Info, "Ready to Start", ready_prompt(exercise));
        let should_deliver = self.scheduler.should_deliver(&feedback, ts, false);
        self.last_form_score = 0.0;

        let mut result = AnalysisResult::bare(Some(exercise), ts, RepPhase::Up, 0, feedback);
        result.physics = Some(physics);
        result.biomechanics = Some(bio);
        result.should_deliver = should_deliver;
        result.smoothed_landmarks = smoothed;
        result
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn exercise(&self) -> Option<Exercise> {
        self.active.as_ref().map(|a| a.exercise)
    }

    pub fn phase(&self) -> RepPhase {
        self.machine_view().0
    }

    pub fn rep_count(&self) -> u32 {
        self.machine_view().1
    }

    pub fn rep_stats(&self) -> RepStats {
        self.active
            .as_ref()
            .map(|a| a.machine.stats())
            .unwrap_or_default()
    }

    pub fn rep_history(&self) -> &[RepQuality] {
        self.active.as_ref().map_or(&[], |a| a.machine.history())
    }

    pub fn trend(&self) -> QualityTrend {
        self.active
            .as_ref()
            .map_or(QualityTrend::Stable, |a| a.machine.quality_trend())
    }

    pub fn totals(&self) -> &SessionTotals {
        &self.totals
    }

    pub fn progress(&self) -> CoachProgress {
        self.scheduler.progress()
    }

    pub fn scheduler(&self) -> &FeedbackScheduler {
        &self.scheduler
    }

    pub fn adaptive(&self) -> &AdaptiveRiskModel {
        &self.adaptive
    }

    pub fn filter(&self) -> &LandmarkStreamFilter {
        &self.filter
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LANDMARK_COUNT;

    /// Side-on squat pose with knee angle `knee_deg`: vertical shins,
    /// upright torso, both legs identical.
    fn squat_pose(ts: u64, knee_deg: f64) -> LandmarkFrame {
        let mut l = vec![Landmark::new(0.5, 0.5, 0.0, 1.0); LANDMARK_COUNT];
        let theta = knee_deg.to_radians();
        let (kx, ky) = (0.5, 0.7);
        let (hx, hy) = (kx - 0.2 * theta.sin(), ky + 0.2 * theta.cos());
        for side in 0..2 {
            l[joints::LEFT_ANKLE + side] = Landmark::new(kx, 0.9, 0.0, 1.0);
            l[joints::LEFT_KNEE + side] = Landmark::new(kx, ky, 0.0, 1.0);
            l[joints::LEFT_HIP + side] = Landmark::new(hx, hy, 0.0, 1.0);
            l[joints::LEFT_SHOULDER + side] = Landmark::new(hx, hy - 0.25, 0.0, 1.0);
        }
        LandmarkFrame::new(ts, l)
    }

    fn session() -> AnalysisSession {
        AnalysisSession::new(CoachConfig::default())
    }

    #[test]
    fn test_unknown_exercise_is_terminal() {
        let mut s = session();
        let r = s.analyze("burpees", &squat_pose(0, 170.0), RepPhase::Down, 4, 70.0);
        assert_eq!(r.exercise, None);
        assert_eq!(r.feedback.confidence, 0.0);
        assert_eq!(r.phase, RepPhase::Down);
        assert_eq!(r.rep_count, 4);
        assert!(r.should_deliver);
    }

    #[test]
    fn test_first_still_frame_is_ready() {
        let mut s = session();
        let r = s.analyze("squats", &squat_pose(0, 175.0), RepPhase::Up, 0, 70.0);
        assert_eq!(r.feedback.message, "Ready to Start");
        assert_eq!(r.form_score, 0.0);
        assert!(r.mistake.is_none());
    }

    #[test]
    fn test_hidden_knee_reports_poor_visibility() {
        let mut s = session();
        let mut frame = squat_pose(0, 170.0);
        frame.landmarks[joints::LEFT_KNEE].visibility = 0.4;
        let r = s.analyze("squats", &frame, RepPhase::Up, 0, 70.0);
        assert_eq!(r.mistake, Some(Fault::PoorVisibility));
        assert_eq!(r.form_score, 0.0);
        assert_eq!(r.feedback.priority, Priority::Immediate);
        assert!((r.feedback.confidence - 0.3).abs() < 1e-9);
        assert!(r.should_deliver);
        assert!(s.filter().is_empty());
    }

    #[test]
    fn test_truncated_frame_reports_poor_visibility() {
        let mut s = session();
        let frame = LandmarkFrame::new(0, vec![Landmark::new(0.5, 0.5, 0.0, 1.0); 12]);
        let r = s.analyze("pushups", &frame, RepPhase::Up, 0, 70.0);
        assert_eq!(r.mistake, Some(Fault::PoorVisibility));
        assert!(s.filter().is_empty());
    }

    #[test]
    fn test_glitch_frame_is_skipped() {
        let mut s = session();
        s.analyze("squats", &squat_pose(0, 175.0), RepPhase::Up, 0, 70.0);
        let mut glitch = squat_pose(33, 175.0);
        glitch.landmarks[joints::NOSE] = Landmark::new(0.95, 0.05, 0.0, 0.9);
        let r = s.analyze("squats", &glitch, RepPhase::Up, 0, 70.0);
        assert_eq!(r.feedback.message, "Re-acquiring");
        assert!(!r.should_deliver);
        assert_eq!(s.filter().total_rejected(), 1);
    }

    #[test]
    fn test_exercise_switch_resets_machine() {
        let mut s = session();
        s.analyze("squats", &squat_pose(0, 175.0), RepPhase::Up, 0, 70.0);
        assert_eq!(s.exercise(), Some(Exercise::Squats));
        s.analyze("plank", &squat_pose(33, 175.0), RepPhase::Up, 0, 70.0);
        assert_eq!(s.exercise(), Some(Exercise::Plank));
        assert_eq!(s.phase(), RepPhase::Holding);
    }

    #[test]
    fn test_one_squat_cycle() {
        let mut s = session();
        let mut angles: Vec<f64> = (0..10).map(|i| 175.0 - f64::from(i) * 60.0 / 9.0).collect();
        angles.extend((1..=10).map(|i| 115.0 + f64::from(i) * 5.5));

        let mut counted = 0;
        let mut bottom = None;
        for (i, angle) in angles.iter().enumerate() {
            let r = s.analyze("squats", &squat_pose(i as u64 * 50, *angle), RepPhase::Up, 0, 70.0);
            if r.rep_counted {
                counted += 1;
            }
            if i == 9 {
                bottom = Some(r);
            }
        }
        assert_eq!(counted, 1);
        assert_eq!(s.rep_count(), 1);
        let bottom = bottom.unwrap();
        assert_eq!(bottom.mistake, Some(Fault::NotDeepEnough));
        assert!((bottom.form_score - 97.0).abs() < 1e-9);
    }
}
