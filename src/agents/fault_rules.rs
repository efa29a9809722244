//! Fault Rule Engine
//!
//! Each exercise owns an ordered table of [`FaultRule`]s. Rules are tried
//! top to bottom and the first predicate that matches names the frame's
//! fault; the rest are skipped. Faults never accumulate, so a frame's form
//! score is always `100 − penalty` of at most one rule.
//!
//! Adding an exercise or a fault is a table edit: a predicate, a penalty,
//! a risk tier, a priority and the message pair.

use crate::physics_engine::{angle_3d, direction_difference, segment_direction};
use crate::types::{
    joints, BiomechanicalSnapshot, Exercise, Fault, Feedback, FeedbackType, JointAngles,
    LandmarkFrame, PhysicsSnapshot, Priority, RepPhase, RiskLevel,
};

// ============================================================================
// Rule Thresholds
// ============================================================================

/// Geometric limits used by the rule predicates
pub mod rule_thresholds {
    /// Torso vs shin direction difference before the chest is "falling" (deg)
    pub const CHEST_FALL_DEG: f64 = 50.0;
    /// Knee crossing the ankle line by more than this (normalized x)
    pub const VALGUS_MARGIN: f64 = 0.02;
    /// Knee stability score below which knees are "unstable"
    pub const KNEE_STABILITY_MIN: f64 = 60.0;
    /// Hip higher than the knee by more than this at the bottom (normalized y)
    pub const SQUAT_DEPTH_MARGIN: f64 = 0.03;

    /// Shoulder-hip-ankle angle below which a push-up body line sags (deg)
    pub const PUSHUP_BODY_LINE_MIN: f64 = 160.0;
    /// Summed |elbow.x − shoulder.x| of both arms before elbows "flare"
    pub const ELBOW_FLARE_MAX: f64 = 0.3;
    /// Elbow angle the bottom of a push-up should reach (deg)
    pub const PUSHUP_DEPTH_DEG: f64 = 90.0;

    /// Acceptable front-knee angle band at the bottom of a lunge (deg)
    pub const LUNGE_KNEE_MIN: f64 = 80.0;
    pub const LUNGE_KNEE_MAX: f64 = 100.0;
    /// Balance score below which a lunge is unbalanced
    pub const LUNGE_BALANCE_MIN: f64 = 60.0;

    /// Plank body line below which the hips sag (deg)
    pub const PLANK_SAG_DEG: f64 = 155.0;
    /// Plank body line below which raised hips are flagged (deg)
    pub const PLANK_PIKE_DEG: f64 = 165.0;
    /// Core stability below which the plank is shaking
    pub const PLANK_STABILITY_MIN: f64 = 50.0;
    /// Body line and stability a "perfect" plank exceeds
    pub const PLANK_PERFECT_DEG: f64 = 170.0;
    pub const PLANK_PERFECT_STABILITY: f64 = 70.0;
}

use rule_thresholds as th;

// ============================================================================
// Rule Context
// ============================================================================

/// Everything a predicate may inspect for one frame.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub frame: &'a LandmarkFrame,
    pub physics: &'a PhysicsSnapshot,
    pub bio: &'a BiomechanicalSnapshot,
    /// Confirmed phase before this frame updates the state machine
    pub phase: RepPhase,
    /// Left-knee stability (0..=100)
    pub knee_stability: f64,
    /// Left shoulder-hip-ankle angle (deg)
    pub body_line: f64,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        frame: &'a LandmarkFrame,
        physics: &'a PhysicsSnapshot,
        bio: &'a BiomechanicalSnapshot,
        phase: RepPhase,
        knee_stability: f64,
    ) -> Self {
        Self {
            frame,
            physics,
            bio,
            phase,
            knee_stability,
            body_line: body_line_angle(frame),
        }
    }

    fn angles(&self) -> &JointAngles {
        &self.bio.joint_angles
    }

    fn at_bottom(&self) -> bool {
        matches!(self.phase, RepPhase::Down | RepPhase::TransitionUp)
    }
}

/// Left shoulder-hip-ankle 3D angle.
///
/// Side-on exercises only gate the left side on visibility, so the far side
/// is never read here.
pub fn body_line_angle(frame: &LandmarkFrame) -> f64 {
    angle_3d(
        &frame.joint(joints::LEFT_SHOULDER),
        &frame.joint(joints::LEFT_HIP),
        &frame.joint(joints::LEFT_ANKLE),
    )
}

/// Signed vertical offset of the left hip from the shoulder-ankle line.
///
/// Positive means the hip is below the line (image y grows downward). A
/// vertical shoulder-ankle line yields 0.
pub fn hip_line_offset(frame: &LandmarkFrame) -> f64 {
    let s = frame.joint(joints::LEFT_SHOULDER);
    let h = frame.joint(joints::LEFT_HIP);
    let a = frame.joint(joints::LEFT_ANKLE);
    let dx = a.x - s.x;
    if dx.abs() < 1e-9 {
        return 0.0;
    }
    let line_y = s.y + (h.x - s.x) * (a.y - s.y) / dx;
    h.y - line_y
}

/// `(front_knee, front_ankle, front_knee_angle)`; the front leg is the one
/// with the smaller ankle x.
fn front_leg(ctx: &RuleContext<'_>) -> (f64, f64, f64) {
    let f = ctx.frame;
    if f.joint(joints::LEFT_ANKLE).x < f.joint(joints::RIGHT_ANKLE).x {
        (
            f.joint(joints::LEFT_KNEE).x,
            f.joint(joints::LEFT_ANKLE).x,
            ctx.angles().left_knee,
        )
    } else {
        (
            f.joint(joints::RIGHT_KNEE).x,
            f.joint(joints::RIGHT_ANKLE).x,
            ctx.angles().right_knee,
        )
    }
}

// ============================================================================
// Predicates
// ============================================================================

fn chest_falling(ctx: &RuleContext<'_>) -> bool {
    let f = ctx.frame;
    let torso = segment_direction(&f.joint(joints::LEFT_HIP), &f.joint(joints::LEFT_SHOULDER));
    let shin = segment_direction(&f.joint(joints::LEFT_ANKLE), &f.joint(joints::LEFT_KNEE));
    direction_difference(torso, shin) > th::CHEST_FALL_DEG
}

fn knee_valgus(ctx: &RuleContext<'_>) -> bool {
    let f = ctx.frame;
    let left = f.joint(joints::LEFT_KNEE).x > f.joint(joints::LEFT_ANKLE).x + th::VALGUS_MARGIN;
    let right = f.joint(joints::RIGHT_KNEE).x < f.joint(joints::RIGHT_ANKLE).x - th::VALGUS_MARGIN;
    left || right
}

fn unstable_knees(ctx: &RuleContext<'_>) -> bool {
    ctx.knee_stability < th::KNEE_STABILITY_MIN
}

fn squat_too_shallow(ctx: &RuleContext<'_>) -> bool {
    let f = ctx.frame;
    let above = |hip: usize, knee: usize| {
        f.joint(hip).y < f.joint(knee).y - th::SQUAT_DEPTH_MARGIN
    };
    ctx.at_bottom()
        && above(joints::LEFT_HIP, joints::LEFT_KNEE)
        && above(joints::RIGHT_HIP, joints::RIGHT_KNEE)
}

fn pushup_hip_sag(ctx: &RuleContext<'_>) -> bool {
    ctx.body_line < th::PUSHUP_BODY_LINE_MIN
}

fn elbows_flaring(ctx: &RuleContext<'_>) -> bool {
    let f = ctx.frame;
    let flare = (f.joint(joints::LEFT_ELBOW).x - f.joint(joints::LEFT_SHOULDER).x).abs()
        + (f.joint(joints::RIGHT_ELBOW).x - f.joint(joints::RIGHT_SHOULDER).x).abs();
    flare > th::ELBOW_FLARE_MAX
}

fn pushup_too_shallow(ctx: &RuleContext<'_>) -> bool {
    ctx.at_bottom() && ctx.angles().avg_elbow() >= th::PUSHUP_DEPTH_DEG
}

fn knee_over_toes(ctx: &RuleContext<'_>) -> bool {
    // Facing the small-x side, so "ahead" is smaller x
    let (knee_x, ankle_x, _) = front_leg(ctx);
    knee_x < ankle_x
}

fn lunge_depth_off(ctx: &RuleContext<'_>) -> bool {
    let (_, _, angle) = front_leg(ctx);
    ctx.at_bottom() && !(th::LUNGE_KNEE_MIN..=th::LUNGE_KNEE_MAX).contains(&angle)
}

fn lunge_unbalanced(ctx: &RuleContext<'_>) -> bool {
    ctx.bio.balance_score < th::LUNGE_BALANCE_MIN
}

fn plank_hip_sag(ctx: &RuleContext<'_>) -> bool {
    ctx.body_line < th::PLANK_SAG_DEG && hip_line_offset(ctx.frame) > 0.0
}

fn plank_hips_high(ctx: &RuleContext<'_>) -> bool {
    ctx.body_line < th::PLANK_PIKE_DEG && hip_line_offset(ctx.frame) < 0.0
}

fn plank_unstable(ctx: &RuleContext<'_>) -> bool {
    ctx.physics.stability < th::PLANK_STABILITY_MIN
}

// ============================================================================
// Rule Tables
// ============================================================================

/// One row of an exercise's fault table.
#[derive(Clone, Copy)]
pub struct FaultRule {
    pub fault: Fault,
    pub predicate: fn(&RuleContext<'_>) -> bool,
    /// Form-score points deducted when this rule wins
    pub penalty: f64,
    pub risk: RiskLevel,
    pub priority: Priority,
    pub kind: FeedbackType,
    pub message: &'static str,
    pub voice: &'static str,
    pub landmarks: &'static [usize],
    pub confidence: f64,
}

impl std::fmt::Debug for FaultRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultRule")
            .field("fault", &self.fault)
            .field("penalty", &self.penalty)
            .field("risk", &self.risk)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl FaultRule {
    pub fn matches(&self, ctx: &RuleContext<'_>) -> bool {
        (self.predicate)(ctx)
    }

    pub fn feedback(&self) -> Feedback {
        Feedback::new(self.kind, self.message, self.voice)
            .with_priority(self.priority)
            .with_risk(self.risk)
            .with_confidence(self.confidence)
            .with_landmarks(self.landmarks)
    }
}

pub static SQUAT_RULES: &[FaultRule] = &[
    FaultRule {
        fault: Fault::ChestFalling,
        predicate: chest_falling,
        penalty: 8.0,
        risk: RiskLevel::Medium,
        priority: Priority::Low,
        kind: FeedbackType::Adjustment,
        message: "Keep That Chest Up!",
        voice: "Great effort! Just lift your chest a bit more and you'll have perfect form!",
        landmarks: &[
            joints::LEFT_SHOULDER,
            joints::RIGHT_SHOULDER,
            joints::LEFT_HIP,
            joints::RIGHT_HIP,
        ],
        confidence: 0.9,
    },
    FaultRule {
        fault: Fault::KneeValgus,
        predicate: knee_valgus,
        penalty: 6.0,
        risk: RiskLevel::Medium,
        priority: Priority::Low,
        kind: FeedbackType::Adjustment,
        message: "Push Knees Out!",
        voice: "Nice work! Just push your knees outward a bit and you're golden!",
        landmarks: &[joints::LEFT_KNEE, joints::RIGHT_KNEE],
        confidence: 0.85,
    },
    FaultRule {
        fault: Fault::UnstableKnees,
        predicate: unstable_knees,
        penalty: 4.0,
        risk: RiskLevel::Low,
        priority: Priority::Low,
        kind: FeedbackType::Adjustment,
        message: "Almost There!",
        voice: "Great job! Just stabilize those knees a bit more, you've got this!",
        landmarks: &[joints::LEFT_KNEE, joints::RIGHT_KNEE],
        confidence: 0.75,
    },
    FaultRule {
        fault: Fault::NotDeepEnough,
        predicate: squat_too_shallow,
        penalty: 3.0,
        risk: RiskLevel::Low,
        priority: Priority::Low,
        kind: FeedbackType::Adjustment,
        message: "You Can Go Deeper!",
        voice: "Awesome control! Try going a bit deeper next time, you're doing amazing!",
        landmarks: &[joints::LEFT_HIP, joints::RIGHT_HIP],
        confidence: 0.8,
    },
];

pub static PUSHUP_RULES: &[FaultRule] = &[
    FaultRule {
        fault: Fault::HipSag,
        predicate: pushup_hip_sag,
        penalty: 10.0,
        risk: RiskLevel::Medium,
        priority: Priority::Low,
        kind: FeedbackType::Adjustment,
        message: "Engage That Core!",
        voice: "Great effort! Tighten your core and keep your body straight, you've got this!",
        landmarks: &[joints::LEFT_HIP, joints::RIGHT_HIP],
        confidence: 0.9,
    },
    FaultRule {
        fault: Fault::ElbowsFlaring,
        predicate: elbows_flaring,
        penalty: 6.0,
        risk: RiskLevel::Low,
        priority: Priority::Low,
        kind: FeedbackType::Adjustment,
        message: "Tuck Those Elbows!",
        voice: "Nice work! Just bring your elbows in a bit closer and you'll be perfect!",
        landmarks: &[joints::LEFT_ELBOW, joints::RIGHT_ELBOW],
        confidence: 0.8,
    },
    FaultRule {
        fault: Fault::LowerChestMore,
        predicate: pushup_too_shallow,
        penalty: 5.0,
        risk: RiskLevel::Low,
        priority: Priority::Low,
        kind: FeedbackType::Adjustment,
        message: "Go Lower!",
        voice: "Good effort! Try going a bit lower next time.",
        landmarks: &[joints::LEFT_SHOULDER, joints::RIGHT_SHOULDER],
        confidence: 0.75,
    },
];

pub static LUNGE_RULES: &[FaultRule] = &[
    FaultRule {
        fault: Fault::KneeOverToes,
        predicate: knee_over_toes,
        penalty: 7.0,
        risk: RiskLevel::Medium,
        priority: Priority::Low,
        kind: FeedbackType::Adjustment,
        message: "Shift Back!",
        voice: "Great lunge! Just shift your weight back slightly, you're almost perfect!",
        landmarks: &[joints::LEFT_KNEE, joints::RIGHT_KNEE],
        confidence: 0.9,
    },
    FaultRule {
        fault: Fault::IncorrectDepth,
        predicate: lunge_depth_off,
        penalty: 5.0,
        risk: RiskLevel::Low,
        priority: Priority::Low,
        kind: FeedbackType::Adjustment,
        message: "Aim for 90 Degrees",
        voice: "Nice lunge! Aim for 90 degrees and you'll be spot on!",
        landmarks: &[joints::LEFT_KNEE, joints::RIGHT_KNEE],
        confidence: 0.75,
    },
    FaultRule {
        fault: Fault::PoorBalance,
        predicate: lunge_unbalanced,
        penalty: 4.0,
        risk: RiskLevel::Low,
        priority: Priority::Low,
        kind: FeedbackType::Adjustment,
        message: "Stay Balanced!",
        voice: "Excellent effort! Keep that core tight and you'll nail the balance!",
        landmarks: &[joints::LEFT_HIP, joints::RIGHT_HIP],
        confidence: 0.7,
    },
];

pub static PLANK_RULES: &[FaultRule] = &[
    FaultRule {
        fault: Fault::HipSag,
        predicate: plank_hip_sag,
        penalty: 30.0,
        risk: RiskLevel::High,
        priority: Priority::Immediate,
        kind: FeedbackType::Critical,
        message: "Lift Hips!",
        voice: "Engage your core and glutes to lift your hips. Don't let your back sag, protect your spine!",
        landmarks: &[joints::LEFT_HIP],
        confidence: 0.9,
    },
    FaultRule {
        fault: Fault::HipsTooHigh,
        predicate: plank_hips_high,
        penalty: 30.0,
        risk: RiskLevel::Medium,
        priority: Priority::High,
        kind: FeedbackType::Adjustment,
        message: "Lower Hips",
        voice: "Lower your hips to form a straight line from shoulders to ankles.",
        landmarks: &[joints::LEFT_HIP],
        confidence: 0.85,
    },
    FaultRule {
        fault: Fault::UnstableCore,
        predicate: plank_unstable,
        penalty: 25.0,
        risk: RiskLevel::Medium,
        priority: Priority::High,
        kind: FeedbackType::Adjustment,
        message: "Stabilize Core",
        voice: "Your core is shaking. Breathe steadily and engage your abdominal muscles.",
        landmarks: &[joints::LEFT_HIP],
        confidence: 0.75,
    },
];

/// The ordered rule table for an exercise.
pub fn rules_for(exercise: Exercise) -> &'static [FaultRule] {
    match exercise {
        Exercise::Squats => SQUAT_RULES,
        Exercise::Pushups => PUSHUP_RULES,
        Exercise::Lunges => LUNGE_RULES,
        Exercise::Plank => PLANK_RULES,
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Verdict for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub fault: Option<Fault>,
    /// `100 − penalty` of the winning rule, or 100
    pub form_score: f64,
    pub feedback: Feedback,
}

#[derive(Debug, Clone, Copy)]
pub struct FaultRuleEngine {
    exercise: Exercise,
    rules: &'static [FaultRule],
}

impl FaultRuleEngine {
    pub fn new(exercise: Exercise) -> Self {
        Self {
            exercise,
            rules: rules_for(exercise),
        }
    }

    pub fn exercise(&self) -> Exercise {
        self.exercise
    }

    pub fn rules(&self) -> &'static [FaultRule] {
        self.rules
    }

    /// First matching rule wins; with no match the frame scores 100.
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        match self.rules.iter().find(|rule| rule.matches(ctx)) {
            Some(rule) => RuleOutcome {
                fault: Some(rule.fault),
                form_score: (100.0 - rule.penalty).clamp(0.0, 100.0),
                feedback: rule.feedback(),
            },
            None => RuleOutcome {
                fault: None,
                form_score: 100.0,
                feedback: self.good_form(ctx),
            },
        }
    }

    fn good_form(&self, ctx: &RuleContext<'_>) -> Feedback {
        let (message, voice) = match self.exercise {
            Exercise::Squats => (
                "Perfect Form!",
                "Incredible! Your technique is spot-on! Keep it up!",
            ),
            Exercise::Pushups => (
                "Perfect Depth!",
                "That's excellent depth, your form is incredible!",
            ),
            Exercise::Lunges => ("Perfect!", "Excellent lunge form! Your technique is on point!"),
            Exercise::Plank => {
                if ctx.body_line > th::PLANK_PERFECT_DEG
                    && ctx.physics.stability > th::PLANK_PERFECT_STABILITY
                {
                    ("Perfect!", "Perfect form! Keep holding that strong position!")
                } else {
                    return Feedback::new(
                        FeedbackType::Info,
                        "Keep holding",
                        "Keep holding, stay strong.",
                    );
                }
            }
        };
        Feedback::new(FeedbackType::Positive, message, voice)
            .with_priority(Priority::Medium)
            .with_confidence(0.95)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Landmark, LANDMARK_COUNT};

    fn base() -> Vec<Landmark> {
        vec![Landmark::new(0.5, 0.5, 0.0, 1.0); LANDMARK_COUNT]
    }

    fn set(lms: &mut [Landmark], idx: usize, x: f64, y: f64) {
        lms[idx] = Landmark::new(x, y, 0.0, 1.0);
    }

    /// Upright squat bottom: vertical shins and torso, hips `hip_y`.
    fn squat_frame(hip_y: f64) -> LandmarkFrame {
        let mut l = base();
        for (side, x) in [(0, 0.45), (1, 0.55)] {
            set(&mut l, joints::LEFT_ANKLE + side, x, 0.9);
            set(&mut l, joints::LEFT_KNEE + side, x, 0.7);
            set(&mut l, joints::LEFT_HIP + side, x, hip_y);
            set(&mut l, joints::LEFT_SHOULDER + side, x, hip_y - 0.25);
        }
        LandmarkFrame::new(0, l)
    }

    fn evaluate(exercise: Exercise, frame: &LandmarkFrame, phase: RepPhase, knee_stab: f64) -> RuleOutcome {
        let physics = PhysicsSnapshot {
            stability: 90.0,
            ..Default::default()
        };
        let bio = crate::physics_engine::compute_biomechanics(frame, &Default::default());
        let ctx = RuleContext::new(frame, &physics, &bio, phase, knee_stab);
        FaultRuleEngine::new(exercise).evaluate(&ctx)
    }

    #[test]
    fn test_shallow_squat_at_bottom() {
        let out = evaluate(Exercise::Squats, &squat_frame(0.6), RepPhase::Down, 100.0);
        assert_eq!(out.fault, Some(Fault::NotDeepEnough));
        assert!((out.form_score - 97.0).abs() < 1e-9);
    }

    #[test]
    fn test_depth_rule_ignored_outside_bottom() {
        let out = evaluate(Exercise::Squats, &squat_frame(0.6), RepPhase::TransitionDown, 100.0);
        assert_eq!(out.fault, None);
        assert_eq!(out.form_score, 100.0);
        assert_eq!(out.feedback.kind, FeedbackType::Positive);
    }

    #[test]
    fn test_first_match_wins() {
        // Valgus and unstable knees both hold; valgus is earlier in the table
        let mut frame = squat_frame(0.72);
        frame.landmarks[joints::LEFT_KNEE].x = 0.5;
        let out = evaluate(Exercise::Squats, &frame, RepPhase::Down, 10.0);
        assert_eq!(out.fault, Some(Fault::KneeValgus));
        assert!((out.form_score - 94.0).abs() < 1e-9);
        assert_eq!(out.feedback.biomechanical_risk, RiskLevel::Medium);
    }

    #[test]
    fn test_chest_falling_on_leaning_torso() {
        let mut frame = squat_frame(0.72);
        // torso tipped far forward
        frame.landmarks[joints::LEFT_SHOULDER] = Landmark::new(0.2, 0.65, 0.0, 1.0);
        let out = evaluate(Exercise::Squats, &frame, RepPhase::Down, 100.0);
        assert_eq!(out.fault, Some(Fault::ChestFalling));
    }

    #[test]
    fn test_plank_sag_is_immediate() {
        let mut l = base();
        set(&mut l, joints::LEFT_SHOULDER, 0.2, 0.5);
        set(&mut l, joints::RIGHT_SHOULDER, 0.2, 0.5);
        set(&mut l, joints::LEFT_HIP, 0.5, 0.62);
        set(&mut l, joints::RIGHT_HIP, 0.5, 0.62);
        set(&mut l, joints::LEFT_ANKLE, 0.8, 0.5);
        set(&mut l, joints::RIGHT_ANKLE, 0.8, 0.5);
        let frame = LandmarkFrame::new(0, l);
        assert!(hip_line_offset(&frame) > 0.0);
        let out = evaluate(Exercise::Plank, &frame, RepPhase::Holding, 100.0);
        assert_eq!(out.fault, Some(Fault::HipSag));
        assert!((out.form_score - 70.0).abs() < 1e-9);
        assert!(out.feedback.is_urgent());
    }

    #[test]
    fn test_plank_straight_line_is_positive() {
        let mut l = base();
        for side in 0..2 {
            set(&mut l, joints::LEFT_SHOULDER + side, 0.2, 0.5);
            set(&mut l, joints::LEFT_HIP + side, 0.5, 0.5);
            set(&mut l, joints::LEFT_ANKLE + side, 0.8, 0.5);
        }
        let out = evaluate(Exercise::Plank, &LandmarkFrame::new(0, l), RepPhase::Holding, 100.0);
        assert_eq!(out.fault, None);
        assert_eq!(out.feedback.kind, FeedbackType::Positive);
    }

    #[test]
    fn test_plank_ignores_hidden_far_side() {
        let mut l = base();
        set(&mut l, joints::LEFT_SHOULDER, 0.2, 0.5);
        set(&mut l, joints::LEFT_HIP, 0.5, 0.5);
        set(&mut l, joints::LEFT_ANKLE, 0.8, 0.5);
        // Low-confidence guesses for the side facing away from the camera
        l[joints::RIGHT_SHOULDER] = Landmark::new(0.2, 0.5, 0.0, 0.1);
        l[joints::RIGHT_HIP] = Landmark::new(0.5, 0.95, 0.0, 0.1);
        l[joints::RIGHT_ANKLE] = Landmark::new(0.8, 0.5, 0.0, 0.1);
        let frame = LandmarkFrame::new(0, l);

        assert!(body_line_angle(&frame) > 179.9);
        let out = evaluate(Exercise::Plank, &frame, RepPhase::Holding, 100.0);
        assert_eq!(out.fault, None);
        assert_eq!(out.form_score, 100.0);
    }

    // ------------------------------------------------------------------------
    // Push-ups
    // ------------------------------------------------------------------------

    /// Side-on push-up: straight body at y = 0.6, upper arm hanging from the
    /// shoulder, forearm bent to `elbow_deg`. `hip_drop` lowers the left hip
    /// and `flare` pushes both elbows out along x.
    fn pushup_frame(elbow_deg: f64, hip_drop: f64, flare: f64) -> LandmarkFrame {
        let theta = elbow_deg.to_radians();
        let mut l = base();
        for side in 0..2 {
            let (ex, ey) = (0.3 + flare, 0.72);
            set(&mut l, joints::LEFT_SHOULDER + side, 0.3, 0.6);
            set(&mut l, joints::LEFT_ELBOW + side, ex, ey);
            set(&mut l, joints::LEFT_WRIST + side, ex + 0.12 * theta.sin(), ey - 0.12 * theta.cos());
            set(&mut l, joints::LEFT_HIP + side, 0.55, 0.6);
            set(&mut l, joints::LEFT_ANKLE + side, 0.8, 0.6);
        }
        l[joints::LEFT_HIP].y += hip_drop;
        LandmarkFrame::new(0, l)
    }

    #[test]
    fn test_pushup_rules() {
        let cases = [
            // (elbow, hip drop, flare, phase, fault, form)
            (170.0, 0.0, 0.0, RepPhase::Up, None, 100.0),
            (170.0, 0.06, 0.0, RepPhase::Up, Some(Fault::HipSag), 90.0),
            (170.0, 0.0, 0.2, RepPhase::Up, Some(Fault::ElbowsFlaring), 94.0),
            (100.0, 0.0, 0.0, RepPhase::Down, Some(Fault::LowerChestMore), 95.0),
            (100.0, 0.0, 0.0, RepPhase::TransitionDown, None, 100.0),
            (80.0, 0.0, 0.0, RepPhase::Down, None, 100.0),
            // Sagging hips outrank a shallow bottom
            (100.0, 0.06, 0.0, RepPhase::Down, Some(Fault::HipSag), 90.0),
        ];
        for (elbow, drop, flare, phase, fault, form) in cases {
            let out = evaluate(Exercise::Pushups, &pushup_frame(elbow, drop, flare), phase, 100.0);
            assert_eq!(out.fault, fault, "elbow {elbow} drop {drop} flare {flare} {phase:?}");
            assert!((out.form_score - form).abs() < 1e-9, "form {}", out.form_score);
        }
    }

    #[test]
    fn test_pushup_good_depth_is_positive() {
        let out = evaluate(Exercise::Pushups, &pushup_frame(80.0, 0.0, 0.0), RepPhase::Down, 100.0);
        assert_eq!(out.feedback.kind, FeedbackType::Positive);
        assert_eq!(out.feedback.message, "Perfect Depth!");
    }

    // ------------------------------------------------------------------------
    // Lunges
    // ------------------------------------------------------------------------

    /// Side-on lunge facing small x: left leg forward with its knee at
    /// `knee_deg`, shifted `knee_dx` along x. Filler landmarks sit over the
    /// centre of the feet so balance stays high.
    fn lunge_frame(knee_deg: f64, knee_dx: f64) -> LandmarkFrame {
        let theta = knee_deg.to_radians();
        let mut l = vec![Landmark::new(0.525, 0.5, 0.0, 1.0); LANDMARK_COUNT];
        let (kx, ky) = (0.4, 0.7);
        let (hx, hy) = (kx + 0.2 * theta.sin(), ky + 0.2 * theta.cos());
        set(&mut l, joints::LEFT_ANKLE, 0.4, 0.9);
        set(&mut l, joints::LEFT_KNEE, kx + knee_dx, ky);
        set(&mut l, joints::LEFT_HIP, hx, hy);
        set(&mut l, joints::RIGHT_ANKLE, 0.65, 0.9);
        set(&mut l, joints::RIGHT_KNEE, 0.65, 0.8);
        set(&mut l, joints::RIGHT_HIP, hx, hy);
        LandmarkFrame::new(0, l)
    }

    #[test]
    fn test_lunge_rules() {
        let cases = [
            // (front knee, knee dx, phase, fault, form)
            (90.0, 0.0, RepPhase::Down, None, 100.0),
            (90.0, -0.03, RepPhase::Down, Some(Fault::KneeOverToes), 93.0),
            (170.0, -0.03, RepPhase::Up, Some(Fault::KneeOverToes), 93.0),
            (120.0, 0.0, RepPhase::Down, Some(Fault::IncorrectDepth), 95.0),
            (70.0, 0.0, RepPhase::TransitionUp, Some(Fault::IncorrectDepth), 95.0),
            (120.0, 0.0, RepPhase::TransitionDown, None, 100.0),
        ];
        for (knee, dx, phase, fault, form) in cases {
            let out = evaluate(Exercise::Lunges, &lunge_frame(knee, dx), phase, 100.0);
            assert_eq!(out.fault, fault, "knee {knee} dx {dx} {phase:?}");
            assert!((out.form_score - form).abs() < 1e-9, "form {}", out.form_score);
        }
    }

    #[test]
    fn test_knee_exactly_over_ankle_is_not_over_toes() {
        let frame = lunge_frame(170.0, 0.0);
        assert_eq!(frame.joint(joints::LEFT_KNEE).x, frame.joint(joints::LEFT_ANKLE).x);
        let out = evaluate(Exercise::Lunges, &frame, RepPhase::Up, 100.0);
        assert_eq!(out.fault, None);
    }

    #[test]
    fn test_lunge_poor_balance() {
        let mut frame = lunge_frame(90.0, 0.0);
        for (i, lm) in frame.landmarks.iter_mut().enumerate() {
            if i != joints::LEFT_ANKLE && i != joints::RIGHT_ANKLE {
                lm.x += 0.2;
            }
        }
        let out = evaluate(Exercise::Lunges, &frame, RepPhase::Up, 100.0);
        assert_eq!(out.fault, Some(Fault::PoorBalance));
        assert!((out.form_score - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_every_table_is_non_empty() {
        for exercise in Exercise::ALL {
            assert!(!rules_for(exercise).is_empty());
            assert!(rules_for(exercise).iter().all(|r| r.penalty > 0.0 && r.penalty <= 100.0));
        }
    }
}
