//! Posture summary: joint angles, left/right asymmetry, balance and
//! camera-distance estimate.

use super::angles::angle_3d;
use crate::config::PhysicsConfig;
use crate::types::{joints, BiomechanicalSnapshot, JointAngles, LandmarkFrame};

/// Range of motion reported until exercise-specific calibration exists.
///
/// This is a fixed value, not a measurement; per-rep ROM used by the adaptive
/// model comes from the rep counter's observed angle range instead.
pub const PLACEHOLDER_RANGE_OF_MOTION: f64 = 85.0;

/// 3D knee, elbow and hip angles for both sides.
pub fn joint_angles(frame: &LandmarkFrame) -> JointAngles {
    let j = |i| frame.joint(i);
    JointAngles {
        left_knee: angle_3d(&j(joints::LEFT_HIP), &j(joints::LEFT_KNEE), &j(joints::LEFT_ANKLE)),
        right_knee: angle_3d(&j(joints::RIGHT_HIP), &j(joints::RIGHT_KNEE), &j(joints::RIGHT_ANKLE)),
        left_elbow: angle_3d(&j(joints::LEFT_SHOULDER), &j(joints::LEFT_ELBOW), &j(joints::LEFT_WRIST)),
        right_elbow: angle_3d(&j(joints::RIGHT_SHOULDER), &j(joints::RIGHT_ELBOW), &j(joints::RIGHT_WRIST)),
        left_hip: angle_3d(&j(joints::LEFT_SHOULDER), &j(joints::LEFT_HIP), &j(joints::LEFT_KNEE)),
        right_hip: angle_3d(&j(joints::RIGHT_SHOULDER), &j(joints::RIGHT_HIP), &j(joints::RIGHT_KNEE)),
    }
}

/// Mean absolute left/right difference across knee, elbow and hip (degrees).
pub fn asymmetry(angles: &JointAngles) -> f64 {
    ((angles.left_knee - angles.right_knee).abs()
        + (angles.left_elbow - angles.right_elbow).abs()
        + (angles.left_hip - angles.right_hip).abs())
        / 3.0
}

/// `100 − 500 × |centre-of-mass x − foot-centre x|`, floored at 0.
///
/// The centre of mass is approximated by the mean x of every landmark.
pub fn balance_score(frame: &LandmarkFrame) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let com_x = frame.landmarks.iter().map(|lm| lm.x).sum::<f64>() / frame.len() as f64;
    let foot_x = (frame.joint(joints::LEFT_ANKLE).x + frame.joint(joints::RIGHT_ANKLE).x) / 2.0;
    (100.0 - (com_x - foot_x).abs() * 500.0).max(0.0)
}

/// Relative camera distance from shoulder width, clamped to the configured range.
pub fn depth_estimate(frame: &LandmarkFrame, cfg: &PhysicsConfig) -> f64 {
    let width = frame
        .joint(joints::LEFT_SHOULDER)
        .distance_2d(&frame.joint(joints::RIGHT_SHOULDER));
    let raw = cfg.reference_shoulder_width / width;
    if raw.is_nan() {
        return cfg.depth_max;
    }
    raw.clamp(cfg.depth_min, cfg.depth_max)
}

pub fn compute_biomechanics(frame: &LandmarkFrame, cfg: &PhysicsConfig) -> BiomechanicalSnapshot {
    let angles = joint_angles(frame);
    BiomechanicalSnapshot {
        joint_angles: angles,
        range_of_motion: PLACEHOLDER_RANGE_OF_MOTION,
        asymmetry: asymmetry(&angles),
        balance_score: balance_score(frame),
        depth_estimate: depth_estimate(frame, cfg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Landmark, LANDMARK_COUNT};

    /// Front-facing, mirror-symmetric standing pose centred on x = 0.5.
    fn symmetric_pose() -> LandmarkFrame {
        let mut lms = vec![Landmark::new(0.5, 0.5, 0.0, 1.0); LANDMARK_COUNT];
        let mut put = |left: usize, right: usize, dx: f64, y: f64| {
            lms[left] = Landmark::new(0.5 - dx, y, 0.0, 1.0);
            lms[right] = Landmark::new(0.5 + dx, y, 0.0, 1.0);
        };
        put(joints::LEFT_SHOULDER, joints::RIGHT_SHOULDER, 0.08, 0.3);
        put(joints::LEFT_ELBOW, joints::RIGHT_ELBOW, 0.10, 0.42);
        put(joints::LEFT_WRIST, joints::RIGHT_WRIST, 0.09, 0.52);
        put(joints::LEFT_HIP, joints::RIGHT_HIP, 0.06, 0.55);
        put(joints::LEFT_KNEE, joints::RIGHT_KNEE, 0.07, 0.72);
        put(joints::LEFT_ANKLE, joints::RIGHT_ANKLE, 0.06, 0.9);
        LandmarkFrame::new(0, lms)
    }

    #[test]
    fn test_symmetric_pose_has_no_asymmetry_and_full_balance() {
        let snap = compute_biomechanics(&symmetric_pose(), &PhysicsConfig::default());
        assert!(snap.asymmetry < 1e-9, "asymmetry = {}", snap.asymmetry);
        assert!((snap.balance_score - 100.0).abs() < 1e-9);
        assert!((snap.joint_angles.left_knee - snap.joint_angles.right_knee).abs() < 1e-9);
        assert_eq!(snap.range_of_motion, PLACEHOLDER_RANGE_OF_MOTION);
    }

    #[test]
    fn test_balance_drops_when_weight_shifts() {
        let mut frame = symmetric_pose();
        for lm in &mut frame.landmarks {
            lm.x += 0.1;
        }
        // Feet stay where they were
        frame.landmarks[joints::LEFT_ANKLE].x -= 0.1;
        frame.landmarks[joints::RIGHT_ANKLE].x -= 0.1;
        let score = balance_score(&frame);
        assert!(score < 60.0, "balance = {score}");
    }

    #[test]
    fn test_asymmetry_averages_three_joint_pairs() {
        let angles = JointAngles {
            left_knee: 100.0,
            right_knee: 130.0,
            ..Default::default()
        };
        assert!((asymmetry(&angles) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_depth_estimate_clamped() {
        let cfg = PhysicsConfig::default();
        let frame = symmetric_pose();
        // shoulder width 0.16 -> 0.15 / 0.16
        assert!((depth_estimate(&frame, &cfg) - 0.9375).abs() < 1e-9);

        let collapsed = LandmarkFrame::new(0, vec![Landmark::new(0.5, 0.5, 0.0, 1.0); LANDMARK_COUNT]);
        assert_eq!(depth_estimate(&collapsed, &cfg), cfg.depth_max);
    }
}
