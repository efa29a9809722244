//! Whole-body physics estimates from consecutive accepted frames
//!
//! Positions are in normalized image units and converted to metres with the
//! body-height calibration factor. Every rate takes an explicit `dt` (seconds).

use crate::acquisition::LandmarkStreamFilter;
use crate::config::PhysicsConfig;
use crate::types::{joints, Landmark, LandmarkFrame, PhysicsSnapshot};

/// Midpoint of the two hips.
pub fn hip_center(frame: &LandmarkFrame) -> Landmark {
    frame
        .joint(joints::LEFT_HIP)
        .midpoint(&frame.joint(joints::RIGHT_HIP))
}

/// Midpoint of the two knees.
pub fn knee_center(frame: &LandmarkFrame) -> Landmark {
    frame
        .joint(joints::LEFT_KNEE)
        .midpoint(&frame.joint(joints::RIGHT_KNEE))
}

fn displacement_3d(a: &Landmark, b: &Landmark) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2) + (a.z - b.z).powi(2)).sqrt()
}

/// Stability score (0..=100) of one joint from buffer jitter (50%),
/// velocity magnitude (30%) and visibility (20%).
pub fn joint_stability(filter: &LandmarkStreamFilter, joint: usize, visibility: f64) -> f64 {
    let jitter_score = (100.0 - filter.jitter(joint) * 5000.0).max(0.0);
    let velocity_score = (100.0 - filter.velocity(joint).magnitude() * 100.0).max(0.0);
    let visibility_score = visibility.clamp(0.0, 1.0) * 100.0;
    jitter_score * 0.5 + velocity_score * 0.3 + visibility_score * 0.2
}

/// Physics for the current frame.
///
/// - velocity: mean 3D displacement of the hip and knee centres over `dt`
/// - acceleration: hip acceleration from the filter's velocity history
/// - power: `mass × g × vertical hip-centre speed`
/// - stability: hip stability (see `joint_stability`)
///
/// Without a previous frame the rates are zero. A non-positive or
/// non-finite body weight contributes no momentum or power.
pub fn compute_physics(
    current: &LandmarkFrame,
    previous: Option<&LandmarkFrame>,
    dt: f64,
    filter: &LandmarkStreamFilter,
    body_weight_kg: f64,
    cfg: &PhysicsConfig,
) -> PhysicsSnapshot {
    let mass = if body_weight_kg.is_finite() { body_weight_kg.max(0.0) } else { 0.0 };
    let scale = cfg.body_height_m;

    let (velocity, vertical_velocity) = match previous {
        Some(prev) if dt > 0.0 => {
            let hip_d = displacement_3d(&hip_center(current), &hip_center(prev));
            let knee_d = displacement_3d(&knee_center(current), &knee_center(prev));
            let vertical = (hip_center(current).y - hip_center(prev).y).abs();
            (
                (hip_d + knee_d) / 2.0 * scale / dt,
                vertical * scale / dt,
            )
        }
        _ => (0.0, 0.0),
    };

    let acceleration = filter.acceleration(joints::LEFT_HIP).magnitude() * scale;
    let stability = joint_stability(
        filter,
        joints::LEFT_HIP,
        current.joint(joints::LEFT_HIP).visibility,
    );

    PhysicsSnapshot {
        velocity,
        acceleration,
        momentum: mass * velocity,
        stability,
        power_output: mass * cfg.gravity * vertical_velocity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use crate::types::LANDMARK_COUNT;

    fn body(ts: u64, hip_y: f64) -> LandmarkFrame {
        let mut lms = vec![Landmark::new(0.5, 0.5, 0.0, 1.0); LANDMARK_COUNT];
        lms[joints::LEFT_HIP].y = hip_y;
        lms[joints::RIGHT_HIP].y = hip_y;
        lms[joints::LEFT_KNEE].y = 0.7;
        lms[joints::RIGHT_KNEE].y = 0.7;
        LandmarkFrame::new(ts, lms)
    }

    #[test]
    fn test_stationary_body_has_no_motion() {
        let mut filter = LandmarkStreamFilter::new(FilterConfig::default());
        let a = body(0, 0.5);
        let b = body(33, 0.5);
        filter.push(&a);
        filter.push(&b);
        let p = compute_physics(&b, Some(&a), 0.033, &filter, 70.0, &PhysicsConfig::default());
        assert_eq!(p.velocity, 0.0);
        assert_eq!(p.power_output, 0.0);
        assert!((p.stability - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_and_power_scale_with_dt() {
        let filter = LandmarkStreamFilter::new(FilterConfig::default());
        let a = body(0, 0.50);
        let b = body(100, 0.52);
        let cfg = PhysicsConfig::default();
        let p = compute_physics(&b, Some(&a), 0.1, &filter, 70.0, &cfg);
        // hip moves 0.02, knees still: mean 0.01 × 1.7 / 0.1
        assert!((p.velocity - 0.17).abs() < 1e-9);
        assert!((p.momentum - 70.0 * 0.17).abs() < 1e-9);
        // vertical hip speed 0.02 × 1.7 / 0.1 = 0.34 m/s
        assert!((p.power_output - 70.0 * 9.81 * 0.34).abs() < 1e-6);

        let slower = compute_physics(&b, Some(&a), 0.2, &filter, 70.0, &cfg);
        assert!((slower.velocity - p.velocity / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_frame_and_bad_weight() {
        let filter = LandmarkStreamFilter::new(FilterConfig::default());
        let a = body(0, 0.5);
        let p = compute_physics(&a, None, 0.033, &filter, f64::NAN, &PhysicsConfig::default());
        assert_eq!(p.velocity, 0.0);
        assert_eq!(p.momentum, 0.0);
    }
}
