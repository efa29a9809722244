//! Physics Engine Module
//!
//! Deterministic geometry and physics derived from a single landmark frame
//! plus the stream filter's history. Everything here is a pure function.
//!
//! - `angles`: 2D and 3D joint angles, segment directions
//! - `metrics`: velocity, acceleration, momentum, power, stability
//! - `biomechanics`: joint-angle set, asymmetry, balance, depth

pub mod angles;
pub mod biomechanics;
pub mod metrics;

pub use angles::{angle_2d, angle_3d, direction_difference, segment_direction};
pub use biomechanics::{
    asymmetry, balance_score, compute_biomechanics, depth_estimate, joint_angles,
    PLACEHOLDER_RANGE_OF_MOTION,
};
pub use metrics::{compute_physics, hip_center, joint_stability, knee_center};

use crate::types::{BiomechanicalSnapshot, PhysicsSnapshot, RiskLevel};

/// Coarse risk tier from asymmetry and stability.
///
/// - High: asymmetry > 15° or stability < 50
/// - Medium: asymmetry > 8° or stability < 70
pub fn biomechanical_risk(physics: &PhysicsSnapshot, bio: &BiomechanicalSnapshot) -> RiskLevel {
    if bio.asymmetry > 15.0 || physics.stability < 50.0 {
        RiskLevel::High
    } else if bio.asymmetry > 8.0 || physics.stability < 70.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_tiers() {
        let mut physics = PhysicsSnapshot {
            stability: 90.0,
            ..Default::default()
        };
        let mut bio = BiomechanicalSnapshot::default();
        assert_eq!(biomechanical_risk(&physics, &bio), RiskLevel::Low);

        bio.asymmetry = 10.0;
        assert_eq!(biomechanical_risk(&physics, &bio), RiskLevel::Medium);

        physics.stability = 40.0;
        assert_eq!(biomechanical_risk(&physics, &bio), RiskLevel::High);
    }
}
