//! Joint angle geometry
//!
//! Angles are in degrees. Cosines are clamped to `[-1, 1]` before `acos` so
//! floating-point drift on nearly straight limbs never yields NaN.

use crate::types::Landmark;

/// Planar angle at vertex `b` formed by `a` and `c`, from x/y only (0..=180).
pub fn angle_2d(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = radians.to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

/// Angle at vertex `b` between `b→a` and `b→c` using x/y/z.
///
/// A zero-length limb segment has no direction; the joint is reported
/// as fully extended (180°).
pub fn angle_3d(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    let ba = (a.x - b.x, a.y - b.y, a.z - b.z);
    let bc = (c.x - b.x, c.y - b.y, c.z - b.z);

    let dot = ba.0 * bc.0 + ba.1 * bc.1 + ba.2 * bc.2;
    let mag_ba = (ba.0 * ba.0 + ba.1 * ba.1 + ba.2 * ba.2).sqrt();
    let mag_bc = (bc.0 * bc.0 + bc.1 * bc.1 + bc.2 * bc.2).sqrt();

    let denom = mag_ba * mag_bc;
    if denom < 1e-12 {
        return 180.0;
    }
    (dot / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Image-plane direction of the segment `from → to`, in degrees (-180..=180).
pub fn segment_direction(from: &Landmark, to: &Landmark) -> f64 {
    (to.y - from.y).atan2(to.x - from.x).to_degrees()
}

/// Smallest absolute difference between two directions (0..=180).
pub fn direction_difference(a_deg: f64, b_deg: f64) -> f64 {
    let diff = (a_deg - b_deg).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Landmark {
        Landmark::new(x, y, 0.0, 1.0)
    }

    #[test]
    fn test_right_angle() {
        let a = p(0.0, 1.0);
        let b = p(0.0, 0.0);
        let c = p(1.0, 0.0);
        assert!((angle_3d(&a, &b, &c) - 90.0).abs() < 1e-9);
        assert!((angle_2d(&a, &b, &c) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_limb_is_180() {
        let angle = angle_3d(&p(0.0, 0.0), &p(0.0, 0.5), &p(0.0, 1.0));
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_collinear_drift_does_not_produce_nan() {
        // Cosine lands a hair outside [-1, 1] without the clamp
        let a = Landmark::new(0.1, 0.1, 0.1, 1.0);
        let b = Landmark::new(0.2, 0.2, 0.2, 1.0);
        let c = Landmark::new(0.3, 0.3, 0.3 + 1e-17, 1.0);
        assert!(angle_3d(&a, &b, &c).is_finite());
    }

    #[test]
    fn test_degenerate_segment_reports_extended() {
        let b = p(0.5, 0.5);
        assert_eq!(angle_3d(&b, &b, &p(0.5, 0.9)), 180.0);
    }

    #[test]
    fn test_2d_ignores_depth() {
        let a = Landmark::new(0.0, 1.0, 5.0, 1.0);
        let angle = angle_2d(&a, &p(0.0, 0.0), &p(1.0, 0.0));
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction_difference_wraps() {
        assert!((direction_difference(170.0, -170.0) - 20.0).abs() < 1e-9);
        assert!((direction_difference(-90.0, -90.0)).abs() < 1e-9);
        assert!((direction_difference(0.0, 180.0) - 180.0).abs() < 1e-9);
    }
}
