//! Pose landmarks as produced by the external pose estimator

use serde::{Deserialize, Serialize};

/// Joints per frame in the 33-point body model.
pub const LANDMARK_COUNT: usize = 33;

/// Fixed joint indices of the 33-point body model.
///
/// Only the limbs and torso are consumed by the analysis; face and hand
/// points are carried through untouched.
pub mod joints {
    pub const NOSE: usize = 0;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;

    /// Shoulders, hips and knees: visibility of these drives rep stability.
    pub const CORE: [usize; 6] = [
        LEFT_SHOULDER,
        RIGHT_SHOULDER,
        LEFT_HIP,
        RIGHT_HIP,
        LEFT_KNEE,
        RIGHT_KNEE,
    ];
}

fn default_visibility() -> f64 {
    1.0
}

/// Normalized position of one joint plus the estimator's confidence.
///
/// `x`/`y` are in image space (0..1, y grows downward), `z` is relative depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default = "default_visibility")]
    pub visibility: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// Planar distance, ignoring depth.
    pub fn distance_2d(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Midpoint of two joints; visibility is the weaker of the two.
    pub fn midpoint(&self, other: &Self) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
            visibility: self.visibility.min(other.visibility),
        }
    }
}

/// One capture instant: a landmark per joint index plus its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LandmarkFrame {
    /// Capture time in milliseconds. Zero means "unknown" and makes the
    /// physics fall back to the nominal frame interval.
    #[serde(default)]
    pub timestamp_ms: u64,
    pub landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(timestamp_ms: u64, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp_ms,
            landmarks,
        }
    }

    pub fn get(&self, joint: usize) -> Option<&Landmark> {
        self.landmarks.get(joint)
    }

    /// Landmark at `joint`, or an invisible origin point when the frame is short.
    pub fn joint(&self, joint: usize) -> Landmark {
        self.landmarks.get(joint).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// True when every joint of the body model is present.
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= LANDMARK_COUNT
    }

    /// True when all `required` joints exist and meet the visibility floor.
    pub fn all_visible(&self, required: &[usize], floor: f64) -> bool {
        required
            .iter()
            .all(|&j| self.get(j).is_some_and(|lm| lm.visibility >= floor))
    }

    /// Mean visibility over `selected` joints (missing joints count as 0).
    pub fn mean_visibility(&self, selected: &[usize]) -> f64 {
        if selected.is_empty() {
            return 0.0;
        }
        let sum: f64 = selected.iter().map(|&j| self.joint(j).visibility).sum();
        sum / selected.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_frame_yields_invisible_joint() {
        let frame = LandmarkFrame::new(0, vec![Landmark::new(0.5, 0.5, 0.0, 1.0)]);
        assert!(!frame.is_complete());
        assert_eq!(frame.joint(joints::LEFT_KNEE).visibility, 0.0);
        assert!(!frame.all_visible(&[joints::LEFT_KNEE], 0.8));
    }

    #[test]
    fn test_visibility_defaults_to_one_when_omitted() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.1,"y":0.2}"#).unwrap();
        assert_eq!(lm.visibility, 1.0);
        assert_eq!(lm.z, 0.0);
    }

    #[test]
    fn test_midpoint_takes_weaker_visibility() {
        let a = Landmark::new(0.0, 0.0, 0.0, 0.9);
        let b = Landmark::new(1.0, 1.0, 0.0, 0.4);
        let m = a.midpoint(&b);
        assert!((m.x - 0.5).abs() < 1e-12);
        assert!((m.visibility - 0.4).abs() < 1e-12);
    }
}
