//! Supported exercises and their static properties

use super::landmark::joints;
use serde::{Deserialize, Serialize};

/// Exercise selected by the caller; chooses the rule set and rep model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Exercise {
    Squats,
    Pushups,
    Lunges,
    Plank,
}

impl Exercise {
    pub const ALL: [Exercise; 4] = [
        Exercise::Squats,
        Exercise::Pushups,
        Exercise::Lunges,
        Exercise::Plank,
    ];

    /// Resolve a caller-supplied exercise id. Unknown ids yield `None`.
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "squats" | "squat" => Some(Exercise::Squats),
            "pushups" | "pushup" | "push-ups" | "push-up" => Some(Exercise::Pushups),
            "lunges" | "lunge" => Some(Exercise::Lunges),
            "plank" | "planks" => Some(Exercise::Plank),
            _ => None,
        }
    }

    /// Canonical id (`squats | pushups | lunges | plank`)
    pub fn id(&self) -> &'static str {
        match self {
            Exercise::Squats => "squats",
            Exercise::Pushups => "pushups",
            Exercise::Lunges => "lunges",
            Exercise::Plank => "plank",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Exercise::Squats => "Squats",
            Exercise::Pushups => "Push-ups",
            Exercise::Lunges => "Lunges",
            Exercise::Plank => "Plank",
        }
    }

    /// Metabolic equivalent used for calorie estimates.
    pub fn met(&self) -> f64 {
        match self {
            Exercise::Squats => 5.0,
            Exercise::Pushups => 8.0,
            Exercise::Lunges => 3.8,
            Exercise::Plank => 3.0,
        }
    }

    /// Isometric holds never count reps.
    pub fn is_isometric(&self) -> bool {
        matches!(self, Exercise::Plank)
    }

    /// Joints that must clear the visibility floor before a frame is analysed.
    pub fn required_joints(&self) -> &'static [usize] {
        match self {
            Exercise::Squats => &[
                joints::LEFT_HIP,
                joints::RIGHT_HIP,
                joints::LEFT_KNEE,
                joints::RIGHT_KNEE,
            ],
            Exercise::Pushups => &[joints::LEFT_SHOULDER, joints::LEFT_ELBOW, joints::LEFT_HIP],
            Exercise::Lunges => &[joints::LEFT_KNEE, joints::RIGHT_KNEE],
            Exercise::Plank => &[joints::LEFT_SHOULDER, joints::LEFT_HIP, joints::LEFT_ANKLE],
        }
    }

    /// Short prompt and spoken instruction when required joints are hidden.
    pub fn reposition_prompt(&self) -> (&'static str, &'static str) {
        match self {
            Exercise::Squats | Exercise::Lunges => (
                "Step back please",
                "I can't see you clearly. Please take a step back from the camera so I can track your full movement.",
            ),
            Exercise::Pushups | Exercise::Plank => (
                "Turn sideways",
                "Please turn sideways to the camera so I can see your shoulder, elbow and hip.",
            ),
        }
    }
}

impl std::fmt::Display for Exercise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_accepts_canonical_and_singular() {
        for ex in Exercise::ALL {
            assert_eq!(Exercise::from_id(ex.id()), Some(ex));
        }
        assert_eq!(Exercise::from_id(" Squat "), Some(Exercise::Squats));
        assert_eq!(Exercise::from_id("push-ups"), Some(Exercise::Pushups));
        assert_eq!(Exercise::from_id("burpees"), None);
    }

    #[test]
    fn test_only_plank_is_isometric() {
        let iso: Vec<_> = Exercise::ALL.iter().filter(|e| e.is_isometric()).collect();
        assert_eq!(iso, vec![&Exercise::Plank]);
    }
}
