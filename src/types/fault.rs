//! Named technique faults (closed vocabulary across all exercises)

use serde::{Deserialize, Serialize};

/// A technique fault the rule engine can report for a frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fault {
    // Squats
    ChestFalling,
    KneeValgus,
    UnstableKnees,
    NotDeepEnough,
    // Push-ups
    HipSag,
    ElbowsFlaring,
    LowerChestMore,
    // Lunges
    KneeOverToes,
    IncorrectDepth,
    PoorBalance,
    // Plank
    HipsTooHigh,
    UnstableCore,
    /// Required joints not visible; never produced by a rule table.
    PoorVisibility,
}

impl Fault {
    pub fn display_name(&self) -> &'static str {
        match self {
            Fault::ChestFalling => "Chest Falling",
            Fault::KneeValgus => "Knee Valgus",
            Fault::UnstableKnees => "Unstable Knees",
            Fault::NotDeepEnough => "Not Deep Enough",
            Fault::HipSag => "Hip Sag",
            Fault::ElbowsFlaring => "Elbows Flaring",
            Fault::LowerChestMore => "Lower Chest More",
            Fault::KneeOverToes => "Knee Over Toes",
            Fault::IncorrectDepth => "Incorrect Depth",
            Fault::PoorBalance => "Poor Balance",
            Fault::HipsTooHigh => "Hips Too High",
            Fault::UnstableCore => "Unstable Core",
            Fault::PoorVisibility => "Poor Visibility",
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
