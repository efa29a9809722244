//! Shared data structures for the exercise analysis pipeline
//!
//! This module defines the types that flow through one analysed frame:
//! - Input: `Landmark`, `LandmarkFrame` (pose source output)
//! - Selection: `Exercise` (rule set, MET, required joints)
//! - Derived: `PhysicsSnapshot`, `BiomechanicalSnapshot`, `MovementQuality`
//! - Repetitions: `RepPhase`, `RepState`, `RepQuality`, `RepStats`
//! - Coaching: `Fault`, `Feedback` and its enums
//! - Output: `AnalysisResult`, the sole per-frame contract with the caller

mod analysis;
mod exercise;
mod fault;
mod feedback;
mod landmark;
mod rep;

pub use analysis::*;
pub use exercise::*;
pub use fault::*;
pub use feedback::*;
pub use landmark::*;
pub use rep::*;
