//! Frame Analysis Pipeline
//!
//! ```text
//! LandmarkFrame ─▶ AnalysisSession::analyze ─▶ AnalysisResult
//! ```
//!
//! A session is single-threaded and owns all workout state. Run one session
//! per user.

pub mod session;

pub use session::{motion_floor, session_thresholds, AnalysisSession, SessionTotals};
