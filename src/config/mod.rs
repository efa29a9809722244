//! Coach Configuration Module
//!
//! Every tunable analysis constant (filter sizes, hysteresis angles, feedback
//! cooldowns, adaptive-model weights) loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `FORMSENSE_CONFIG` environment variable (path to TOML file)
//! 2. `formsense.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Sessions take their configuration by value. Binaries may install a
//! process-wide copy once at startup and hand out snapshots:
//!
//! ```ignore
//! config::init(CoachConfig::load());
//! let session = AnalysisSession::new(config::snapshot());
//! ```

mod coach_config;
pub mod validation;

pub use coach_config::*;

use std::sync::OnceLock;

static COACH_CONFIG: OnceLock<CoachConfig> = OnceLock::new();

/// Install the process-wide configuration. Later calls are ignored.
pub fn init(config: CoachConfig) {
    if COACH_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// The installed configuration, if `init()` has run.
pub fn get() -> Option<&'static CoachConfig> {
    COACH_CONFIG.get()
}

pub fn is_initialized() -> bool {
    COACH_CONFIG.get().is_some()
}

/// Owned copy of the installed configuration, or the defaults.
pub fn snapshot() -> CoachConfig {
    COACH_CONFIG.get().cloned().unwrap_or_default()
}
