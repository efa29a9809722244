//! Per-frame decision agents
//!
//! - **Rep counter**: hysteresis state machine that confirms phase
//!   transitions and counts validated repetitions with a quality score
//! - **Fault rules**: ordered per-exercise rule tables naming at most one
//!   technique fault per frame

pub mod fault_rules;
pub mod rep_counter;

pub use fault_rules::{rules_for, FaultRule, FaultRuleEngine, RuleContext, RuleOutcome};
pub use rep_counter::{RepStateMachine, RepUpdate};
