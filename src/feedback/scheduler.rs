//! Feedback delivery policy and fault escalation
//!
//! Computing feedback and speaking it are separate decisions. Every frame
//! produces a `Feedback`; the scheduler decides whether the voice layer
//! should hear it, using per-priority cooldowns measured from the last
//! delivered message. Urgent feedback bypasses every gate.
//!
//! Fault occurrences are counted at most once per `mistake_repeat_ms`. When
//! a fault reaches `escalation_count` occurrences the feedback is replaced
//! by a critical, detailed explanation.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::coaching;
use crate::config::FeedbackConfig;
use crate::types::{Fault, Feedback, FeedbackType, Priority};

/// Consecutive positive frames that end the learning phase.
pub const LEARNING_EXIT_STREAK: u32 = 3;

/// Occurrence bookkeeping for one fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MistakeRecord {
    count: u32,
    last_counted_ms: u64,
}

/// Coach learning progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachProgress {
    pub learning_phase: bool,
    pub consecutive_positive: u32,
    pub total_mistakes: u32,
}

#[derive(Debug, Clone)]
pub struct FeedbackScheduler {
    config: FeedbackConfig,
    last_delivery_ms: Option<u64>,
    last_delivered_message: Option<String>,
    mistakes: HashMap<Fault, MistakeRecord>,
    consecutive_positive: u32,
    learning_phase: bool,
}

impl FeedbackScheduler {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            config,
            last_delivery_ms: None,
            last_delivered_message: None,
            mistakes: HashMap::new(),
            consecutive_positive: 0,
            learning_phase: true,
        }
    }

    // ========================================================================
    // Fault Escalation
    // ========================================================================

    /// Count an occurrence of `fault` unless it was counted less than
    /// `mistake_repeat_ms` ago. Returns the new count when counted.
    pub fn record_fault(&mut self, fault: Fault, timestamp_ms: u64) -> Option<u32> {
        let gap = self.config.mistake_repeat_ms;
        match self.mistakes.get_mut(&fault) {
            Some(record) if timestamp_ms.saturating_sub(record.last_counted_ms) < gap => None,
            Some(record) => {
                record.count += 1;
                record.last_counted_ms = timestamp_ms;
                Some(record.count)
            }
            None => {
                self.mistakes.insert(
                    fault,
                    MistakeRecord {
                        count: 1,
                        last_counted_ms: timestamp_ms,
                    },
                );
                Some(1)
            }
        }
    }

    pub fn occurrences(&self, fault: Fault) -> u32 {
        self.mistakes.get(&fault).map_or(0, |r| r.count)
    }

    /// Per-fault occurrence counts, ordered by fault.
    pub fn fault_counts(&self) -> BTreeMap<Fault, u32> {
        self.mistakes.iter().map(|(f, r)| (*f, r.count)).collect()
    }

    /// Attach coaching text to a rule's feedback and escalate when the fault
    /// reaches the escalation count on a counted occurrence.
    pub fn coach_fault(&mut self, mut feedback: Feedback, fault: Fault, timestamp_ms: u64) -> Feedback {
        let counted = self.record_fault(fault, timestamp_ms);
        let count = counted.unwrap_or_else(|| self.occurrences(fault));

        feedback.progressive_hint = Some(coaching::progressive_hint(fault, count).to_string());
        feedback.actionable_cue = Some(coaching::actionable_cue(fault).to_string());

        if counted.is_some_and(|c| c >= self.config.escalation_count) {
            let (headline, voice) = coaching::escalation_message(fault, count);
            info!(fault = %fault, count, "Escalating repeated fault");
            feedback.message = headline;
            feedback.voice_message = voice;
            feedback.kind = FeedbackType::Critical;
            feedback.priority = Priority::Immediate;
            feedback.detailed_explanation = Some(coaching::detailed_explanation(fault).to_string());
        }
        feedback
    }

    // ========================================================================
    // Learning Phase
    // ========================================================================

    /// Track the streak of positive feedback; three in a row end learning.
    pub fn observe(&mut self, feedback: &Feedback) {
        if feedback.kind == FeedbackType::Positive {
            self.consecutive_positive += 1;
            if self.learning_phase && self.consecutive_positive >= LEARNING_EXIT_STREAK {
                self.learning_phase = false;
                debug!("Learning phase complete");
            }
        } else {
            self.consecutive_positive = 0;
        }
    }

    pub fn progress(&self) -> CoachProgress {
        CoachProgress {
            learning_phase: self.learning_phase,
            consecutive_positive: self.consecutive_positive,
            total_mistakes: self.mistakes.values().map(|r| r.count).sum(),
        }
    }

    // ========================================================================
    // Delivery
    // ========================================================================

    fn cooldown_ms(&self, priority: Priority) -> u64 {
        match priority {
            Priority::Immediate => 0,
            Priority::High => self.config.high_cooldown_ms,
            Priority::Medium => self.config.medium_cooldown_ms,
            Priority::Low => self.config.low_cooldown_ms,
        }
    }

    /// Decide whether `feedback` should be spoken at `timestamp_ms`.
    ///
    /// A delivery resets the shared cooldown clock. A message identical to
    /// the last delivered one waits out its full priority cooldown, without
    /// the positive shortcut. `new_rep` lets a rep announcement through even
    /// when its text matches the last one.
    pub fn should_deliver(&mut self, feedback: &Feedback, timestamp_ms: u64, new_rep: bool) -> bool {
        if feedback.message.is_empty() {
            return false;
        }

        let repeated =
            !new_rep && self.last_delivered_message.as_deref() == Some(feedback.message.as_str());
        let cooldown = self.cooldown_ms(feedback.priority);

        let deliver = if feedback.is_urgent() {
            true
        } else {
            match self.last_delivery_ms.map(|last| timestamp_ms.saturating_sub(last)) {
                None => true,
                Some(elapsed) if repeated => elapsed >= cooldown,
                Some(elapsed) => {
                    elapsed >= cooldown
                        || (feedback.kind == FeedbackType::Positive
                            && elapsed >= self.config.positive_cooldown_ms)
                }
            }
        };

        if deliver {
            self.last_delivery_ms = Some(timestamp_ms);
            self.last_delivered_message = Some(feedback.message.clone());
        } else {
            debug!(message = %feedback.message, priority = %feedback.priority, "Feedback suppressed");
        }
        deliver
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> FeedbackScheduler {
        FeedbackScheduler::new(FeedbackConfig::default())
    }

    fn fb(msg: &str, kind: FeedbackType, priority: Priority) -> Feedback {
        Feedback::new(kind, msg, msg).with_priority(priority)
    }

    #[test]
    fn test_immediate_always_delivered() {
        let mut s = scheduler();
        let f = fb("Lift Hips!", FeedbackType::Critical, Priority::Immediate);
        for ts in [0, 10, 20, 30] {
            assert!(s.should_deliver(&f, ts, false));
        }
    }

    #[test]
    fn test_low_priority_once_within_six_seconds() {
        let mut s = scheduler();
        let a = fb("Go Lower!", FeedbackType::Adjustment, Priority::Low);
        let b = fb("Shift Back!", FeedbackType::Adjustment, Priority::Low);
        assert!(s.should_deliver(&a, 1_000, false));
        assert!(!s.should_deliver(&b, 5_000, false));
        assert!(s.should_deliver(&b, 7_000, false));
    }

    #[test]
    fn test_positive_uses_short_cooldown() {
        let mut s = scheduler();
        assert!(s.should_deliver(&fb("Push Knees Out!", FeedbackType::Adjustment, Priority::Low), 0, false));
        let p = fb("Perfect Form!", FeedbackType::Positive, Priority::Medium);
        assert!(!s.should_deliver(&p, 1_000, false));
        assert!(s.should_deliver(&p, 1_600, false));
    }

    #[test]
    fn test_identical_message_suppressed_unless_new_rep() {
        let mut s = scheduler();
        let rep = fb("Rep 1 ✓", FeedbackType::Positive, Priority::Medium);
        assert!(s.should_deliver(&rep, 0, true));
        // Past the positive cooldown but inside the medium one
        assert!(!s.should_deliver(&rep, 2_000, false));
        assert!(s.should_deliver(&rep, 2_000, true));
    }

    #[test]
    fn test_persistent_cue_repeats_after_its_cooldown() {
        let mut s = scheduler();
        let cue = fb("Stabilize Core", FeedbackType::Adjustment, Priority::High);
        assert!(s.should_deliver(&cue, 0, false));
        assert!(!s.should_deliver(&cue, 1_999, false));
        assert!(s.should_deliver(&cue, 2_000, false));
        assert!(!s.should_deliver(&cue, 3_000, false));
        assert!(s.should_deliver(&cue, 60_000, false));
    }

    #[test]
    fn test_fault_counted_once_per_repeat_gap() {
        let mut s = scheduler();
        assert_eq!(s.record_fault(Fault::KneeValgus, 0), Some(1));
        assert_eq!(s.record_fault(Fault::KneeValgus, 5_000), None);
        assert_eq!(s.record_fault(Fault::KneeValgus, 12_000), Some(2));
        assert_eq!(s.occurrences(Fault::KneeValgus), 2);
        assert_eq!(s.progress().total_mistakes, 2);
    }

    #[test]
    fn test_third_spaced_occurrence_escalates() {
        let mut s = scheduler();
        let base = || fb("Push Knees Out!", FeedbackType::Adjustment, Priority::Low);
        let first = s.coach_fault(base(), Fault::KneeValgus, 0);
        let second = s.coach_fault(base(), Fault::KneeValgus, 12_000);
        let between = s.coach_fault(base(), Fault::KneeValgus, 18_000);
        let third = s.coach_fault(base(), Fault::KneeValgus, 24_000);

        assert!(first.detailed_explanation.is_none());
        assert!(second.detailed_explanation.is_none());
        assert!(between.detailed_explanation.is_none());
        assert!(third.detailed_explanation.is_some());
        assert_eq!(third.priority, Priority::Immediate);
        assert!(third.message.starts_with("You've had 3 instances"));
        assert!(first.actionable_cue.is_some());
        assert_ne!(first.progressive_hint, second.progressive_hint);
    }

    #[test]
    fn test_learning_phase_ends_after_positive_streak() {
        let mut s = scheduler();
        let good = fb("Perfect Form!", FeedbackType::Positive, Priority::Medium);
        let fix = fb("Go Lower!", FeedbackType::Adjustment, Priority::Low);
        s.observe(&good);
        s.observe(&good);
        s.observe(&fix);
        assert!(s.progress().learning_phase);
        for _ in 0..3 {
            s.observe(&good);
        }
        assert!(!s.progress().learning_phase);
    }
}
