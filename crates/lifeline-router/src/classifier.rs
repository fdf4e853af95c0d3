// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic questionnaire triage.
//!
//! Maps the five questionnaire answers to a [`RiskLevel`] with a fixed rule
//! order. No I/O, no state, no scoring: the same answers always produce the
//! same level.

use lifeline_core::{RiskLevel, TriageAnswers};

/// Result of classifying a questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The classified risk level.
    pub level: RiskLevel,
    /// Which rule fired. For structured logging only.
    pub reason: &'static str,
}

/// Classify questionnaire answers into a risk level.
pub fn classify(answers: &TriageAnswers) -> RiskLevel {
    classify_with_reason(answers).level
}

/// Classify and report which rule decided the level.
///
/// Rules, first match wins:
/// 1. any danger answer → EMERGENCY (urgency answers ignored)
/// 2. `need_help_soon` → URGENT
/// 3. `need_help_today` → URGENT
/// 4. otherwise → ROUTINE
pub fn classify_with_reason(answers: &TriageAnswers) -> Classification {
    if answers.has_danger_signal() {
        return Classification {
            level: RiskLevel::Emergency,
            reason: "danger signal",
        };
    }

    if answers.need_help_soon {
        return Classification {
            level: RiskLevel::Urgent,
            reason: "needs help soon",
        };
    }

    // Kept apart from the rule above so the two can diverge later.
    if answers.need_help_today {
        return Classification {
            level: RiskLevel::Urgent,
            reason: "needs help today",
        };
    }

    Classification {
        level: RiskLevel::Routine,
        reason: "no urgency signals",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn answers(bits: u8) -> TriageAnswers {
        TriageAnswers::new(
            bits & 0b10000 != 0,
            bits & 0b01000 != 0,
            bits & 0b00100 != 0,
            bits & 0b00010 != 0,
            bits & 0b00001 != 0,
        )
    }

    #[test]
    fn exhaustive_truth_table() {
        let mut counts = [0usize; 3];
        for bits in 0u8..32 {
            let a = answers(bits);
            let expected = if bits & 0b11100 != 0 {
                RiskLevel::Emergency
            } else if bits & 0b00011 != 0 {
                RiskLevel::Urgent
            } else {
                RiskLevel::Routine
            };
            assert_eq!(classify(&a), expected, "row {bits:05b}");
            counts[expected as usize] += 1;
        }
        // 28 rows with a danger answer, 3 urgency-only rows, 1 all-false row.
        assert_eq!(counts, [28, 3, 1]);
    }

    #[test]
    fn each_danger_answer_alone_is_emergency() {
        for a in [
            TriageAnswers::new(true, false, false, false, false),
            TriageAnswers::new(false, true, false, false, false),
            TriageAnswers::new(false, false, true, false, false),
        ] {
            assert_eq!(classify(&a), RiskLevel::Emergency);
        }
    }

    #[test]
    fn urgency_rows() {
        assert_eq!(
            classify(&TriageAnswers::new(false, false, false, true, false)),
            RiskLevel::Urgent
        );
        assert_eq!(
            classify(&TriageAnswers::new(false, false, false, false, true)),
            RiskLevel::Urgent
        );
        assert_eq!(
            classify(&TriageAnswers::new(false, false, false, true, true)),
            RiskLevel::Urgent
        );
    }

    #[test]
    fn all_false_is_routine() {
        let c = classify_with_reason(&TriageAnswers::new(false, false, false, false, false));
        assert_eq!(c.level, RiskLevel::Routine);
        assert_eq!(c.reason, "no urgency signals");
    }

    #[test]
    fn reasons_name_the_rule_that_fired() {
        let c = classify_with_reason(&TriageAnswers::new(false, true, false, true, true));
        assert_eq!(c.reason, "danger signal");
        let c = classify_with_reason(&TriageAnswers::new(false, false, false, true, true));
        assert_eq!(c.reason, "needs help soon");
        let c = classify_with_reason(&TriageAnswers::new(false, false, false, false, true));
        assert_eq!(c.reason, "needs help today");
    }

    #[test]
    fn region_does_not_affect_level() {
        let a = TriageAnswers::new(false, false, false, true, false);
        let with_region = a.with_region("NZ".parse().unwrap());
        assert_eq!(classify(&a), classify(&with_region));
    }

    proptest! {
        #[test]
        fn danger_dominates_urgency(
            danger in 1u8..8,
            soon in any::<bool>(),
            today in any::<bool>(),
        ) {
            let a = TriageAnswers::new(
                danger & 0b100 != 0,
                danger & 0b010 != 0,
                danger & 0b001 != 0,
                soon,
                today,
            );
            prop_assert_eq!(classify(&a), RiskLevel::Emergency);
        }

        #[test]
        fn classification_is_deterministic(bits in 0u8..32) {
            let a = answers(bits);
            prop_assert_eq!(classify_with_reason(&a), classify_with_reason(&a));
        }
    }
}
