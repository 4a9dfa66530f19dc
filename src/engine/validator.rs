//! Anti-gaming validator
//!
//! Pure rule evaluation over a progress snapshot. No I/O, no clock
//! reads: everything the rules need is carried in the inputs, so the
//! same inputs always produce the same flags.

use serde::Serialize;

use super::models::{RequirementType, ValidationFlag};

/// Default divisor for the pacing heuristic: an achievement with no
/// explicit minimum day span is expected to take at least
/// `target / DEFAULT_PACE_DIVISOR` days (floor of 1).
pub const DEFAULT_PACE_DIVISOR: i64 = 10;

/// Point-in-time view of a progress record, as the rules see it.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSnapshot {
    pub current: i64,
    /// Whole days between first and last event, minimum 1.
    pub day_span: i64,
    pub unique_contributors: usize,
    pub validated_count: i64,
}

/// Per-achievement validation criteria, taken from the definition.
#[derive(Debug, Clone, Copy)]
pub struct UnlockCriteria {
    pub requirement_type: RequirementType,
    pub target: i64,
    /// Explicit pacing floor; falls back to `target / pace_divisor`.
    pub minimum_day_span: Option<i64>,
    /// Configurable divisor for the fallback pacing heuristic.
    pub pace_divisor: i64,
}

impl UnlockCriteria {
    /// Minimum number of days the progress is expected to span.
    fn expected_min_days(&self) -> i64 {
        self.minimum_day_span
            .unwrap_or_else(|| (self.target / self.pace_divisor.max(1)).max(1))
    }
}

/// Validation verdict: valid iff no flags were raised.
#[derive(Debug, Clone, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub flags: Vec<ValidationFlag>,
}

/// Evaluate all anti-gaming rules against a snapshot.
///
/// The flags are independent and cumulative; each rule that trips adds
/// its own flag.
pub fn validate(snapshot: &ProgressSnapshot, criteria: &UnlockCriteria) -> Validation {
    let mut flags = Vec::new();
    let req = criteria.requirement_type;

    // Streak counters advance at most once per calendar day; the
    // day-boundary logic in the streak table is their rate limit, so
    // the time-based rules below do not apply to them.
    let time_exempt = matches!(
        req,
        RequirementType::Reputation | RequirementType::ConsecutiveDays
    );

    // TOO_FAST: progress accumulated over fewer days than the pacing
    // floor. Reputation is a score, not an event counter, so it is
    // exempt; so are single-event achievements.
    if !time_exempt
        && criteria.target > 1
        && snapshot.day_span < criteria.expected_min_days()
    {
        flags.push(ValidationFlag::TooFast);
    }

    // LOW_DIVERSITY: help-type counters backed by too few distinct
    // people suggest sock puppets.
    if matches!(
        req,
        RequirementType::HelpfulAnswers | RequirementType::StudentsHelped
    ) && snapshot.current > 10
        && (snapshot.unique_contributors as f64) / (snapshot.current as f64) < 0.3
    {
        flags.push(ValidationFlag::LowDiversity);
    }

    // LOW_VALIDATION: counters that should mostly consist of externally
    // validated events but don't.
    if matches!(
        req,
        RequirementType::CountResolved | RequirementType::HelpfulAnswers
    ) && snapshot.current > 5
        && (snapshot.validated_count as f64) / (snapshot.current as f64) < 0.5
    {
        flags.push(ValidationFlag::LowValidation);
    }

    // BURST_ACTIVITY: a large counter crammed into a couple of days at
    // an implausible per-day rate.
    if !time_exempt
        && snapshot.day_span < 3
        && snapshot.current > 20
        && (snapshot.current as f64) / (snapshot.day_span as f64) > 15.0
    {
        flags.push(ValidationFlag::BurstActivity);
    }

    Validation {
        valid: flags.is_empty(),
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(current: i64, day_span: i64, contributors: usize, validated: i64) -> ProgressSnapshot {
        ProgressSnapshot {
            current,
            day_span,
            unique_contributors: contributors,
            validated_count: validated,
        }
    }

    fn criteria(req: RequirementType, target: i64, min_days: Option<i64>) -> UnlockCriteria {
        UnlockCriteria {
            requirement_type: req,
            target,
            minimum_day_span: min_days,
            pace_divisor: DEFAULT_PACE_DIVISOR,
        }
    }

    #[test]
    fn test_clean_progress_is_valid() {
        let v = validate(
            &snapshot(20, 30, 15, 18),
            &criteria(RequirementType::CountResolved, 20, None),
        );
        assert!(v.valid);
        assert!(v.flags.is_empty());
    }

    #[test]
    fn test_too_fast_explicit_minimum() {
        // target=100 with minimum_day_span=50, reached in 2 days
        let v = validate(
            &snapshot(100, 2, 0, 100),
            &criteria(RequirementType::CountAnswered, 100, Some(50)),
        );
        assert!(!v.valid);
        assert!(v.flags.contains(&ValidationFlag::TooFast));
    }

    #[test]
    fn test_too_fast_heuristic_fallback() {
        // No explicit minimum: expected at least 100/10 = 10 days
        let v = validate(
            &snapshot(100, 9, 0, 100),
            &criteria(RequirementType::CountAnswered, 100, None),
        );
        assert!(v.flags.contains(&ValidationFlag::TooFast));

        let v = validate(
            &snapshot(100, 10, 0, 100),
            &criteria(RequirementType::CountAnswered, 100, None),
        );
        assert!(!v.flags.contains(&ValidationFlag::TooFast));
    }

    #[test]
    fn test_streak_counters_exempt_from_time_rules() {
        // A 30-day streak reported the day it completes: day_span is 1
        // from the validator's view, but the streak table already
        // enforced one increment per calendar day.
        let v = validate(
            &snapshot(30, 1, 0, 0),
            &criteria(RequirementType::ConsecutiveDays, 30, None),
        );
        assert!(v.valid, "unexpected flags: {:?}", v.flags);
    }

    #[test]
    fn test_too_fast_skips_reputation_and_single_event() {
        let v = validate(
            &snapshot(500, 1, 0, 0),
            &criteria(RequirementType::Reputation, 500, None),
        );
        assert!(!v.flags.contains(&ValidationFlag::TooFast));

        let v = validate(
            &snapshot(1, 1, 0, 0),
            &criteria(RequirementType::CountAsked, 1, None),
        );
        assert!(v.valid);
    }

    #[test]
    fn test_low_diversity_boundaries() {
        // ratio 0.2 trips the rule
        let v = validate(
            &snapshot(50, 30, 10, 50),
            &criteria(RequirementType::StudentsHelped, 50, None),
        );
        assert!(v.flags.contains(&ValidationFlag::LowDiversity));

        // ratio 0.4 passes
        let v = validate(
            &snapshot(50, 30, 20, 50),
            &criteria(RequirementType::StudentsHelped, 50, None),
        );
        assert!(!v.flags.contains(&ValidationFlag::LowDiversity));

        // rule only applies above 10 events
        let v = validate(
            &snapshot(10, 30, 1, 10),
            &criteria(RequirementType::StudentsHelped, 10, None),
        );
        assert!(!v.flags.contains(&ValidationFlag::LowDiversity));

        // and only to help-type requirements
        let v = validate(
            &snapshot(50, 30, 0, 50),
            &criteria(RequirementType::CountAsked, 50, None),
        );
        assert!(!v.flags.contains(&ValidationFlag::LowDiversity));
    }

    #[test]
    fn test_low_validation_boundaries() {
        let v = validate(
            &snapshot(20, 30, 20, 5),
            &criteria(RequirementType::CountResolved, 20, None),
        );
        assert!(v.flags.contains(&ValidationFlag::LowValidation));

        let v = validate(
            &snapshot(20, 30, 20, 10),
            &criteria(RequirementType::CountResolved, 20, None),
        );
        assert!(!v.flags.contains(&ValidationFlag::LowValidation));

        // rule only applies above 5 events
        let v = validate(
            &snapshot(5, 30, 5, 0),
            &criteria(RequirementType::CountResolved, 5, None),
        );
        assert!(!v.flags.contains(&ValidationFlag::LowValidation));
    }

    #[test]
    fn test_burst_activity() {
        // 40 events over 2 days = 20/day
        let v = validate(
            &snapshot(40, 2, 40, 40),
            &criteria(RequirementType::CountAnswered, 40, Some(1)),
        );
        assert!(v.flags.contains(&ValidationFlag::BurstActivity));

        // same volume over 3 days is outside the burst window
        let v = validate(
            &snapshot(40, 3, 40, 40),
            &criteria(RequirementType::CountAnswered, 40, Some(1)),
        );
        assert!(!v.flags.contains(&ValidationFlag::BurstActivity));
    }

    #[test]
    fn test_flags_accumulate() {
        // Fast, undiverse, unvalidated burst all at once
        let v = validate(
            &snapshot(50, 1, 2, 0),
            &criteria(RequirementType::HelpfulAnswers, 50, Some(10)),
        );
        assert!(!v.valid);
        assert!(v.flags.contains(&ValidationFlag::TooFast));
        assert!(v.flags.contains(&ValidationFlag::LowDiversity));
        assert!(v.flags.contains(&ValidationFlag::LowValidation));
        assert!(v.flags.contains(&ValidationFlag::BurstActivity));
    }

    #[test]
    fn test_deterministic() {
        let s = snapshot(50, 2, 5, 10);
        let c = criteria(RequirementType::HelpfulAnswers, 50, Some(10));
        let a = validate(&s, &c);
        let b = validate(&s, &c);
        assert_eq!(a.valid, b.valid);
        assert_eq!(a.flags, b.flags);
    }
}
