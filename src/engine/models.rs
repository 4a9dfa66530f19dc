//! Row records and result types shared across the engine modules.

use std::collections::BTreeSet;

use serde::Serialize;

/// What kind of external counter an achievement tracks.
///
/// The caller always reports the counter as an absolute value; the
/// engine never increments it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementType {
    CountAsked,
    CountAnswered,
    CountResolved,
    HelpfulAnswers,
    StudentsHelped,
    Reputation,
    ConsecutiveDays,
}

impl RequirementType {
    /// String form for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CountAsked => "COUNT_ASKED",
            Self::CountAnswered => "COUNT_ANSWERED",
            Self::CountResolved => "COUNT_RESOLVED",
            Self::HelpfulAnswers => "HELPFUL_ANSWERS",
            Self::StudentsHelped => "STUDENTS_HELPED",
            Self::Reputation => "REPUTATION",
            Self::ConsecutiveDays => "CONSECUTIVE_DAYS",
        }
    }

    /// Parse from database string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "COUNT_ASKED" => Some(Self::CountAsked),
            "COUNT_ANSWERED" => Some(Self::CountAnswered),
            "COUNT_RESOLVED" => Some(Self::CountResolved),
            "HELPFUL_ANSWERS" => Some(Self::HelpfulAnswers),
            "STUDENTS_HELPED" => Some(Self::StudentsHelped),
            "REPUTATION" => Some(Self::Reputation),
            "CONSECUTIVE_DAYS" => Some(Self::ConsecutiveDays),
            _ => None,
        }
    }
}

/// Achievement rarity, ordered from most to least common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "common" => Some(Self::Common),
            "uncommon" => Some(Self::Uncommon),
            "rare" => Some(Self::Rare),
            "epic" => Some(Self::Epic),
            "legendary" => Some(Self::Legendary),
            _ => None,
        }
    }
}

/// An achievement definition as stored in `achievement_defs`.
///
/// Immutable after seeding.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub requirement_type: RequirementType,
    pub target: i64,
    pub reward_points: i64,
    pub rarity: Rarity,
    /// Optional explicit pacing floor in days; overrides the default
    /// `target / pace_divisor` heuristic when set.
    pub minimum_day_span: Option<i64>,
}

/// A badge definition as stored in `badge_defs`. Immutable after seeding.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeDef {
    pub id: String,
    pub subject_key: String,
    pub name: String,
    pub description: String,
}

/// Mutable per-(user, achievement) progress state.
#[derive(Debug, Clone)]
pub struct ProgressRecord {
    pub user_id: String,
    pub achievement_id: String,
    /// Absolute counter value as last reported by the caller.
    pub current: i64,
    /// Copied from the definition when the record is created.
    pub target: i64,
    pub first_event_at: i64,
    pub last_event_at: i64,
    pub unique_contributors: BTreeSet<String>,
    pub validated_count: i64,
    pub flagged: bool,
    pub flags: Vec<ValidationFlag>,
}

impl ProgressRecord {
    /// Whole days spanned by the recorded events, never less than 1.
    pub fn day_span(&self) -> i64 {
        let elapsed_ms = (self.last_event_at - self.first_event_at).max(0);
        ((elapsed_ms + MS_PER_DAY - 1) / MS_PER_DAY).max(1)
    }
}

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Optional context attached to a progress event.
#[derive(Debug, Clone, Default)]
pub struct ProgressMetadata {
    /// Opaque ids of users who contributed to this counter (e.g. the
    /// askers whose doubts were answered). Merged into the stored set.
    pub contributors: Vec<String>,
    /// Whether this event was independently validated (accepted answer,
    /// resolved doubt, etc.). Increments `validated_count`.
    pub validated: bool,
}

/// Anti-gaming flags raised by the validator. Independent and cumulative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationFlag {
    TooFast,
    LowDiversity,
    LowValidation,
    BurstActivity,
}

impl ValidationFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooFast => "TOO_FAST",
            Self::LowDiversity => "LOW_DIVERSITY",
            Self::LowValidation => "LOW_VALIDATION",
            Self::BurstActivity => "BURST_ACTIVITY",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TOO_FAST" => Some(Self::TooFast),
            "LOW_DIVERSITY" => Some(Self::LowDiversity),
            "LOW_VALIDATION" => Some(Self::LowValidation),
            "BURST_ACTIVITY" => Some(Self::BurstActivity),
            _ => None,
        }
    }
}

/// Outcome of a progress event, returned as data.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnlockResult {
    /// The goal was completed for the first time and the reward paid out.
    Unlocked { achievement: UnlockedAchievement },
    /// The pair was already unlocked; nothing was written.
    AlreadyUnlocked,
    /// Target not yet reached.
    InProgress {
        current: i64,
        target: i64,
        percentage: f64,
    },
    /// Target reached but the validator rejected the unlock. The flags
    /// are persisted on the progress record for manual review; no
    /// credit or ledger side effects occurred.
    Flagged { flags: Vec<ValidationFlag> },
}

impl UnlockResult {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, Self::Unlocked { .. } | Self::AlreadyUnlocked)
    }
}

/// Details of a freshly unlocked achievement.
#[derive(Debug, Clone, Serialize)]
pub struct UnlockedAchievement {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    pub reward_points: i64,
    pub unlocked_at: i64,
}

/// Outcome of a badge grant attempt, returned as data.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GrantResult {
    Granted { badge_id: String, granted_at: i64 },
    AlreadyGranted { badge_id: String },
    /// Mastery score below the grant threshold; no-op.
    BelowThreshold,
    /// No badge definition maps to the subject; no-op.
    NoBadgeForSubject,
}

impl GrantResult {
    pub fn granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

/// Externally owned day-streak state for one user.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreakRecord {
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_active_date: Option<String>,
}

/// One append-only ledger row.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: String,
    pub event_type: String,
    pub point_delta: i64,
    pub description: Option<String>,
    pub created_at: i64,
}

/// In-progress entry for the per-user summary.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub achievement_id: String,
    pub name: String,
    pub current: i64,
    pub target: i64,
    pub percentage: f64,
    pub flagged: bool,
}

/// Unlocked entry for the per-user summary.
#[derive(Debug, Clone, Serialize)]
pub struct UnlockView {
    pub achievement_id: String,
    pub name: String,
    pub rarity: Rarity,
    pub reward_points: i64,
    pub unlocked_at: i64,
}

/// Per-user achievement summary.
#[derive(Debug, Clone, Serialize)]
pub struct UserProgressSummary {
    pub user_id: String,
    pub in_progress: Vec<ProgressView>,
    pub unlocked: Vec<UnlockView>,
    pub total_points: i64,
    pub total_unlocked: usize,
}

/// One ranked leaderboard row.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub reputation: i64,
    pub credits: i64,
    pub achievements: Vec<String>,
    pub badges: Vec<String>,
    pub total_achievement_points: i64,
    pub current_streak: i64,
}

pub fn percentage(current: i64, target: i64) -> f64 {
    if target <= 0 {
        return 100.0;
    }
    ((current as f64 / target as f64) * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_type_roundtrip() {
        for rt in [
            RequirementType::CountAsked,
            RequirementType::CountAnswered,
            RequirementType::CountResolved,
            RequirementType::HelpfulAnswers,
            RequirementType::StudentsHelped,
            RequirementType::Reputation,
            RequirementType::ConsecutiveDays,
        ] {
            assert_eq!(RequirementType::from_str(rt.as_str()), Some(rt));
        }
        assert_eq!(RequirementType::from_str("bogus"), None);
    }

    #[test]
    fn test_day_span_minimum_one() {
        let rec = ProgressRecord {
            user_id: "u1".into(),
            achievement_id: "a".into(),
            current: 1,
            target: 10,
            first_event_at: 1_000,
            last_event_at: 1_000,
            unique_contributors: BTreeSet::new(),
            validated_count: 0,
            flagged: false,
            flags: vec![],
        };
        assert_eq!(rec.day_span(), 1);
    }

    #[test]
    fn test_day_span_rounds_up() {
        let mut rec = ProgressRecord {
            user_id: "u1".into(),
            achievement_id: "a".into(),
            current: 1,
            target: 10,
            first_event_at: 0,
            last_event_at: MS_PER_DAY + 1,
            unique_contributors: BTreeSet::new(),
            validated_count: 0,
            flagged: false,
            flags: vec![],
        };
        assert_eq!(rec.day_span(), 2);

        rec.last_event_at = 3 * MS_PER_DAY;
        assert_eq!(rec.day_span(), 3);
    }

    #[test]
    fn test_percentage_caps_at_100() {
        assert_eq!(percentage(5, 10), 50.0);
        assert_eq!(percentage(20, 10), 100.0);
    }
}
