//! Unlock engine - the transition from "in progress" to "unlocked"
//!
//! Invoked only once a progress record has reached its target. The
//! unlock insert, the ledger append and the balance update all happen
//! inside the caller's transaction; the `(user_id, achievement_id)`
//! primary key converts racing inserts into idempotent no-ops.

use rusqlite::{Connection, params};
use tracing::{info, warn};

use super::error::Result;
use super::ledger::{self, event_type};
use super::models::{AchievementDef, ProgressRecord, UnlockResult, UnlockedAchievement};
use super::validator::{self, ProgressSnapshot, UnlockCriteria};

/// Attempt to unlock an achievement for a user.
///
/// `conn` must be a live transaction owned by the caller; this function
/// never commits. Failure semantics: any storage error aborts the whole
/// transaction, and the caller may retry the operation as a unit.
pub(crate) fn try_unlock(
    conn: &Connection,
    def: &AchievementDef,
    progress: &ProgressRecord,
    pace_divisor: i64,
    now: i64,
) -> Result<UnlockResult> {
    let snapshot = ProgressSnapshot {
        current: progress.current,
        day_span: progress.day_span(),
        unique_contributors: progress.unique_contributors.len(),
        validated_count: progress.validated_count,
    };
    let criteria = UnlockCriteria {
        requirement_type: def.requirement_type,
        target: def.target,
        minimum_day_span: def.minimum_day_span,
        pace_divisor,
    };

    let verdict = validator::validate(&snapshot, &criteria);
    if !verdict.valid {
        // Park the record for manual review. No credit side effects.
        let flags_json = serde_json::to_string(&verdict.flags)?;
        conn.execute(
            r#"UPDATE achievement_progress SET flagged = 1, flags = ?3
               WHERE user_id = ?1 AND achievement_id = ?2"#,
            params![progress.user_id, progress.achievement_id, flags_json],
        )?;
        warn!(
            user = %progress.user_id,
            achievement = %def.id,
            flags = %flags_json,
            "unlock blocked by validator"
        );
        return Ok(UnlockResult::Flagged {
            flags: verdict.flags,
        });
    }

    // Conflict-as-idempotent: a concurrent caller that got here first
    // already paid out, so zero affected rows means success-no-op.
    let inserted = conn.execute(
        r#"INSERT OR IGNORE INTO achievement_unlocks (user_id, achievement_id, unlocked_at)
           VALUES (?1, ?2, ?3)"#,
        params![progress.user_id, def.id, now],
    )?;
    if inserted == 0 {
        return Ok(UnlockResult::AlreadyUnlocked);
    }

    ledger::record_credit(
        conn,
        &progress.user_id,
        event_type::ACHIEVEMENT_UNLOCKED,
        def.reward_points,
        &format!("Achievement unlocked: {}", def.name),
        now,
    )?;

    info!(
        user = %progress.user_id,
        achievement = %def.id,
        points = def.reward_points,
        "achievement unlocked"
    );

    Ok(UnlockResult::Unlocked {
        achievement: UnlockedAchievement {
            id: def.id.clone(),
            name: def.name.clone(),
            rarity: def.rarity,
            reward_points: def.reward_points,
            unlocked_at: now,
        },
    })
}
