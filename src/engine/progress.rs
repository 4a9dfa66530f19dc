//! Progress tracker - absorbs externally reported counters
//!
//! Callers report counters as absolute values (the external source is
//! authoritative); the tracker upserts per-(user, achievement) state and
//! hands off to the unlock engine once the target is reached. The whole
//! path runs inside one transaction.

use std::collections::BTreeSet;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::catalog;
use super::db::EngineDb;
use super::error::{EngineError, Result};
use super::models::{
    ProgressMetadata, ProgressRecord, UnlockResult, ValidationFlag, percentage,
};
use super::unlock;

/// Records progress events and drives unlocks.
#[derive(Clone)]
pub struct ProgressTracker {
    db: EngineDb,
    pace_divisor: i64,
}

impl ProgressTracker {
    pub fn new(db: EngineDb, pace_divisor: i64) -> Self {
        Self { db, pace_divisor }
    }

    /// Record the current absolute counter value for one achievement.
    ///
    /// Returns the outcome as data: in-progress, unlocked, already
    /// unlocked, or flagged. A negative value is rejected before any
    /// write; an unknown achievement id is rejected before the
    /// transaction starts.
    pub fn record_progress(
        &self,
        user_id: &str,
        achievement_id: &str,
        current_value: i64,
        metadata: &ProgressMetadata,
    ) -> Result<UnlockResult> {
        if current_value < 0 {
            return Err(EngineError::InvalidValue(current_value));
        }

        let mut conn = self.db.conn();
        let def = catalog::achievement(&conn, achievement_id)?;
        let now = Utc::now().timestamp_millis();

        let tx = conn.transaction()?;

        // Primary idempotency guard: a terminal unlock makes every
        // further event for the pair a read-only no-op.
        if unlock_exists(&tx, user_id, achievement_id)? {
            return Ok(UnlockResult::AlreadyUnlocked);
        }

        let mut record = match load_progress(&tx, user_id, achievement_id)? {
            Some(existing) => existing,
            None => ProgressRecord {
                user_id: user_id.to_string(),
                achievement_id: achievement_id.to_string(),
                current: 0,
                target: def.target,
                first_event_at: now,
                last_event_at: now,
                unique_contributors: BTreeSet::new(),
                validated_count: 0,
                flagged: false,
                flags: vec![],
            },
        };

        // The external counter is authoritative: overwrite, even if the
        // reported value went down.
        record.current = current_value;
        record.last_event_at = now;
        for contributor in &metadata.contributors {
            record.unique_contributors.insert(contributor.clone());
        }
        if metadata.validated {
            record.validated_count += 1;
        }

        store_progress(&tx, &record)?;
        debug!(
            user = user_id,
            achievement = achievement_id,
            current = current_value,
            target = record.target,
            "progress recorded"
        );

        let result = if record.current < record.target {
            UnlockResult::InProgress {
                current: record.current,
                target: record.target,
                percentage: percentage(record.current, record.target),
            }
        } else {
            unlock::try_unlock(&tx, &def, &record, self.pace_divisor, now)?
        };

        tx.commit()?;
        Ok(result)
    }
}

fn unlock_exists(conn: &Connection, user_id: &str, achievement_id: &str) -> Result<bool> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM achievement_unlocks WHERE user_id = ?1 AND achievement_id = ?2",
            params![user_id, achievement_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(exists.is_some())
}

pub(crate) fn load_progress(
    conn: &Connection,
    user_id: &str,
    achievement_id: &str,
) -> Result<Option<ProgressRecord>> {
    let row = conn
        .query_row(
            r#"SELECT current, target, first_event_at, last_event_at,
                      unique_contributors, validated_count, flagged, flags
               FROM achievement_progress WHERE user_id = ?1 AND achievement_id = ?2"#,
            params![user_id, achievement_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, bool>(6)?,
                    row.get::<_, Option<String>>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((current, target, first, last, contributors_json, validated, flagged, flags_json)) =
        row
    else {
        return Ok(None);
    };

    let unique_contributors: BTreeSet<String> = serde_json::from_str(&contributors_json)?;
    let flags: Vec<ValidationFlag> = match flags_json {
        Some(json) => {
            let names: Vec<String> = serde_json::from_str(&json)?;
            names
                .iter()
                .filter_map(|s| ValidationFlag::from_str(s))
                .collect()
        }
        None => vec![],
    };

    Ok(Some(ProgressRecord {
        user_id: user_id.to_string(),
        achievement_id: achievement_id.to_string(),
        current,
        target,
        first_event_at: first,
        last_event_at: last,
        unique_contributors,
        validated_count: validated,
        flagged,
        flags,
    }))
}

fn store_progress(conn: &Connection, record: &ProgressRecord) -> Result<()> {
    let contributors_json = serde_json::to_string(&record.unique_contributors)?;
    let flags_json = if record.flags.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&record.flags)?)
    };
    conn.execute(
        r#"INSERT INTO achievement_progress
           (user_id, achievement_id, current, target, first_event_at, last_event_at,
            unique_contributors, validated_count, flagged, flags)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT(user_id, achievement_id) DO UPDATE SET
               current = ?3, last_event_at = ?6,
               unique_contributors = ?7, validated_count = ?8"#,
        params![
            record.user_id,
            record.achievement_id,
            record.current,
            record.target,
            record.first_event_at,
            record.last_event_at,
            contributors_json,
            record.validated_count,
            record.flagged,
            flags_json,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::validator::DEFAULT_PACE_DIVISOR;
    use tempfile::tempdir;

    fn tracker() -> (tempfile::TempDir, EngineDb, ProgressTracker) {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("t.db")).unwrap();
        let tracker = ProgressTracker::new(db.clone(), DEFAULT_PACE_DIVISOR);
        (dir, db, tracker)
    }

    #[test]
    fn test_rejects_negative_value() {
        let (_dir, _db, tracker) = tracker();
        let err = tracker
            .record_progress("u1", "first_steps", -1, &ProgressMetadata::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue(-1)));
    }

    #[test]
    fn test_rejects_unknown_achievement() {
        let (_dir, _db, tracker) = tracker();
        let err = tracker
            .record_progress("u1", "does_not_exist", 1, &ProgressMetadata::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::AchievementNotFound(_)));
    }

    #[test]
    fn test_in_progress_below_target() {
        let (_dir, _db, tracker) = tracker();
        let result = tracker
            .record_progress("u1", "curious_mind", 4, &ProgressMetadata::default())
            .unwrap();
        let UnlockResult::InProgress {
            current,
            target,
            percentage,
        } = result
        else {
            panic!("expected in-progress");
        };
        assert_eq!(current, 4);
        assert_eq!(target, 10);
        assert_eq!(percentage, 40.0);
    }

    #[test]
    fn test_absolute_value_overwrites() {
        let (_dir, db, tracker) = tracker();
        tracker
            .record_progress("u1", "curious_mind", 7, &ProgressMetadata::default())
            .unwrap();
        // Lower value is accepted verbatim: the external counter owns truth
        tracker
            .record_progress("u1", "curious_mind", 3, &ProgressMetadata::default())
            .unwrap();

        let record = load_progress(&db.conn(), "u1", "curious_mind")
            .unwrap()
            .unwrap();
        assert_eq!(record.current, 3);
    }

    #[test]
    fn test_contributors_merge_and_validated_count() {
        let (_dir, db, tracker) = tracker();
        let meta = ProgressMetadata {
            contributors: vec!["s1".into(), "s2".into()],
            validated: true,
        };
        tracker.record_progress("u1", "mentor", 2, &meta).unwrap();

        let meta = ProgressMetadata {
            contributors: vec!["s2".into(), "s3".into()],
            validated: true,
        };
        tracker.record_progress("u1", "mentor", 3, &meta).unwrap();

        let record = load_progress(&db.conn(), "u1", "mentor").unwrap().unwrap();
        assert_eq!(record.unique_contributors.len(), 3); // union, not replace
        assert_eq!(record.validated_count, 2);
        assert!(record.unique_contributors.len() as i64 <= record.current);
    }

    #[test]
    fn test_unlock_at_target() {
        let (_dir, _db, tracker) = tracker();
        let result = tracker
            .record_progress("u1", "first_steps", 1, &ProgressMetadata::default())
            .unwrap();
        assert!(matches!(result, UnlockResult::Unlocked { .. }));
    }

    #[test]
    fn test_already_unlocked_is_read_only() {
        let (_dir, db, tracker) = tracker();
        tracker
            .record_progress("u1", "first_steps", 1, &ProgressMetadata::default())
            .unwrap();

        let before: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM points_ledger", [], |r| r.get(0))
            .unwrap();

        let result = tracker
            .record_progress("u1", "first_steps", 5, &ProgressMetadata::default())
            .unwrap();
        assert!(matches!(result, UnlockResult::AlreadyUnlocked));

        let after: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM points_ledger", [], |r| r.get(0))
            .unwrap();
        assert_eq!(before, after);

        // Progress record still shows the pre-unlock value: no writes happened
        let record = load_progress(&db.conn(), "u1", "first_steps")
            .unwrap()
            .unwrap();
        assert_eq!(record.current, 1);
    }
}
