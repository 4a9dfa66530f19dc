//! Streak tracking and projection into achievement progress
//!
//! Day-boundary logic (increment, reset, longest-streak watermark) is
//! owned by the activity tracker entry point here; the evaluator only
//! projects the already-computed counter into the progress pipeline.

use chrono::{Local, NaiveDate};
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use super::db::EngineDb;
use super::error::Result;
use super::models::{ProgressMetadata, RequirementType, StreakRecord, UnlockResult};
use super::progress::ProgressTracker;
use super::catalog;

/// Result of recording a day's activity.
#[derive(Debug, Clone)]
pub struct StreakUpdate {
    pub current_streak: i64,
    pub longest_streak: i64,
    /// False when today was already counted.
    pub extended: bool,
}

/// Owns the streak table and feeds consecutive-day achievements.
#[derive(Clone)]
pub struct StreakTracker {
    db: EngineDb,
    progress: ProgressTracker,
}

impl StreakTracker {
    pub fn new(db: EngineDb, progress: ProgressTracker) -> Self {
        Self { db, progress }
    }

    /// Record meaningful activity for today. Only one activity per
    /// calendar day counts.
    pub fn record_activity(&self, user_id: &str) -> Result<StreakUpdate> {
        self.record_activity_on(user_id, Local::now().date_naive())
    }

    /// Record activity for a specific calendar day.
    ///
    /// Continues the streak if the previous activity was yesterday,
    /// resets it to 1 after a gap. Days at or before the last recorded
    /// activity are no-ops.
    pub fn record_activity_on(&self, user_id: &str, day: NaiveDate) -> Result<StreakUpdate> {
        let existing = self.get(user_id)?;
        let day_str = day.format("%Y-%m-%d").to_string();
        let now = chrono::Utc::now().timestamp_millis();

        let last = existing
            .last_active_date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

        // A day at or before the last recorded one never rewinds the
        // streak: same-day repeats are already counted, and a backdated
        // report must not reset a live streak.
        if last.is_some_and(|prev| day <= prev) {
            return Ok(StreakUpdate {
                current_streak: existing.current_streak,
                longest_streak: existing.longest_streak,
                extended: false,
            });
        }

        let new_streak = match last {
            Some(prev) if day.pred_opt() == Some(prev) => existing.current_streak + 1,
            _ => 1,
        };
        let longest = new_streak.max(existing.longest_streak);

        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO streaks (user_id, current_streak, longest_streak, last_active_date, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(user_id) DO UPDATE SET
                   current_streak = ?2, longest_streak = ?3, last_active_date = ?4, updated_at = ?5"#,
            params![user_id, new_streak, longest, day_str, now],
        )?;

        debug!(user = user_id, streak = new_streak, "streak activity recorded");
        Ok(StreakUpdate {
            current_streak: new_streak,
            longest_streak: longest,
            extended: true,
        })
    }

    /// Current streak state for a user (zeroed default if absent).
    pub fn get(&self, user_id: &str) -> Result<StreakRecord> {
        let conn = self.db.conn();
        let record = conn
            .query_row(
                "SELECT current_streak, longest_streak, last_active_date FROM streaks WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(StreakRecord {
                        current_streak: row.get(0)?,
                        longest_streak: row.get(1)?,
                        last_active_date: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record.unwrap_or_default())
    }

    /// Project the current streak into consecutive-day achievements.
    ///
    /// Reports the streak length as progress for every consecutive-day
    /// definition, so partial streaks show up in summaries and a
    /// long-target achievement accumulates its history before the day
    /// it completes. Intended to be invoked once per user per activity
    /// period.
    pub fn update_streak_achievements(
        &self,
        user_id: &str,
    ) -> Result<Vec<(String, UnlockResult)>> {
        let streak = self.get(user_id)?;
        if streak.current_streak == 0 {
            return Ok(vec![]);
        }
        let defs = {
            let conn = self.db.conn();
            catalog::achievements_of_type(&conn, RequirementType::ConsecutiveDays)?
        };

        let mut results = Vec::new();
        for def in defs {
            let result = self.progress.record_progress(
                user_id,
                &def.id,
                streak.current_streak,
                &ProgressMetadata::default(),
            )?;
            results.push((def.id, result));
        }
        Ok(results)
    }
}
