//! Read-side queries over progress and unlock state.

use rusqlite::params;

use super::db::EngineDb;
use super::error::Result;
use super::models::{
    ProgressView, Rarity, UnlockView, UserProgressSummary, percentage,
};

/// Read interface for per-user achievement state.
#[derive(Clone)]
pub struct ProgressQuery {
    db: EngineDb,
}

impl ProgressQuery {
    pub fn new(db: EngineDb) -> Self {
        Self { db }
    }

    /// Everything a profile page needs: in-progress records with
    /// percentages, unlocked achievements with their rewards, and totals.
    pub fn user_summary(&self, user_id: &str) -> Result<UserProgressSummary> {
        let conn = self.db.conn();

        let mut stmt = conn.prepare(
            r#"SELECT p.achievement_id, d.name, p.current, p.target, p.flagged
               FROM achievement_progress p
               JOIN achievement_defs d ON d.id = p.achievement_id
               WHERE p.user_id = ?1
                 AND NOT EXISTS (
                     SELECT 1 FROM achievement_unlocks u
                     WHERE u.user_id = p.user_id AND u.achievement_id = p.achievement_id
                 )
               ORDER BY p.achievement_id"#,
        )?;
        let in_progress = stmt
            .query_map(params![user_id], |row| {
                let current: i64 = row.get(2)?;
                let target: i64 = row.get(3)?;
                Ok(ProgressView {
                    achievement_id: row.get(0)?,
                    name: row.get(1)?,
                    current,
                    target,
                    percentage: percentage(current, target),
                    flagged: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            r#"SELECT u.achievement_id, d.name, d.rarity, d.reward_points, u.unlocked_at
               FROM achievement_unlocks u
               JOIN achievement_defs d ON d.id = u.achievement_id
               WHERE u.user_id = ?1
               ORDER BY u.unlocked_at"#,
        )?;
        let unlocked = stmt
            .query_map(params![user_id], |row| {
                let rarity: String = row.get(2)?;
                Ok(UnlockView {
                    achievement_id: row.get(0)?,
                    name: row.get(1)?,
                    rarity: Rarity::from_str(&rarity).unwrap_or(Rarity::Common),
                    reward_points: row.get(3)?,
                    unlocked_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let total_points = unlocked.iter().map(|u| u.reward_points).sum();
        let total_unlocked = unlocked.len();

        Ok(UserProgressSummary {
            user_id: user_id.to_string(),
            in_progress,
            unlocked,
            total_points,
            total_unlocked,
        })
    }
}
