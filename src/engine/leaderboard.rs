//! Leaderboard aggregator
//!
//! Read-only projection over balances, unlocks, grants and streaks.
//! Never a source of truth: every row here is re-derivable from the
//! underlying tables, so the output is safe to cache and recompute.

use rusqlite::{OptionalExtension, params};

use super::db::EngineDb;
use super::error::Result;
use super::models::LeaderboardEntry;

/// Builds ranked leaderboard views.
#[derive(Clone)]
pub struct Leaderboard {
    db: EngineDb,
}

impl Leaderboard {
    pub fn new(db: EngineDb) -> Self {
        Self { db }
    }

    /// Externally supplied reputation metric; thin glue for the counter
    /// source that owns it.
    pub fn set_reputation(&self, user_id: &str, reputation: i64) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO user_reputation (user_id, reputation, updated_at) VALUES (?1, ?2, ?3)
               ON CONFLICT(user_id) DO UPDATE SET reputation = ?2, updated_at = ?3"#,
            params![user_id, reputation, now],
        )?;
        Ok(())
    }

    /// Ranked leaderboard. `since` restricts which unlocks count toward
    /// achievement totals and tie-breaks (a period cutoff in epoch ms);
    /// reputation and credits are always current values.
    ///
    /// Ordering: reputation desc, then total unlocked achievement points
    /// desc, then earliest unlock first.
    pub fn top(&self, limit: usize, since: Option<i64>) -> Result<Vec<LeaderboardEntry>> {
        let conn = self.db.conn();
        let cutoff = since.unwrap_or(0);

        let mut stmt = conn.prepare(
            r#"SELECT user_id FROM user_reputation
               UNION SELECT user_id FROM user_balance
               UNION SELECT user_id FROM achievement_unlocks
               UNION SELECT user_id FROM badge_grants
               UNION SELECT user_id FROM streaks"#,
        )?;
        let users = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut entries = Vec::with_capacity(users.len());
        for user_id in users {
            let reputation: i64 = conn
                .query_row(
                    "SELECT reputation FROM user_reputation WHERE user_id = ?1",
                    params![&user_id],
                    |r| r.get(0),
                )
                .optional()?
                .unwrap_or(0);
            let credits: i64 = conn
                .query_row(
                    "SELECT credits FROM user_balance WHERE user_id = ?1",
                    params![&user_id],
                    |r| r.get(0),
                )
                .optional()?
                .unwrap_or(0);
            let current_streak: i64 = conn
                .query_row(
                    "SELECT current_streak FROM streaks WHERE user_id = ?1",
                    params![&user_id],
                    |r| r.get(0),
                )
                .optional()?
                .unwrap_or(0);

            let mut unlock_stmt = conn.prepare(
                r#"SELECT u.achievement_id, d.reward_points
                   FROM achievement_unlocks u
                   JOIN achievement_defs d ON d.id = u.achievement_id
                   WHERE u.user_id = ?1 AND u.unlocked_at >= ?2
                   ORDER BY u.unlocked_at"#,
            )?;
            let unlocks = unlock_stmt
                .query_map(params![&user_id, cutoff], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let total_achievement_points: i64 = unlocks.iter().map(|(_, p)| p).sum();
            let achievements: Vec<String> = unlocks.into_iter().map(|(id, _)| id).collect();

            let earliest_unlock: Option<i64> = conn
                .query_row(
                    "SELECT MIN(unlocked_at) FROM achievement_unlocks WHERE user_id = ?1 AND unlocked_at >= ?2",
                    params![&user_id, cutoff],
                    |r| r.get(0),
                )
                .optional()?
                .flatten();

            let mut badge_stmt = conn.prepare(
                "SELECT badge_id FROM badge_grants WHERE user_id = ?1 ORDER BY granted_at",
            )?;
            let badges = badge_stmt
                .query_map(params![&user_id], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            entries.push((earliest_unlock, LeaderboardEntry {
                rank: 0,
                user_id,
                reputation,
                credits,
                achievements,
                badges,
                total_achievement_points,
                current_streak,
            }));
        }

        entries.sort_by(|(a_first, a), (b_first, b)| {
            b.reputation
                .cmp(&a.reputation)
                .then(b.total_achievement_points.cmp(&a.total_achievement_points))
                // Earliest unlock wins the final tie; users with no
                // unlocks sort last.
                .then_with(|| match (a_first, b_first) {
                    (Some(x), Some(y)) => x.cmp(y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => a.user_id.cmp(&b.user_id),
                })
        });

        let mut ranked: Vec<LeaderboardEntry> = entries
            .into_iter()
            .take(limit)
            .map(|(_, entry)| entry)
            .collect();
        for (i, entry) in ranked.iter_mut().enumerate() {
            entry.rank = i + 1;
        }
        Ok(ranked)
    }
}
