//! Points ledger - append-only audit log and cached balances
//!
//! The ledger is the sole source of truth for credits. `user_balance`
//! is a cache: it must always equal the sum of the user's ledger deltas,
//! which is why both are only ever written together, inside the same
//! transaction, through [`record_credit`].

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use super::db::EngineDb;
use super::error::Result;
use super::models::LedgerEntry;

/// Ledger event types
pub mod event_type {
    pub const ACHIEVEMENT_UNLOCKED: &str = "ACHIEVEMENT_UNLOCKED";
    pub const BADGE_EARNED: &str = "BADGE_EARNED";
}

/// Append one ledger row and apply the matching balance change.
///
/// Must be called inside the transaction of the operation that causes
/// the credit change; the caller owns the commit. Zero-delta rows are
/// legal (badge grants write them for audit visibility).
pub(crate) fn record_credit(
    conn: &Connection,
    user_id: &str,
    event: &str,
    point_delta: i64,
    description: &str,
    now: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        r#"INSERT INTO points_ledger (user_id, event_type, point_delta, description, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)"#,
        params![user_id, event, point_delta, description, now],
    )?;
    conn.execute(
        r#"INSERT INTO user_balance (user_id, credits) VALUES (?1, ?2)
           ON CONFLICT(user_id) DO UPDATE SET credits = credits + ?2"#,
        params![user_id, point_delta],
    )?;
    Ok(())
}

/// Result of replaying a user's ledger against the cached balance.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceAudit {
    pub user_id: String,
    pub cached_credits: i64,
    pub derived_credits: i64,
    pub entry_count: i64,
}

impl BalanceAudit {
    /// True when the cache matches the ledger sum. Divergence is a bug.
    pub fn consistent(&self) -> bool {
        self.cached_credits == self.derived_credits
    }
}

/// Read interface over the ledger and balances.
#[derive(Clone)]
pub struct LedgerQuery {
    db: EngineDb,
}

impl LedgerQuery {
    pub fn new(db: EngineDb) -> Self {
        Self { db }
    }

    /// Current cached balance for a user (0 if never credited).
    pub fn balance(&self, user_id: &str) -> Result<i64> {
        let conn = self.db.conn();
        let credits: Option<i64> = conn
            .query_row(
                "SELECT credits FROM user_balance WHERE user_id = ?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(credits.unwrap_or(0))
    }

    /// Ledger rows for a user, most recent first.
    pub fn entries(&self, user_id: &str, limit: usize, offset: usize) -> Result<Vec<LedgerEntry>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            r#"SELECT id, user_id, event_type, point_delta, description, created_at
               FROM points_ledger WHERE user_id = ?1
               ORDER BY id DESC LIMIT ?2 OFFSET ?3"#,
        )?;
        let entries = stmt
            .query_map(params![user_id, limit as i64, offset as i64], |row| {
                Ok(LedgerEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    event_type: row.get(2)?,
                    point_delta: row.get(3)?,
                    description: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Re-derive a user's balance from the ledger and compare it with
    /// the cached value.
    pub fn recompute_balance(&self, user_id: &str) -> Result<BalanceAudit> {
        let conn = self.db.conn();
        let (derived, count): (i64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(point_delta), 0), COUNT(*) FROM points_ledger WHERE user_id = ?1",
            params![user_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        let cached: Option<i64> = conn
            .query_row(
                "SELECT credits FROM user_balance WHERE user_id = ?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(BalanceAudit {
            user_id: user_id.to_string(),
            cached_credits: cached.unwrap_or(0),
            derived_credits: derived,
            entry_count: count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::db::EngineDb;
    use tempfile::tempdir;

    fn test_db() -> (tempfile::TempDir, EngineDb) {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("t.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn test_balance_matches_ledger_sum() {
        let (_dir, db) = test_db();
        {
            let mut conn = db.conn();
            let tx = conn.transaction().unwrap();
            record_credit(&tx, "u1", event_type::ACHIEVEMENT_UNLOCKED, 50, "a", 1).unwrap();
            record_credit(&tx, "u1", event_type::ACHIEVEMENT_UNLOCKED, 100, "b", 2).unwrap();
            record_credit(&tx, "u1", event_type::BADGE_EARNED, 0, "c", 3).unwrap();
            tx.commit().unwrap();
        }

        let query = LedgerQuery::new(db);
        assert_eq!(query.balance("u1").unwrap(), 150);

        let audit = query.recompute_balance("u1").unwrap();
        assert!(audit.consistent());
        assert_eq!(audit.derived_credits, 150);
        assert_eq!(audit.entry_count, 3);
    }

    #[test]
    fn test_entries_most_recent_first() {
        let (_dir, db) = test_db();
        {
            let mut conn = db.conn();
            let tx = conn.transaction().unwrap();
            record_credit(&tx, "u1", event_type::ACHIEVEMENT_UNLOCKED, 50, "first", 1).unwrap();
            record_credit(&tx, "u1", event_type::ACHIEVEMENT_UNLOCKED, 75, "second", 2).unwrap();
            tx.commit().unwrap();
        }

        let query = LedgerQuery::new(db);
        let entries = query.entries("u1", 10, 0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description.as_deref(), Some("second"));
        assert_eq!(entries[1].point_delta, 50);
    }

    #[test]
    fn test_storage_failure_propagates() {
        let (_dir, db) = test_db();
        db.conn()
            .execute_batch("DROP TABLE user_balance")
            .unwrap();

        let query = LedgerQuery::new(db);
        // A broken store must surface as an error, not read as zero
        assert!(query.balance("u1").is_err());
        assert!(query.recompute_balance("u1").is_err());
    }

    #[test]
    fn test_unknown_user_is_zero() {
        let (_dir, db) = test_db();
        let query = LedgerQuery::new(db);
        assert_eq!(query.balance("ghost").unwrap(), 0);
        let audit = query.recompute_balance("ghost").unwrap();
        assert!(audit.consistent());
        assert_eq!(audit.entry_count, 0);
    }
}
