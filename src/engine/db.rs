//! SQLite database connection and schema management for the engine
//!
//! Manages the `~/.questline/engine.db` database with automatic schema
//! migration. The connection is explicitly constructed and passed around
//! as a handle; there is no process-wide singleton.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::catalog;

/// Database wrapper shared by all engine components.
///
/// All uniqueness guarantees (one unlock per pair, one grant per pair)
/// live in the schema, not in application logic: multiple process
/// instances may point at the same database file.
#[derive(Clone)]
pub struct EngineDb {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl EngineDb {
    /// Open or create the engine database at the default location
    /// (~/.questline/engine.db)
    pub fn open_default() -> Result<Self> {
        let db_path = crate::config::data_dir().join("engine.db");
        Self::open(&db_path)
    }

    /// Open or create the engine database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open engine db: {}", path.display()))?;

        // WAL mode so concurrent engine instances can share the file
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Get a reference to the connection (for queries)
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("Engine DB lock poisoned")
    }

    /// Initialize the database schema and seed the catalog
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)?;
        catalog::seed(&conn)?;
        drop(conn);
        self.run_migrations()?;
        Ok(())
    }

    /// Run any pending migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn();

        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .unwrap_or(0);

        // Future migrations go here
        // if version < 2 { ... }
        let _ = version;

        Ok(())
    }

    /// Delete all per-user state (progress, unlocks, grants, streaks,
    /// ledger, balances). Catalog definitions are kept: they are seeded
    /// once and never mutated at runtime.
    pub fn reset_all(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(
            r#"
            DELETE FROM achievement_progress;
            DELETE FROM achievement_unlocks;
            DELETE FROM badge_grants;
            DELETE FROM streaks;
            DELETE FROM points_ledger;
            DELETE FROM user_balance;
            DELETE FROM user_reputation;
            "#,
        )?;
        Ok(())
    }
}

/// SQL schema for the engine database
const SCHEMA_SQL: &str = r#"
-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);

-- ============================================
-- CATALOG (seeded once, read-only at runtime)
-- ============================================

CREATE TABLE IF NOT EXISTS achievement_defs (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    requirement_type TEXT NOT NULL,
    target INTEGER NOT NULL CHECK (target >= 1),
    reward_points INTEGER NOT NULL DEFAULT 0 CHECK (reward_points >= 0),
    rarity TEXT NOT NULL,
    minimum_day_span INTEGER
);

CREATE TABLE IF NOT EXISTS badge_defs (
    id TEXT PRIMARY KEY,
    subject_key TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT NOT NULL
);

-- ============================================
-- PER-USER STATE
-- ============================================

-- Mutable progress, one row per (user, achievement), never deleted
CREATE TABLE IF NOT EXISTS achievement_progress (
    user_id TEXT NOT NULL,
    achievement_id TEXT NOT NULL REFERENCES achievement_defs(id),
    current INTEGER NOT NULL DEFAULT 0,
    target INTEGER NOT NULL,
    first_event_at INTEGER NOT NULL,
    last_event_at INTEGER NOT NULL,
    unique_contributors TEXT NOT NULL DEFAULT '[]',  -- JSON array of opaque ids
    validated_count INTEGER NOT NULL DEFAULT 0,
    flagged INTEGER NOT NULL DEFAULT 0,
    flags TEXT,                                       -- JSON array, set when flagged
    PRIMARY KEY (user_id, achievement_id)
);

-- Terminal unlock facts; the primary key is the exactly-once guarantee
CREATE TABLE IF NOT EXISTS achievement_unlocks (
    user_id TEXT NOT NULL,
    achievement_id TEXT NOT NULL REFERENCES achievement_defs(id),
    unlocked_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, achievement_id)
);
CREATE INDEX IF NOT EXISTS idx_unlocks_user ON achievement_unlocks(user_id);

-- One grant per (user, badge), enforced by the primary key
CREATE TABLE IF NOT EXISTS badge_grants (
    user_id TEXT NOT NULL,
    badge_id TEXT NOT NULL REFERENCES badge_defs(id),
    granted_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, badge_id)
);

-- Day-streak state, written by the activity tracker entry point and
-- read by the streak evaluator
CREATE TABLE IF NOT EXISTS streaks (
    user_id TEXT PRIMARY KEY,
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,
    last_active_date TEXT,
    updated_at INTEGER
);

-- ============================================
-- CREDITS
-- ============================================

-- Append-only audit log; no update or delete path exists
CREATE TABLE IF NOT EXISTS points_ledger (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    point_delta INTEGER NOT NULL,
    description TEXT,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_ledger_user ON points_ledger(user_id);

-- Cached running sum of the user's ledger deltas
CREATE TABLE IF NOT EXISTS user_balance (
    user_id TEXT PRIMARY KEY,
    credits INTEGER NOT NULL DEFAULT 0
);

-- Externally supplied reputation metric (leaderboard sort key)
CREATE TABLE IF NOT EXISTS user_reputation (
    user_id TEXT PRIMARY KEY,
    reputation INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_and_init() {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("test_engine.db")).unwrap();

        let conn = db.conn();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"achievement_defs".to_string()));
        assert!(tables.contains(&"achievement_progress".to_string()));
        assert!(tables.contains(&"achievement_unlocks".to_string()));
        assert!(tables.contains(&"points_ledger".to_string()));
        assert!(tables.contains(&"user_balance".to_string()));
    }

    #[test]
    fn test_reset_keeps_catalog() {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("test_engine.db")).unwrap();
        db.reset_all().unwrap();

        let conn = db.conn();
        let defs: i64 = conn
            .query_row("SELECT COUNT(*) FROM achievement_defs", [], |r| r.get(0))
            .unwrap();
        assert!(defs > 0, "catalog should survive a reset");
    }

    #[test]
    fn test_reopen_does_not_duplicate_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_engine.db");

        let db = EngineDb::open(&path).unwrap();
        let first: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM achievement_defs", [], |r| r.get(0))
            .unwrap();
        drop(db);

        let db = EngineDb::open(&path).unwrap();
        let second: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM achievement_defs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(first, second);
    }
}
