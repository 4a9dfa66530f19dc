//! Badge grant manager
//!
//! Badges are non-point credentials granted once a subject's mastery
//! score crosses the threshold. Grants are idempotent through the
//! `(user_id, badge_id)` primary key; the zero-point ledger row exists
//! purely for audit visibility.

use chrono::Utc;
use rusqlite::params;
use tracing::info;

use super::catalog;
use super::db::EngineDb;
use super::error::Result;
use super::ledger::{self, event_type};
use super::models::GrantResult;

/// Grants subject-mastery badges.
#[derive(Clone)]
pub struct BadgeManager {
    db: EngineDb,
    mastery_threshold: f64,
}

impl BadgeManager {
    pub fn new(db: EngineDb, mastery_threshold: f64) -> Self {
        Self {
            db,
            mastery_threshold,
        }
    }

    /// React to an updated mastery score for one subject.
    ///
    /// No-op below the threshold or when no badge maps to the subject.
    pub fn update_subject_badges(
        &self,
        user_id: &str,
        subject_key: &str,
        mastery_score: f64,
    ) -> Result<GrantResult> {
        if mastery_score < self.mastery_threshold {
            return Ok(GrantResult::BelowThreshold);
        }
        let badge_id = {
            let conn = self.db.conn();
            match catalog::badge_for_subject(&conn, subject_key)? {
                Some(badge) => badge.id,
                None => return Ok(GrantResult::NoBadgeForSubject),
            }
        };
        self.grant_badge(user_id, &badge_id)
    }

    /// Grant a badge directly by id.
    ///
    /// A conflict on the `(user_id, badge_id)` key is "already granted",
    /// not an error.
    pub fn grant_badge(&self, user_id: &str, badge_id: &str) -> Result<GrantResult> {
        let mut conn = self.db.conn();
        let badge = catalog::badge(&conn, badge_id)?;
        let now = Utc::now().timestamp_millis();

        let tx = conn.transaction()?;
        let inserted = tx.execute(
            r#"INSERT OR IGNORE INTO badge_grants (user_id, badge_id, granted_at)
               VALUES (?1, ?2, ?3)"#,
            params![user_id, badge_id, now],
        )?;
        if inserted == 0 {
            return Ok(GrantResult::AlreadyGranted {
                badge_id: badge_id.to_string(),
            });
        }

        // Badges carry no point reward; the ledger row documents the
        // grant in the audit trail.
        ledger::record_credit(
            &tx,
            user_id,
            event_type::BADGE_EARNED,
            0,
            &format!("Badge earned: {}", badge.name),
            now,
        )?;
        tx.commit()?;

        info!(user = user_id, badge = badge_id, "badge granted");
        Ok(GrantResult::Granted {
            badge_id: badge_id.to_string(),
            granted_at: now,
        })
    }

    /// Badge ids granted to a user, oldest first.
    pub fn granted_badges(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT badge_id FROM badge_grants WHERE user_id = ?1 ORDER BY granted_at",
        )?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::EngineError;
    use tempfile::tempdir;

    const THRESHOLD: f64 = 0.8;

    fn manager() -> (tempfile::TempDir, EngineDb, BadgeManager) {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("t.db")).unwrap();
        let mgr = BadgeManager::new(db.clone(), THRESHOLD);
        (dir, db, mgr)
    }

    #[test]
    fn test_below_threshold_is_noop() {
        let (_dir, db, mgr) = manager();
        let result = mgr.update_subject_badges("u1", "Python", 0.79).unwrap();
        assert!(matches!(result, GrantResult::BelowThreshold));

        let grants: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM badge_grants", [], |r| r.get(0))
            .unwrap();
        assert_eq!(grants, 0);
    }

    #[test]
    fn test_grant_once_above_threshold() {
        let (_dir, db, mgr) = manager();
        let result = mgr.update_subject_badges("u1", "Python", 0.81).unwrap();
        assert!(result.granted());

        // Repeat with a higher score: still exactly one grant
        let repeat = mgr.update_subject_badges("u1", "Python", 0.9).unwrap();
        assert!(matches!(repeat, GrantResult::AlreadyGranted { .. }));

        let conn = db.conn();
        let grants: i64 = conn
            .query_row("SELECT COUNT(*) FROM badge_grants", [], |r| r.get(0))
            .unwrap();
        assert_eq!(grants, 1);

        // Exactly one zero-point audit row
        let (rows, sum): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(point_delta), 0) FROM points_ledger WHERE user_id = 'u1'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(sum, 0);
    }

    #[test]
    fn test_granted_badges_oldest_first() {
        let (_dir, _db, mgr) = manager();
        mgr.grant_badge("u1", "badge_python").unwrap();
        mgr.grant_badge("u1", "badge_physics").unwrap();

        let ids = mgr.granted_badges("u1").unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"badge_python".to_string()));
        assert!(mgr.granted_badges("ghost").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_subject_is_noop() {
        let (_dir, _db, mgr) = manager();
        let result = mgr.update_subject_badges("u1", "Alchemy", 0.95).unwrap();
        assert!(matches!(result, GrantResult::NoBadgeForSubject));
    }

    #[test]
    fn test_unknown_badge_id_is_error() {
        let (_dir, _db, mgr) = manager();
        let err = mgr.grant_badge("u1", "badge_alchemy").unwrap_err();
        assert!(matches!(err, EngineError::BadgeNotFound(_)));
    }
}
