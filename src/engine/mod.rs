//! Gamification engine
//!
//! Tracks progress toward achievements, grants subject-mastery badges,
//! and maintains an auditable credit balance per user. Stateless and
//! request-triggered: every mutating operation runs as one short
//! transaction against the shared SQLite store, is idempotent, and is
//! safe to retry as a whole unit.
//!
//! # Usage
//!
//! ```ignore
//! let engine = Engine::open(&path)?;
//!
//! // Report an absolute counter value
//! let result = engine.progress().record_progress("u1", "first_steps", 1, &meta)?;
//!
//! // Render a profile page
//! let summary = engine.query().user_summary("u1")?;
//! ```

mod badges;
mod catalog;
mod db;
mod error;
mod ledger;
mod leaderboard;
mod models;
mod progress;
mod queries;
mod streaks;
mod unlock;
mod validator;

pub use badges::BadgeManager;
pub use catalog::{ACHIEVEMENTS, AchievementSeed, BADGES, BadgeSeed};
pub use db::EngineDb;
pub use error::EngineError;
pub use ledger::{BalanceAudit, LedgerQuery, event_type};
pub use leaderboard::Leaderboard;
pub use models::{
    AchievementDef, BadgeDef, GrantResult, LeaderboardEntry, LedgerEntry, ProgressMetadata,
    ProgressRecord, ProgressView, Rarity, RequirementType, StreakRecord, UnlockResult,
    UnlockView, UnlockedAchievement, UserProgressSummary, ValidationFlag,
};
pub use progress::ProgressTracker;
pub use queries::ProgressQuery;
pub use streaks::{StreakTracker, StreakUpdate};
pub use validator::{
    DEFAULT_PACE_DIVISOR, ProgressSnapshot, UnlockCriteria, Validation, validate,
};

use std::path::Path;

use anyhow::Result;

use crate::config::EngineSettings;

/// Central handle for the gamification engine.
///
/// Owns the database handle and hands out component interfaces. Cheap
/// to clone; all clones share one connection.
#[derive(Clone)]
pub struct Engine {
    db: EngineDb,
    settings: EngineSettings,
}

impl Engine {
    /// Open the engine at the default database location
    /// (~/.questline/engine.db) with default settings.
    pub fn new() -> Result<Self> {
        let db = EngineDb::open_default()?;
        Ok(Self {
            db,
            settings: EngineSettings::default(),
        })
    }

    /// Open the engine with a custom database path and default settings.
    pub fn open(path: &Path) -> Result<Self> {
        Self::with_settings(path, EngineSettings::default())
    }

    /// Open the engine with explicit settings.
    pub fn with_settings(path: &Path, settings: EngineSettings) -> Result<Self> {
        let db = EngineDb::open(path)?;
        Ok(Self { db, settings })
    }

    /// Progress ingestion and unlock pipeline.
    pub fn progress(&self) -> ProgressTracker {
        ProgressTracker::new(self.db.clone(), self.settings.pace_divisor)
    }

    /// Badge grants.
    pub fn badges(&self) -> BadgeManager {
        BadgeManager::new(self.db.clone(), self.settings.mastery_threshold)
    }

    /// Streak recording and projection.
    pub fn streaks(&self) -> StreakTracker {
        StreakTracker::new(self.db.clone(), self.progress())
    }

    /// Ledger and balance reads.
    pub fn ledger(&self) -> LedgerQuery {
        LedgerQuery::new(self.db.clone())
    }

    /// Per-user achievement summaries.
    pub fn query(&self) -> ProgressQuery {
        ProgressQuery::new(self.db.clone())
    }

    /// Leaderboard projection and reputation glue.
    pub fn leaderboard(&self) -> Leaderboard {
        Leaderboard::new(self.db.clone())
    }

    /// All achievement definitions in the catalog, stable order.
    pub fn achievements(&self) -> Result<Vec<AchievementDef>> {
        let conn = self.db.conn();
        Ok(catalog::achievements(&conn)?)
    }

    /// Delete all per-user state, keeping the catalog.
    pub fn reset_all(&self) -> Result<()> {
        self.db.reset_all()
    }
}
