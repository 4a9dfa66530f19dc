//! Engine error taxonomy
//!
//! Only genuine failures surface as errors. Idempotent no-ops
//! (already unlocked, already granted) and validator rejections are
//! returned as data in the result types, never as `Err`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Referenced achievement id is not in the catalog.
    #[error("unknown achievement: {0}")]
    AchievementNotFound(String),

    /// Referenced badge id is not in the catalog.
    #[error("unknown badge: {0}")]
    BadgeNotFound(String),

    /// Caller supplied a value the engine refuses to write (e.g. a
    /// negative counter). Rejected before any transaction starts.
    #[error("invalid progress value: {0}")]
    InvalidValue(i64),

    /// Underlying storage failure. Every engine operation is safe to
    /// retry as a whole unit, so callers may simply re-invoke.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A stored JSON column could not be decoded.
    #[error("corrupt row: {0}")]
    CorruptRow(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
