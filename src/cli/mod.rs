//! CLI command implementations

pub mod badge;
pub mod catalog;
pub mod leaderboard;
pub mod ledger;
pub mod progress;
pub mod streak;
pub mod summary;
