//! Questline - gamification progress/unlock/ledger engine
//!
//! Questline ingests externally-reported activity counters, decides when
//! a goal is satisfied, runs anti-gaming validation before paying out,
//! and guarantees every reward is granted exactly once even under
//! concurrent, retried, or duplicate requests.
//!
//! The platform around it (web layer, identity, forums, schedulers)
//! supplies raw counters and renders the results; this crate owns the
//! progress records, the unlock facts, the badge grants, and the
//! append-only points ledger they are audited against.

pub mod config;
pub mod engine;

pub use engine::{Engine, EngineError, GrantResult, ProgressMetadata, UnlockResult};
