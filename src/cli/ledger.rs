//! Ledger command implementations

use anyhow::Result;

use questline::engine::Engine;

/// Show a user's ledger entries and balance
pub fn ledger_command(engine: &Engine, user: &str, limit: usize, offset: usize) -> Result<()> {
    let ledger = engine.ledger();
    let balance = ledger.balance(user)?;
    let entries = ledger.entries(user, limit, offset)?;

    println!("Balance: {} credits\n", balance);
    if entries.is_empty() {
        println!("No ledger entries.");
        return Ok(());
    }

    for e in entries {
        println!(
            "  #{} {} {:+} {}",
            e.id,
            e.event_type,
            e.point_delta,
            e.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Replay a user's ledger and compare against the cached balance
pub fn verify_command(engine: &Engine, user: &str) -> Result<()> {
    let audit = engine.ledger().recompute_balance(user)?;
    if audit.consistent() {
        println!(
            "OK: {} credits across {} entries",
            audit.derived_credits, audit.entry_count
        );
    } else {
        println!(
            "DIVERGED: cached {} != ledger sum {} ({} entries)",
            audit.cached_credits, audit.derived_credits, audit.entry_count
        );
    }
    Ok(())
}
