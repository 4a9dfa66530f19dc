//! Leaderboard command implementations

use anyhow::Result;

use questline::engine::Engine;

/// Show the ranked leaderboard
pub fn leaderboard_command(
    engine: &Engine,
    limit: usize,
    since: Option<i64>,
    json: bool,
) -> Result<()> {
    let entries = engine.leaderboard().top(limit, since)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No users yet.");
        return Ok(());
    }

    for e in entries {
        println!(
            "  #{:<3} {:<20} rep {:<6} credits {:<6} achievements {} badges {} streak {}",
            e.rank,
            e.user_id,
            e.reputation,
            e.credits,
            e.achievements.len(),
            e.badges.len(),
            e.current_streak
        );
    }
    Ok(())
}

/// Update a user's externally supplied reputation
pub fn reputation_command(engine: &Engine, user: &str, value: i64) -> Result<()> {
    engine.leaderboard().set_reputation(user, value)?;
    println!("Reputation for {} set to {}", user, value);
    Ok(())
}
