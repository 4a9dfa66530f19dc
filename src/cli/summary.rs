//! Summary command implementation

use anyhow::Result;

use questline::engine::Engine;

/// Show a user's achievement progress and unlocks
pub fn summary_command(engine: &Engine, user: &str, json: bool) -> Result<()> {
    let summary = engine.query().user_summary(user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{}: {} unlocked, {} points\n",
        summary.user_id, summary.total_unlocked, summary.total_points
    );

    if !summary.unlocked.is_empty() {
        println!("Unlocked:");
        for u in &summary.unlocked {
            println!(
                "  {} [{}] +{} points",
                u.name,
                u.rarity.as_str(),
                u.reward_points
            );
        }
    }

    if !summary.in_progress.is_empty() {
        println!("In progress:");
        for p in &summary.in_progress {
            let flag = if p.flagged { "  [flagged]" } else { "" };
            println!(
                "  {} {}/{} ({:.0}%){}",
                p.name, p.current, p.target, p.percentage, flag
            );
        }
    }
    Ok(())
}
