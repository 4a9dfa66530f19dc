//! Progress command implementation

use anyhow::Result;

use questline::engine::{Engine, ProgressMetadata, UnlockResult};

/// Report an absolute counter value for one (user, achievement) pair
pub fn progress_command(
    engine: &Engine,
    user: &str,
    achievement: &str,
    value: i64,
    contributors: Vec<String>,
    validated: bool,
    json: bool,
) -> Result<()> {
    let metadata = ProgressMetadata {
        contributors,
        validated,
    };
    let result = engine
        .progress()
        .record_progress(user, achievement, value, &metadata)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match result {
        UnlockResult::Unlocked { achievement } => {
            println!(
                "Unlocked: {} [{}] (+{} points)",
                achievement.name,
                achievement.rarity.as_str(),
                achievement.reward_points
            );
        }
        UnlockResult::AlreadyUnlocked => {
            println!("Already unlocked - nothing to do.");
        }
        UnlockResult::InProgress {
            current,
            target,
            percentage,
        } => {
            println!("In progress: {}/{} ({:.0}%)", current, target, percentage);
        }
        UnlockResult::Flagged { flags } => {
            let names: Vec<&str> = flags.iter().map(|f| f.as_str()).collect();
            println!(
                "Flagged for review: {} (no reward paid out)",
                names.join(", ")
            );
        }
    }
    Ok(())
}
