//! Streak command implementations

use anyhow::Result;
use chrono::NaiveDate;

use questline::engine::{Engine, UnlockResult};

/// Record today's activity and project the streak into achievements
pub fn activity_command(engine: &Engine, user: &str, date: Option<String>) -> Result<()> {
    let streaks = engine.streaks();

    let update = match date {
        Some(d) => {
            let day = NaiveDate::parse_from_str(&d, "%Y-%m-%d")?;
            streaks.record_activity_on(user, day)?
        }
        None => streaks.record_activity(user)?,
    };

    if update.extended {
        println!(
            "Streak: {} days (longest {})",
            update.current_streak, update.longest_streak
        );
    } else {
        println!(
            "Already counted today. Streak: {} days (longest {})",
            update.current_streak, update.longest_streak
        );
    }

    for (achievement_id, result) in streaks.update_streak_achievements(user)? {
        if let UnlockResult::Unlocked { achievement } = result {
            println!(
                "Unlocked: {} ({}) (+{} points)",
                achievement.name, achievement_id, achievement.reward_points
            );
        }
    }
    Ok(())
}

/// Show a user's current streak state
pub fn show_command(engine: &Engine, user: &str) -> Result<()> {
    let streak = engine.streaks().get(user)?;
    println!(
        "Current: {} days  Longest: {} days  Last active: {}",
        streak.current_streak,
        streak.longest_streak,
        streak.last_active_date.as_deref().unwrap_or("never")
    );
    Ok(())
}
