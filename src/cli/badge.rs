//! Badge command implementations

use anyhow::Result;

use questline::engine::{Engine, GrantResult};

/// Grant a badge directly by id
pub fn grant_command(engine: &Engine, user: &str, badge: &str) -> Result<()> {
    let result = engine.badges().grant_badge(user, badge)?;
    print_grant(&result);
    Ok(())
}

/// React to an updated subject mastery score
pub fn subject_command(engine: &Engine, user: &str, subject: &str, score: f64) -> Result<()> {
    let result = engine.badges().update_subject_badges(user, subject, score)?;
    print_grant(&result);
    Ok(())
}

fn print_grant(result: &GrantResult) {
    match result {
        GrantResult::Granted { badge_id, .. } => println!("Badge granted: {}", badge_id),
        GrantResult::AlreadyGranted { badge_id } => {
            println!("Badge {} already granted - nothing to do.", badge_id)
        }
        GrantResult::BelowThreshold => println!("Mastery below threshold - no badge."),
        GrantResult::NoBadgeForSubject => println!("No badge defined for that subject."),
    }
}
