//! Catalog listing command

use anyhow::Result;

use questline::engine::{BADGES, Engine};

/// List all achievement and badge definitions
pub fn catalog_command(engine: &Engine, json: bool) -> Result<()> {
    let defs = engine.achievements()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&defs)?);
        return Ok(());
    }

    println!("Achievements:");
    for d in &defs {
        let pace = match d.minimum_day_span {
            Some(days) => format!(", min {} days", days),
            None => String::new(),
        };
        println!(
            "  {:<20} [{}] {} ({}/{}{}) +{} points",
            d.id,
            d.rarity.as_str(),
            d.name,
            d.requirement_type.as_str(),
            d.target,
            pace,
            d.reward_points
        );
    }

    println!("\nBadges:");
    for b in BADGES {
        println!("  {:<24} {} ({})", b.id, b.name, b.subject_key);
    }
    Ok(())
}
