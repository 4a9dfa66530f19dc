use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use questline::config::Config;
use questline::engine::Engine;

mod cli;

#[derive(Parser)]
#[command(name = "questline")]
#[command(about = "Gamification engine - achievements, badges, and an auditable points ledger")]
#[command(version)]
struct Cli {
    /// Path to the engine database (defaults to ~/.questline/engine.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to the config file (defaults to ~/.questline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report an absolute counter value for a (user, achievement) pair
    Progress {
        #[arg(long)]
        user: String,
        #[arg(long)]
        achievement: String,
        #[arg(long)]
        value: i64,
        /// Contributor ids to merge into the progress record (repeatable)
        #[arg(long = "contributor")]
        contributors: Vec<String>,
        /// Mark this event as externally validated
        #[arg(long)]
        validated: bool,
        #[arg(long)]
        json: bool,
    },

    /// Grant a badge directly by id
    GrantBadge {
        #[arg(long)]
        user: String,
        #[arg(long)]
        badge: String,
    },

    /// React to an updated subject mastery score (0.0 - 1.0)
    SubjectBadge {
        #[arg(long)]
        user: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        score: f64,
    },

    /// Record day activity and check streak achievements
    Activity {
        #[arg(long)]
        user: String,
        /// Activity date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show a user's streak state
    Streak {
        #[arg(long)]
        user: String,
    },

    /// Show a user's achievement progress and unlocks
    Summary {
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },

    /// Show a user's points ledger and balance
    Ledger {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Replay a user's ledger against the cached balance
    Verify {
        #[arg(long)]
        user: String,
    },

    /// List all achievement and badge definitions
    Catalog {
        #[arg(long)]
        json: bool,
    },

    /// Show the ranked leaderboard
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Only count unlocks at or after this epoch-ms timestamp
        #[arg(long)]
        since: Option<i64>,
        #[arg(long)]
        json: bool,
    },

    /// Set a user's externally supplied reputation
    Reputation {
        #[arg(long)]
        user: String,
        #[arg(long)]
        value: i64,
    },

    /// Delete all per-user state (catalog definitions are kept)
    Reset {
        /// Required confirmation
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let db_path = config.resolve_db_path(cli.db.as_deref());
    let engine = Engine::with_settings(&db_path, config.engine_settings())?;

    match cli.command {
        Commands::Progress {
            user,
            achievement,
            value,
            contributors,
            validated,
            json,
        } => {
            cli::progress::progress_command(
                &engine,
                &user,
                &achievement,
                value,
                contributors,
                validated,
                json,
            )?;
        }
        Commands::GrantBadge { user, badge } => {
            cli::badge::grant_command(&engine, &user, &badge)?;
        }
        Commands::SubjectBadge {
            user,
            subject,
            score,
        } => {
            cli::badge::subject_command(&engine, &user, &subject, score)?;
        }
        Commands::Activity { user, date } => {
            cli::streak::activity_command(&engine, &user, date)?;
        }
        Commands::Streak { user } => {
            cli::streak::show_command(&engine, &user)?;
        }
        Commands::Summary { user, json } => {
            cli::summary::summary_command(&engine, &user, json)?;
        }
        Commands::Ledger {
            user,
            limit,
            offset,
        } => {
            cli::ledger::ledger_command(&engine, &user, limit, offset)?;
        }
        Commands::Verify { user } => {
            cli::ledger::verify_command(&engine, &user)?;
        }
        Commands::Catalog { json } => {
            cli::catalog::catalog_command(&engine, json)?;
        }
        Commands::Leaderboard { limit, since, json } => {
            cli::leaderboard::leaderboard_command(&engine, limit, since, json)?;
        }
        Commands::Reputation { user, value } => {
            cli::leaderboard::reputation_command(&engine, &user, value)?;
        }
        Commands::Reset { force } => {
            if !force {
                eprintln!("Refusing to reset without --force");
                std::process::exit(1);
            }
            engine.reset_all()?;
            println!("All per-user state deleted.");
        }
    }

    Ok(())
}
