//! Achievement and badge catalog
//!
//! All definitions are declared here and seeded into the database once
//! at startup. They are never mutated at runtime; progress records copy
//! the target at creation so an old record stays consistent with the
//! definition that created it.

use rusqlite::{Connection, OptionalExtension, params};

use super::error::{EngineError, Result};
use super::models::{AchievementDef, BadgeDef, Rarity, RequirementType};

/// Static achievement definition (compile-time catalog entry)
pub struct AchievementSeed {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub requirement_type: RequirementType,
    pub target: i64,
    pub reward_points: i64,
    pub rarity: Rarity,
    pub minimum_day_span: Option<i64>,
}

/// Static badge definition (compile-time catalog entry)
pub struct BadgeSeed {
    pub id: &'static str,
    pub subject_key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// All achievement definitions
pub static ACHIEVEMENTS: &[AchievementSeed] = &[
    // === ASKING ===
    AchievementSeed {
        id: "first_steps",
        name: "First Steps",
        description: "Ask your first doubt",
        category: "asking",
        requirement_type: RequirementType::CountAsked,
        target: 1,
        reward_points: 50,
        rarity: Rarity::Common,
        minimum_day_span: None,
    },
    AchievementSeed {
        id: "curious_mind",
        name: "Curious Mind",
        description: "Ask 10 doubts",
        category: "asking",
        requirement_type: RequirementType::CountAsked,
        target: 10,
        reward_points: 100,
        rarity: Rarity::Common,
        minimum_day_span: None,
    },
    AchievementSeed {
        id: "knowledge_seeker",
        name: "Knowledge Seeker",
        description: "Ask 50 doubts",
        category: "asking",
        requirement_type: RequirementType::CountAsked,
        target: 50,
        reward_points: 250,
        rarity: Rarity::Uncommon,
        minimum_day_span: None,
    },
    // === ANSWERING ===
    AchievementSeed {
        id: "first_answer",
        name: "Helping Hand",
        description: "Post your first answer",
        category: "answering",
        requirement_type: RequirementType::CountAnswered,
        target: 1,
        reward_points: 50,
        rarity: Rarity::Common,
        minimum_day_span: None,
    },
    AchievementSeed {
        id: "active_responder",
        name: "Active Responder",
        description: "Post 25 answers",
        category: "answering",
        requirement_type: RequirementType::CountAnswered,
        target: 25,
        reward_points: 200,
        rarity: Rarity::Uncommon,
        minimum_day_span: None,
    },
    AchievementSeed {
        id: "doubt_resolver",
        name: "Doubt Resolver",
        description: "Have 20 of your answers accepted",
        category: "answering",
        requirement_type: RequirementType::CountResolved,
        target: 20,
        reward_points: 400,
        rarity: Rarity::Rare,
        minimum_day_span: Some(5),
    },
    AchievementSeed {
        id: "helpful_contributor",
        name: "Helpful Contributor",
        description: "Collect 25 helpful-answer marks",
        category: "answering",
        requirement_type: RequirementType::HelpfulAnswers,
        target: 25,
        reward_points: 400,
        rarity: Rarity::Rare,
        minimum_day_span: Some(7),
    },
    // === COMMUNITY ===
    AchievementSeed {
        id: "mentor",
        name: "Mentor",
        description: "Help 5 unique students",
        category: "community",
        requirement_type: RequirementType::StudentsHelped,
        target: 5,
        reward_points: 300,
        rarity: Rarity::Uncommon,
        minimum_day_span: None,
    },
    AchievementSeed {
        id: "community_pillar",
        name: "Community Pillar",
        description: "Help 25 unique students",
        category: "community",
        requirement_type: RequirementType::StudentsHelped,
        target: 25,
        reward_points: 800,
        rarity: Rarity::Epic,
        minimum_day_span: Some(14),
    },
    // === REPUTATION ===
    AchievementSeed {
        id: "rising_star",
        name: "Rising Star",
        description: "Reach 100 reputation",
        category: "reputation",
        requirement_type: RequirementType::Reputation,
        target: 100,
        reward_points: 150,
        rarity: Rarity::Common,
        minimum_day_span: None,
    },
    AchievementSeed {
        id: "trusted_voice",
        name: "Trusted Voice",
        description: "Reach 500 reputation",
        category: "reputation",
        requirement_type: RequirementType::Reputation,
        target: 500,
        reward_points: 600,
        rarity: Rarity::Epic,
        minimum_day_span: None,
    },
    // === STREAKS ===
    AchievementSeed {
        id: "consistent_learner",
        name: "Consistent Learner",
        description: "Maintain a 7-day streak",
        category: "streak",
        requirement_type: RequirementType::ConsecutiveDays,
        target: 7,
        reward_points: 300,
        rarity: Rarity::Uncommon,
        minimum_day_span: None,
    },
    AchievementSeed {
        id: "marathon_learner",
        name: "Marathon Learner",
        description: "Maintain a 30-day streak",
        category: "streak",
        requirement_type: RequirementType::ConsecutiveDays,
        target: 30,
        reward_points: 1500,
        rarity: Rarity::Legendary,
        minimum_day_span: None,
    },
];

/// All badge definitions, keyed by mastery subject
pub static BADGES: &[BadgeSeed] = &[
    BadgeSeed {
        id: "badge_python",
        subject_key: "Python",
        name: "Python Adept",
        description: "Demonstrated mastery of Python",
    },
    BadgeSeed {
        id: "badge_mathematics",
        subject_key: "Mathematics",
        name: "Mathematics Adept",
        description: "Demonstrated mastery of Mathematics",
    },
    BadgeSeed {
        id: "badge_physics",
        subject_key: "Physics",
        name: "Physics Adept",
        description: "Demonstrated mastery of Physics",
    },
    BadgeSeed {
        id: "badge_chemistry",
        subject_key: "Chemistry",
        name: "Chemistry Adept",
        description: "Demonstrated mastery of Chemistry",
    },
    BadgeSeed {
        id: "badge_biology",
        subject_key: "Biology",
        name: "Biology Adept",
        description: "Demonstrated mastery of Biology",
    },
    BadgeSeed {
        id: "badge_computer_science",
        subject_key: "ComputerScience",
        name: "Computer Science Adept",
        description: "Demonstrated mastery of Computer Science",
    },
];

/// Seed catalog definitions. Idempotent: existing rows are left alone.
pub(crate) fn seed(conn: &Connection) -> rusqlite::Result<()> {
    for a in ACHIEVEMENTS {
        conn.execute(
            r#"INSERT OR IGNORE INTO achievement_defs
               (id, name, description, category, requirement_type, target,
                reward_points, rarity, minimum_day_span)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                a.id,
                a.name,
                a.description,
                a.category,
                a.requirement_type.as_str(),
                a.target,
                a.reward_points,
                a.rarity.as_str(),
                a.minimum_day_span,
            ],
        )?;
    }
    for b in BADGES {
        conn.execute(
            r#"INSERT OR IGNORE INTO badge_defs (id, subject_key, name, description)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![b.id, b.subject_key, b.name, b.description],
        )?;
    }
    Ok(())
}

fn achievement_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AchievementDef> {
    let requirement: String = row.get(4)?;
    let rarity: String = row.get(7)?;
    Ok(AchievementDef {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        requirement_type: RequirementType::from_str(&requirement)
            .unwrap_or(RequirementType::CountAsked),
        target: row.get(5)?,
        reward_points: row.get(6)?,
        rarity: Rarity::from_str(&rarity).unwrap_or(Rarity::Common),
        minimum_day_span: row.get(8)?,
    })
}

const ACHIEVEMENT_COLUMNS: &str = "id, name, description, category, requirement_type, \
                                   target, reward_points, rarity, minimum_day_span";

/// Look up a single achievement definition.
pub(crate) fn achievement(conn: &Connection, id: &str) -> Result<AchievementDef> {
    let sql = format!("SELECT {ACHIEVEMENT_COLUMNS} FROM achievement_defs WHERE id = ?1");
    conn.query_row(&sql, params![id], achievement_from_row)
        .optional()?
        .ok_or_else(|| EngineError::AchievementNotFound(id.to_string()))
}

/// All achievement definitions, stable order.
pub(crate) fn achievements(conn: &Connection) -> Result<Vec<AchievementDef>> {
    let sql = format!("SELECT {ACHIEVEMENT_COLUMNS} FROM achievement_defs ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let defs = stmt
        .query_map([], achievement_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(defs)
}

/// Achievement definitions of one requirement type.
pub(crate) fn achievements_of_type(
    conn: &Connection,
    requirement: RequirementType,
) -> Result<Vec<AchievementDef>> {
    let sql = format!(
        "SELECT {ACHIEVEMENT_COLUMNS} FROM achievement_defs \
         WHERE requirement_type = ?1 ORDER BY target"
    );
    let mut stmt = conn.prepare(&sql)?;
    let defs = stmt
        .query_map(params![requirement.as_str()], achievement_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(defs)
}

fn badge_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BadgeDef> {
    Ok(BadgeDef {
        id: row.get(0)?,
        subject_key: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
    })
}

/// Look up a badge definition by id.
pub(crate) fn badge(conn: &Connection, id: &str) -> Result<BadgeDef> {
    conn.query_row(
        "SELECT id, subject_key, name, description FROM badge_defs WHERE id = ?1",
        params![id],
        badge_from_row,
    )
    .optional()?
    .ok_or_else(|| EngineError::BadgeNotFound(id.to_string()))
}

/// Look up a badge definition by mastery subject, if one exists.
pub(crate) fn badge_for_subject(conn: &Connection, subject_key: &str) -> Result<Option<BadgeDef>> {
    let badge = conn
        .query_row(
            "SELECT id, subject_key, name, description FROM badge_defs WHERE subject_key = ?1",
            params![subject_key],
            badge_from_row,
        )
        .optional()?;
    Ok(badge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::db::EngineDb;
    use tempfile::tempdir;

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<&str> = ACHIEVEMENTS.iter().map(|a| a.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ACHIEVEMENTS.len());

        let mut subjects: Vec<&str> = BADGES.iter().map(|b| b.subject_key).collect();
        subjects.sort_unstable();
        subjects.dedup();
        assert_eq!(subjects.len(), BADGES.len());
    }

    #[test]
    fn test_lookup_after_seed() {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("t.db")).unwrap();
        let conn = db.conn();

        let def = achievement(&conn, "first_steps").unwrap();
        assert_eq!(def.target, 1);
        assert_eq!(def.reward_points, 50);
        assert_eq!(def.requirement_type, RequirementType::CountAsked);

        let err = achievement(&conn, "nope").unwrap_err();
        assert!(matches!(err, EngineError::AchievementNotFound(_)));

        let streaky = achievements_of_type(&conn, RequirementType::ConsecutiveDays).unwrap();
        assert_eq!(streaky.len(), 2);
        assert!(streaky[0].target < streaky[1].target);

        assert!(badge_for_subject(&conn, "Python").unwrap().is_some());
        assert!(badge_for_subject(&conn, "Alchemy").unwrap().is_none());
    }
}
