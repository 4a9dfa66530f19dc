//! Configuration loading and management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_PACE_DIVISOR;

/// Get the global data directory path (~/.questline/)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".questline")
}

/// Get the global config file path (~/.questline/config.toml)
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

/// Tunables for the engine, resolved from the config file.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Divisor for the fallback pacing heuristic
    /// (`expected_min_days = target / pace_divisor`).
    pub pace_divisor: i64,
    /// Mastery score at or above which a subject badge is granted.
    pub mastery_threshold: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            pace_divisor: DEFAULT_PACE_DIVISOR,
            mastery_threshold: 0.8,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Database file path; defaults to ~/.questline/engine.db
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub badges: BadgeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Pacing heuristic divisor, applied when an achievement has no
    /// explicit minimum day span.
    #[serde(default = "default_pace_divisor")]
    pub pace_divisor: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            pace_divisor: default_pace_divisor(),
        }
    }
}

fn default_pace_divisor() -> i64 {
    DEFAULT_PACE_DIVISOR
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeConfig {
    #[serde(default = "default_mastery_threshold")]
    pub mastery_threshold: f64,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: default_mastery_threshold(),
        }
    }
}

fn default_mastery_threshold() -> f64 {
    0.8
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load the global config, falling back to defaults when the file
    /// does not exist.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Resolve the database path, honoring an explicit override.
    pub fn resolve_db_path(&self, override_path: Option<&Path>) -> PathBuf {
        if let Some(p) = override_path {
            return p.to_path_buf();
        }
        self.db_path
            .clone()
            .unwrap_or_else(|| data_dir().join("engine.db"))
    }

    /// Engine tunables derived from this config.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            pace_divisor: self.validation.pace_divisor,
            mastery_threshold: self.badges.mastery_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        let settings = config.engine_settings();
        assert_eq!(settings.pace_divisor, DEFAULT_PACE_DIVISOR);
        assert_eq!(settings.mastery_threshold, 0.8);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.validation.pace_divisor = 5;
        config.badges.mastery_threshold = 0.9;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.validation.pace_divisor, 5);
        assert_eq!(loaded.badges.mastery_threshold, 0.9);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[validation]\npace_divisor = 20\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.validation.pace_divisor, 20);
        assert_eq!(config.badges.mastery_threshold, 0.8);
        assert!(config.db_path.is_none());
    }
}
