//! Configuration management for the quiz portal

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::Identity;

/// Saved details of the person using this machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UserProfile {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    /// Stable id, generated on first use
    #[serde(default)]
    pub uid: String,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where quizzes, attempts and logs live (platform data dir if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Tracing filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Rows shown on the results leaderboard
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

fn default_log_filter() -> String {
    "quiz_portal=info".to_string()
}

fn default_leaderboard_size() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_filter: default_log_filter(),
            leaderboard_size: default_leaderboard_size(),
            user: None,
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "quiz-portal")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let proj_dirs = ProjectDirs::from("", "", "quiz-portal")
            .context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Get the log directory path
    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("logs"))
    }

    /// Merge CLI overrides into the saved profile and return the identity to use.
    ///
    /// Returns `None` when no name or email is known, and an error when the
    /// email is malformed (the saved profile is then left untouched). A valid
    /// profile is stored in place with a uid minted if missing; the caller
    /// decides whether to save.
    pub fn resolve_identity(
        &mut self,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Option<Identity>> {
        let mut profile = self.user.clone().unwrap_or_default();
        if let Some(name) = name {
            profile.name = name.trim().to_string();
        }
        if let Some(email) = email {
            profile.email = email.trim().to_string();
        }
        if profile.name.is_empty() || profile.email.is_empty() {
            return Ok(None);
        }
        profile
            .validate()
            .map_err(|e| anyhow!("Invalid user profile: {}", e))?;

        if profile.uid.is_empty() {
            profile.uid = Uuid::new_v4().to_string();
        }
        let identity = Identity {
            name: profile.name.clone(),
            email: profile.email.clone(),
            uid: profile.uid.clone(),
        };
        self.user = Some(profile);
        Ok(Some(identity))
    }
}
