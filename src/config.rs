//! Configuration management for FitTrack
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::constants::{
    AVATAR_BUCKET, COACH_HISTORY_WINDOW, CONFIG_GENERATED, DEFAULT_GEMINI_KEY_ENV, DEFAULT_KEY_ENV, DEFAULT_URL_ENV,
    GEMINI_DEFAULT_MODEL,
};
use crate::utils::datetime;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest history window the coach accepts
pub const MAX_HISTORY_WINDOW: usize = 50;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub coach: CoachConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
}

/// Backend-as-a-service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Environment variable holding the default project URL
    pub url_env: String,
    /// Environment variable holding the default anon key
    pub key_env: String,
    /// Object storage bucket for avatar uploads
    pub avatar_bucket: String,
}

/// AI coach configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Environment variable holding the model API key
    pub api_key_env: String,
    /// Hosted model name
    pub model: String,
    /// Number of most recent workouts summarized for analysis
    pub history_window: usize,
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path (defaults to the user's data directory)
    pub database_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write logs to a file
    pub enabled: bool,
    /// Minimum level: error, warn, info, debug or trace
    pub level: String,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Unit label printed after weights
    pub weight_unit: String,
    /// Date format for workout dates
    pub date_format: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url_env: DEFAULT_URL_ENV.to_string(),
            key_env: DEFAULT_KEY_ENV.to_string(),
            avatar_bucket: AVATAR_BUCKET.to_string(),
        }
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_GEMINI_KEY_ENV.to_string(),
            model: GEMINI_DEFAULT_MODEL.to_string(),
            history_window: COACH_HISTORY_WINDOW,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            weight_unit: "lbs".to_string(),
            date_format: datetime::DISPLAY_DATE_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed level filter, or `None` when the level name is unknown
    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        self.level.trim().parse().ok()
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("fittrack.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("fittrack").join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.backend.url_env.trim().is_empty() {
            anyhow::bail!("backend.url_env cannot be empty");
        }
        if self.backend.key_env.trim().is_empty() {
            anyhow::bail!("backend.key_env cannot be empty");
        }
        if self.backend.avatar_bucket.trim().is_empty() {
            anyhow::bail!("backend.avatar_bucket cannot be empty");
        }

        if self.coach.api_key_env.trim().is_empty() {
            anyhow::bail!("coach.api_key_env cannot be empty");
        }
        if self.coach.model.trim().is_empty() {
            anyhow::bail!("coach.model cannot be empty");
        }
        if self.coach.history_window == 0 || self.coach.history_window > MAX_HISTORY_WINDOW {
            anyhow::bail!(
                "coach.history_window must be between 1 and {}, got {}",
                MAX_HISTORY_WINDOW,
                self.coach.history_window
            );
        }

        if self.logging.level_filter().is_none() {
            anyhow::bail!(
                "Invalid logging.level '{}': expected error, warn, info, debug or trace",
                self.logging.level
            );
        }

        if self.display.weight_unit.trim().is_empty() {
            anyhow::bail!("display.weight_unit cannot be empty");
        }
        if !datetime::is_valid_format(&self.display.date_format) {
            anyhow::bail!("Invalid date_format '{}'", self.display.date_format);
        }

        Ok(())
    }

    /// Database path, falling back to the user's data directory
    pub fn database_path(&self) -> Option<PathBuf> {
        self.storage
            .database_path
            .clone()
            .or_else(crate::storage::LocalStorage::default_path)
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# FitTrack Configuration File\n# Generated on {}\n#\n# Supabase credentials saved with `fittrack config set` override the\n# environment variables named in [backend].\n\n",
            chrono::Local::now().format(datetime::DISPLAY_DATE_FORMAT)
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join("fittrack"))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
