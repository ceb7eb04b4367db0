//! Configuration loading, validation, and management for autochat.
//!
//! Loads configuration from `~/.autochat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.autochat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Default model (engine)
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// How many trailing messages go out with each request
    #[serde(default = "default_history_len")]
    pub history_len: NonZeroUsize,

    /// Optional cap on tokens per completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Agent loop budgets
    #[serde(default)]
    pub agent: AgentConfig,

    /// Structured-output repair settings
    #[serde(default)]
    pub repair: RepairConfig,

    /// Todoist credentials
    #[serde(default)]
    pub todoist: TodoistConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.5
}
fn default_history_len() -> NonZeroUsize {
    NonZeroUsize::new(25).unwrap_or(NonZeroUsize::MIN)
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("history_len", &self.history_len)
            .field("max_tokens", &self.max_tokens)
            .field("agent", &self.agent)
            .field("repair", &self.repair)
            .field("todoist", &self.todoist)
            .field("logging", &self.logging)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Tool-invoking steps allowed per objective
    #[serde(default = "default_max_actions")]
    pub max_actions: NonZeroU32,

    /// Corrective observations allowed per objective
    #[serde(default = "default_max_corrections")]
    pub max_corrections: NonZeroU32,
}

fn default_max_actions() -> NonZeroU32 {
    NonZeroU32::new(50).unwrap_or(NonZeroU32::MIN)
}
fn default_max_corrections() -> NonZeroU32 {
    NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN)
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_actions: default_max_actions(),
            max_corrections: default_max_corrections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Repair requests before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_repair_temperature")]
    pub temperature: f32,

    #[serde(default = "default_repair_history_len")]
    pub history_len: NonZeroUsize,
}

fn default_max_retries() -> u32 {
    3
}
fn default_repair_temperature() -> f32 {
    0.7
}
fn default_repair_history_len() -> NonZeroUsize {
    NonZeroUsize::new(15).unwrap_or(NonZeroUsize::MIN)
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            temperature: default_repair_temperature(),
            history_len: default_repair_history_len(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TodoistConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_todoist_url")]
    pub api_url: String,
}

fn default_todoist_url() -> String {
    "https://api.todoist.com".into()
}

impl Default for TodoistConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_todoist_url(),
        }
    }
}

impl std::fmt::Debug for TodoistConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoistConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to this file (e.g. "logs/autochat.log")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.autochat/config.toml).
    ///
    /// Environment variables override the file:
    /// - `AUTOCHAT_API_KEY`, then `OPENAI_API_KEY`
    /// - `AUTOCHAT_API_URL`
    /// - `AUTOCHAT_MODEL`
    /// - `TODOIST_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("AUTOCHAT_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("AUTOCHAT_API_URL") {
            self.api_url = url;
        }
        if let Some(model) = lookup("AUTOCHAT_MODEL") {
            self.default_model = model;
        }
        if let Some(key) = lookup("TODOIST_API_KEY") {
            self.todoist.api_key = Some(key);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".autochat")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, t) in [
            ("default_temperature", self.default_temperature),
            ("repair.temperature", self.repair.temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 2.0"
                )));
            }
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(
                "api_url must start with http:// or https://".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            history_len: default_history_len(),
            max_tokens: None,
            agent: AgentConfig::default(),
            repair: RepairConfig::default(),
            todoist: TodoistConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
