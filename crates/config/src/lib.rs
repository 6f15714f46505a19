//! Configuration loading, validation, and management for Surveyor.
//!
//! Loads configuration from `~/.surveyor/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.surveyor/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Orchestrator settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Identity configuration
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Data file locations
    #[serde(default)]
    pub data: DataConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2048
}

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
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("identity", &self.identity)
            .field("tools", &self.tools)
            .field("data", &self.data)
            .field("providers", &self.providers)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model calls allowed per user message before the turn is abandoned
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Resolve the calls of one batch concurrently
    #[serde(default)]
    pub parallel_tools: bool,
}

fn default_max_iterations() -> u32 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            parallel_tools: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Replace the built-in persona entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_word_service_url")]
    pub word_service_url: String,

    #[serde(default = "default_word_timeout_secs")]
    pub word_timeout_secs: u64,

    #[serde(default = "default_word_max_results")]
    pub word_max_results: usize,

    #[serde(default = "default_search_default_results")]
    pub search_default_results: usize,

    #[serde(default = "default_search_max_results")]
    pub search_max_results: usize,

    /// Variable-name suggestions offered on a partial match
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
}

fn default_word_service_url() -> String {
    "https://api.datamuse.com/words".into()
}
fn default_word_timeout_secs() -> u64 {
    10
}
fn default_word_max_results() -> usize {
    15
}
fn default_search_default_results() -> usize {
    5
}
fn default_search_max_results() -> usize {
    10
}
fn default_suggestion_limit() -> usize {
    10
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            word_service_url: default_word_service_url(),
            word_timeout_secs: default_word_timeout_secs(),
            word_max_results: default_word_max_results(),
            search_default_results: default_search_default_results(),
            search_max_results: default_search_max_results(),
            suggestion_limit: default_suggestion_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV table of survey questions
    #[serde(default = "default_survey_csv")]
    pub survey_csv: PathBuf,

    /// JSON-lines semantic index built offline
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_survey_csv() -> PathBuf {
    AppConfig::data_dir().join("survey_questions.csv")
}
fn default_index_path() -> PathBuf {
    AppConfig::data_dir().join("survey_index.jsonl")
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            survey_csv: default_survey_csv(),
            index_path: default_index_path(),
            embedding_model: default_embedding_model(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.surveyor/config.toml).
    ///
    /// Environment overrides:
    /// - `SURVEYOR_API_KEY`, then `OPENAI_API_KEY`, then `OPENROUTER_API_KEY`
    /// - `SURVEYOR_PROVIDER`, `SURVEYOR_MODEL`, `SURVEYOR_MAX_ITERATIONS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
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

    /// Apply environment overrides through `lookup`, then re-validate.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            self.api_key = lookup("SURVEYOR_API_KEY")
                .or_else(|| lookup("OPENAI_API_KEY"))
                .or_else(|| lookup("OPENROUTER_API_KEY"));
        }

        if let Some(provider) = lookup("SURVEYOR_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("SURVEYOR_MODEL") {
            self.default_model = model;
        }

        if let Some(raw) = lookup("SURVEYOR_MAX_ITERATIONS") {
            self.agent.max_iterations = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "SURVEYOR_MAX_ITERATIONS must be a positive integer, got '{raw}'"
                ))
            })?;
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".surveyor")
    }

    /// Get the data directory path.
    pub fn data_dir() -> PathBuf {
        Self::config_dir().join("data")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.tools.word_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "tools.word_timeout_secs must be greater than 0".into(),
            ));
        }

        if !(1..=10).contains(&self.tools.search_max_results) {
            return Err(ConfigError::ValidationError(
                "tools.search_max_results must be between 1 and 10".into(),
            ));
        }

        if !(1..=15).contains(&self.tools.word_max_results) {
            return Err(ConfigError::ValidationError(
                "tools.word_max_results must be between 1 and 15".into(),
            ));
        }

        if self.tools.suggestion_limit == 0 {
            return Err(ConfigError::ValidationError(
                "tools.suggestion_limit must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
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
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            identity: IdentityConfig::default(),
            tools: ToolsConfig::default(),
            data: DataConfig::default(),
            providers: HashMap::new(),
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
