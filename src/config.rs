//! Configuration loading: TOML file plus `GIT_QUILL_*` environment overrides
//!
//! Resolution order for every setting is CLI flag > environment variable >
//! config file > built-in default. CLI overrides are applied by the command
//! layer; this module handles the rest.

use crate::errors::QuillError;
use crate::log_debug;
use anyhow::{Context, Result, anyhow};
use dirs::{config_dir, data_local_dir};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "GIT_QUILL_";

/// Configuration for the git-quill application.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    /// Provider backend: openai, anthropic, gemini, or openrouter
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier passed to the provider
    #[serde(default = "default_model")]
    pub model: String,
    /// API key; optional here, required by most adapters at construction
    #[serde(default)]
    pub api_key: Option<String>,
    /// Custom API endpoint (optional)
    #[serde(default)]
    pub api_endpoint: Option<String>,
    /// Maximum tokens for generation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// API request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum attempts per generation call (rate-limit retries)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Commit message format: "conventional" or "custom"
    #[serde(default = "default_commit_format")]
    pub commit_format: String,
    /// Ask the model to prefix the message with an emoji
    #[serde(default)]
    pub include_emoji: bool,
    /// Maximum length for the commit subject line
    #[serde(default = "default_max_subject_length")]
    pub max_subject_length: usize,
    /// Record token usage and costs in the ledger
    #[serde(default = "default_track_usage")]
    pub track_usage: bool,
    /// Optional monthly cost ceiling in USD
    #[serde(default)]
    pub monthly_cost_limit: Option<f64>,
    /// Verbose output
    #[serde(default)]
    pub verbose: bool,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_max_tokens() -> u32 {
    200
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_commit_format() -> String {
    "conventional".to_string()
}

fn default_max_subject_length() -> usize {
    72
}

fn default_track_usage() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_endpoint: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            commit_format: default_commit_format(),
            include_emoji: false,
            max_subject_length: default_max_subject_length(),
            track_usage: true,
            monthly_cost_limit: None,
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from the config file (when present), then apply
    /// environment variable overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("cannot read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("invalid config file {}", config_path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        log_debug!("Configuration loaded: provider={}, model={}", config.provider, config.model);
        Ok(config)
    }

    /// Save the configuration to the config file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save the configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }

    /// Path to the configuration file, creating the directory if needed.
    pub fn config_path() -> Result<PathBuf> {
        let mut path = config_dir().ok_or_else(|| anyhow!("unable to determine config directory"))?;
        path.push("git-quill");
        fs::create_dir_all(&path)?;
        path.push("config.toml");
        Ok(path)
    }

    /// Path to the usage ledger database.
    pub fn usage_db_path() -> Result<PathBuf> {
        let mut path =
            data_local_dir().ok_or_else(|| anyhow!("unable to determine data directory"))?;
        path.push("git-quill");
        path.push("usage.db");
        Ok(path)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_var("PROVIDER") {
            self.provider = v;
        }
        if let Some(v) = env_var("MODEL") {
            self.model = v;
        }
        if let Some(v) = env_var("API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = env_var("API_ENDPOINT") {
            self.api_endpoint = Some(v);
        }
        if let Some(v) = env_parse("MAX_TOKENS") {
            self.max_tokens = v;
        }
        if let Some(v) = env_parse("TEMPERATURE") {
            self.temperature = v;
        }
        if let Some(v) = env_parse("TIMEOUT") {
            self.timeout_secs = v;
        }
        if let Some(v) = env_parse("MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = env_var("COMMIT_FORMAT") {
            self.commit_format = v;
        }
        if let Some(v) = env_parse("INCLUDE_EMOJI") {
            self.include_emoji = v;
        }
        if let Some(v) = env_parse("MAX_SUBJECT_LENGTH") {
            self.max_subject_length = v;
        }
        if let Some(v) = env_parse("TRACK_USAGE") {
            self.track_usage = v;
        }
        if let Some(v) = env_parse("COST_LIMIT_MONTHLY") {
            self.monthly_cost_limit = Some(v);
        }
        if let Some(v) = env_parse("VERBOSE") {
            self.verbose = v;
        }
    }

    /// Range checks, reported before any network activity.
    pub fn validate(&self) -> Result<(), QuillError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(QuillError::Configuration(format!(
                "temperature must be between 0.0 and 2.0 (got {})",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(QuillError::Configuration(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(QuillError::Configuration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// API key with the middle elided: first 8 and last 4 characters shown.
    pub fn masked_api_key(&self) -> String {
        match &self.api_key {
            None => "not set".to_string(),
            Some(key) if key.chars().count() <= 12 => "********".to_string(),
            Some(key) => {
                let head: String = key.chars().take(8).collect();
                let tail: String = key
                    .chars()
                    .skip(key.chars().count().saturating_sub(4))
                    .collect();
                format!("{head}...{tail}")
            }
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_key_shows_head_and_tail() {
        let config = Config {
            api_key: Some("sk-abcdefgh123456789wxyz".to_string()),
            ..Config::default()
        };
        assert_eq!(config.masked_api_key(), "sk-abcde...wxyz");
    }

    #[test]
    fn short_keys_are_fully_masked() {
        let config = Config {
            api_key: Some("short".to_string()),
            ..Config::default()
        };
        assert_eq!(config.masked_api_key(), "********");

        let unset = Config::default();
        assert_eq!(unset.masked_api_key(), "not set");
    }

    #[test]
    fn saved_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let path = dir.path().join("config.toml");

        let config = Config {
            provider: "openrouter".to_string(),
            monthly_cost_limit: Some(2.5),
            ..Config::default()
        };
        config.save_to(&path).expect("Failed to save");

        let content = fs::read_to_string(&path).expect("Failed to read");
        let loaded: Config = toml::from_str(&content).expect("Failed to parse");
        assert_eq!(loaded.provider, "openrouter");
        assert_eq!(loaded.monthly_cost_limit, Some(2.5));
    }

    #[test]
    fn out_of_range_temperature_is_rejected() {
        let config = Config {
            temperature: 3.5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
