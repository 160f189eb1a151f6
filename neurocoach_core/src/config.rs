//! Configuration file support.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/neurocoach/config.toml`.
//! The API key may also come from `OPENROUTER_API_KEY` or `OPENAI_API_KEY`,
//! which take precedence over the file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables checked for an API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["OPENROUTER_API_KEY", "OPENAI_API_KEY"];

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

/// General application settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
        }
    }
}

/// Language-model endpoint settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Without a key every generator uses its fallback
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Model used for short coach comments
    #[serde(default = "default_model")]
    pub coach_model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_referer")]
    pub referer: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            coach_model: default_model(),
            timeout_secs: default_timeout_secs(),
            referer: default_referer(),
        }
    }
}

impl LlmConfig {
    /// Non-blank API key, if any
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

// Default value functions
fn default_app_name() -> String {
    "NeuroCoach Vibe".into()
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

fn default_model() -> String {
    "openai/gpt-3.5-turbo".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_referer() -> String {
    "http://localhost:8000".into()
}

impl Config {
    /// Load configuration from the standard config path, then apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            Some(path) => {
                tracing::info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
            None => {
                tracing::info!("No config directory available, using defaults");
                Self::default()
            }
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("neurocoach").join("config.toml"))
    }

    /// Override the API key from the environment when one is set
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in API_KEY_ENV_VARS {
            if let Some(key) = lookup(name).filter(|k| !k.trim().is_empty()) {
                tracing::debug!("Using API key from {}", name);
                self.llm.api_key = Some(key);
                return;
            }
        }
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.llm.timeout_secs == 0 {
            return Err(Error::Config("llm.timeout_secs must be positive".into()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(Error::Config("llm.base_url must not be empty".into()));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
