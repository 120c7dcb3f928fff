//! Configuration loading and management.
//!
//! Configuration is loaded with the following precedence:
//! 1. Environment variables (`NOVA_*`)
//! 2. Config file (`~/.nova/config.toml`)
//! 3. Defaults

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Model used when neither the config file nor the environment names one.
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";

/// OpenRouter chat completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Completion API configuration.
    pub api: ApiConfig,

    /// Storage configuration.
    pub storage: StorageConfig,
}

/// Completion API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API key. When set it takes priority over the key stored in the vault.
    pub key: Option<String>,

    /// Model identifier sent with every request.
    pub model: String,

    /// Chat completions URL.
    pub endpoint: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl ApiConfig {
    /// The configured key, ignoring blank values.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the nova home directory.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_nova_home(),
        }
    }
}

/// Get the default nova home directory.
fn default_nova_home() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".nova"), |h| h.join(".nova"))
}

/// Load configuration with precedence: env vars → file → defaults.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let config_path = get_config_path();
    if config_path.exists() {
        let contents = fs::read_to_string(&config_path).map_err(Error::Storage)?;
        config = parse_config(&contents)?;
    }

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Parse a TOML config document.
///
/// # Errors
///
/// Returns `Error::Config` if the document is not valid TOML for [`Config`].
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
}

/// Get the path to the config file.
fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("NOVA_CONFIG") {
        return PathBuf::from(path);
    }

    if let Ok(home) = env::var("NOVA_HOME") {
        return PathBuf::from(home).join("config.toml");
    }

    default_nova_home().join("config.toml")
}

/// Apply environment variable overrides to config.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(path) = env::var("NOVA_STORAGE_PATH") {
        config.storage.path = PathBuf::from(path);
    } else if let Ok(home) = env::var("NOVA_HOME") {
        config.storage.path = PathBuf::from(home);
    }

    if let Ok(key) = env::var("NOVA_API_KEY") {
        if !key.trim().is_empty() {
            config.api.key = Some(key);
        }
    }

    if let Ok(model) = env::var("NOVA_MODEL") {
        if !model.trim().is_empty() {
            config.api.model = model;
        }
    }

    if let Ok(endpoint) = env::var("NOVA_ENDPOINT") {
        if !endpoint.trim().is_empty() {
            config.api.endpoint = endpoint;
        }
    }
}
