//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/pantry/config.toml)
//! 3. Environment variables (PANTRY_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::images::{GoogleImageSearch, ImageSearch, NoImageSearch, DEFAULT_ENDPOINT};

/// Environment variable prefix
const ENV_PREFIX: &str = "PANTRY";

/// Default store poll interval in milliseconds
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for local data (item collection, pending journal)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Item collection file; defaults to `items.json` in the data directory
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// How often the collection file is checked for changes
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub image_search: ImageSearchConfig,

    /// Log file path (optional, logs go to stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Credentials for the image search API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSearchConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    /// Custom search engine ID (`cx`)
    #[serde(default)]
    pub engine_id: Option<String>,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for ImageSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            endpoint: default_endpoint(),
        }
    }
}

impl ImageSearchConfig {
    /// Whether both the key and the engine ID are set
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.engine_id.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_path: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            image_search: ImageSearchConfig::default(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (PANTRY_DATA_DIR, PANTRY_STORE_PATH, ...)
    /// 2. Config file (~/.config/pantry/config.toml or PANTRY_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(cli_path: Option<&PathBuf>) -> Result<Self> {
        match cli_path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load only what the config file says, without environment overrides
    ///
    /// Used when the configuration is about to be written back, so values
    /// from the environment don't end up in the file.
    pub fn load_file_only(cli_path: Option<&PathBuf>) -> Result<Self> {
        match cli_path {
            Some(path) => Self::read_file(path),
            None => Self::read_file(&Self::config_file_path()),
        }
    }

    fn read_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // PANTRY_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // PANTRY_STORE_PATH
        if let Ok(val) = std::env::var(format!("{}_STORE_PATH", ENV_PREFIX)) {
            self.store_path = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        // PANTRY_POLL_INTERVAL_MS
        if let Ok(val) = std::env::var(format!("{}_POLL_INTERVAL_MS", ENV_PREFIX)) {
            match val.parse() {
                Ok(ms) => self.poll_interval_ms = ms,
                Err(_) => warn!("Ignoring invalid {}_POLL_INTERVAL_MS: {:?}", ENV_PREFIX, val),
            }
        }

        // PANTRY_IMAGE_API_KEY
        if let Ok(val) = std::env::var(format!("{}_IMAGE_API_KEY", ENV_PREFIX)) {
            self.image_search.api_key = if val.is_empty() { None } else { Some(val) };
        }

        // PANTRY_IMAGE_ENGINE_ID
        if let Ok(val) = std::env::var(format!("{}_IMAGE_ENGINE_ID", ENV_PREFIX)) {
            self.image_search.engine_id = if val.is_empty() { None } else { Some(val) };
        }
    }

    /// Ensure data directory exists
    pub fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with PANTRY_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pantry")
            .join("config.toml")
    }

    /// Get the path to the item collection file
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("items.json"))
    }

    /// Get the path to the pending edit journal
    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join("pending.json")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Build the image search client for these settings
    ///
    /// Falls back to a search that never finds anything when credentials are
    /// missing or the HTTP client cannot be created.
    pub fn image_search(&self) -> Arc<dyn ImageSearch> {
        let settings = &self.image_search;
        let (Some(key), Some(engine)) = (&settings.api_key, &settings.engine_id) else {
            return Arc::new(NoImageSearch);
        };

        match GoogleImageSearch::new(key.clone(), engine.clone()) {
            Ok(search) => Arc::new(search.with_endpoint(settings.endpoint.clone())),
            Err(e) => {
                warn!("Image search disabled: {}", e);
                Arc::new(NoImageSearch)
            }
        }
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pantry")
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
