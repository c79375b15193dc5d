//! Bridge Configuration
//!
//! Handles parsing of `yolo_bridge.toml`: which type names to try, what the
//! provider's methods are called, and where provider libraries live.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reflect::DEFAULT_CANDIDATES;

/// File searched for from the working directory upwards
pub const CONFIG_FILE_NAME: &str = "yolo_bridge.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "YT_BRIDGE_CONFIG";

/// Environment variable with extra provider search paths (platform path list)
pub const PLUGIN_PATH_ENV: &str = "YT_PLUGIN_PATH";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching yolo_bridge.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    /// Task type lookup
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Provider method names
    #[serde(default)]
    pub methods: MethodConfig,

    /// Provider libraries
    #[serde(default)]
    pub plugins: PluginConfig,
}

impl BridgeConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Find and load configuration by searching up from the given directory.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                return Ok(Self::default());
            }
        }
    }

    /// Load from `YT_BRIDGE_CONFIG` if set, otherwise search from the
    /// working directory.
    pub fn load_from_env() -> ConfigResult<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let cwd = std::env::current_dir()?;
        Self::find_and_load(&cwd)
    }

    /// Configured search paths followed by those from `YT_PLUGIN_PATH`.
    pub fn plugin_search_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.plugins.search_paths.clone();
        if let Some(extra) = std::env::var_os(PLUGIN_PATH_ENV) {
            paths.extend(std::env::split_paths(&extra).filter(|p| !p.as_os_str().is_empty()));
        }
        paths
    }
}

/// Task type lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Qualified names tried in order (`Namespace.Type, Component`)
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,
}

fn default_candidates() -> Vec<String> {
    DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
        }
    }
}

/// Names of the provider methods driven by the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodConfig {
    #[serde(default = "default_load_model")]
    pub load_model: String,

    #[serde(default = "default_train")]
    pub train: String,

    #[serde(default = "default_predict")]
    pub predict: String,
}

fn default_load_model() -> String {
    "LoadModel".to_string()
}

fn default_train() -> String {
    "Train".to_string()
}

fn default_predict() -> String {
    "ImagePredict".to_string()
}

impl Default for MethodConfig {
    fn default() -> Self {
        Self {
            load_model: default_load_model(),
            train: default_train(),
            predict: default_predict(),
        }
    }
}

/// Provider library settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Extra directories searched for provider libraries
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Libraries loaded when the registry is first used
    #[serde(default)]
    pub libraries: Vec<String>,
}

static CONFIG: OnceCell<BridgeConfig> = OnceCell::new();

/// The process-wide configuration, loaded on first use.
///
/// Problems reading the file are logged and the defaults are used.
pub fn get() -> &'static BridgeConfig {
    CONFIG.get_or_init(|| match BridgeConfig::load_from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("using default bridge configuration: {}", e);
            BridgeConfig::default()
        }
    })
}

/// Install a configuration before anything reads it.
///
/// Returns the rejected config if one was already in place.
pub fn install(config: BridgeConfig) -> Result<(), BridgeConfig> {
    CONFIG.set(config)
}
