//! Configuration management for folderfort

use crate::error::{Error, Result};
use crate::sync::{ExclusionSet, SyncOptions, DEFAULT_EXCLUDE_PATTERNS, DEFAULT_MAX_FILE_SIZE};
use crate::throttle::DEFAULT_UPLOAD_INTERVAL;
use crate::transport::{normalize_base_url, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration directory name
const CONFIG_DIR: &str = "folderfort";

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the configured API token
pub const TOKEN_ENV_VAR: &str = "FOLDERFORT_API_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            timeout: default_timeout(),
        }
    }
}

/// Directory sync settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
    /// Largest file uploaded, in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_upload_interval_ms")]
    pub upload_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: default_exclude_patterns(),
            max_file_size: default_max_file_size(),
            upload_interval_ms: default_upload_interval_ms(),
        }
    }
}

impl SyncConfig {
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            exclude: ExclusionSet::new(self.exclude_patterns.iter().cloned()),
            max_file_size: self.max_file_size,
        }
    }

    pub fn upload_interval(&self) -> Duration {
        Duration::from_millis(self.upload_interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ConfigFile {
    /// API token from the environment, falling back to the file
    pub fn api_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| self.api.api_token.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout)
    }
}

// Default values
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_exclude_patterns() -> Vec<String> {
    DEFAULT_EXCLUDE_PATTERNS.iter().map(|p| p.to_string()).collect()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_upload_interval_ms() -> u64 {
    DEFAULT_UPLOAD_INTERVAL.as_millis() as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let home = home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR))
}

/// Get the configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Load configuration from the default location
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&get_config_path()?)
}

/// Load configuration, using defaults when no file exists yet
pub fn load_config_or_default() -> Result<ConfigFile> {
    let config_path = get_config_path()?;
    if config_path.exists() {
        load_config_from(&config_path)
    } else {
        Ok(ConfigFile::default())
    }
}

/// Load configuration from an explicit file
pub fn load_config_from(config_path: &Path) -> Result<ConfigFile> {
    if !config_path.exists() {
        return Err(Error::ConfigNotFound(config_path.to_path_buf()));
    }

    let content = fs::read_to_string(config_path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config file: {}", e))
    })?;

    let config: ConfigFile = toml::from_str(&content).map_err(|e| {
        Error::InvalidConfig(format!("Failed to parse config file: {}", e))
    })?;

    Ok(config)
}

/// Save configuration to the default location
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let config_path = get_config_path()?;
    save_config_to(config, &config_path)?;
    Ok(config_path)
}

/// Save configuration to an explicit file
pub fn save_config_to(config: &ConfigFile, config_path: &Path) -> Result<()> {
    if let Some(dir) = config_path.parent() {
        fs::create_dir_all(dir).map_err(|e| {
            Error::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    let content = toml::to_string_pretty(config)?;

    fs::write(config_path, content).map_err(|e| {
        Error::Config(format!("Failed to write config file: {}", e))
    })?;

    // The file may hold the API token
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(config_path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(config_path, perms)?;
    }

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &ConfigFile) -> Result<()> {
    normalize_base_url(&config.api.base_url)
        .map_err(|_| Error::InvalidConfig(format!(
            "api.base_url must look like {} (got '{}')",
            DEFAULT_BASE_URL, config.api.base_url
        )))?;

    if let Some(token) = &config.api.api_token {
        if token.trim().is_empty() {
            return Err(Error::InvalidConfig("api.api_token cannot be empty".to_string()));
        }
    }

    if config.api.timeout == 0 {
        return Err(Error::InvalidConfig("api.timeout must be at least 1 second".to_string()));
    }

    if config.sync.max_file_size == 0 {
        return Err(Error::InvalidConfig("sync.max_file_size must be positive".to_string()));
    }

    if config.sync.exclude_patterns.iter().any(|p| p.is_empty()) {
        return Err(Error::InvalidConfig(
            "sync.exclude_patterns cannot contain empty patterns (they would match every path)".to_string(),
        ));
    }

    Ok(())
}
