//! Service configuration
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments / environment variables (applied by the binary)
//! 2. TOML configuration file
//! 3. Built-in defaults
//!
//! A missing configuration file is not an error: a warning is logged and the
//! defaults are used. A file that exists but cannot be read or parsed is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::normalize::DEFAULT_MAX_DEPTH;
use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MM_CONFIG";

const APP_DIR: &str = "mediameta";
const CONFIG_FILE: &str = "config.toml";

/// Configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP bind address
    pub host: String,

    /// HTTP server port
    ///
    /// Default: 5001
    pub port: u16,

    /// Explicit ffprobe executable
    pub ffprobe_path: Option<PathBuf>,

    /// Explicit AVB dumper executable
    pub avb_dump_path: Option<PathBuf>,

    /// Per-invocation limit for external tools
    pub tool_timeout_secs: u64,

    /// Largest accepted request body
    pub max_upload_bytes: usize,

    /// Nesting limit of the generic normalizer
    pub normalize_max_depth: usize,

    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            ffprobe_path: None,
            avb_dump_path: None,
            tool_timeout_secs: 60,
            max_upload_bytes: 1024 * 1024 * 1024,
            normalize_max_depth: DEFAULT_MAX_DEPTH,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from the first config file found, or defaults
    ///
    /// An explicitly named file (argument or `MM_CONFIG`) must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Loading configuration from {}", path.display());
            return Self::from_file(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
            let path = PathBuf::from(path);
            info!("Loading configuration from {} ({})", path.display(), CONFIG_ENV_VAR);
            return Self::from_file(&path);
        }

        match default_config_paths().into_iter().find(|p| p.exists()) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            None => {
                warn!("No configuration file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        if self.tool_timeout_secs == 0 {
            return Err(Error::Config("tool_timeout_secs must be greater than 0".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be greater than 0".to_string()));
        }
        if self.normalize_max_depth == 0 {
            return Err(Error::Config("normalize_max_depth must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

/// Candidate config files, user directory first
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_DIR).join(CONFIG_FILE));
    }
    if cfg!(unix) {
        paths.push(PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE));
    }
    paths
}
