//! Configuration loading and store location resolution
//!
//! The store location is two values, a host URI and a database name, resolved
//! once at process start in this priority order:
//! 1. Environment variable
//! 2. TOML config file
//! 3. Compiled default

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the store host URI
pub const DB_HOST_ENV: &str = "CATEQUESIS_DB_HOST";

/// Environment variable holding the database name
pub const DB_NAME_ENV: &str = "CATEQUESIS_DB_NAME";

/// Environment variable pointing at an explicit TOML config file
pub const CONFIG_FILE_ENV: &str = "CATEQUESIS_CONFIG";

pub const DEFAULT_DB_HOST: &str = "sqlite://./data";
pub const DEFAULT_DB_NAME: &str = "catequesis_db";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const SQLITE_SCHEME: &str = "sqlite://";

/// Contents of `config.toml`
///
/// Every key is optional; a missing file or section falls back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[database]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    pub host: Option<String>,
    pub name: Option<String>,
}

/// `[logging]` section
#[derive(Debug, Clone, Deserialize)]
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

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Resolved store location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Host URI, `sqlite://<directory>` or a bare directory path
    pub host: String,
    /// Database name, becomes `<name>.db` inside the host directory
    pub db_name: String,
}

impl StoreConfig {
    pub fn new(host: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            db_name: db_name.into(),
        }
    }

    /// Store configuration rooted at a directory
    pub fn in_dir(dir: &Path, db_name: impl Into<String>) -> Self {
        Self::new(format!("{}{}", SQLITE_SCHEME, dir.display()), db_name)
    }

    /// Directory named by the host URI
    pub fn host_dir(&self) -> Result<PathBuf> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(Error::Config("Store host is empty".to_string()));
        }

        if let Some(path) = host.strip_prefix(SQLITE_SCHEME) {
            if path.is_empty() {
                return Err(Error::Config(format!("Store host has no path: {}", host)));
            }
            return Ok(PathBuf::from(path));
        }

        if host.contains("://") {
            return Err(Error::Config(format!(
                "Unsupported store host scheme: {} (expected {}<dir>)",
                host, SQLITE_SCHEME
            )));
        }

        Ok(PathBuf::from(host))
    }

    /// Full path of the database file
    pub fn database_path(&self) -> Result<PathBuf> {
        if !is_valid_db_name(&self.db_name) {
            return Err(Error::Config(format!(
                "Invalid database name: {:?}",
                self.db_name
            )));
        }
        Ok(self.host_dir()?.join(format!("{}.db", self.db_name)))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_HOST, DEFAULT_DB_NAME)
    }
}

fn is_valid_db_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() < 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Resolves the store location and logging level
///
/// The TOML file is read once when the resolver is built. A file that fails to
/// load is remembered so the caller can report it once logging is set up.
#[derive(Debug, Clone, Default)]
pub struct StoreConfigResolver {
    toml: TomlConfig,
    load_error: Option<String>,
}

impl StoreConfigResolver {
    /// Load the config file from its default location (missing file is fine)
    pub fn new() -> Self {
        match config_file_path() {
            Some(path) => match load_toml_config(&path) {
                Ok(toml) => Self::with_toml(toml),
                Err(e) => Self {
                    toml: TomlConfig::default(),
                    load_error: Some(format!("Ignoring config file {}: {}", path.display(), e)),
                },
            },
            None => Self::default(),
        }
    }

    /// Resolver over an already-parsed config file
    pub fn with_toml(toml: TomlConfig) -> Self {
        Self {
            toml,
            load_error: None,
        }
    }

    /// Why the config file was ignored, if it was
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Resolve host and database name
    pub fn resolve(&self) -> StoreConfig {
        let host = env_value(DB_HOST_ENV)
            .or_else(|| self.toml.database.host.clone())
            .unwrap_or_else(|| DEFAULT_DB_HOST.to_string());

        let db_name = env_value(DB_NAME_ENV)
            .or_else(|| self.toml.database.name.clone())
            .unwrap_or_else(|| DEFAULT_DB_NAME.to_string());

        StoreConfig { host, db_name }
    }

    /// Default tracing level for the binaries
    pub fn log_level(&self) -> &str {
        &self.toml.logging.level
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Locate the config file
///
/// `$CATEQUESIS_CONFIG` wins; otherwise the user config directory, then `/etc`.
fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = env_value(CONFIG_FILE_ENV) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("catequesis").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/catequesis/config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}
