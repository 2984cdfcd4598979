//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use crate::port::{BaudRate, ParseBaudRateError};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_PORT_MANAGER";

/// Config file name inside the per-user config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config file name looked up in the current directory
const LOCAL_CONFIG_FILE_NAME: &str = "serial-port-manager.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_PORT_MANAGER_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_PORT_MANAGER_CONFIG` environment variable (explicit path)
    /// 2. `./serial-port-manager.toml` (current directory)
    /// 3. `<user config dir>/serial-port-manager/config.toml`
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config, env_var)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    ///
    /// Unlike [`ConfigLoader::load`], a missing file is an error.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config, env_var)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file, no environment).
    pub fn with_defaults() -> Self {
        Self {
            config_path: None,
            config: Config::default(),
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Some(path) = env_var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Per-user config directory
    get_default_config_path().filter(|p| p.exists())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "serial-port-manager")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Apply environment variable overrides to the configuration.
///
/// Variables follow the pattern `SERIAL_PORT_MANAGER_<SECTION>_<KEY>`:
/// - `SERIAL_PORT_MANAGER_SERIAL_DEVICE=/dev/ttyS1`
/// - `SERIAL_PORT_MANAGER_SERIAL_DEFAULT_BAUD=57600`
/// - `SERIAL_PORT_MANAGER_LOGGING_LEVEL=debug`
/// - `SERIAL_PORT_MANAGER_LOGGING_FORMAT=json`
fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let key = |suffix: &str| format!("{ENV_PREFIX}_{suffix}");

    if let Some(val) = lookup(&key("SERIAL_DEVICE")) {
        config.serial.device = Some(val);
    }
    if let Some(val) = lookup(&key("SERIAL_DEFAULT_BAUD")) {
        let rate: BaudRate = val.parse().map_err(|e: ParseBaudRateError| {
            ConfigError::env_parse(key("SERIAL_DEFAULT_BAUD"), e.to_string())
        })?;
        config.serial.default_baud = rate.as_u32();
    }
    if let Some(val) = lookup(&key("LOGGING_LEVEL")) {
        config.logging.level = val;
    }
    if let Some(val) = lookup(&key("LOGGING_FORMAT")) {
        config.logging.format = val
            .parse()
            .map_err(|msg: String| ConfigError::env_parse(key("LOGGING_FORMAT"), msg))?;
    }

    Ok(())
}
