//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_CORE";

/// Config file name
const CONFIG_FILE_NAME: &str = "serialcat.toml";

/// Directory below the platform config directory
const APP_DIR_NAME: &str = "serial-core";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_CORE_CONFIG";

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
    /// 1. `SERIAL_CORE_CONFIG` environment variable (explicit path)
    /// 2. `./serialcat.toml` (current directory)
    /// 3. `<config dir>/serial-core/serialcat.toml`
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Overrides that fail to parse are skipped here.
        if let Err(e) = apply_env_overrides(&mut config) {
            tracing::warn!("Ignoring environment overrides: {}", e);
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to file.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or_else(|| ConfigError::MissingRequired("No config file path set".to_string()))?;

        save_to_file(&self.config, path)
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }

    /// Reload configuration from file (if path is set).
    pub fn reload(&mut self) -> ConfigResult<()> {
        if let Some(ref path) = self.config_path {
            let mut config = load_from_file(path)?;
            apply_env_overrides(&mut config)?;
            config.validate()?;
            self.config = config;
        }
        Ok(())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    if let Some(app_config) = get_default_config_path() {
        if app_config.exists() {
            return Some(app_config);
        }
    }

    None
}

/// Get the default config directory for creating new config files.
///
/// `~/.config/serial-core` on Linux, `%APPDATA%\serial-core` on Windows,
/// `~/Library/Application Support/serial-core` on macOS.
pub fn get_default_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_DIR_NAME))
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
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
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
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

/// Parse `SERIAL_CORE_<key>` if it is set.
fn env_value<T>(key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let var = format!("{}_{}", ENV_PREFIX, key);
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::env_parse(var, e.to_string())),
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SERIAL_CORE_<SECTION>_<KEY>`
/// For example:
/// - `SERIAL_CORE_SERIAL_DEVICE=/dev/ttyUSB0`
/// - `SERIAL_CORE_SERIAL_BAUD=115200`
/// - `SERIAL_CORE_CONSOLE_MODE=ansi`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    if let Ok(val) = std::env::var(format!("{}_SERIAL_DEVICE", ENV_PREFIX)) {
        config.serial.device = Some(val);
    }
    if let Some(val) = env_value("SERIAL_BAUD")? {
        config.serial.baud = val;
    }
    if let Some(val) = env_value("SERIAL_DATA_BITS")? {
        config.serial.data_bits = val;
    }
    if let Some(val) = env_value("SERIAL_PARITY")? {
        config.serial.parity = val;
    }
    if let Some(val) = env_value("SERIAL_STOP_BITS")? {
        config.serial.stop_bits = val;
    }
    if let Some(val) = env_value("SERIAL_FLOW_CONTROL")? {
        config.serial.flow_control = val;
    }
    if let Some(val) = env_value("SERIAL_READ_TIMEOUT_MS")? {
        config.serial.read_timeout_ms = val;
    }
    if let Some(val) = env_value("SERIAL_WRITE_TIMEOUT_MS")? {
        config.serial.write_timeout_ms = val;
    }
    if let Some(val) = env_value("SERIAL_CONSECUTIVE_DELAY_MS")? {
        config.serial.consecutive_delay_ms = val;
    }
    if let Some(val) = env_value("SERIAL_RECEPTION_WAIT_TIMEOUT_MS")? {
        config.serial.reception_wait_timeout_ms = val;
    }
    if let Some(val) = env_value("SERIAL_BUFFER_SIZE")? {
        config.serial.buffer_size = val;
    }

    // Console overrides
    if let Some(val) = env_value("CONSOLE_MODE")? {
        config.console.mode = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var(format!("{}_LOGGING_LEVEL", ENV_PREFIX)) {
        config.logging.level = val;
    }
    if let Some(val) = env_value("LOGGING_FORMAT")? {
        config.logging.format = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleMode;
    use crate::port::Parity;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.baud, 9600);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("SERIAL_CORE_SERIAL_BAUD", "57600");
        env::set_var("SERIAL_CORE_SERIAL_PARITY", "odd");
        env::set_var("SERIAL_CORE_CONSOLE_MODE", "ansi-events");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.baud, 57600);
        assert_eq!(loader.config().serial.parity, Parity::Odd);
        assert_eq!(loader.config().console.mode, ConsoleMode::AnsiWithEvents);

        env::remove_var("SERIAL_CORE_SERIAL_BAUD");
        env::remove_var("SERIAL_CORE_SERIAL_PARITY");
        env::remove_var("SERIAL_CORE_CONSOLE_MODE");
    }

    #[test]
    #[serial]
    fn test_bad_env_override_reported() {
        env::set_var("SERIAL_CORE_SERIAL_BAUD", "fast");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));

        // The loader without a file keeps going with defaults.
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.baud, 9600);

        env::remove_var("SERIAL_CORE_SERIAL_BAUD");
    }

    #[test]
    #[serial]
    fn test_env_value_parses_requested_type() {
        env::set_var("SERIAL_CORE_SERIAL_DATA_BITS", " 7 ");
        env::set_var("SERIAL_CORE_LOGGING_FORMAT", "json");

        let bits = env_value::<u8>("SERIAL_DATA_BITS");
        let format = env_value::<crate::config::LogFormat>("LOGGING_FORMAT");
        let absent = env_value::<u32>("SERIAL_NOT_A_KEY");

        env::remove_var("SERIAL_CORE_SERIAL_DATA_BITS");
        env::remove_var("SERIAL_CORE_LOGGING_FORMAT");

        assert_eq!(bits.unwrap(), Some(7));
        assert_eq!(format.unwrap(), Some(crate::config::LogFormat::Json));
        assert_eq!(absent.unwrap(), None);
    }

    #[test]
    fn test_default_config_path_name() {
        if let Some(path) = get_default_config_path() {
            assert!(path.ends_with("serial-core/serialcat.toml"));
        }
    }
}
