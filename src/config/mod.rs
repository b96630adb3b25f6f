//! Configuration module for serialcat.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_CORE_CONFIG` environment variable (explicit path)
//! 2. `./serialcat.toml` (current directory)
//! 3. `~/.config/serial-core/serialcat.toml` (Linux), `%APPDATA%\serial-core\serialcat.toml` (Windows)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Any configuration value can be overridden via environment variables.
//! The pattern is: `SERIAL_CORE_<SECTION>_<KEY>`
//!
//! Examples:
//! - `SERIAL_CORE_SERIAL_DEVICE=COM4`
//! - `SERIAL_CORE_SERIAL_FLOW_CONTROL=rts-cts`
//! - `SERIAL_CORE_LOGGING_LEVEL=debug`
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_port_core::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//!
//! println!("Device: {:?}", config.serial.device);
//! println!("Line: {}", config.serial.port_configuration()?);
//! # Ok::<(), serial_port_core::config::ConfigError>(())
//! ```
//!
//! A sample file:
//!
//! ```toml
//! [serial]
//! device = "arduino"
//! baud = 115200
//! parity = "none"
//! stop_bits = "one"
//! flow_control = "none"
//! read_timeout_ms = 50
//!
//! [serial.port_aliases]
//! arduino = "/dev/ttyACM0"
//!
//! [console]
//! mode = "ansi"
//!
//! [logging]
//! level = "serial_port_core=debug"
//! format = "compact"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, ConsoleConfig, LogFormat, LoggingConfig, SerialConfig};
