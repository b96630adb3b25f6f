//! Configuration schema definitions.
//!
//! Every section carries `#[serde(default)]`, so a file only has to name the
//! values it changes.

use super::error::{ConfigError, ConfigResult};
use crate::console::ConsoleMode;
use crate::port::{FlowControl, Parity, PortConfiguration, StopBits, Timeouts};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial line configuration
    pub serial: SerialConfig,
    /// Terminal behaviour
    pub console: ConsoleConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        self.serial.port_configuration()?;
        if self.serial.buffer_size == 0 {
            return Err(ConfigError::validation(
                "serial.buffer_size",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device identifier or alias, e.g. `COM3` or `/dev/ttyUSB0`
    pub device: Option<String>,
    /// Baud rate
    pub baud: u32,
    /// Data bits per character (5-8)
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Single read bound in milliseconds, 0 waits for the first byte
    pub read_timeout_ms: u32,
    /// Single write bound in milliseconds, 0 disables it
    pub write_timeout_ms: u32,
    /// Pause between reads while collecting a burst
    pub consecutive_delay_ms: u32,
    /// How long to wait for the first byte of a burst
    pub reception_wait_timeout_ms: u32,
    /// Capacity of the receive buffer
    pub buffer_size: usize,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let line = PortConfiguration::default();
        let timeouts = Timeouts::default();
        Self {
            device: None,
            baud: line.baud_rate,
            data_bits: line.data_bits,
            parity: line.parity,
            stop_bits: line.stop_bits,
            flow_control: line.flow_control,
            read_timeout_ms: timeouts.read_ms,
            write_timeout_ms: timeouts.write_ms,
            consecutive_delay_ms: 10,
            reception_wait_timeout_ms: 1000,
            buffer_size: 1024,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Line settings of this section, rejected if they cannot be written to
    /// a device.
    pub fn port_configuration(&self) -> ConfigResult<PortConfiguration> {
        let config = PortConfiguration {
            baud_rate: self.baud,
            data_bits: self.data_bits,
            parity: self.parity,
            stop_bits: self.stop_bits,
            flow_control: self.flow_control,
        };
        config
            .validate()
            .map_err(|e| ConfigError::validation("serial", e.to_string()))?;
        Ok(config)
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts::new(self.read_timeout_ms, self.write_timeout_ms)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Console section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Mode to switch the terminal to while the port is attached
    pub mode: ConsoleMode,
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `serial_port_core=debug`
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}
