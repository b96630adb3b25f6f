//! Port-specific error types.
//!
//! The compatibility surface of [`SerialPort`](super::SerialPort) folds every
//! one of these into `false`/`0`/`None`; the `try_*` methods hand them out.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial device was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// The operating system rejected a read, write or control-block call.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested configuration cannot be written to the device.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A read found no data before the configured timeout elapsed.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Attempted to open a port that's already open.
    #[error("Port is already open")]
    AlreadyOpen,

    /// Attempted to use a port that's not open.
    #[error("Port is not open")]
    NotOpen,

    /// The serialport backend failed while acquiring the device.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a device identifier.
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound(identifier.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Map a `serialport` open failure, keeping "device absent" distinguishable.
    pub fn from_open(identifier: &str, err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => Self::not_found(identifier),
            serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => Self::not_found(identifier),
            serialport::ErrorKind::InvalidInput => Self::config(err.to_string()),
            _ => Self::Serial(err),
        }
    }

    /// Whether this error is a plain "no data yet" timeout rather than a failure.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}
