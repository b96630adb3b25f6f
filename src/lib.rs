//! Serial Port Core Library
//!
//! Cross-platform access to serial devices: open a port by OS identifier,
//! configure speed, framing and flow control, set read/write timeouts and
//! exchange raw bytes.
//!
//! # Modules
//!
//! - `port`: the owned [`SerialPort`], configuration model, control-block
//!   translation and the native/mock device backends
//! - `console`: switching the process terminal into ANSI/raw modes
//! - `config`: configuration management with TOML support
//!
//! # Example
//!
//! ```no_run
//! use serial_port_core::{FlowControl, PortConfiguration, SerialPort, SerialPortAdapter};
//!
//! let mut port = SerialPort::new("/dev/ttyUSB0");
//! if port.open() {
//!     port.set_config(&PortConfiguration {
//!         baud_rate: 115200,
//!         flow_control: FlowControl::RtsCts,
//!         ..PortConfiguration::default()
//!     });
//!     port.set_timeouts(50, 100);
//!
//!     let mut buffer = [0u8; 256];
//!     let n = port.read_bytes_consecutive(&mut buffer, 10, 500);
//!     println!("{:?}", &buffer[..n]);
//! }
//! ```

pub mod config;
pub mod console;
pub mod port;

// Re-export commonly used types for convenience
pub use console::{set_console_mode, ConsoleMode};
pub use port::{
    FlowControl, MockLine, Parity, PortConfiguration, PortError, SerialPort, SerialPortAdapter,
    StopBits, Timeouts,
};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
