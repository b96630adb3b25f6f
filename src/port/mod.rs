//! Port abstraction layer for serial communication.
//!
//! [`SerialPort`] owns one device and translates between
//! [`PortConfiguration`] and the host control block. The OS side sits behind
//! the [`Device`]/[`DeviceOpener`] traits so the same port logic runs against
//! real hardware ([`NativeOpener`]) or a scripted [`MockLine`].

pub mod configuration;
pub mod control;
pub mod device;
pub mod error;
pub mod mock;
pub mod native;
pub mod serial;
pub mod traits;

pub use configuration::{
    FlowControl, Parity, PortConfiguration, StopBits, Timeouts, DEFAULT_PORT_CONFIGURATION,
    DEFAULT_TIMEOUTS,
};
pub use control::{ControlBlock, Dcb};
#[cfg(unix)]
pub use control::Termios;
pub use device::{Device, DeviceOpener};
pub use error::PortError;
pub use mock::{MockCounters, MockDevice, MockLine};
pub use native::{NativeDevice, NativeOpener};
pub use serial::SerialPort;
pub use traits::SerialPortAdapter;
