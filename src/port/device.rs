//! The OS capability the serial core drives but does not implement.
//!
//! A [`Device`] is an open, exclusively owned handle; dropping it releases the
//! OS resource. A [`DeviceOpener`] produces devices from identifiers. The
//! native backend and the mock both plug in here.

use super::configuration::Timeouts;
use super::control::ControlBlock;
use super::error::PortError;
use std::fmt::Debug;

/// An open serial device handle.
pub trait Device: Send + Debug {
    /// The control block the host keeps for this device.
    type State: ControlBlock;

    /// Read the live control block.
    fn get_state(&mut self) -> Result<Self::State, PortError>;

    /// Push a control block to the device.
    fn set_state(&mut self, state: &Self::State) -> Result<(), PortError>;

    /// Push read/write wait behaviour to the device.
    fn set_timeouts(&mut self, timeouts: &Timeouts) -> Result<(), PortError>;

    /// One OS read, bounded by the read timeout.
    ///
    /// Returns as soon as any data is available. A timeout with nothing
    /// received is either `Ok(0)` or an error for which
    /// [`PortError::is_timeout`] holds.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// One OS write; may be short.
    fn write(&mut self, data: &[u8]) -> Result<usize, PortError>;
}

/// Acquires [`Device`]s by OS identifier.
pub trait DeviceOpener: Debug {
    type Device: Device;

    /// Open `identifier` exclusively. The identifier is passed to the OS as-is.
    fn open(&self, identifier: &str) -> Result<Self::Device, PortError>;
}
