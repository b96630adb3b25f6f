//! The owned serial port handle.

use super::configuration::{
    PortConfiguration, Timeouts, DEFAULT_PORT_CONFIGURATION, DEFAULT_TIMEOUTS,
};
use super::control::ControlBlock;
use super::device::{Device, DeviceOpener};
use super::error::PortError;
use super::native::NativeOpener;
use super::traits::SerialPortAdapter;
use std::time::Duration;
use tracing::{debug, trace, warn};

type StateOf<O> = <<O as DeviceOpener>::Device as Device>::State;

/// A serial device opened by identifier, exclusively owned.
///
/// Constructed closed. [`open`](SerialPortAdapter::open) acquires the device
/// and applies [`DEFAULT_PORT_CONFIGURATION`] and [`DEFAULT_TIMEOUTS`];
/// dropping the port closes it. Every configuration read or write goes to the
/// OS: the cached control block is refreshed on each call and never trusted
/// across calls.
///
/// No internal locking: share a port between threads only behind your own
/// mutex.
///
/// # Example
/// ```no_run
/// use serial_port_core::port::{PortConfiguration, SerialPort, SerialPortAdapter};
///
/// let mut port = SerialPort::new("/dev/ttyUSB0");
/// if port.open() {
///     port.set_config(&PortConfiguration::default().with_baud_rate(115200));
///     port.write_bytes(b"AT\r\n");
/// }
/// ```
pub struct SerialPort<O: DeviceOpener = NativeOpener> {
    identifier: String,
    opener: O,
    handle: Option<O::Device>,
    live_state: Option<StateOf<O>>,
    timeouts: Timeouts,
}

impl SerialPort<NativeOpener> {
    /// A closed port on the host device `identifier` (e.g. `COM3`, `/dev/ttyUSB0`).
    pub fn new(identifier: impl Into<String>) -> Self {
        Self::with_opener(identifier, NativeOpener)
    }
}

impl<O: DeviceOpener> SerialPort<O> {
    /// A closed port whose device will be acquired through `opener`.
    pub fn with_opener(identifier: impl Into<String>, opener: O) -> Self {
        Self {
            identifier: identifier.into(),
            opener,
            handle: None,
            live_state: None,
            timeouts: DEFAULT_TIMEOUTS,
        }
    }

    /// Control block as of the last configuration call, for diagnostics.
    pub fn cached_state(&self) -> Option<&StateOf<O>> {
        self.live_state.as_ref()
    }

    /// Timeouts last pushed to the device.
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Open the device, reporting why it failed.
    pub fn try_open(&mut self) -> Result<(), PortError> {
        if self.handle.is_some() {
            return Err(PortError::AlreadyOpen);
        }

        // The device is released on every early return below.
        let mut device = self.opener.open(&self.identifier)?;
        let state = push_config(&mut device, &DEFAULT_PORT_CONFIGURATION)?;
        device.set_timeouts(&DEFAULT_TIMEOUTS)?;

        debug!("Opened {} with {}", self.identifier, DEFAULT_PORT_CONFIGURATION);
        self.handle = Some(device);
        self.live_state = Some(state);
        self.timeouts = DEFAULT_TIMEOUTS;
        Ok(())
    }

    pub fn try_set_config(&mut self, config: &PortConfiguration) -> Result<(), PortError> {
        let device = self.handle.as_mut().ok_or(PortError::NotOpen)?;
        let state = push_config(device, config)?;
        debug!("Configured {} as {}", self.identifier, config);
        self.live_state = Some(state);
        Ok(())
    }

    pub fn try_get_config(&mut self) -> Result<PortConfiguration, PortError> {
        let device = self.handle.as_mut().ok_or(PortError::NotOpen)?;
        let state = device.get_state()?;
        let config = state.to_configuration();
        self.live_state = Some(state);
        Ok(config)
    }

    pub fn try_set_baud(&mut self, baud_rate: u32) -> Result<(), PortError> {
        let device = self.handle.as_mut().ok_or(PortError::NotOpen)?;
        let mut state = device.get_state()?;
        state.set_baud_rate(baud_rate);
        device.set_state(&state)?;
        debug!("Set {} to {} baud", self.identifier, baud_rate);
        self.live_state = Some(state);
        Ok(())
    }

    pub fn try_get_baud(&mut self) -> Result<u32, PortError> {
        let device = self.handle.as_mut().ok_or(PortError::NotOpen)?;
        let state = device.get_state()?;
        let baud_rate = state.baud_rate();
        self.live_state = Some(state);
        Ok(baud_rate)
    }

    pub fn try_set_timeouts(&mut self, read_ms: u32, write_ms: u32) -> Result<(), PortError> {
        let device = self.handle.as_mut().ok_or(PortError::NotOpen)?;
        let timeouts = Timeouts::new(read_ms, write_ms);
        device.set_timeouts(&timeouts)?;
        self.timeouts = timeouts;
        Ok(())
    }

    /// One OS read. Unlike [`read_bytes`](SerialPortAdapter::read_bytes), a
    /// read that found nothing before the timeout is `Err(PortError::Timeout)`,
    /// distinct from an OS failure.
    pub fn try_read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let device = self.handle.as_mut().ok_or(PortError::NotOpen)?;
        if buffer.is_empty() {
            return Ok(0);
        }
        let waited = self.timeouts.read_timeout().unwrap_or(Duration::ZERO);
        match device.read(buffer) {
            Ok(0) => Err(PortError::timeout(waited)),
            Ok(n) => {
                trace!("Read {} bytes from {}", n, self.identifier);
                Ok(n)
            }
            Err(e) if e.is_timeout() => Err(PortError::timeout(waited)),
            Err(e) => Err(e),
        }
    }

    pub fn try_write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let device = self.handle.as_mut().ok_or(PortError::NotOpen)?;
        let n = device.write(data)?;
        trace!("Wrote {} of {} bytes to {}", n, data.len(), self.identifier);
        Ok(n)
    }

    fn report(&self, operation: &str, err: &PortError) {
        match err {
            PortError::NotOpen | PortError::AlreadyOpen => {
                trace!("{} on {} skipped: {}", operation, self.identifier, err)
            }
            e if e.is_timeout() => trace!("{} on {}: {}", operation, self.identifier, err),
            _ => warn!("{} on {} failed: {}", operation, self.identifier, err),
        }
    }
}

/// Read-modify-write of the control block.
fn push_config<D: Device>(
    device: &mut D,
    config: &PortConfiguration,
) -> Result<D::State, PortError> {
    let mut state = device.get_state()?;
    state.ensure_supported(config)?;
    state.apply(config);
    device.set_state(&state)?;
    Ok(state)
}

impl<O: DeviceOpener> SerialPortAdapter for SerialPort<O> {
    fn name(&self) -> &str {
        &self.identifier
    }

    fn open(&mut self) -> bool {
        match self.try_open() {
            Ok(()) => true,
            Err(e) => {
                self.report("open", &e);
                false
            }
        }
    }

    fn close(&mut self) {
        if let Some(device) = self.handle.take() {
            drop(device);
            self.live_state = None;
            debug!("Closed {}", self.identifier);
        }
    }

    fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn get_config(&mut self) -> Option<PortConfiguration> {
        self.try_get_config()
            .map_err(|e| self.report("get_config", &e))
            .ok()
    }

    fn set_config(&mut self, config: &PortConfiguration) {
        if let Err(e) = self.try_set_config(config) {
            self.report("set_config", &e);
        }
    }

    fn set_baud(&mut self, baud_rate: u32) {
        if let Err(e) = self.try_set_baud(baud_rate) {
            self.report("set_baud", &e);
        }
    }

    fn get_baud(&mut self) -> u32 {
        self.try_get_baud()
            .map_err(|e| self.report("get_baud", &e))
            .unwrap_or(0)
    }

    fn set_timeouts(&mut self, read_timeout_ms: u32, write_timeout_ms: u32) {
        if let Err(e) = self.try_set_timeouts(read_timeout_ms, write_timeout_ms) {
            self.report("set_timeouts", &e);
        }
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> usize {
        self.try_read_bytes(buffer)
            .map_err(|e| self.report("read", &e))
            .unwrap_or(0)
    }

    fn write_bytes(&mut self, data: &[u8]) -> usize {
        self.try_write_bytes(data)
            .map_err(|e| self.report("write", &e))
            .unwrap_or(0)
    }
}

impl<O: DeviceOpener> Drop for SerialPort<O> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<O: DeviceOpener> std::fmt::Debug for SerialPort<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("identifier", &self.identifier)
            .field("open", &self.handle.is_some())
            .field("timeouts", &self.timeouts)
            .field("live_state", &self.live_state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::configuration::{FlowControl, Parity, StopBits};
    use crate::port::mock::MockLine;

    fn open_port() -> (MockLine, SerialPort<MockLine>) {
        let line = MockLine::new("MOCK0");
        let mut port = SerialPort::with_opener("MOCK0", line.clone());
        assert!(port.open());
        (line, port)
    }

    #[test]
    fn test_open_applies_defaults() {
        let (line, port) = open_port();
        assert_eq!(line.control_state().to_configuration(), DEFAULT_PORT_CONFIGURATION);
        assert_eq!(line.timeouts(), DEFAULT_TIMEOUTS);
        assert!(port.cached_state().is_some());
    }

    #[test]
    fn test_try_open_twice() {
        let (_line, mut port) = open_port();
        assert!(matches!(port.try_open(), Err(PortError::AlreadyOpen)));
        assert!(port.is_open());
    }

    #[test]
    fn test_open_releases_device_when_defaults_fail() {
        let line = MockLine::new("MOCK0");
        line.set_fail_state_writes(true);
        let mut port = SerialPort::with_opener("MOCK0", line.clone());

        assert!(matches!(port.try_open(), Err(PortError::Io(_))));
        assert!(!port.is_open());
        assert!(!line.is_claimed());
        assert_eq!(line.counters().opens, 1);
        assert_eq!(line.counters().closes, 1);
    }

    #[test]
    fn test_open_failure_reported() {
        let line = MockLine::new("MOCK0");
        line.set_fail_open(true);
        let mut port = SerialPort::with_opener("MOCK0", line.clone());
        assert!(!port.open());
        assert_eq!(line.counters().opens, 0);

        let mut port = SerialPort::with_opener("MOCK9", line);
        assert!(matches!(port.try_open(), Err(PortError::NotFound(_))));
    }

    #[test]
    fn test_undefined_configuration_rejected() {
        let (line, mut port) = open_port();
        let before = line.control_state();
        let config = PortConfiguration {
            parity: Parity::Undefined,
            ..Default::default()
        };
        assert!(matches!(port.try_set_config(&config), Err(PortError::Config(_))));
        assert_eq!(line.control_state(), before);
    }

    #[test]
    fn test_config_round_trip_through_device() {
        let (_line, mut port) = open_port();
        let config = PortConfiguration {
            baud_rate: 38400,
            data_bits: 7,
            parity: Parity::Even,
            stop_bits: StopBits::Two,
            flow_control: FlowControl::XonXoff,
        };
        port.set_config(&config);
        assert_eq!(port.get_config(), Some(config));
    }

    #[test]
    fn test_read_timeout_is_reported() {
        let (_line, mut port) = open_port();
        port.set_timeouts(10, 10);
        let mut buffer = [0u8; 4];
        match port.try_read_bytes(&mut buffer) {
            Err(PortError::Timeout(waited)) => assert_eq!(waited, Duration::from_millis(10)),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_read_failure_is_not_a_timeout() {
        let (line, mut port) = open_port();
        line.set_fail_reads(true);
        let result = port.try_read_bytes(&mut [0u8; 4]);
        assert!(matches!(result, Err(PortError::Io(_))));
        assert_eq!(port.read_bytes(&mut [0u8; 4]), 0);
    }

    #[test]
    fn test_set_baud_failure_keeps_port_open() {
        let (line, mut port) = open_port();
        port.set_baud(0);
        assert!(port.is_open());
        assert_eq!(line.control_state().baud_rate, 9600);
        assert_eq!(port.get_baud(), 9600);
    }

    #[test]
    fn test_drop_closes() {
        let (line, port) = open_port();
        drop(port);
        assert!(!line.is_claimed());
        assert_eq!(line.counters().closes, 1);
    }
}
