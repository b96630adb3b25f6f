//! Simulated serial line for testing.
//!
//! A [`MockLine`] stands in for the OS: it is the [`DeviceOpener`] handed to a
//! [`SerialPort`](super::SerialPort), and every [`MockDevice`] it opens shares
//! its state. Tests script incoming data with delays, inspect what was
//! written, count OS calls and inject failures, all from the `MockLine`
//! handle they kept.

use super::configuration::Timeouts;
use super::control::Dcb;
use super::device::{Device, DeviceOpener};
use super::error::PortError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of OS-level calls the line has seen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MockCounters {
    pub opens: usize,
    pub closes: usize,
    pub reads: usize,
    pub writes: usize,
    pub state_reads: usize,
    pub state_writes: usize,
    pub timeout_writes: usize,
}

#[derive(Debug)]
struct Delivery {
    at: Instant,
    bytes: VecDeque<u8>,
}

#[derive(Debug, Default)]
struct LineState {
    /// Pending deliveries, ordered by release time.
    deliveries: VecDeque<Delivery>,
    write_log: Vec<Vec<u8>>,
    control: Dcb,
    timeouts: Timeouts,
    claimed: bool,
    fail_open: bool,
    fail_reads: bool,
    fail_writes: bool,
    fail_state_writes: bool,
    write_limit: Option<usize>,
    counters: MockCounters,
}

impl LineState {
    fn take_ready(&mut self, buffer: &mut [u8], now: Instant) -> usize {
        let mut filled = 0;
        while filled < buffer.len() {
            let Some(front) = self.deliveries.front_mut() else {
                break;
            };
            if front.at > now {
                break;
            }
            while filled < buffer.len() {
                match front.bytes.pop_front() {
                    Some(byte) => {
                        buffer[filled] = byte;
                        filled += 1;
                    }
                    None => break,
                }
            }
            if front.bytes.is_empty() {
                self.deliveries.pop_front();
            }
        }
        filled
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<LineState>,
    data_ready: Condvar,
}

/// A scripted serial line that answers to one device identifier.
///
/// # Example
/// ```
/// use serial_port_core::port::{MockLine, SerialPort, SerialPortAdapter};
/// use std::time::Duration;
///
/// let line = MockLine::new("MOCK0");
/// line.enqueue_read(b"Hello");
/// line.schedule_read(Duration::from_millis(5), b", World!");
///
/// let mut port = SerialPort::with_opener("MOCK0", line.clone());
/// assert!(port.open());
/// port.set_timeouts(50, 50);
///
/// let mut buffer = [0u8; 13];
/// let n = port.read_bytes_consecutive(&mut buffer, 10, 100);
/// assert_eq!(&buffer[..n], b"Hello, World!");
///
/// assert_eq!(port.write_bytes(b"ACK"), 3);
/// assert_eq!(line.write_log(), vec![b"ACK".to_vec()]);
/// ```
#[derive(Debug, Clone)]
pub struct MockLine {
    identifier: String,
    shared: Arc<Shared>,
}

impl MockLine {
    /// Create a line reachable under `identifier`.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            shared: Arc::default(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Make bytes available to the next read right away.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.schedule_read(Duration::ZERO, data);
    }

    /// Make bytes available once `delay` has passed from now.
    pub fn schedule_read(&self, delay: Duration, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let at = Instant::now() + delay;
        let mut state = self.shared.state.lock();
        let index = state
            .deliveries
            .iter()
            .position(|d| d.at > at)
            .unwrap_or(state.deliveries.len());
        state.deliveries.insert(
            index,
            Delivery {
                at,
                bytes: data.iter().copied().collect(),
            },
        );
        drop(state);
        self.shared.data_ready.notify_all();
    }

    /// Schedule `chunks` one after another, `gap` apart, the first one now.
    pub fn schedule_burst(&self, chunks: &[&[u8]], gap: Duration) {
        for (i, chunk) in chunks.iter().enumerate() {
            self.schedule_read(gap * i as u32, chunk);
        }
    }

    /// Bytes scheduled but not yet read, released or not.
    pub fn pending_bytes(&self) -> usize {
        let state = self.shared.state.lock();
        state.deliveries.iter().map(|d| d.bytes.len()).sum()
    }

    /// Every accepted write, in order.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.shared.state.lock().write_log.clone()
    }

    pub fn clear_write_log(&self) {
        self.shared.state.lock().write_log.clear();
    }

    pub fn counters(&self) -> MockCounters {
        self.shared.state.lock().counters
    }

    /// The control block as the simulated driver holds it.
    pub fn control_state(&self) -> Dcb {
        self.shared.state.lock().control
    }

    /// Overwrite the driver's control block, e.g. to simulate a power-on state.
    pub fn set_control_state(&self, control: Dcb) {
        self.shared.state.lock().control = control;
    }

    /// The timeouts last pushed by a device.
    pub fn timeouts(&self) -> Timeouts {
        self.shared.state.lock().timeouts
    }

    /// Whether a device currently holds the line.
    pub fn is_claimed(&self) -> bool {
        self.shared.state.lock().claimed
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.shared.state.lock().fail_open = fail;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.shared.state.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.state.lock().fail_writes = fail;
    }

    /// Make the driver refuse every control-block write.
    pub fn set_fail_state_writes(&self, fail: bool) {
        self.shared.state.lock().fail_state_writes = fail;
    }

    /// Accept at most `limit` bytes per write.
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.shared.state.lock().write_limit = limit;
    }
}

impl DeviceOpener for MockLine {
    type Device = MockDevice;

    fn open(&self, identifier: &str) -> Result<MockDevice, PortError> {
        let mut state = self.shared.state.lock();
        if identifier != self.identifier {
            return Err(PortError::not_found(identifier));
        }
        if state.fail_open {
            return Err(PortError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "simulated open failure",
            )));
        }
        if state.claimed {
            return Err(PortError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "device is claimed by another handle",
            )));
        }
        state.claimed = true;
        state.counters.opens += 1;

        Ok(MockDevice {
            shared: Arc::clone(&self.shared),
        })
    }
}

/// An open handle on a [`MockLine`]. Dropping it releases the line.
#[derive(Debug)]
pub struct MockDevice {
    shared: Arc<Shared>,
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.claimed = false;
        state.counters.closes += 1;
    }
}

impl Device for MockDevice {
    type State = Dcb;

    fn get_state(&mut self) -> Result<Dcb, PortError> {
        let mut state = self.shared.state.lock();
        state.counters.state_reads += 1;
        Ok(state.control)
    }

    fn set_state(&mut self, control: &Dcb) -> Result<(), PortError> {
        let mut state = self.shared.state.lock();
        state.counters.state_writes += 1;
        if state.fail_state_writes {
            return Err(PortError::Io(io::Error::new(
                io::ErrorKind::Other,
                "simulated control block failure",
            )));
        }
        if control.baud_rate == 0 {
            return Err(PortError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "driver rejected baud rate 0",
            )));
        }
        state.control = *control;
        Ok(())
    }

    fn set_timeouts(&mut self, timeouts: &Timeouts) -> Result<(), PortError> {
        let mut state = self.shared.state.lock();
        state.counters.timeout_writes += 1;
        state.timeouts = *timeouts;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.shared.state.lock();
        state.counters.reads += 1;
        if state.fail_reads {
            return Err(PortError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated read failure",
            )));
        }
        if buffer.is_empty() {
            return Ok(0);
        }

        let read_timeout = state.timeouts.read_timeout();
        let deadline = read_timeout.map(|t| Instant::now() + t);
        loop {
            let now = Instant::now();
            let n = state.take_ready(buffer, now);
            if n > 0 {
                return Ok(n);
            }
            if let (Some(deadline), Some(timeout)) = (deadline, read_timeout) {
                if now >= deadline {
                    return Err(PortError::timeout(timeout));
                }
            }

            let next_release = state.deliveries.front().map(|d| d.at);
            let wake = match (next_release, deadline) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            match wake {
                Some(at) => {
                    self.shared.data_ready.wait_until(&mut state, at);
                }
                None => self.shared.data_ready.wait(&mut state),
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.shared.state.lock();
        state.counters.writes += 1;
        if state.fail_writes {
            return Err(PortError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated write failure",
            )));
        }
        let accepted = state.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
        state.write_log.push(data[..accepted].to_vec());
        Ok(accepted)
    }
}
