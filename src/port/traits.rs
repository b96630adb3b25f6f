//! The capability interface every serial port exposes.
//!
//! Failures are encoded in return values (`false`, `0`, `None`) instead of
//! being raised: serial hardware disconnects and glitches routinely, and a
//! caller polling a device should not have to unwind for it. Code that needs
//! to know *why* something failed uses the `try_*` methods on
//! [`SerialPort`](super::SerialPort).

use super::configuration::PortConfiguration;
use std::thread;
use std::time::{Duration, Instant};

/// Operations of an owned serial device handle.
pub trait SerialPortAdapter {
    /// The OS identifier the port was created for.
    fn name(&self) -> &str;

    /// Acquire the device and apply the default configuration.
    ///
    /// Returns `false` if the port is already open (nothing is changed) or the
    /// OS refused the device.
    fn open(&mut self) -> bool;

    /// Release the device. Does nothing when the port is not open.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Read the live configuration; `None` when closed or unreadable.
    fn get_config(&mut self) -> Option<PortConfiguration>;

    /// Apply a configuration. Silently ignored when the port is not open.
    fn set_config(&mut self, config: &PortConfiguration);

    /// Change only the speed, leaving framing untouched.
    fn set_baud(&mut self, baud_rate: u32);

    /// Current speed, `0` when closed.
    fn get_baud(&mut self) -> u32;

    /// Configure waiting: `read_timeout_ms == 0` waits for the first byte,
    /// anything else bounds one read; `write_timeout_ms == 0` disables the
    /// write deadline.
    fn set_timeouts(&mut self, read_timeout_ms: u32, write_timeout_ms: u32);

    /// One OS read into `buffer`. `0` on timeout, failure or a closed port.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> usize;

    /// One OS write. `0` on failure or a closed port; may be short.
    fn write_bytes(&mut self, data: &[u8]) -> usize;

    /// Collect a burst that the device delivers as several short writes.
    ///
    /// Polls [`read_bytes`](Self::read_bytes) until the first data arrives,
    /// giving up with `0` once more than `reception_wait_timeout_ms` have
    /// passed since the call. Then sleeps `consecutive_delay_ms` between
    /// reads of the remaining capacity until the buffer is full or a read
    /// comes back empty, and returns the total.
    ///
    /// This is a heuristic: a short return may just be a short message.
    fn read_bytes_consecutive(
        &mut self,
        buffer: &mut [u8],
        consecutive_delay_ms: u32,
        reception_wait_timeout_ms: u32,
    ) -> usize {
        if buffer.is_empty() || !self.is_open() {
            return 0;
        }

        let wait_start = Instant::now();
        let reception_wait = Duration::from_millis(u64::from(reception_wait_timeout_ms));
        let mut received = loop {
            let n = self.read_bytes(buffer);
            if n > 0 {
                break n;
            }
            if wait_start.elapsed() > reception_wait || !self.is_open() {
                return 0;
            }
        };

        let delay = Duration::from_millis(u64::from(consecutive_delay_ms));
        while received < buffer.len() {
            thread::sleep(delay);
            let n = self.read_bytes(&mut buffer[received..]);
            if n == 0 {
                break;
            }
            received += n;
        }
        received
    }
}
