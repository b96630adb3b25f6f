//! Shared test utilities for the serial port integration tests.
//!
//! This module provides common test infrastructure including:
//! - Opened ports on a scripted mock line
//! - Timing assertions with tolerance for slow CI machines
//! - Configuration builders

#![allow(dead_code)]

use serial_port_core::port::{
    FlowControl, MockLine, Parity, PortConfiguration, SerialPort, SerialPortAdapter, StopBits,
};
use std::time::Duration;

/// Slack granted on upper timing bounds.
pub const TIMING_SLACK: Duration = Duration::from_millis(250);

/// Create a mock line and a port on it that is already open.
///
/// # Example
/// ```ignore
/// let (line, mut port) = open_mock_port("MOCK0");
/// line.enqueue_read(b"OK\r\n");
/// ```
pub fn open_mock_port(identifier: &str) -> (MockLine, SerialPort<MockLine>) {
    let line = MockLine::new(identifier);
    let mut port = SerialPort::with_opener(identifier, line.clone());
    assert!(port.open(), "mock port {} failed to open", identifier);
    (line, port)
}

/// Create an open mock port with pre-programmed responses, all available at once.
pub fn open_mock_port_with_responses(
    identifier: &str,
    responses: &[&[u8]],
) -> (MockLine, SerialPort<MockLine>) {
    let (line, port) = open_mock_port(identifier);
    for response in responses {
        line.enqueue_read(response);
    }
    (line, port)
}

/// Build a configuration without writing out every field.
pub fn line_config(
    baud_rate: u32,
    data_bits: u8,
    parity: Parity,
    stop_bits: StopBits,
    flow_control: FlowControl,
) -> PortConfiguration {
    PortConfiguration {
        baud_rate,
        data_bits,
        parity,
        stop_bits,
        flow_control,
    }
}

/// Assert `elapsed` is at least `min` and not wildly above `max`.
pub fn assert_elapsed_within(elapsed: Duration, min: Duration, max: Duration) {
    assert!(
        elapsed >= min,
        "returned after {:?}, expected at least {:?}",
        elapsed,
        min
    );
    assert!(
        elapsed <= max + TIMING_SLACK,
        "returned after {:?}, expected at most {:?}",
        elapsed,
        max
    );
}
