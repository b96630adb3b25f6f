//! Lifecycle behaviour of `SerialPort` against the mock line.

mod common;

use common::{line_config, open_mock_port};
use pretty_assertions::assert_eq;
use serial_port_core::port::{
    FlowControl, MockLine, Parity, PortConfiguration, PortError, SerialPort, SerialPortAdapter,
    StopBits, DEFAULT_PORT_CONFIGURATION,
};

#[test]
fn test_new_port_is_closed() {
    let line = MockLine::new("MOCK0");
    let mut port = SerialPort::with_opener("MOCK0", line.clone());

    assert!(!port.is_open());
    assert_eq!(port.name(), "MOCK0");
    assert_eq!(port.get_config(), None);
    assert_eq!(port.get_baud(), 0);
    assert_eq!(line.counters().opens, 0);
}

#[test]
fn test_second_open_fails_without_touching_device() {
    let (line, mut port) = open_mock_port("MOCK0");
    let before = line.counters();

    assert!(!port.open());
    assert!(port.is_open());
    assert_eq!(line.counters(), before);
}

#[test]
fn test_close_is_idempotent() {
    let (line, mut port) = open_mock_port("MOCK0");

    port.close();
    port.close();

    assert!(!port.is_open());
    assert!(!line.is_claimed());
    assert_eq!(line.counters().closes, 1);
}

#[test]
fn test_reopen_after_close_reapplies_defaults() {
    let (line, mut port) = open_mock_port("MOCK0");
    port.set_config(&line_config(
        57600,
        7,
        Parity::Odd,
        StopBits::Two,
        FlowControl::RtsCts,
    ));
    port.close();

    assert!(port.open());
    assert_eq!(port.get_config(), Some(DEFAULT_PORT_CONFIGURATION));
    assert_eq!(line.counters().opens, 2);
}

#[test]
fn test_closed_port_makes_no_os_calls() {
    let (line, mut port) = open_mock_port("MOCK0");
    port.close();
    let before = line.counters();

    let mut buffer = [0u8; 8];
    assert_eq!(port.write_bytes(b"ping"), 0);
    assert_eq!(port.read_bytes(&mut buffer), 0);
    assert_eq!(port.read_bytes_consecutive(&mut buffer, 1, 10), 0);
    port.set_config(&PortConfiguration::default());
    port.set_baud(19200);
    port.set_timeouts(5, 5);
    assert_eq!(port.get_config(), None);

    assert_eq!(line.counters(), before);
    assert!(line.write_log().is_empty());
    assert!(matches!(port.try_write_bytes(b"x"), Err(PortError::NotOpen)));
}

#[test]
fn test_set_baud_keeps_framing() {
    let (line, mut port) = open_mock_port("MOCK0");
    let framing = line_config(9600, 7, Parity::Even, StopBits::Two, FlowControl::XonXoff);
    port.set_config(&framing);

    port.set_baud(115200);

    assert_eq!(port.get_baud(), 115200);
    assert_eq!(port.get_config(), Some(framing.with_baud_rate(115200)));
    assert_eq!(line.control_state().baud_rate, 115200);
}

#[test]
fn test_every_get_reads_the_device() {
    let (line, mut port) = open_mock_port("MOCK0");
    let before = line.counters().state_reads;

    port.get_baud();
    port.get_config();

    assert_eq!(line.counters().state_reads, before + 2);
}

#[test]
fn test_external_state_change_is_visible() {
    let (line, mut port) = open_mock_port("MOCK0");
    let mut control = line.control_state();
    control.baud_rate = 4800;
    line.set_control_state(control);

    assert_eq!(port.get_baud(), 4800);
}

#[test]
fn test_mixed_handshake_reads_undefined() {
    let (line, mut port) = open_mock_port("MOCK0");
    let mut control = line.control_state();
    control.outx_cts_flow = true;
    control.out_x = true;
    line.set_control_state(control);

    let config = port.get_config().unwrap();
    assert_eq!(config.flow_control, FlowControl::Undefined);

    // Writing back what was read is refused as is.
    assert!(matches!(port.try_set_config(&config), Err(PortError::Config(_))));
}

#[test]
fn test_write_reports_short_writes() {
    let (line, mut port) = open_mock_port("MOCK0");
    line.set_write_limit(Some(4));

    assert_eq!(port.write_bytes(b"ABCDEFGH"), 4);
    assert_eq!(line.write_log(), vec![b"ABCD".to_vec()]);
}

#[test]
fn test_write_failure_returns_zero() {
    let (line, mut port) = open_mock_port("MOCK0");
    line.set_fail_writes(true);

    assert_eq!(port.write_bytes(b"data"), 0);
    assert!(port.is_open());
}

#[test]
fn test_device_held_elsewhere() {
    let line = MockLine::new("MOCK0");
    let mut first = SerialPort::with_opener("MOCK0", line.clone());
    let mut second = SerialPort::with_opener("MOCK0", line.clone());

    assert!(first.open());
    assert!(!second.open());

    drop(first);
    assert!(second.open());
}

#[test]
fn test_timeouts_reach_device() {
    let (line, mut port) = open_mock_port("MOCK0");
    port.set_timeouts(25, 0);

    assert_eq!(line.timeouts().read_ms, 25);
    assert_eq!(line.timeouts().write_ms, 0);
    assert_eq!(port.timeouts(), line.timeouts());
}
