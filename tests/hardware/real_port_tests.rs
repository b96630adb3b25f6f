//! Tests requiring actual serial hardware.
//!
//! These tests are skipped if no hardware is available.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export TEST_PORT=COM3                  # or /dev/ttyUSB0 on Linux
//! export TEST_BAUD=9600                  # optional, default: 9600
//! export TEST_LOOPBACK=1                 # if port has TX-RX loopback
//!
//! cargo test --test integration_hardware -- --ignored
//! ```

use super::utils::{hardware_or_skip, loopback_or_skip};
use crate::common::assert_elapsed_within;
use serial_port_core::port::{
    FlowControl, Parity, PortConfiguration, PortError, SerialPort, SerialPortAdapter, StopBits,
};
use std::time::{Duration, Instant};

#[test]
#[ignore] // Run with --ignored flag
fn test_real_port_open_close() {
    let Some(test) = hardware_or_skip() else {
        return;
    };

    let mut port = SerialPort::new(test.port_name.as_str());
    assert!(port.open(), "failed to open {}", test.port_name);
    assert!(!port.open(), "second open must fail");
    port.close();
    port.close();
    assert!(!port.is_open());

    // The device must be free again.
    assert!(port.open());
}

#[test]
#[ignore]
fn test_real_port_defaults_after_open() {
    let Some(test) = hardware_or_skip() else {
        return;
    };

    let mut port = SerialPort::new(test.port_name.as_str());
    assert!(port.open());
    assert_eq!(port.get_config(), Some(PortConfiguration::default()));
}

#[test]
#[ignore]
fn test_real_port_configuration_round_trip() {
    let Some(test) = hardware_or_skip() else {
        return;
    };
    let mut port = test.open();

    let configs = [
        PortConfiguration::default().with_baud_rate(test.baud_rate),
        PortConfiguration {
            baud_rate: 19200,
            data_bits: 7,
            parity: Parity::Even,
            stop_bits: StopBits::Two,
            flow_control: FlowControl::XonXoff,
        },
        PortConfiguration {
            baud_rate: 115200,
            data_bits: 8,
            parity: Parity::Odd,
            stop_bits: StopBits::One,
            flow_control: FlowControl::RtsCts,
        },
    ];
    for config in configs {
        port.try_set_config(&config)
            .unwrap_or_else(|e| panic!("{} rejected: {}", config, e));
        assert_eq!(port.get_config(), Some(config));
    }

    port.set_baud(test.baud_rate);
    assert_eq!(port.get_baud(), test.baud_rate);
}

#[test]
#[ignore]
fn test_real_port_read_timeout() {
    let Some(test) = hardware_or_skip() else {
        return;
    };
    if test.loopback_enabled {
        println!("Skipping: a loopback port may echo stray bytes");
        return;
    }
    let mut port = test.open();
    port.set_timeouts(100, 100);

    let started = Instant::now();
    let mut buffer = [0u8; 16];
    match port.try_read_bytes(&mut buffer) {
        Err(PortError::Timeout(_)) => assert_elapsed_within(
            started.elapsed(),
            Duration::from_millis(90),
            Duration::from_millis(100),
        ),
        Ok(n) => println!("Device sent {} unsolicited bytes", n),
        Err(e) => panic!("read failed: {}", e),
    }
}

#[test]
#[ignore]
fn test_real_port_loopback_burst() {
    let Some(test) = loopback_or_skip() else {
        return;
    };
    let mut port = test.open();
    port.set_timeouts(50, 500);

    let message = b"The quick brown fox jumps over the lazy dog\r\n";
    assert_eq!(port.write_bytes(message), message.len());

    let mut buffer = [0u8; 128];
    let n = port.read_bytes_consecutive(&mut buffer, 10, 1000);
    assert_eq!(&buffer[..n], &message[..]);
}
