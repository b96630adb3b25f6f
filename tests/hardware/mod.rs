//! Hardware-specific tests requiring real serial devices.
//!
//! These tests are ignored by default and require actual hardware to run.
//! They should be run manually with the `--ignored` flag and appropriate
//! environment variables set:
//!
//! - `TEST_PORT`: device identifier (`COM3`, `/dev/ttyUSB0`)
//! - `TEST_BAUD`: baud rate, default 9600
//! - `TEST_LOOPBACK=1`: TX is wired to RX

pub mod real_port_tests;
pub mod utils;
