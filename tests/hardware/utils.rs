//! Utility functions for hardware testing.

use serial_port_core::port::{PortConfiguration, SerialPort, SerialPortAdapter};
use std::env;

/// Test port configuration from environment.
pub struct TestPortConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub loopback_enabled: bool,
}

impl TestPortConfig {
    /// Get test configuration from environment variables.
    pub fn from_env() -> Option<Self> {
        let port_name = env::var("TEST_PORT").ok()?;
        let baud_rate = env::var("TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(9600);
        let loopback_enabled = env::var("TEST_LOOPBACK").ok().as_deref() == Some("1");

        Some(TestPortConfig {
            port_name,
            baud_rate,
            loopback_enabled,
        })
    }

    /// Line settings for the test device.
    pub fn to_port_config(&self) -> PortConfiguration {
        PortConfiguration::default().with_baud_rate(self.baud_rate)
    }

    /// Open the test device with its configured speed.
    pub fn open(&self) -> SerialPort {
        let mut port = SerialPort::new(self.port_name.as_str());
        if let Err(e) = port.try_open() {
            panic!("failed to open {}: {}", self.port_name, e);
        }
        port.set_config(&self.to_port_config());
        port
    }
}

/// Skip test if hardware is not available.
pub fn hardware_or_skip() -> Option<TestPortConfig> {
    let config = TestPortConfig::from_env();
    if config.is_none() {
        println!("Skipping hardware test: TEST_PORT not set");
    }
    config
}

/// Skip test unless the port is wired as a loopback.
pub fn loopback_or_skip() -> Option<TestPortConfig> {
    let config = hardware_or_skip()?;
    if !config.loopback_enabled {
        println!("Skipping loopback test: TEST_LOOPBACK not set");
        return None;
    }
    Some(config)
}
