//! OS-independent description of a serial line.
//!
//! A [`PortConfiguration`] says what the caller wants on the wire; the
//! [`control`](super::control) module turns it into whatever the host keeps in
//! its control block. [`Timeouts`] live next to it but are pushed separately.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Configuration applied to every freshly opened port: 9600 baud, 8N1, no
/// flow control.
pub const DEFAULT_PORT_CONFIGURATION: PortConfiguration = PortConfiguration {
    baud_rate: 9600,
    data_bits: 8,
    parity: Parity::None,
    stop_bits: StopBits::One,
    flow_control: FlowControl::None,
};

/// Timeouts applied to every freshly opened port.
pub const DEFAULT_TIMEOUTS: Timeouts = Timeouts {
    read_ms: 1000,
    write_ms: 1000,
};

/// Electrical and framing parameters of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second). Passed through to the OS unchecked.
    pub baud_rate: u32,

    /// Number of data bits per character, normally 5 to 8.
    pub data_bits: u8,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Flow control mode.
    pub flow_control: FlowControl,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        DEFAULT_PORT_CONFIGURATION
    }
}

impl PortConfiguration {
    /// Copy of this configuration with a different baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Whether any field holds a read-only `Undefined` sentinel.
    pub fn has_undefined(&self) -> bool {
        self.parity == Parity::Undefined
            || self.stop_bits == StopBits::Undefined
            || self.flow_control == FlowControl::Undefined
    }

    /// Check that this configuration may be written to a device.
    ///
    /// `Undefined` only ever comes back from a device; writing it would leave
    /// the line in a state nobody asked for.
    pub fn validate(&self) -> Result<(), PortError> {
        if self.parity == Parity::Undefined {
            return Err(PortError::config("parity is undefined"));
        }
        if self.stop_bits == StopBits::Undefined {
            return Err(PortError::config("stop bits are undefined"));
        }
        if self.flow_control == FlowControl::Undefined {
            return Err(PortError::config("flow control is undefined"));
        }
        if !(5..=8).contains(&self.data_bits) {
            return Err(PortError::config(format!(
                "unsupported number of data bits: {}",
                self.data_bits
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PortConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
            Parity::Mark => 'M',
            Parity::Space => 'S',
            Parity::Undefined => '?',
        };
        let stop_bits = match self.stop_bits {
            StopBits::One => "1",
            StopBits::OneAndHalf => "1.5",
            StopBits::Two => "2",
            StopBits::Undefined => "?",
        };
        write!(
            f,
            "{} {}{}{} flow={}",
            self.baud_rate, self.data_bits, parity, stop_bits, self.flow_control
        )
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
    Mark,
    Space,
    /// Read-only: the device state did not map onto any variant above.
    Undefined,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    #[serde(rename = "one-and-half")]
    OneAndHalf,
    Two,
    /// Read-only: the device state did not map onto any variant above.
    Undefined,
}

/// Flow control modes. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowControl {
    None,
    RtsCts,
    DsrDtr,
    XonXoff,
    /// Read-only: the device has a combination of handshake flags that is
    /// not one of the variants above.
    Undefined,
}

impl fmt::Display for FlowControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::RtsCts => "rts-cts",
            Self::DsrDtr => "dsr-dtr",
            Self::XonXoff => "xon-xoff",
            Self::Undefined => "undefined",
        })
    }
}

impl FromStr for Parity {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "n" => Ok(Self::None),
            "odd" | "o" => Ok(Self::Odd),
            "even" | "e" => Ok(Self::Even),
            "mark" | "m" => Ok(Self::Mark),
            "space" | "s" => Ok(Self::Space),
            other => Err(PortError::config(format!("unknown parity '{other}'"))),
        }
    }
}

impl FromStr for StopBits {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "one" => Ok(Self::One),
            "1.5" | "one-and-half" => Ok(Self::OneAndHalf),
            "2" | "two" => Ok(Self::Two),
            other => Err(PortError::config(format!("unknown stop bits '{other}'"))),
        }
    }
}

impl FromStr for FlowControl {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "rts-cts" | "rtscts" | "hardware" => Ok(Self::RtsCts),
            "dsr-dtr" | "dsrdtr" => Ok(Self::DsrDtr),
            "xon-xoff" | "xonxoff" | "software" => Ok(Self::XonXoff),
            other => Err(PortError::config(format!("unknown flow control '{other}'"))),
        }
    }
}

/// Read and write wait behaviour of a port, in milliseconds.
///
/// A read timeout of zero waits for the first byte without limit; any other
/// value bounds a single read. Neither has an inter-byte component: a read
/// returns as soon as anything is available. A write timeout of zero means
/// no write deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    pub read_ms: u32,
    pub write_ms: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        DEFAULT_TIMEOUTS
    }
}

impl Timeouts {
    pub fn new(read_ms: u32, write_ms: u32) -> Self {
        Self { read_ms, write_ms }
    }

    /// Upper bound for one read, `None` when reads wait indefinitely.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_ms != 0).then(|| Duration::from_millis(u64::from(self.read_ms)))
    }

    /// Upper bound for one write, `None` when writes have no deadline.
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_ms != 0).then(|| Duration::from_millis(u64::from(self.write_ms)))
    }
}
