//! POSIX `termios` control block.
//!
//! Flags are edited in place on the block the OS handed back, so anything the
//! abstract model does not cover (line discipline extras, unused control
//! characters) survives a configuration change.

use super::{ControlBlock, XOFF_CHAR, XON_CHAR};
use crate::port::configuration::{FlowControl, Parity, PortConfiguration, StopBits};
use crate::port::error::PortError;
use libc::{speed_t, tcflag_t};
use std::fmt;

#[cfg(any(target_os = "linux", target_os = "android"))]
const CMSPAR: tcflag_t = libc::CMSPAR;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const CMSPAR: tcflag_t = 0;

const SPEEDS: &[(u32, speed_t)] = &[
    (50, libc::B50),
    (75, libc::B75),
    (110, libc::B110),
    (134, libc::B134),
    (150, libc::B150),
    (200, libc::B200),
    (300, libc::B300),
    (600, libc::B600),
    (1200, libc::B1200),
    (1800, libc::B1800),
    (2400, libc::B2400),
    (4800, libc::B4800),
    (9600, libc::B9600),
    (19200, libc::B19200),
    (38400, libc::B38400),
    (57600, libc::B57600),
    (115200, libc::B115200),
    (230400, libc::B230400),
];

#[cfg(any(target_os = "linux", target_os = "android"))]
const EXTENDED_SPEEDS: &[(u32, speed_t)] = &[
    (460800, libc::B460800),
    (500000, libc::B500000),
    (576000, libc::B576000),
    (921600, libc::B921600),
    (1000000, libc::B1000000),
    (1152000, libc::B1152000),
    (1500000, libc::B1500000),
    (2000000, libc::B2000000),
    (2500000, libc::B2500000),
    (3000000, libc::B3000000),
    (3500000, libc::B3500000),
    (4000000, libc::B4000000),
];
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const EXTENDED_SPEEDS: &[(u32, speed_t)] = &[];

fn speed_for(baud_rate: u32) -> Option<speed_t> {
    SPEEDS
        .iter()
        .chain(EXTENDED_SPEEDS)
        .find(|(rate, _)| *rate == baud_rate)
        .map(|(_, speed)| *speed)
}

fn baud_for(speed: speed_t) -> u32 {
    SPEEDS
        .iter()
        .chain(EXTENDED_SPEEDS)
        .find(|(_, s)| *s == speed)
        .map(|(rate, _)| *rate)
        .unwrap_or(0)
}

/// A `libc::termios` together with the baud rate it should carry.
///
/// The speed lives outside the flag words because `speed_t` only encodes a
/// fixed table of rates; it is converted when the block is pushed.
#[derive(Clone, Copy)]
pub struct Termios {
    raw: libc::termios,
    baud_rate: u32,
}

impl Default for Termios {
    fn default() -> Self {
        // SAFETY: termios is a plain C struct of integers and byte arrays.
        let raw: libc::termios = unsafe { std::mem::zeroed() };
        Self { raw, baud_rate: 0 }
    }
}

impl Termios {
    /// Wrap a block read from the OS, decoding its output speed.
    pub fn from_raw(raw: libc::termios) -> Self {
        // SAFETY: cfgetospeed only reads from the struct it is given.
        let speed = unsafe { libc::cfgetospeed(&raw) };
        Self {
            raw,
            baud_rate: baud_for(speed),
        }
    }

    /// Produce the block to hand to `tcsetattr`.
    pub fn to_raw(&self) -> Result<libc::termios, PortError> {
        let speed = speed_for(self.baud_rate).ok_or_else(|| {
            PortError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("baud rate {} has no termios speed", self.baud_rate),
            ))
        })?;
        let mut raw = self.raw;
        // SAFETY: both calls only write the speed fields of `raw`.
        let input_rc = unsafe { libc::cfsetispeed(&mut raw, speed) };
        let output_rc = unsafe { libc::cfsetospeed(&mut raw, speed) };
        if input_rc != 0 || output_rc != 0 {
            return Err(PortError::Io(std::io::Error::last_os_error()));
        }
        Ok(raw)
    }

    pub fn input_flags(&self) -> tcflag_t {
        self.raw.c_iflag
    }

    pub fn output_flags(&self) -> tcflag_t {
        self.raw.c_oflag
    }

    pub fn control_flags(&self) -> tcflag_t {
        self.raw.c_cflag
    }

    pub fn local_flags(&self) -> tcflag_t {
        self.raw.c_lflag
    }

    pub fn control_char(&self, index: usize) -> u8 {
        self.raw.c_cc[index] as u8
    }

    fn data_bits(&self) -> u8 {
        match self.raw.c_cflag & libc::CSIZE {
            libc::CS5 => 5,
            libc::CS6 => 6,
            libc::CS7 => 7,
            _ => 8,
        }
    }
}

impl fmt::Debug for Termios {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Termios")
            .field("baud_rate", &self.baud_rate)
            .field("c_iflag", &format_args!("{:#x}", self.raw.c_iflag))
            .field("c_oflag", &format_args!("{:#x}", self.raw.c_oflag))
            .field("c_cflag", &format_args!("{:#x}", self.raw.c_cflag))
            .field("c_lflag", &format_args!("{:#x}", self.raw.c_lflag))
            .finish()
    }
}

impl ControlBlock for Termios {
    fn apply(&mut self, config: &PortConfiguration) {
        let t = &mut self.raw;
        self.baud_rate = config.baud_rate;

        // Raw byte stream: no line editing, translation, signals or error marking.
        t.c_iflag &= !(libc::IGNBRK
            | libc::BRKINT
            | libc::PARMRK
            | libc::ISTRIP
            | libc::INLCR
            | libc::IGNCR
            | libc::ICRNL
            | libc::IGNPAR);
        t.c_oflag &= !libc::OPOST;
        t.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
        t.c_cflag |= libc::CREAD | libc::CLOCAL;

        let size = match config.data_bits {
            5 => Some(libc::CS5),
            6 => Some(libc::CS6),
            7 => Some(libc::CS7),
            8 => Some(libc::CS8),
            _ => None,
        };
        if let Some(size) = size {
            t.c_cflag &= !libc::CSIZE;
            t.c_cflag |= size;
        }

        let parity_bits = match config.parity {
            Parity::None => Some(0),
            Parity::Odd => Some(libc::PARENB | libc::PARODD),
            Parity::Even => Some(libc::PARENB),
            Parity::Mark => Some(libc::PARENB | CMSPAR | libc::PARODD),
            Parity::Space => Some(libc::PARENB | CMSPAR),
            Parity::Undefined => None,
        };
        if let Some(bits) = parity_bits {
            t.c_cflag &= !(libc::PARENB | libc::PARODD | CMSPAR);
            t.c_cflag |= bits;
            if bits == 0 {
                t.c_iflag &= !libc::INPCK;
            } else {
                t.c_iflag |= libc::INPCK;
            }
        }

        match config.stop_bits {
            StopBits::One => t.c_cflag &= !libc::CSTOPB,
            StopBits::OneAndHalf | StopBits::Two => t.c_cflag |= libc::CSTOPB,
            StopBits::Undefined => {}
        }

        if config.flow_control != FlowControl::Undefined {
            t.c_cflag &= !libc::CRTSCTS;
            t.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
            match config.flow_control {
                FlowControl::RtsCts => t.c_cflag |= libc::CRTSCTS,
                FlowControl::XonXoff => t.c_iflag |= libc::IXON | libc::IXOFF,
                _ => {}
            }
        }

        t.c_cc[libc::VSTART] = XON_CHAR as libc::cc_t;
        t.c_cc[libc::VSTOP] = XOFF_CHAR as libc::cc_t;
        // Waiting is done with poll before each read.
        t.c_cc[libc::VMIN] = 0;
        t.c_cc[libc::VTIME] = 0;
    }

    fn to_configuration(&self) -> PortConfiguration {
        let cflag = self.raw.c_cflag;
        let iflag = self.raw.c_iflag;
        let data_bits = self.data_bits();

        let parity = if cflag & libc::PARENB == 0 {
            Parity::None
        } else if CMSPAR != 0 && cflag & CMSPAR != 0 {
            if cflag & libc::PARODD != 0 {
                Parity::Mark
            } else {
                Parity::Space
            }
        } else if cflag & libc::PARODD != 0 {
            Parity::Odd
        } else {
            Parity::Even
        };

        // With five data bits the UART sends one and a half stop bits for CSTOPB.
        let stop_bits = match (cflag & libc::CSTOPB != 0, data_bits) {
            (false, _) => StopBits::One,
            (true, 5) => StopBits::OneAndHalf,
            (true, _) => StopBits::Two,
        };

        let flow_control = match (
            cflag & libc::CRTSCTS != 0,
            iflag & libc::IXON != 0,
            iflag & libc::IXOFF != 0,
        ) {
            (false, false, false) => FlowControl::None,
            (false, true, true) => FlowControl::XonXoff,
            (true, false, false) => FlowControl::RtsCts,
            _ => FlowControl::Undefined,
        };

        PortConfiguration {
            baud_rate: self.baud_rate,
            data_bits,
            parity,
            stop_bits,
            flow_control,
        }
    }

    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn set_baud_rate(&mut self, baud_rate: u32) {
        self.baud_rate = baud_rate;
    }

    fn ensure_supported(&self, config: &PortConfiguration) -> Result<(), PortError> {
        config.validate()?;
        if config.flow_control == FlowControl::DsrDtr {
            return Err(PortError::config("DSR/DTR flow control has no termios encoding"));
        }
        if CMSPAR == 0 && matches!(config.parity, Parity::Mark | Parity::Space) {
            return Err(PortError::config(format!(
                "{:?} parity is not supported on this platform",
                config.parity
            )));
        }
        match (config.stop_bits, config.data_bits) {
            (StopBits::OneAndHalf, bits) if bits != 5 => Err(PortError::config(
                "one and a half stop bits require five data bits",
            )),
            (StopBits::Two, 5) => Err(PortError::config(
                "two stop bits are sent as one and a half with five data bits",
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(config: &PortConfiguration) -> Termios {
        let mut termios = Termios::default();
        termios.apply(config);
        termios
    }

    #[test]
    fn test_apply_enters_raw_mode() {
        let mut termios = Termios::default();
        termios.raw.c_lflag = libc::ICANON | libc::ECHO | libc::ISIG;
        termios.raw.c_iflag = libc::ICRNL | libc::IGNPAR;
        termios.raw.c_oflag = libc::OPOST;
        termios.apply(&PortConfiguration::default());

        assert_eq!(termios.local_flags() & (libc::ICANON | libc::ECHO | libc::ISIG), 0);
        assert_eq!(termios.input_flags() & (libc::ICRNL | libc::IGNPAR), 0);
        assert_eq!(termios.output_flags() & libc::OPOST, 0);
        assert_ne!(termios.control_flags() & libc::CREAD, 0);
        assert_eq!(termios.control_char(libc::VSTART), 0x11);
        assert_eq!(termios.control_char(libc::VSTOP), 0x13);
        assert_eq!(termios.control_char(libc::VMIN), 0);
    }

    #[test]
    fn test_unrelated_flags_survive() {
        let mut termios = Termios::default();
        termios.raw.c_cflag = libc::HUPCL;
        termios.apply(&PortConfiguration::default());
        assert_ne!(termios.control_flags() & libc::HUPCL, 0);
    }

    #[test]
    fn test_parity_check_follows_parity() {
        let termios = applied(&PortConfiguration {
            parity: Parity::Odd,
            ..Default::default()
        });
        assert_ne!(termios.input_flags() & libc::INPCK, 0);

        let mut termios = termios;
        termios.apply(&PortConfiguration::default());
        assert_eq!(termios.input_flags() & libc::INPCK, 0);
        assert_eq!(termios.control_flags() & libc::PARENB, 0);
    }

    #[test]
    fn test_disabled_parity_reads_none() {
        let mut termios = Termios::default();
        termios.raw.c_cflag = libc::PARODD | CMSPAR;
        assert_eq!(termios.to_configuration().parity, Parity::None);
    }

    #[test]
    fn test_flow_control_reads() {
        let mut termios = Termios::default();
        termios.raw.c_iflag = libc::IXON;
        assert_eq!(termios.to_configuration().flow_control, FlowControl::Undefined);

        termios.raw.c_iflag = libc::IXON | libc::IXOFF;
        termios.raw.c_cflag = libc::CRTSCTS;
        assert_eq!(termios.to_configuration().flow_control, FlowControl::Undefined);

        termios.raw.c_iflag = 0;
        assert_eq!(termios.to_configuration().flow_control, FlowControl::RtsCts);
    }

    #[test]
    fn test_dsr_dtr_unsupported() {
        let config = PortConfiguration {
            flow_control: FlowControl::DsrDtr,
            ..Default::default()
        };
        assert!(Termios::default().ensure_supported(&config).is_err());
    }

    #[test]
    fn test_stop_bits_depend_on_data_bits() {
        let half = PortConfiguration {
            data_bits: 5,
            stop_bits: StopBits::OneAndHalf,
            ..Default::default()
        };
        assert!(Termios::default().ensure_supported(&half).is_ok());
        assert_eq!(applied(&half).to_configuration(), half);

        let bad = PortConfiguration {
            data_bits: 8,
            stop_bits: StopBits::OneAndHalf,
            ..Default::default()
        };
        assert!(Termios::default().ensure_supported(&bad).is_err());
    }

    #[test]
    fn test_round_trip_supported_variants() {
        let mut parities = vec![Parity::None, Parity::Odd, Parity::Even];
        if CMSPAR != 0 {
            parities.extend([Parity::Mark, Parity::Space]);
        }
        let flows = [FlowControl::None, FlowControl::RtsCts, FlowControl::XonXoff];
        for parity in parities {
            for flow_control in flows {
                for (data_bits, stop_bits) in [(8, StopBits::One), (7, StopBits::Two)] {
                    let config = PortConfiguration {
                        baud_rate: 57600,
                        data_bits,
                        parity,
                        stop_bits,
                        flow_control,
                    };
                    assert!(Termios::default().ensure_supported(&config).is_ok());
                    assert_eq!(applied(&config).to_configuration(), config);
                }
            }
        }
    }

    #[test]
    fn test_speed_conversion() {
        let termios = applied(&PortConfiguration::default().with_baud_rate(115200));
        let raw = termios.to_raw().unwrap();
        assert_eq!(Termios::from_raw(raw).baud_rate(), 115200);

        let termios = applied(&PortConfiguration::default().with_baud_rate(12345));
        assert!(matches!(termios.to_raw(), Err(PortError::Io(_))));
    }
}
