//! Portable mirror of the Win32 `DCB` device control block.
//!
//! The Windows backend copies between this struct and the real `DCB`; keeping
//! the translation on plain data means it is exercised on every platform.

use super::{ControlBlock, XOFF_CHAR, XON_CHAR};
use crate::port::configuration::{FlowControl, Parity, PortConfiguration, StopBits};

pub const NOPARITY: u8 = 0;
pub const ODDPARITY: u8 = 1;
pub const EVENPARITY: u8 = 2;
pub const MARKPARITY: u8 = 3;
pub const SPACEPARITY: u8 = 4;

pub const ONESTOPBIT: u8 = 0;
pub const ONE5STOPBITS: u8 = 1;
pub const TWOSTOPBITS: u8 = 2;

pub const DTR_CONTROL_DISABLE: u8 = 0;
pub const DTR_CONTROL_HANDSHAKE: u8 = 2;

pub const RTS_CONTROL_ENABLE: u8 = 1;
pub const RTS_CONTROL_HANDSHAKE: u8 = 2;

/// Receive-buffer fill level at which XON is sent again.
pub const XON_LIMIT: u16 = 2048;
/// Free receive-buffer space at which XOFF is sent.
pub const XOFF_LIMIT: u16 = 512;

/// Field-for-field copy of `DCB`, bitfields unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dcb {
    pub baud_rate: u32,
    pub binary: bool,
    pub parity_check: bool,
    pub outx_cts_flow: bool,
    pub outx_dsr_flow: bool,
    pub dtr_control: u8,
    pub dsr_sensitivity: bool,
    pub tx_continue_on_xoff: bool,
    pub out_x: bool,
    pub in_x: bool,
    pub error_char_replace: bool,
    pub null_discard: bool,
    pub rts_control: u8,
    pub abort_on_error: bool,
    pub xon_lim: u16,
    pub xoff_lim: u16,
    pub byte_size: u8,
    pub parity: u8,
    pub stop_bits: u8,
    pub xon_char: u8,
    pub xoff_char: u8,
    pub error_char: u8,
    pub eof_char: u8,
    pub evt_char: u8,
}

impl ControlBlock for Dcb {
    fn apply(&mut self, config: &PortConfiguration) {
        let flow = config.flow_control;

        self.baud_rate = config.baud_rate;
        self.byte_size = config.data_bits;

        // Win32 only supports binary transfers; the error-processing knobs
        // would rewrite or drop received bytes.
        self.binary = true;
        self.error_char_replace = false;
        self.null_discard = false;
        self.abort_on_error = false;

        if flow != FlowControl::Undefined {
            self.outx_cts_flow = flow == FlowControl::RtsCts;
            self.rts_control = if flow == FlowControl::RtsCts {
                RTS_CONTROL_HANDSHAKE
            } else {
                RTS_CONTROL_ENABLE
            };
            self.outx_dsr_flow = flow == FlowControl::DsrDtr;
            self.dsr_sensitivity = flow == FlowControl::DsrDtr;
            self.dtr_control = if flow == FlowControl::DsrDtr {
                DTR_CONTROL_HANDSHAKE
            } else {
                DTR_CONTROL_DISABLE
            };
            self.out_x = flow == FlowControl::XonXoff;
            self.in_x = flow == FlowControl::XonXoff;
            self.tx_continue_on_xoff = flow == FlowControl::None;
        }

        let scheme = match config.parity {
            Parity::None => Some(NOPARITY),
            Parity::Odd => Some(ODDPARITY),
            Parity::Even => Some(EVENPARITY),
            Parity::Mark => Some(MARKPARITY),
            Parity::Space => Some(SPACEPARITY),
            Parity::Undefined => None,
        };
        if let Some(scheme) = scheme {
            self.parity_check = scheme != NOPARITY;
            self.parity = scheme;
        }

        match config.stop_bits {
            StopBits::One => self.stop_bits = ONESTOPBIT,
            StopBits::OneAndHalf => self.stop_bits = ONE5STOPBITS,
            StopBits::Two => self.stop_bits = TWOSTOPBITS,
            StopBits::Undefined => {}
        }

        self.xon_lim = XON_LIMIT;
        self.xoff_lim = XOFF_LIMIT;
        self.xon_char = XON_CHAR;
        self.xoff_char = XOFF_CHAR;
        self.error_char = 0;
        self.eof_char = 0;
        self.evt_char = 0;
    }

    fn to_configuration(&self) -> PortConfiguration {
        let parity = if !self.parity_check {
            Parity::None
        } else {
            match self.parity {
                NOPARITY => Parity::None,
                ODDPARITY => Parity::Odd,
                EVENPARITY => Parity::Even,
                MARKPARITY => Parity::Mark,
                SPACEPARITY => Parity::Space,
                _ => Parity::Undefined,
            }
        };

        let stop_bits = match self.stop_bits {
            ONESTOPBIT => StopBits::One,
            ONE5STOPBITS => StopBits::OneAndHalf,
            TWOSTOPBITS => StopBits::Two,
            _ => StopBits::Undefined,
        };

        let flow_control = match (self.outx_cts_flow, self.outx_dsr_flow, self.out_x, self.in_x) {
            (false, false, false, false) => FlowControl::None,
            (false, false, true, true) => FlowControl::XonXoff,
            (true, false, false, false) => FlowControl::RtsCts,
            (false, true, false, false) => FlowControl::DsrDtr,
            _ => FlowControl::Undefined,
        };

        PortConfiguration {
            baud_rate: self.baud_rate,
            data_bits: self.byte_size,
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
}
