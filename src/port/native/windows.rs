use crate::port::configuration::{Timeouts, DEFAULT_PORT_CONFIGURATION};
use crate::port::control::Dcb;
use crate::port::device::{Device, DeviceOpener};
use crate::port::error::PortError;
use serialport::{COMPort, SerialPort as _};
use std::io::{Read, Write};
use std::os::windows::io::AsRawHandle;
use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::um::commapi::{GetCommState, SetCommState, SetCommTimeouts};
use winapi::um::winbase::{COMMTIMEOUTS, DCB};
use winapi::um::winnt::{CHAR, HANDLE, MAXDWORD};

/// Opens COM ports through `serialport`. Share mode 0 makes the handle exclusive.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeOpener;

impl DeviceOpener for NativeOpener {
    type Device = NativeDevice;

    fn open(&self, identifier: &str) -> Result<NativeDevice, PortError> {
        let port = serialport::new(identifier, DEFAULT_PORT_CONFIGURATION.baud_rate)
            .open_native()
            .map_err(|e| PortError::from_open(identifier, e))?;

        Ok(NativeDevice { port })
    }
}

/// An open COM port. The handle is closed when this is dropped.
pub struct NativeDevice {
    port: COMPort,
}

impl NativeDevice {
    fn handle(&self) -> HANDLE {
        self.port.as_raw_handle() as HANDLE
    }

    fn native_state(&self) -> Result<DCB, PortError> {
        // SAFETY: DCB is plain data; all-zero is a valid bit pattern.
        let mut dcb = DCB {
            DCBlength: std::mem::size_of::<DCB>() as DWORD,
            ..unsafe { std::mem::zeroed() }
        };
        // SAFETY: the handle is owned by `self.port`; dcb is a valid out-pointer.
        if unsafe { GetCommState(self.handle(), &mut dcb) } == FALSE {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(dcb)
    }
}

fn from_native(native: &DCB) -> Dcb {
    Dcb {
        baud_rate: native.BaudRate,
        binary: native.fBinary() != 0,
        parity_check: native.fParity() != 0,
        outx_cts_flow: native.fOutxCtsFlow() != 0,
        outx_dsr_flow: native.fOutxDsrFlow() != 0,
        dtr_control: native.fDtrControl() as u8,
        dsr_sensitivity: native.fDsrSensitivity() != 0,
        tx_continue_on_xoff: native.fTXContinueOnXoff() != 0,
        out_x: native.fOutX() != 0,
        in_x: native.fInX() != 0,
        error_char_replace: native.fErrorChar() != 0,
        null_discard: native.fNull() != 0,
        rts_control: native.fRtsControl() as u8,
        abort_on_error: native.fAbortOnError() != 0,
        xon_lim: native.XonLim,
        xoff_lim: native.XoffLim,
        byte_size: native.ByteSize,
        parity: native.Parity,
        stop_bits: native.StopBits,
        xon_char: native.XonChar as u8,
        xoff_char: native.XoffChar as u8,
        error_char: native.ErrorChar as u8,
        eof_char: native.EofChar as u8,
        evt_char: native.EvtChar as u8,
    }
}

fn to_native(state: &Dcb, native: &mut DCB) {
    native.BaudRate = state.baud_rate;
    native.set_fBinary(DWORD::from(state.binary));
    native.set_fParity(DWORD::from(state.parity_check));
    native.set_fOutxCtsFlow(DWORD::from(state.outx_cts_flow));
    native.set_fOutxDsrFlow(DWORD::from(state.outx_dsr_flow));
    native.set_fDtrControl(DWORD::from(state.dtr_control));
    native.set_fDsrSensitivity(DWORD::from(state.dsr_sensitivity));
    native.set_fTXContinueOnXoff(DWORD::from(state.tx_continue_on_xoff));
    native.set_fOutX(DWORD::from(state.out_x));
    native.set_fInX(DWORD::from(state.in_x));
    native.set_fErrorChar(DWORD::from(state.error_char_replace));
    native.set_fNull(DWORD::from(state.null_discard));
    native.set_fRtsControl(DWORD::from(state.rts_control));
    native.set_fAbortOnError(DWORD::from(state.abort_on_error));
    native.XonLim = state.xon_lim;
    native.XoffLim = state.xoff_lim;
    native.ByteSize = state.byte_size;
    native.Parity = state.parity;
    native.StopBits = state.stop_bits;
    native.XonChar = state.xon_char as CHAR;
    native.XoffChar = state.xoff_char as CHAR;
    native.ErrorChar = state.error_char as CHAR;
    native.EofChar = state.eof_char as CHAR;
    native.EvtChar = state.evt_char as CHAR;
}

/// Reads return on the first byte or when the total constant runs out.
fn comm_timeouts(timeouts: &Timeouts) -> COMMTIMEOUTS {
    COMMTIMEOUTS {
        ReadIntervalTimeout: MAXDWORD,
        ReadTotalTimeoutMultiplier: MAXDWORD,
        ReadTotalTimeoutConstant: match timeouts.read_ms {
            0 => MAXDWORD - 1,
            ms => ms,
        },
        WriteTotalTimeoutMultiplier: 0,
        WriteTotalTimeoutConstant: timeouts.write_ms,
    }
}

impl Device for NativeDevice {
    type State = Dcb;

    fn get_state(&mut self) -> Result<Dcb, PortError> {
        Ok(from_native(&self.native_state()?))
    }

    fn set_state(&mut self, state: &Dcb) -> Result<(), PortError> {
        // Start from the live block so reserved fields go back untouched.
        let mut native = self.native_state()?;
        to_native(state, &mut native);
        // SAFETY: the handle is owned by `self.port`; native is a valid DCB.
        if unsafe { SetCommState(self.handle(), &mut native) } == FALSE {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(())
    }

    fn set_timeouts(&mut self, timeouts: &Timeouts) -> Result<(), PortError> {
        let mut native = comm_timeouts(timeouts);
        // SAFETY: the handle is owned by `self.port`.
        if unsafe { SetCommTimeouts(self.handle(), &mut native) } == FALSE {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        Ok(self.port.read(buffer)?)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        Ok(self.port.write(data)?)
    }
}

impl std::fmt::Debug for NativeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeDevice")
            .field("name", &self.port.name())
            .finish()
    }
}
