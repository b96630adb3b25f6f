use crate::port::configuration::{Timeouts, DEFAULT_PORT_CONFIGURATION};
use crate::port::control::Termios;
use crate::port::device::{Device, DeviceOpener};
use crate::port::error::PortError;
use serialport::{SerialPort as _, TTYPort};
use std::io::{Read, Write};
use std::mem::MaybeUninit;
use std::os::unix::io::AsRawFd;
use std::time::Duration;

/// Stand-in for "no deadline"; the poll in `serialport` takes milliseconds as a C int.
const WAIT_FOREVER: Duration = Duration::from_millis(i32::MAX as u64);

/// Opens tty devices through `serialport`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeOpener;

impl DeviceOpener for NativeOpener {
    type Device = NativeDevice;

    fn open(&self, identifier: &str) -> Result<NativeDevice, PortError> {
        let port = serialport::new(identifier, DEFAULT_PORT_CONFIGURATION.baud_rate)
            .open_native()
            .map_err(|e| PortError::from_open(identifier, e))?;

        Ok(NativeDevice {
            port,
            timeouts: Timeouts::default(),
        })
    }
}

/// An open tty. The fd is closed when this is dropped.
pub struct NativeDevice {
    port: TTYPort,
    timeouts: Timeouts,
}

impl Device for NativeDevice {
    type State = Termios;

    fn get_state(&mut self) -> Result<Termios, PortError> {
        let mut raw = MaybeUninit::<libc::termios>::uninit();
        // SAFETY: the fd is owned by `self.port` and tcgetattr fills the whole struct on success.
        let rc = unsafe { libc::tcgetattr(self.port.as_raw_fd(), raw.as_mut_ptr()) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        // SAFETY: initialised by the successful tcgetattr above.
        Ok(Termios::from_raw(unsafe { raw.assume_init() }))
    }

    fn set_state(&mut self, state: &Termios) -> Result<(), PortError> {
        let raw = state.to_raw()?;
        // SAFETY: the fd is owned by `self.port`; `raw` outlives the call.
        let rc = unsafe { libc::tcsetattr(self.port.as_raw_fd(), libc::TCSANOW, &raw) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(())
    }

    fn set_timeouts(&mut self, timeouts: &Timeouts) -> Result<(), PortError> {
        self.timeouts = *timeouts;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let wait = self.timeouts.read_timeout().unwrap_or(WAIT_FOREVER);
        self.port.set_timeout(wait)?;
        Ok(self.port.read(buffer)?)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let wait = self.timeouts.write_timeout().unwrap_or(WAIT_FOREVER);
        self.port.set_timeout(wait)?;
        Ok(self.port.write(data)?)
    }
}

impl std::fmt::Debug for NativeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeDevice")
            .field("name", &self.port.name())
            .field("fd", &self.port.as_raw_fd())
            .field("timeouts", &self.timeouts)
            .finish()
    }
}
