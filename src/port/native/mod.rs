//! The host backend, one per target platform.
//!
//! Handles come from the `serialport` crate's native port types, which open
//! the device exclusively and close it on drop. Everything that touches the
//! control block or the wait behaviour is done here on the raw handle.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{NativeDevice, NativeOpener};
#[cfg(windows)]
pub use windows::{NativeDevice, NativeOpener};
