//! Translation between [`PortConfiguration`] and native control blocks.
//!
//! Writing is total: every field the abstract model governs is overwritten and
//! everything else in the native block is left as the OS reported it. Reading
//! is lossy: native states that don't correspond to a single abstract variant
//! come back as `Undefined` instead of failing.

use super::configuration::PortConfiguration;
use super::error::PortError;
use std::fmt::Debug;

pub mod dcb;
#[cfg(unix)]
pub mod termios;

pub use dcb::Dcb;
#[cfg(unix)]
pub use termios::Termios;

/// XON byte written into every control block.
pub const XON_CHAR: u8 = 0x11;
/// XOFF byte written into every control block.
pub const XOFF_CHAR: u8 = 0x13;

/// A host control block that a [`PortConfiguration`] can be mapped onto.
pub trait ControlBlock: Clone + Debug + Send {
    /// Overwrite every field the abstract model governs.
    ///
    /// `Undefined` variants leave the matching native field untouched; callers
    /// are expected to have rejected them through [`ControlBlock::ensure_supported`].
    fn apply(&mut self, config: &PortConfiguration);

    /// Reconstruct the abstract configuration. Never fails.
    fn to_configuration(&self) -> PortConfiguration;

    fn baud_rate(&self) -> u32;

    fn set_baud_rate(&mut self, baud_rate: u32);

    /// Reject configurations this block has no encoding for.
    fn ensure_supported(&self, config: &PortConfiguration) -> Result<(), PortError> {
        config.validate()
    }
}
