//! Console mode toggling for terminal front-ends.
//!
//! Switches the process console between its original mode and a mode that
//! passes ANSI/VT100 sequences through, optionally with raw key and window
//! events. The original mode is captured the first time any mode is set and
//! kept for the life of the process, so [`default_mode`] always restores what
//! the console looked like before this module touched it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as platform;
#[cfg(windows)]
use windows as platform;

/// Console input/output handling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsoleMode {
    /// Whatever the console was set to before the first switch.
    #[default]
    Default,
    /// VT100 processing on input and output.
    Ansi,
    /// [`ConsoleMode::Ansi`] plus unbuffered key, mouse and window events.
    #[serde(rename = "ansi-events")]
    AnsiWithEvents,
}

impl fmt::Display for ConsoleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsoleMode::Default => "default",
            ConsoleMode::Ansi => "ansi",
            ConsoleMode::AnsiWithEvents => "ansi-events",
        };
        f.write_str(name)
    }
}

impl FromStr for ConsoleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(ConsoleMode::Default),
            "ansi" => Ok(ConsoleMode::Ansi),
            "ansi-events" | "ansi_events" => Ok(ConsoleMode::AnsiWithEvents),
            other => Err(format!(
                "unknown console mode '{}', expected default, ansi or ansi-events",
                other
            )),
        }
    }
}

/// Switch the process console to `mode`.
///
/// Returns `false` if the console handles or their original modes cannot be
/// obtained (e.g. stdin is not a terminal) or the OS refuses the new mode.
pub fn set_console_mode(mode: ConsoleMode) -> bool {
    match platform::set_mode(mode) {
        Ok(()) => {
            tracing::debug!("Console switched to {} mode", mode);
            true
        }
        Err(e) => {
            tracing::debug!("Console mode {} not applied: {}", mode, e);
            false
        }
    }
}

pub fn ansi_mode() -> bool {
    set_console_mode(ConsoleMode::Ansi)
}

pub fn ansi_event_mode() -> bool {
    set_console_mode(ConsoleMode::AnsiWithEvents)
}

/// Restore the original console mode. Failures are ignored.
pub fn default_mode() {
    set_console_mode(ConsoleMode::Default);
}
