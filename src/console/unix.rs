use super::ConsoleMode;
use once_cell::sync::OnceCell;
use std::io;

/// Terminal attributes of stdin before the first switch.
static ORIGINAL: OnceCell<libc::termios> = OnceCell::new();

fn original() -> io::Result<&'static libc::termios> {
    ORIGINAL.get_or_try_init(|| {
        // SAFETY: termios is plain data; tcgetattr fills it or fails.
        let mut attrs: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &mut attrs) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(attrs)
    })
}

/// Terminals interpret VT sequences already, so `Ansi` is the original mode.
/// `AnsiWithEvents` turns off line buffering and echo so every key press is
/// delivered as it happens.
pub(super) fn set_mode(mode: ConsoleMode) -> io::Result<()> {
    let original = original()?;
    let attrs = match mode {
        ConsoleMode::Default | ConsoleMode::Ansi => *original,
        ConsoleMode::AnsiWithEvents => {
            let mut raw = *original;
            raw.c_lflag &= !(libc::ICANON | libc::ECHO);
            raw.c_cc[libc::VMIN] = 1;
            raw.c_cc[libc::VTIME] = 0;
            raw
        }
    };
    // SAFETY: attrs is a fully initialised termios taken from this terminal.
    if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &attrs) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
