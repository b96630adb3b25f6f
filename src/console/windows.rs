use super::ConsoleMode;
use once_cell::sync::OnceCell;
use std::io;
use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::um::consoleapi::{GetConsoleMode, SetConsoleMode};
use winapi::um::handleapi::INVALID_HANDLE_VALUE;
use winapi::um::processenv::GetStdHandle;
use winapi::um::winbase::{STD_INPUT_HANDLE, STD_OUTPUT_HANDLE};
use winapi::um::wincon::{
    ENABLE_MOUSE_INPUT, ENABLE_PROCESSED_INPUT, ENABLE_PROCESSED_OUTPUT,
    ENABLE_VIRTUAL_TERMINAL_INPUT, ENABLE_VIRTUAL_TERMINAL_PROCESSING, ENABLE_WINDOW_INPUT,
};
use winapi::um::winnt::HANDLE;

/// Standard handles and their modes before the first switch.
struct ConsoleState {
    input: usize,
    output: usize,
    input_mode: DWORD,
    output_mode: DWORD,
}

static ORIGINAL: OnceCell<ConsoleState> = OnceCell::new();

fn std_handle(which: DWORD) -> io::Result<HANDLE> {
    // SAFETY: GetStdHandle has no preconditions.
    let handle = unsafe { GetStdHandle(which) };
    if handle == INVALID_HANDLE_VALUE || handle.is_null() {
        return Err(io::Error::last_os_error());
    }
    Ok(handle)
}

fn console_mode(handle: HANDLE) -> io::Result<DWORD> {
    let mut mode: DWORD = 0;
    // SAFETY: handle came from GetStdHandle; mode is a valid out-pointer.
    if unsafe { GetConsoleMode(handle, &mut mode) } == FALSE {
        return Err(io::Error::last_os_error());
    }
    Ok(mode)
}

fn original() -> io::Result<&'static ConsoleState> {
    ORIGINAL.get_or_try_init(|| {
        let input = std_handle(STD_INPUT_HANDLE)?;
        let output = std_handle(STD_OUTPUT_HANDLE)?;
        Ok(ConsoleState {
            input_mode: console_mode(input)?,
            output_mode: console_mode(output)?,
            // Stored as integers so the state is Sync.
            input: input as usize,
            output: output as usize,
        })
    })
}

fn apply(handle: usize, mode: DWORD) -> io::Result<()> {
    // SAFETY: handle is a standard handle captured in `original`.
    if unsafe { SetConsoleMode(handle as HANDLE, mode) } == FALSE {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub(super) fn set_mode(mode: ConsoleMode) -> io::Result<()> {
    let state = original()?;
    let vt_output = ENABLE_PROCESSED_OUTPUT | ENABLE_VIRTUAL_TERMINAL_PROCESSING;
    let (input_mode, output_mode) = match mode {
        ConsoleMode::Default => (state.input_mode, state.output_mode),
        ConsoleMode::Ansi => (
            ENABLE_VIRTUAL_TERMINAL_INPUT | ENABLE_PROCESSED_INPUT,
            vt_output,
        ),
        ConsoleMode::AnsiWithEvents => (
            ENABLE_VIRTUAL_TERMINAL_INPUT
                | ENABLE_PROCESSED_INPUT
                | ENABLE_WINDOW_INPUT
                | ENABLE_MOUSE_INPUT,
            vt_output,
        ),
    };
    apply(state.input, input_mode)?;
    apply(state.output, output_mode)
}
