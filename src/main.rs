//! serialcat - a minimal serial terminal.
//!
//! Opens one port, forwards everything typed on stdin to it and prints each
//! burst the device sends back. `Ctrl+]` ends the session.

use clap::Parser;
use serial_port_core::config::{Config, ConfigLoader, LogFormat, LoggingConfig};
use serial_port_core::console::{self, ConsoleMode};
use serial_port_core::port::{SerialPort, SerialPortAdapter};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Byte that ends the session when typed (`Ctrl+]`).
const ESCAPE_BYTE: u8 = 0x1d;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "serialcat",
    version,
    about = "Talk to a serial device from the terminal.",
    long_about = "Opens a serial port, sends stdin to it and prints what the device answers, one burst at a time. Settings come from serialcat.toml and SERIAL_CORE_* variables; flags override both."
)]
struct Args {
    /// Device identifier or configured alias (e.g. COM3, /dev/ttyUSB0).
    #[arg(short, long)]
    device: Option<String>,

    /// Baud rate.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Configuration file to use instead of the standard locations.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print received bytes as timestamped hex lines.
    #[arg(long)]
    hex: bool,

    /// Terminal mode while attached: default, ansi or ansi-events.
    #[arg(long, value_name = "MODE")]
    console_mode: Option<ConsoleMode>,

    /// Exit after the first received burst.
    #[arg(long)]
    once: bool,
}

/// Puts the terminal back the way it was, however the session ends.
struct ConsoleGuard {
    active: bool,
}

impl ConsoleGuard {
    fn enter(mode: ConsoleMode) -> Self {
        if mode == ConsoleMode::Default {
            return Self { active: false };
        }
        let active = console::set_console_mode(mode);
        if !active {
            warn!("Could not switch the console to {} mode", mode);
        }
        Self { active }
    }
}

impl Drop for ConsoleGuard {
    fn drop(&mut self) {
        if self.active {
            console::default_mode();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match args.config {
        Some(ref path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let config_path = loader.config_path.clone();
    let mut config = loader.into_config();
    apply_args(&mut config, &args);

    init_logging(&config.logging);
    match config_path {
        Some(path) => debug!("Loaded configuration from {}", path.display()),
        None => debug!("Using built-in configuration"),
    }

    let device = config
        .serial
        .device
        .as_deref()
        .map(|name| config.serial.resolve_port(name))
        .ok_or("no device given: pass --device or set serial.device")?;
    let line = config.serial.port_configuration()?;
    let timeouts = config.serial.timeouts();

    let mut port = SerialPort::new(device.as_str());
    port.try_open()?;
    port.try_set_config(&line)?;
    port.try_set_timeouts(timeouts.read_ms, timeouts.write_ms)?;
    info!("Connected to {} at {}", device, line);

    let _console = ConsoleGuard::enter(config.console.mode);
    let input = spawn_stdin_reader();
    run_session(&mut port, &config, &input, args.hex, args.once)?;

    port.close();
    Ok(())
}

/// Command-line flags win over file and environment.
fn apply_args(config: &mut Config, args: &Args) {
    if let Some(ref device) = args.device {
        config.serial.device = Some(device.clone());
    }
    if let Some(baud) = args.baud {
        config.serial.baud = baud;
    }
    if let Some(mode) = args.console_mode {
        config.console.mode = mode;
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

enum Input {
    Data(Vec<u8>),
    Quit,
}

/// Stdin is read on its own thread so a silent keyboard never stalls reception.
fn spawn_stdin_reader() -> Receiver<Input> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut stdin = io::stdin().lock();
        let mut buffer = [0u8; 256];
        loop {
            let n = match stdin.read(&mut buffer) {
                Ok(0) => {
                    debug!("stdin closed");
                    return;
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    return;
                }
            };
            let chunk = &buffer[..n];
            if let Some(end) = chunk.iter().position(|&b| b == ESCAPE_BYTE) {
                if end > 0 {
                    let _ = tx.send(Input::Data(chunk[..end].to_vec()));
                }
                let _ = tx.send(Input::Quit);
                return;
            }
            if tx.send(Input::Data(chunk.to_vec())).is_err() {
                return;
            }
        }
    });
    rx
}

fn run_session(
    port: &mut SerialPort,
    config: &Config,
    input: &Receiver<Input>,
    hex: bool,
    once: bool,
) -> io::Result<()> {
    let serial = &config.serial;
    let mut buffer = vec![0u8; serial.buffer_size];
    let mut stdout = io::stdout();

    loop {
        loop {
            match input.try_recv() {
                Ok(Input::Data(data)) => send_all(port, &data),
                Ok(Input::Quit) => return Ok(()),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if !port.is_open() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "port closed"));
        }

        let n = port.read_bytes_consecutive(
            &mut buffer,
            serial.consecutive_delay_ms,
            serial.reception_wait_timeout_ms,
        );
        if n == 0 {
            continue;
        }

        print_burst(&mut stdout, &buffer[..n], hex)?;
        if once {
            return Ok(());
        }
    }
}

fn send_all(port: &mut SerialPort, data: &[u8]) {
    let mut sent = 0;
    while sent < data.len() {
        let n = port.write_bytes(&data[sent..]);
        if n == 0 {
            warn!("Dropped {} unsent bytes", data.len() - sent);
            return;
        }
        sent += n;
    }
}

fn print_burst(out: &mut impl Write, data: &[u8], hex: bool) -> io::Result<()> {
    if hex {
        let stamp = chrono::Local::now().format("%H:%M:%S%.3f");
        let bytes: Vec<String> = data.iter().map(|b| format!("{:02x}", b)).collect();
        writeln!(out, "{} [{}] {}", stamp, data.len(), bytes.join(" "))?;
    } else {
        out.write_all(data)?;
    }
    out.flush()
}
