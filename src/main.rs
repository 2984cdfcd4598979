use clap::{Parser, Subcommand};
use serial_port_manager::config::{Config, ConfigLoader};
use serial_port_manager::{logging, AppError, AppResult, BaudRate, PortHandle, PortManager};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{debug, error};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Open a serial device in raw mode, inspect or monitor it, and close it again.",
    long_about = "Opens a serial device node with a fixed raw line discipline (8N1, no flow control, \
                  non-canonical input, 0.5 s read timer) at one of 9600, 19200, 38400, 57600 or \
                  115200 baud."
)]
struct Args {
    /// Configuration file (overrides the standard lookup).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "port_manager=trace".
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the device, print the applied line settings as JSON, close it.
    Probe {
        /// Device path or configured alias.
        device: Option<String>,

        /// Baud rate.
        #[arg(short, long)]
        baud: Option<u32>,
    },

    /// Open the device and print everything received until the duration elapses.
    Monitor {
        /// Device path or configured alias.
        device: Option<String>,

        /// Baud rate.
        #[arg(short, long)]
        baud: Option<u32>,

        /// How long to listen, in seconds.
        #[arg(short, long, default_value_t = 10)]
        duration: u64,

        /// Print bytes as hex instead of text.
        #[arg(long)]
        hex: bool,
    },

    /// Print the resolved configuration.
    Config {
        /// Only print where the configuration was loaded from.
        #[arg(long)]
        path: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let loader = match load_config(args.config.as_ref()) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let mut logging_config = loader.config().logging.clone();
    if let Some(level) = args.log_level {
        logging_config.level = level;
    }
    logging::init(&logging_config);

    match run(args.command, &loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn load_config(explicit: Option<&PathBuf>) -> AppResult<ConfigLoader> {
    let loader = match explicit {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    Ok(loader)
}

fn run(command: Command, loader: &ConfigLoader) -> AppResult<()> {
    let config = loader.config();
    match command {
        Command::Probe { device, baud } => {
            let port = open(config, device, baud)?;
            let settings = port.line_settings();
            PortManager::close(Some(port));

            let json = serde_json::to_string_pretty(&settings?)?;
            println!("{json}");
            Ok(())
        }
        Command::Monitor {
            device,
            baud,
            duration,
            hex,
        } => {
            let mut port = open(config, device, baud)?;
            let result = monitor(&mut port, Duration::from_secs(duration), hex);
            PortManager::close(Some(port));
            result
        }
        Command::Config { path } => {
            if path {
                match &loader.config_path {
                    Some(p) => println!("{}", p.display()),
                    None => println!("(built-in defaults)"),
                }
            } else {
                print!("{}", toml::to_string_pretty(config)?);
            }
            Ok(())
        }
    }
}

fn open(config: &Config, device: Option<String>, baud: Option<u32>) -> AppResult<PortHandle> {
    let device = device
        .or_else(|| config.serial.device.clone())
        .ok_or(AppError::NoDevice)?;
    let path = config.serial.resolve_port(&device);
    let baud = match baud {
        Some(b) => BaudRate::try_from(b)?,
        None => config.serial.baud_rate()?,
    };
    Ok(PortManager::open_with(path, baud)?)
}

fn monitor(port: &mut PortHandle, duration: Duration, hex: bool) -> AppResult<()> {
    let deadline = Instant::now() + duration;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut buf = [0u8; 256];

    while Instant::now() < deadline {
        let n = port.read(&mut buf)?;
        if n == 0 {
            continue;
        }
        debug!(bytes = n, "received");
        if hex {
            let line: Vec<String> = buf[..n].iter().map(|b| format!("{b:02x}")).collect();
            writeln!(out, "{}", line.join(" "))?;
        } else {
            out.write_all(String::from_utf8_lossy(&buf[..n]).as_bytes())?;
        }
        out.flush()?;
    }
    Ok(())
}
