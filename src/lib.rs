//! Serial Port Manager Library
//!
//! Opens a serial device node, puts its line discipline into a fixed raw
//! mode (8N1, no flow control, non-canonical, 0.5 s read timer) and hands
//! back an owning [`PortHandle`] that reads and writes like any byte stream.
//! [`PortManager::close`] releases it again.
//!
//! # Modules
//!
//! - `port`: open/close lifecycle, baud table, line policy, handle
//! - `config`: TOML configuration for the command-line tool
//! - `logging`: tracing subscriber set-up
//! - `error`: application-level error type
//!
//! # Example
//!
//! ```no_run
//! use serial_port_manager::PortManager;
//! use std::io::Read;
//!
//! let mut port = PortManager::open("/dev/ttyS1", 57600)?;
//! let mut buf = [0u8; 64];
//! let n = port.read(&mut buf)?; // at most ~0.5 s when the line is idle
//! println!("{:02x?}", &buf[..n]);
//! PortManager::close(Some(port));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(not(unix))]
compile_error!("serial_port_manager drives termios and only supports Unix targets");

pub mod config;
pub mod error;
pub mod logging;
pub mod port;

pub use error::{AppError, AppResult};
pub use port::{
    BaudRate, CloseError, DataBits, FlowControl, LineConfiguration, LineSettings, OpenError,
    ParseBaudRateError, Parity, PortHandle, PortManager, StopBits,
};

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
