//! Configuration for the `serial-port-manager` command-line tool.
//!
//! TOML-based configuration with environment variable overrides. The port
//! lifecycle itself takes no configuration; this only supplies defaults for
//! the device path, baud rate and logging.
//!
//! # Configuration Resolution
//!
//! 1. `--config <FILE>` on the command line
//! 2. `SERIAL_PORT_MANAGER_CONFIG` environment variable
//! 3. `./serial-port-manager.toml`
//! 4. `<user config dir>/serial-port-manager/config.toml`
//! 5. Built-in defaults
//!
//! # Example
//!
//! ```toml
//! [serial]
//! device = "/dev/ttyS1"
//! default_baud = 57600
//!
//! [serial.port_aliases]
//! scanner = "/dev/ttyS2"
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig};
