//! Example showing the open → read → close lifecycle.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example port_usage -- /dev/ttyUSB0 115200
//! ```

use serial_port_manager::{OpenError, PortManager};
use std::io::Read;
use std::time::{Duration, Instant};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().compact().init();

    let mut args = std::env::args().skip(1);
    let device = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let baud: u32 = args.next().map(|s| s.parse::<u32>()).transpose()?.unwrap_or(115200);

    println!("=== Port Lifecycle Example ===\n");

    let mut port = match PortManager::open(&device, baud) {
        Ok(port) => port,
        Err(OpenError::UnsupportedBaudRate(b)) => {
            println!("{b} baud is not supported; use 9600, 19200, 38400, 57600 or 115200");
            return Ok(());
        }
        Err(e) => {
            println!("Port unavailable: {e}");
            return Ok(());
        }
    };

    println!("1. Opened {:?}", port);
    println!("2. Line settings: {:#?}", port.line_settings()?);

    println!("3. Reading for 3 seconds:");
    let deadline = Instant::now() + Duration::from_secs(3);
    let mut buffer = [0u8; 64];
    while Instant::now() < deadline {
        let n = port.read(&mut buffer)?;
        if n > 0 {
            println!("  Read {} bytes: {:02x?}", n, &buffer[..n]);
        }
    }

    PortManager::close(Some(port));
    println!("\n=== Example complete ===");
    Ok(())
}
