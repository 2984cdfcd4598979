//! Serial port lifecycle.
//!
//! [`PortManager`] opens a device node, applies the fixed raw line policy
//! and hands back a [`PortHandle`]; it also closes handles and raw
//! descriptors again.

pub mod baud;
pub mod error;
pub mod handle;
pub mod line;
pub mod manager;

pub use baud::BaudRate;
pub use error::{CloseError, OpenError, ParseBaudRateError};
pub use handle::PortHandle;
pub use line::{DataBits, FlowControl, LineConfiguration, LineSettings, Parity, StopBits};
pub use manager::{PortManager, LOG_TARGET};
