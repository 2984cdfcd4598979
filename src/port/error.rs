//! Port-specific error types.
//!
//! `OpenError` is returned to callers of [`PortManager::open`](super::PortManager::open).
//! `CloseError` never leaves the close path; it only shapes the log record.

use std::os::unix::io::RawFd;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while opening and configuring a serial port.
///
/// Every variant is terminal for the call that produced it: no descriptor is
/// left open and nothing is retried.
#[derive(Debug, Error)]
pub enum OpenError {
    /// The device node could not be opened (missing, permission denied, busy).
    #[error("Device unavailable: {path}: {source}")]
    DeviceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The current line settings could not be read from the opened descriptor.
    #[error("Failed to read line configuration of {path}: {source}")]
    ConfigurationReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested rate is not one of the supported baud rates.
    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// The new line settings could not be committed to the descriptor.
    #[error("Failed to write line configuration of {path}: {source}")]
    ConfigurationWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OpenError {
    pub(crate) fn device_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DeviceUnavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigurationReadFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigurationWriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Stable short name of the failure kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DeviceUnavailable { .. } => "DeviceUnavailable",
            Self::ConfigurationReadFailed { .. } => "ConfigurationReadFailed",
            Self::UnsupportedBaudRate(_) => "UnsupportedBaudRate",
            Self::ConfigurationWriteFailed { .. } => "ConfigurationWriteFailed",
        }
    }
}

/// A textual baud rate that is not a supported rate.
#[derive(Debug, Error)]
pub enum ParseBaudRateError {
    #[error("Invalid baud rate '{0}': not an unsigned integer")]
    NotANumber(String),

    #[error(transparent)]
    Unsupported(#[from] OpenError),
}

/// Reasons a close request released nothing.
#[derive(Debug, Error)]
pub enum CloseError {
    /// The handle was absent or its descriptor is not open.
    #[error("Attempted to close an invalid file descriptor ({0:?})")]
    InvalidHandle(Option<RawFd>),

    /// `close(2)` reported an error; the descriptor is released regardless.
    #[error("close({fd}) failed: {source}")]
    Io {
        fd: RawFd,
        #[source]
        source: std::io::Error,
    },
}
