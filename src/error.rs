//! Application-level error type for the command-line tool.

use crate::config::ConfigError;
use crate::port::OpenError;
use thiserror::Error;

/// A specialized `Result` type for the binary.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// No device given on the command line or in the configuration.
    #[error("No serial device given; pass one or set serial.device in the configuration")]
    NoDevice,

    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("An I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("A serialization error occurred: {0}")]
    Json(#[from] serde_json::Error),

    #[error("A serialization error occurred: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoDevice | Self::Config(_) => 2,
            Self::Open(_) => 3,
            Self::Io(_) | Self::Json(_) | Self::Toml(_) => 1,
        }
    }
}
