//! Supported line speeds.
//!
//! The accepted rates form a closed set. Each member maps to the platform's
//! symbolic `speed_t` constant through a single lookup table, so rejecting an
//! unsupported rate is one data-driven check.

use super::error::{OpenError, ParseBaudRateError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A baud rate accepted by [`PortManager`](super::PortManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
}

/// Accepted rates and their termios speed constants.
const SUPPORTED: [(BaudRate, u32, libc::speed_t); 5] = [
    (BaudRate::B9600, 9600, libc::B9600),
    (BaudRate::B19200, 19200, libc::B19200),
    (BaudRate::B38400, 38400, libc::B38400),
    (BaudRate::B57600, 57600, libc::B57600),
    (BaudRate::B115200, 115200, libc::B115200),
];

impl BaudRate {
    /// Every supported rate, slowest first.
    pub const ALL: [BaudRate; 5] = [
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
    ];

    /// Bits per second.
    pub fn as_u32(self) -> u32 {
        SUPPORTED[self as usize].1
    }

    /// The termios speed constant passed to `cfsetispeed`/`cfsetospeed`.
    pub fn speed(self) -> libc::speed_t {
        SUPPORTED[self as usize].2
    }

    /// Reverse lookup from a termios speed constant.
    ///
    /// Returns `None` for speeds outside the supported set.
    pub fn from_speed(speed: libc::speed_t) -> Option<Self> {
        SUPPORTED
            .iter()
            .find(|(_, _, s)| *s == speed)
            .map(|(rate, _, _)| *rate)
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = OpenError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        SUPPORTED
            .iter()
            .find(|(_, bps, _)| *bps == value)
            .map(|(rate, _, _)| *rate)
            .ok_or(OpenError::UnsupportedBaudRate(value))
    }
}

impl FromStr for BaudRate {
    type Err = ParseBaudRateError;

    /// Parse a decimal rate such as `"57600"`, then check it is supported.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| ParseBaudRateError::NotANumber(s.to_string()))?;
        Ok(Self::try_from(value)?)
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.as_u32()
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}
