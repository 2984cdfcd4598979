//! Line discipline policy and read-back.
//!
//! [`LineConfiguration::RAW`] is the only policy applied by
//! [`PortManager`](super::PortManager): 8N1, receiver on, modem control lines
//! ignored, no flow control, non-canonical input without echo or signal
//! characters, no output post-processing, `VMIN = 0` / `VTIME = 5`.
//!
//! [`LineSettings`] decodes a `termios` structure so callers and tests can
//! check what the driver actually holds.

use super::baud::BaudRate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    fn flag(self) -> libc::tcflag_t {
        match self {
            DataBits::Five => libc::CS5,
            DataBits::Six => libc::CS6,
            DataBits::Seven => libc::CS7,
            DataBits::Eight => libc::CS8,
        }
    }

    fn from_cflag(cflag: libc::tcflag_t) -> Self {
        match cflag & libc::CSIZE {
            x if x == libc::CS5 => DataBits::Five,
            x if x == libc::CS6 => DataBits::Six,
            x if x == libc::CS7 => DataBits::Seven,
            _ => DataBits::Eight,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl Parity {
    fn from_cflag(cflag: libc::tcflag_t) -> Self {
        if cflag & libc::PARENB == 0 {
            Parity::None
        } else if cflag & libc::PARODD != 0 {
            Parity::Odd
        } else {
            Parity::Even
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    One,
    Two,
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

/// The fixed raw-mode line policy.
///
/// Not caller-configurable: the only value is [`LineConfiguration::RAW`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineConfiguration {
    data_bits: DataBits,
    min_bytes: u8,
    timeout_deciseconds: u8,
}

impl LineConfiguration {
    /// 8N1, no flow control, non-canonical, 0.5 s inter-read timer.
    pub const RAW: LineConfiguration = LineConfiguration {
        data_bits: DataBits::Eight,
        min_bytes: 0,
        timeout_deciseconds: 5,
    };

    pub fn data_bits(&self) -> DataBits {
        self.data_bits
    }

    /// `VMIN`: bytes a read waits for before returning.
    pub fn min_bytes(&self) -> u8 {
        self.min_bytes
    }

    /// `VTIME` expressed as a duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_deciseconds) * 100)
    }

    /// Overwrite `termios` in place with this policy.
    ///
    /// Speed is not touched; it is set separately with `cfset*speed`.
    pub fn apply(&self, termios: &mut libc::termios) {
        termios.c_cflag &= !libc::CSIZE;
        termios.c_cflag |= self.data_bits.flag();
        termios.c_cflag &= !libc::PARENB;
        termios.c_cflag &= !libc::CSTOPB;
        termios.c_cflag |= libc::CREAD | libc::CLOCAL;

        termios.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
        termios.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ECHOE | libc::ISIG);
        termios.c_oflag &= !libc::OPOST;

        termios.c_cc[libc::VMIN] = self.min_bytes;
        termios.c_cc[libc::VTIME] = self.timeout_deciseconds;
    }
}

const INPUT_TRANSLATION: libc::tcflag_t = libc::ICRNL | libc::INLCR | libc::IGNCR | libc::ISTRIP;

/// Snapshot of a descriptor's line discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSettings {
    /// `None` when the output speed is outside the supported set.
    pub baud_rate: Option<BaudRate>,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    pub receiver_enabled: bool,
    pub ignore_modem_control: bool,
    pub canonical: bool,
    pub echo: bool,
    pub signals: bool,
    pub output_processing: bool,
    /// Any of `ICRNL`, `INLCR`, `IGNCR` or `ISTRIP`: the driver rewrites or
    /// drops received bytes. The raw policy leaves these flags as found.
    pub input_translation: bool,
    pub min_bytes: u8,
    pub read_timeout: Duration,
}

impl LineSettings {
    /// Decode a `termios` structure.
    pub fn from_termios(termios: &libc::termios) -> Self {
        // SAFETY: cfgetospeed only reads from the structure.
        let speed = unsafe { libc::cfgetospeed(termios) };

        let flow_control = if termios.c_iflag & (libc::IXON | libc::IXOFF | libc::IXANY) != 0 {
            FlowControl::Software
        } else if termios.c_cflag & libc::CRTSCTS != 0 {
            FlowControl::Hardware
        } else {
            FlowControl::None
        };

        Self {
            baud_rate: BaudRate::from_speed(speed),
            data_bits: DataBits::from_cflag(termios.c_cflag),
            parity: Parity::from_cflag(termios.c_cflag),
            stop_bits: if termios.c_cflag & libc::CSTOPB != 0 {
                StopBits::Two
            } else {
                StopBits::One
            },
            flow_control,
            receiver_enabled: termios.c_cflag & libc::CREAD != 0,
            ignore_modem_control: termios.c_cflag & libc::CLOCAL != 0,
            canonical: termios.c_lflag & libc::ICANON != 0,
            echo: termios.c_lflag & (libc::ECHO | libc::ECHOE) != 0,
            signals: termios.c_lflag & libc::ISIG != 0,
            output_processing: termios.c_oflag & libc::OPOST != 0,
            input_translation: termios.c_iflag & INPUT_TRANSLATION != 0,
            min_bytes: termios.c_cc[libc::VMIN],
            read_timeout: Duration::from_millis(u64::from(termios.c_cc[libc::VTIME]) * 100),
        }
    }

    /// Whether these settings match [`LineConfiguration::RAW`].
    ///
    /// Hardware flow control is not part of the policy and is ignored here.
    /// Neither is input translation: a line can be raw by this measure and
    /// still turn a received `\r` into `\n`. Check
    /// [`input_translation`](Self::input_translation) for that.
    pub fn is_raw(&self) -> bool {
        let policy = LineConfiguration::RAW;
        self.data_bits == policy.data_bits()
            && self.parity == Parity::None
            && self.stop_bits == StopBits::One
            && self.flow_control != FlowControl::Software
            && self.receiver_enabled
            && self.ignore_modem_control
            && !self.canonical
            && !self.echo
            && !self.signals
            && !self.output_processing
            && self.min_bytes == policy.min_bytes()
            && self.read_timeout == policy.read_timeout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// A "cooked" terminal: 7E2, XON/XOFF, canonical with echo.
    fn cooked_termios() -> libc::termios {
        // SAFETY: termios is plain old data; all-zero is a valid value.
        let mut t: libc::termios = unsafe { std::mem::zeroed() };
        t.c_cflag = libc::CS7 | libc::PARENB | libc::CSTOPB;
        t.c_iflag = libc::IXON | libc::IXOFF | libc::ICRNL;
        t.c_lflag = libc::ICANON | libc::ECHO | libc::ECHOE | libc::ISIG;
        t.c_oflag = libc::OPOST;
        t.c_cc[libc::VMIN] = 1;
        t.c_cc[libc::VTIME] = 0;
        t
    }

    #[test]
    fn test_cooked_termios_is_not_raw() {
        let settings = LineSettings::from_termios(&cooked_termios());
        assert_eq!(settings.data_bits, DataBits::Seven);
        assert_eq!(settings.parity, Parity::Even);
        assert_eq!(settings.stop_bits, StopBits::Two);
        assert_eq!(settings.flow_control, FlowControl::Software);
        assert!(settings.canonical);
        assert!(settings.input_translation);
        assert!(!settings.is_raw());
    }

    #[test]
    fn test_apply_raw_policy() {
        let mut t = cooked_termios();
        LineConfiguration::RAW.apply(&mut t);

        let settings = LineSettings::from_termios(&t);
        assert_eq!(settings.data_bits, DataBits::Eight);
        assert_eq!(settings.parity, Parity::None);
        assert_eq!(settings.stop_bits, StopBits::One);
        assert_eq!(settings.flow_control, FlowControl::None);
        assert!(settings.receiver_enabled);
        assert!(settings.ignore_modem_control);
        assert!(!settings.canonical);
        assert!(!settings.echo);
        assert!(!settings.signals);
        assert!(!settings.output_processing);
        assert_eq!(settings.min_bytes, 0);
        assert_eq!(settings.read_timeout, Duration::from_millis(500));
        assert!(settings.is_raw());
    }

    #[test]
    fn test_apply_keeps_unrelated_input_flags() {
        let mut t = cooked_termios();
        LineConfiguration::RAW.apply(&mut t);
        assert_ne!(t.c_iflag & libc::ICRNL, 0);

        let settings = LineSettings::from_termios(&t);
        assert!(settings.input_translation);
        assert!(settings.is_raw());
    }

    #[test]
    fn test_odd_parity_decoding() {
        // SAFETY: see cooked_termios.
        let mut t: libc::termios = unsafe { std::mem::zeroed() };
        t.c_cflag = libc::CS8 | libc::PARENB | libc::PARODD;
        assert_eq!(LineSettings::from_termios(&t).parity, Parity::Odd);
    }

    #[test]
    fn test_policy_accessors() {
        let policy = LineConfiguration::RAW;
        assert_eq!(policy.data_bits(), DataBits::Eight);
        assert_eq!(policy.min_bytes(), 0);
        assert_eq!(policy.read_timeout(), Duration::from_millis(500));
    }
}
