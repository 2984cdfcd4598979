//! Open and close serial ports.
//!
//! `open` is a linear pipeline: open the node, read the line settings, set
//! speed and the raw policy, flush input, commit. Each stage maps its failure
//! to one [`OpenError`] variant. The descriptor lives in a `File` from the
//! first stage on, so every early return releases it.

use super::baud::BaudRate;
use super::error::{CloseError, OpenError};
use super::handle::{flush_input, read_termios, PortHandle};
use super::line::LineConfiguration;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};
use std::path::Path;
use tracing::{error, info, warn};

/// Log target shared by every record this module emits.
pub const LOG_TARGET: &str = "port_manager";

/// Lifecycle operations for a single serial port.
///
/// Holds no state: each handle is independent and owned by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortManager;

impl PortManager {
    /// Open `path` at `baud` bits per second in raw mode.
    ///
    /// `baud` must be one of 9600, 19200, 38400, 57600 or 115200; anything
    /// else is rejected before the device is touched.
    ///
    /// # Example
    /// ```no_run
    /// use serial_port_manager::PortManager;
    /// use std::io::Read;
    ///
    /// let mut port = PortManager::open("/dev/ttyUSB0", 115200)?;
    /// let mut buf = [0u8; 256];
    /// let n = port.read(&mut buf)?;
    /// PortManager::close(Some(port));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: impl AsRef<Path>, baud: u32) -> Result<PortHandle, OpenError> {
        let path = path.as_ref();
        let rate = BaudRate::try_from(baud).map_err(|e| {
            error!(target: LOG_TARGET, path = %path.display(), baud, "Unsupported baud rate");
            e
        })?;
        Self::open_with(path, rate)
    }

    /// Open `path` at an already validated rate.
    pub fn open_with(path: impl AsRef<Path>, baud: BaudRate) -> Result<PortHandle, OpenError> {
        let path = path.as_ref();
        match configure(path, baud) {
            Ok(file) => {
                info!(
                    target: LOG_TARGET,
                    path = %path.display(),
                    fd = file.as_raw_fd(),
                    baud = baud.as_u32(),
                    "Successfully opened and configured port"
                );
                Ok(PortHandle::new(file, path.to_path_buf(), baud))
            }
            Err(e) => {
                error!(
                    target: LOG_TARGET,
                    path = %path.display(),
                    kind = e.kind(),
                    "{e}"
                );
                Err(e)
            }
        }
    }

    /// Release a handle. Never fails.
    ///
    /// `None` is logged as an invalid handle and performs no I/O.
    pub fn close(handle: Option<PortHandle>) {
        let Some(handle) = handle else {
            report_close(Err(CloseError::InvalidHandle(None)));
            return;
        };
        report_close(close_fd(handle.into_raw_fd()));
    }

    /// Release a raw descriptor previously obtained from a handle.
    ///
    /// A negative value, or one that does not name an open descriptor, is
    /// logged as an invalid handle and not passed to `close(2)`. The caller
    /// must own `fd`: a number the OS has since reused for another resource
    /// will close that resource.
    pub fn close_raw(fd: RawFd) {
        if fd < 0 || !is_open(fd) {
            report_close(Err(CloseError::InvalidHandle(Some(fd))));
            return;
        }
        report_close(close_fd(fd));
    }
}

fn configure(path: &Path, baud: BaudRate) -> Result<File, OpenError> {
    // O_NONBLOCK keeps open(2) from waiting on carrier detect.
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
        .open(path)
        .map_err(|e| OpenError::device_unavailable(path, e))?;
    let fd = file.as_raw_fd();

    let mut termios = read_termios(fd).map_err(|e| OpenError::read_failed(path, e))?;

    set_speed(&mut termios, baud).map_err(|e| OpenError::write_failed(path, e))?;
    LineConfiguration::RAW.apply(&mut termios);

    flush_input(fd).map_err(|e| OpenError::write_failed(path, e))?;

    // SAFETY: `fd` is owned by `file` and `termios` is fully initialised.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(OpenError::write_failed(path, io::Error::last_os_error()));
    }

    // Reads must block for up to VTIME, not fail with EAGAIN.
    set_blocking(fd).map_err(|e| OpenError::write_failed(path, e))?;

    Ok(file)
}

fn set_speed(termios: &mut libc::termios, baud: BaudRate) -> io::Result<()> {
    let speed = baud.speed();
    let termios: *mut libc::termios = termios;
    // SAFETY: both calls only write into the structure we borrowed.
    unsafe {
        if libc::cfsetispeed(termios, speed) != 0 || libc::cfsetospeed(termios, speed) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

fn set_blocking(fd: RawFd) -> io::Result<()> {
    // SAFETY: F_GETFL/F_SETFL only touch the status flags of a descriptor we own.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn is_open(fd: RawFd) -> bool {
    // SAFETY: F_GETFD has no side effects; an unknown fd yields EBADF.
    let rc = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    rc >= 0
}

fn close_fd(fd: RawFd) -> Result<RawFd, CloseError> {
    // The descriptor is gone after close(2) even when it reports an error,
    // so the result is only used for logging.
    // SAFETY: callers pass a descriptor they own and never use it again.
    if unsafe { libc::close(fd) } != 0 {
        return Err(CloseError::Io {
            fd,
            source: io::Error::last_os_error(),
        });
    }
    Ok(fd)
}

fn report_close(result: Result<RawFd, CloseError>) {
    match result {
        Ok(fd) => info!(target: LOG_TARGET, fd, "Port closed"),
        Err(e) => warn!(target: LOG_TARGET, "{e}"),
    }
}
