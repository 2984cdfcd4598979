//! Owning handle to an open, configured serial descriptor.

use super::baud::BaudRate;
use super::line::LineSettings;
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, RawFd};
use std::path::{Path, PathBuf};

/// An open serial port in raw mode.
///
/// Only [`PortManager::open`](super::PortManager::open) creates handles, and
/// only after the full line configuration has been committed. The descriptor
/// is released by [`PortManager::close`](super::PortManager::close) or, if the
/// handle is simply dropped, by `Drop`.
pub struct PortHandle {
    file: File,
    path: PathBuf,
    baud_rate: BaudRate,
}

impl PortHandle {
    pub(crate) fn new(file: File, path: PathBuf, baud_rate: BaudRate) -> Self {
        Self {
            file,
            path,
            baud_rate,
        }
    }

    /// The device path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The rate applied at open time.
    pub fn baud_rate(&self) -> BaudRate {
        self.baud_rate
    }

    /// Read the line discipline currently held by the driver.
    pub fn line_settings(&self) -> io::Result<LineSettings> {
        read_termios(self.file.as_raw_fd()).map(|t| LineSettings::from_termios(&t))
    }

    /// Bytes waiting in the receive queue.
    pub fn bytes_to_read(&self) -> io::Result<usize> {
        let mut count: libc::c_int = 0;
        // SAFETY: FIONREAD writes a single c_int through the pointer.
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                libc::FIONREAD,
                &mut count as *mut libc::c_int,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(count.max(0) as usize)
    }

    /// Discard unread input queued on the descriptor.
    pub fn clear_input(&self) -> io::Result<()> {
        flush_input(self.file.as_raw_fd())
    }

    /// Give up the port abstraction and keep only the byte stream.
    ///
    /// The returned `File` owns the descriptor.
    pub fn into_file(self) -> File {
        self.file
    }
}

pub(crate) fn read_termios(fd: RawFd) -> io::Result<libc::termios> {
    // SAFETY: termios is plain old data; tcgetattr fills it completely.
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };
    // SAFETY: `termios` is a valid, writable structure for the whole call.
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

pub(crate) fn flush_input(fd: RawFd) -> io::Result<()> {
    // SAFETY: tcflush takes no pointers; a bad fd is reported as an error.
    if unsafe { libc::tcflush(fd, libc::TCIFLUSH) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

impl Read for PortHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for PortHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl AsFd for PortHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for PortHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl IntoRawFd for PortHandle {
    fn into_raw_fd(self) -> RawFd {
        self.file.into_raw_fd()
    }
}

impl From<PortHandle> for File {
    fn from(handle: PortHandle) -> Self {
        handle.into_file()
    }
}

impl std::fmt::Debug for PortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortHandle")
            .field("path", &self.path)
            .field("fd", &self.file.as_raw_fd())
            .field("baud_rate", &self.baud_rate)
            .finish()
    }
}
