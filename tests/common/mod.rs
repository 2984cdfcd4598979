//! Shared test utilities.
//!
//! - A pseudo-terminal pair standing in for a loopback-capable serial device
//! - Descriptor accounting through `/proc/self/fd`
//! - Read helpers with a deadline

#![allow(dead_code)]

use serialport::{SerialPort, TTYPort};
use std::os::unix::io::AsRawFd;
use std::io::{self, Read};
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

/// A pseudo-terminal: the master end plays the remote peer, the slave path
/// is what the code under test opens.
pub struct VirtualSerial {
    pub peer: TTYPort,
    // Keeps the slave side alive for the lifetime of the pair.
    slave: TTYPort,
    pub path: String,
}

impl VirtualSerial {
    pub fn new() -> Self {
        let (mut peer, mut slave) = TTYPort::pair().expect("Failed to create pty pair");
        // TTYPort::open sets TIOCEXCL, which would make a second open fail.
        slave
            .set_exclusive(false)
            .expect("Failed to clear exclusive mode on pty slave");
        peer.set_timeout(Duration::from_secs(1))
            .expect("Failed to set peer timeout");
        let path = slave.name().expect("pty slave has no name");

        Self {
            peer,
            slave,
            path,
        }
    }

    /// Set input flags on the device side, as a previous user of the line
    /// might have left them.
    pub fn set_input_flags(&self, flags: libc::tcflag_t) {
        let fd = self.slave.as_raw_fd();
        // SAFETY: termios is plain old data and `fd` stays open for the call.
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            assert_eq!(libc::tcgetattr(fd, &mut termios), 0, "tcgetattr on pty slave");
            termios.c_iflag = flags;
            assert_eq!(libc::tcsetattr(fd, libc::TCSANOW, &termios), 0, "tcsetattr on pty slave");
        }
    }
}

/// Read from `reader` until `expected` bytes arrived or `timeout` elapsed.
pub fn read_exact_within<R: Read>(reader: &mut R, expected: usize, timeout: Duration) -> Vec<u8> {
    let deadline = Instant::now() + timeout;
    let mut received = Vec::with_capacity(expected);
    let mut buf = [0u8; 256];

    while received.len() < expected && Instant::now() < deadline {
        match reader.read(&mut buf) {
            Ok(n) => received.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) => panic!("read failed: {e}"),
        }
    }
    received
}

/// Number of descriptors currently open in this process.
///
/// Returns `None` where `/proc/self/fd` is unavailable.
pub fn open_fd_count() -> Option<usize> {
    std::fs::read_dir("/proc/self/fd")
        .ok()
        .map(|entries| entries.count())
}

/// Whether `fd` names an open descriptor.
pub fn fd_is_open(fd: RawFd) -> bool {
    let rc = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    rc >= 0
}
