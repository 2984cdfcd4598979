//! Open/close lifecycle against a pseudo-terminal and against paths that are
//! not serial devices.
//!
//! Every test is `#[serial]`: several of them count this process's open
//! descriptors or probe descriptor numbers after closing them, which only
//! works when no other test is opening files at the same time.

mod common;

use common::{fd_is_open, open_fd_count, read_exact_within, VirtualSerial};
use pretty_assertions::assert_eq;
use serial_port_manager::{
    BaudRate, DataBits, FlowControl, OpenError, Parity, PortManager, StopBits,
};
use serial_test::serial;
use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::time::{Duration, Instant};
use tempfile::{NamedTempFile, TempDir};

const SUPPORTED: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

#[test]
#[serial]
fn test_raw_policy_for_every_supported_rate() {
    let device = VirtualSerial::new();

    for baud in SUPPORTED {
        let port = PortManager::open(&device.path, baud)
            .unwrap_or_else(|e| panic!("open at {baud} failed: {e}"));
        let settings = port.line_settings().expect("tcgetattr on open handle");

        assert_eq!(settings.baud_rate, Some(BaudRate::try_from(baud).unwrap()));
        assert_eq!(settings.data_bits, DataBits::Eight);
        assert_eq!(settings.parity, Parity::None);
        assert_eq!(settings.stop_bits, StopBits::One);
        assert_ne!(settings.flow_control, FlowControl::Software);
        assert!(!settings.canonical, "canonical mode still on at {baud}");
        assert!(!settings.echo, "echo still on at {baud}");
        assert!(!settings.output_processing, "OPOST still on at {baud}");
        assert!(settings.is_raw());
        assert_eq!(port.baud_rate().as_u32(), baud);

        PortManager::close(Some(port));
    }
}

#[test]
#[serial]
fn test_unsupported_rate_leaves_no_descriptor() {
    let device = VirtualSerial::new();
    let before = open_fd_count();

    for baud in [0u32, 300, 4800, 14400, 230400, 1_000_000] {
        let result = PortManager::open(&device.path, baud);
        assert!(matches!(result, Err(OpenError::UnsupportedBaudRate(b)) if b == baud));
    }

    assert_eq!(open_fd_count(), before);
}

#[test]
#[serial]
fn test_missing_device_for_every_rate() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("ttyMissing0");

    for baud in SUPPORTED {
        match PortManager::open(&missing, baud) {
            Err(OpenError::DeviceUnavailable { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected DeviceUnavailable at {baud}, got {other:?}"),
        }
    }
}

#[test]
#[serial]
fn test_permission_denied_for_every_rate() {
    let file = NamedTempFile::new().unwrap();
    std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o000)).unwrap();
    let before = open_fd_count();

    for baud in SUPPORTED {
        // Root bypasses the mode bits; the node is still not a tty then.
        match PortManager::open(file.path(), baud) {
            Err(OpenError::DeviceUnavailable { .. })
            | Err(OpenError::ConfigurationReadFailed { .. }) => {}
            other => panic!("expected open to fail at {baud}, got {other:?}"),
        }
    }

    assert_eq!(open_fd_count(), before);
}

#[test]
#[serial]
fn test_non_tty_releases_descriptor() {
    let file = NamedTempFile::new().unwrap();
    let before = open_fd_count();

    let result = PortManager::open(file.path(), 115200);
    assert!(matches!(result, Err(OpenError::ConfigurationReadFailed { .. })));

    assert_eq!(open_fd_count(), before);
}

#[test]
#[serial]
fn test_close_releases_descriptor() {
    let device = VirtualSerial::new();
    let before = open_fd_count();

    let port = PortManager::open(&device.path, 57600).unwrap();
    let fd = port.as_raw_fd();
    assert!(fd_is_open(fd));

    PortManager::close(Some(port));

    assert!(!fd_is_open(fd));
    assert_eq!(open_fd_count(), before);
}

#[test]
#[serial]
fn test_close_raw_releases_descriptor() {
    let device = VirtualSerial::new();

    let fd = PortManager::open(&device.path, 9600).unwrap().into_raw_fd();
    assert!(fd_is_open(fd));

    PortManager::close_raw(fd);
    assert!(!fd_is_open(fd));
}

#[test]
#[serial]
fn test_close_invalid_handles_is_harmless() {
    let before = open_fd_count();

    PortManager::close(None);
    PortManager::close_raw(-1);
    PortManager::close_raw(i32::MIN);

    assert_eq!(open_fd_count(), before);
}

#[test]
#[serial]
fn test_second_close_behaves_like_invalid_handle() {
    let device = VirtualSerial::new();
    let port = PortManager::open(&device.path, 38400).unwrap();
    let fd = port.as_raw_fd();

    PortManager::close(Some(port));
    assert!(!fd_is_open(fd));

    // Already released: logged as invalid, no close(2) issued.
    PortManager::close_raw(fd);
    assert!(!fd_is_open(fd));
}

#[test]
#[serial]
fn test_end_to_end_loopback() {
    let mut device = VirtualSerial::new();
    let mut port = PortManager::open(&device.path, 115200).unwrap();

    let payload = b"\xfa\xfb\x06\x05\x01\x00\x00\x00\x0a\xf7";
    device.peer.write_all(payload).unwrap();
    device.peer.flush().unwrap();

    let received = read_exact_within(&mut port, payload.len(), Duration::from_secs(2));
    assert_eq!(received, payload.to_vec());

    // The handle is also writable; raw output reaches the peer unchanged.
    port.write_all(b"ACK\r\n").unwrap();
    let echoed = read_exact_within(&mut device.peer, 5, Duration::from_secs(2));
    assert_eq!(echoed, b"ACK\r\n".to_vec());

    let fd = port.as_raw_fd();
    PortManager::close(Some(port));

    let mut buf = [0u8; 8];
    let rc = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
    assert_eq!(rc, -1);
    assert_eq!(
        std::io::Error::last_os_error().raw_os_error(),
        Some(libc::EBADF)
    );
}

#[test]
#[serial]
fn test_inherited_input_translation_is_reported() {
    let mut device = VirtualSerial::new();
    device.set_input_flags(libc::ICRNL | libc::IXON);

    let mut port = PortManager::open(&device.path, 115200).unwrap();
    let settings = port.line_settings().unwrap();
    assert_eq!(settings.flow_control, FlowControl::None);
    assert!(settings.input_translation);
    assert!(settings.is_raw());

    // The raw policy leaves ICRNL alone, so CR still arrives as LF.
    device.peer.write_all(&[0xfa, 0x0d, 0xfb]).unwrap();
    let received = read_exact_within(&mut port, 3, Duration::from_secs(2));
    assert_eq!(received, vec![0xfa, 0x0a, 0xfb]);

    PortManager::close(Some(port));
}

#[test]
#[serial]
fn test_idle_read_returns_after_timer() {
    let device = VirtualSerial::new();
    let mut port = PortManager::open(&device.path, 19200).unwrap();

    let mut buf = [0u8; 16];
    let started = Instant::now();
    let n = port.read(&mut buf).unwrap();
    let elapsed = started.elapsed();

    assert_eq!(n, 0);
    assert!(elapsed >= Duration::from_millis(300), "returned after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "returned after {elapsed:?}");

    PortManager::close(Some(port));
}

#[test]
#[serial]
fn test_open_discards_stale_input() {
    let mut device = VirtualSerial::new();
    device.peer.write_all(b"stale").unwrap();
    device.peer.flush().unwrap();
    std::thread::sleep(Duration::from_millis(100));

    let mut port = PortManager::open(&device.path, 9600).unwrap();
    assert_eq!(port.bytes_to_read().unwrap(), 0);

    device.peer.write_all(b"fresh").unwrap();
    let received = read_exact_within(&mut port, 5, Duration::from_secs(2));
    assert_eq!(received, b"fresh".to_vec());

    PortManager::close(Some(port));
}

#[test]
#[serial]
fn test_clear_input_discards_pending_bytes() {
    let mut device = VirtualSerial::new();
    let mut port = PortManager::open(&device.path, 115200).unwrap();

    device.peer.write_all(b"noise").unwrap();
    device.peer.flush().unwrap();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(port.bytes_to_read().unwrap(), 5);

    port.clear_input().unwrap();
    assert_eq!(port.bytes_to_read().unwrap(), 0);

    let mut buf = [0u8; 8];
    assert_eq!(port.read(&mut buf).unwrap(), 0);

    PortManager::close(Some(port));
}

#[test]
#[serial]
fn test_handle_converts_to_file() {
    let mut device = VirtualSerial::new();
    let port = PortManager::open(&device.path, 57600).unwrap();
    let mut file: std::fs::File = port.into();

    device.peer.write_all(b"xyz").unwrap();
    let received = read_exact_within(&mut file, 3, Duration::from_secs(2));
    assert_eq!(received, b"xyz".to_vec());
}
