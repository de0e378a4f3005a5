//! Device lifecycle integration tests.

use tapdev::ifname;
use tapdev::{Error, Result, TapDevice};

use crate::common::unique_name;

#[test]
fn test_explicit_name_is_echoed() -> Result<()> {
    require_root!();

    let name = unique_name("tdt");
    let mut tap = TapDevice::open(Some(&name), true)?;

    assert_eq!(tap.name(), name);
    assert_eq!(tap.interface().name(), name);
    assert!(tap.is_blocking());
    assert!(!tap.is_persistent());
    assert!(tap.as_raw_fd() >= 0);
    assert!(ifname::exists(&name));

    tap.close()?;
    Ok(())
}

#[test]
fn test_fifteen_byte_name() -> Result<()> {
    require_root!();

    let name = format!("{:x<15}", unique_name("t"));
    assert_eq!(name.len(), 15);

    let tap = TapDevice::open(Some(&name), true)?;
    assert_eq!(tap.name(), name);
    Ok(())
}

#[test]
fn test_kernel_assigned_name() -> Result<()> {
    require_root!();

    let tap = TapDevice::open(None, true)?;
    assert!(
        ifname::is_tap_autoname(tap.name()),
        "unexpected name {}",
        tap.name()
    );

    let empty = TapDevice::open(Some(""), true)?;
    assert!(ifname::is_tap_autoname(empty.name()));
    assert_ne!(tap.name(), empty.name());
    Ok(())
}

#[test]
fn test_name_too_long_is_rejected() -> Result<()> {
    let err = TapDevice::open(Some("tdt_name_longer_than_15"), true).unwrap_err();
    assert!(matches!(err, Error::NameTooLong { len: 23, .. }));
    Ok(())
}

#[test]
fn test_nonblocking_read_would_block() -> Result<()> {
    require_root!();

    let name = unique_name("tdt");
    let tap = TapDevice::open(Some(&name), false)?;
    assert!(!tap.is_blocking());
    assert!(tap.is_nonblocking()?);

    // The interface is down, so nothing is queued.
    let err = tap.read(1514).unwrap_err();
    assert!(err.is_would_block(), "expected WouldBlock, got {err}");
    Ok(())
}

#[test]
fn test_switch_blocking_mode() -> Result<()> {
    require_root!();

    let mut tap = TapDevice::open(Some(&unique_name("tdt")), true)?;
    assert!(!tap.is_nonblocking()?);

    tap.set_nonblocking(true)?;
    assert!(tap.is_nonblocking()?);
    assert!(!tap.is_blocking());
    assert!(tap.read(64).unwrap_err().is_would_block());
    Ok(())
}

#[test]
fn test_io_after_close_fails() -> Result<()> {
    require_root!();

    let mut tap = TapDevice::open(Some(&unique_name("tdt")), false)?;
    tap.close()?;

    assert!(tap.is_closed());
    assert_eq!(tap.as_raw_fd(), -1);
    assert!(tap.read(64).unwrap_err().is_bad_descriptor());
    assert!(tap.write(&[0u8; 60]).unwrap_err().is_bad_descriptor());
    assert!(tap.persist().unwrap_err().is_bad_descriptor());

    // Second close is an error, not a close(2) on a reused number.
    assert!(tap.close().unwrap_err().is_bad_descriptor());
    Ok(())
}

#[test]
fn test_close_removes_interface() -> Result<()> {
    require_root!();

    let name = unique_name("tdt");
    let mut tap = TapDevice::open(Some(&name), true)?;
    assert!(ifname::exists(&name));

    tap.close()?;
    assert!(!ifname::exists(&name));
    Ok(())
}

#[test]
fn test_drop_closes_descriptor() -> Result<()> {
    require_root!();

    let name = unique_name("tdt");
    {
        let _tap = TapDevice::open(Some(&name), true)?;
        assert!(ifname::exists(&name));
    }
    assert!(!ifname::exists(&name));
    Ok(())
}

/// Descriptors in this process that refer to the tun control device.
fn open_tun_descriptors() -> Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir("/proc/self/fd")? {
        let target = std::fs::read_link(entry?.path());
        if target.is_ok_and(|t| t == std::path::Path::new(tapdev::TUN_DEVICE_PATH)) {
            count += 1;
        }
    }
    Ok(count)
}

#[test]
fn test_failed_open_closes_descriptor() -> Result<()> {
    require_root!();

    // Other tests in this binary hold tun descriptors concurrently, so
    // only a leak proportional to the attempts counts as a failure.
    const ATTEMPTS: usize = 64;
    let before = open_tun_descriptors()?;

    for _ in 0..ATTEMPTS {
        // "lo" exists but is not a tun/tap device, so TUNSETIFF fails.
        let err = TapDevice::open(Some("lo"), true).unwrap_err();
        assert!(matches!(err, Error::Ioctl { name: "TUNSETIFF", .. }), "{err:?}");
    }

    let after = open_tun_descriptors()?;
    assert!(
        after < before + ATTEMPTS / 2,
        "tun descriptors grew from {before} to {after}"
    );
    Ok(())
}

#[test]
fn test_owner_and_group() -> Result<()> {
    require_root!();

    let name = unique_name("tdt");
    let tap = TapDevice::builder()
        .name(&name)
        .owner(1000)
        .group(1000)
        .open()?;

    let info = tapdev::list_devices()?
        .into_iter()
        .find(|d| d.name == name)
        .expect("device should be listed");
    assert_eq!(info.owner, Some(1000));
    assert_eq!(info.group, Some(1000));

    tap.set_owner(0)?;
    Ok(())
}
