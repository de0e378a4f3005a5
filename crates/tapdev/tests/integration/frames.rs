//! Frame transport integration tests.
//!
//! Two TAP devices are enslaved to one bridge. A broadcast frame
//! written to one descriptor enters the bridge on that port and is
//! flooded out the other, where it is read back unchanged.

use std::thread::sleep;
use std::time::{Duration, Instant};

use tapdev::{Result, TapDevice};

use crate::common::{TestBridge, unique_name};

const ETHERTYPE_LOCAL_EXPERIMENTAL: u16 = 0x88b5;

fn test_frame(tag: u8) -> Vec<u8> {
    let mut frame = Vec::with_capacity(64);
    frame.extend_from_slice(&[0xff; 6]);
    frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, tag]);
    frame.extend_from_slice(&ETHERTYPE_LOCAL_EXPERIMENTAL.to_be_bytes());
    frame.extend((0..50u8).map(|i| i ^ tag));
    frame
}

/// Read frames until `expected` shows up; the kernel may queue
/// unrelated traffic (IPv6 router solicitations, MLD) first.
fn read_until(tap: &TapDevice, expected: &[u8], timeout: Duration) -> Result<bool> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        match tap.read(2048) {
            Ok(frame) if frame == expected => return Ok(true),
            Ok(_) => continue,
            Err(e) if e.is_would_block() => sleep(Duration::from_millis(10)),
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

fn bridged_pair() -> Result<(TestBridge, TapDevice, TapDevice)> {
    let bridge = TestBridge::new()?;
    let a = TapDevice::open(Some(&unique_name("tdf")), false)?;
    let b = TapDevice::open(Some(&unique_name("tdf")), false)?;

    for tap in [&a, &b] {
        bridge.attach(tap.name())?;
        tap.set_up()?;
    }

    Ok((bridge, a, b))
}

#[test]
fn test_frame_roundtrip_through_bridge() -> Result<()> {
    require_root!();

    let (_bridge, a, b) = bridged_pair()?;
    let frame = test_frame(0x11);

    // The port may still be coming up; retry the write until it is seen.
    let mut seen = false;
    for _ in 0..20 {
        assert_eq!(a.write(&frame)?, frame.len());
        if read_until(&b, &frame, Duration::from_millis(100))? {
            seen = true;
            break;
        }
    }
    assert!(seen, "frame written to {} never arrived on {}", a.name(), b.name());
    Ok(())
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_async_roundtrip() -> Result<()> {
    use tapdev::AsyncTapDevice;

    require_root!();

    let (_bridge, a, b) = bridged_pair()?;
    let a = AsyncTapDevice::new(a)?;
    let b = AsyncTapDevice::new(b)?;
    let frame = test_frame(0x33);

    let received = tokio::time::timeout(Duration::from_secs(5), async {
        let mut buf = [0u8; 2048];
        loop {
            a.write(&frame).await?;
            let n = b.read(&mut buf).await?;
            if buf[..n] == frame[..] {
                return Ok::<_, tapdev::Error>(true);
            }
        }
    })
    .await
    .unwrap_or(Ok(false))?;

    assert!(received, "frame never arrived on {}", b.name());
    Ok(())
}
