//! Linux TAP device handle.
//!
//! This crate opens `/dev/net/tun`, binds the descriptor to a TAP
//! interface (Ethernet frames, no packet information prefix) and exposes
//! frame-at-a-time read and write on it. The bound interface can be
//! configured (address, netmask, MTU, MAC, up/down) through the composed
//! [`InterfaceConfig`].
//!
//! # Features
//!
//! - `async` - [`AsyncTapDevice`] on top of tokio's `AsyncFd`
//! - `serde` - `Serialize` for [`TapInfo`] and [`Mode`]
//!
//! # Example
//!
//! ```ignore
//! use tapdev::TapDevice;
//!
//! // Let the kernel pick the name (tap0, tap1, ...)
//! let mut tap = TapDevice::open(None, true)?;
//! println!("Created device: {}", tap.name());
//!
//! tap.set_mtu(1400)?;
//! tap.set_up()?;
//!
//! let frame = tap.read(1514)?;
//! tap.write(&frame)?;
//! tap.close()?;
//! ```
//!
//! # Persistent devices
//!
//! ```ignore
//! use tapdev::TapDevice;
//!
//! let mut tap = TapDevice::builder()
//!     .name("mytap0")
//!     .owner(1000)
//!     .persistent(true)
//!     .open()?;
//! tap.close()?;
//!
//! // mytap0 still exists; remove it later with:
//! TapDevice::delete_by_name("mytap0")?;
//! ```

#[cfg(feature = "async")]
mod async_device;
mod device;
mod error;
pub mod iface;
pub mod ifname;
pub mod ifreq;
pub mod ioctl;

#[cfg(feature = "async")]
pub use async_device::AsyncTapDevice;
pub use device::{TapBuilder, TapDevice, TapInfo, list_devices};
pub use error::{Error, Result};
pub use iface::InterfaceConfig;
pub use ioctl::{Mode, TunIoctl, TunTapFlags};

/// The path to the TUN device.
pub const TUN_DEVICE_PATH: &str = "/dev/net/tun";
