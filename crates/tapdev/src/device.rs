//! TAP device implementation.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::net::Ipv4Addr;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};

use tracing::{debug, trace};

use super::TUN_DEVICE_PATH;
use super::error::{Error, Result};
use super::iface::InterfaceConfig;
use super::ifname;
use super::ifreq::TunRequest;
use super::ioctl::{Mode, TunIoctl, TunTapFlags, tun_flags};

/// Builder for opening TAP devices.
#[derive(Debug, Clone)]
pub struct TapBuilder {
    name: Option<String>,
    blocking: bool,
    one_queue: bool,
    owner: Option<u32>,
    group: Option<u32>,
    link_type: Option<u32>,
    debug: bool,
    persistent: bool,
}

impl TapBuilder {
    /// Create a new builder for a blocking, kernel-named device.
    pub fn new() -> Self {
        Self {
            name: None,
            blocking: true,
            one_queue: false,
            owner: None,
            group: None,
            link_type: None,
            debug: false,
            persistent: false,
        }
    }

    /// Set the device name.
    ///
    /// If not specified (or empty), the kernel will assign `tap0`, `tap1`, ...
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Choose blocking (default) or non-blocking reads and writes.
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Use single queue (for backwards compatibility).
    pub fn one_queue(mut self, value: bool) -> Self {
        self.one_queue = value;
        self
    }

    /// Set the owner UID.
    pub fn owner(mut self, uid: u32) -> Self {
        self.owner = Some(uid);
        self
    }

    /// Set the group GID.
    pub fn group(mut self, gid: u32) -> Self {
        self.group = Some(gid);
        self
    }

    /// Set the link type (an `ARPHRD_*` value).
    pub fn link_type(mut self, link_type: u32) -> Self {
        self.link_type = Some(link_type);
        self
    }

    /// Enable driver debug output.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Make the device persistent (survives close).
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Open `/dev/net/tun` and bind it to the TAP interface.
    ///
    /// If any configuration request fails, the descriptor is closed
    /// before the error is returned.
    pub fn open(self) -> Result<TapDevice> {
        let requested = self.name.unwrap_or_default();
        if !requested.is_empty() {
            ifname::validate(&requested)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(if self.blocking { 0 } else { libc::O_NONBLOCK })
            .open(TUN_DEVICE_PATH)
            .map_err(|source| Error::Open {
                path: TUN_DEVICE_PATH,
                source,
            })?;
        let fd = file.as_raw_fd();

        let flags = TunTapFlags {
            one_queue: self.one_queue,
            ..TunTapFlags::tap_no_pi()
        };
        let mut ifr = TunRequest::new(&requested, flags.to_raw()).to_ifreq_buf();

        // Create or attach the interface
        let ret = unsafe { libc::ioctl(fd, TunIoctl::SetIff.code(), ifr.as_mut_ptr()) };
        if ret < 0 {
            return Err(Error::last_ioctl(TunIoctl::SetIff.name()));
        }
        let name = TunRequest::from_ifreq_buf(&ifr).name_str();

        tun_ioctl(fd, TunIoctl::SetNoCsum, 1)?;

        if let Some(uid) = self.owner {
            tun_ioctl(fd, TunIoctl::SetOwner, uid as libc::c_ulong)?;
        }
        if let Some(gid) = self.group {
            tun_ioctl(fd, TunIoctl::SetGroup, gid as libc::c_ulong)?;
        }
        if let Some(link_type) = self.link_type {
            tun_ioctl(fd, TunIoctl::SetLink, link_type as libc::c_ulong)?;
        }
        if self.debug {
            tun_ioctl(fd, TunIoctl::SetDebug, 1)?;
        }
        if self.persistent {
            tun_ioctl(fd, TunIoctl::SetPersist, 1)?;
        }

        let interface = InterfaceConfig::new(name.clone())?;
        debug!(
            name = %name,
            blocking = self.blocking,
            persistent = self.persistent,
            "bound tap device"
        );

        Ok(TapDevice {
            file: Some(file),
            name,
            blocking: self.blocking,
            persistent: self.persistent,
            interface,
        })
    }
}

impl Default for TapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A TAP device: one descriptor on `/dev/net/tun` bound to one interface.
///
/// Frames are exchanged without the packet information prefix, so each
/// read returns one Ethernet frame and each write submits one.
#[derive(Debug)]
pub struct TapDevice {
    file: Option<File>,
    name: String,
    blocking: bool,
    persistent: bool,
    interface: InterfaceConfig,
}

impl TapDevice {
    /// Create a new builder.
    pub fn builder() -> TapBuilder {
        TapBuilder::new()
    }

    /// Open a TAP device.
    ///
    /// With `name` of `None` (or `Some("")`) the kernel picks the name.
    pub fn open(name: Option<&str>, blocking: bool) -> Result<Self> {
        let mut builder = TapBuilder::new().blocking(blocking);
        if let Some(name) = name {
            builder = builder.name(name);
        }
        builder.open()
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the device was opened in blocking mode.
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Check if the device is persistent.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// The configuration handle for the bound interface.
    pub fn interface(&self) -> &InterfaceConfig {
        &self.interface
    }

    /// Keep the interface after the descriptor is closed.
    pub fn persist(&mut self) -> Result<()> {
        self.set_persistent(true)
    }

    /// Remove the interface when the descriptor is closed.
    pub fn unpersist(&mut self) -> Result<()> {
        self.set_persistent(false)
    }

    /// Set or clear persistence.
    pub fn set_persistent(&mut self, persistent: bool) -> Result<()> {
        tun_ioctl(self.fd()?, TunIoctl::SetPersist, persistent as libc::c_ulong)?;
        self.persistent = persistent;
        debug!(name = %self.name, persistent, "set persistence");
        Ok(())
    }

    /// Set the owner UID.
    pub fn set_owner(&self, uid: u32) -> Result<()> {
        tun_ioctl(self.fd()?, TunIoctl::SetOwner, uid as libc::c_ulong)
    }

    /// Set the group GID.
    pub fn set_group(&self, gid: u32) -> Result<()> {
        tun_ioctl(self.fd()?, TunIoctl::SetGroup, gid as libc::c_ulong)
    }

    /// Set the link type (an `ARPHRD_*` value). The interface must be down.
    pub fn set_link_type(&self, link_type: u32) -> Result<()> {
        tun_ioctl(self.fd()?, TunIoctl::SetLink, link_type as libc::c_ulong)
    }

    /// Toggle driver debug output.
    pub fn set_debug(&self, debug: bool) -> Result<()> {
        tun_ioctl(self.fd()?, TunIoctl::SetDebug, debug as libc::c_ulong)
    }

    /// Check whether `O_NONBLOCK` is currently set on the descriptor.
    pub fn is_nonblocking(&self) -> Result<bool> {
        let flags = unsafe { libc::fcntl(self.fd()?, libc::F_GETFL) };
        if flags < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        Ok(flags & libc::O_NONBLOCK != 0)
    }

    /// Set or clear `O_NONBLOCK` on the descriptor.
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> Result<()> {
        let fd = self.fd()?;
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }

        let flags = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };
        if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }

        self.blocking = !nonblocking;
        Ok(())
    }

    /// Get the raw file descriptor, or -1 once closed.
    pub fn as_raw_fd(&self) -> RawFd {
        self.file.as_ref().map_or(-1, |f| f.as_raw_fd())
    }

    /// Read up to `n` bytes (one frame, possibly truncated to `n`).
    ///
    /// An empty result means end of stream.
    pub fn read(&self, n: usize) -> Result<Vec<u8>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; n];
        let len = self.read_into(&mut buf)?;
        buf.truncate(len);
        Ok(buf)
    }

    /// Read one frame into `buf`.
    pub fn read_into(&self, buf: &mut [u8]) -> Result<usize> {
        let mut file = self.file()?;
        let len = file.read(buf).map_err(Error::from_io)?;
        trace!(name = %self.name, len, "read frame");
        Ok(len)
    }

    /// Write one Ethernet frame. Returns the number of bytes accepted.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        let mut file = self.file()?;
        let len = file.write(data).map_err(Error::from_io)?;
        trace!(name = %self.name, len, "wrote frame");
        Ok(len)
    }

    /// Close the descriptor.
    ///
    /// Closing twice fails with `EBADF`, as do reads and writes after close.
    pub fn close(&mut self) -> Result<()> {
        let file = self.file.take().ok_or_else(bad_descriptor)?;
        let fd = file.into_raw_fd();
        if unsafe { libc::close(fd) } < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        debug!(name = %self.name, persistent = self.persistent, "closed tap device");
        Ok(())
    }

    /// Check whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Interface index.
    pub fn index(&self) -> Result<u32> {
        self.interface.index()
    }

    /// Check whether the interface is up.
    pub fn is_up(&self) -> Result<bool> {
        self.interface.is_up()
    }

    /// Bring the interface up.
    pub fn set_up(&self) -> Result<()> {
        self.interface.set_up()
    }

    /// Bring the interface down.
    pub fn set_down(&self) -> Result<()> {
        self.interface.set_down()
    }

    /// Interface MTU.
    pub fn mtu(&self) -> Result<u32> {
        self.interface.mtu()
    }

    /// Set the interface MTU.
    pub fn set_mtu(&self, mtu: u32) -> Result<()> {
        self.interface.set_mtu(mtu)
    }

    /// Primary IPv4 address of the interface.
    pub fn ipv4_addr(&self) -> Result<Option<Ipv4Addr>> {
        self.interface.ipv4_addr()
    }

    /// Set the primary IPv4 address of the interface.
    pub fn set_ipv4_addr(&self, addr: Ipv4Addr) -> Result<()> {
        self.interface.set_ipv4_addr(addr)
    }

    /// Netmask of the primary IPv4 address.
    pub fn netmask(&self) -> Result<Option<Ipv4Addr>> {
        self.interface.netmask()
    }

    /// Set the netmask of the primary IPv4 address.
    pub fn set_netmask(&self, mask: Ipv4Addr) -> Result<()> {
        self.interface.set_netmask(mask)
    }

    /// Interface MAC address.
    pub fn mac_addr(&self) -> Result<[u8; 6]> {
        self.interface.mac_addr()
    }

    /// Set the interface MAC address.
    pub fn set_mac_addr(&self, mac: [u8; 6]) -> Result<()> {
        self.interface.set_mac_addr(mac)
    }

    /// Delete a persistent TAP device by name.
    pub fn delete_by_name(name: &str) -> Result<()> {
        let mut device = TapBuilder::new().name(name).open()?;
        device.unpersist()?;
        device.close()
    }

    fn fd(&self) -> Result<RawFd> {
        self.file
            .as_ref()
            .map(|f| f.as_raw_fd())
            .ok_or_else(bad_descriptor)
    }

    fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or_else(bad_descriptor)
    }
}

impl Read for TapDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_into(buf).map_err(Into::into)
    }
}

impl Write for TapDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        TapDevice::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsRawFd for TapDevice {
    fn as_raw_fd(&self) -> RawFd {
        TapDevice::as_raw_fd(self)
    }
}

fn bad_descriptor() -> Error {
    Error::Io(io::Error::from_raw_os_error(libc::EBADF))
}

/// Issue a TUN control request whose argument is passed by value.
fn tun_ioctl(fd: RawFd, request: TunIoctl, value: libc::c_ulong) -> Result<()> {
    let ret = unsafe { libc::ioctl(fd, request.code(), value) };
    if ret < 0 {
        return Err(Error::last_ioctl(request.name()));
    }
    Ok(())
}

/// List existing TUN/TAP devices.
///
/// This reads from /sys/class/net to find devices with the tun driver.
pub fn list_devices() -> Result<Vec<TapInfo>> {
    let mut devices = Vec::new();

    let dir = match std::fs::read_dir("/sys/class/net") {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(devices),
        Err(e) => return Err(e.into()),
    };

    for entry in dir {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();

        // Only tun-driver devices have tun_flags
        let Ok(flags_str) = std::fs::read_to_string(entry.path().join("tun_flags")) else {
            continue;
        };
        let Some(flags) = parse_tun_flags(&flags_str) else {
            continue;
        };
        let Some(mode) = TunTapFlags::from_raw(flags).mode() else {
            continue;
        };

        let owner = read_id(&entry.path().join("owner"));
        let group = read_id(&entry.path().join("group"));

        devices.push(TapInfo {
            name,
            mode,
            owner,
            group,
            flags,
        });
    }

    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}

/// sysfs prints tun_flags as `0x%x`.
fn parse_tun_flags(s: &str) -> Option<u16> {
    let s = s.trim();
    match s.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// sysfs prints -1 for an unset owner or group.
fn read_id(path: &std::path::Path) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|id| u32::try_from(id).ok())
}

/// Information about a TUN/TAP device.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TapInfo {
    /// Device name.
    pub name: String,
    /// Device mode.
    pub mode: Mode,
    /// Owner UID.
    pub owner: Option<u32>,
    /// Group GID.
    pub group: Option<u32>,
    /// Raw TUNSETIFF flags.
    pub flags: u16,
}

impl TapInfo {
    /// Check if the device has no protocol info.
    pub fn no_pi(&self) -> bool {
        self.flags & tun_flags::NO_PI != 0
    }

    /// Check if the device uses a single queue.
    pub fn one_queue(&self) -> bool {
        self.flags & tun_flags::ONE_QUEUE != 0
    }
}
