//! Per-interface configuration through SIOC* ioctls.
//!
//! [`InterfaceConfig`] targets one interface by name and talks to the
//! kernel through a short-lived `AF_INET` datagram socket. It holds no
//! cached state: every getter is a fresh query.
//!
//! ```ignore
//! use tapdev::InterfaceConfig;
//! use std::net::Ipv4Addr;
//!
//! let cfg = InterfaceConfig::new("tap0")?;
//! cfg.set_ipv4_addr(Ipv4Addr::new(10, 0, 0, 1))?;
//! cfg.set_prefix_len(24)?;
//! cfg.set_mtu(1400)?;
//! cfg.set_up()?;
//! ```

use std::io;
use std::net::Ipv4Addr;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use tracing::debug;

use crate::error::{Error, Result};
use crate::ifname;

// Socket ioctls (from linux/sockios.h)
const SIOCGIFFLAGS: libc::c_ulong = 0x8913;
const SIOCSIFFLAGS: libc::c_ulong = 0x8914;
const SIOCGIFADDR: libc::c_ulong = 0x8915;
const SIOCSIFADDR: libc::c_ulong = 0x8916;
const SIOCGIFNETMASK: libc::c_ulong = 0x891b;
const SIOCSIFNETMASK: libc::c_ulong = 0x891c;
const SIOCGIFMTU: libc::c_ulong = 0x8921;
const SIOCSIFMTU: libc::c_ulong = 0x8922;
const SIOCSIFHWADDR: libc::c_ulong = 0x8924;
const SIOCGIFHWADDR: libc::c_ulong = 0x8927;
const SIOCGIFINDEX: libc::c_ulong = 0x8933;

const ARPHRD_ETHER: libc::sa_family_t = 1;

/// Interface flag bits returned by [`InterfaceConfig::flags`].
pub mod iff {
    pub const UP: u16 = 1 << 0;
    pub const BROADCAST: u16 = 1 << 1;
    pub const LOOPBACK: u16 = 1 << 3;
    pub const POINTOPOINT: u16 = 1 << 4;
    pub const RUNNING: u16 = 1 << 6;
    pub const NOARP: u16 = 1 << 7;
    pub const PROMISC: u16 = 1 << 8;
    pub const MULTICAST: u16 = 1 << 12;
}

/// Configuration handle for a named network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceConfig {
    name: String,
}

impl InterfaceConfig {
    /// Target the interface called `name`.
    ///
    /// Only the name is validated; the interface need not exist yet.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        ifname::validate(&name)?;
        Ok(Self { name })
    }

    /// The interface name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interface index.
    pub fn index(&self) -> Result<u32> {
        let mut req = self.request();
        self.ioctl("SIOCGIFINDEX", SIOCGIFINDEX, &mut req)?;
        Ok(unsafe { req.ifr_ifru.ifru_ifindex } as u32)
    }

    /// Raw interface flags (see [`iff`]).
    pub fn flags(&self) -> Result<u16> {
        let mut req = self.request();
        self.ioctl("SIOCGIFFLAGS", SIOCGIFFLAGS, &mut req)?;
        Ok(unsafe { req.ifr_ifru.ifru_flags } as u16)
    }

    /// Check whether the interface is administratively up.
    pub fn is_up(&self) -> Result<bool> {
        Ok(self.flags()? & iff::UP != 0)
    }

    /// Bring the interface up.
    pub fn set_up(&self) -> Result<()> {
        self.update_flags(iff::UP, 0)
    }

    /// Bring the interface down.
    pub fn set_down(&self) -> Result<()> {
        self.update_flags(0, iff::UP)
    }

    /// Set and clear flag bits in one read-modify-write.
    pub fn update_flags(&self, set: u16, clear: u16) -> Result<()> {
        let mut req = self.request();
        self.ioctl("SIOCGIFFLAGS", SIOCGIFFLAGS, &mut req)?;

        let flags = (unsafe { req.ifr_ifru.ifru_flags } as u16 | set) & !clear;
        req.ifr_ifru.ifru_flags = flags as libc::c_short;
        self.ioctl("SIOCSIFFLAGS", SIOCSIFFLAGS, &mut req)?;

        debug!(iface = %self.name, flags, "updated flags");
        Ok(())
    }

    /// Maximum transmission unit.
    pub fn mtu(&self) -> Result<u32> {
        let mut req = self.request();
        self.ioctl("SIOCGIFMTU", SIOCGIFMTU, &mut req)?;

        let mtu = unsafe { req.ifr_ifru.ifru_mtu };
        u32::try_from(mtu).map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "unexpected negative MTU",
            ))
        })
    }

    /// Set the maximum transmission unit.
    pub fn set_mtu(&self, mtu: u32) -> Result<()> {
        let value = libc::c_int::try_from(mtu)
            .map_err(|_| Error::Io(io::Error::new(io::ErrorKind::InvalidInput, "MTU too large")))?;

        let mut req = self.request();
        req.ifr_ifru.ifru_mtu = value;
        self.ioctl("SIOCSIFMTU", SIOCSIFMTU, &mut req)?;

        debug!(iface = %self.name, mtu, "set MTU");
        Ok(())
    }

    /// Primary IPv4 address, or `None` if none is assigned.
    pub fn ipv4_addr(&self) -> Result<Option<Ipv4Addr>> {
        let mut req = self.request();
        match self.ioctl("SIOCGIFADDR", SIOCGIFADDR, &mut req) {
            Ok(()) => {}
            Err(e) if e.errno() == Some(libc::EADDRNOTAVAIL) => return Ok(None),
            Err(e) => return Err(e),
        }
        read_sockaddr_in(unsafe { &req.ifr_ifru.ifru_addr }).map(Some)
    }

    /// Set the primary IPv4 address.
    pub fn set_ipv4_addr(&self, addr: Ipv4Addr) -> Result<()> {
        let mut req = self.request();
        req.ifr_ifru.ifru_addr = sockaddr_in(addr);
        self.ioctl("SIOCSIFADDR", SIOCSIFADDR, &mut req)?;

        debug!(iface = %self.name, %addr, "set IPv4 address");
        Ok(())
    }

    /// Netmask of the primary IPv4 address, or `None` if no address.
    pub fn netmask(&self) -> Result<Option<Ipv4Addr>> {
        let mut req = self.request();
        match self.ioctl("SIOCGIFNETMASK", SIOCGIFNETMASK, &mut req) {
            Ok(()) => {}
            Err(e) if e.errno() == Some(libc::EADDRNOTAVAIL) => return Ok(None),
            Err(e) => return Err(e),
        }
        read_sockaddr_in(unsafe { &req.ifr_ifru.ifru_netmask }).map(Some)
    }

    /// Set the netmask of the primary IPv4 address.
    pub fn set_netmask(&self, mask: Ipv4Addr) -> Result<()> {
        let mut req = self.request();
        req.ifr_ifru.ifru_netmask = sockaddr_in(mask);
        self.ioctl("SIOCSIFNETMASK", SIOCSIFNETMASK, &mut req)?;

        debug!(iface = %self.name, %mask, "set netmask");
        Ok(())
    }

    /// Set the netmask from a prefix length (0-32).
    pub fn set_prefix_len(&self, prefix_len: u8) -> Result<()> {
        self.set_netmask(prefix_to_netmask(prefix_len)?)
    }

    /// Hardware (MAC) address.
    pub fn mac_addr(&self) -> Result<[u8; 6]> {
        let mut req = self.request();
        self.ioctl("SIOCGIFHWADDR", SIOCGIFHWADDR, &mut req)?;

        let data = unsafe { req.ifr_ifru.ifru_hwaddr.sa_data };
        let mut mac = [0u8; 6];
        for (dst, src) in mac.iter_mut().zip(data.iter()) {
            *dst = *src as u8;
        }
        Ok(mac)
    }

    /// Set the hardware (MAC) address. The interface usually has to be down.
    pub fn set_mac_addr(&self, mac: [u8; 6]) -> Result<()> {
        let mut hwaddr: libc::sockaddr = unsafe { std::mem::zeroed() };
        hwaddr.sa_family = ARPHRD_ETHER;
        for (dst, src) in hwaddr.sa_data.iter_mut().zip(mac.iter()) {
            *dst = *src as libc::c_char;
        }

        let mut req = self.request();
        req.ifr_ifru.ifru_hwaddr = hwaddr;
        self.ioctl("SIOCSIFHWADDR", SIOCSIFHWADDR, &mut req)?;

        debug!(iface = %self.name, mac = %format_mac(&mac), "set MAC address");
        Ok(())
    }

    fn request(&self) -> libc::ifreq {
        let mut req: libc::ifreq = unsafe { std::mem::zeroed() };
        // The name was validated to leave room for the null terminator.
        for (dst, src) in req.ifr_name.iter_mut().zip(self.name.as_bytes()) {
            *dst = *src as libc::c_char;
        }
        req
    }

    fn ioctl(&self, name: &'static str, code: libc::c_ulong, req: &mut libc::ifreq) -> Result<()> {
        let sock = control_socket()?;
        let ret = unsafe { libc::ioctl(sock.as_raw_fd(), code, req as *mut libc::ifreq) };
        if ret < 0 {
            return Err(Error::last_ioctl(name));
        }
        Ok(())
    }
}

fn control_socket() -> Result<OwnedFd> {
    let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, 0) };
    if fd < 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

fn sockaddr_in(addr: Ipv4Addr) -> libc::sockaddr {
    let sin = libc::sockaddr_in {
        sin_family: libc::AF_INET as libc::sa_family_t,
        sin_port: 0,
        sin_addr: libc::in_addr {
            s_addr: u32::from(addr).to_be(),
        },
        sin_zero: [0; 8],
    };
    // sockaddr and sockaddr_in are both 16 bytes.
    unsafe { std::mem::transmute::<libc::sockaddr_in, libc::sockaddr>(sin) }
}

fn read_sockaddr_in(sa: &libc::sockaddr) -> Result<Ipv4Addr> {
    if sa.sa_family != libc::AF_INET as libc::sa_family_t {
        return Err(Error::InvalidAddress(format!(
            "address family {} is not AF_INET",
            sa.sa_family
        )));
    }
    let sin = unsafe {
        std::ptr::read_unaligned(sa as *const libc::sockaddr as *const libc::sockaddr_in)
    };
    Ok(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)))
}

/// Convert a prefix length to a dotted netmask.
pub fn prefix_to_netmask(prefix_len: u8) -> Result<Ipv4Addr> {
    if prefix_len > 32 {
        return Err(Error::InvalidAddress(format!(
            "prefix length {prefix_len} exceeds 32"
        )));
    }
    let bits = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
    Ok(Ipv4Addr::from(bits))
}

/// Format a MAC address as colon-separated hex.
pub fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
