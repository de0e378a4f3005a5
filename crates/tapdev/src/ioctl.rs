//! TUN/TAP control codes and request flags (from linux/if_tun.h).

/// TUNSETIFF request flags.
pub mod tun_flags {
    /// TUN device (Layer 3).
    pub const TUN: u16 = 0x0001;
    /// TAP device (Layer 2).
    pub const TAP: u16 = 0x0002;
    /// No packet information prefix.
    pub const NO_PI: u16 = 0x1000;
    /// Single queue.
    pub const ONE_QUEUE: u16 = 0x2000;
}

/// Control requests understood by a `/dev/net/tun` descriptor.
///
/// The values are the x86/arm `_IOW('T', n, int)` encodings; other
/// architectures are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TunIoctl {
    /// Disable checksum offload.
    SetNoCsum,
    /// Toggle driver debug output.
    SetDebug,
    /// Bind the descriptor to an interface.
    SetIff,
    /// Keep the interface after the descriptor closes.
    SetPersist,
    /// Set the owning uid.
    SetOwner,
    /// Set the link type (ARPHRD_*).
    SetLink,
    /// Set the owning gid.
    SetGroup,
}

impl TunIoctl {
    /// Every control request, in code order.
    pub const ALL: [TunIoctl; 7] = [
        TunIoctl::SetNoCsum,
        TunIoctl::SetDebug,
        TunIoctl::SetIff,
        TunIoctl::SetPersist,
        TunIoctl::SetOwner,
        TunIoctl::SetLink,
        TunIoctl::SetGroup,
    ];

    /// The numeric request code passed to `ioctl(2)`.
    pub const fn code(self) -> libc::c_ulong {
        match self {
            TunIoctl::SetNoCsum => 0x400454c8,
            TunIoctl::SetDebug => 0x400454c9,
            TunIoctl::SetIff => 0x400454ca,
            TunIoctl::SetPersist => 0x400454cb,
            TunIoctl::SetOwner => 0x400454cc,
            TunIoctl::SetLink => 0x400454cd,
            TunIoctl::SetGroup => 0x400454ce,
        }
    }

    /// The kernel header name of the request.
    pub const fn name(self) -> &'static str {
        match self {
            TunIoctl::SetNoCsum => "TUNSETNOCSUM",
            TunIoctl::SetDebug => "TUNSETDEBUG",
            TunIoctl::SetIff => "TUNSETIFF",
            TunIoctl::SetPersist => "TUNSETPERSIST",
            TunIoctl::SetOwner => "TUNSETOWNER",
            TunIoctl::SetLink => "TUNSETLINK",
            TunIoctl::SetGroup => "TUNSETGROUP",
        }
    }
}

/// Device mode (TUN or TAP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// TUN device - operates at Layer 3 (IP packets).
    Tun,
    /// TAP device - operates at Layer 2 (Ethernet frames).
    Tap,
}

impl Mode {
    /// Get the mode name.
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Tun => "tun",
            Mode::Tap => "tap",
        }
    }
}

/// Boolean view of the TUNSETIFF flag field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TunTapFlags {
    /// Layer 3 device.
    pub tun: bool,
    /// Layer 2 device.
    pub tap: bool,
    /// Don't include protocol info header.
    pub no_pi: bool,
    /// Use single queue (for backwards compatibility).
    pub one_queue: bool,
}

impl TunTapFlags {
    /// Flags for a TAP device without the packet information prefix.
    pub fn tap_no_pi() -> Self {
        Self {
            tap: true,
            no_pi: true,
            ..Default::default()
        }
    }

    /// Create flags from a raw value. Unknown bits are dropped.
    pub fn from_raw(flags: u16) -> Self {
        Self {
            tun: flags & tun_flags::TUN != 0,
            tap: flags & tun_flags::TAP != 0,
            no_pi: flags & tun_flags::NO_PI != 0,
            one_queue: flags & tun_flags::ONE_QUEUE != 0,
        }
    }

    /// Convert flags to the raw value.
    pub fn to_raw(self) -> u16 {
        let mut flags = 0u16;
        if self.tun {
            flags |= tun_flags::TUN;
        }
        if self.tap {
            flags |= tun_flags::TAP;
        }
        if self.no_pi {
            flags |= tun_flags::NO_PI;
        }
        if self.one_queue {
            flags |= tun_flags::ONE_QUEUE;
        }
        flags
    }

    /// The device mode these flags select, if exactly one is set.
    pub fn mode(self) -> Option<Mode> {
        match (self.tun, self.tap) {
            (true, false) => Some(Mode::Tun),
            (false, true) => Some(Mode::Tap),
            _ => None,
        }
    }
}
