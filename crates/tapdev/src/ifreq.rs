//! Fixed-layout TUNSETIFF request.
//!
//! The kernel reads a `struct ifreq` whose first 18 bytes matter to the
//! TUN driver:
//!
//! | Offset | Size | Field | Encoding |
//! |--------|------|-------|----------|
//! | 0      | 16   | name  | ASCII, null padded |
//! | 16     | 2    | flags | little-endian `u16` |
//!
//! The remainder of the 40-byte `ifreq` is zero.

use crate::error::{Error, Result};
use crate::ifname::IFNAMSIZ;

/// Encoded request length.
pub const TUN_REQUEST_LEN: usize = 18;

/// Size of the kernel's `struct ifreq` on 64-bit Linux.
pub const IFREQ_LEN: usize = 40;

const NAME_OFFSET: usize = 0;
const FLAGS_OFFSET: usize = IFNAMSIZ;

/// A TUNSETIFF request or the kernel's reply to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunRequest {
    name: [u8; IFNAMSIZ],
    flags: u16,
}

impl TunRequest {
    /// Build a request for `name` with the raw `flags`.
    ///
    /// Names longer than 15 bytes are cut to their first 15 bytes so the
    /// last byte of the field stays null. An empty name asks the kernel
    /// to pick one.
    pub fn new(name: &str, flags: u16) -> Self {
        let mut field = [0u8; IFNAMSIZ];
        let bytes = name.as_bytes();
        let len = bytes.len().min(IFNAMSIZ - 1);
        field[..len].copy_from_slice(&bytes[..len]);
        Self { name: field, flags }
    }

    /// The raw 16-byte name field.
    pub fn name_bytes(&self) -> &[u8; IFNAMSIZ] {
        &self.name
    }

    /// The name up to the first null byte.
    pub fn name_str(&self) -> String {
        let len = self
            .name
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..len]).into_owned()
    }

    /// The raw flag field.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Encode into the 18-byte wire layout.
    pub fn encode(&self) -> [u8; TUN_REQUEST_LEN] {
        let mut out = [0u8; TUN_REQUEST_LEN];
        out[NAME_OFFSET..NAME_OFFSET + IFNAMSIZ].copy_from_slice(&self.name);
        out[FLAGS_OFFSET..FLAGS_OFFSET + 2].copy_from_slice(&self.flags.to_le_bytes());
        out
    }

    /// Decode from the wire layout. Bytes past the first 18 are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < TUN_REQUEST_LEN {
            return Err(Error::Truncated {
                expected: TUN_REQUEST_LEN,
                actual: buf.len(),
            });
        }

        let mut name = [0u8; IFNAMSIZ];
        name.copy_from_slice(&buf[NAME_OFFSET..NAME_OFFSET + IFNAMSIZ]);
        let flags = u16::from_le_bytes([buf[FLAGS_OFFSET], buf[FLAGS_OFFSET + 1]]);

        Ok(Self { name, flags })
    }

    /// Encode into a zeroed buffer the size of `struct ifreq`.
    pub fn to_ifreq_buf(&self) -> [u8; IFREQ_LEN] {
        let mut buf = [0u8; IFREQ_LEN];
        buf[..TUN_REQUEST_LEN].copy_from_slice(&self.encode());
        buf
    }

    /// Decode the kernel's reply from an `ifreq`-sized buffer.
    pub fn from_ifreq_buf(buf: &[u8; IFREQ_LEN]) -> Self {
        let mut name = [0u8; IFNAMSIZ];
        name.copy_from_slice(&buf[NAME_OFFSET..NAME_OFFSET + IFNAMSIZ]);
        let flags = u16::from_le_bytes([buf[FLAGS_OFFSET], buf[FLAGS_OFFSET + 1]]);
        Self { name, flags }
    }
}
