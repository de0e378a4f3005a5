//! Error types for TAP device operations.

use std::io;

/// Result type for TAP device operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during TAP device operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The TUN/TAP control device could not be opened.
    #[error("cannot open {path}")]
    Open {
        /// The path that failed to open.
        path: &'static str,
        /// The underlying error.
        source: io::Error,
    },

    /// The kernel rejected a configuration request.
    #[error("ioctl {name} failed")]
    Ioctl {
        /// The ioctl name.
        name: &'static str,
        /// The underlying error.
        source: io::Error,
    },

    /// I/O error on the device descriptor.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Non-blocking operation has nothing to do right now.
    #[error("operation would block")]
    WouldBlock,

    /// Device name too long (max 15 bytes).
    #[error("device name too long: {name} ({len} > 15 bytes)")]
    NameTooLong {
        /// The name that was too long.
        name: String,
        /// The length of the name in bytes.
        len: usize,
    },

    /// Invalid device name.
    #[error("invalid device name: {0}")]
    InvalidName(String),

    /// Interface not found.
    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    /// Address that can't be expressed as (or wasn't returned as) IPv4.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Request buffer shorter than the fixed layout.
    #[error("request truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
}

impl Error {
    /// Create an ioctl error.
    pub fn ioctl(name: &'static str, source: io::Error) -> Self {
        Error::Ioctl { name, source }
    }

    /// Create an ioctl error from the current `errno`.
    pub(crate) fn last_ioctl(name: &'static str) -> Self {
        Error::ioctl(name, io::Error::last_os_error())
    }

    /// Classify an I/O error from a read or write.
    pub(crate) fn from_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::WouldBlock {
            Error::WouldBlock
        } else {
            Error::Io(err)
        }
    }

    /// The OS error code carried by this error, if any.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Error::Open { source, .. } | Error::Ioctl { source, .. } | Error::Io(source) => {
                source.raw_os_error()
            }
            Error::WouldBlock => Some(libc::EAGAIN),
            _ => None,
        }
    }

    /// Check if this is a "would block" condition.
    pub fn is_would_block(&self) -> bool {
        matches!(self, Error::WouldBlock)
    }

    /// Check if the kernel refused for lack of privilege.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(libc::EPERM) | Some(libc::EACCES))
    }

    /// Check if the descriptor was invalid (e.g. used after close).
    pub fn is_bad_descriptor(&self) -> bool {
        self.errno() == Some(libc::EBADF)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Open { source, .. } | Error::Ioctl { source, .. } | Error::Io(source) => source,
            Error::WouldBlock => io::Error::from(io::ErrorKind::WouldBlock),
            other => io::Error::new(io::ErrorKind::InvalidInput, other),
        }
    }
}
