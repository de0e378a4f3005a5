//! Async TAP device on top of tokio's `AsyncFd`.

use std::io;

use tokio::io::unix::AsyncFd;

use crate::device::TapDevice;
use crate::error::{Error, Result};

/// A [`TapDevice`] driven by tokio readiness instead of blocking reads.
pub struct AsyncTapDevice {
    inner: AsyncFd<TapDevice>,
}

impl AsyncTapDevice {
    /// Register `device` with the current tokio reactor.
    ///
    /// The descriptor is switched to non-blocking mode first.
    pub fn new(mut device: TapDevice) -> Result<Self> {
        device.set_nonblocking(true)?;
        Ok(Self {
            inner: AsyncFd::new(device)?,
        })
    }

    /// Get a reference to the underlying device.
    pub fn get_ref(&self) -> &TapDevice {
        self.inner.get_ref()
    }

    /// Deregister from the reactor and return the device.
    pub fn into_inner(self) -> TapDevice {
        self.inner.into_inner()
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        self.get_ref().name()
    }

    /// Read one frame into `buf`, waiting until one is queued.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        loop {
            let mut guard = self.inner.readable().await?;

            match guard.try_io(|inner| inner.get_ref().read_into(buf).map_err(io::Error::from)) {
                Ok(result) => return result.map_err(Error::from_io),
                Err(_would_block) => continue,
            }
        }
    }

    /// Write one frame, waiting until the device accepts it.
    pub async fn write(&self, buf: &[u8]) -> Result<usize> {
        loop {
            let mut guard = self.inner.writable().await?;

            match guard.try_io(|inner| inner.get_ref().write(buf).map_err(io::Error::from)) {
                Ok(result) => return result.map_err(Error::from_io),
                Err(_would_block) => continue,
            }
        }
    }
}
