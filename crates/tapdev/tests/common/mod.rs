//! Common test utilities for integration tests.
//!
//! Provides unique interface names, an `ip` command runner, a bridge
//! with automatic cleanup, and helper macros for conditional test
//! execution.

use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

use tapdev::{Error, Result};

/// Global counter for unique interface names.
static NAME_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique interface name that fits in 15 bytes.
pub fn unique_name(prefix: &str) -> String {
    let id = NAME_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id() % 100_000;
    format!("{}{}x{}", prefix, pid, id)
}

/// Run `ip` with the given arguments.
pub fn ip(args: &[&str]) -> Result<String> {
    let output = Command::new("ip").args(args).output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Io(std::io::Error::other(format!(
            "ip {:?} failed: {}",
            args, stderr
        ))));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// A bridge device that is deleted when dropped.
pub struct TestBridge {
    name: String,
}

impl TestBridge {
    /// Create a bridge with STP off and bring it up.
    pub fn new() -> Result<Self> {
        let name = unique_name("tbr");
        ip(&["link", "add", "name", &name, "type", "bridge", "stp_state", "0"])?;
        let bridge = Self { name };
        ip(&["link", "set", &bridge.name, "up"])?;
        Ok(bridge)
    }

    /// Enslave an interface to this bridge.
    pub fn attach(&self, dev: &str) -> Result<()> {
        ip(&["link", "set", dev, "master", &self.name])?;
        Ok(())
    }
}

impl Drop for TestBridge {
    fn drop(&mut self) {
        let _ = Command::new("ip")
            .args(["link", "del", &self.name])
            .status();
    }
}

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Skip the test if not running as root.
///
/// Use this at the beginning of integration tests that require root privileges.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name() {
        let name1 = unique_name("tdt");
        let name2 = unique_name("tdt");
        assert_ne!(name1, name2);
        assert!(name1.starts_with("tdt"));
        assert!(name1.len() < 16);
    }
}
