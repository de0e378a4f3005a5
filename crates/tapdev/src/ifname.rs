//! Interface name and index utilities.

use crate::error::{Error, Result};

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

const SYSFS_NET: &str = "/sys/class/net";

/// Validate an interface name.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName("empty name".to_string()));
    }

    if name.len() >= IFNAMSIZ {
        return Err(Error::NameTooLong {
            name: name.to_string(),
            len: name.len(),
        });
    }

    if name == "." || name == ".." {
        return Err(Error::InvalidName(name.to_string()));
    }

    if name.contains('/') || name.contains('\0') || name.contains(':') {
        return Err(Error::InvalidName(format!(
            "{name:?} contains invalid characters"
        )));
    }

    if name.chars().any(|c| c.is_whitespace()) {
        return Err(Error::InvalidName(format!("{name:?} contains whitespace")));
    }

    Ok(())
}

/// Check whether `name` looks like a kernel-assigned TAP name (`tap%d`).
pub fn is_tap_autoname(name: &str) -> bool {
    name.strip_prefix("tap")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Convert an interface index to name.
pub fn index_to_name(index: u32) -> Result<String> {
    if index == 0 {
        return Err(Error::InterfaceNotFound("index 0".to_string()));
    }

    let entries = std::fs::read_dir(SYSFS_NET)?;

    for entry in entries.flatten() {
        let path = entry.path().join("ifindex");
        if let Ok(content) = std::fs::read_to_string(&path)
            && let Ok(idx) = content.trim().parse::<u32>()
            && idx == index
        {
            return Ok(entry.file_name().to_string_lossy().to_string());
        }
    }

    Err(Error::InterfaceNotFound(format!("index {}", index)))
}

/// Convert an interface name to index.
pub fn name_to_index(name: &str) -> Result<u32> {
    validate(name)?;

    let path = format!("{}/{}/ifindex", SYSFS_NET, name);
    let content =
        std::fs::read_to_string(&path).map_err(|_| Error::InterfaceNotFound(name.to_string()))?;

    content
        .trim()
        .parse()
        .map_err(|_| Error::InterfaceNotFound(name.to_string()))
}

/// Check whether an interface with this name currently exists.
pub fn exists(name: &str) -> bool {
    validate(name).is_ok() && std::path::Path::new(SYSFS_NET).join(name).exists()
}

/// Get all interface names.
pub fn list_interfaces() -> Result<Vec<String>> {
    let entries = std::fs::read_dir(SYSFS_NET)?;

    let mut names = Vec::new();
    for entry in entries.flatten() {
        names.push(entry.file_name().to_string_lossy().to_string());
    }

    names.sort();
    Ok(names)
}
