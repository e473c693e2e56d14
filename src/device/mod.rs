//! Device identity and the version of the running firmware.

use std::fs;
use std::path::Path;

use crate::config::DeviceSettings;
use crate::utils::error::AgentError;

/// Version of the firmware currently executing.
pub const RUNNING_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

const SYSFS_NET: &str = "/sys/class/net";

/// The configured identity, or the hardware address of a network interface.
pub fn resolve_identity(settings: &DeviceSettings) -> Result<String, AgentError> {
    if let Some(identity) = settings.identity.as_deref().map(str::trim) {
        if !identity.is_empty() {
            return Ok(identity.to_string());
        }
    }
    identity_from_interfaces(Path::new(SYSFS_NET), settings.interface.as_deref())
}

/// Reads `<root>/<iface>/address` for the preferred interface, or else the
/// first interface (by name) with a non-zero address.
pub fn identity_from_interfaces(root: &Path, preferred: Option<&str>) -> Result<String, AgentError> {
    if let Some(name) = preferred {
        return read_address(&root.join(name))
            .ok_or_else(|| AgentError::Identity(format!("interface `{name}` has no usable address")));
    }

    let mut names: Vec<String> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name != "lo")
        .collect();
    names.sort();

    names
        .iter()
        .find_map(|name| read_address(&root.join(name)))
        .ok_or_else(|| AgentError::Identity("no network interface with a hardware address".into()))
}

fn read_address(iface_dir: &Path) -> Option<String> {
    let raw = fs::read_to_string(iface_dir.join("address")).ok()?;
    normalize_mac(raw.trim())
}

/// Upper-case, colon separated; all-zero addresses are not identities.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let octets: Vec<&str> = raw.split(':').collect();
    let valid = octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid || octets.iter().all(|o| *o == "00") {
        return None;
    }
    Some(raw.to_ascii_uppercase())
}

/// MQTT client id derived from the identity.
pub fn client_id(identity: &str) -> String {
    let compact: String = identity.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    format!("fwagent-{compact}")
}
