//! Local hardware address collection for the hardware-lock test.
//!
//! Readings are best-effort: on platforms without a supported source the
//! set comes back empty and a hardware-locked license simply fails its
//! hardware test there.

use std::collections::BTreeSet;

use crate::license::normalize_hardware_address;

/// Placeholder address reported by interfaces with no burned-in MAC.
const NULL_ADDRESS: &str = "00:00:00:00:00:00";

/// Collects the machine's network hardware addresses, normalized for
/// comparison against a license's lock set.
#[must_use]
pub fn local_hardware_addresses() -> BTreeSet<String> {
    platform_addresses()
        .into_iter()
        .map(|a| normalize_hardware_address(&a))
        .filter(|a| !a.is_empty() && a != NULL_ADDRESS)
        .collect()
}

#[cfg(target_os = "linux")]
fn platform_addresses() -> Vec<String> {
    let mut found = Vec::new();
    if let Ok(entries) = std::fs::read_dir("/sys/class/net") {
        for entry in entries.flatten() {
            if entry.file_name() == "lo" {
                continue;
            }
            if let Ok(address) = std::fs::read_to_string(entry.path().join("address")) {
                found.push(address);
            }
        }
    }
    found
}

#[cfg(target_os = "macos")]
fn platform_addresses() -> Vec<String> {
    std::process::Command::new("ifconfig")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|output| {
            output
                .lines()
                .filter_map(|line| line.trim_start().strip_prefix("ether "))
                .map(|address| address.trim().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn platform_addresses() -> Vec<String> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_normalized() {
        for address in local_hardware_addresses() {
            assert_eq!(address, address.trim().to_ascii_lowercase());
            assert_ne!(address, NULL_ADDRESS);
        }
    }
}
