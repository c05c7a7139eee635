//! Connection targets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EtiquetaError;

/// Identifies the physical printer to connect to.
///
/// Immutable for the life of one connect attempt; the session records the
/// target that last connected successfully.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceTarget {
    /// Bluetooth address, normalized to upper case
    pub address: String,
    /// Advertised device name, if known
    pub name: Option<String>,
}

impl DeviceTarget {
    /// Create a target from a Bluetooth MAC address (XX:XX:XX:XX:XX:XX).
    pub fn new(address: &str) -> Result<Self, EtiquetaError> {
        if !is_valid_mac(address) {
            return Err(EtiquetaError::Config(format!(
                "Invalid Bluetooth address '{}'",
                address
            )));
        }
        Ok(Self {
            address: address.to_uppercase(),
            name: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.address),
            None => f.write_str(&self.address),
        }
    }
}

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return false;
    }
    parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_mac_addresses() {
        assert!(is_valid_mac("00:11:22:33:44:55"));
        assert!(is_valid_mac("AA:BB:CC:DD:EE:FF"));
        assert!(is_valid_mac("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn test_invalid_mac_addresses() {
        assert!(!is_valid_mac("00:11:22:33:44")); // too short
        assert!(!is_valid_mac("00:11:22:33:44:55:66")); // too long
        assert!(!is_valid_mac("00-11-22-33-44-55")); // wrong separator
        assert!(!is_valid_mac("GG:HH:II:JJ:KK:LL")); // invalid hex
        assert!(!is_valid_mac(""));
    }

    #[test]
    fn test_target_normalizes_case() {
        let target = DeviceTarget::new("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(target.address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(target.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_target_display_with_name() {
        let target = DeviceTarget::new("00:11:22:33:44:55")
            .unwrap()
            .with_name("D110-A1B2");
        assert_eq!(target.to_string(), "D110-A1B2 (00:11:22:33:44:55)");
    }

    #[test]
    fn test_target_rejects_garbage() {
        assert!(DeviceTarget::new("not-a-mac").is_err());
    }
}
