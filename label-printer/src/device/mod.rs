//! Device session
//!
//! Owns the one open connection to the physical printer. Transports plug in
//! through [`Driver`] (discovery + open) and [`Link`] (write + release);
//! [`SystemDriver`] covers the platform transports and tests supply their
//! own.

mod known;
mod network;
mod port;
mod session;
mod system;
#[cfg(feature = "usb")]
mod usb;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PrintResult;

pub use known::{lookup_product, lookup_vendor, resolve_name};
pub use network::{DEFAULT_NETWORK_PORT, NetworkLink};
pub use port::PortLink;
pub use session::{DeviceSession, SessionStatus};
pub use system::SystemDriver;

/// How to find a printer again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeviceDescriptor {
    #[serde(rename_all = "camelCase")]
    Usb {
        vendor_id: u16,
        product_id: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bus: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<u8>,
    },
    /// Platform device node, e.g. `/dev/usb/lp0`
    Port { path: String },
    /// Raw TCP printing
    Network { host: String, port: u16 },
}

impl DeviceDescriptor {
    pub fn usb(vendor_id: u16, product_id: u16) -> Self {
        DeviceDescriptor::Usb {
            vendor_id,
            product_id,
            bus: None,
            address: None,
        }
    }

    /// Whether `other` names the same device, ignoring location hints the
    /// caller left out
    pub fn matches(&self, other: &DeviceDescriptor) -> bool {
        match (self, other) {
            (
                DeviceDescriptor::Usb {
                    vendor_id,
                    product_id,
                    bus,
                    address,
                },
                DeviceDescriptor::Usb {
                    vendor_id: v,
                    product_id: p,
                    bus: b,
                    address: a,
                },
            ) => {
                vendor_id == v
                    && product_id == p
                    && (bus.is_none() || b.is_none() || bus == b)
                    && (address.is_none() || a.is_none() || address == a)
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceDescriptor::Usb {
                vendor_id,
                product_id,
                ..
            } => write!(f, "usb:{:04x}:{:04x}", vendor_id, product_id),
            DeviceDescriptor::Port { path } => write!(f, "port:{}", path),
            DeviceDescriptor::Network { host, port } => write!(f, "tcp:{}:{}", host, port),
        }
    }
}

/// A discovered printer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(flatten)]
    pub descriptor: DeviceDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Display name, never empty
    pub name: String,
}

impl DeviceInfo {
    /// Build an entry, resolving the display name from reported strings and
    /// the lookup table
    pub fn new(
        descriptor: DeviceDescriptor,
        manufacturer: Option<String>,
        product: Option<String>,
    ) -> Self {
        let manufacturer = manufacturer.filter(|s| !s.trim().is_empty());
        let product = product.filter(|s| !s.trim().is_empty());
        let name = match &descriptor {
            DeviceDescriptor::Usb {
                vendor_id,
                product_id,
                ..
            } => resolve_name(*vendor_id, *product_id, product.as_deref()),
            DeviceDescriptor::Port { path } => product.clone().unwrap_or_else(|| path.clone()),
            DeviceDescriptor::Network { host, port } => product
                .clone()
                .unwrap_or_else(|| format!("Network printer {}:{}", host, port)),
        };
        Self {
            descriptor,
            manufacturer,
            product,
            name,
        }
    }
}

/// Transport backend
#[async_trait]
pub trait Driver: Send + Sync {
    /// Printers currently visible to this backend
    async fn discover(&self) -> PrintResult<Vec<DeviceInfo>>;

    /// Open and claim the device
    ///
    /// Fails with `DeviceNotFound` when nothing matches and `ClaimFailed`
    /// when the device exists but cannot be taken.
    async fn open(&self, descriptor: &DeviceDescriptor) -> PrintResult<Box<dyn Link>>;
}

/// An open, claimed connection
#[async_trait]
pub trait Link: Send {
    /// Write the whole buffer; `DeviceGone` means the handle is stale
    async fn write(&mut self, data: &[u8]) -> PrintResult<()>;

    /// Give the device back
    async fn release(&mut self) -> PrintResult<()>;
}

/// Map an I/O error from a write to the session's retry classes
pub(crate) fn classify_write_error(target: &str, err: std::io::Error) -> crate::PrintError {
    use std::io::ErrorKind;
    match err.kind() {
        ErrorKind::BrokenPipe
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotConnected
        | ErrorKind::NotFound
        | ErrorKind::UnexpectedEof => crate::PrintError::DeviceGone(format!("{}: {}", target, err)),
        // ENODEV once the printer is unplugged
        _ if err.raw_os_error() == Some(19) => {
            crate::PrintError::DeviceGone(format!("{}: {}", target, err))
        }
        _ => crate::PrintError::Transfer(format!("{}: {}", target, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_json_shape() {
        let json = serde_json::to_value(DeviceDescriptor::usb(0x1203, 0x0230)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "usb", "vendorId": 4611, "productId": 560})
        );
        let back: DeviceDescriptor =
            serde_json::from_str(r#"{"kind":"port","path":"/dev/usb/lp0"}"#).unwrap();
        assert_eq!(
            back,
            DeviceDescriptor::Port {
                path: "/dev/usb/lp0".to_string()
            }
        );
    }

    #[test]
    fn test_descriptor_matching_ignores_missing_location() {
        let wanted = DeviceDescriptor::usb(0x1203, 0x0230);
        let found = DeviceDescriptor::Usb {
            vendor_id: 0x1203,
            product_id: 0x0230,
            bus: Some(1),
            address: Some(7),
        };
        assert!(wanted.matches(&found));
        assert!(!DeviceDescriptor::usb(0x1203, 0x0231).matches(&found));
    }

    #[test]
    fn test_info_name_falls_back_to_table() {
        let info = DeviceInfo::new(DeviceDescriptor::usb(0x1203, 0x0230), None, Some("  ".into()));
        assert!(!info.name.is_empty());
        assert!(info.name.starts_with("TSC"));
        assert_eq!(info.product, None);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["vendorId"], 0x1203);
        assert_eq!(json["name"], info.name.as_str());
    }

    #[test]
    fn test_classify_write_error() {
        let gone = classify_write_error("x", std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(gone.is_device_gone());
        let other = classify_write_error("x", std::io::Error::other("paper out"));
        assert!(!other.is_device_gone());
    }
}
