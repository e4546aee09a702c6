//! Driver over the host's real transports

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::network::NetworkLink;
use super::port::{PortLink, discover_ports, port_for_usb};
use super::{DeviceDescriptor, DeviceInfo, Driver, Link};
use crate::error::PrintResult;

/// Dispatches by descriptor kind
///
/// USB descriptors go to the kernel printer node when one backs the device,
/// otherwise to libusb when built with the `usb` feature.
#[derive(Debug, Clone)]
pub struct SystemDriver {
    network_timeout: Duration,
    #[cfg_attr(not(feature = "usb"), allow(dead_code))]
    usb_timeout: Duration,
}

impl SystemDriver {
    pub fn new() -> Self {
        Self {
            network_timeout: Duration::from_secs(5),
            usb_timeout: Duration::from_secs(8),
        }
    }

    /// Set TCP connect timeout
    pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout = timeout;
        self
    }

    /// Set the libusb write budget for one buffer
    ///
    /// Keep it below any timeout the caller wraps around a transfer, so the
    /// blocking write returns the handle before the caller gives up.
    pub fn with_usb_timeout(mut self, timeout: Duration) -> Self {
        self.usb_timeout = timeout;
        self
    }
}

impl Default for SystemDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Driver for SystemDriver {
    #[instrument(skip(self))]
    async fn discover(&self) -> PrintResult<Vec<DeviceInfo>> {
        #[allow(unused_mut)]
        let mut devices = discover_ports().await;

        #[cfg(feature = "usb")]
        for info in super::usb::discover_usb().await? {
            if !devices.iter().any(|d| d.descriptor.matches(&info.descriptor)) {
                devices.push(info);
            }
        }

        debug!(count = devices.len(), "Discovery finished");
        Ok(devices)
    }

    async fn open(&self, descriptor: &DeviceDescriptor) -> PrintResult<Box<dyn Link>> {
        match descriptor {
            DeviceDescriptor::Port { path } => Ok(Box::new(PortLink::open(Path::new(path)).await?)),
            DeviceDescriptor::Network { host, port } => Ok(Box::new(
                NetworkLink::connect(host, *port, self.network_timeout).await?,
            )),
            DeviceDescriptor::Usb {
                vendor_id,
                product_id,
                ..
            } => {
                if let Some(path) = port_for_usb(*vendor_id, *product_id).await {
                    return Ok(Box::new(PortLink::open(&path).await?));
                }
                self.open_usb(descriptor).await
            }
        }
    }
}

impl SystemDriver {
    #[cfg(feature = "usb")]
    async fn open_usb(&self, descriptor: &DeviceDescriptor) -> PrintResult<Box<dyn Link>> {
        let link = super::usb::open_usb(descriptor.clone(), self.usb_timeout).await?;
        Ok(Box::new(link))
    }

    #[cfg(not(feature = "usb"))]
    async fn open_usb(&self, descriptor: &DeviceDescriptor) -> PrintResult<Box<dyn Link>> {
        Err(crate::PrintError::DeviceNotFound(format!(
            "{}: no printer node and built without USB support",
            descriptor
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrintError;

    #[tokio::test]
    async fn test_open_unknown_port() {
        let driver = SystemDriver::new();
        let result = driver
            .open(&DeviceDescriptor::Port {
                path: "/nonexistent/lp9".to_string(),
            })
            .await;
        assert!(matches!(result, Err(PrintError::DeviceNotFound(_))));
    }

    #[tokio::test]
    async fn test_discover_never_yields_blank_names() {
        let devices = SystemDriver::new().discover().await.unwrap_or_default();
        assert!(devices.iter().all(|d| !d.name.trim().is_empty()));
    }
}
