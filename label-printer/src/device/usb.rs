//! Direct USB access through libusb
//!
//! Used where no kernel printer driver exposes a device node. libusb calls
//! block, so every call runs on tokio's blocking pool.

use std::time::Duration;

use async_trait::async_trait;
use rusb::{Direction, GlobalContext, TransferType, UsbContext};
use tracing::{debug, info, instrument, warn};

use super::known::is_known_vendor;
use super::{DeviceDescriptor, DeviceInfo, Link};
use crate::error::{PrintError, PrintResult};

/// USB interface class for printers
const PRINTER_CLASS: u8 = 0x07;

/// Timeout for string descriptor reads during discovery
const STRING_TIMEOUT: Duration = Duration::from_millis(200);

type Handle = rusb::DeviceHandle<GlobalContext>;

/// Claimed printer interface with its bulk OUT endpoint
///
/// The handle moves into each blocking call and back; `None` after release.
pub struct UsbLink {
    handle: Option<Handle>,
    interface: u8,
    endpoint: u8,
    kernel_detached: bool,
    timeout: Duration,
    target: String,
}

impl std::fmt::Debug for UsbLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbLink")
            .field("target", &self.target)
            .field("interface", &self.interface)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn map_usb_error(target: &str, err: rusb::Error) -> PrintError {
    match err {
        rusb::Error::NoDevice | rusb::Error::Io | rusb::Error::Pipe | rusb::Error::NotFound => {
            PrintError::DeviceGone(format!("{}: {}", target, err))
        }
        rusb::Error::Timeout => PrintError::Timeout(format!("{}: {}", target, err)),
        _ => PrintError::Transfer(format!("{}: {}", target, err)),
    }
}

async fn blocking<T, F>(f: F) -> PrintResult<T>
where
    F: FnOnce() -> PrintResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PrintError::Transfer(format!("usb task failed: {}", e)))?
}

/// Enumerate printer-class devices and devices from known vendors
pub(super) async fn discover_usb() -> PrintResult<Vec<DeviceInfo>> {
    blocking(|| {
        let devices = GlobalContext::default()
            .devices()
            .map_err(|e| PrintError::Transfer(format!("usb enumeration: {}", e)))?;

        let mut found = Vec::new();
        for device in devices.iter() {
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };
            let printer_class = device
                .active_config_descriptor()
                .map(|config| {
                    config.interfaces().any(|i| {
                        i.descriptors()
                            .any(|d| d.class_code() == PRINTER_CLASS)
                    })
                })
                .unwrap_or(false);
            if !printer_class && !is_known_vendor(desc.vendor_id()) {
                continue;
            }

            // strings need an open handle; many printers refuse, names fall back
            let (manufacturer, product) = match device.open() {
                Ok(handle) => {
                    let language = handle
                        .read_languages(STRING_TIMEOUT)
                        .ok()
                        .and_then(|l| l.first().copied());
                    match language {
                        Some(lang) => (
                            handle
                                .read_manufacturer_string(lang, &desc, STRING_TIMEOUT)
                                .ok(),
                            handle.read_product_string(lang, &desc, STRING_TIMEOUT).ok(),
                        ),
                        None => (None, None),
                    }
                }
                Err(e) => {
                    debug!(error = %e, "Cannot open device for strings");
                    (None, None)
                }
            };

            found.push(DeviceInfo::new(
                DeviceDescriptor::Usb {
                    vendor_id: desc.vendor_id(),
                    product_id: desc.product_id(),
                    bus: Some(device.bus_number()),
                    address: Some(device.address()),
                },
                manufacturer,
                product,
            ));
        }
        Ok(found)
    })
    .await
}

/// Open, detach the kernel driver if needed, claim and find bulk OUT
#[instrument(skip(timeout))]
pub(super) async fn open_usb(descriptor: DeviceDescriptor, timeout: Duration) -> PrintResult<UsbLink> {
    blocking(move || {
        let target = descriptor.to_string();
        let devices = GlobalContext::default()
            .devices()
            .map_err(|e| PrintError::DeviceNotFound(format!("{}: {}", target, e)))?;

        let device = devices
            .iter()
            .find(|d| {
                d.device_descriptor().is_ok_and(|desc| {
                    descriptor.matches(&DeviceDescriptor::Usb {
                        vendor_id: desc.vendor_id(),
                        product_id: desc.product_id(),
                        bus: Some(d.bus_number()),
                        address: Some(d.address()),
                    })
                })
            })
            .ok_or_else(|| PrintError::DeviceNotFound(target.clone()))?;

        let config = device
            .active_config_descriptor()
            .map_err(|e| PrintError::ClaimFailed(format!("{}: {}", target, e)))?;

        // prefer the printer-class interface, else the first with bulk OUT
        let mut candidate = None;
        for interface in config.interfaces() {
            for alt in interface.descriptors() {
                let out = alt.endpoint_descriptors().find(|ep| {
                    ep.direction() == Direction::Out && ep.transfer_type() == TransferType::Bulk
                });
                if let Some(ep) = out {
                    let is_printer = alt.class_code() == PRINTER_CLASS;
                    if candidate.is_none() || is_printer {
                        candidate = Some((alt.interface_number(), ep.address()));
                    }
                    if is_printer {
                        break;
                    }
                }
            }
        }
        let (interface, endpoint) = candidate.ok_or_else(|| {
            PrintError::ClaimFailed(format!("{}: no bulk OUT endpoint", target))
        })?;

        let mut handle = device
            .open()
            .map_err(|e| PrintError::ClaimFailed(format!("{}: {}", target, e)))?;

        let kernel_detached = match handle.kernel_driver_active(interface) {
            Ok(true) => {
                handle
                    .detach_kernel_driver(interface)
                    .map_err(|e| PrintError::ClaimFailed(format!("{}: detach: {}", target, e)))?;
                true
            }
            _ => false,
        };
        handle
            .claim_interface(interface)
            .map_err(|e| PrintError::ClaimFailed(format!("{}: claim: {}", target, e)))?;

        info!(%target, interface, endpoint, kernel_detached, "USB interface claimed");
        Ok(UsbLink {
            handle: Some(handle),
            interface,
            endpoint,
            kernel_detached,
            timeout,
            target,
        })
    })
    .await
}

#[async_trait]
impl Link for UsbLink {
    #[instrument(skip(self, data), fields(target = %self.target, data_len = data.len()))]
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| PrintError::DeviceGone(format!("{}: released", self.target)))?;
        let endpoint = self.endpoint;
        let timeout = self.timeout;
        let target = self.target.clone();
        let data = data.to_vec();

        let (handle, result) = tokio::task::spawn_blocking(move || {
            // `timeout` bounds the whole buffer, not each chunk
            let deadline = std::time::Instant::now() + timeout;
            let mut sent = 0;
            while sent < data.len() {
                let remaining = deadline.saturating_duration_since(std::time::Instant::now());
                if remaining.is_zero() {
                    return (handle, Err(PrintError::Timeout(format!("{}: write", target))));
                }
                match handle.write_bulk(endpoint, &data[sent..], remaining) {
                    Ok(0) => {
                        return (handle, Err(PrintError::Transfer(format!("{}: short write", target))));
                    }
                    Ok(n) => sent += n,
                    Err(e) => return (handle, Err(map_usb_error(&target, e))),
                }
            }
            (handle, Ok(()))
        })
        .await
        .map_err(|e| PrintError::Transfer(format!("usb task failed: {}", e)))?;

        self.handle = Some(handle);
        result
    }

    async fn release(&mut self) -> PrintResult<()> {
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };
        let interface = self.interface;
        let reattach = self.kernel_detached;
        let target = self.target.clone();

        blocking(move || {
            let result = handle
                .release_interface(interface)
                .map_err(|e| PrintError::Transfer(format!("{}: release: {}", target, e)));
            if reattach && let Err(e) = handle.attach_kernel_driver(interface) {
                warn!(%target, error = %e, "Kernel driver not reattached");
            }
            result
        })
        .await
    }
}
