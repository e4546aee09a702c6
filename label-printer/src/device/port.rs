//! Printer-class device nodes
//!
//! On Linux the `usblp` kernel driver exposes each USB printer as
//! `/dev/usb/lpN`. Writing to the node is enough to print; vendor and
//! product ids come from sysfs when it is mounted.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use super::{DeviceDescriptor, DeviceInfo, Link, classify_write_error};
use crate::error::{PrintError, PrintResult};

const DEV_DIR: &str = "/dev/usb";
const SYSFS_USBMISC: &str = "/sys/class/usbmisc";

/// Open device node
#[derive(Debug)]
pub struct PortLink {
    path: PathBuf,
    file: Option<File>,
}

impl PortLink {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn open(path: &Path) -> PrintResult<Self> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    PrintError::DeviceNotFound(format!("{}", path.display()))
                }
                _ => PrintError::ClaimFailed(format!("{}: {}", path.display(), e)),
            })?;
        debug!("Device node opened");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }
}

#[async_trait]
impl Link for PortLink {
    #[instrument(skip(self, data), fields(path = %self.path.display(), data_len = data.len()))]
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let target = self.path.display().to_string();
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| PrintError::DeviceGone(format!("{}: closed", target)))?;
        file.write_all(data)
            .await
            .map_err(|e| classify_write_error(&target, e))?;
        file.flush()
            .await
            .map_err(|e| classify_write_error(&target, e))?;
        Ok(())
    }

    async fn release(&mut self) -> PrintResult<()> {
        if let Some(file) = self.file.take() {
            file.sync_all().await.ok();
        }
        Ok(())
    }
}

/// List `lp*` nodes in name order
///
/// Nodes backed by a USB printer are reported by their USB ids so the same
/// descriptor works with or without the kernel driver.
pub(super) async fn discover_ports() -> Vec<DeviceInfo> {
    let mut devices = Vec::new();
    for name in list_nodes().await {
        let info = match read_usb_identity(&name).await {
            Some(id) => DeviceInfo::new(
                DeviceDescriptor::usb(id.vendor_id, id.product_id),
                id.manufacturer,
                id.product,
            ),
            None => DeviceInfo::new(
                DeviceDescriptor::Port {
                    path: format!("{}/{}", DEV_DIR, name),
                },
                None,
                None,
            ),
        };
        devices.push(info);
    }
    devices
}

async fn list_nodes() -> Vec<String> {
    let mut found = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(DEV_DIR).await else {
        return found;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("lp") {
            found.push(name);
        }
    }
    found.sort();
    found
}

/// Device node backing the given USB ids, if the kernel driver owns it
pub(super) async fn port_for_usb(vendor_id: u16, product_id: u16) -> Option<PathBuf> {
    for name in list_nodes().await {
        if let Some(id) = read_usb_identity(&name).await
            && id.vendor_id == vendor_id
            && id.product_id == product_id
        {
            return Some(Path::new(DEV_DIR).join(name));
        }
    }
    None
}

struct UsbIdentity {
    vendor_id: u16,
    product_id: u16,
    manufacturer: Option<String>,
    product: Option<String>,
}

/// `/sys/class/usbmisc/lpN/device` is the interface; ids live one level up
async fn read_usb_identity(node: &str) -> Option<UsbIdentity> {
    let usb_dir = Path::new(SYSFS_USBMISC).join(node).join("device").join("..");
    let read = |file: &str| {
        let path = usb_dir.join(file);
        async move {
            tokio::fs::read_to_string(path)
                .await
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        }
    };
    let vendor_id = u16::from_str_radix(&read("idVendor").await?, 16).ok()?;
    let product_id = u16::from_str_radix(&read("idProduct").await?, 16).ok()?;
    Some(UsbIdentity {
        vendor_id,
        product_id,
        manufacturer: read("manufacturer").await,
        product: read("product").await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_node() {
        let err = PortLink::open(Path::new("/definitely/not/a/printer"))
            .await
            .unwrap_err();
        assert!(matches!(err, PrintError::DeviceNotFound(_)));
    }

    #[tokio::test]
    async fn test_write_to_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lp0");
        std::fs::write(&path, b"").unwrap();

        let mut link = PortLink::open(&path).await.unwrap();
        link.write(b"CLS\r\n").await.unwrap();
        link.release().await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"CLS\r\n");

        let err = link.write(b"CLS\r\n").await.unwrap_err();
        assert!(err.is_device_gone());
    }
}
