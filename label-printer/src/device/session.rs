//! Exclusive connection to one printer

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use super::{DeviceDescriptor, DeviceInfo, Driver, Link};
use crate::error::{PrintError, PrintResult};

/// Snapshot for status reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub connected: bool,
    pub ready: bool,
    pub descriptor: Option<DeviceDescriptor>,
}

#[derive(Default)]
struct SessionState {
    link: Option<Box<dyn Link>>,
    /// Last descriptor that opened successfully (or was restored)
    descriptor: Option<DeviceDescriptor>,
}

/// Device session
///
/// At most one open link. A transfer reconnects at most once: either
/// because no link is open but a descriptor is known, or because the open
/// link turned out to be stale.
pub struct DeviceSession {
    driver: Arc<dyn Driver>,
    state: Mutex<SessionState>,
    state_file: Option<PathBuf>,
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("state_file", &self.state_file)
            .finish_non_exhaustive()
    }
}

impl DeviceSession {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            state: Mutex::new(SessionState::default()),
            state_file: None,
        }
    }

    /// Persist the connected descriptor to `path` as JSON
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    pub async fn discover(&self) -> PrintResult<Vec<DeviceInfo>> {
        self.driver.discover().await
    }

    /// Open `descriptor`, replacing any current link
    #[instrument(skip(self), fields(device = %descriptor))]
    pub async fn connect(&self, descriptor: DeviceDescriptor) -> PrintResult<()> {
        let mut state = self.state.lock().await;
        release_link(state.link.take()).await;

        let link = self.driver.open(&descriptor).await?;
        state.link = Some(link);
        state.descriptor = Some(descriptor.clone());
        drop(state);

        info!("Printer connected");
        self.persist(Some(&descriptor)).await;
        Ok(())
    }

    /// Load the persisted descriptor and try it once
    ///
    /// Returns whether a link is open afterwards. A failed attempt still
    /// leaves the descriptor known, so the next transfer tries again.
    pub async fn restore(&self) -> bool {
        let Some(path) = &self.state_file else {
            return false;
        };
        let descriptor = match tokio::fs::read_to_string(path).await {
            Ok(json) => match serde_json::from_str::<DeviceDescriptor>(&json) {
                Ok(d) => d,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable printer state");
                    return false;
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read printer state");
                return false;
            }
        };

        let mut state = self.state.lock().await;
        state.descriptor = Some(descriptor.clone());
        match self.driver.open(&descriptor).await {
            Ok(link) => {
                state.link = Some(link);
                info!(device = %descriptor, "Restored printer connection");
                true
            }
            Err(e) => {
                warn!(device = %descriptor, error = %e, "Saved printer not available");
                false
            }
        }
    }

    /// Release the link and forget the device; never fails
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        let had_link = state.link.is_some();
        release_link(state.link.take()).await;
        state.descriptor = None;
        drop(state);

        self.persist(None).await;
        if had_link {
            info!("Printer disconnected");
        }
    }

    /// Release the link but keep the device remembered, for shutdown
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        release_link(state.link.take()).await;
    }

    /// Write a whole command buffer to the printer
    #[instrument(skip(self, data), fields(data_len = data.len()))]
    pub async fn transfer(&self, data: &[u8]) -> PrintResult<()> {
        let mut state = self.state.lock().await;

        let mut reconnected = false;
        if state.link.is_none() {
            let descriptor = state.descriptor.clone().ok_or(PrintError::NotConnected)?;
            info!(device = %descriptor, "Not connected, reconnecting");
            let link = self.driver.open(&descriptor).await.map_err(|e| {
                warn!(device = %descriptor, error = %e, "Reconnect failed");
                PrintError::Transfer(format!("reconnect to {} failed: {}", descriptor, e))
            })?;
            state.link = Some(link);
            reconnected = true;
        }

        match write(&mut state, data).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_device_gone() && !reconnected => {
                warn!(error = %e, "Printer handle stale, reconnecting once");
                release_link(state.link.take()).await;
                let descriptor = state.descriptor.clone().ok_or(PrintError::NotConnected)?;
                let link = self.driver.open(&descriptor).await.map_err(|reopen| {
                    error!(error = %reopen, "Reconnect failed");
                    PrintError::Transfer(format!("{}; reconnect failed: {}", e, reopen))
                })?;
                state.link = Some(link);
                write(&mut state, data).await.map_err(surface)
            }
            Err(e) => Err(surface(e)),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.link.is_some()
    }

    pub async fn status(&self) -> SessionStatus {
        let state = self.state.lock().await;
        let connected = state.link.is_some();
        SessionStatus {
            connected,
            ready: connected,
            descriptor: state.descriptor.clone(),
        }
    }

    async fn persist(&self, descriptor: Option<&DeviceDescriptor>) {
        let Some(path) = &self.state_file else {
            return;
        };
        let result = match descriptor {
            Some(d) => write_state(path, d).await,
            None => match tokio::fs::remove_file(path).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        };
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Failed to save printer state");
        }
    }
}

/// Write through the current link; a stale link is dropped
async fn write(state: &mut SessionState, data: &[u8]) -> PrintResult<()> {
    let link = state.link.as_mut().ok_or(PrintError::NotConnected)?;
    let result = link.write(data).await;
    if let Err(e) = &result
        && e.is_device_gone()
    {
        release_link(state.link.take()).await;
    }
    result
}

async fn release_link(link: Option<Box<dyn Link>>) {
    if let Some(mut link) = link
        && let Err(e) = link.release().await
    {
        warn!(error = %e, "Release failed");
    }
}

/// `DeviceGone` only drives the retry; callers see a transfer failure
fn surface(err: PrintError) -> PrintError {
    match err {
        PrintError::DeviceGone(msg) => PrintError::Transfer(msg),
        other => other,
    }
}

async fn write_state(path: &std::path::Path, descriptor: &DeviceDescriptor) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let json = serde_json::to_vec_pretty(descriptor).map_err(std::io::Error::other)?;
    tokio::fs::write(path, json).await
}
