use std::sync::Arc;

use label_printer::{DeviceSession, Driver, GeometryCatalog, SystemDriver};

use crate::core::Config;
use crate::printing::{PrintQueue, QueueSettings};

/// Server state - shared service objects
///
/// Cloning is cheap; every field is reference counted.
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | Configuration (immutable) |
/// | catalog | Label stock geometry profiles |
/// | device | Printer connection |
/// | queue | Print jobs and worker |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub catalog: Arc<GeometryCatalog>,
    pub device: Arc<DeviceSession>,
    pub queue: PrintQueue,
}

impl ServerState {
    /// Build state over the host's real transports and restore the saved
    /// printer when `AUTO_RECONNECT` is on
    pub async fn initialize(config: &Config) -> Self {
        let driver = SystemDriver::new()
            .with_network_timeout(config.network_timeout())
            .with_usb_timeout(config.usb_write_timeout());
        let state = Self::with_driver(config, Arc::new(driver));

        if config.auto_reconnect {
            if state.device.restore().await {
                tracing::info!("Saved printer reconnected");
            }
        } else {
            tracing::debug!("Auto reconnect disabled");
        }
        state
    }

    /// Build state over an arbitrary driver
    pub fn with_driver(config: &Config, driver: Arc<dyn Driver>) -> Self {
        let catalog = match GeometryCatalog::builtin().with_default(&config.default_page_config) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(
                    profile = %config.default_page_config,
                    error = %e,
                    "Unknown DEFAULT_PAGE_CONFIG, using built-in default"
                );
                GeometryCatalog::builtin()
            }
        };
        let catalog = Arc::new(catalog);
        let device = Arc::new(
            DeviceSession::new(driver).with_state_file(config.printer_state_file()),
        );
        let queue = PrintQueue::new(
            catalog.clone(),
            device.clone(),
            QueueSettings {
                default_calibration: config.default_calibration(),
                transfer_timeout: config.transfer_timeout(),
            },
        );

        Self {
            config: config.clone(),
            catalog,
            device,
            queue,
        }
    }
}
