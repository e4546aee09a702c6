use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use label_printer::Calibration;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | Working directory (printer state, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | LOG_LEVEL | info | Log level |
/// | LOG_DIR | - | Daily rolling log files go here when set and present |
/// | TRANSFER_TIMEOUT_MS | 10000 | Upper bound for one print transfer; libusb writes get 1 s less |
/// | NETWORK_TIMEOUT_MS | 5000 | TCP connect timeout for network printers |
/// | DEFAULT_PAGE_CONFIG | default | Geometry profile used when a job names none |
/// | LABEL_PADDING_MM | 1.0 | Inner padding of each sticker |
/// | CALIBRATION_OFFSET_X_MM | 0 | Horizontal shift of all content |
/// | CALIBRATION_OFFSET_Y_MM | 0 | Vertical shift of all content |
/// | AUTO_RECONNECT | true | Reconnect the saved printer at startup |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/var/lib/labels HTTP_PORT=8080 cargo run -p label-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub transfer_timeout_ms: u64,
    pub network_timeout_ms: u64,
    /// Geometry profile id
    pub default_page_config: String,
    pub label_padding_mm: f64,
    pub calibration_offset_x_mm: f64,
    pub calibration_offset_y_mm: f64,
    pub auto_reconnect: bool,
}

/// Head start the blocking USB write gets over the queue's transfer timeout
const USB_TIMEOUT_MARGIN: Duration = Duration::from_secs(1);

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 3000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            transfer_timeout_ms: env_or("TRANSFER_TIMEOUT_MS", 10_000),
            network_timeout_ms: env_or("NETWORK_TIMEOUT_MS", 5_000),
            default_page_config: std::env::var("DEFAULT_PAGE_CONFIG")
                .unwrap_or_else(|_| "default".into()),
            label_padding_mm: env_or("LABEL_PADDING_MM", 1.0),
            calibration_offset_x_mm: env_or("CALIBRATION_OFFSET_X_MM", 0.0),
            calibration_offset_y_mm: env_or("CALIBRATION_OFFSET_Y_MM", 0.0),
            auto_reconnect: env_or("AUTO_RECONNECT", true),
        }
    }

    /// Override the working directory and port
    ///
    /// Used by tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Where the connected printer is remembered
    pub fn printer_state_file(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("printer.json")
    }

    pub fn default_calibration(&self) -> Calibration {
        Calibration {
            padding_mm: self.label_padding_mm,
            offset_x_mm: self.calibration_offset_x_mm,
            offset_y_mm: self.calibration_offset_y_mm,
            outline: false,
        }
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_millis(self.transfer_timeout_ms)
    }

    /// libusb write budget, strictly inside the transfer timeout
    pub fn usb_write_timeout(&self) -> Duration {
        let transfer = self.transfer_timeout();
        transfer
            .saturating_sub(USB_TIMEOUT_MARGIN)
            .max(transfer / 2)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_values() {
        let config = Config::with_overrides("/tmp/labels", 8080);
        assert_eq!(config.http_port, 8080);
        assert_eq!(
            config.printer_state_file(),
            PathBuf::from("/tmp/labels/printer.json")
        );
        let calibration = config.default_calibration();
        assert_eq!(calibration.padding_mm, config.label_padding_mm);
        assert!(!calibration.outline);
    }

    #[test]
    fn test_usb_timeout_inside_transfer_timeout() {
        let mut config = Config::with_overrides("/tmp/labels", 0);
        for ms in [10_000, 1_000, 400, 2] {
            config.transfer_timeout_ms = ms;
            assert!(config.usb_write_timeout() < config.transfer_timeout(), "{} ms", ms);
        }
        config.transfer_timeout_ms = 10_000;
        assert_eq!(config.usb_write_timeout(), Duration::from_secs(9));
    }
}
