//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Label content rejected (missing title, empty payload)
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// Unknown geometry or a coordinate that cannot be expressed in dots
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Lookup of a catalog entry failed
    #[error("Not found: {0}")]
    NotFound(String),

    /// No device matches the descriptor
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Device was found but its interface could not be opened or claimed
    #[error("Claim failed: {0}")]
    ClaimFailed(String),

    /// Transfer attempted with no device and no known descriptor
    #[error("Printer not connected")]
    NotConnected,

    /// I/O failure while writing to the device
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// The open handle is no longer valid (unplugged, reset, closed by peer)
    #[error("Device gone: {0}")]
    DeviceGone(String),

    /// IO error outside of a transfer
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl PrintError {
    /// Whether the error means the handle must be dropped and reopened
    pub fn is_device_gone(&self) -> bool {
        matches!(self, PrintError::DeviceGone(_))
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
