//! Queue errors

use label_printer::PrintError;
use thiserror::Error;

use super::types::JobStatus;

#[derive(Debug, Error)]
pub enum QueueError {
    /// Missing title, empty payload, zero copies
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// Unknown geometry profile or unusable calibration
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job {id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: &'static str,
    },

    /// Rendering failed for a reason unrelated to the request
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type QueueResult<T> = Result<T, QueueError>;

impl From<PrintError> for QueueError {
    fn from(err: PrintError) -> Self {
        match err {
            PrintError::InvalidLabel(msg) => QueueError::InvalidLabel(msg),
            PrintError::NotFound(msg) | PrintError::InvalidGeometry(msg) => {
                QueueError::InvalidGeometry(msg)
            }
            other => QueueError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_errors_keep_their_class() {
        assert!(matches!(
            QueueError::from(PrintError::InvalidLabel("no title".into())),
            QueueError::InvalidLabel(_)
        ));
        assert!(matches!(
            QueueError::from(PrintError::NotFound("stock".into())),
            QueueError::InvalidGeometry(_)
        ));
        let io = std::io::Error::other("disk full");
        assert!(matches!(
            QueueError::from(PrintError::Io(io)),
            QueueError::Internal(_)
        ));
        assert!(matches!(
            QueueError::from(PrintError::InvalidConfig("bad".into())),
            QueueError::Internal(_)
        ));
    }
}
