//! Label printing queue
//!
//! - [`PrintQueue`] - job table and the single print worker
//! - [`PrintJob`] / [`JobStatus`] - job record and lifecycle
//! - [`QueueError`] - submission and lifecycle errors

mod error;
mod queue;
mod types;

pub use error::{QueueError, QueueResult};
pub use queue::{PrintQueue, QueueSettings};
pub use types::{JobPayload, JobRequest, JobStatus, PrintJob, QueueStats};
