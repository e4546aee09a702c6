//! Print job types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use label_printer::{Calibration, LabelContent};
use serde::{Deserialize, Serialize};

/// Job lifecycle
///
/// ```text
/// pending ──► processing ──► completed
///    │                  └──► failed
///    └──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether moving from `self` to `next` is allowed
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Pending, JobStatus::Cancelled)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }

    /// Deletion is allowed from every state but `processing`
    pub fn can_delete(self) -> bool {
        self != JobStatus::Processing
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" | "canceled" => Ok(JobStatus::Cancelled),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// What a job prints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JobPayload {
    /// One label, `copies` stickers
    Single { label: LabelContent, copies: u32 },
    /// One sticker per label
    Batch { labels: Vec<LabelContent> },
    /// Pre-built command text, printed as is
    Raw { tspl: String },
}

impl JobPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            JobPayload::Single { .. } => "single",
            JobPayload::Batch { .. } => "batch",
            JobPayload::Raw { .. } => "raw",
        }
    }

    /// Stickers the job will produce; raw jobs are opaque
    pub fn sticker_count(&self) -> Option<u32> {
        match self {
            JobPayload::Single { copies, .. } => Some(*copies),
            JobPayload::Batch { labels } => Some(labels.len() as u32),
            JobPayload::Raw { .. } => None,
        }
    }
}

/// A queued print request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    pub id: String,
    /// Geometry profile id
    pub geometry: String,
    pub payload: JobPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<Calibration>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Command text, rendered at most once
    #[serde(skip)]
    pub rendered: Option<String>,
}

/// Submission input
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Profile id; the catalog default when absent
    pub geometry: Option<String>,
    pub payload: JobPayload,
    /// Overrides the server-wide calibration
    pub calibration: Option<Calibration>,
}

impl JobRequest {
    pub fn single(label: LabelContent, copies: u32) -> Self {
        Self {
            geometry: None,
            payload: JobPayload::Single { label, copies },
            calibration: None,
        }
    }

    pub fn batch(labels: Vec<LabelContent>) -> Self {
        Self {
            geometry: None,
            payload: JobPayload::Batch { labels },
            calibration: None,
        }
    }

    pub fn with_geometry(mut self, geometry: impl Into<String>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }
}

/// Queue counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub total: usize,
    /// Stickers still to print across pending jobs; raw jobs count as none
    pub pending_stickers: u32,
    /// Id of the job being printed
    pub current_job: Option<String>,
}
