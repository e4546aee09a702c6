//! Print job queue and worker
//!
//! Jobs live in memory. One worker task prints them strictly in submission
//! order; it is spawned on demand by `submit` and exits when nothing is
//! pending. Rendering and transfer run outside the table lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use label_printer::{
    Calibration, DeviceSession, GeometryCatalog, LabelSet, PrintError, render_job,
    to_device_bytes,
};
use parking_lot::RwLock;
use tracing::{debug, error, info, instrument, warn};

use super::error::{QueueError, QueueResult};
use super::types::{JobPayload, JobRequest, JobStatus, PrintJob, QueueStats};

/// Queue tuning
#[derive(Debug, Clone)]
pub struct QueueSettings {
    /// Used when a job carries no calibration of its own
    pub default_calibration: Calibration,
    /// Upper bound for one device transfer
    pub transfer_timeout: Duration,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            default_calibration: Calibration::default(),
            transfer_timeout: Duration::from_secs(10),
        }
    }
}

struct Entry {
    /// Submission order
    seq: u64,
    job: PrintJob,
}

struct Inner {
    jobs: RwLock<HashMap<String, Entry>>,
    next_seq: AtomicU64,
    worker_running: AtomicBool,
    catalog: Arc<GeometryCatalog>,
    device: Arc<DeviceSession>,
    settings: QueueSettings,
}

/// Print job queue
///
/// Cheap to clone; clones share the same table and worker.
#[derive(Clone)]
pub struct PrintQueue {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PrintQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintQueue")
            .field("jobs", &self.inner.jobs.read().len())
            .field("worker_running", &self.is_worker_running())
            .finish()
    }
}

impl PrintQueue {
    pub fn new(
        catalog: Arc<GeometryCatalog>,
        device: Arc<DeviceSession>,
        settings: QueueSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: RwLock::new(HashMap::new()),
                next_seq: AtomicU64::new(0),
                worker_running: AtomicBool::new(false),
                catalog,
                device,
                settings,
            }),
        }
    }

    // ========== Submission ==========

    /// Validate and enqueue a job, then make sure the worker runs
    ///
    /// Nothing is stored when validation fails.
    #[instrument(skip(self, request), fields(kind = request.payload.kind()))]
    pub fn submit(&self, request: JobRequest) -> QueueResult<PrintJob> {
        let geometry = match &request.geometry {
            Some(id) => self.inner.catalog.resolve(id)?.id,
            None => self.inner.catalog.default_id(),
        };
        validate_payload(&request.payload)?;
        if let Some(calibration) = &request.calibration {
            validate_calibration(calibration)?;
        }

        let rendered = match &request.payload {
            JobPayload::Raw { tspl } => Some(tspl.clone()),
            _ => None,
        };
        let now = Utc::now();
        let job = PrintJob {
            id: uuid::Uuid::new_v4().to_string(),
            geometry: geometry.to_string(),
            payload: request.payload,
            calibration: request.calibration,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            error: None,
            rendered,
        };

        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        self.inner.jobs.write().insert(
            job.id.clone(),
            Entry {
                seq,
                job: job.clone(),
            },
        );
        info!(job_id = %job.id, geometry = %job.geometry, "Job queued");

        self.wake_worker();
        Ok(job)
    }

    /// Enqueue pre-built command text
    pub fn submit_raw(&self, tspl: impl Into<String>) -> QueueResult<PrintJob> {
        self.submit(JobRequest {
            geometry: None,
            payload: JobPayload::Raw { tspl: tspl.into() },
            calibration: None,
        })
    }

    // ========== Queries ==========

    pub fn get(&self, id: &str) -> QueueResult<PrintJob> {
        self.inner
            .jobs
            .read()
            .get(id)
            .map(|e| e.job.clone())
            .ok_or_else(|| QueueError::NotFound(id.to_string()))
    }

    /// Jobs newest first, optionally filtered by status
    pub fn list(&self, status: Option<JobStatus>, limit: Option<usize>) -> Vec<PrintJob> {
        let jobs = self.inner.jobs.read();
        let mut entries: Vec<&Entry> = jobs
            .values()
            .filter(|e| status.is_none_or(|s| e.job.status == s))
            .collect();
        entries.sort_by(|a, b| b.seq.cmp(&a.seq));
        entries
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|e| e.job.clone())
            .collect()
    }

    pub fn stats(&self) -> QueueStats {
        let jobs = self.inner.jobs.read();
        let mut stats = QueueStats {
            total: jobs.len(),
            ..QueueStats::default()
        };
        for entry in jobs.values() {
            match entry.job.status {
                JobStatus::Pending => {
                    stats.pending += 1;
                    stats.pending_stickers += entry.job.payload.sticker_count().unwrap_or(0);
                }
                JobStatus::Processing => {
                    stats.processing += 1;
                    stats.current_job = Some(entry.job.id.clone());
                }
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    pub fn is_worker_running(&self) -> bool {
        self.inner.worker_running.load(Ordering::Acquire)
    }

    // ========== Mutations ==========

    /// Cancel a pending job
    ///
    /// `false` when the job is unknown or no longer pending.
    pub fn cancel(&self, id: &str) -> QueueResult<bool> {
        let mut jobs = self.inner.jobs.write();
        let Some(entry) = jobs.get_mut(id) else {
            return Ok(false);
        };
        if !entry.job.status.can_transition_to(JobStatus::Cancelled) {
            debug!(job_id = %id, status = %entry.job.status, "Cancel ignored");
            return Ok(false);
        }
        entry.job.status = JobStatus::Cancelled;
        entry.job.updated_at = Utc::now();
        info!(job_id = %id, "Job cancelled");
        Ok(true)
    }

    /// Remove a job in any state except `processing`
    pub fn delete(&self, id: &str) -> QueueResult<bool> {
        let mut jobs = self.inner.jobs.write();
        let Some(entry) = jobs.get(id) else {
            return Ok(false);
        };
        if !entry.job.status.can_delete() {
            return Err(QueueError::InvalidTransition {
                id: id.to_string(),
                from: entry.job.status,
                to: "deleted",
            });
        }
        jobs.remove(id);
        info!(job_id = %id, "Job deleted");
        Ok(true)
    }

    /// Drop completed and cancelled jobs; failed jobs stay until deleted
    pub fn clear_terminal(&self) -> usize {
        let mut jobs = self.inner.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, e| {
            !matches!(e.job.status, JobStatus::Completed | JobStatus::Cancelled)
        });
        let removed = before - jobs.len();
        info!(removed, "Cleared finished jobs");
        removed
    }

    /// Command text of a job without printing it
    ///
    /// Renders and caches on first call; later calls and the worker reuse
    /// the cached text.
    pub fn preview(&self, id: &str) -> QueueResult<String> {
        let job = self.get(id)?;
        if let Some(text) = job.rendered {
            return Ok(text);
        }
        let text = self.render(&job)?;

        let mut jobs = self.inner.jobs.write();
        let entry = jobs
            .get_mut(id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        // the worker may have rendered it meanwhile
        Ok(entry.job.rendered.get_or_insert(text).clone())
    }

    // ========== Worker ==========

    fn wake_worker(&self) {
        if self
            .inner
            .worker_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let queue = self.clone();
            tokio::spawn(async move { queue.run_worker().await });
        }
    }

    async fn run_worker(self) {
        info!("Print worker started");
        loop {
            while let Some(job) = self.claim_next() {
                self.process(job).await;
            }

            self.inner.worker_running.store(false, Ordering::Release);
            // a submit between the last claim and the store saw the flag set
            // and did not spawn; pick its job up here
            let has_pending = self
                .inner
                .jobs
                .read()
                .values()
                .any(|e| e.job.status == JobStatus::Pending);
            if !has_pending
                || self
                    .inner
                    .worker_running
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
            {
                break;
            }
        }
        info!("Print worker idle");
    }

    /// Oldest pending job, marked processing
    fn claim_next(&self) -> Option<PrintJob> {
        let mut jobs = self.inner.jobs.write();
        let entry = jobs
            .values_mut()
            .filter(|e| e.job.status == JobStatus::Pending)
            .min_by_key(|e| e.seq)?;
        entry.job.status = JobStatus::Processing;
        entry.job.updated_at = Utc::now();
        Some(entry.job.clone())
    }

    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn process(&self, job: PrintJob) {
        let text = match job.rendered.clone() {
            Some(text) => Ok(text),
            None => self.render(&job).map_err(|e| e.to_string()),
        };

        let result = match text {
            Ok(text) => {
                self.cache_rendered(&job.id, &text);
                self.transfer(&text).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!("Job completed");
                self.finish(&job.id, JobStatus::Completed, None);
            }
            Err(message) => {
                error!(error = %message, "Job failed");
                self.finish(&job.id, JobStatus::Failed, Some(message));
            }
        }
    }

    async fn transfer(&self, text: &str) -> Result<(), String> {
        let bytes = to_device_bytes(text);
        let timeout = self.inner.settings.transfer_timeout;
        match tokio::time::timeout(timeout, self.inner.device.transfer(&bytes)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(PrintError::Timeout(format!(
                "transfer did not finish within {} ms",
                timeout.as_millis()
            ))
            .to_string()),
        }
    }

    fn render(&self, job: &PrintJob) -> QueueResult<String> {
        let geometry = self.inner.catalog.resolve(&job.geometry)?;
        let calibration = job
            .calibration
            .unwrap_or(self.inner.settings.default_calibration);
        let text = match &job.payload {
            JobPayload::Single { label, copies } => render_job(
                geometry,
                LabelSet::Single {
                    label,
                    copies: *copies,
                },
                &calibration,
            )?,
            JobPayload::Batch { labels } => {
                render_job(geometry, LabelSet::Batch(labels), &calibration)?
            }
            JobPayload::Raw { tspl } => tspl.clone(),
        };
        Ok(text)
    }

    fn cache_rendered(&self, id: &str, text: &str) {
        if let Some(entry) = self.inner.jobs.write().get_mut(id)
            && entry.job.rendered.is_none()
        {
            entry.job.rendered = Some(text.to_string());
        }
    }

    fn finish(&self, id: &str, status: JobStatus, error: Option<String>) {
        let mut jobs = self.inner.jobs.write();
        let Some(entry) = jobs.get_mut(id) else {
            warn!(job_id = %id, "Finished job vanished from the queue");
            return;
        };
        if !entry.job.status.can_transition_to(status) {
            warn!(job_id = %id, from = %entry.job.status, to = %status, "Unexpected job transition");
            return;
        }
        entry.job.status = status;
        entry.job.error = error;
        entry.job.updated_at = Utc::now();
    }
}

fn validate_payload(payload: &JobPayload) -> QueueResult<()> {
    match payload {
        JobPayload::Single { label, copies } => {
            label.validate()?;
            if *copies == 0 {
                return Err(QueueError::InvalidLabel(
                    "quantity must be at least 1".to_string(),
                ));
            }
        }
        JobPayload::Batch { labels } => {
            if labels.is_empty() {
                return Err(QueueError::InvalidLabel("batch has no labels".to_string()));
            }
            for label in labels {
                label.validate()?;
            }
        }
        JobPayload::Raw { tspl } => {
            if tspl.trim().is_empty() {
                return Err(QueueError::InvalidLabel(
                    "raw command text is empty".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn validate_calibration(calibration: &Calibration) -> QueueResult<()> {
    let values = [
        calibration.padding_mm,
        calibration.offset_x_mm,
        calibration.offset_y_mm,
    ];
    if values.iter().any(|v| !v.is_finite()) || calibration.padding_mm < 0.0 {
        return Err(QueueError::InvalidGeometry(format!(
            "unusable calibration {:?}",
            calibration
        )));
    }
    Ok(())
}
