//! Job lookup and control
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /jobs?status=&limit= | GET | Jobs, newest first |
//! | /jobs/{id} | GET | One job |
//! | /jobs/{id} | DELETE | Remove a job that is not printing |
//! | /jobs/{id}/cancel | POST | Cancel a pending job |
//! | /jobs/{id}/tspl | GET | Command text the job prints |

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::printing::{JobStatus, PrintJob};
use crate::utils::{ApiQuery, AppError, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/jobs", get(list))
        .route("/jobs/{id}", get(get_by_id).delete(delete))
        .route("/jobs/{id}/cancel", post(cancel))
        .route("/jobs/{id}/tspl", get(preview))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    success: bool,
    jobs: Vec<PrintJob>,
    count: usize,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    success: bool,
    job: PrintJob,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    success: bool,
    cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    success: bool,
    deleted: bool,
}

/// GET /jobs
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<JobListResponse>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<JobStatus>)
        .transpose()
        .map_err(AppError::Validation)?;

    let jobs = state.queue.list(status, query.limit);
    Ok(Json(JobListResponse {
        success: true,
        count: jobs.len(),
        jobs,
    }))
}

/// GET /jobs/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<JobResponse>> {
    let job = state.queue.get(&id)?;
    Ok(Json(JobResponse { success: true, job }))
}

/// DELETE /jobs/{id}
///
/// 409 while the job is printing.
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    let deleted = state.queue.delete(&id)?;
    Ok(Json(DeleteResponse {
        success: true,
        deleted,
    }))
}

/// POST /jobs/{id}/cancel
///
/// `cancelled: false` when the job is unknown or already past pending.
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<CancelResponse>> {
    let cancelled = state.queue.cancel(&id)?;
    Ok(Json(CancelResponse {
        success: true,
        cancelled,
    }))
}

/// GET /jobs/{id}/tspl
pub async fn preview(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<String> {
    Ok(state.queue.preview(&id)?)
}
