//! Queue overview
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /queue/stats | GET | Counters per status |
//! | /queue/clear | POST | Drop completed and cancelled jobs |

use axum::{Json, Router, extract::State, routing::get, routing::post};
use serde::Serialize;

use crate::core::ServerState;
use crate::printing::QueueStats;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/queue/stats", get(stats))
        .route("/queue/clear", post(clear))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    success: bool,
    stats: QueueStats,
    worker_running: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    success: bool,
    removed: usize,
}

/// GET /queue/stats
pub async fn stats(State(state): State<ServerState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        success: true,
        stats: state.queue.stats(),
        worker_running: state.queue.is_worker_running(),
    })
}

/// POST /queue/clear
pub async fn clear(State(state): State<ServerState>) -> Json<ClearResponse> {
    let removed = state.queue.clear_terminal();
    Json(ClearResponse {
        success: true,
        removed,
    })
}
