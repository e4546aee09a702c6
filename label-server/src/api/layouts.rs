//! Geometry profiles
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /layouts | GET | All label stocks and the default id |

use axum::{Json, Router, extract::State, routing::get};
use label_printer::GeometryProfile;
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/layouts", get(list))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutsResponse {
    success: bool,
    default_layout: &'static str,
    layouts: Vec<GeometryProfile>,
}

/// GET /layouts
pub async fn list(State(state): State<ServerState>) -> Json<LayoutsResponse> {
    Json(LayoutsResponse {
        success: true,
        default_layout: state.catalog.default_id(),
        layouts: state.catalog.list().to_vec(),
    })
}
