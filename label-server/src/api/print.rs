//! Job submission
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /print | POST | Queue a label (`label` + `quantity`) or a batch (`labels`) |
//! | /print/custom | POST | Queue pre-built command text |
//!
//! # Request
//!
//! ```json
//! {
//!   "pageConfig": "default",
//!   "label": { "qrData": "https://example.com/p/1", "title": "P-1", "subtitle": "Lot 7" },
//!   "quantity": 2
//! }
//! ```
//!
//! `layoutKind` may be omitted: labels with `qrData` use the qr layout,
//! labels with `barcode` the barcode layout, everything else text only.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use label_printer::{Calibration, LabelContent};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::printing::{JobRequest, PrintJob};
use crate::utils::{ApiJson, AppError, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/print", post(submit))
        .route("/print/custom", post(submit_custom))
}

/// Label as sent by clients
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelInput {
    pub layout_kind: Option<String>,
    #[serde(default)]
    pub title: String,
    pub subtitle: Option<String>,
    #[serde(alias = "barcodeData")]
    pub barcode: Option<String>,
    pub qr_data: Option<String>,
    /// Printed text, e.g. "x3"; unrelated to the copy count
    pub quantity: Option<String>,
}

impl TryFrom<LabelInput> for LabelContent {
    type Error = AppError;

    fn try_from(input: LabelInput) -> AppResult<Self> {
        let LabelInput {
            layout_kind,
            title,
            subtitle,
            barcode,
            qr_data,
            quantity,
        } = input;
        let kind = match layout_kind.as_deref() {
            Some(kind) => kind,
            None if qr_data.is_some() => "qr",
            None if barcode.is_some() => "barcode",
            None => "text-only",
        };

        match kind {
            "qr" => Ok(LabelContent::Qr {
                title,
                subtitle,
                qr_data: qr_data.unwrap_or_default(),
                quantity,
            }),
            "barcode" => Ok(LabelContent::Barcode {
                title,
                subtitle,
                barcode,
            }),
            "text-only" | "text" => Ok(LabelContent::TextOnly { title, subtitle }),
            other => Err(AppError::Validation(format!("unknown layoutKind '{}'", other))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    pub page_config: Option<String>,
    pub label: Option<LabelInput>,
    pub labels: Option<Vec<LabelInput>>,
    /// Copies of `label`; 1 when absent
    pub quantity: Option<u32>,
    pub calibration: Option<Calibration>,
}

impl TryFrom<PrintRequest> for JobRequest {
    type Error = AppError;

    fn try_from(req: PrintRequest) -> AppResult<Self> {
        let mut job = match (req.label, req.labels) {
            (Some(label), None) => {
                JobRequest::single(label.try_into()?, req.quantity.unwrap_or(1))
            }
            (None, Some(labels)) => JobRequest::batch(
                labels
                    .into_iter()
                    .map(LabelContent::try_from)
                    .collect::<AppResult<Vec<_>>>()?,
            ),
            (Some(_), Some(_)) => {
                return Err(AppError::Validation(
                    "send either label or labels, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(AppError::Validation("label or labels is required".to_string()));
            }
        };
        if let Some(geometry) = req.page_config.filter(|id| !id.trim().is_empty()) {
            job = job.with_geometry(geometry);
        }
        if let Some(calibration) = req.calibration {
            job = job.with_calibration(calibration);
        }
        Ok(job)
    }
}

#[derive(Debug, Deserialize)]
pub struct CustomRequest {
    pub tspl: String,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub success: bool,
    pub job: PrintJob,
}

/// POST /print
pub async fn submit(
    State(state): State<ServerState>,
    ApiJson(req): ApiJson<PrintRequest>,
) -> AppResult<(StatusCode, Json<JobResponse>)> {
    let job = state.queue.submit(req.try_into()?)?;
    tracing::info!(
        job_id = %job.id,
        kind = job.payload.kind(),
        stickers = job.payload.sticker_count().unwrap_or_default(),
        "Print job queued"
    );
    Ok((StatusCode::CREATED, Json(JobResponse { success: true, job })))
}

/// POST /print/custom
pub async fn submit_custom(
    State(state): State<ServerState>,
    ApiJson(req): ApiJson<CustomRequest>,
) -> AppResult<(StatusCode, Json<JobResponse>)> {
    let job = state.queue.submit_raw(req.tspl)?;
    tracing::info!(job_id = %job.id, "Raw print job queued");
    Ok((StatusCode::CREATED, Json(JobResponse { success: true, job })))
}
