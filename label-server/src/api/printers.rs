//! Printer connection
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /printers | GET | Discover attached printers |
//! | /printers/connect | POST | Open a printer and remember it |
//! | /printers/disconnect | POST | Close the printer and forget it |
//! | /printers/status | GET | Connection snapshot |
//!
//! A connect body names one of `{vendorId, productId}`, `{path}` or
//! `{host, port}`. An empty body connects the first discovered printer.

use axum::extract::rejection::JsonRejection;
use axum::{Json, Router, extract::State, routing::get, routing::post};
use label_printer::{DeviceDescriptor, DeviceInfo, PrintError, SessionStatus};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/printers", get(list))
        .route("/printers/connect", post(connect))
        .route("/printers/disconnect", post(disconnect))
        .route("/printers/status", get(status))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub bus: Option<u8>,
    pub address: Option<u8>,
    pub path: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl ConnectRequest {
    /// `None` when the body names no printer at all
    fn descriptor(self) -> AppResult<Option<DeviceDescriptor>> {
        match self {
            ConnectRequest {
                vendor_id: Some(vendor_id),
                product_id: Some(product_id),
                bus,
                address,
                ..
            } => Ok(Some(DeviceDescriptor::Usb {
                vendor_id,
                product_id,
                bus,
                address,
            })),
            ConnectRequest {
                vendor_id: Some(_),
                ..
            }
            | ConnectRequest {
                product_id: Some(_),
                ..
            } => Err(AppError::Validation(
                "vendorId and productId must be given together".to_string(),
            )),
            ConnectRequest {
                path: Some(path), ..
            } => Ok(Some(DeviceDescriptor::Port { path })),
            ConnectRequest {
                host: Some(host),
                port,
                ..
            } => Ok(Some(DeviceDescriptor::Network {
                host,
                port: port.unwrap_or(label_printer::device::DEFAULT_NETWORK_PORT),
            })),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PrintersResponse {
    success: bool,
    printers: Vec<DeviceInfo>,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    success: bool,
    printer: DeviceDescriptor,
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    success: bool,
    status: SessionStatus,
}

/// GET /printers
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<PrintersResponse>> {
    let printers = state.device.discover().await?;
    Ok(Json(PrintersResponse {
        success: true,
        printers,
    }))
}

/// POST /printers/connect
pub async fn connect(
    State(state): State<ServerState>,
    body: Result<Json<ConnectRequest>, JsonRejection>,
) -> AppResult<Json<ConnectResponse>> {
    let request = match body {
        Ok(Json(request)) => request,
        // no JSON body at all
        Err(JsonRejection::MissingJsonContentType(_)) => ConnectRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    let descriptor = match request.descriptor()? {
        Some(descriptor) => descriptor,
        None => state
            .device
            .discover()
            .await?
            .into_iter()
            .next()
            .map(|info| info.descriptor)
            .ok_or_else(|| PrintError::DeviceNotFound("no printer attached".to_string()))?,
    };

    state.device.connect(descriptor.clone()).await?;
    tracing::info!(printer = %descriptor, "Printer connected");

    Ok(Json(ConnectResponse {
        success: true,
        printer: descriptor,
    }))
}

/// POST /printers/disconnect
pub async fn disconnect(State(state): State<ServerState>) -> Json<DisconnectResponse> {
    state.device.disconnect().await;
    Json(DisconnectResponse { success: true })
}

/// GET /printers/status
pub async fn status(State(state): State<ServerState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        status: state.device.status().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ConnectRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_descriptor_forms() {
        assert_eq!(
            request(r#"{"vendorId":4611,"productId":1}"#).descriptor().unwrap(),
            Some(DeviceDescriptor::usb(0x1203, 1))
        );
        assert_eq!(
            request(r#"{"path":"/dev/usb/lp0"}"#).descriptor().unwrap(),
            Some(DeviceDescriptor::Port {
                path: "/dev/usb/lp0".into()
            })
        );
        assert_eq!(
            request(r#"{"host":"10.0.0.7"}"#).descriptor().unwrap(),
            Some(DeviceDescriptor::Network {
                host: "10.0.0.7".into(),
                port: 9100
            })
        );
        assert_eq!(request("{}").descriptor().unwrap(), None);
    }

    #[test]
    fn test_half_usb_identity_rejected() {
        assert!(matches!(
            request(r#"{"vendorId":4611}"#).descriptor(),
            Err(AppError::Validation(_))
        ));
    }
}
