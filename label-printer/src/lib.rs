//! # label-printer
//!
//! TSPL thermal label printing - layout and transport only.
//!
//! ## Scope
//!
//! This crate handles HOW a label is printed:
//! - Label stock geometry catalog
//! - Text/QR/barcode layout in millimeters
//! - TSPL command encoding and page splitting
//! - Device session with USB, device-node and network transports
//!
//! Job bookkeeping (WHEN to print) lives in `label-server`.
//!
//! ## Example
//!
//! ```ignore
//! use label_printer::{
//!     Calibration, DeviceDescriptor, DeviceSession, GeometryCatalog, LabelContent, LabelSet,
//!     SystemDriver, render_job, to_device_bytes,
//! };
//!
//! let catalog = GeometryCatalog::builtin();
//! let label = LabelContent::Barcode {
//!     title: "ABC".into(),
//!     subtitle: None,
//!     barcode: Some("SKU1".into()),
//! };
//! let tspl = render_job(
//!     catalog.default_profile(),
//!     LabelSet::Single { label: &label, copies: 1 },
//!     &Calibration::default(),
//! )?;
//!
//! let session = DeviceSession::new(Arc::new(SystemDriver::new()));
//! session.connect(DeviceDescriptor::usb(0x1203, 0x0230)).await?;
//! session.transfer(&to_device_bytes(&tspl)).await?;
//! ```

pub mod device;
mod encoding;
mod error;
pub mod geometry;
mod label;
pub mod layout;
mod render;
pub mod tspl;
pub mod units;

// Re-exports
pub use device::{
    DeviceDescriptor, DeviceInfo, DeviceSession, Driver, Link, SessionStatus, SystemDriver,
};
pub use encoding::{is_device_encodable, to_device_bytes};
pub use error::{PrintError, PrintResult};
pub use geometry::{GeometryCatalog, GeometryProfile};
pub use label::{Calibration, LabelContent};
pub use render::{LabelSet, render_job};
pub use tspl::{EccLevel, TsplBuilder};
