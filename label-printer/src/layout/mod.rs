//! Layout engine
//!
//! Fits variable-length text and barcodes into fixed millimeter regions by
//! choosing font sizes, wrapping and truncation. Output is a list of
//! [`DrawOp`]s in millimeters; nothing here knows about the wire protocol.

pub mod barcode;
pub mod compose;
pub mod text;

pub use barcode::{BarcodeFit, MIN_BARCODE_CHARS, fit_barcode};
pub use compose::{ContentBox, DrawOp, compose, qr_cell_width, qr_modules};
pub use text::{
    Font, TextLayout, chars_per_line, find_optimal_layout, find_optimal_layout_within,
    is_lossless, wrap,
};
