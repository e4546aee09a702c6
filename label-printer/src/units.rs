//! Millimeter / dot / inch conversion
//!
//! Layout works in millimeters; the printer addresses dots. Conversion
//! happens once, right before a command is encoded.

use crate::error::{PrintError, PrintResult};

/// Print head resolution (203 dpi heads)
pub const DOTS_PER_MM: f64 = 8.0;

const MM_PER_INCH: f64 = 25.4;

/// Convert a millimeter position to the nearest dot
///
/// Non-finite or negative positions mean the caller computed a broken
/// layout and are rejected instead of being clamped.
pub fn mm_to_dots(mm: f64) -> PrintResult<u32> {
    if !mm.is_finite() {
        return Err(PrintError::InvalidGeometry(format!(
            "non-finite coordinate: {}",
            mm
        )));
    }
    let dots = (mm * DOTS_PER_MM).round();
    if dots < 0.0 {
        return Err(PrintError::InvalidGeometry(format!(
            "negative coordinate: {:.2} mm",
            mm
        )));
    }
    if dots > u32::MAX as f64 {
        return Err(PrintError::InvalidGeometry(format!(
            "coordinate out of range: {:.2} mm",
            mm
        )));
    }
    Ok(dots as u32)
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}
