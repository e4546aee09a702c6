//! Linear barcode sizing
//!
//! Code 128 width model: each symbol character is 11 modules, start, stop
//! and checksum add 35, and the quiet zones reserve another 20 modules.

use crate::units::DOTS_PER_MM;

/// Payloads are never truncated below this many characters
pub const MIN_BARCODE_CHARS: usize = 4;

/// Narrow bar widths tried, widest first
const NARROW_CANDIDATES: [u32; 2] = [2, 1];

/// Symbol width without quiet zones
pub fn symbol_width_dots(chars: usize, narrow_dots: u32) -> u32 {
    (11 * chars as u32 + 35) * narrow_dots
}

/// Width the symbol needs including the quiet-zone reserve
pub fn required_width_dots(chars: usize, narrow_dots: u32) -> u32 {
    symbol_width_dots(chars, narrow_dots) + 20 * narrow_dots
}

/// A payload and bar width that fit the available width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeFit {
    pub data: String,
    pub narrow_dots: u32,
    pub truncated: bool,
}

impl BarcodeFit {
    pub fn width_mm(&self) -> f64 {
        symbol_width_dots(self.data.chars().count(), self.narrow_dots) as f64 / DOTS_PER_MM
    }
}

/// Choose a narrow bar width for `data` inside `max_width_mm`
///
/// Tries narrow widths 2 then 1 with the whole payload, then shortens the
/// payload at width 1 down to [`MIN_BARCODE_CHARS`]. `None` means the
/// barcode cannot be printed in that width at all.
pub fn fit_barcode(data: &str, max_width_mm: f64) -> Option<BarcodeFit> {
    let chars: Vec<char> = data.trim().chars().collect();
    if chars.is_empty() || !max_width_mm.is_finite() || max_width_mm <= 0.0 {
        return None;
    }
    let max_dots = (max_width_mm * DOTS_PER_MM).floor() as u32;

    for narrow in NARROW_CANDIDATES {
        if required_width_dots(chars.len(), narrow) <= max_dots {
            return Some(BarcodeFit {
                data: chars.iter().collect(),
                narrow_dots: narrow,
                truncated: false,
            });
        }
    }

    (MIN_BARCODE_CHARS..chars.len())
        .rev()
        .find(|&len| required_width_dots(len, 1) <= max_dots)
        .map(|len| BarcodeFit {
            data: chars[..len].iter().collect(),
            narrow_dots: 1,
            truncated: true,
        })
}
