//! TSPL command builder
//!
//! Provides a fluent API for building the line-oriented command text that
//! TSC-compatible label printers accept. Every command is one line ending in
//! CR LF. Coordinates are dots; page size and gap are inches.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layout::Font;
use crate::units::mm_to_inches;

/// Line separator required by the printer
pub const LINE_END: &str = "\r\n";

/// Print direction used for every page
pub const DEFAULT_DIRECTION: u8 = 1;

/// Fixed linear symbology
const BARCODE_SYMBOLOGY: &str = "128";

/// Wide bar = narrow × 2
const WIDE_TO_NARROW: u32 = 2;

/// QR error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EccLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl fmt::Display for EccLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            EccLevel::L => "L",
            EccLevel::M => "M",
            EccLevel::Q => "Q",
            EccLevel::H => "H",
        };
        f.write_str(c)
    }
}

/// Clockwise rotation of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }
}

/// TSPL command builder
///
/// Append-only; [`TsplBuilder::reset`] clears it for reuse.
#[derive(Debug, Default, Clone)]
pub struct TsplBuilder {
    buf: String,
}

impl TsplBuilder {
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(512),
        }
    }

    fn line(&mut self, command: fmt::Arguments<'_>) -> &mut Self {
        use fmt::Write;
        // writing into a String cannot fail
        let _ = self.buf.write_fmt(command);
        self.buf.push_str(LINE_END);
        self
    }

    // === Page Setup ===

    /// Label size, given in millimeters and sent in inches
    pub fn size(&mut self, width_mm: f64, height_mm: f64) -> &mut Self {
        self.line(format_args!(
            "SIZE {:.2},{:.2}",
            mm_to_inches(width_mm),
            mm_to_inches(height_mm)
        ))
    }

    /// Gap between labels and its offset, in millimeters
    pub fn gap(&mut self, gap_mm: f64, offset_mm: f64) -> &mut Self {
        self.line(format_args!(
            "GAP {:.2},{:.2}",
            mm_to_inches(gap_mm),
            mm_to_inches(offset_mm)
        ))
    }

    pub fn direction(&mut self, direction: u8) -> &mut Self {
        self.line(format_args!("DIRECTION {},0", direction.min(1)))
    }

    /// Clear the image buffer
    pub fn cls(&mut self) -> &mut Self {
        self.line(format_args!("CLS"))
    }

    // === Content ===

    /// QR code; cell width is clamped to 1-10 dots
    pub fn qr(
        &mut self,
        x: u32,
        y: u32,
        ecc: EccLevel,
        cell_width: u8,
        rotation: Rotation,
        data: &str,
    ) -> &mut Self {
        let cell = cell_width.clamp(1, 10);
        self.line(format_args!(
            "QRCODE {},{},{},{},A,{},\"{}\"",
            x,
            y,
            ecc,
            cell,
            rotation.degrees(),
            escape(data)
        ))
    }

    /// Text in a built-in font; multipliers are clamped to 1-10
    #[allow(clippy::too_many_arguments)]
    pub fn text(
        &mut self,
        x: u32,
        y: u32,
        font: Font,
        rotation: Rotation,
        x_mul: u8,
        y_mul: u8,
        content: &str,
    ) -> &mut Self {
        self.line(format_args!(
            "TEXT {},{},\"{}\",{},{},{},\"{}\"",
            x,
            y,
            font.id(),
            rotation.degrees(),
            x_mul.clamp(1, 10),
            y_mul.clamp(1, 10),
            escape(content)
        ))
    }

    /// Code 128 barcode with a 1:2 narrow/wide ratio
    #[allow(clippy::too_many_arguments)]
    pub fn barcode(
        &mut self,
        x: u32,
        y: u32,
        height: u32,
        human_readable: bool,
        rotation: Rotation,
        narrow: u32,
        data: &str,
    ) -> &mut Self {
        let narrow = narrow.max(1);
        self.line(format_args!(
            "BARCODE {},{},\"{}\",{},{},{},{},{},\"{}\"",
            x,
            y,
            BARCODE_SYMBOLOGY,
            height,
            u8::from(human_readable),
            rotation.degrees(),
            narrow,
            narrow * WIDE_TO_NARROW,
            escape(data)
        ))
    }

    /// Rectangle from corner to corner
    pub fn draw_box(&mut self, x: u32, y: u32, x_end: u32, y_end: u32, thickness: u32) -> &mut Self {
        self.line(format_args!(
            "BOX {},{},{},{},{}",
            x,
            y,
            x_end,
            y_end,
            thickness.max(1)
        ))
    }

    // === Output ===

    /// Print `sets` label sets, `copies` copies each
    pub fn print(&mut self, sets: u32, copies: u32) -> &mut Self {
        self.line(format_args!("PRINT {},{}", sets.max(1), copies.max(1)))
    }

    /// Append an already-formed command line
    pub fn raw(&mut self, command: &str) -> &mut Self {
        self.line(format_args!("{}", command.trim_end_matches(['\r', '\n'])))
    }

    // === Build ===

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn reset(&mut self) -> &mut Self {
        self.buf.clear();
        self
    }

    /// Finalize and return the accumulated command text
    pub fn build(self) -> String {
        self.buf
    }
}

/// Make a string safe inside a quoted TSPL parameter
///
/// Double quotes become the `\["]` escape; line breaks and other control
/// characters would end the command early and are dropped.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\[\"]"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
