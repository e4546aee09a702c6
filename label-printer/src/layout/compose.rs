//! Per-kind label composition
//!
//! Turns one [`LabelContent`] into positioned draw operations inside a
//! content box. All positions are absolute millimeters on the page;
//! calibration offsets and dot conversion are applied later by the
//! renderer.

use serde::Serialize;

use super::barcode::fit_barcode;
use super::text::{
    Font, TextLayout, find_optimal_layout_within, truncate_line,
};
use crate::label::{LabelContent, non_blank};
use crate::tspl::EccLevel;
use crate::units::DOTS_PER_MM;

/// Vertical space between two text groups
pub const GROUP_GAP_MM: f64 = 1.0;
/// Space between the QR symbol and the text column
pub const QR_TEXT_GAP_MM: f64 = 1.5;
/// The QR symbol shrinks before the text column gets narrower than this
pub const MIN_QR_TEXT_COLUMN_MM: f64 = 4.0;
pub const BARCODE_MAX_HEIGHT_MM: f64 = 4.0;
pub const BARCODE_HEIGHT_RATIO: f64 = 0.35;
pub const QR_ECC: EccLevel = EccLevel::M;

/// Area a label may draw into
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBox {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl ContentBox {
    pub fn new(x_mm: f64, y_mm: f64, width_mm: f64, height_mm: f64) -> Self {
        Self {
            x_mm,
            y_mm,
            width_mm,
            height_mm,
        }
    }

    /// Shrink by `padding_mm` on every side
    pub fn inset(&self, padding_mm: f64) -> Self {
        let pad = padding_mm.max(0.0);
        Self {
            x_mm: self.x_mm + pad,
            y_mm: self.y_mm + pad,
            width_mm: (self.width_mm - 2.0 * pad).max(0.0),
            height_mm: (self.height_mm - 2.0 * pad).max(0.0),
        }
    }

    pub fn right_mm(&self) -> f64 {
        self.x_mm + self.width_mm
    }

    pub fn bottom_mm(&self) -> f64 {
        self.y_mm + self.height_mm
    }
}

/// One positioned element of a label
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    Text {
        x_mm: f64,
        y_mm: f64,
        font: Font,
        content: String,
    },
    Qr {
        x_mm: f64,
        y_mm: f64,
        cell_width: u8,
        ecc: EccLevel,
        data: String,
    },
    Barcode {
        x_mm: f64,
        y_mm: f64,
        height_mm: f64,
        narrow_dots: u32,
        human_readable: bool,
        data: String,
    },
    Box {
        x_mm: f64,
        y_mm: f64,
        x_end_mm: f64,
        y_end_mm: f64,
        thickness_dots: u32,
    },
}

/// Lay out `label` inside `area`
pub fn compose(label: &LabelContent, area: &ContentBox) -> Vec<DrawOp> {
    let mut ops = Vec::new();
    if area.width_mm <= 0.0 || area.height_mm <= 0.0 {
        return ops;
    }
    match label {
        LabelContent::Barcode {
            title,
            subtitle,
            barcode,
        } => compose_barcode(
            title,
            non_blank(subtitle.as_deref()),
            non_blank(barcode.as_deref()),
            area,
            &mut ops,
        ),
        LabelContent::Qr {
            title,
            subtitle,
            qr_data,
            quantity,
        } => compose_qr(
            title,
            non_blank(subtitle.as_deref()),
            qr_data,
            non_blank(quantity.as_deref()),
            area,
            &mut ops,
        ),
        LabelContent::TextOnly { title, subtitle } => {
            compose_text_only(title, non_blank(subtitle.as_deref()), area, &mut ops)
        }
    }
    ops
}

fn compose_barcode(
    title: &str,
    subtitle: Option<&str>,
    barcode: Option<&str>,
    area: &ContentBox,
    ops: &mut Vec<DrawOp>,
) {
    // the barcode is placed first to reserve its strip but emitted last
    let barcode_op = barcode.and_then(|data| {
        let height = BARCODE_MAX_HEIGHT_MM.min(area.height_mm * BARCODE_HEIGHT_RATIO);
        let Some(fit) = fit_barcode(data, area.width_mm) else {
            tracing::warn!(data, width_mm = area.width_mm, "barcode does not fit");
            return None;
        };
        if fit.truncated {
            tracing::debug!(original = data, printed = %fit.data, "barcode payload truncated");
        }
        Some(DrawOp::Barcode {
            x_mm: area.x_mm + (area.width_mm - fit.width_mm()).max(0.0) / 2.0,
            y_mm: area.bottom_mm() - height,
            height_mm: height,
            narrow_dots: fit.narrow_dots,
            human_readable: false,
            data: fit.data,
        })
    });
    let bottom_reserved = match &barcode_op {
        Some(DrawOp::Barcode { height_mm, .. }) => height_mm + GROUP_GAP_MM,
        _ => 0.0,
    };

    let text_height = (area.height_mm - bottom_reserved).max(0.0);

    let subtitle_line = subtitle.and_then(|s| {
        // the subtitle gets font 2 only when the title keeps room for font 1
        let font = if text_height >= Font::F2.height_mm() + GROUP_GAP_MM + Font::F1.height_mm() {
            Font::F2
        } else {
            Font::F1
        };
        let line = truncate_line(s, area.width_mm, font);
        (!line.is_empty() && font.height_mm() <= text_height).then_some((font, line))
    });
    let subtitle_height = subtitle_line
        .as_ref()
        .map(|(font, _)| font.height_mm() + GROUP_GAP_MM)
        .unwrap_or(0.0);

    let title_lines = if subtitle_line.is_some() { 1 } else { 2 };
    let title_layout = find_optimal_layout_within(
        title,
        area.width_mm,
        (text_height - subtitle_height).max(0.0),
        title_lines,
        Font::LARGEST,
    );

    let mut y = area.y_mm;
    push_lines(&title_layout, area.x_mm, area.width_mm, y, true, ops);
    y += title_layout.height_mm() + GROUP_GAP_MM;

    if let Some((font, line)) = subtitle_line {
        let width = line.chars().count() as f64 * font.width_mm();
        ops.push(DrawOp::Text {
            x_mm: area.x_mm + (area.width_mm - width).max(0.0) / 2.0,
            y_mm: y,
            font,
            content: line,
        });
    }
    ops.extend(barcode_op);
}

fn compose_qr(
    title: &str,
    subtitle: Option<&str>,
    qr_data: &str,
    quantity: Option<&str>,
    area: &ContentBox,
    ops: &mut Vec<DrawOp>,
) {
    let side_mm = area
        .height_mm
        .min(area.width_mm - QR_TEXT_GAP_MM - MIN_QR_TEXT_COLUMN_MM)
        .max(0.0);
    let cell_width = qr_cell_width(qr_data, side_mm);
    let symbol_mm = qr_symbol_mm(qr_data, cell_width);
    ops.push(DrawOp::Qr {
        x_mm: area.x_mm,
        y_mm: area.y_mm + ((area.height_mm - symbol_mm) / 2.0).max(0.0),
        cell_width,
        ecc: QR_ECC,
        data: qr_data.to_string(),
    });

    let text_x = area.x_mm + side_mm + QR_TEXT_GAP_MM;
    let text_width = area.right_mm() - text_x;
    if text_width < Font::F1.width_mm() {
        tracing::warn!(width_mm = area.width_mm, "no room for qr label text");
        return;
    }

    let caption = quantity.and_then(|q| {
        let font = if area.height_mm >= 3.0 * Font::F2.height_mm() {
            Font::F2
        } else {
            Font::F1
        };
        let line = truncate_line(q, text_width, font);
        (!line.is_empty()).then(|| TextLayout {
            font,
            lines: vec![line],
            fits: true,
        })
    });
    let caption_height = caption
        .as_ref()
        .map(|c| c.height_mm() + GROUP_GAP_MM)
        .unwrap_or(0.0);

    let subtitle_layout = subtitle
        .map(|s| {
            find_optimal_layout_within(
                s,
                text_width,
                (area.height_mm - caption_height) / 2.0,
                2,
                Font::LARGEST,
            )
        })
        .filter(|l| !l.is_empty());
    let subtitle_height = subtitle_layout
        .as_ref()
        .map(|l| l.height_mm() + GROUP_GAP_MM)
        .unwrap_or(0.0);

    let title_layout = find_optimal_layout_within(
        title,
        text_width,
        (area.height_mm - caption_height - subtitle_height).max(0.0),
        3,
        Font::LARGEST,
    );

    let groups: Vec<&TextLayout> = [Some(&title_layout), subtitle_layout.as_ref(), caption.as_ref()]
        .into_iter()
        .flatten()
        .filter(|g| !g.is_empty())
        .collect();
    let used: f64 = groups.iter().map(|g| g.height_mm()).sum();
    let unused = (area.height_mm - used).max(0.0);

    let (mut y, gap) = if groups.len() > 1 {
        (area.y_mm, unused / (groups.len() - 1) as f64)
    } else {
        (area.y_mm + unused / 2.0, 0.0)
    };
    for group in groups {
        push_lines(group, text_x, text_width, y, false, ops);
        y += group.height_mm() + gap;
    }
}

fn compose_text_only(title: &str, subtitle: Option<&str>, area: &ContentBox, ops: &mut Vec<DrawOp>) {
    let (title_lines, reserve) = match subtitle {
        Some(_) => (2, Font::F1.height_mm() + GROUP_GAP_MM),
        None => (3, 0.0),
    };
    let title_layout = find_optimal_layout_within(
        title,
        area.width_mm,
        (area.height_mm - reserve).max(0.0),
        title_lines,
        Font::LARGEST,
    );

    let remaining = area.height_mm - title_layout.height_mm() - GROUP_GAP_MM;
    let subtitle_layout = subtitle
        .filter(|_| remaining >= Font::F1.height_mm())
        .map(|s| find_optimal_layout_within(s, area.width_mm, remaining, 1, Font::F3))
        .filter(|l| !l.is_empty());

    let block_height = title_layout.height_mm()
        + subtitle_layout
            .as_ref()
            .map(|l| GROUP_GAP_MM + l.height_mm())
            .unwrap_or(0.0);
    let mut y = area.y_mm + ((area.height_mm - block_height) / 2.0).max(0.0);

    push_lines(&title_layout, area.x_mm, area.width_mm, y, true, ops);
    y += title_layout.height_mm() + GROUP_GAP_MM;
    if let Some(layout) = subtitle_layout {
        push_lines(&layout, area.x_mm, area.width_mm, y, true, ops);
    }
}

fn push_lines(
    layout: &TextLayout,
    x_mm: f64,
    width_mm: f64,
    top_mm: f64,
    centered: bool,
    ops: &mut Vec<DrawOp>,
) {
    for (i, line) in layout.lines.iter().enumerate() {
        let x = if centered {
            x_mm + (width_mm - layout.line_width_mm(line)).max(0.0) / 2.0
        } else {
            x_mm
        };
        ops.push(DrawOp::Text {
            x_mm: x,
            y_mm: top_mm + i as f64 * layout.line_pitch_mm(),
            font: layout.font,
            content: line.clone(),
        });
    }
}

/// Byte-mode capacity of QR versions 1..=20 at error correction level M
const QR_CAPACITY_M: [usize; 20] = [
    14, 26, 42, 62, 84, 106, 122, 152, 180, 213, 251, 287, 331, 362, 412, 450, 504, 560, 624, 666,
];

/// Modules per side of the smallest QR symbol holding `data`
pub fn qr_modules(data: &str) -> u32 {
    let len = data.len();
    let version = QR_CAPACITY_M
        .iter()
        .position(|&cap| len <= cap)
        .map(|i| i as u32 + 1)
        .unwrap_or(40);
    17 + 4 * version
}

/// Largest cell width (1..=10 dots) that keeps the symbol inside `side_mm`
pub fn qr_cell_width(data: &str, side_mm: f64) -> u8 {
    let side_dots = (side_mm.max(0.0) * DOTS_PER_MM).floor() as u32;
    (side_dots / qr_modules(data)).clamp(1, 10) as u8
}

fn qr_symbol_mm(data: &str, cell_width: u8) -> f64 {
    (qr_modules(data) * cell_width as u32) as f64 / DOTS_PER_MM
}
