//! Page rendering
//!
//! Glues layout output to the TSPL builder. A multi-column stock prints full
//! rows as one wide page; stickers left over after the last full row are
//! printed one per page at sticker size, because the printer's page size
//! differs between the two cases.

use tracing::instrument;

use crate::error::{PrintError, PrintResult};
use crate::geometry::GeometryProfile;
use crate::label::{Calibration, LabelContent};
use crate::layout::{ContentBox, DrawOp, compose};
use crate::tspl::{DEFAULT_DIRECTION, Rotation, TsplBuilder};
use crate::units::mm_to_dots;

/// Outline thickness drawn when calibration asks for it
const OUTLINE_DOTS: u32 = 2;

/// What a job prints
#[derive(Debug, Clone, Copy)]
pub enum LabelSet<'a> {
    /// One label repeated `copies` times
    Single {
        label: &'a LabelContent,
        copies: u32,
    },
    /// Different labels, one sticker each
    Batch(&'a [LabelContent]),
}

/// Render a job into TSPL command text
///
/// Pure: the same arguments always produce the same text.
#[instrument(skip_all, fields(geometry = geometry.id))]
pub fn render_job(
    geometry: &GeometryProfile,
    labels: LabelSet<'_>,
    calibration: &Calibration,
) -> PrintResult<String> {
    let columns = geometry.columns.max(1) as usize;
    let mut out = TsplBuilder::new();

    match labels {
        LabelSet::Single { label, copies } => {
            label.validate()?;
            if copies == 0 {
                return Err(PrintError::InvalidLabel("copies must be at least 1".to_string()));
            }
            let rows = copies / columns as u32;
            let remainder = copies % columns as u32;
            if rows > 0 {
                let row: Vec<&LabelContent> = vec![label; columns];
                render_row_page(&mut out, geometry, &row, calibration, rows)?;
            }
            for _ in 0..remainder {
                render_single_page(&mut out, geometry, label, calibration)?;
            }
        }
        LabelSet::Batch(labels) => {
            if labels.is_empty() {
                return Err(PrintError::InvalidLabel("batch has no labels".to_string()));
            }
            for label in labels {
                label.validate()?;
            }
            let mut chunks = labels.chunks_exact(columns);
            for chunk in chunks.by_ref() {
                let row: Vec<&LabelContent> = chunk.iter().collect();
                render_row_page(&mut out, geometry, &row, calibration, 1)?;
            }
            for label in chunks.remainder() {
                render_single_page(&mut out, geometry, label, calibration)?;
            }
        }
    }

    tracing::debug!(bytes = out.as_str().len(), "job rendered");
    Ok(out.build())
}

/// Full row: page is the whole liner, column `i` starts at its column offset
fn render_row_page(
    out: &mut TsplBuilder,
    geometry: &GeometryProfile,
    row: &[&LabelContent],
    calibration: &Calibration,
    sets: u32,
) -> PrintResult<()> {
    begin_page(out, geometry, geometry.page_width_mm(), geometry.page_height_mm());
    for (column, label) in row.iter().enumerate() {
        let sticker = ContentBox::new(
            geometry.column_offset_mm(column as u32),
            geometry.margin_mm,
            geometry.sticker_width_mm,
            geometry.sticker_height_mm,
        );
        draw_sticker(out, label, &sticker, calibration)?;
    }
    out.print(sets, 1);
    Ok(())
}

/// Lone sticker: page is the sticker itself, no margin offset
fn render_single_page(
    out: &mut TsplBuilder,
    geometry: &GeometryProfile,
    label: &LabelContent,
    calibration: &Calibration,
) -> PrintResult<()> {
    begin_page(
        out,
        geometry,
        geometry.sticker_width_mm,
        geometry.sticker_height_mm,
    );
    let sticker = ContentBox::new(
        0.0,
        0.0,
        geometry.sticker_width_mm,
        geometry.sticker_height_mm,
    );
    draw_sticker(out, label, &sticker, calibration)?;
    out.print(1, 1);
    Ok(())
}

fn begin_page(out: &mut TsplBuilder, geometry: &GeometryProfile, width_mm: f64, height_mm: f64) {
    out.size(width_mm, height_mm)
        .gap(geometry.gap_mm, 0.0)
        .direction(DEFAULT_DIRECTION)
        .cls();
}

fn draw_sticker(
    out: &mut TsplBuilder,
    label: &LabelContent,
    sticker: &ContentBox,
    calibration: &Calibration,
) -> PrintResult<()> {
    let mut ops = compose(label, &sticker.inset(calibration.padding_mm));
    if calibration.outline {
        ops.push(DrawOp::Box {
            x_mm: sticker.x_mm,
            y_mm: sticker.y_mm,
            x_end_mm: sticker.right_mm(),
            y_end_mm: sticker.bottom_mm(),
            thickness_dots: OUTLINE_DOTS,
        });
    }
    for op in &ops {
        encode_op(out, op, calibration)?;
    }
    Ok(())
}

/// Convert one draw op to dots (after calibration) and append it
pub fn encode_op(out: &mut TsplBuilder, op: &DrawOp, calibration: &Calibration) -> PrintResult<()> {
    let x = |mm: f64| mm_to_dots(mm + calibration.offset_x_mm);
    let y = |mm: f64| mm_to_dots(mm + calibration.offset_y_mm);

    match op {
        DrawOp::Text {
            x_mm,
            y_mm,
            font,
            content,
        } => {
            out.text(x(*x_mm)?, y(*y_mm)?, *font, Rotation::R0, 1, 1, content);
        }
        DrawOp::Qr {
            x_mm,
            y_mm,
            cell_width,
            ecc,
            data,
        } => {
            out.qr(x(*x_mm)?, y(*y_mm)?, *ecc, *cell_width, Rotation::R0, data);
        }
        DrawOp::Barcode {
            x_mm,
            y_mm,
            height_mm,
            narrow_dots,
            human_readable,
            data,
        } => {
            out.barcode(
                x(*x_mm)?,
                y(*y_mm)?,
                mm_to_dots(*height_mm)?.max(1),
                *human_readable,
                Rotation::R0,
                *narrow_dots,
                data,
            );
        }
        DrawOp::Box {
            x_mm,
            y_mm,
            x_end_mm,
            y_end_mm,
            thickness_dots,
        } => {
            out.draw_box(
                x(*x_mm)?,
                y(*y_mm)?,
                x(*x_end_mm)?,
                y(*y_end_mm)?,
                *thickness_dots,
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryCatalog;

    fn commands(text: &str) -> Vec<&str> {
        text.split("\r\n")
            .filter(|l| !l.is_empty())
            .map(|l| l.split_whitespace().next().unwrap_or(""))
            .collect()
    }

    fn abc_label() -> LabelContent {
        LabelContent::Barcode {
            title: "ABC".to_string(),
            subtitle: None,
            barcode: Some("SKU1".to_string()),
        }
    }

    #[test]
    fn test_barcode_label_on_default_profile() {
        let catalog = GeometryCatalog::builtin();
        let label = abc_label();
        let out = render_job(
            catalog.default_profile(),
            LabelSet::Single {
                label: &label,
                copies: 1,
            },
            &Calibration::default(),
        )
        .unwrap();

        assert!(out.starts_with("SIZE 1.97,1.18\r\n"));
        assert!(out.ends_with("PRINT 1,1\r\n"));
        assert_eq!(
            commands(&out),
            vec!["SIZE", "GAP", "DIRECTION", "CLS", "TEXT", "BARCODE", "PRINT"]
        );
        let text = out.lines().find(|l| l.starts_with("TEXT")).unwrap();
        assert!(text.ends_with(",\"ABC\""));
        let barcode = out.lines().find(|l| l.starts_with("BARCODE")).unwrap();
        assert!(barcode.ends_with(",\"SKU1\""));
    }

    #[test]
    fn test_full_row_and_remainder_split() {
        let catalog = GeometryCatalog::builtin();
        let geometry = catalog.resolve("triple-30x20").unwrap();
        let label = LabelContent::TextOnly {
            title: "Box".to_string(),
            subtitle: None,
        };
        let out = render_job(
            geometry,
            LabelSet::Single {
                label: &label,
                copies: 5,
            },
            &Calibration::default(),
        )
        .unwrap();

        let sizes: Vec<&str> = out.lines().filter(|l| l.starts_with("SIZE")).collect();
        // 97 x 23 mm row page, then two 30 x 20 mm sticker pages
        assert_eq!(sizes, vec!["SIZE 3.82,0.91", "SIZE 1.18,0.79", "SIZE 1.18,0.79"]);
        let prints: Vec<&str> = out.lines().filter(|l| l.starts_with("PRINT")).collect();
        assert_eq!(prints, vec!["PRINT 1,1", "PRINT 1,1", "PRINT 1,1"]);
        // the row page carries one title per column
        let first_page: Vec<&str> = out
            .split("PRINT")
            .next()
            .unwrap()
            .lines()
            .filter(|l| l.starts_with("TEXT"))
            .collect();
        assert_eq!(first_page.len(), 3);
    }

    #[test]
    fn test_multiple_full_rows_share_one_page() {
        let catalog = GeometryCatalog::builtin();
        let geometry = catalog.resolve("dual-50x25").unwrap();
        let label = LabelContent::TextOnly {
            title: "Row".to_string(),
            subtitle: None,
        };
        let out = render_job(
            geometry,
            LabelSet::Single {
                label: &label,
                copies: 6,
            },
            &Calibration::default(),
        )
        .unwrap();
        let prints: Vec<&str> = out.lines().filter(|l| l.starts_with("PRINT")).collect();
        assert_eq!(prints, vec!["PRINT 3,1"]);
    }

    #[test]
    fn test_column_offsets_differ_between_modes() {
        let catalog = GeometryCatalog::builtin();
        let geometry = catalog.resolve("triple-30x20").unwrap();
        let label = LabelContent::TextOnly {
            title: "W".to_string(),
            subtitle: None,
        };
        let calibration = Calibration {
            padding_mm: 0.0,
            ..Calibration::default()
        };
        let row = render_job(
            geometry,
            LabelSet::Single {
                label: &label,
                copies: 3,
            },
            &calibration,
        )
        .unwrap();
        let single = render_job(
            geometry,
            LabelSet::Single {
                label: &label,
                copies: 1,
            },
            &calibration,
        )
        .unwrap();

        let x_of = |line: &str| -> u32 {
            line.trim_start_matches("TEXT ")
                .split(',')
                .next()
                .unwrap()
                .parse()
                .unwrap()
        };
        let row_xs: Vec<u32> = row.lines().filter(|l| l.starts_with("TEXT")).map(x_of).collect();
        let single_x = single.lines().find(|l| l.starts_with("TEXT")).map(x_of).unwrap();
        // each column is shifted by margin + column * (width + gap)
        assert_eq!(row_xs[0], single_x + 12);
        assert_eq!(row_xs[1], single_x + 12 + 256);
        assert_eq!(row_xs[2], single_x + 12 + 512);
    }

    #[test]
    fn test_batch_pages() {
        let catalog = GeometryCatalog::builtin();
        let geometry = catalog.resolve("dual-50x25").unwrap();
        let labels: Vec<LabelContent> = ["A", "B", "C"]
            .iter()
            .map(|t| LabelContent::TextOnly {
                title: t.to_string(),
                subtitle: None,
            })
            .collect();
        let out = render_job(geometry, LabelSet::Batch(&labels), &Calibration::default()).unwrap();
        let sizes: Vec<&str> = out.lines().filter(|l| l.starts_with("SIZE")).collect();
        assert_eq!(sizes.len(), 2);
        assert!(out.lines().filter(|l| l.starts_with("TEXT")).count() == 3);
    }

    #[test]
    fn test_render_is_deterministic() {
        let catalog = GeometryCatalog::builtin();
        let label = LabelContent::Qr {
            title: "PRODUCT-ABC-123".to_string(),
            subtitle: Some("Batch: 2026-01-15".to_string()),
            qr_data: "https://example.com/product/ABC-123".to_string(),
            quantity: None,
        };
        let set = LabelSet::Single {
            label: &label,
            copies: 2,
        };
        let a = render_job(catalog.default_profile(), set, &Calibration::default()).unwrap();
        let b = render_job(catalog.default_profile(), set, &Calibration::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_negative_offset_fails_fast() {
        let catalog = GeometryCatalog::builtin();
        let label = abc_label();
        let calibration = Calibration {
            padding_mm: 0.0,
            offset_x_mm: -40.0,
            ..Calibration::default()
        };
        let err = render_job(
            catalog.default_profile(),
            LabelSet::Single {
                label: &label,
                copies: 1,
            },
            &calibration,
        )
        .unwrap_err();
        assert!(matches!(err, PrintError::InvalidGeometry(_)));
    }

    #[test]
    fn test_outline_box() {
        let catalog = GeometryCatalog::builtin();
        let label = abc_label();
        let calibration = Calibration {
            outline: true,
            ..Calibration::default()
        };
        let out = render_job(
            catalog.default_profile(),
            LabelSet::Single {
                label: &label,
                copies: 1,
            },
            &calibration,
        )
        .unwrap();
        assert!(out.contains("BOX 0,0,400,240,2\r\n"));
    }

    #[test]
    fn test_rejects_bad_input() {
        let catalog = GeometryCatalog::builtin();
        let label = LabelContent::TextOnly {
            title: String::new(),
            subtitle: None,
        };
        let err = render_job(
            catalog.default_profile(),
            LabelSet::Single {
                label: &label,
                copies: 1,
            },
            &Calibration::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PrintError::InvalidLabel(_)));
        assert!(render_job(catalog.default_profile(), LabelSet::Batch(&[]), &Calibration::default()).is_err());
    }
}
