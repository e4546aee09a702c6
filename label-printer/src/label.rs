//! Label content and calibration types

use serde::{Deserialize, Serialize};

use crate::error::{PrintError, PrintResult};

/// What goes on one sticker
///
/// The variant decides which composition the layout engine applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layoutKind", rename_all = "kebab-case")]
pub enum LabelContent {
    #[serde(rename_all = "camelCase")]
    Barcode {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtitle: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        barcode: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Qr {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtitle: Option<String>,
        qr_data: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quantity: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    TextOnly {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtitle: Option<String>,
    },
}

impl LabelContent {
    pub fn title(&self) -> &str {
        match self {
            LabelContent::Barcode { title, .. }
            | LabelContent::Qr { title, .. }
            | LabelContent::TextOnly { title, .. } => title,
        }
    }

    pub fn subtitle(&self) -> Option<&str> {
        match self {
            LabelContent::Barcode { subtitle, .. }
            | LabelContent::Qr { subtitle, .. }
            | LabelContent::TextOnly { subtitle, .. } => non_blank(subtitle.as_deref()),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            LabelContent::Barcode { .. } => "barcode",
            LabelContent::Qr { .. } => "qr",
            LabelContent::TextOnly { .. } => "text-only",
        }
    }

    /// Checks the fields every layout relies on
    pub fn validate(&self) -> PrintResult<()> {
        if self.title().trim().is_empty() {
            return Err(PrintError::InvalidLabel("title is required".to_string()));
        }
        if let LabelContent::Qr { qr_data, .. } = self
            && qr_data.trim().is_empty()
        {
            return Err(PrintError::InvalidLabel(
                "qr layout requires qrData".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Print-head alignment compensation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Calibration {
    /// Inner padding between the sticker edge and its content box
    pub padding_mm: f64,
    pub offset_x_mm: f64,
    pub offset_y_mm: f64,
    /// Draw each sticker's outline, used when tuning the offsets
    pub outline: bool,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            padding_mm: 1.0,
            offset_x_mm: 0.0,
            offset_y_mm: 0.0,
            outline: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tagged() {
        let label: LabelContent = serde_json::from_str(
            r#"{"layoutKind":"qr","title":"A","qrData":"https://x","quantity":"x3"}"#,
        )
        .unwrap();
        assert_eq!(label.kind_name(), "qr");
        assert_eq!(label.title(), "A");

        let label: LabelContent =
            serde_json::from_str(r#"{"layoutKind":"text-only","title":"T","subtitle":"  "}"#)
                .unwrap();
        assert_eq!(label.subtitle(), None);
    }

    #[test]
    fn test_validate_requires_title() {
        let label = LabelContent::TextOnly {
            title: "   ".to_string(),
            subtitle: None,
        };
        assert!(matches!(label.validate(), Err(PrintError::InvalidLabel(_))));
    }

    #[test]
    fn test_calibration_partial_json() {
        let c: Calibration = serde_json::from_str(r#"{"offsetXMm":0.5}"#).unwrap();
        assert_eq!(c.padding_mm, 1.0);
        assert_eq!(c.offset_x_mm, 0.5);
    }
}
