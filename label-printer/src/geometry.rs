//! Label geometry catalog
//!
//! A geometry profile describes one physical label stock: sticker size,
//! how many stickers sit side by side on the liner, the gap between them and
//! the outer margin of the liner. Profiles are immutable and built once.

use serde::Serialize;

use crate::error::{PrintError, PrintResult};

/// Identifier of the catalog's default profile
pub const DEFAULT_PROFILE_ID: &str = "default";

/// Named label stock layout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub sticker_width_mm: f64,
    pub sticker_height_mm: f64,
    pub columns: u32,
    pub gap_mm: f64,
    pub margin_mm: f64,
}

impl GeometryProfile {
    /// Total liner width: stickers + inner gaps + both outer margins
    pub fn page_width_mm(&self) -> f64 {
        let cols = self.columns.max(1) as f64;
        self.sticker_width_mm * cols + self.gap_mm * (cols - 1.0) + 2.0 * self.margin_mm
    }

    /// Total liner height for one row
    pub fn page_height_mm(&self) -> f64 {
        self.sticker_height_mm + 2.0 * self.margin_mm
    }

    /// Horizontal offset of a column when a full row is printed as one page
    pub fn column_offset_mm(&self, column: u32) -> f64 {
        self.margin_mm + column as f64 * (self.sticker_width_mm + self.gap_mm)
    }
}

const BUILTIN_PROFILES: &[GeometryProfile] = &[
    GeometryProfile {
        id: DEFAULT_PROFILE_ID,
        name: "Single 50 x 30 mm",
        sticker_width_mm: 50.0,
        sticker_height_mm: 30.0,
        columns: 1,
        gap_mm: 2.0,
        margin_mm: 0.0,
    },
    GeometryProfile {
        id: "small-40x25",
        name: "Single 40 x 25 mm",
        sticker_width_mm: 40.0,
        sticker_height_mm: 25.0,
        columns: 1,
        gap_mm: 2.0,
        margin_mm: 0.0,
    },
    GeometryProfile {
        id: "large-100x50",
        name: "Shipping 100 x 50 mm",
        sticker_width_mm: 100.0,
        sticker_height_mm: 50.0,
        columns: 1,
        gap_mm: 3.0,
        margin_mm: 0.0,
    },
    GeometryProfile {
        id: "dual-50x25",
        name: "2-up 50 x 25 mm",
        sticker_width_mm: 50.0,
        sticker_height_mm: 25.0,
        columns: 2,
        gap_mm: 2.0,
        margin_mm: 1.0,
    },
    GeometryProfile {
        id: "triple-30x20",
        name: "3-up 30 x 20 mm",
        sticker_width_mm: 30.0,
        sticker_height_mm: 20.0,
        columns: 3,
        gap_mm: 2.0,
        margin_mm: 1.5,
    },
    GeometryProfile {
        id: "quad-25x15",
        name: "4-up 25 x 15 mm",
        sticker_width_mm: 25.0,
        sticker_height_mm: 15.0,
        columns: 4,
        gap_mm: 2.0,
        margin_mm: 1.0,
    },
];

/// Immutable set of geometry profiles
#[derive(Debug, Clone)]
pub struct GeometryCatalog {
    profiles: Vec<GeometryProfile>,
    default_id: &'static str,
}

impl GeometryCatalog {
    /// The catalog shipped with the printer service
    pub fn builtin() -> Self {
        Self {
            profiles: BUILTIN_PROFILES.to_vec(),
            default_id: DEFAULT_PROFILE_ID,
        }
    }

    /// Build a catalog from explicit profiles; the first one is the default
    pub fn from_profiles(profiles: Vec<GeometryProfile>) -> PrintResult<Self> {
        let default_id = profiles
            .first()
            .map(|p| p.id)
            .ok_or_else(|| PrintError::InvalidConfig("geometry catalog is empty".to_string()))?;
        if let Some(bad) = profiles
            .iter()
            .find(|p| p.columns == 0 || p.sticker_width_mm <= 0.0 || p.sticker_height_mm <= 0.0)
        {
            return Err(PrintError::InvalidConfig(format!(
                "geometry profile '{}' has empty dimensions",
                bad.id
            )));
        }
        Ok(Self {
            profiles,
            default_id,
        })
    }

    /// Same profiles with another default
    pub fn with_default(mut self, id: &str) -> PrintResult<Self> {
        self.default_id = self.resolve(id)?.id;
        Ok(self)
    }

    pub fn resolve(&self, id: &str) -> PrintResult<&GeometryProfile> {
        self.profiles
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PrintError::NotFound(format!("geometry profile '{}'", id)))
    }

    /// Profiles in insertion order
    pub fn list(&self) -> &[GeometryProfile] {
        &self.profiles
    }

    pub fn default_id(&self) -> &'static str {
        self.default_id
    }

    pub fn default_profile(&self) -> &GeometryProfile {
        // from_profiles/builtin guarantee the default id is present
        self.profiles
            .iter()
            .find(|p| p.id == self.default_id)
            .unwrap_or(&self.profiles[0])
    }
}

impl Default for GeometryCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
