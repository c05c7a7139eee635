//! # Device Descriptor Table
//!
//! This module defines hardware specifications for supported label printers.
//!
//! ## Supported Printers
//!
//! | Model | Max density | Head width (dots) | Resolution |
//! |-------|-------------|-------------------|------------|
//! | D11   | 3 | 96  | 203 DPI |
//! | D110  | 3 | 96  | 203 DPI |
//! | D101  | 3 | 192 | 203 DPI |
//! | B18   | 3 | 120 | 203 DPI |
//! | B21   | 5 | 384 | 203 DPI |
//! | B1    | 5 | 384 | 203 DPI |
//!
//! ## Usage
//!
//! ```
//! use etiqueta::printer::DeviceTable;
//!
//! let table = DeviceTable::built_in();
//! let d110 = table.get("d110").unwrap();
//! assert_eq!(d110.max_density, 3);
//! ```
//!
//! The table can be replaced from a JSON file holding an array of models,
//! see [`DeviceTable::from_json`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EtiquetaError;

/// Smallest density any printer accepts.
pub const MIN_DENSITY: u8 = 1;

/// Density preselected in the print dialog.
pub const DEFAULT_DENSITY: u8 = 3;

/// # Device Model
///
/// Hardware characteristics of one label printer model.
///
/// ```text
/// dots_per_mm = dpi / 25.4
/// width_mm    = width_dots / dots_per_mm
///
/// For a D110:
///   dots_per_mm = 203 / 25.4 ≈ 8
///   width_mm    = 96 / 8 = 12mm
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceModel {
    /// Lookup key (e.g. "d110")
    pub key: String,

    /// Human-readable model name
    pub name: String,

    /// Highest density setting the model accepts
    pub max_density: u8,

    /// Print head width in dots
    pub width_dots: u16,

    /// Resolution in dots per inch
    #[serde(default = "default_dpi")]
    pub dpi: u16,
}

fn default_dpi() -> u16 {
    203
}

impl DeviceModel {
    fn new(key: &str, name: &str, max_density: u8, width_dots: u16) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            max_density,
            width_dots,
            dpi: default_dpi(),
        }
    }

    /// Calculate dots per millimeter
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi as f32 / 25.4
    }

    /// Calculate print head width in millimeters
    #[inline]
    pub fn width_mm(&self) -> f32 {
        self.width_dots as f32 / self.dots_per_mm()
    }

    /// Whether `density` is within `MIN_DENSITY..=max_density`.
    pub fn accepts_density(&self, density: u8) -> bool {
        (MIN_DENSITY..=self.max_density).contains(&density)
    }

    /// The print dialog's initial density for this model.
    pub fn default_density(&self) -> u8 {
        DEFAULT_DENSITY.clamp(MIN_DENSITY, self.max_density.max(MIN_DENSITY))
    }
}

/// Device descriptor table keyed by model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTable {
    models: Vec<DeviceModel>,
}

impl DeviceTable {
    /// The models shipped with etiqueta.
    pub fn built_in() -> Self {
        Self {
            models: vec![
                DeviceModel::new("d11", "Niimbot D11", 3, 96),
                DeviceModel::new("d110", "Niimbot D110", 3, 96),
                DeviceModel::new("d101", "Niimbot D101", 3, 192),
                DeviceModel::new("b18", "Niimbot B18", 3, 120),
                DeviceModel::new("b21", "Niimbot B21", 5, 384),
                DeviceModel::new("b1", "Niimbot B1", 5, 384),
            ],
        }
    }

    /// Build a table from explicit models.
    ///
    /// ## Errors
    ///
    /// Returns an error if the list is empty, a key repeats, or a model
    /// declares a maximum density below 1.
    pub fn new(models: Vec<DeviceModel>) -> Result<Self, EtiquetaError> {
        if models.is_empty() {
            return Err(EtiquetaError::Config("Device table is empty".to_string()));
        }
        for (i, model) in models.iter().enumerate() {
            if model.max_density < MIN_DENSITY {
                return Err(EtiquetaError::Config(format!(
                    "Model '{}' has max density {}",
                    model.key, model.max_density
                )));
            }
            if models[..i]
                .iter()
                .any(|m| m.key.eq_ignore_ascii_case(&model.key))
            {
                return Err(EtiquetaError::Config(format!(
                    "Duplicate model key '{}'",
                    model.key
                )));
            }
        }
        Ok(Self { models })
    }

    /// Parse a JSON array of models.
    pub fn from_json(json: &str) -> Result<Self, EtiquetaError> {
        let models: Vec<DeviceModel> = serde_json::from_str(json)
            .map_err(|e| EtiquetaError::Config(format!("Invalid device table: {}", e)))?;
        Self::new(models)
    }

    /// Load a JSON device table from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EtiquetaError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EtiquetaError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Look up a model by key, ignoring case.
    pub fn get(&self, key: &str) -> Option<&DeviceModel> {
        self.models.iter().find(|m| m.key.eq_ignore_ascii_case(key))
    }

    /// Look up a model, failing with a message listing the known keys.
    pub fn require(&self, key: &str) -> Result<&DeviceModel, EtiquetaError> {
        self.get(key).ok_or_else(|| {
            let known: Vec<&str> = self.models.iter().map(|m| m.key.as_str()).collect();
            EtiquetaError::Config(format!(
                "Unknown model '{}'. Known models: {}",
                key,
                known.join(", ")
            ))
        })
    }

    pub fn models(&self) -> &[DeviceModel] {
        &self.models
    }
}

impl Default for DeviceTable {
    fn default() -> Self {
        Self::built_in()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_in_densities() {
        let table = DeviceTable::built_in();
        assert_eq!(table.get("d11").unwrap().max_density, 3);
        assert_eq!(table.get("b21").unwrap().max_density, 5);
        assert_eq!(table.get("B1").unwrap().max_density, 5);
    }

    #[test]
    fn test_unknown_model() {
        let table = DeviceTable::built_in();
        assert!(table.get("tsp650").is_none());
        let err = table.require("tsp650").unwrap_err();
        assert!(err.to_string().contains("d110"));
    }

    #[test]
    fn test_width_mm() {
        let table = DeviceTable::built_in();
        let width = table.get("d110").unwrap().width_mm();
        // 96 dots / 8 dpmm = 12mm
        assert!((width - 12.0).abs() < 0.5);
    }

    #[test]
    fn test_accepts_density() {
        let table = DeviceTable::built_in();
        let d11 = table.get("d11").unwrap();
        assert!(!d11.accepts_density(0));
        assert!(d11.accepts_density(1));
        assert!(d11.accepts_density(3));
        assert!(!d11.accepts_density(4));
    }

    #[test]
    fn test_default_density_clamped() {
        let tiny = DeviceModel::new("x", "X", 2, 96);
        assert_eq!(tiny.default_density(), 2);
        let table = DeviceTable::built_in();
        assert_eq!(table.get("b21").unwrap().default_density(), 3);
    }

    #[test]
    fn test_from_json() {
        let json = r#"[{"key": "p1", "name": "Proto", "max_density": 4, "width_dots": 240}]"#;
        let table = DeviceTable::from_json(json).unwrap();
        let p1 = table.get("P1").unwrap();
        assert_eq!(p1.dpi, 203);
        assert_eq!(p1.max_density, 4);
    }

    #[test]
    fn test_from_json_rejects_duplicates() {
        let json = r#"[
            {"key": "p1", "name": "A", "max_density": 3, "width_dots": 96},
            {"key": "P1", "name": "B", "max_density": 3, "width_dots": 96}
        ]"#;
        assert!(DeviceTable::from_json(json).is_err());
    }

    #[test]
    fn test_from_json_rejects_zero_density() {
        let json = r#"[{"key": "p1", "name": "A", "max_density": 0, "width_dots": 96}]"#;
        assert!(DeviceTable::from_json(json).is_err());
        assert!(DeviceTable::from_json("[]").is_err());
    }
}
