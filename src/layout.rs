//! # Layout Files
//!
//! A JSON description of an editor canvas, so labels can be exported and
//! printed without the editor:
//!
//! ```json
//! {
//!   "width": 384,
//!   "height": 240,
//!   "items": [
//!     { "id": "logo",  "kind": "image", "x": 12, "y": 8,  "path": "logo.png" },
//!     { "id": "title", "kind": "text",  "x": 96, "y": 20, "path": "title.png" }
//!   ],
//!   "regions": [
//!     { "id": "label", "x1": 0, "y1": 0, "x2": 240, "y2": 96 }
//!   ]
//! }
//! ```
//!
//! Text items point at PNGs the editor already rendered; nothing is shaped
//! here. Relative paths are resolved against the layout file's directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compose::{BoundingRegion, CanvasItem, CanvasSnapshot, ItemKind};
use crate::error::EtiquetaError;

/// One item entry of a layout file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub id: String,
    pub kind: ItemKind,
    pub x: f32,
    pub y: f32,
    /// Rendered surface (PNG or any format the `image` crate reads)
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub items: Vec<LayoutItem>,
    #[serde(default)]
    pub regions: Vec<BoundingRegion>,
}

impl Layout {
    pub fn from_json(json: &str) -> Result<Self, EtiquetaError> {
        let layout: Layout = serde_json::from_str(json)
            .map_err(|e| EtiquetaError::Config(format!("Invalid layout: {}", e)))?;
        if layout.width == 0 || layout.height == 0 {
            return Err(EtiquetaError::Config(format!(
                "Canvas must not be empty ({}x{})",
                layout.width, layout.height
            )));
        }
        Ok(layout)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EtiquetaError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EtiquetaError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Decode every item's surface and build a canvas snapshot.
    ///
    /// `base` is the directory relative item paths are resolved against.
    pub fn snapshot(&self, base: &Path) -> Result<CanvasSnapshot, EtiquetaError> {
        let mut snapshot = CanvasSnapshot::new(self.width, self.height);
        for item in &self.items {
            let path = if item.path.is_absolute() {
                item.path.clone()
            } else {
                base.join(&item.path)
            };
            let surface = image::open(&path)
                .map_err(|e| {
                    EtiquetaError::Image(format!(
                        "Failed to load '{}' from {}: {}",
                        item.id,
                        path.display(),
                        e
                    ))
                })?
                .to_rgba8();
            snapshot.items.push(CanvasItem {
                id: item.id.clone(),
                kind: item.kind,
                x: item.x,
                y: item.y,
                surface,
            });
        }
        snapshot.regions = self.regions.clone();
        Ok(snapshot)
    }
}

/// Load a layout file and decode its items in one go.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<CanvasSnapshot, EtiquetaError> {
    let path = path.as_ref();
    let layout = Layout::load(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    layout.snapshot(base)
}
