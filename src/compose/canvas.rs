//! Canvas snapshot types.
//!
//! A snapshot is what the editor hands over at export time: the canvas size,
//! every item's already-rasterized surface with its position, and the named
//! bounding regions. The pipeline never keeps a snapshot after compositing.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// What an item was before it was rasterized. Compositing treats both alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Image,
    Text,
}

/// One positioned layer on the canvas.
#[derive(Debug, Clone)]
pub struct CanvasItem {
    pub id: String,
    pub kind: ItemKind,
    /// Top-left corner in canvas pixels (fractional values are truncated)
    pub x: f32,
    pub y: f32,
    /// Rendered pixels, alpha-blended over whatever is below
    pub surface: RgbaImage,
}

impl CanvasItem {
    pub fn image(id: impl Into<String>, x: f32, y: f32, surface: RgbaImage) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Image,
            x,
            y,
            surface,
        }
    }

    pub fn text(id: impl Into<String>, x: f32, y: f32, surface: RgbaImage) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Text,
            x,
            y,
            surface,
        }
    }
}

/// A named rectangle `(x1, y1)-(x2, y2)` in canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub id: String,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingRegion {
    pub fn new(id: impl Into<String>, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            id: id.into(),
            x1,
            y1,
            x2,
            y2,
        }
    }
}

/// Read-only view of the editor canvas at export time.
#[derive(Debug, Clone, Default)]
pub struct CanvasSnapshot {
    pub width: u32,
    pub height: u32,
    /// Painted in list order; later items land on top
    pub items: Vec<CanvasItem>,
    pub regions: Vec<BoundingRegion>,
}

impl CanvasSnapshot {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            items: Vec::new(),
            regions: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: CanvasItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_region(mut self, region: BoundingRegion) -> Self {
        self.regions.push(region);
        self
    }

    pub fn region(&self, id: &str) -> Option<&BoundingRegion> {
        self.regions.iter().find(|r| r.id == id)
    }
}
