//! Flatten a canvas snapshot and crop it to a bounding region.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage, imageops};
use tracing::debug;

use super::canvas::{BoundingRegion, CanvasSnapshot};
use super::feed::rotate_for_feed;
use crate::error::{CompositingError, EtiquetaError};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Largest coordinate, in either direction, a bounding region may use.
const MAX_COORDINATE: f32 = 1_048_576.0;

/// Largest exported side in pixels.
pub const MAX_EXPORT_SIDE: u32 = 16_384;

/// Crop rectangle in full-canvas pixels; `x2`/`y2` are exclusive.
///
/// It follows the bounding region, so it may start at negative coordinates
/// or end past the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl CropRect {
    pub fn width(&self) -> u32 {
        (self.x2 - self.x1) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y2 - self.y1) as u32
    }
}

/// The flattened canvas together with the crop that was exported from it.
#[derive(Debug, Clone)]
pub struct CompositeImage {
    full: RgbaImage,
    crop: CropRect,
    image: RgbaImage,
}

impl CompositeImage {
    /// The whole composited canvas.
    pub fn full(&self) -> &RgbaImage {
        &self.full
    }

    /// Where the exported image sits relative to [`full`](Self::full).
    pub fn crop(&self) -> CropRect {
        self.crop
    }

    /// The cropped image, sized to the bounding region.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Write the cropped image as PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), EtiquetaError> {
        save_png(&self.image, path)
    }
}

/// Composite every item of `snapshot` onto a white canvas and crop the result
/// to the bounding region named `region_id`.
///
/// The output always has the region's extent. Parts of the region that lie
/// outside the canvas stay transparent.
///
/// ## Errors
///
/// Fails with [`CompositingError::RegionNotFound`] when no region has that id,
/// [`CompositingError::DegenerateRegion`] when the region has no area and
/// [`CompositingError::RegionOutOfRange`] when its coordinates are not finite
/// or the export would be unreasonably large.
pub fn export_to_image(
    snapshot: &CanvasSnapshot,
    region_id: &str,
) -> Result<CompositeImage, CompositingError> {
    let region = snapshot
        .region(region_id)
        .ok_or_else(|| CompositingError::RegionNotFound(region_id.to_string()))?;
    let crop = derive_crop(region)?;

    let full = composite(snapshot);
    let mut image = RgbaImage::new(crop.width(), crop.height());
    imageops::replace(&mut image, &full, -crop.x1, -crop.y1);

    debug!(
        region = region_id,
        items = snapshot.items.len(),
        width = crop.width(),
        height = crop.height(),
        "Exported canvas"
    );

    Ok(CompositeImage { full, crop, image })
}

/// Paint the snapshot's items, in order, over a white full-size surface.
pub fn composite(snapshot: &CanvasSnapshot) -> RgbaImage {
    let mut surface = RgbaImage::from_pixel(snapshot.width, snapshot.height, WHITE);
    for item in &snapshot.items {
        imageops::overlay(&mut surface, &item.surface, item.x as i64, item.y as i64);
    }
    surface
}

/// Derive the integer crop for `region`.
///
/// The origin and the extent are truncated separately, so a region at
/// `(0.5, 0.5)-(10.9, 10.9)` yields a 10x10 crop at the origin.
pub fn derive_crop(region: &BoundingRegion) -> Result<CropRect, CompositingError> {
    let out_of_range = || CompositingError::RegionOutOfRange(region.id.clone());
    let coordinate = |v: f32| {
        if v.is_finite() && v.abs() <= MAX_COORDINATE {
            Ok(v as i64)
        } else {
            Err(out_of_range())
        }
    };

    let x1 = coordinate(region.x1)?;
    let y1 = coordinate(region.y1)?;
    coordinate(region.x2)?;
    coordinate(region.y2)?;
    // Bounded ends keep the extent and `x1 + width` well inside i64
    let width = coordinate(region.x2 - region.x1)?;
    let height = coordinate(region.y2 - region.y1)?;

    if width <= 0 || height <= 0 {
        return Err(CompositingError::DegenerateRegion {
            id: region.id.clone(),
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        });
    }
    if width > MAX_EXPORT_SIDE as i64 || height > MAX_EXPORT_SIDE as i64 {
        return Err(out_of_range());
    }

    Ok(CropRect {
        x1,
        y1,
        x2: x1 + width,
        y2: y1 + height,
    })
}

/// Export `region_id` and write it to `path` as PNG, optionally in feed
/// orientation. Returns the image exactly as written.
pub fn export_to_png<P: AsRef<Path>>(
    snapshot: &CanvasSnapshot,
    region_id: &str,
    path: P,
    feed: bool,
) -> Result<RgbaImage, EtiquetaError> {
    let label = export_to_image(snapshot, region_id)?.into_image();
    let image = if feed { rotate_for_feed(&label) } else { label };
    save_png(&image, path)?;
    Ok(image)
}

/// Save an image as PNG, regardless of the path's extension.
pub fn save_png<P: AsRef<Path>>(image: &RgbaImage, path: P) -> Result<(), EtiquetaError> {
    let path = path.as_ref();
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| EtiquetaError::Image(format!("Failed to save {}: {}", path.display(), e)))
}

// ============================================================================
// TESTS
// ============================================================================
