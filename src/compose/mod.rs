//! # Compositing & Export Pipeline
//!
//! Flattens the editor's layered canvas into a single raster image:
//!
//! 1. A full-size surface is painted white.
//! 2. Every item's pre-rendered surface is painted at its position, in
//!    snapshot order. Images and text are the same thing here.
//! 3. The result is cropped to a named bounding region.
//!
//! The cropped image can be saved as PNG or, after [`rotate_for_feed`],
//! handed to the session's print operation.
//!
//! ```
//! use etiqueta::compose::{BoundingRegion, CanvasSnapshot, export_to_image};
//!
//! let snapshot = CanvasSnapshot::new(120, 60)
//!     .with_region(BoundingRegion::new("label", 10.0, 10.0, 110.0, 50.0));
//! let label = export_to_image(&snapshot, "label")?;
//! assert_eq!(label.image().dimensions(), (100, 40));
//! # Ok::<(), etiqueta::error::CompositingError>(())
//! ```

pub mod canvas;
pub mod export;
pub mod feed;

pub use canvas::{BoundingRegion, CanvasItem, CanvasSnapshot, ItemKind};
pub use export::{
    CompositeImage, CropRect, MAX_EXPORT_SIDE, export_to_image, export_to_png, save_png,
};
pub use feed::rotate_for_feed;
