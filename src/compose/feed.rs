//! Orientation fix-up applied before a label is sent to the printer.
//!
//! Label printers feed the roll sideways relative to how the label is
//! composed, so every exported image is turned a quarter turn first. The
//! mapping is fixed:
//!
//! ```text
//! source W x H  ->  rotated H x W
//! rotated(x, y) = source(y, H - 1 - x)
//! ```
//!
//! The source's bottom-left pixel becomes the rotated top-left. Pixels are
//! moved, never resampled, so this is exact nearest-neighbour.

use image::{RgbaImage, imageops};

/// Rotate a composited label into the printer's feed orientation.
pub fn rotate_for_feed(image: &RgbaImage) -> RgbaImage {
    imageops::rotate90(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn test_dimensions_swap() {
        let rotated = rotate_for_feed(&gradient(30, 12));
        assert_eq!(rotated.dimensions(), (12, 30));
    }

    #[test]
    fn test_origin_comes_from_bottom_left() {
        let (w, h) = (7, 5);
        let src = gradient(w, h);
        let rotated = rotate_for_feed(&src);
        assert_eq!(rotated.get_pixel(0, 0), src.get_pixel(0, h - 1));
    }

    #[test]
    fn test_full_mapping() {
        let (w, h) = (6, 4);
        let src = gradient(w, h);
        let rotated = rotate_for_feed(&src);
        for y in 0..w {
            for x in 0..h {
                assert_eq!(rotated.get_pixel(x, y), src.get_pixel(y, h - 1 - x));
            }
        }
    }
}
