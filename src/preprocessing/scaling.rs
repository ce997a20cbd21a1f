//! # Image Scaling Module
//!
//! Bounds the working size of receipt photos. Images whose long side exceeds the
//! configured maximum are shrunk so the long side equals it, keeping the aspect
//! ratio; smaller images pass through untouched.

use image::{DynamicImage, GenericImageView};

/// Target dimensions for `(width, height)` under `max_dimension`, or `None`
/// when no resize is needed.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let long_side = width.max(height);
    if long_side <= max_dimension {
        return None;
    }

    let scale = f64::from(max_dimension) / f64::from(long_side);
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max_dimension);

    if width >= height {
        Some((max_dimension, scaled(height)))
    } else {
        Some((scaled(width), max_dimension))
    }
}

/// Shrinks `image` if either side exceeds `max_dimension`.
///
/// Returns the (possibly unchanged) image and whether a resize happened.
pub fn downscale(image: DynamicImage, max_dimension: u32) -> (DynamicImage, bool) {
    let (width, height) = image.dimensions();
    match target_dimensions(width, height, max_dimension) {
        Some((new_width, new_height)) => {
            // Catmull-Rom keeps glyph edges crisp when shrinking
            let resized = image.resize_exact(
                new_width,
                new_height,
                image::imageops::FilterType::CatmullRom,
            );
            (resized, true)
        }
        None => (image, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_target_dimensions() {
        assert_eq!(target_dimensions(4000, 1000, 2000), Some((2000, 500)));
        assert_eq!(target_dimensions(1000, 3000, 2000), Some((667, 2000)));
        assert_eq!(target_dimensions(2000, 2000, 2000), None);
        assert_eq!(target_dimensions(1200, 800, 2000), None);
        // Extremely thin images keep at least one pixel
        assert_eq!(target_dimensions(100_000, 1, 2000), Some((2000, 1)));
    }

    #[test]
    fn test_downscale_preserves_aspect_ratio() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(300, 150));
        let (resized, changed) = downscale(image, 100);
        assert!(changed);
        assert_eq!(resized.dimensions(), (100, 50));
    }

    #[test]
    fn test_small_image_untouched() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(40, 30));
        let (same, changed) = downscale(image, 100);
        assert!(!changed);
        assert_eq!(same.dimensions(), (40, 30));
    }
}
