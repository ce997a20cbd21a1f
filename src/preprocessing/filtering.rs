//! # Image Filtering Module
//!
//! 3x3 sharpening convolution for grayscale receipts.
//!
//! Border policy is clamp-to-edge: neighbors outside the image read the nearest
//! edge pixel. Zero-filling would darken the outermost rows and columns and eat
//! text printed close to the paper edge.

use image::GrayImage;

/// Sharpening kernel; its weights sum to 1 so flat regions are unchanged.
pub const SHARPEN_KERNEL: [[i32; 3]; 3] = [[0, -1, 0], [-1, 5, -1], [0, -1, 0]];

/// Convolves `image` with [`SHARPEN_KERNEL`], clipping the output to `[0, 255]`.
pub fn sharpen(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut output = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return output;
    }

    let source = image.as_raw();
    let max_x = i64::from(width) - 1;
    let max_y = i64::from(height) - 1;
    let at = |x: i64, y: i64| -> i32 {
        let x = x.clamp(0, max_x) as usize;
        let y = y.clamp(0, max_y) as usize;
        i32::from(source[y * width as usize + x])
    };

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let (cx, cy) = (i64::from(x), i64::from(y));
        let mut acc = 0i32;
        for (ky, row) in SHARPEN_KERNEL.iter().enumerate() {
            for (kx, weight) in row.iter().enumerate() {
                if *weight != 0 {
                    acc += weight * at(cx + kx as i64 - 1, cy + ky as i64 - 1);
                }
            }
        }
        pixel.0[0] = acc.clamp(0, 255) as u8;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_kernel_sums_to_one() {
        let sum: i32 = SHARPEN_KERNEL.iter().flatten().sum();
        assert_eq!(sum, 1);
    }

    #[test]
    fn test_flat_image_is_unchanged_everywhere() {
        let flat = GrayImage::from_pixel(7, 5, Luma([97]));
        let sharpened = sharpen(&flat);
        assert!(sharpened.pixels().all(|p| p.0[0] == 97));
    }

    #[test]
    fn test_edge_is_enhanced_and_clipped() {
        // Left half dark, right half light
        let image = GrayImage::from_fn(4, 3, |x, _| if x < 2 { Luma([50]) } else { Luma([200]) });
        let sharpened = sharpen(&image);
        // Dark side of the edge: 5*50 - 50 - 50 - 50 - 200 = -100 -> 0
        assert_eq!(sharpened.get_pixel(1, 1).0[0], 0);
        // Light side: 5*200 - 200 - 200 - 200 - 50 = 350 -> 255
        assert_eq!(sharpened.get_pixel(2, 1).0[0], 255);
        // Away from the edge, clamped borders keep the flat value
        assert_eq!(sharpened.get_pixel(0, 0).0[0], 50);
        assert_eq!(sharpened.get_pixel(3, 2).0[0], 200);
    }

    #[test]
    fn test_single_pixel() {
        let image = GrayImage::from_pixel(1, 1, Luma([10]));
        assert_eq!(sharpen(&image).get_pixel(0, 0).0[0], 10);
    }
}
