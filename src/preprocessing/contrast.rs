//! # Grayscale and Contrast
//!
//! Per-pixel step: the three color channels are averaged, then the value is
//! stretched around the midpoint 128 by a fixed gain and clipped to `[0, 255]`.
//! No neighbor dependency, alpha is ignored.

use image::{DynamicImage, GrayImage};

const MIDPOINT: f32 = 128.0;

/// Maps one averaged intensity through the contrast curve.
pub fn stretch(value: f32, gain: f32) -> u8 {
    ((value - MIDPOINT) * gain + MIDPOINT).round().clamp(0.0, 255.0) as u8
}

/// Converts `image` to a contrast-stretched grayscale buffer.
pub fn grayscale_contrast(image: &DynamicImage, gain: f32) -> GrayImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let pixels = rgb
        .pixels()
        .map(|pixel| {
            let [r, g, b] = pixel.0;
            let average = (f32::from(r) + f32::from(g) + f32::from(b)) / 3.0;
            stretch(average, gain)
        })
        .collect::<Vec<u8>>();

    // Same pixel count as the source, so the buffer always fits
    GrayImage::from_raw(width, height, pixels).unwrap_or_else(|| GrayImage::new(width, height))
}
