//! # Image Preprocessing Module
//!
//! Conditions a raw receipt photo for OCR. Steps run in a fixed order and each
//! applied step is recorded as an [`Adjustment`]:
//!
//! 1. `Resized`: downscale when either side exceeds the maximum (skipped otherwise)
//! 2. `Grayscale+Contrast`: channel average, contrast stretch around 128
//! 3. `Sharpened`: 3x3 sharpen kernel with clamp-to-edge borders
//! 4. `Thresholded`: Otsu binarization
//!
//! The module is organized into focused sub-modules:
//! - `scaling`: long-side downscaling
//! - `contrast`: grayscale conversion and contrast stretch
//! - `filtering`: sharpening convolution
//! - `thresholding`: Otsu's method
//! - `types`: input/output values and [`DecodeError`]

pub mod contrast;
pub mod filtering;
pub mod scaling;
pub mod thresholding;
pub mod types;

pub use types::{Adjustment, DecodeError, PreprocessedImage, RawImage};

use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::PreprocessingConfig;

/// Runs the full preprocessing chain on `raw`.
///
/// Deterministic for a given input and configuration. Fails only when the
/// pixels cannot be interpreted; there is no partial output.
///
/// # Examples
///
/// ```
/// use pantry_receipts::config::PreprocessingConfig;
/// use pantry_receipts::preprocessing::{preprocess, RawImage};
///
/// // 2x2 grayscale: two dark and two light pixels
/// let raw = RawImage::new(vec![20, 230, 20, 230], 2, 2);
/// let image = preprocess(&raw, &PreprocessingConfig::default()).unwrap();
/// assert_eq!(image.adjustment_labels(), vec!["Grayscale+Contrast", "Sharpened", "Thresholded"]);
/// assert_eq!(image.pixels(), &[0, 255, 0, 255]);
/// ```
pub fn preprocess(
    raw: &RawImage,
    config: &PreprocessingConfig,
) -> Result<PreprocessedImage, DecodeError> {
    let start_time = Instant::now();
    let mut adjustments = Vec::with_capacity(4);

    let decoded = decode(raw)?;
    let (original_width, original_height) = (decoded.width(), decoded.height());

    let step_start = Instant::now();
    let (working, resized) = scaling::downscale(decoded, config.max_dimension);
    if resized {
        adjustments.push(Adjustment::Resized);
        debug!(
            target: "receipt_preprocessing",
            "Downscaled {}x{} -> {}x{} in {}ms",
            original_width,
            original_height,
            working.width(),
            working.height(),
            step_start.elapsed().as_millis()
        );
    }

    let step_start = Instant::now();
    let gray = contrast::grayscale_contrast(&working, config.contrast_gain);
    adjustments.push(Adjustment::GrayscaleContrast);
    debug!(
        target: "receipt_preprocessing",
        "Grayscale+contrast (gain {}) in {}ms",
        config.contrast_gain,
        step_start.elapsed().as_millis()
    );

    let step_start = Instant::now();
    let sharpened = filtering::sharpen(&gray);
    adjustments.push(Adjustment::Sharpened);
    debug!(
        target: "receipt_preprocessing",
        "Sharpened in {}ms",
        step_start.elapsed().as_millis()
    );

    let step_start = Instant::now();
    let (binary, threshold) = thresholding::apply_otsu_threshold(&sharpened);
    adjustments.push(Adjustment::Thresholded);
    debug!(
        target: "receipt_preprocessing",
        "Otsu thresholding in {}ms: threshold={}",
        step_start.elapsed().as_millis(),
        threshold
    );

    let (width, height) = binary.dimensions();
    let processing_time_ms = start_time.elapsed().as_millis() as u32;
    info!(
        target: "receipt_preprocessing",
        original_width,
        original_height,
        width,
        height,
        threshold,
        processing_time_ms,
        "Image preprocessed"
    );

    Ok(PreprocessedImage::new(
        binary.into_raw(),
        width,
        height,
        adjustments,
        threshold,
        processing_time_ms,
    ))
}

/// Interprets the raw bytes as interleaved pixels of the declared size, or
/// failing that, as an encoded image file.
fn decode(raw: &RawImage) -> Result<DynamicImage, DecodeError> {
    let bytes = raw.bytes();
    if bytes.is_empty() {
        return Err(DecodeError::EmptyBuffer);
    }

    let (width, height) = (raw.width(), raw.height());
    if raw.has_declared_size() {
        let pixel_count = u64::from(width) * u64::from(height);
        let channels = bytes.len() as u64 / pixel_count;
        if channels * pixel_count == bytes.len() as u64 {
            let pixels = bytes.to_vec();
            let image = match channels {
                1 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
                2 => GrayAlphaImage::from_raw(width, height, pixels).map(DynamicImage::ImageLumaA8),
                3 => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
                4 => RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8),
                _ => None,
            };
            if let Some(image) = image {
                debug!(target: "receipt_preprocessing", channels, "Using raw pixel buffer");
                return Ok(image);
            }
        }
    }

    match image::load_from_memory(bytes) {
        Ok(image) => {
            let (decoded_width, decoded_height) = (image.width(), image.height());
            if decoded_width == 0 || decoded_height == 0 {
                return Err(DecodeError::InvalidDimensions {
                    width: decoded_width,
                    height: decoded_height,
                });
            }
            if raw.has_declared_size() && (decoded_width, decoded_height) != (width, height) {
                return Err(DecodeError::InvalidDimensions { width, height });
            }
            Ok(image)
        }
        Err(_) if (width == 0) != (height == 0) => Err(DecodeError::InvalidDimensions { width, height }),
        Err(err) => Err(DecodeError::Undecodable {
            message: err.to_string(),
        }),
    }
}
