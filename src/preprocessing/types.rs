//! # Shared Types for Image Preprocessing
//!
//! Input and output values of the preprocessing stage plus its error type.
//! Pixel buffers are flat, owned and indexed by `(row * width + col) * channels + channel`.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised when the input pixels cannot be interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// No bytes were supplied
    EmptyBuffer,
    /// Declared or decoded dimensions are zero or inconsistent
    InvalidDimensions { width: u32, height: u32 },
    /// Bytes are neither raw pixels of the declared size nor a known image format
    Undecodable { message: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::EmptyBuffer => write!(f, "Image buffer is empty"),
            DecodeError::InvalidDimensions { width, height } => {
                write!(f, "Invalid image dimensions: {}x{}", width, height)
            }
            DecodeError::Undecodable { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Immutable photo bytes as captured, with the declared size.
///
/// The bytes are either raw interleaved pixels (gray, gray+alpha, RGB or RGBA, recognized
/// when `len == width * height * channels`) or an encoded file such as PNG or JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl RawImage {
    pub fn new(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    /// Encoded image whose size is read from its own header.
    pub fn encoded(bytes: Vec<u8>) -> Self {
        Self::new(bytes, 0, 0)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn has_declared_size(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// One step applied by the preprocessor, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Adjustment {
    Resized,
    #[serde(rename = "Grayscale+Contrast")]
    GrayscaleContrast,
    Sharpened,
    Thresholded,
}

impl Adjustment {
    pub fn label(&self) -> &'static str {
        match self {
            Adjustment::Resized => "Resized",
            Adjustment::GrayscaleContrast => "Grayscale+Contrast",
            Adjustment::Sharpened => "Sharpened",
            Adjustment::Thresholded => "Thresholded",
        }
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Single-channel binary image ready for OCR.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    adjustments: Vec<Adjustment>,
    threshold: u8,
    processing_time_ms: u32,
}

impl PreprocessedImage {
    pub(crate) fn new(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        adjustments: Vec<Adjustment>,
        threshold: u8,
        processing_time_ms: u32,
    ) -> Self {
        Self {
            pixels,
            width,
            height,
            adjustments,
            threshold,
            processing_time_ms,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn adjustments(&self) -> &[Adjustment] {
        &self.adjustments
    }

    /// Adjustment labels in application order
    pub fn adjustment_labels(&self) -> Vec<&'static str> {
        self.adjustments.iter().map(Adjustment::label).collect()
    }

    /// Otsu threshold used for binarization
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn processing_time_ms(&self) -> u32 {
        self.processing_time_ms
    }

    /// Encodes the buffer as an 8-bit grayscale PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, ImageError> {
        let mut encoded = Vec::new();
        PngEncoder::new(&mut encoded).write_image(
            &self.pixels,
            self.width,
            self.height,
            ExtendedColorType::L8,
        )?;
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_labels_serialize() {
        let json = serde_json::to_string(&vec![Adjustment::Resized, Adjustment::GrayscaleContrast])
            .unwrap();
        assert_eq!(json, r#"["Resized","Grayscale+Contrast"]"#);
    }

    #[test]
    fn test_decode_error_display() {
        assert_eq!(DecodeError::EmptyBuffer.to_string(), "Image buffer is empty");
        assert_eq!(
            DecodeError::InvalidDimensions { width: 0, height: 4 }.to_string(),
            "Invalid image dimensions: 0x4"
        );
    }

    #[test]
    fn test_png_round_trip() {
        let image = PreprocessedImage::new(vec![0, 255, 255, 0], 2, 2, vec![], 128, 0);
        let png = image.to_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(decoded.as_raw(), image.pixels());
    }
}
