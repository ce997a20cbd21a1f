//! # Image Thresholding Module
//!
//! Binary thresholding with Otsu's method. Text ends up black on a white
//! background: pixels strictly above the threshold become 255, all others 0.

use image::GrayImage;

/// Threshold used when the histogram has a single populated class.
pub const FALLBACK_THRESHOLD: u8 = 128;

/// 256-bin intensity histogram
pub fn histogram(image: &GrayImage) -> [u32; 256] {
    let mut histogram = [0u32; 256];
    for pixel in image.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }
    histogram
}

/// Finds the threshold maximizing between-class variance `wB * wF * (meanB - meanF)^2`.
///
/// Running cumulative sums keep this linear in the number of bins. When several
/// consecutive thresholds reach the same maximum (clusters separated by empty
/// bins), the middle of that plateau is returned so the threshold sits strictly
/// between the class means.
///
/// # Examples
///
/// ```
/// use pantry_receipts::preprocessing::thresholding::find_otsu_threshold;
///
/// let mut histogram = [0u32; 256];
/// histogram[25] = 50;
/// histogram[225] = 50;
/// let threshold = find_otsu_threshold(&histogram);
/// assert!(threshold > 25 && threshold < 225);
/// ```
pub fn find_otsu_threshold(histogram: &[u32; 256]) -> u8 {
    let mut cumulative_sums = [0f64; 256];
    let mut cumulative_weighted_sums = [0f64; 256];
    let mut cumulative_sum = 0f64;
    let mut cumulative_weighted_sum = 0f64;

    for (intensity, count) in histogram.iter().enumerate() {
        let count = f64::from(*count);
        cumulative_sum += count;
        cumulative_weighted_sum += intensity as f64 * count;
        cumulative_sums[intensity] = cumulative_sum;
        cumulative_weighted_sums[intensity] = cumulative_weighted_sum;
    }

    let total_pixels = cumulative_sums[255];
    let total_weighted_sum = cumulative_weighted_sums[255];
    if total_pixels == 0.0 {
        return FALLBACK_THRESHOLD;
    }

    let mut max_variance = 0f64;
    let mut plateau: Option<(usize, usize)> = None;

    for threshold in 0..255 {
        let background = cumulative_sums[threshold];
        let foreground = total_pixels - background;
        if background == 0.0 || foreground == 0.0 {
            continue;
        }

        let weight_background = background / total_pixels;
        let weight_foreground = foreground / total_pixels;
        let mean_background = cumulative_weighted_sums[threshold] / background;
        let mean_foreground = (total_weighted_sum - cumulative_weighted_sums[threshold]) / foreground;

        let variance = weight_background * weight_foreground * (mean_background - mean_foreground).powi(2);

        let tolerance = max_variance * 1e-12;
        if variance > max_variance + tolerance {
            max_variance = variance;
            plateau = Some((threshold, threshold));
        } else if let Some((start, end)) = plateau {
            if (variance - max_variance).abs() <= tolerance && end + 1 == threshold {
                plateau = Some((start, threshold));
            }
        }
    }

    match plateau {
        Some((start, end)) if max_variance > 0.0 => ((start + end) / 2) as u8,
        _ => FALLBACK_THRESHOLD,
    }
}

/// Applies Otsu binarization, returning the binary image and the threshold used.
pub fn apply_otsu_threshold(image: &GrayImage) -> (GrayImage, u8) {
    let threshold = find_otsu_threshold(&histogram(image));

    let mut binary = image.clone();
    for pixel in binary.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > threshold { 255 } else { 0 };
    }

    (binary, threshold)
}
