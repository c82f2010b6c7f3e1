//! Built-in preprocessing on top of the `image` crate.

use super::ImagePreprocessor;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::median_filter;
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};

/// Luma below which a pixel counts as ink when estimating skew.
const INK_LUMA: u8 = 128;

/// Largest skew (degrees) searched in either direction.
const MAX_SKEW_DEGREES: f64 = 5.0;

const SKEW_STEP_DEGREES: f64 = 0.5;

/// Skew estimation runs on a copy no wider than this.
const SKEW_SAMPLE_WIDTH: u32 = 800;

/// Preprocessing backed by the `image` crate.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardPreprocessor {
    /// Upscale until the shorter side reaches this many pixels
    pub min_short_side: u32,
    /// Never let the longer side exceed this many pixels
    pub max_long_side: u32,
    /// Run median denoising in the standard pipeline
    pub denoise: bool,
    /// Correct small rotations in the standard pipeline
    pub deskew: bool,
}

impl Default for StandardPreprocessor {
    fn default() -> Self {
        Self {
            min_short_side: 1000,
            max_long_side: 4000,
            denoise: true,
            deskew: true,
        }
    }
}

impl StandardPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize factor that brings `(width, height)` into the configured band.
    fn scale_factor(&self, width: u32, height: u32) -> f64 {
        let short = width.min(height) as f64;
        let long = width.max(height) as f64;
        let max_long = self.max_long_side as f64;

        if long > max_long {
            return max_long / long;
        }

        if short < self.min_short_side as f64 {
            return (self.min_short_side as f64 / short).min(max_long / long);
        }

        1.0
    }
}

impl ImagePreprocessor for StandardPreprocessor {
    fn to_grayscale(&self, image: &DynamicImage) -> Option<DynamicImage> {
        if is_empty(image) {
            return None;
        }
        Some(DynamicImage::ImageLuma8(image.to_luma8()))
    }

    fn binarize(&self, image: &DynamicImage, threshold: f32) -> Option<DynamicImage> {
        if is_empty(image) || !(threshold > 0.0 && threshold < 1.0) {
            return None;
        }
        Some(DynamicImage::ImageLuma8(binarize_ink(&image.to_luma8(), threshold)))
    }

    fn scale_for_recognition(&self, image: &DynamicImage) -> Option<DynamicImage> {
        if is_empty(image) {
            return None;
        }

        let (width, height) = (image.width(), image.height());
        let factor = self.scale_factor(width, height);
        if (factor - 1.0).abs() < f64::EPSILON {
            return Some(image.clone());
        }

        let new_width = ((width as f64 * factor).round() as u32).max(1);
        let new_height = ((height as f64 * factor).round() as u32).max(1);
        Some(image.resize_exact(new_width, new_height, FilterType::CatmullRom))
    }

    fn standard_pipeline(&self, image: &DynamicImage) -> Option<DynamicImage> {
        let gray = self.to_grayscale(image)?;
        let scaled = self.scale_for_recognition(&gray)?.to_luma8();

        let denoised = if self.denoise { median_filter(&scaled, 1, 1) } else { scaled };
        let stretched = contrast_stretch(&denoised);

        let output = if self.deskew {
            let angle = estimate_skew_degrees(&stretched);
            if angle.abs() >= SKEW_STEP_DEGREES {
                tracing::debug!(angle, "correcting skew");
                level_skew(&stretched, angle)
            } else {
                stretched
            }
        } else {
            stretched
        };

        Some(DynamicImage::ImageLuma8(output))
    }
}

fn is_empty(image: &DynamicImage) -> bool {
    image.width() == 0 || image.height() == 0
}

/// Pixels at least `threshold` dark (0 = white, 1 = black) become black, the rest white.
///
/// Low thresholds keep faint pencil strokes, high thresholds keep only heavy ink.
pub fn binarize_ink(image: &GrayImage, threshold: f32) -> GrayImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        let darkness = 1.0 - pixel[0] as f32 / 255.0;
        pixel[0] = if darkness >= threshold { 0 } else { 255 };
    }
    output
}

/// Linear stretch of the luma range to `0..=255`.
pub fn contrast_stretch(image: &GrayImage) -> GrayImage {
    let (min, max) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(min, max), p| (min.min(p[0]), max.max(p[0])));

    if max <= min {
        return image.clone();
    }

    let scale = 255.0 / (max as f32 - min as f32);
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        pixel[0] = ((pixel[0] - min) as f32 * scale).round() as u8;
    }
    output
}

/// Estimate text skew in degrees with a projection-profile search.
///
/// For each candidate angle the ink pixels are projected onto rows sheared by that angle; the
/// angle whose profile has the sharpest row-to-row transitions wins. Positive angles mean the
/// baselines descend to the right.
pub fn estimate_skew_degrees(image: &GrayImage) -> f64 {
    let sample = if image.width() > SKEW_SAMPLE_WIDTH {
        let factor = SKEW_SAMPLE_WIDTH as f64 / image.width() as f64;
        let height = ((image.height() as f64 * factor).round() as u32).max(1);
        image::imageops::resize(image, SKEW_SAMPLE_WIDTH, height, FilterType::Triangle)
    } else {
        image.clone()
    };

    let ink: Vec<(f64, f64)> = sample
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] < INK_LUMA)
        .map(|(x, y, _)| (x as f64, y as f64))
        .collect();

    if ink.is_empty() {
        return 0.0;
    }

    let steps = (MAX_SKEW_DEGREES / SKEW_STEP_DEGREES).round() as i64;
    let offset = sample.width() as f64 * MAX_SKEW_DEGREES.to_radians().tan();
    let bins = (sample.height() as f64 + 2.0 * offset).ceil() as usize + 1;

    let mut best_angle: f64 = 0.0;
    let mut best_score = f64::MIN;

    for step in -steps..=steps {
        let angle = step as f64 * SKEW_STEP_DEGREES;
        let slope = angle.to_radians().tan();
        let mut profile = vec![0u32; bins];

        for &(x, y) in &ink {
            let row = (y - x * slope + offset).round();
            if row >= 0.0 && (row as usize) < bins {
                profile[row as usize] += 1;
            }
        }

        let score: f64 = profile
            .windows(2)
            .map(|w| {
                let diff = w[1] as f64 - w[0] as f64;
                diff * diff
            })
            .sum();

        // equal scores prefer the angle closest to level
        if score > best_score || (score == best_score && angle.abs() < best_angle.abs()) {
            best_score = score;
            best_angle = angle;
        }
    }

    best_angle
}

/// Rotate so that text skewed by `skew_degrees` becomes level; uncovered area is white.
pub fn level_skew(image: &GrayImage, skew_degrees: f64) -> GrayImage {
    let theta = -(skew_degrees.to_radians() as f32);
    rotate_about_center(image, theta, Interpolation::Bilinear, Luma([255]))
}
