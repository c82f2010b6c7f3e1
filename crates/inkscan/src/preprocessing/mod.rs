//! Image preprocessing.
//!
//! The recognition layers consume preprocessing through [`ImagePreprocessor`]. Every
//! primitive returns `Option`: `None` means the step could not produce an image, and callers
//! decide explicitly what to do about it (the variant generator skips the step, the simple
//! recognition path falls back to the original image).
//!
//! [`StandardPreprocessor`] is the built-in implementation on top of the `image` crate.

pub mod standard;
pub mod variants;

pub use standard::StandardPreprocessor;
pub use variants::{BINARIZATION_THRESHOLDS, Variant, VariantGenerator, VariantKind};

use crate::{InkscanError, Result};
use image::DynamicImage;
use std::borrow::Cow;
use std::sync::Arc;

/// Image preprocessing capability.
///
/// Implementations must be cheap to share (`Send + Sync`); the variant generator calls the
/// primitives concurrently.
pub trait ImagePreprocessor: Send + Sync {
    /// Plain grayscale conversion.
    fn to_grayscale(&self, image: &DynamicImage) -> Option<DynamicImage>;

    /// Black/white image at `threshold`, a fraction of full intensity in `(0, 1)`.
    fn binarize(&self, image: &DynamicImage, threshold: f32) -> Option<DynamicImage>;

    /// Resize into the resolution band the engine reads best.
    fn scale_for_recognition(&self, image: &DynamicImage) -> Option<DynamicImage>;

    /// Full cleanup pipeline (denoise, contrast, deskew).
    fn standard_pipeline(&self, image: &DynamicImage) -> Option<DynamicImage>;
}

/// Input for the simple recognition path: the standard pipeline output, or `image` itself
/// when the pipeline produced nothing.
pub fn prepare_for_recognition<'a>(preprocessor: &dyn ImagePreprocessor, image: &'a DynamicImage) -> Cow<'a, DynamicImage> {
    match preprocessor.standard_pipeline(image) {
        Some(prepared) => Cow::Owned(prepared),
        None => {
            tracing::debug!("standard preprocessing failed, recognizing the original image");
            Cow::Borrowed(image)
        }
    }
}

/// [`prepare_for_recognition`] on Tokio's blocking pool.
pub async fn prepare_for_recognition_blocking(
    preprocessor: Arc<dyn ImagePreprocessor>,
    image: DynamicImage,
) -> Result<DynamicImage> {
    tokio::task::spawn_blocking(move || {
        let prepared = match prepare_for_recognition(preprocessor.as_ref(), &image) {
            Cow::Owned(prepared) => Some(prepared),
            Cow::Borrowed(_) => None,
        };
        prepared.unwrap_or(image)
    })
    .await
    .map_err(|e| InkscanError::engine_with_source("preprocessing task failed", e))
}
