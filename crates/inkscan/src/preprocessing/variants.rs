//! Preprocessing variants for best-of recognition.

use super::ImagePreprocessor;
use crate::{InkscanError, Result};
use image::DynamicImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Binarization thresholds, lightest ink first: faint strokes, standard, heavy strokes.
pub const BINARIZATION_THRESHOLDS: [f32; 3] = [0.35, 0.5, 0.65];

/// Which preprocessing produced a variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariantKind {
    Standard,
    Scaled,
    Binarized { threshold: f32 },
    Grayscale,
    /// The unmodified input, used only when every other step failed
    Original,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Scaled => write!(f, "scaled"),
            Self::Binarized { threshold } => write!(f, "binarized@{:.2}", threshold),
            Self::Grayscale => write!(f, "grayscale"),
            Self::Original => write!(f, "original"),
        }
    }
}

/// One preprocessed version of the source image.
#[derive(Debug, Clone)]
pub struct Variant {
    pub kind: VariantKind,
    pub image: DynamicImage,
}

/// Generation order of the variant steps.
fn variant_plan() -> Vec<VariantKind> {
    let mut plan = vec![VariantKind::Standard, VariantKind::Scaled];
    plan.extend(
        BINARIZATION_THRESHOLDS
            .iter()
            .map(|&threshold| VariantKind::Binarized { threshold }),
    );
    plan.push(VariantKind::Grayscale);
    plan
}

/// Produces the bounded, ordered set of variants for one image.
#[derive(Clone)]
pub struct VariantGenerator {
    preprocessor: Arc<dyn ImagePreprocessor>,
}

impl VariantGenerator {
    pub fn new(preprocessor: Arc<dyn ImagePreprocessor>) -> Self {
        Self { preprocessor }
    }

    /// Generate variants in order: standard pipeline, scale-only, binarized at 0.35, 0.5 and
    /// 0.65, grayscale.
    ///
    /// Steps that produce nothing are skipped. The result is never empty: when every step
    /// fails it holds exactly the original image.
    pub fn generate(&self, image: &DynamicImage) -> Vec<Variant> {
        let variants: Vec<Variant> = variant_plan()
            .into_par_iter()
            .map(|kind| self.apply(kind, image).map(|image| Variant { kind, image }))
            .collect::<Vec<Option<Variant>>>()
            .into_iter()
            .flatten()
            .collect();

        if variants.is_empty() {
            tracing::debug!("every preprocessing step failed, falling back to the original image");
            return vec![Variant {
                kind: VariantKind::Original,
                image: image.clone(),
            }];
        }

        variants
    }

    /// [`generate`](Self::generate) on Tokio's blocking pool, keeping async workers free.
    pub async fn generate_blocking(&self, image: DynamicImage) -> Result<Vec<Variant>> {
        let generator = self.clone();
        tokio::task::spawn_blocking(move || generator.generate(&image))
            .await
            .map_err(|e| InkscanError::engine_with_source("variant generation task failed", e))
    }

    fn apply(&self, kind: VariantKind, image: &DynamicImage) -> Option<DynamicImage> {
        let output = match kind {
            VariantKind::Standard => self.preprocessor.standard_pipeline(image),
            VariantKind::Scaled => self.preprocessor.scale_for_recognition(image),
            VariantKind::Binarized { threshold } => self.preprocessor.binarize(image, threshold),
            VariantKind::Grayscale => self.preprocessor.to_grayscale(image),
            VariantKind::Original => Some(image.clone()),
        };

        if output.is_none() {
            tracing::debug!(variant = %kind, "preprocessing step produced no image");
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// Marks every output with a distinct luma so tests can tell steps apart.
    struct TaggingPreprocessor {
        fail: Vec<VariantKind>,
    }

    impl TaggingPreprocessor {
        fn tag(&self, kind: VariantKind, value: u8) -> Option<DynamicImage> {
            if self.fail.contains(&kind) {
                None
            } else {
                Some(DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([value]))))
            }
        }
    }

    impl ImagePreprocessor for TaggingPreprocessor {
        fn to_grayscale(&self, _image: &DynamicImage) -> Option<DynamicImage> {
            self.tag(VariantKind::Grayscale, 6)
        }

        fn binarize(&self, _image: &DynamicImage, threshold: f32) -> Option<DynamicImage> {
            self.tag(VariantKind::Binarized { threshold }, (threshold * 100.0).round() as u8)
        }

        fn scale_for_recognition(&self, _image: &DynamicImage) -> Option<DynamicImage> {
            self.tag(VariantKind::Scaled, 2)
        }

        fn standard_pipeline(&self, _image: &DynamicImage) -> Option<DynamicImage> {
            self.tag(VariantKind::Standard, 1)
        }
    }

    fn generator(fail: Vec<VariantKind>) -> VariantGenerator {
        VariantGenerator::new(Arc::new(TaggingPreprocessor { fail }))
    }

    fn source() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([200])))
    }

    #[test]
    fn test_generates_all_variants_in_order() {
        let variants = generator(vec![]).generate(&source());
        let kinds: Vec<VariantKind> = variants.iter().map(|v| v.kind).collect();

        assert_eq!(
            kinds,
            vec![
                VariantKind::Standard,
                VariantKind::Scaled,
                VariantKind::Binarized { threshold: 0.35 },
                VariantKind::Binarized { threshold: 0.5 },
                VariantKind::Binarized { threshold: 0.65 },
                VariantKind::Grayscale,
            ]
        );

        let tags: Vec<u8> = variants.iter().map(|v| v.image.to_luma8().get_pixel(0, 0)[0]).collect();
        assert_eq!(tags, vec![1, 2, 35, 50, 65, 6]);
    }

    #[test]
    fn test_failed_steps_are_skipped_not_substituted() {
        let variants = generator(vec![VariantKind::Standard, VariantKind::Binarized { threshold: 0.5 }]).generate(&source());
        let kinds: Vec<VariantKind> = variants.iter().map(|v| v.kind).collect();

        assert_eq!(
            kinds,
            vec![
                VariantKind::Scaled,
                VariantKind::Binarized { threshold: 0.35 },
                VariantKind::Binarized { threshold: 0.65 },
                VariantKind::Grayscale,
            ]
        );
    }

    #[test]
    fn test_all_steps_failing_yields_original() {
        let variants = generator(variant_plan()).generate(&source());

        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].kind, VariantKind::Original);
        assert_eq!(variants[0].image.to_luma8().get_pixel(0, 0)[0], 200);
    }

    #[test]
    fn test_standard_preprocessor_never_empty_for_empty_image() {
        let generator = VariantGenerator::new(Arc::new(crate::preprocessing::StandardPreprocessor::new()));
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));

        let variants = generator.generate(&empty);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].kind, VariantKind::Original);
    }

    #[test]
    fn test_variant_kind_display() {
        assert_eq!(VariantKind::Standard.to_string(), "standard");
        assert_eq!(VariantKind::Binarized { threshold: 0.35 }.to_string(), "binarized@0.35");
        assert_eq!(VariantKind::Original.to_string(), "original");
    }
}
