//! The recognition service.
//!
//! [`Recognizer`] wires an engine, a preprocessor and a [`RecognitionConfig`] into the three
//! recognition paths:
//!
//! - **simple**: standard preprocessing, then one engine pass ([`Recognizer::recognize`])
//! - **best effort**: every preprocessing variant, best score wins ([`Recognizer::recognize_best`])
//! - **batch**: the simple path over many images concurrently ([`Recognizer::recognize_batch`])
//!
//! Every async method has a blocking `_sync` counterpart driven by a shared Tokio runtime.
//! The sync wrappers must not be called from inside an async context.

use crate::core::config::RecognitionConfig;
use crate::core::runtime;
use crate::engine::RecognitionEngine;
use crate::preprocessing::{ImagePreprocessor, StandardPreprocessor, VariantGenerator, prepare_for_recognition_blocking};
use crate::recognition::{BatchRecognizer, BestOfOutcome, BestOfSearch, SinglePassRecognizer};
use crate::types::RecognitionResult;
use crate::Result;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

/// Confidence-scored text recognition.
///
/// Cheap to clone and safe to share across tasks; no state is kept between calls.
///
/// # Example
///
/// ```rust,no_run
/// # #[cfg(feature = "tesseract")]
/// # fn main() -> inkscan::Result<()> {
/// use inkscan::{Recognizer, RecognitionConfig};
///
/// let recognizer = Recognizer::tesseract(RecognitionConfig::default())?;
/// let image = inkscan::load_image("note.jpg")?;
/// let result = recognizer.recognize_best_sync(&image)?;
///
/// println!("{}", result.full_text());
/// for word in result.low_confidence_words() {
///     println!("check: {} {:?}", word.text(), word.alternatives());
/// }
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "tesseract"))]
/// # fn main() {}
/// ```
#[derive(Clone)]
pub struct Recognizer {
    config: Arc<RecognitionConfig>,
    preprocessor: Arc<dyn ImagePreprocessor>,
    single_pass: SinglePassRecognizer,
    best_of: BestOfSearch,
    batch: BatchRecognizer,
}

impl Recognizer {
    /// Build a recognizer.
    ///
    /// # Errors
    ///
    /// Returns `InkscanError::Validation` when `config` is invalid.
    pub fn new(
        engine: Arc<dyn RecognitionEngine>,
        preprocessor: Arc<dyn ImagePreprocessor>,
        config: RecognitionConfig,
    ) -> Result<Self> {
        config.validate()?;

        let single_pass = SinglePassRecognizer::new(engine, &config);
        let best_of = BestOfSearch::new(
            single_pass.clone(),
            VariantGenerator::new(Arc::clone(&preprocessor)),
            config.parallel_variants,
        );
        let batch = BatchRecognizer::new(single_pass.clone(), config.concurrency_limit())
            .with_preprocessor(Arc::clone(&preprocessor));

        tracing::debug!(
            engine = %single_pass.engine_name(),
            max_candidates = config.max_candidates,
            parallel_variants = config.parallel_variants,
            "recognizer ready"
        );

        Ok(Self {
            config: Arc::new(config),
            preprocessor,
            single_pass,
            best_of,
            batch,
        })
    }

    /// Recognizer with the [`StandardPreprocessor`] and the default configuration.
    pub fn with_engine(engine: Arc<dyn RecognitionEngine>) -> Result<Self> {
        Self::new(engine, Arc::new(StandardPreprocessor::new()), RecognitionConfig::default())
    }

    /// Recognizer backed by the native Tesseract engine and the [`StandardPreprocessor`].
    #[cfg(feature = "tesseract")]
    pub fn tesseract(config: RecognitionConfig) -> Result<Self> {
        let engine = crate::engine::TesseractEngine::new()?;
        Self::new(Arc::new(engine), Arc::new(StandardPreprocessor::new()), config)
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    pub fn single_pass(&self) -> &SinglePassRecognizer {
        &self.single_pass
    }

    pub fn best_of(&self) -> &BestOfSearch {
        &self.best_of
    }

    pub fn batch(&self) -> &BatchRecognizer {
        &self.batch
    }

    /// Simple path: standard preprocessing (or the image itself when that fails), then one
    /// recognition pass.
    pub async fn recognize(&self, image: &DynamicImage) -> Result<RecognitionResult> {
        let prepared = prepare_for_recognition_blocking(Arc::clone(&self.preprocessor), image.clone()).await?;
        self.single_pass.recognize(&prepared).await
    }

    /// Simple path, plain text only.
    pub async fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        self.recognize(image).await.map(RecognitionResult::into_text)
    }

    /// Best-effort path over every preprocessing variant.
    pub async fn recognize_best(&self, image: &DynamicImage) -> Result<RecognitionResult> {
        self.best_of.recognize_best(image).await
    }

    /// Best-effort path, including which variant won and its score.
    pub async fn recognize_best_detailed(&self, image: &DynamicImage) -> Result<BestOfOutcome> {
        self.best_of.recognize_best_detailed(image).await
    }

    /// Full text of every image, in input order.
    pub async fn recognize_batch(&self, images: Vec<DynamicImage>) -> Result<Vec<String>> {
        self.batch.recognize(images).await
    }

    pub async fn recognize_batch_results(&self, images: Vec<DynamicImage>) -> Result<Vec<RecognitionResult>> {
        self.batch.recognize_results(images).await
    }

    /// Decode an encoded image (PNG, JPEG, WebP, ...) and run the simple path.
    pub async fn recognize_bytes(&self, bytes: &[u8]) -> Result<RecognitionResult> {
        let image = decode_image(bytes)?;
        self.recognize(&image).await
    }

    /// Decode an encoded image and run the best-effort path.
    pub async fn recognize_best_bytes(&self, bytes: &[u8]) -> Result<RecognitionResult> {
        let image = decode_image(bytes)?;
        self.recognize_best(&image).await
    }

    pub fn recognize_sync(&self, image: &DynamicImage) -> Result<RecognitionResult> {
        runtime::block_on(self.recognize(image))
    }

    pub fn recognize_best_sync(&self, image: &DynamicImage) -> Result<RecognitionResult> {
        runtime::block_on(self.recognize_best(image))
    }

    pub fn recognize_best_detailed_sync(&self, image: &DynamicImage) -> Result<BestOfOutcome> {
        runtime::block_on(self.recognize_best_detailed(image))
    }

    pub fn recognize_batch_sync(&self, images: Vec<DynamicImage>) -> Result<Vec<String>> {
        runtime::block_on(self.recognize_batch(images))
    }
}

/// Decode an in-memory image.
///
/// # Errors
///
/// `InkscanError::InvalidImage` when the bytes are not a supported image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Read and decode an image file.
///
/// # Errors
///
/// `InkscanError::Io` when the file cannot be read, `InkscanError::InvalidImage` when it is
/// not a supported image.
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_image(&bytes)
}
