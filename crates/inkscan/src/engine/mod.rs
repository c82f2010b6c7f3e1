//! Text recognition engine seam.
//!
//! The engine is an opaque capability: given a packed pixel buffer it reports detected lines,
//! each with ranked candidate interpretations and a line-level confidence. Everything above
//! this module (word scoring, line assembly, variant search) is engine-agnostic.
//!
//! # Engines
//!
//! - [`TesseractEngine`] (feature `tesseract`): native Tesseract via `kreuzberg-tesseract`
//! - Any custom type implementing [`RecognitionEngine`]
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use inkscan::Result;
//! use inkscan::engine::{EngineRequest, LineObservation, PixelBuffer, RecognitionEngine};
//!
//! struct FixedEngine;
//!
//! #[async_trait]
//! impl RecognitionEngine for FixedEngine {
//!     fn name(&self) -> &str {
//!         "fixed"
//!     }
//!
//!     async fn recognize_lines(&self, _pixels: &PixelBuffer, _request: &EngineRequest) -> Result<Vec<LineObservation>> {
//!         Ok(vec![LineObservation::new(vec!["Buy milk".to_string()], 0.9)])
//!     }
//! }
//! ```

pub mod tsv;

#[cfg(feature = "tesseract")]
pub mod tesseract;

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractEngine;

use crate::core::config::RecognitionConfig;
use crate::types::BoundingBox;
use crate::{InkscanError, Result};
use async_trait::async_trait;
use image::DynamicImage;

/// Bytes per pixel of the packed RGB8 layout engines receive.
pub const BYTES_PER_PIXEL: u32 = 3;

/// Trait for text recognition engines.
///
/// # Thread Safety
///
/// Engines are shared across concurrent recognitions (`Arc<dyn RecognitionEngine>`) and must
/// be `Send + Sync`. Blocking engines should move their work off the async executor, e.g.
/// with `tokio::task::spawn_blocking`.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Recognize every line in `pixels`.
    ///
    /// Returns observations in reading order. Candidates within an observation are ordered
    /// by descending engine confidence, at most `request.max_candidates` of them.
    ///
    /// # Errors
    ///
    /// - `InkscanError::InvalidImage` - the engine rejected the pixel data
    /// - `InkscanError::Engine` - the engine could not be initialised or failed internally
    async fn recognize_lines(&self, pixels: &PixelBuffer, request: &EngineRequest) -> Result<Vec<LineObservation>>;
}

/// One detected line of text as reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LineObservation {
    /// Ranked interpretations of the whole line, best first
    pub candidates: Vec<String>,
    /// Engine-reported line confidence
    pub confidence: f64,
    /// Per-token geometry of the top candidate, when the engine reports it
    pub word_boxes: Option<Vec<BoundingBox>>,
}

impl LineObservation {
    pub fn new(candidates: Vec<String>, confidence: f64) -> Self {
        Self {
            candidates,
            confidence,
            word_boxes: None,
        }
    }

    pub fn with_word_boxes(mut self, boxes: Vec<BoundingBox>) -> Self {
        self.word_boxes = Some(boxes);
        self
    }

    pub fn top_candidate(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }
}

/// Fixed per-invocation engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    pub max_candidates: usize,
    pub accurate: bool,
    pub language_correction: bool,
    pub languages: Vec<String>,
    pub custom_words: Vec<String>,
    /// Fraction of the image height
    pub minimum_text_height: f64,
}

impl EngineRequest {
    pub fn from_config(config: &RecognitionConfig) -> Self {
        Self {
            max_candidates: config.max_candidates,
            accurate: config.accurate,
            language_correction: config.language_correction,
            languages: config.languages.clone(),
            custom_words: config.custom_words.clone(),
            minimum_text_height: config.minimum_text_height,
        }
    }
}

impl Default for EngineRequest {
    fn default() -> Self {
        Self::from_config(&RecognitionConfig::default())
    }
}

/// Packed RGB8 pixel buffer, the format every engine consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Convert a decoded image into the engine pixel format.
    ///
    /// # Errors
    ///
    /// Returns `InkscanError::InvalidImage` for images without pixels.
    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(InkscanError::invalid_image(format!(
                "cannot convert {}x{} image to an RGB8 pixel buffer",
                width, height
            )));
        }

        let rgb = image.to_rgb8();
        Ok(Self {
            width,
            height,
            data: rgb.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_line(&self) -> u32 {
        self.width * BYTES_PER_PIXEL
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
