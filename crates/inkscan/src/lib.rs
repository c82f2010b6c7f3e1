//! Inkscan - Confidence-Scored Text Recognition
//!
//! Inkscan turns photos of handwritten or printed notes into structured text. Every word
//! carries a confidence estimate and up to three alternative readings, so callers can flag
//! uncertain words instead of trusting the transcription blindly.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use inkscan::engine::{EngineRequest, LineObservation, PixelBuffer, RecognitionEngine};
//! use inkscan::Recognizer;
//! use std::sync::Arc;
//!
//! struct MyEngine;
//!
//! #[async_trait]
//! impl RecognitionEngine for MyEngine {
//!     fn name(&self) -> &str {
//!         "my-engine"
//!     }
//!
//!     async fn recognize_lines(&self, _pixels: &PixelBuffer, _request: &EngineRequest) -> inkscan::Result<Vec<LineObservation>> {
//!         Ok(vec![LineObservation::new(vec!["Buy milk".into(), "Buy mild".into()], 0.9)])
//!     }
//! }
//!
//! # fn main() -> inkscan::Result<()> {
//! let recognizer = Recognizer::with_engine(Arc::new(MyEngine))?;
//! let image = inkscan::load_image("note.jpg")?;
//! let result = recognizer.recognize_best_sync(&image)?;
//! println!("{} ({:.2})", result.full_text(), result.average_confidence());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Engine** (`engine`): the recognition capability seam, plus the Tesseract adapter
//! - **Preprocessing** (`preprocessing`): cleanup primitives and the variant generator
//! - **Recognition** (`recognition`): word scoring, line assembly, single-pass, best-of and batch
//! - **Service** (`service`): [`Recognizer`], the entry point wiring it all together
//!
//! # Features
//!
//! - `tesseract`: native Tesseract engine via `kreuzberg-tesseract`

#![deny(unsafe_code)]

pub mod core;
pub mod engine;
pub mod error;
pub mod preprocessing;
pub mod recognition;
pub mod service;
pub mod types;

pub use error::{InkscanError, Result};
pub use types::*;

pub use core::config::RecognitionConfig;

pub use engine::{EngineRequest, LineObservation, PixelBuffer, RecognitionEngine};

#[cfg(feature = "tesseract")]
pub use engine::TesseractEngine;

pub use preprocessing::{ImagePreprocessor, StandardPreprocessor, Variant, VariantGenerator, VariantKind};

pub use recognition::{BatchRecognizer, BestOfOutcome, BestOfSearch, SinglePassRecognizer};

pub use service::{Recognizer, decode_image, load_image};

pub use image::DynamicImage;
