//! Shared test fixtures: a scripted engine and a tagging preprocessor.
//!
//! Test images are solid-colour images whose first channel is a "tag". The scripted engine
//! reads the tag of the first pixel and answers with whatever was scripted for it, which
//! lets tests steer each image or variant independently.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use inkscan::engine::{EngineRequest, LineObservation, PixelBuffer, RecognitionEngine};
use inkscan::preprocessing::ImagePreprocessor;
use inkscan::{InkscanError, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted engine answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Lines(Vec<LineObservation>),
    Engine(String),
    Invalid(String),
}

#[derive(Debug, Clone)]
struct Script {
    reply: Reply,
    delay: Option<Duration>,
}

/// Engine that answers per image tag.
///
/// Untagged images get `Reply::Lines(vec![])`, i.e. "no text".
#[derive(Default)]
pub struct ScriptedEngine {
    scripts: HashMap<u8, Script>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<EngineRequest>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, tag: u8, reply: Reply) -> Self {
        self.scripts.insert(tag, Script { reply, delay: None });
        self
    }

    pub fn on_delayed(mut self, tag: u8, delay: Duration, reply: Reply) -> Self {
        self.scripts.insert(
            tag,
            Script {
                reply,
                delay: Some(delay),
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<EngineRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RecognitionEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize_lines(&self, pixels: &PixelBuffer, request: &EngineRequest) -> Result<Vec<LineObservation>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let tag = pixels.as_bytes()[0];
        let script = self.scripts.get(&tag).cloned().unwrap_or(Script {
            reply: Reply::Lines(vec![]),
            delay: None,
        });

        if let Some(delay) = script.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match script.reply {
            Reply::Lines(lines) => Ok(lines),
            Reply::Engine(message) => Err(InkscanError::engine(message)),
            Reply::Invalid(message) => Err(InkscanError::invalid_image(message)),
        }
    }
}

pub const STANDARD_TAG: u8 = 10;
pub const SCALED_TAG: u8 = 20;
pub const GRAYSCALE_TAG: u8 = 70;

/// Luma tag of a binarized variant: 35, 50 or 65.
pub fn binarized_tag(threshold: f32) -> u8 {
    (threshold * 100.0).round() as u8
}

/// Preprocessor whose outputs are solid images carrying a per-step tag.
#[derive(Default)]
pub struct TaggingPreprocessor {
    failing_standard: bool,
    failing_scaled: bool,
    failing_grayscale: bool,
    failing_thresholds: Vec<f32>,
}

impl TaggingPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every step fails.
    pub fn broken() -> Self {
        Self {
            failing_standard: true,
            failing_scaled: true,
            failing_grayscale: true,
            failing_thresholds: vec![0.35, 0.5, 0.65],
        }
    }

    /// Only the binarization at `threshold` succeeds.
    pub fn only_binarized(threshold: f32) -> Self {
        Self {
            failing_standard: true,
            failing_scaled: true,
            failing_grayscale: true,
            failing_thresholds: [0.35, 0.5, 0.65].into_iter().filter(|t| *t != threshold).collect(),
        }
    }
}

fn tagged_gray(tag: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([tag])))
}

impl ImagePreprocessor for TaggingPreprocessor {
    fn to_grayscale(&self, _image: &DynamicImage) -> Option<DynamicImage> {
        (!self.failing_grayscale).then(|| tagged_gray(GRAYSCALE_TAG))
    }

    fn binarize(&self, _image: &DynamicImage, threshold: f32) -> Option<DynamicImage> {
        (!self.failing_thresholds.contains(&threshold)).then(|| tagged_gray(binarized_tag(threshold)))
    }

    fn scale_for_recognition(&self, _image: &DynamicImage) -> Option<DynamicImage> {
        (!self.failing_scaled).then(|| tagged_gray(SCALED_TAG))
    }

    fn standard_pipeline(&self, _image: &DynamicImage) -> Option<DynamicImage> {
        (!self.failing_standard).then(|| tagged_gray(STANDARD_TAG))
    }
}

/// Solid RGB image whose first channel carries `tag`.
pub fn tagged_image(tag: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([tag, 255, 255])))
}

/// One engine line with a single candidate.
pub fn line(text: &str, confidence: f64) -> LineObservation {
    LineObservation::new(vec![text.to_string()], confidence)
}

/// One engine line with ranked candidates, best first.
pub fn ranked(candidates: &[&str], confidence: f64) -> LineObservation {
    LineObservation::new(candidates.iter().map(|c| c.to_string()).collect(), confidence)
}

pub fn text_reply(text: &str, confidence: f64) -> Reply {
    Reply::Lines(vec![line(text, confidence)])
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {} to be within 1e-9 of {}",
        actual,
        expected
    );
}
