//! One recognition attempt against one image.

use super::assembler::assemble_observation;
use crate::core::config::RecognitionConfig;
use crate::engine::{EngineRequest, LineObservation, PixelBuffer, RecognitionEngine};
use crate::types::{Line, RecognitionResult};
use crate::{InkscanError, Result};
use image::DynamicImage;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Runs the engine once and assembles its observations into a [`RecognitionResult`].
///
/// Cheap to clone; clones share the engine and request.
#[derive(Clone)]
pub struct SinglePassRecognizer {
    engine: Arc<dyn RecognitionEngine>,
    request: Arc<EngineRequest>,
    timeout: Option<Duration>,
    clamp_confidence: bool,
}

impl SinglePassRecognizer {
    pub fn new(engine: Arc<dyn RecognitionEngine>, config: &RecognitionConfig) -> Self {
        Self {
            engine,
            request: Arc::new(EngineRequest::from_config(config)),
            timeout: config.engine_timeout_ms.map(Duration::from_millis),
            clamp_confidence: config.clamp_confidence,
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn request(&self) -> &EngineRequest {
        &self.request
    }

    /// Recognize `image`.
    ///
    /// # Errors
    ///
    /// - `InkscanError::InvalidImage` - the image has no pixels or the engine rejected it
    /// - `InkscanError::NoTextDetected` - the engine reported no lines
    /// - `InkscanError::LowConfidence` - no reported line contained a word
    /// - `InkscanError::Timeout` - the engine exceeded `engine_timeout_ms`
    /// - `InkscanError::Engine` - any other engine failure
    #[tracing::instrument(skip(self, image), fields(engine = %self.engine.name(), width = image.width(), height = image.height()))]
    pub async fn recognize(&self, image: &DynamicImage) -> Result<RecognitionResult> {
        let pixels = PixelBuffer::from_image(image)?;
        self.recognize_pixels(&pixels).await
    }

    /// Recognize an already converted pixel buffer.
    pub async fn recognize_pixels(&self, pixels: &PixelBuffer) -> Result<RecognitionResult> {
        let observations = self.invoke_engine(pixels).await?;
        let result = assemble_result(&observations, self.clamp_confidence)?;

        tracing::debug!(
            lines = result.lines().len(),
            words = result.word_count(),
            average_confidence = result.average_confidence(),
            "recognition pass finished"
        );
        Ok(result)
    }

    async fn invoke_engine(&self, pixels: &PixelBuffer) -> Result<Vec<LineObservation>> {
        let call = self.engine.recognize_lines(pixels, &self.request);

        let Some(limit) = self.timeout else {
            return call.await;
        };

        let started = Instant::now();
        match tokio::time::timeout(limit, call).await {
            Ok(observations) => observations,
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                tracing::warn!(engine = %self.engine.name(), elapsed_ms, "engine invocation timed out");
                Err(InkscanError::Timeout { elapsed_ms })
            }
        }
    }
}

/// Assemble engine observations into a result.
///
/// With `clamp_confidence` line confidences are clamped into `[0, 1]` before word scoring;
/// otherwise out-of-range values pass through unchanged.
///
/// # Errors
///
/// `NoTextDetected` for zero observations, `LowConfidence` when none yields a line.
pub fn assemble_result(observations: &[LineObservation], clamp_confidence: bool) -> Result<RecognitionResult> {
    if observations.is_empty() {
        return Err(InkscanError::no_text("engine reported no lines"));
    }

    let lines: Vec<Line> = observations
        .iter()
        .filter_map(|observation| {
            let confidence = observation.confidence;
            if !(0.0..=1.0).contains(&confidence) {
                tracing::debug!(confidence, clamped = clamp_confidence, "engine line confidence outside [0, 1]");
            }

            let confidence = if clamp_confidence {
                confidence.clamp(0.0, 1.0)
            } else {
                confidence
            };
            assemble_observation(observation, confidence)
        })
        .collect();

    if lines.is_empty() {
        return Err(InkscanError::low_confidence(format!(
            "{} line(s) detected but none contained readable words",
            observations.len()
        )));
    }

    Ok(RecognitionResult::new(lines))
}
