//! Concurrent recognition of independent images.

use super::single_pass::SinglePassRecognizer;
use crate::preprocessing::{ImagePreprocessor, prepare_for_recognition_blocking};
use crate::types::RecognitionResult;
use crate::{InkscanError, Result};
use image::DynamicImage;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Fans single-pass recognition out over a list of images.
///
/// Results come back in input order regardless of completion order. The first failure
/// aborts the remaining work and fails the whole call.
#[derive(Clone)]
pub struct BatchRecognizer {
    recognizer: SinglePassRecognizer,
    preprocessor: Option<Arc<dyn ImagePreprocessor>>,
    max_concurrent: usize,
}

impl BatchRecognizer {
    /// `max_concurrent` bounds in-flight recognitions; zero is treated as one.
    pub fn new(recognizer: SinglePassRecognizer, max_concurrent: usize) -> Self {
        Self {
            recognizer,
            preprocessor: None,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run each image through the standard pipeline before recognition, falling back to
    /// the image itself when the pipeline fails.
    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn ImagePreprocessor>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Full text of every image, in input order.
    pub async fn recognize(&self, images: Vec<DynamicImage>) -> Result<Vec<String>> {
        let results = self.recognize_results(images).await?;
        Ok(results.into_iter().map(RecognitionResult::into_text).collect())
    }

    /// Structured results of every image, in input order.
    ///
    /// # Errors
    ///
    /// The first error reported by any image, in completion order. No partial results are
    /// returned.
    #[tracing::instrument(skip(self, images), fields(count = images.len(), max_concurrent = self.max_concurrent))]
    pub async fn recognize_results(&self, images: Vec<DynamicImage>) -> Result<Vec<RecognitionResult>> {
        if images.is_empty() {
            return Ok(vec![]);
        }

        let count = images.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, image) in images.into_iter().enumerate() {
            let recognizer = self.recognizer.clone();
            let preprocessor = self.preprocessor.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;

                let result = match preprocessor {
                    Some(preprocessor) => match prepare_for_recognition_blocking(preprocessor, image).await {
                        Ok(prepared) => recognizer.recognize(&prepared).await,
                        Err(e) => Err(e),
                    },
                    None => recognizer.recognize(&image).await,
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<RecognitionResult>> = vec![None; count];

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(result))) => results[index] = Some(result),
                Ok((index, Err(e))) => {
                    tracing::debug!(index, error = %e, "batch item failed, aborting remaining work");
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(InkscanError::engine_with_source("batch recognition task failed", e));
                }
            }
        }

        results
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                result.ok_or_else(|| InkscanError::engine(format!("batch item {} produced no result", index)))
            })
            .collect()
    }
}
