//! Best-of recognition over preprocessing variants.

use super::single_pass::SinglePassRecognizer;
use crate::preprocessing::{Variant, VariantGenerator, VariantKind};
use crate::types::RecognitionResult;
use crate::{InkscanError, Result};
use image::DynamicImage;
use serde::Serialize;
use tokio::task::JoinSet;

/// Text length at which the length factor of [`score`] saturates.
pub const SCORE_TEXT_SATURATION: usize = 500;

/// `average_confidence × min(chars(full_text), 500) / 500`.
///
/// Long transcriptions stop gaining once they pass 500 characters.
pub fn score(result: &RecognitionResult) -> f64 {
    let length = result.full_text().chars().count().min(SCORE_TEXT_SATURATION);
    result.average_confidence() * length as f64 / SCORE_TEXT_SATURATION as f64
}

/// The winning variant of a best-of search.
#[derive(Debug, Clone, Serialize)]
pub struct BestOfOutcome {
    pub result: RecognitionResult,
    pub variant: VariantKind,
    pub score: f64,
    /// Variants that were recognized
    pub attempted: usize,
    /// Variants whose recognition succeeded
    pub succeeded: usize,
}

type Attempt = (VariantKind, Result<RecognitionResult>);

/// Runs [`SinglePassRecognizer`] over every variant of an image and keeps the best score.
#[derive(Clone)]
pub struct BestOfSearch {
    recognizer: SinglePassRecognizer,
    generator: VariantGenerator,
    parallel: bool,
}

impl BestOfSearch {
    /// With `parallel` the variants are recognized concurrently; selection still follows
    /// generation order.
    pub fn new(recognizer: SinglePassRecognizer, generator: VariantGenerator, parallel: bool) -> Self {
        Self {
            recognizer,
            generator,
            parallel,
        }
    }

    pub async fn recognize_best(&self, image: &DynamicImage) -> Result<RecognitionResult> {
        self.recognize_best_detailed(image).await.map(|outcome| outcome.result)
    }

    /// Recognize every variant and return the highest-scoring result with its provenance.
    ///
    /// Individual variant failures are skipped. Equal scores keep the earlier variant.
    ///
    /// # Errors
    ///
    /// `InkscanError::NoTextDetected` when every variant failed.
    #[tracing::instrument(skip(self, image), fields(parallel = self.parallel))]
    pub async fn recognize_best_detailed(&self, image: &DynamicImage) -> Result<BestOfOutcome> {
        let variants = self.generator.generate_blocking(image.clone()).await?;
        tracing::debug!(variants = variants.len(), "generated preprocessing variants");

        let attempts = if self.parallel {
            self.run_parallel(variants).await
        } else {
            self.run_sequential(variants).await
        };

        select_best(attempts)
    }

    async fn run_sequential(&self, variants: Vec<Variant>) -> Vec<Attempt> {
        let mut attempts = Vec::with_capacity(variants.len());
        for variant in variants {
            let result = self.recognizer.recognize(&variant.image).await;
            attempts.push((variant.kind, result));
        }
        attempts
    }

    async fn run_parallel(&self, variants: Vec<Variant>) -> Vec<Attempt> {
        let kinds: Vec<VariantKind> = variants.iter().map(|variant| variant.kind).collect();
        let mut slots: Vec<Option<Result<RecognitionResult>>> = kinds.iter().map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (index, variant) in variants.into_iter().enumerate() {
            let recognizer = self.recognizer.clone();
            tasks.spawn(async move { (index, recognizer.recognize(&variant.image).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::warn!(error = %e, "variant recognition task failed"),
            }
        }

        kinds
            .into_iter()
            .zip(slots)
            .map(|(kind, slot)| {
                let result = slot.unwrap_or_else(|| Err(InkscanError::engine("variant recognition task did not complete")));
                (kind, result)
            })
            .collect()
    }
}

/// Pick the best attempt in generation order. Only a strictly higher score replaces the
/// running best.
fn select_best(attempts: Vec<Attempt>) -> Result<BestOfOutcome> {
    let attempted = attempts.len();
    let mut succeeded = 0;
    let mut best: Option<(VariantKind, f64, RecognitionResult)> = None;

    for (kind, result) in attempts {
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(variant = %kind, error = %e, "variant recognition failed");
                continue;
            }
        };

        succeeded += 1;
        let variant_score = score(&result);
        tracing::debug!(variant = %kind, score = variant_score, "variant recognized");

        let replaces = match &best {
            Some((_, best_score, _)) => variant_score > *best_score,
            None => true,
        };
        if replaces {
            best = Some((kind, variant_score, result));
        }
    }

    let (variant, score, result) =
        best.ok_or_else(|| InkscanError::no_text(format!("all {} preprocessing variants failed", attempted)))?;

    tracing::debug!(variant = %variant, score, attempted, succeeded, "selected best variant");
    Ok(BestOfOutcome {
        result,
        variant,
        score,
        attempted,
        succeeded,
    })
}
