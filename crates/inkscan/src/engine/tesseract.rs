//! Native Tesseract engine.
//!
//! Wraps `kreuzberg-tesseract` behind [`RecognitionEngine`]. Tesseract is a blocking C++
//! library, so every invocation runs inside `tokio::task::spawn_blocking` with its own
//! `TesseractAPI` handle. Lines are read from Tesseract's TSV output (see [`super::tsv`]).
//!
//! Tesseract reports one interpretation per line, so `max_candidates` is effectively 1.
//! User word lists are only read while a model loads and the bindings expose no init-time
//! parameters, so `custom_words` is not forwarded; the engine logs a warning the first time a
//! request carries any. `accurate` selects Leptonica's adaptive Otsu thresholding and the
//! inverted-line retry over the plain global Otsu pass.

use super::tsv::observations_from_tsv;
use super::{EngineRequest, LineObservation, PixelBuffer, RecognitionEngine};
use crate::{InkscanError, Result};
use async_trait::async_trait;
use kreuzberg_tesseract::{TessPageSegMode, TesseractAPI};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fully automatic page segmentation without OSD.
const PSM_AUTO: i32 = 3;

/// `thresholding_method` values.
const THRESHOLD_OTSU: &str = "0";
const THRESHOLD_LEPTONICA_OTSU: &str = "1";

const FALLBACK_TESSDATA_PATHS: &[&str] = &[
    "/opt/homebrew/share/tessdata",
    "/opt/homebrew/opt/tesseract/share/tessdata",
    "/usr/local/opt/tesseract/share/tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    r#"C:\Program Files\Tesseract-OCR\tessdata"#,
    r#"C:\ProgramData\Tesseract-OCR\tessdata"#,
];

/// Native Tesseract engine.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    tessdata: Arc<PathBuf>,
    vocabulary_warned: Arc<AtomicBool>,
}

impl TesseractEngine {
    /// Create an engine using `TESSDATA_PREFIX` or the first well-known tessdata directory.
    ///
    /// # Errors
    ///
    /// Returns `InkscanError::Engine` when no tessdata directory can be found.
    pub fn new() -> Result<Self> {
        let tessdata = resolve_tessdata().ok_or_else(|| {
            InkscanError::engine("Tesseract language data not found; set TESSDATA_PREFIX to the tessdata directory")
        })?;
        Ok(Self::with_tessdata(tessdata))
    }

    pub fn with_tessdata(tessdata: impl Into<PathBuf>) -> Self {
        Self {
            tessdata: Arc::new(tessdata.into()),
            vocabulary_warned: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn tessdata(&self) -> &Path {
        &self.tessdata
    }

    pub fn version() -> String {
        TesseractAPI::version()
    }

    fn language_spec(&self, request: &EngineRequest) -> Result<String> {
        for lang in &request.languages {
            let lang = lang.trim();
            if lang.is_empty() {
                return Err(InkscanError::engine("Language cannot be empty"));
            }

            // Missing traineddata makes tesseract abort instead of returning an error
            let traineddata = self.tessdata.join(format!("{}.traineddata", lang));
            if !traineddata.exists() {
                return Err(InkscanError::engine(format!(
                    "Language '{}' not found. Traineddata file does not exist: {}",
                    lang,
                    traineddata.display()
                )));
            }
        }

        Ok(request.languages.iter().map(|l| l.trim()).collect::<Vec<_>>().join("+"))
    }

    /// Returns true when this call emitted the warning.
    fn warn_unforwarded_vocabulary(&self, request: &EngineRequest) -> bool {
        if request.custom_words.is_empty() || self.vocabulary_warned.swap(true, Ordering::Relaxed) {
            return false;
        }

        tracing::warn!(
            words = request.custom_words.len(),
            "tesseract cannot load custom_words after initialization; vocabulary bias is ignored"
        );
        true
    }
}

fn resolve_tessdata() -> Option<PathBuf> {
    env::var_os("TESSDATA_PREFIX")
        .map(PathBuf::from)
        .filter(|path| path.exists())
        .or_else(|| {
            FALLBACK_TESSDATA_PATHS
                .iter()
                .map(Path::new)
                .find(|path| path.exists())
                .map(Path::to_path_buf)
        })
}

/// Variables that trade speed for recognition quality.
fn accuracy_variables(accurate: bool) -> [(&'static str, &'static str); 2] {
    if accurate {
        [("thresholding_method", THRESHOLD_LEPTONICA_OTSU), ("tessedit_do_invert", "1")]
    } else {
        [("thresholding_method", THRESHOLD_OTSU), ("tessedit_do_invert", "0")]
    }
}

/// Minimum x-height in pixels for a text height given as a fraction of the image height.
fn min_xheight_pixels(fraction: f64, image_height: u32) -> u32 {
    ((fraction * image_height as f64).round() as u32).max(1)
}

fn set_variable(api: &TesseractAPI, name: &str, value: &str) -> Result<()> {
    api.set_variable(name, value)
        .map_err(|e| InkscanError::engine(format!("Failed to set {}: {}", name, e)))
}

fn run_tesseract(tessdata: &Path, language: &str, pixels: &PixelBuffer, request: &EngineRequest) -> Result<String> {
    let api = TesseractAPI::new();

    api.init(&tessdata.to_string_lossy(), language)
        .map_err(|e| InkscanError::engine(format!("Failed to initialize language '{}': {}", language, e)))?;

    api.set_page_seg_mode(TessPageSegMode::from_int(PSM_AUTO))
        .map_err(|e| InkscanError::engine(format!("Failed to set PSM mode: {}", e)))?;

    set_variable(
        &api,
        "tessedit_enable_dict_correction",
        &request.language_correction.to_string(),
    )?;
    for (name, value) in accuracy_variables(request.accurate) {
        set_variable(&api, name, value)?;
    }
    set_variable(
        &api,
        "textord_min_xheight",
        &min_xheight_pixels(request.minimum_text_height, pixels.height()).to_string(),
    )?;

    api.set_image(
        pixels.as_bytes(),
        pixels.width() as i32,
        pixels.height() as i32,
        super::BYTES_PER_PIXEL as i32,
        pixels.bytes_per_line() as i32,
    )
    .map_err(|e| InkscanError::invalid_image(format!("Tesseract rejected image: {}", e)))?;

    api.recognize()
        .map_err(|e| InkscanError::engine(format!("Failed to recognize text: {}", e)))?;

    api.get_tsv_text(0)
        .map_err(|e| InkscanError::engine(format!("Failed to extract TSV: {}", e)))
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize_lines(&self, pixels: &PixelBuffer, request: &EngineRequest) -> Result<Vec<LineObservation>> {
        let language = self.language_spec(request)?;
        self.warn_unforwarded_vocabulary(request);
        let tessdata = Arc::clone(&self.tessdata);
        let pixels = pixels.clone();
        let request = request.clone();

        let tsv = tokio::task::spawn_blocking(move || run_tesseract(&tessdata, &language, &pixels, &request))
            .await
            .map_err(|e| InkscanError::engine(format!("Tesseract task panicked: {}", e)))??;

        let observations = observations_from_tsv(&tsv);
        tracing::debug!(lines = observations.len(), "tesseract recognition finished");
        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_min_xheight_pixels() {
        assert_eq!(min_xheight_pixels(0.01, 1000), 10);
        assert_eq!(min_xheight_pixels(0.01, 20), 1);
        assert_eq!(min_xheight_pixels(0.5, 100), 50);
    }

    #[test]
    fn test_language_spec_joins_languages() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("eng.traineddata"), b"").unwrap();
        std::fs::write(dir.path().join("deu.traineddata"), b"").unwrap();

        let engine = TesseractEngine::with_tessdata(dir.path());
        let request = EngineRequest {
            languages: vec!["eng".to_string(), " deu ".to_string()],
            ..Default::default()
        };

        assert_eq!(engine.language_spec(&request).unwrap(), "eng+deu");
    }

    #[test]
    fn test_language_spec_missing_traineddata() {
        let dir = tempdir().unwrap();
        let engine = TesseractEngine::with_tessdata(dir.path());
        let request = EngineRequest {
            languages: vec!["xyz".to_string()],
            ..Default::default()
        };

        let err = engine.language_spec(&request).unwrap_err();
        assert!(matches!(err, InkscanError::Engine { .. }));
        assert!(err.to_string().contains("xyz"));
    }

    #[test]
    fn test_accuracy_variables() {
        assert_eq!(
            accuracy_variables(true),
            [("thresholding_method", "1"), ("tessedit_do_invert", "1")]
        );
        assert_eq!(
            accuracy_variables(false),
            [("thresholding_method", "0"), ("tessedit_do_invert", "0")]
        );
    }

    #[test]
    fn test_custom_words_warning_is_emitted_once() {
        let engine = TesseractEngine::with_tessdata("/tmp");
        let silent = EngineRequest {
            custom_words: vec![],
            ..Default::default()
        };
        let biased = EngineRequest {
            custom_words: vec!["agenda".to_string()],
            ..Default::default()
        };

        assert!(!engine.warn_unforwarded_vocabulary(&silent));
        assert!(engine.warn_unforwarded_vocabulary(&biased));
        assert!(!engine.warn_unforwarded_vocabulary(&biased));
        assert!(!engine.clone().warn_unforwarded_vocabulary(&biased));
    }

    #[test]
    fn test_engine_name() {
        let engine = TesseractEngine::with_tessdata("/tmp");
        assert_eq!(engine.name(), "tesseract");
    }
}
