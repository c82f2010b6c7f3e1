//! Configuration loading and management.
//!
//! [`RecognitionConfig`] carries the fixed engine request settings (candidate count,
//! accuracy mode, vocabulary bias, minimum text height) together with the knobs of the
//! orchestration layer (timeouts, batch concurrency, variant parallelism). It can be loaded
//! from TOML, YAML or JSON, or discovered as `inkscan.toml` in the directory hierarchy.

use crate::{InkscanError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the file looked up by [`RecognitionConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "inkscan.toml";

/// Upper bound for `max_candidates`; engines rarely rank more interpretations than this.
pub const MAX_CANDIDATES_LIMIT: usize = 10;

/// Recognition configuration.
///
/// # Example
///
/// ```rust
/// use inkscan::core::config::RecognitionConfig;
///
/// let config = RecognitionConfig::default();
/// assert_eq!(config.max_candidates, 5);
/// assert!(config.validate().is_ok());
///
/// // let config = RecognitionConfig::from_toml_file("inkscan.toml")?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Language hints handed to the engine (e.g. "eng", "deu")
    pub languages: Vec<String>,

    /// Ranked candidates requested per detected line
    pub max_candidates: usize,

    /// Prefer accurate over fast recognition
    pub accurate: bool,

    /// Let the engine apply its own language-model correction
    pub language_correction: bool,

    /// Vocabulary the engine should be biased towards
    pub custom_words: Vec<String>,

    /// Smallest text height to detect, as a fraction of the image height
    pub minimum_text_height: f64,

    /// Per engine invocation budget (None = no timeout)
    pub engine_timeout_ms: Option<u64>,

    /// Maximum concurrent recognitions in batch operations (None = num_cpus * 2)
    pub max_concurrent_recognitions: Option<usize>,

    /// Evaluate best-of variants concurrently
    pub parallel_variants: bool,

    /// Clamp engine line confidences into [0, 1] before word scoring
    pub clamp_confidence: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            languages: vec!["eng".to_string()],
            max_candidates: 5,
            accurate: true,
            language_correction: true,
            custom_words: default_custom_words(),
            minimum_text_height: 0.01,
            engine_timeout_ms: None,
            max_concurrent_recognitions: None,
            parallel_variants: true,
            clamp_confidence: false,
        }
    }
}

/// Note-taking jargon the engine tends to misread in handwriting.
pub fn default_custom_words() -> Vec<String> {
    [
        "email", "e-mail", "meeting", "agenda", "todo", "TODO", "to-do", "follow-up", "deadline", "reminder", "ASAP",
        "FYI", "EOD", "RSVP", "cc", "bcc", "Re:", "Fwd:", "call", "sync", "standup", "1:1",
    ]
    .iter()
    .map(|word| (*word).to_string())
    .collect()
}

impl RecognitionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() || self.languages.iter().any(|lang| lang.trim().is_empty()) {
            return Err(InkscanError::validation(
                "languages must contain at least one non-empty language code",
            ));
        }

        if self.max_candidates == 0 || self.max_candidates > MAX_CANDIDATES_LIMIT {
            return Err(InkscanError::validation(format!(
                "max_candidates must be between 1 and {}, got {}",
                MAX_CANDIDATES_LIMIT, self.max_candidates
            )));
        }

        if !(self.minimum_text_height > 0.0 && self.minimum_text_height <= 1.0) {
            return Err(InkscanError::validation(format!(
                "minimum_text_height must be in (0, 1], got {}",
                self.minimum_text_height
            )));
        }

        if self.max_concurrent_recognitions == Some(0) {
            return Err(InkscanError::validation("max_concurrent_recognitions must be at least 1"));
        }

        if self.engine_timeout_ms == Some(0) {
            return Err(InkscanError::validation("engine_timeout_ms must be greater than 0"));
        }

        Ok(())
    }

    /// Effective batch concurrency.
    pub fn concurrency_limit(&self) -> usize {
        self.max_concurrent_recognitions.unwrap_or_else(|| num_cpus::get() * 2)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InkscanError::Validation` if the file can't be read, is invalid TOML, or
    /// holds out-of-range values.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| InkscanError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_yaml_ng::from_str(&content)
            .map_err(|e| InkscanError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| InkscanError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, picking the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(InkscanError::validation(format!(
                "Unsupported config format for {}: expected .toml, .yaml, .yml or .json",
                path.display()
            ))),
        }
    }

    /// Discover `inkscan.toml` in the current directory or any parent.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(InkscanError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| InkscanError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}
