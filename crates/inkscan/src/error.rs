//! Error types for inkscan.
//!
//! All fallible operations return [`InkscanError`]. The recognition kinds mirror what a
//! caller needs to tell apart when presenting an outcome:
//!
//! - `InvalidImage` - the input could not be turned into something the engine accepts
//! - `NoTextDetected` - the engine found nothing, or every best-of variant failed
//! - `LowConfidence` - the engine reported lines but none survived word assembly
//! - `Timeout` - an engine invocation exceeded the configured budget
//!
//! **System errors bubble up unchanged:** `InkscanError::Io` wraps `std::io::Error` and is
//! never rewritten into another kind.
//!
//! # Example
//!
//! ```rust
//! use inkscan::{InkscanError, Result};
//!
//! fn require_pixels(width: u32, height: u32) -> Result<()> {
//!     if width == 0 || height == 0 {
//!         return Err(InkscanError::invalid_image(format!("empty image {}x{}", width, height)));
//!     }
//!     Ok(())
//! }
//!
//! assert!(require_pixels(0, 10).is_err());
//! ```
use thiserror::Error;

/// Result type alias using `InkscanError`.
pub type Result<T> = std::result::Result<T, InkscanError>;

/// Main error type for all inkscan operations.
#[derive(Debug, Error)]
pub enum InkscanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image: {message}")]
    InvalidImage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("No text detected: {message}")]
    NoTextDetected { message: String },

    #[error("Low confidence: {message}")]
    LowConfidence { message: String },

    #[error("Recognition timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Engine error: {message}")]
    Engine {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl From<serde_json::Error> for InkscanError {
    fn from(err: serde_json::Error) -> Self {
        InkscanError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<image::ImageError> for InkscanError {
    fn from(err: image::ImageError) -> Self {
        InkscanError::InvalidImage {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl InkscanError {
    error_constructor!(invalid_image, InvalidImage);
    error_constructor!(engine, Engine);
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// Create a NoTextDetected error
    pub fn no_text<S: Into<String>>(message: S) -> Self {
        Self::NoTextDetected {
            message: message.into(),
        }
    }

    /// Create a LowConfidence error
    pub fn low_confidence<S: Into<String>>(message: S) -> Self {
        Self::LowConfidence {
            message: message.into(),
        }
    }

    pub fn is_no_text(&self) -> bool {
        matches!(self, Self::NoTextDetected { .. })
    }

    pub fn is_low_confidence(&self) -> bool {
        matches!(self, Self::LowConfidence { .. })
    }
}
