//! Configuration and runtime plumbing shared by the recognition layers.

pub mod config;
pub mod runtime;

pub use config::RecognitionConfig;
