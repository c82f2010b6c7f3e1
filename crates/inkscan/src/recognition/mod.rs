//! Recognition pipeline.
//!
//! - [`confidence`]: per-word confidence and alternative readings
//! - [`assembler`]: engine line candidates into [`Line`](crate::types::Line)s
//! - [`SinglePassRecognizer`]: one engine invocation on one image
//! - [`BestOfSearch`]: single-pass recognition over every preprocessing variant, best score wins
//! - [`BatchRecognizer`]: order-preserving concurrent recognition of many images

pub mod assembler;
pub mod batch;
pub mod best_of;
pub mod confidence;
pub mod single_pass;

pub use assembler::{MAX_SECONDARY_CANDIDATES, assemble_line};
pub use batch::BatchRecognizer;
pub use best_of::{BestOfOutcome, BestOfSearch, SCORE_TEXT_SATURATION, score};
pub use confidence::{WordEstimate, estimate_word_confidence};
pub use single_pass::{SinglePassRecognizer, assemble_result};
