//! Line assembly: engine line candidates to scored words.

use super::confidence::estimate_word_confidence;
use crate::engine::LineObservation;
use crate::types::{BoundingBox, Line, Word};

/// Secondary candidates consulted per line, after the top-ranked one.
pub const MAX_SECONDARY_CANDIDATES: usize = 4;

/// Build a [`Line`] from the top-ranked text of one line.
///
/// Every whitespace-delimited token of `primary` becomes a [`Word`] scored against
/// `secondaries`. Word boxes are attached only when the engine reported exactly one box per
/// token; otherwise the words carry no geometry.
///
/// Returns `None` when `primary` has no tokens.
pub fn assemble_line<S: AsRef<str>>(
    primary: &str,
    line_confidence: f64,
    secondaries: &[S],
    word_boxes: Option<&[BoundingBox]>,
) -> Option<Line> {
    let tokens: Vec<&str> = primary.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let boxes = word_boxes.filter(|boxes| boxes.len() == tokens.len());

    let words = tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            let estimate = estimate_word_confidence(token, index, line_confidence, secondaries);
            let bbox = boxes.map(|boxes| boxes[index]);
            Word::new(*token, estimate.confidence, estimate.alternatives, bbox)
        })
        .collect();

    Some(Line::new(words))
}

/// Assemble one engine observation using `line_confidence` in place of the reported value.
///
/// The top candidate is the primary text; up to [`MAX_SECONDARY_CANDIDATES`] of the
/// following candidates are secondaries.
pub fn assemble_observation(observation: &LineObservation, line_confidence: f64) -> Option<Line> {
    let (primary, rest) = observation.candidates.split_first()?;
    let secondaries = &rest[..rest.len().min(MAX_SECONDARY_CANDIDATES)];

    assemble_line(primary, line_confidence, secondaries, observation.word_boxes.as_deref())
}
