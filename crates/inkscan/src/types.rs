//! Recognition result model.
//!
//! Every value here is created fresh for one recognition attempt and never mutated afterwards.
//! Derived fields (`full_text`, confidences, the low-confidence word list) are computed once
//! at construction. Deserialization goes through the same constructors, so a value read back
//! from storage always satisfies the invariants of a freshly built one.

use serde::{Deserialize, Serialize};

/// Words whose confidence falls strictly below this value are reported as low-confidence.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Maximum number of alternative spellings kept per word.
pub const MAX_ALTERNATIVES: usize = 3;

/// Pixel rectangle in the coordinate space of the image handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.top.saturating_add(self.height)
    }
}

/// One recognized word with its confidence and up to three alternative readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WordRepr")]
pub struct Word {
    text: String,
    confidence: f64,
    alternatives: Vec<String>,
    bounding_box: Option<BoundingBox>,
}

#[derive(Deserialize)]
struct WordRepr {
    text: String,
    confidence: f64,
    #[serde(default)]
    alternatives: Vec<String>,
    #[serde(default)]
    bounding_box: Option<BoundingBox>,
}

impl From<WordRepr> for Word {
    fn from(repr: WordRepr) -> Self {
        Word::new(repr.text, repr.confidence, repr.alternatives, repr.bounding_box)
    }
}

impl Word {
    /// Build a word. Alternatives equal to `text` and repeated alternatives are dropped,
    /// keeping first-seen order, and at most [`MAX_ALTERNATIVES`] are retained.
    pub fn new(
        text: impl Into<String>,
        confidence: f64,
        alternatives: Vec<String>,
        bounding_box: Option<BoundingBox>,
    ) -> Self {
        let text = text.into();
        let mut kept: Vec<String> = Vec::with_capacity(MAX_ALTERNATIVES);
        for alternative in alternatives {
            if kept.len() == MAX_ALTERNATIVES {
                break;
            }
            if alternative != text && !kept.contains(&alternative) {
                kept.push(alternative);
            }
        }

        Self {
            text,
            confidence,
            alternatives: kept,
            bounding_box,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence < LOW_CONFIDENCE_THRESHOLD
    }
}

/// A recognized line of words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LineRepr")]
pub struct Line {
    words: Vec<Word>,
    full_text: String,
    confidence: f64,
}

#[derive(Deserialize)]
struct LineRepr {
    words: Vec<Word>,
}

impl From<LineRepr> for Line {
    fn from(repr: LineRepr) -> Self {
        Line::new(repr.words)
    }
}

impl Line {
    pub fn new(words: Vec<Word>) -> Self {
        let full_text = words.iter().map(Word::text).collect::<Vec<_>>().join(" ");
        let confidence = mean(words.iter().map(Word::confidence));

        Self {
            words,
            full_text,
            confidence,
        }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Arithmetic mean of the word confidences, `0.0` for an empty line.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// The outcome of one completed recognition attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecognitionResultRepr")]
pub struct RecognitionResult {
    lines: Vec<Line>,
    full_text: String,
    average_confidence: f64,
    low_confidence_words: Vec<Word>,
}

#[derive(Deserialize)]
struct RecognitionResultRepr {
    lines: Vec<Line>,
}

impl From<RecognitionResultRepr> for RecognitionResult {
    fn from(repr: RecognitionResultRepr) -> Self {
        RecognitionResult::new(repr.lines)
    }
}

impl RecognitionResult {
    pub fn new(lines: Vec<Line>) -> Self {
        let full_text = lines.iter().map(Line::full_text).collect::<Vec<_>>().join("\n");
        let average_confidence = mean(lines.iter().flat_map(Line::words).map(Word::confidence));
        let low_confidence_words = lines
            .iter()
            .flat_map(Line::words)
            .filter(|word| word.is_low_confidence())
            .cloned()
            .collect();

        Self {
            lines,
            full_text,
            average_confidence,
            low_confidence_words,
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Mean confidence over every word of every line, `0.0` when there are no words.
    pub fn average_confidence(&self) -> f64 {
        self.average_confidence
    }

    pub fn low_confidence_words(&self) -> &[Word] {
        &self.low_confidence_words
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.lines.iter().flat_map(Line::words)
    }

    pub fn word_count(&self) -> usize {
        self.lines.iter().map(|line| line.words.len()).sum()
    }

    pub fn into_text(self) -> String {
        self.full_text
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
