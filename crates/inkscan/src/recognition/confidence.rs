//! Per-word confidence estimation.
//!
//! A word starts from its line's engine confidence and is penalised multiplicatively:
//!
//! 1. `× 0.85` when secondary line candidates read the same position differently
//! 2. `× 0.9` when it contains a glyph that is neither letter, digit nor punctuation
//! 3. `× 0.8` when it is a single character other than `I`, `a` or `A`
//!
//! The order and multipliers are fixed; downstream thresholds depend on the exact values.

use crate::types::MAX_ALTERNATIVES;
use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

pub const DISAGREEMENT_PENALTY: f64 = 0.85;
pub const NON_STANDARD_GLYPH_PENALTY: f64 = 0.9;
pub const SINGLE_CHARACTER_PENALTY: f64 = 0.8;

/// Single-character words that are legitimately common in English.
pub const SINGLE_LETTER_WORDS: [&str; 3] = ["I", "a", "A"];

/// Confidence and alternative readings for one word.
#[derive(Debug, Clone, PartialEq)]
pub struct WordEstimate {
    pub confidence: f64,
    pub alternatives: Vec<String>,
}

/// Tokens at `index` of each secondary candidate that differ from `word`, deduplicated in
/// first-seen order and capped at [`MAX_ALTERNATIVES`].
pub fn collect_alternatives<S: AsRef<str>>(word: &str, index: usize, secondaries: &[S]) -> Vec<String> {
    let mut alternatives: Vec<String> = Vec::new();

    for secondary in secondaries {
        if alternatives.len() == MAX_ALTERNATIVES {
            break;
        }

        let Some(token) = secondary.as_ref().split_whitespace().nth(index) else {
            continue;
        };

        if token != word && !alternatives.iter().any(|alt| alt == token) {
            alternatives.push(token.to_string());
        }
    }

    alternatives
}

/// Estimate the confidence of `word`, the token at `index` of a line.
pub fn estimate_word_confidence<S: AsRef<str>>(
    word: &str,
    index: usize,
    line_confidence: f64,
    secondaries: &[S],
) -> WordEstimate {
    let alternatives = collect_alternatives(word, index, secondaries);
    let mut confidence = line_confidence;

    if !alternatives.is_empty() {
        confidence *= DISAGREEMENT_PENALTY;
    }

    if word.chars().any(|c| !is_standard_glyph(c)) {
        confidence *= NON_STANDARD_GLYPH_PENALTY;
    }

    if word.chars().count() == 1 && !SINGLE_LETTER_WORDS.contains(&word) {
        confidence *= SINGLE_CHARACTER_PENALTY;
    }

    WordEstimate {
        confidence,
        alternatives,
    }
}

/// Letters (with their combining marks), digits and punctuation.
pub fn is_standard_glyph(c: char) -> bool {
    matches!(
        c.general_category_group(),
        GeneralCategoryGroup::Letter
            | GeneralCategoryGroup::Mark
            | GeneralCategoryGroup::Number
            | GeneralCategoryGroup::Punctuation
    )
}

/// Punctuation in the Unicode sense (general category P*).
///
/// Math and currency signs such as `$`, `+` or `€` are symbols (S*), not punctuation.
pub fn is_punctuation(c: char) -> bool {
    matches!(c.general_category_group(), GeneralCategoryGroup::Punctuation)
}
