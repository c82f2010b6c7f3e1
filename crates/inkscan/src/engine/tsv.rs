//! Tesseract TSV output to line observations.
//!
//! Tesseract's TSV format reports one row per layout element:
//! `level page_num block_num par_num line_num word_num left top width height conf text`.
//! Word rows (level 5) are grouped by `(page, block, paragraph, line)` in document order.
//! Tesseract ranks a single interpretation per line, so every observation carries exactly one
//! candidate.

use super::LineObservation;
use crate::types::BoundingBox;

/// TSV level of word rows.
pub const TSV_WORD_LEVEL: u32 = 5;

/// Minimum number of tab-separated fields in a word row.
pub const TSV_MIN_FIELDS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineKey {
    page: u32,
    block: u32,
    paragraph: u32,
    line: u32,
}

#[derive(Debug)]
struct LineAccumulator {
    key: LineKey,
    words: Vec<String>,
    boxes: Vec<BoundingBox>,
    confidence_sum: f64,
    confidence_count: usize,
}

impl LineAccumulator {
    fn new(key: LineKey) -> Self {
        Self {
            key,
            words: Vec::new(),
            boxes: Vec::new(),
            confidence_sum: 0.0,
            confidence_count: 0,
        }
    }

    fn into_observation(self) -> LineObservation {
        let confidence = if self.confidence_count == 0 {
            0.0
        } else {
            self.confidence_sum / self.confidence_count as f64 / 100.0
        };

        LineObservation::new(vec![self.words.join(" ")], confidence).with_word_boxes(self.boxes)
    }
}

/// Group TSV word rows into line observations.
///
/// Header rows, rows with too few fields, non-word levels and empty text are skipped. Negative word
/// confidences (Tesseract's marker for "not scored") don't contribute to the line mean.
/// Line confidence is the mean word confidence rescaled from 0-100 to 0-1.
pub fn observations_from_tsv(tsv_data: &str) -> Vec<LineObservation> {
    let mut observations = Vec::new();
    let mut current: Option<LineAccumulator> = None;

    for row in tsv_data.lines() {
        let row = row.trim_end_matches(['\r', '\n']);
        if row.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < TSV_MIN_FIELDS {
            continue;
        }

        let level = fields[0].trim().parse::<u32>().unwrap_or(0);
        if level != TSV_WORD_LEVEL {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let key = LineKey {
            page: parse_field(fields[1]),
            block: parse_field(fields[2]),
            paragraph: parse_field(fields[3]),
            line: parse_field(fields[4]),
        };

        let mut accumulator = match current.take() {
            Some(acc) if acc.key == key => acc,
            Some(acc) => {
                observations.push(acc.into_observation());
                LineAccumulator::new(key)
            }
            None => LineAccumulator::new(key),
        };

        let conf = fields[10].trim().parse::<f64>().unwrap_or(-1.0);
        if conf >= 0.0 {
            accumulator.confidence_sum += conf;
            accumulator.confidence_count += 1;
        }

        accumulator.words.push(text.to_string());
        accumulator.boxes.push(BoundingBox::new(
            parse_field(fields[6]),
            parse_field(fields[7]),
            parse_field(fields[8]),
            parse_field(fields[9]),
        ));

        current = Some(accumulator);
    }

    if let Some(acc) = current {
        observations.push(acc.into_observation());
    }

    observations
}

fn parse_field(field: &str) -> u32 {
    field.trim().parse().unwrap_or(0)
}
