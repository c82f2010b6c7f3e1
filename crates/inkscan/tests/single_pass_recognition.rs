//! Single-pass recognition tests.
//!
//! Covers assembly of engine output into words and lines, the aggregate fields of the
//! result, and the error taxonomy of one recognition attempt.

use inkscan::core::config::RecognitionConfig;
use inkscan::recognition::SinglePassRecognizer;
use inkscan::{InkscanError, RecognitionResult, Word};
use std::sync::Arc;
use std::time::Duration;

mod helpers;

use helpers::{Reply, ScriptedEngine, assert_close, line, ranked, tagged_image, text_reply};

async fn recognize(engine: ScriptedEngine, tag: u8) -> inkscan::Result<RecognitionResult> {
    let recognizer = SinglePassRecognizer::new(Arc::new(engine), &RecognitionConfig::default());
    recognizer.recognize(&tagged_image(tag)).await
}

#[tokio::test]
async fn test_single_clean_line() {
    let result = recognize(ScriptedEngine::new().on(1, text_reply("Buy milk", 0.9)), 1)
        .await
        .unwrap();

    assert_eq!(result.lines().len(), 1);
    let words: Vec<(&str, f64)> = result.lines()[0]
        .words()
        .iter()
        .map(|w| (w.text(), w.confidence()))
        .collect();
    assert_eq!(words, vec![("Buy", 0.9), ("milk", 0.9)]);

    assert_eq!(result.full_text(), "Buy milk");
    assert_close(result.average_confidence(), 0.9);
    assert!(result.low_confidence_words().is_empty());
}

#[tokio::test]
async fn test_no_observations_is_no_text_detected() {
    let err = recognize(ScriptedEngine::new().on(1, Reply::Lines(vec![])), 1)
        .await
        .unwrap_err();

    assert!(matches!(err, InkscanError::NoTextDetected { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_only_blank_lines_is_low_confidence() {
    let reply = Reply::Lines(vec![line("   ", 0.9), ranked(&["", "milk"], 0.4)]);
    let err = recognize(ScriptedEngine::new().on(1, reply), 1).await.unwrap_err();

    assert!(matches!(err, InkscanError::LowConfidence { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_secondary_candidate_disagreement() {
    let reply = Reply::Lines(vec![ranked(&["cat", "car"], 0.8)]);
    let result = recognize(ScriptedEngine::new().on(1, reply), 1).await.unwrap();

    let cat = &result.lines()[0].words()[0];
    assert_eq!(cat.text(), "cat");
    assert_eq!(cat.alternatives(), ["car"]);
    assert_close(cat.confidence(), 0.8 * 0.85);
}

#[tokio::test]
async fn test_compounding_penalties() {
    let reply = Reply::Lines(vec![ranked(&["pay $ now", "pay S now"], 0.9)]);
    let result = recognize(ScriptedEngine::new().on(1, reply), 1).await.unwrap();

    let dollar = &result.lines()[0].words()[1];
    assert_eq!(dollar.text(), "$");
    assert_close(dollar.confidence(), 0.9 * 0.85 * 0.9 * 0.8);

    let pay = &result.lines()[0].words()[0];
    assert_eq!(pay.confidence(), 0.9);
}

#[tokio::test]
async fn test_blank_lines_are_dropped_between_real_lines() {
    let reply = Reply::Lines(vec![line("Agenda", 0.95), line(" \t ", 0.9), line("Call Bob at 5", 0.85)]);
    let result = recognize(ScriptedEngine::new().on(1, reply), 1).await.unwrap();

    assert_eq!(result.lines().len(), 2);
    assert_eq!(result.full_text(), "Agenda\nCall Bob at 5");
}

#[tokio::test]
async fn test_aggregates_follow_words() {
    let reply = Reply::Lines(vec![
        ranked(&["Meet Anna", "Meet Anne", "Meet Ana"], 0.8),
        line("re budget x", 0.75),
    ]);
    let result = recognize(ScriptedEngine::new().on(1, reply), 1).await.unwrap();

    let confidences: Vec<f64> = result.words().map(Word::confidence).collect();
    let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
    assert_close(result.average_confidence(), mean);

    let expected_low: Vec<&str> = result
        .words()
        .filter(|w| w.confidence() < 0.7)
        .map(Word::text)
        .collect();
    let low: Vec<&str> = result.low_confidence_words().iter().map(Word::text).collect();
    assert_eq!(low, expected_low);
    assert_eq!(low, ["Anna", "x"]);

    let anna = &result.lines()[0].words()[1];
    assert_eq!(anna.alternatives(), ["Anne", "Ana"]);
}

#[tokio::test]
async fn test_only_four_secondaries_are_consulted() {
    let reply = Reply::Lines(vec![ranked(&["cat", "cat", "cat", "cat", "cat", "cot"], 0.9)]);
    let result = recognize(ScriptedEngine::new().on(1, reply), 1).await.unwrap();

    let cat = &result.lines()[0].words()[0];
    assert!(cat.alternatives().is_empty());
    assert_eq!(cat.confidence(), 0.9);
}

#[tokio::test]
async fn test_engine_errors_propagate_unchanged() {
    let err = recognize(ScriptedEngine::new().on(1, Reply::Engine("model missing".into())), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, InkscanError::Engine { .. }));
    assert!(err.to_string().contains("model missing"));

    let err = recognize(ScriptedEngine::new().on(1, Reply::Invalid("bad stride".into())), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, InkscanError::InvalidImage { .. }));
}

#[tokio::test]
async fn test_engine_receives_configured_request() {
    let engine = Arc::new(ScriptedEngine::new().on(1, text_reply("hello", 0.9)));
    let config = RecognitionConfig {
        max_candidates: 3,
        languages: vec!["deu".to_string()],
        custom_words: vec!["Kaffee".to_string()],
        ..Default::default()
    };

    let recognizer = SinglePassRecognizer::new(engine.clone(), &config);
    recognizer.recognize(&tagged_image(1)).await.unwrap();

    let request = engine.last_request().unwrap();
    assert_eq!(request.max_candidates, 3);
    assert_eq!(request.languages, ["deu"]);
    assert_eq!(request.custom_words, ["Kaffee"]);
    assert!(request.accurate);
    assert!(request.language_correction);
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let engine = ScriptedEngine::new().on_delayed(1, Duration::from_secs(5), text_reply("late", 0.9));
    let config = RecognitionConfig {
        engine_timeout_ms: Some(25),
        ..Default::default()
    };

    let recognizer = SinglePassRecognizer::new(Arc::new(engine), &config);
    let err = recognizer.recognize(&tagged_image(1)).await.unwrap_err();

    match err {
        InkscanError::Timeout { elapsed_ms } => assert!(elapsed_ms >= 20, "elapsed {}", elapsed_ms),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_out_of_range_line_confidence() {
    let engine = ScriptedEngine::new().on(1, text_reply("hello world", 1.2));
    let passthrough = SinglePassRecognizer::new(Arc::new(engine), &RecognitionConfig::default());
    let result = passthrough.recognize(&tagged_image(1)).await.unwrap();
    assert_close(result.average_confidence(), 1.2);

    let engine = ScriptedEngine::new().on(1, text_reply("hello world", 1.2));
    let config = RecognitionConfig {
        clamp_confidence: true,
        ..Default::default()
    };
    let clamped = SinglePassRecognizer::new(Arc::new(engine), &config);
    let result = clamped.recognize(&tagged_image(1)).await.unwrap();
    assert_close(result.average_confidence(), 1.0);
}

#[tokio::test]
async fn test_result_round_trips_through_json() {
    let reply = Reply::Lines(vec![ranked(&["Call Bob", "Call Rob"], 0.9), line("x", 0.9)]);
    let result = recognize(ScriptedEngine::new().on(1, reply), 1).await.unwrap();

    let json = result.to_json().unwrap();
    let restored: RecognitionResult = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, result);
}
