// Cascade contract and threshold boundaries through the public API.

use std::path::PathBuf;

use driftnet::db::models::SentimentLabel;
use driftnet::sentiment::{
    BackendKind, ExtraAlphabet, KeywordExtractor, Sentiment, SentimentCascade,
};

fn no_models() -> PathBuf {
    PathBuf::from("/nonexistent/driftnet-models")
}

fn lexicon_cascade() -> SentimentCascade {
    SentimentCascade::probe_order(&[BackendKind::Lexicon], &no_models(), 0.3)
}

// ============================================================
// Cascade contract
// ============================================================

#[tokio::test]
async fn empty_text_is_the_universal_neutral() {
    // Every backend the probe can actually select must honor this
    for order in [
        &[BackendKind::Compound][..],
        &[BackendKind::Lexicon][..],
        &[][..],
    ] {
        let cascade = SentimentCascade::probe_order(order, &no_models(), 0.3);
        for text in ["", "   ", "\n\t"] {
            let result = cascade.classify(text).await;
            assert_eq!(result, Sentiment::neutral(), "backend order {order:?}");
        }
    }
}

#[test]
fn missing_model_files_select_the_next_backend() {
    let cascade = SentimentCascade::probe(&no_models(), 0.3);
    assert_eq!(cascade.active_backend(), BackendKind::Compound);
}

#[tokio::test]
async fn batch_and_single_agree() {
    let cascade = lexicon_cascade();
    let texts = vec![
        "excellent quality".to_string(),
        "broken useless scam".to_string(),
        "the box was brown".to_string(),
    ];

    let batch = cascade.classify_batch(&texts).await;
    for (text, from_batch) in texts.iter().zip(&batch) {
        let single = cascade.classify(text).await;
        assert_eq!(&single, from_batch);
    }
}

// ============================================================
// Lexicon threshold boundary
// ============================================================

#[tokio::test]
async fn lexicon_score_exactly_at_threshold_is_neutral() {
    // 1 positive hit in 20 words: score = 0.05 exactly, boundary exclusive
    let filler = "word ".repeat(19);
    let text = format!("{filler}good");
    let result = lexicon_cascade().classify(&text).await;
    assert!((result.score - 0.05).abs() < 1e-12);
    assert_eq!(result.label, SentimentLabel::Neutral);
}

#[tokio::test]
async fn lexicon_score_just_over_threshold_is_positive() {
    // 1 positive hit in 19 words: score ~= 0.0526 > 0.05
    let filler = "word ".repeat(18);
    let text = format!("{filler}good");
    let result = lexicon_cascade().classify(&text).await;
    assert_eq!(result.label, SentimentLabel::Positive);
}

#[tokio::test]
async fn lexicon_confidence_is_scaled_and_capped() {
    // score = -1.0 -> confidence capped at 1.0
    let result = lexicon_cascade().classify("terrible awful scam").await;
    assert_eq!(result.label, SentimentLabel::Negative);
    assert!((result.confidence - 1.0).abs() < 1e-12);
}

// ============================================================
// Keyword extraction
// ============================================================

#[test]
fn keywords_rank_by_frequency_then_first_seen() {
    let extractor = KeywordExtractor::new(5, ExtraAlphabet::None);
    let keywords = extractor.extract("shipping delayed, shipping refund, refund delayed, courier");
    // shipping/delayed/refund appear twice (in that first-seen order);
    // courier once, so it ranks last
    assert_eq!(
        keywords,
        vec![
            "shipping".to_string(),
            "delayed".to_string(),
            "refund".to_string(),
            "courier".to_string(),
        ]
    );
}

#[test]
fn keywords_respect_the_configured_alphabet() {
    let cyrillic = KeywordExtractor::new(5, ExtraAlphabet::Cyrillic);
    let latin_only = KeywordExtractor::new(5, ExtraAlphabet::None);
    let text = "доставка доставка courier";

    assert!(cyrillic.extract(text).contains(&"доставка".to_string()));
    assert_eq!(latin_only.extract(text), vec!["courier".to_string()]);
}
