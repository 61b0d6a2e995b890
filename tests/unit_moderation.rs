// Moderation rule ordering and configuration behavior through the public API.

use driftnet::db::models::ModerationStatus;
use driftnet::moderation::{ModerationEngine, DEFAULT_PROFANITY_PATTERNS};

fn engine_with(blocklist: &[&str], negative_threshold: f64) -> ModerationEngine {
    let blocklist: Vec<String> = blocklist.iter().map(|s| s.to_string()).collect();
    let profanity: Vec<String> = DEFAULT_PROFANITY_PATTERNS
        .iter()
        .map(|s| s.to_string())
        .collect();
    ModerationEngine::new(&blocklist, &profanity, negative_threshold).unwrap()
}

#[test]
fn moderation_is_deterministic_across_calls() {
    let engine = engine_with(&["scamcoin"], -0.5);
    let inputs: &[(&str, Option<f64>)] = &[
        ("perfectly ordinary text", Some(0.2)),
        ("scamcoin is back", Some(0.9)),
        ("big discount https://x.example", Some(0.0)),
        ("utterly miserable experience", Some(-0.9)),
    ];

    for (text, score) in inputs {
        let first = engine.moderate(text, *score);
        for _ in 0..5 {
            assert_eq!(engine.moderate(text, *score), first);
        }
    }
}

#[test]
fn rule_order_blocklist_over_sentiment_gate() {
    // A blocklisted word rejects outright even when the sentiment gate
    // would only ask for manual review
    let engine = engine_with(&["scamcoin"], -0.5);
    let d = engine.moderate("scamcoin ruined everything", Some(-0.9));
    assert_eq!(d.status, ModerationStatus::Rejected);
    assert!(!d.requires_manual_review);
}

#[test]
fn rule_order_spam_over_promo() {
    // Three URLs hit the spam rule before the promo rule can fire
    let engine = engine_with(&[], -0.5);
    let d = engine.moderate(
        "discount! http://a http://b http://c",
        Some(0.5),
    );
    assert_eq!(d.status, ModerationStatus::Rejected);
    assert!(d.reason.unwrap().starts_with("spam"));
}

#[test]
fn negative_threshold_is_configurable() {
    let strict = engine_with(&[], -0.1);
    let lenient = engine_with(&[], -0.9);
    let text = "quite unhappy with the delivery";

    let d = strict.moderate(text, Some(-0.4));
    assert_eq!(d.status, ModerationStatus::Pending);
    assert!(d.requires_manual_review);

    let d = lenient.moderate(text, Some(-0.4));
    assert_eq!(d.status, ModerationStatus::Approved);
}

#[test]
fn empty_blocklist_and_patterns_still_moderate() {
    let engine = ModerationEngine::new(&[], &[], -0.5).unwrap();
    assert_eq!(
        engine.moderate("anything goes", Some(0.0)).status,
        ModerationStatus::Approved
    );
    assert_eq!(
        engine
            .moderate("http://a http://b http://c http://d", None)
            .status,
        ModerationStatus::Rejected
    );
}

#[test]
fn invalid_profanity_pattern_is_a_config_error() {
    let result = ModerationEngine::new(&[], &["([unclosed".to_string()], -0.5);
    assert!(result.is_err());
}

#[test]
fn batch_results_match_single_calls() {
    let engine = engine_with(&["scamcoin"], -0.5);
    let items: &[(&str, &str, Option<f64>)] = &[
        ("a", "all good here", Some(0.3)),
        ("b", "scamcoin alert", Some(0.3)),
        ("c", "really awful experience", Some(-0.8)),
    ];

    let batch = engine.moderate_batch(items);
    for ((id, text, score), (batch_id, decision)) in items.iter().zip(&batch) {
        assert_eq!(id, batch_id);
        assert_eq!(&engine.moderate(text, *score), decision);
    }
}
