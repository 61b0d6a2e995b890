// Word-hit lexicon backend — the mandatory floor of the cascade.
//
// No model files, no network, no tokenizer: count positive and negative
// word hits and divide by the word count. This backend always initializes
// and never fails, which is what makes the cascade total.
//
// The word lists are business tuning for the monitored market, not a
// correctness contract — adjust them freely.

use anyhow::Result;
use async_trait::async_trait;

use super::traits::{Sentiment, SentimentBackend};

/// Positive signal words, lowercase. English plus the Russian terms that
/// show up in the monitored channels.
const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "love", "loved", "best", "amazing",
    "awesome", "recommend", "happy", "glad", "thanks", "thank", "helpful",
    "fast", "reliable", "quality", "perfect", "impressed", "wonderful",
    "отлично", "хорошо", "супер", "нравится", "спасибо", "рекомендую",
    "быстро", "удобно", "классно", "лучший",
];

/// Negative signal words, lowercase.
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "worst", "hate", "hated", "broken",
    "scam", "fraud", "slow", "useless", "disappointed", "disappointing",
    "refund", "complaint", "problem", "problems", "fail", "failed", "failure",
    "плохо", "ужасно", "обман", "мошенники", "отвратительно", "жалоба",
    "проблема", "сломалось", "хуже", "кошмар",
];

/// Lexicon-based sentiment backend.
///
/// score = (positive hits - negative hits) / word count, labels at the
/// shared ±0.05 thresholds, confidence = min(|score| * 10, 1).
pub struct LexiconBackend;

impl LexiconBackend {
    pub fn new() -> Self {
        Self
    }

    fn score_text(text: &str) -> Sentiment {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Sentiment::neutral();
        }

        let mut positive_hits = 0i64;
        let mut negative_hits = 0i64;
        for word in &words {
            if POSITIVE_WORDS.contains(&word.as_str()) {
                positive_hits += 1;
            } else if NEGATIVE_WORDS.contains(&word.as_str()) {
                negative_hits += 1;
            }
        }

        let score = (positive_hits - negative_hits) as f64 / words.len() as f64;
        let mut result = Sentiment::from_compound(score);
        result.confidence = (score.abs() * 10.0).min(1.0);
        result
    }
}

impl Default for LexiconBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentBackend for LexiconBackend {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    async fn classify(&self, text: &str) -> Result<Sentiment> {
        Ok(Self::score_text(text))
    }
}
