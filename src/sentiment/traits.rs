// Sentiment backend trait — the swap-ready abstraction.
//
// Every backend, from the heavyweight ONNX model down to the word-hit
// lexicon, normalizes to the same output contract: a score in [-1, 1],
// a three-way label, and a confidence in [0, 1].

use anyhow::Result;
use async_trait::async_trait;

pub use crate::db::models::SentimentLabel;

/// Labels flip away from neutral only when the compound score strictly
/// exceeds this magnitude.
pub const COMPOUND_LABEL_THRESHOLD: f64 = 0.05;

/// Normalized classification result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentiment {
    /// Polarity from -1.0 (negative) to 1.0 (positive).
    pub score: f64,
    pub label: SentimentLabel,
    /// How sure the backend is, 0.0 to 1.0.
    pub confidence: f64,
}

impl Sentiment {
    /// The universal fallback: zero score, neutral label, zero confidence.
    /// Returned for empty text and whenever classification fails.
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            confidence: 0.0,
        }
    }

    /// Build a result from a single compound score in [-1, 1].
    ///
    /// Label thresholds are symmetric around zero and exclusive: a score of
    /// exactly ±0.05 is still neutral. Confidence is |score|.
    pub fn from_compound(score: f64) -> Self {
        let label = if score > COMPOUND_LABEL_THRESHOLD {
            SentimentLabel::Positive
        } else if score < -COMPOUND_LABEL_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };
        Self {
            score,
            label,
            confidence: score.abs(),
        }
    }
}

/// Trait for sentiment classification backends. Implementations are async
/// because the heavyweight backend offloads inference to a blocking thread.
#[async_trait]
pub trait SentimentBackend: Send + Sync {
    /// Short name for logging and the status display.
    fn name(&self) -> &'static str;

    /// Classify a single text.
    async fn classify(&self, text: &str) -> Result<Sentiment>;

    /// Classify multiple texts, returning results in the same order.
    /// Default implementation calls classify sequentially — backends
    /// can override for true batch inference.
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Sentiment>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.classify(text).await?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_is_all_zero() {
        let s = Sentiment::neutral();
        assert_eq!(s.score, 0.0);
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn test_compound_threshold_is_exclusive() {
        // Exactly at the threshold stays neutral; label flips only strictly beyond
        assert_eq!(Sentiment::from_compound(0.05).label, SentimentLabel::Neutral);
        assert_eq!(Sentiment::from_compound(-0.05).label, SentimentLabel::Neutral);
        assert_eq!(Sentiment::from_compound(0.051).label, SentimentLabel::Positive);
        assert_eq!(Sentiment::from_compound(-0.051).label, SentimentLabel::Negative);
    }

    #[test]
    fn test_compound_confidence_is_magnitude() {
        assert!((Sentiment::from_compound(-0.4).confidence - 0.4).abs() < f64::EPSILON);
    }
}
