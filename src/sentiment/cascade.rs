// Sentiment cascade — ordered backend probe with graceful fallback.
//
// Backends are probed once, at startup, in priority order; the first one
// that initializes successfully is kept for the lifetime of the process.
// The lexicon backend closes the cascade: it has no preconditions and
// always succeeds, so selection is total.
//
// classify() and classify_batch() never raise past this component —
// empty text and backend failures degrade to the neutral result.

use std::path::Path;

use tracing::{info, warn};

use super::compound::CompoundBackend;
use super::lexicon::LexiconBackend;
use super::onnx::OnnxSentimentBackend;
use super::traits::{Sentiment, SentimentBackend};

/// The backends the cascade knows how to build, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Pretrained 3-class model via ONNX — needs downloaded model files.
    Onnx,
    /// Local valence analyzer — no files, always available.
    Compound,
    /// Word-hit lexicon — the mandatory floor.
    Lexicon,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Onnx => "onnx",
            BackendKind::Compound => "compound",
            BackendKind::Lexicon => "lexicon",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "onnx" => Some(BackendKind::Onnx),
            "compound" => Some(BackendKind::Compound),
            "lexicon" => Some(BackendKind::Lexicon),
            _ => None,
        }
    }
}

/// Default probe order, strongest backend first.
pub const DEFAULT_PROBE_ORDER: [BackendKind; 3] =
    [BackendKind::Onnx, BackendKind::Compound, BackendKind::Lexicon];

/// The selected backend plus the probe metadata. Built once at startup;
/// the selection is cached and never re-probed per call.
pub struct SentimentCascade {
    backend: Box<dyn SentimentBackend>,
    active: BackendKind,
}

impl SentimentCascade {
    /// Probe the default order. `model_dir` and `label_threshold` feed the
    /// ONNX backend; the others need nothing.
    pub fn probe(model_dir: &Path, label_threshold: f64) -> Self {
        Self::probe_order(&DEFAULT_PROBE_ORDER, model_dir, label_threshold)
    }

    /// Probe an explicit order. If every entry fails to initialize (or the
    /// order is empty), the lexicon backend is used — it cannot fail.
    pub fn probe_order(order: &[BackendKind], model_dir: &Path, label_threshold: f64) -> Self {
        for &kind in order {
            match Self::build(kind, model_dir, label_threshold) {
                Ok(backend) => {
                    info!(backend = kind.as_str(), "Sentiment backend selected");
                    return Self {
                        backend,
                        active: kind,
                    };
                }
                Err(e) => {
                    warn!(
                        backend = kind.as_str(),
                        error = %e,
                        "Sentiment backend unavailable, trying next"
                    );
                }
            }
        }

        info!(backend = "lexicon", "Sentiment backend selected (fallback)");
        Self {
            backend: Box::new(LexiconBackend::new()),
            active: BackendKind::Lexicon,
        }
    }

    /// Wrap a specific backend directly (used by tests and the `classify`
    /// debug command with an explicit override).
    pub fn with_backend(backend: Box<dyn SentimentBackend>, kind: BackendKind) -> Self {
        Self {
            backend,
            active: kind,
        }
    }

    fn build(
        kind: BackendKind,
        model_dir: &Path,
        label_threshold: f64,
    ) -> anyhow::Result<Box<dyn SentimentBackend>> {
        match kind {
            BackendKind::Onnx => Ok(Box::new(OnnxSentimentBackend::load(
                model_dir,
                label_threshold,
            )?)),
            BackendKind::Compound => Ok(Box::new(CompoundBackend::new())),
            BackendKind::Lexicon => Ok(Box::new(LexiconBackend::new())),
        }
    }

    /// Which backend the startup probe selected.
    pub fn active_backend(&self) -> BackendKind {
        self.active
    }

    /// Classify a single text. Never fails: empty or whitespace-only text
    /// and any backend error degrade to the neutral result.
    pub async fn classify(&self, text: &str) -> Sentiment {
        if text.trim().is_empty() {
            return Sentiment::neutral();
        }

        match self.backend.classify(text).await {
            Ok(sentiment) => sentiment,
            Err(e) => {
                warn!(
                    backend = self.active.as_str(),
                    error = %e,
                    "Classification failed, substituting neutral"
                );
                Sentiment::neutral()
            }
        }
    }

    /// Classify a batch. A whole-batch failure falls back to per-item
    /// classification so one bad item yields one neutral result instead of
    /// failing its siblings.
    pub async fn classify_batch(&self, texts: &[String]) -> Vec<Sentiment> {
        if texts.is_empty() {
            return Vec::new();
        }

        // Empty texts never reach the backend
        if texts.iter().all(|t| t.trim().is_empty()) {
            return texts.iter().map(|_| Sentiment::neutral()).collect();
        }

        match self.backend.classify_batch(texts).await {
            Ok(mut results) => {
                // Enforce the empty-text contract regardless of backend
                for (text, result) in texts.iter().zip(results.iter_mut()) {
                    if text.trim().is_empty() {
                        *result = Sentiment::neutral();
                    }
                }
                results
            }
            Err(e) => {
                warn!(
                    backend = self.active.as_str(),
                    error = %e,
                    "Batch classification failed, retrying per item"
                );
                let mut results = Vec::with_capacity(texts.len());
                for text in texts {
                    results.push(self.classify(text).await);
                }
                results
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::SentimentLabel;
    use anyhow::Result;
    use async_trait::async_trait;

    /// A backend that always errors, for exercising the fallback paths.
    struct FailingBackend;

    #[async_trait]
    impl SentimentBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn classify(&self, _text: &str) -> Result<Sentiment> {
            anyhow::bail!("backend exploded")
        }
    }

    fn missing_model_dir() -> std::path::PathBuf {
        std::env::temp_dir().join("driftnet-cascade-test-no-models")
    }

    #[test]
    fn test_probe_skips_unavailable_onnx() {
        // No model files on disk → ONNX probe fails → compound selected
        let cascade = SentimentCascade::probe(&missing_model_dir(), 0.3);
        assert_eq!(cascade.active_backend(), BackendKind::Compound);
    }

    #[test]
    fn test_probe_order_is_deterministic() {
        let order = [BackendKind::Onnx, BackendKind::Lexicon];
        let cascade = SentimentCascade::probe_order(&order, &missing_model_dir(), 0.3);
        assert_eq!(cascade.active_backend(), BackendKind::Lexicon);
    }

    #[test]
    fn test_empty_probe_order_falls_back_to_lexicon() {
        let cascade = SentimentCascade::probe_order(&[], &missing_model_dir(), 0.3);
        assert_eq!(cascade.active_backend(), BackendKind::Lexicon);
    }

    #[tokio::test]
    async fn test_empty_text_is_neutral_regardless_of_backend() {
        for order in [
            &[BackendKind::Compound][..],
            &[BackendKind::Lexicon][..],
        ] {
            let cascade = SentimentCascade::probe_order(order, &missing_model_dir(), 0.3);
            let result = cascade.classify("").await;
            assert_eq!(result, Sentiment::neutral());
        }
    }

    #[tokio::test]
    async fn test_backend_error_degrades_to_neutral() {
        let cascade =
            SentimentCascade::with_backend(Box::new(FailingBackend), BackendKind::Lexicon);
        let result = cascade.classify("anything at all").await;
        assert_eq!(result, Sentiment::neutral());
    }

    #[tokio::test]
    async fn test_batch_error_yields_neutral_per_item() {
        let cascade =
            SentimentCascade::with_backend(Box::new(FailingBackend), BackendKind::Lexicon);
        let texts = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let results = cascade.classify_batch(&texts).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| *r == Sentiment::neutral()));
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_empty_contract() {
        let cascade = SentimentCascade::probe_order(
            &[BackendKind::Lexicon],
            &missing_model_dir(),
            0.3,
        );
        let texts = vec![
            "great service".to_string(),
            "".to_string(),
            "terrible scam".to_string(),
        ];
        let results = cascade.classify_batch(&texts).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].label, SentimentLabel::Positive);
        assert_eq!(results[1], Sentiment::neutral());
        assert_eq!(results[2].label, SentimentLabel::Negative);
    }
}
