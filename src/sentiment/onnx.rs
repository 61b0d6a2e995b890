// Local ONNX sentiment backend using a 3-class social-media RoBERTa model.
//
// This backend runs entirely on the local CPU — no API calls, no rate
// limits, no network dependency at classification time. The model outputs
// negative/neutral/positive logits; softmax turns them into the three-way
// probability signal the cascade contract expects.
//
// Model: Xenova/twitter-roberta-base-sentiment-latest (quantized, ~125MB)

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::traits::{Sentiment, SentimentBackend, SentimentLabel};

/// Model output order: index 0 = negative, 1 = neutral, 2 = positive.
const NUM_CLASSES: usize = 3;

/// Local ONNX-based sentiment backend. Holds the model session and tokenizer
/// behind Arc<Mutex> so inference can be offloaded to spawn_blocking without
/// blocking the async runtime.
pub struct OnnxSentimentBackend {
    // Arc+Mutex because:
    // 1. ort::Session::run takes &mut self, so we need interior mutability
    // 2. spawn_blocking requires 'static, so we need Arc for shared ownership
    // 3. We need Send+Sync for the SentimentBackend trait
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    /// A non-neutral label is only chosen when its probability mass
    /// strictly exceeds this threshold (default 0.3 from config).
    label_threshold: f64,
}

impl OnnxSentimentBackend {
    /// Load the ONNX model and tokenizer from the given directory.
    ///
    /// Expects `model_quantized.onnx` and `tokenizer.json` to exist in
    /// `model_dir`. Call `download::download_model()` first if they don't.
    pub fn load(model_dir: &Path, label_threshold: f64) -> Result<Self> {
        let model_path = model_dir.join("model_quantized.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            anyhow::bail!(
                "Model file not found: {}\nRun `driftnet download-model` to download it.",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Tokenizer file not found: {}\nRun `driftnet download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        debug!("Loaded ONNX sentiment model from {}", model_dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            label_threshold,
        })
    }
}

#[async_trait]
impl SentimentBackend for OnnxSentimentBackend {
    fn name(&self) -> &'static str {
        "onnx"
    }

    async fn classify(&self, text: &str) -> Result<Sentiment> {
        let mut results = self.classify_batch(&[text.to_string()]).await?;
        Ok(results.remove(0))
    }

    /// True batch inference: tokenize all texts, run one forward pass, apply
    /// softmax to the 3-class logits, and map to the normalized contract.
    ///
    /// The CPU-bound tokenization and inference are offloaded to
    /// spawn_blocking so they don't block the tokio async runtime.
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Sentiment>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Clone Arc handles for the spawn_blocking closure ('static requirement)
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let texts = texts.to_vec();
        let label_threshold = self.label_threshold;

        tokio::task::spawn_blocking(move || {
            let encodings: Vec<_> = texts
                .iter()
                .map(|t| {
                    tokenizer
                        .encode(t.as_str(), true)
                        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
                })
                .collect::<Result<Vec<_>>>()?;

            let batch_size = encodings.len();
            let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

            // Build flat input tensors with right-padding to max_len.
            // Shape: [batch_size, max_len]
            let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
            let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

            for enc in &encodings {
                let ids = enc.get_ids();
                let mask = enc.get_attention_mask();
                let seq_len = ids.len();

                for &id in ids {
                    input_ids_flat.push(id as i64);
                }
                for &m in mask {
                    attention_mask_flat.push(m as i64);
                }

                // Pad to max_len (pad_id = 1 for RoBERTa)
                for _ in seq_len..max_len {
                    input_ids_flat.push(1);
                    attention_mask_flat.push(0);
                }
            }

            let shape = [batch_size as i64, max_len as i64];

            let input_ids_tensor = Tensor::from_array((shape, input_ids_flat))
                .context("Failed to create input_ids tensor")?;
            let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat))
                .context("Failed to create attention_mask tensor")?;

            let logits_data = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids_tensor,
                        "attention_mask" => attention_mask_tensor
                    })
                    .context("ONNX inference failed")?;

                // Output shape: [batch_size, 3] — raw logits (pre-softmax)
                let (_out_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;

                data.to_vec()
            };

            let mut results = Vec::with_capacity(batch_size);
            for (i, text) in texts.iter().enumerate() {
                let offset = i * NUM_CLASSES;
                let row = &logits_data[offset..offset + NUM_CLASSES];
                let probs = softmax(row);

                let result = probabilities_to_sentiment(&probs, label_threshold);

                debug!(
                    score = result.score,
                    label = %result.label,
                    confidence = result.confidence,
                    text_preview = %crate::output::truncate_chars(text, 50),
                    "ONNX classified text"
                );

                results.push(result);
            }

            Ok(results)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// Numerically stable softmax over a logit row.
fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Map [negative, neutral, positive] probabilities to the normalized contract.
///
/// score = positive - negative. The label is the argmax, but a non-neutral
/// label is only chosen when its mass strictly exceeds the threshold —
/// otherwise the label falls back to neutral. Confidence is the winning mass.
fn probabilities_to_sentiment(probs: &[f64], label_threshold: f64) -> Sentiment {
    let (negative, neutral, positive) = (probs[0], probs[1], probs[2]);
    let score = positive - negative;

    let label = if positive >= neutral && positive >= negative && positive > label_threshold {
        SentimentLabel::Positive
    } else if negative >= neutral && negative >= positive && negative > label_threshold {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };

    let confidence = match label {
        SentimentLabel::Positive => positive,
        SentimentLabel::Negative => negative,
        SentimentLabel::Neutral => neutral,
    };

    Sentiment {
        score,
        label,
        confidence,
    }
}
