// Compound valence backend — middle rung of the cascade.
//
// A weighted-lexicon analyzer in the VADER family: each sentiment-bearing
// word carries a valence, preceding negators flip and damp it, preceding
// boosters amplify it, and the summed valence is squashed into [-1, 1].
// Runs locally with no model files, so it probes available whenever the
// heavyweight backend is not.
//
// The valence table is business tuning, not a correctness contract.

use anyhow::Result;
use async_trait::async_trait;

use super::traits::{Sentiment, SentimentBackend};

/// Word valences. Magnitudes are relative weights, not probabilities.
const VALENCES: &[(&str, f64)] = &[
    // Positive
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 3.2),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("love", 3.2),
    ("loved", 2.9),
    ("like", 1.5),
    ("best", 3.2),
    ("happy", 2.7),
    ("glad", 2.0),
    ("recommend", 2.2),
    ("helpful", 1.9),
    ("reliable", 1.8),
    ("perfect", 3.0),
    ("impressive", 2.3),
    ("works", 1.2),
    ("win", 2.4),
    ("improved", 1.8),
    ("thanks", 1.7),
    // Negative
    ("bad", -2.5),
    ("terrible", -3.1),
    ("awful", -3.0),
    ("worst", -3.1),
    ("hate", -2.7),
    ("broken", -2.2),
    ("scam", -3.2),
    ("fraud", -3.2),
    ("slow", -1.4),
    ("useless", -2.5),
    ("disappointed", -2.2),
    ("disappointing", -2.2),
    ("problem", -1.6),
    ("fail", -2.3),
    ("failed", -2.3),
    ("failure", -2.4),
    ("angry", -2.5),
    ("complaint", -1.8),
    ("lies", -2.1),
    ("crash", -2.0),
];

/// Words that flip the following sentiment word.
const NEGATORS: &[&str] = &[
    "not", "no", "never", "neither", "nobody", "nothing", "hardly",
    "barely", "isnt", "isn't", "wasnt", "wasn't", "dont", "don't",
    "doesnt", "doesn't", "didnt", "didn't", "cant", "can't", "wont",
    "won't",
];

/// Intensity amplifiers.
const BOOSTERS: &[&str] = &[
    "very", "really", "extremely", "absolutely", "completely", "totally",
    "incredibly", "so", "super",
];

/// How far back we look for negators and boosters.
const CONTEXT_WINDOW: usize = 2;

/// Negation flips sign and damps magnitude.
const NEGATION_FACTOR: f64 = -0.74;

/// Boosters scale magnitude up.
const BOOSTER_FACTOR: f64 = 1.3;

/// Normalization constant for squashing the valence sum into [-1, 1].
const NORMALIZATION_ALPHA: f64 = 15.0;

pub struct CompoundBackend;

impl CompoundBackend {
    pub fn new() -> Self {
        Self
    }

    fn score_text(text: &str) -> Sentiment {
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        if tokens.is_empty() {
            return Sentiment::neutral();
        }

        let mut sum = 0.0;
        for (i, token) in tokens.iter().enumerate() {
            let Some(&(_, base)) = VALENCES.iter().find(|(w, _)| w == token) else {
                continue;
            };

            let mut valence = base;
            let window_start = i.saturating_sub(CONTEXT_WINDOW);
            for prior in &tokens[window_start..i] {
                if NEGATORS.contains(&prior.as_str()) {
                    valence *= NEGATION_FACTOR;
                } else if BOOSTERS.contains(&prior.as_str()) {
                    valence *= BOOSTER_FACTOR;
                }
            }
            sum += valence;
        }

        // Squash into [-1, 1]; the clamp guards float edge cases only.
        let score = (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0);
        Sentiment::from_compound(score)
    }
}

impl Default for CompoundBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentBackend for CompoundBackend {
    fn name(&self) -> &'static str {
        "compound"
    }

    async fn classify(&self, text: &str) -> Result<Sentiment> {
        Ok(Self::score_text(text))
    }
}
