// Moderation engine — pure rule-based decisions over text and sentiment.
//
// moderate() is a deterministic function of its inputs plus static
// configuration (blocklist, profanity patterns, thresholds). Checks run in
// a fixed order and the first match wins:
//   1. blocklist          -> rejected
//   2. profanity regex    -> rejected
//   3. spam heuristics    -> rejected
//   4. negative sentiment -> pending, manual review
//   5. promo + link       -> pending, manual review
//   6. otherwise          -> approved
//
// Nothing here can fail for well-formed inputs, so the pipeline calls it
// without error handling.

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex_lite::Regex;

use crate::db::models::ModerationStatus;

/// Default profanity patterns, compiled case-insensitively. Sites can
/// extend or replace these via configuration.
pub const DEFAULT_PROFANITY_PATTERNS: &[&str] = &[
    r"\bf+u+c+k+\w*",
    r"\bs+h+i+t+\w*",
    r"\ba+s+s+h+o+l+e+\w*",
    r"\bb+i+t+c+h+\w*",
];

/// Phrases that mark likely promotional content when a link is present.
const SUSPICIOUS_PHRASES: &[&str] = &[
    "loan", "credit", "promo code", "promocode", "discount", "click here",
    "free money", "earn money", "limited offer", "casino", "bonus",
    "кредит", "займ", "скидка", "промокод",
];

/// Spam heuristic constants.
const MAX_URLS: usize = 3;
const MAX_TOKEN_CHARS: usize = 50;
const MAX_CAPS_RUN: usize = 10;
const MAX_PUNCT_BURSTS: usize = 3;
const MAX_TEXT_CHARS: usize = 3000;
const DIVERSITY_MIN_CHARS: usize = 100;
const DIVERSITY_MIN_UNIQUE: usize = 10;

/// The outcome of moderating one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub status: ModerationStatus,
    pub reason: Option<String>,
    pub requires_manual_review: bool,
}

impl Decision {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            status: ModerationStatus::Rejected,
            reason: Some(reason.into()),
            requires_manual_review: false,
        }
    }

    fn pending(reason: impl Into<String>) -> Self {
        Self {
            status: ModerationStatus::Pending,
            reason: Some(reason.into()),
            requires_manual_review: true,
        }
    }

    fn approved() -> Self {
        Self {
            status: ModerationStatus::Approved,
            reason: None,
            requires_manual_review: false,
        }
    }
}

pub struct ModerationEngine {
    /// Lowercased blocklist terms, matched as case-insensitive substrings.
    blocklist: Vec<String>,
    profanity: Vec<Regex>,
    punct_burst: Regex,
    /// Sentiment at or below this triggers manual review (default -0.5).
    negative_threshold: f64,
}

impl ModerationEngine {
    pub fn new(
        blocklist: &[String],
        profanity_patterns: &[String],
        negative_threshold: f64,
    ) -> Result<Self> {
        let profanity = profanity_patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("(?i){p}"))
                    .with_context(|| format!("Invalid profanity pattern: {p}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            blocklist: blocklist.iter().map(|w| w.to_lowercase()).collect(),
            profanity,
            // Three or more of ! ? . in a row — "!!!" or "..." bursts
            punct_burst: Regex::new(r"[!?.]{3,}").expect("static pattern"),
            negative_threshold,
        })
    }

    /// Moderate a single text. Pure: same inputs, same decision.
    pub fn moderate(&self, text: &str, sentiment_score: Option<f64>) -> Decision {
        let lower = text.to_lowercase();

        // 1. Blocklist
        if let Some(word) = self.blocklist.iter().find(|w| lower.contains(w.as_str())) {
            return Decision::rejected(format!("blocklisted term: {word}"));
        }

        // 2. Profanity
        if self.profanity.iter().any(|re| re.is_match(text)) {
            return Decision::rejected("profanity");
        }

        // 3. Spam heuristics
        if let Some(reason) = self.spam_reason(text) {
            return Decision::rejected(reason);
        }

        // 4. Strongly negative sentiment goes to a human
        if let Some(score) = sentiment_score {
            if score < self.negative_threshold {
                return Decision::pending(format!(
                    "negative sentiment ({score:.2} below {:.2})",
                    self.negative_threshold
                ));
            }
        }

        // 5. Promotional phrasing plus a link goes to a human
        if count_urls(&lower) >= 1 {
            if let Some(phrase) = SUSPICIOUS_PHRASES.iter().find(|p| lower.contains(*p)) {
                return Decision::pending(format!("promotional content with link: {phrase}"));
            }
        }

        Decision::approved()
    }

    /// Moderate a batch, echoing each item's identity for correlation.
    /// No mutable state is shared between items — this is a plain map.
    pub fn moderate_batch(
        &self,
        items: &[(&str, &str, Option<f64>)],
    ) -> Vec<(String, Decision)> {
        items
            .iter()
            .map(|(id, text, score)| (id.to_string(), self.moderate(text, *score)))
            .collect()
    }

    fn spam_reason(&self, text: &str) -> Option<&'static str> {
        if count_urls(&text.to_lowercase()) >= MAX_URLS {
            return Some("spam: excessive links");
        }
        if text
            .split_whitespace()
            .any(|t| t.chars().count() >= MAX_TOKEN_CHARS)
        {
            return Some("spam: unbroken character run");
        }
        if longest_caps_run(text) >= MAX_CAPS_RUN {
            return Some("spam: shouting");
        }
        if self.punct_burst.find_iter(text).count() >= MAX_PUNCT_BURSTS {
            return Some("spam: repeated punctuation");
        }
        let char_count = text.chars().count();
        if char_count > MAX_TEXT_CHARS {
            return Some("spam: excessive length");
        }
        if char_count > DIVERSITY_MIN_CHARS {
            let unique: HashSet<char> = text.chars().collect();
            if unique.len() < DIVERSITY_MIN_UNIQUE {
                return Some("spam: low character diversity");
            }
        }
        None
    }
}

/// Count URL occurrences. Substring counting is deliberate — malformed
/// spam links still count.
fn count_urls(lower_text: &str) -> usize {
    lower_text.matches("http://").count() + lower_text.matches("https://").count()
}

/// Length of the longest run of consecutive uppercase letters.
fn longest_caps_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c.is_uppercase() {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
