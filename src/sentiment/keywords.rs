// Frequency-based keyword extraction.
//
// Deliberately simple: lowercase, strip to the kept alphabets, drop stop
// words and short tokens, rank by raw frequency with first-seen order
// breaking ties. The deterministic tie-break matters — downstream views
// treat the keyword list as ordered.

use std::collections::HashMap;

use stop_words::{get, LANGUAGE};

/// Which non-Latin alphabet to keep alongside Latin when tokenizing.
/// Latin (ASCII plus the Latin-1/Extended accents) is always kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraAlphabet {
    Cyrillic,
    Greek,
    None,
}

impl ExtraAlphabet {
    pub fn parse(s: &str) -> Self {
        match s {
            "cyrillic" => ExtraAlphabet::Cyrillic,
            "greek" => ExtraAlphabet::Greek,
            _ => ExtraAlphabet::None,
        }
    }

    fn contains(&self, c: char) -> bool {
        match self {
            ExtraAlphabet::Cyrillic => ('\u{0400}'..='\u{04FF}').contains(&c),
            ExtraAlphabet::Greek => ('\u{0370}'..='\u{03FF}').contains(&c),
            ExtraAlphabet::None => false,
        }
    }
}

/// Tokens shorter than this are dropped (3 characters or fewer).
const MIN_TOKEN_CHARS: usize = 4;

pub struct KeywordExtractor {
    stop_words: Vec<String>,
    top_n: usize,
    alphabet: ExtraAlphabet,
}

impl KeywordExtractor {
    /// Build an extractor keeping the top `top_n` keywords. Stop words come
    /// from the stop-words crate: English always, plus Russian when the
    /// Cyrillic alphabet is configured.
    pub fn new(top_n: usize, alphabet: ExtraAlphabet) -> Self {
        let mut stop_words: Vec<String> = get(LANGUAGE::English);
        if alphabet == ExtraAlphabet::Cyrillic {
            stop_words.extend(get(LANGUAGE::Russian));
        }

        Self {
            stop_words,
            top_n,
            alphabet,
        }
    }

    fn is_kept_char(&self, c: char) -> bool {
        c.is_ascii_alphanumeric()
            || ('\u{00C0}'..='\u{024F}').contains(&c) // Latin-1 supplement + Extended-A/B
            || self.alphabet.contains(c)
    }

    /// Extract the top-N keywords from a text, ordered by frequency with
    /// ties broken by first appearance.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();

        // Split on anything outside the kept alphabets
        let tokens = lower
            .split(|c: char| !self.is_kept_char(c))
            .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
            .filter(|t| !self.stop_words.iter().any(|s| s == t));

        // Count occurrences, remembering each token's first-seen position
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (position, token) in tokens.enumerate() {
            counts
                .entry(token)
                .and_modify(|(count, _)| *count += 1)
                .or_insert((1, position));
        }

        let mut ranked: Vec<(&str, usize, usize)> = counts
            .into_iter()
            .map(|(token, (count, first_seen))| (token, count, first_seen))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        ranked
            .into_iter()
            .take(self.top_n)
            .map(|(token, _, _)| token.to_string())
            .collect()
    }
}
