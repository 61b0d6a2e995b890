// Sentiment classification — cascade of interchangeable backends.
//
// The SentimentBackend trait defines the interface. The cascade probes the
// ONNX model first, then the compound valence analyzer, then the word-hit
// lexicon, keeping the first backend that initializes. Keyword extraction
// lives here too since it shares the text-analysis concern.

pub mod cascade;
pub mod compound;
pub mod download;
pub mod keywords;
pub mod lexicon;
pub mod onnx;
pub mod traits;

pub use cascade::{BackendKind, SentimentCascade};
pub use keywords::{ExtraAlphabet, KeywordExtractor};
pub use traits::{Sentiment, SentimentBackend};
