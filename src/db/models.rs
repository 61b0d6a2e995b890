// Data models — Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use serde::{Deserialize, Serialize};

/// Where a piece of content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Social,
    Channel,
    News,
    Forum,
    Web,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Social => "social",
            Source::Channel => "channel",
            Source::News => "news",
            Source::Forum => "forum",
            Source::Web => "web",
        }
    }

    /// Parse a stored source string. Unknown values map to Web — the store
    /// must never fail a read over an unrecognized origin tag.
    pub fn parse(s: &str) -> Self {
        match s {
            "social" => Source::Social,
            "channel" => Source::Channel,
            "news" => Source::News,
            "forum" => Source::Forum,
            _ => Source::Web,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sentiment classification label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "positive" => SentimentLabel::Positive,
            "negative" => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Moderation verdict for a content item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModerationStatus {
    Approved,
    Rejected,
    #[default]
    Pending,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
            ModerationStatus::Pending => "pending",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "approved" => ModerationStatus::Approved,
            "rejected" => ModerationStatus::Rejected,
            _ => ModerationStatus::Pending,
        }
    }
}

impl std::fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of one collection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Success,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "running" => RunStatus::Running,
            "success" => RunStatus::Success,
            _ => RunStatus::Error,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted content item — post, message, article, or comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    pub source: Source,
    /// Natural key — globally unique, immutable across re-collection.
    pub source_id: String,
    pub author: Option<String>,
    pub author_id: Option<String>,
    pub text: String,
    pub url: Option<String>,
    /// Origin-reported publication timestamp (RFC 3339 where the source has one).
    pub published_at: Option<String>,
    /// Ingestion timestamp — set once at first insert, never updated.
    pub collected_at: String,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    pub keywords: Vec<String>,
    pub moderation_status: ModerationStatus,
    pub moderation_reason: Option<String>,
    pub requires_manual_review: bool,
    pub processed: bool,
    pub processed_at: Option<String>,
    /// Row id of the parent item for comments; NULL when the parent was
    /// unknown at insert time.
    pub parent_id: Option<i64>,
    /// The parent's natural key, kept so orphaned comments can be linked
    /// once their parent shows up in a later run.
    pub parent_source_id: Option<String>,
    pub is_comment: bool,
}

/// Classification and moderation results attached to an item.
#[derive(Debug, Clone, Default)]
pub struct ItemAnalysis {
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    pub keywords: Vec<String>,
    pub moderation_status: ModerationStatus,
    pub moderation_reason: Option<String>,
    pub requires_manual_review: bool,
}

/// A content item about to be inserted — identity fields plus analysis,
/// without the store-assigned id and timestamps.
#[derive(Debug, Clone)]
pub struct NewContentItem {
    pub source: Source,
    pub source_id: String,
    pub author: Option<String>,
    pub author_id: Option<String>,
    pub text: String,
    pub url: Option<String>,
    pub published_at: Option<String>,
    pub parent_id: Option<i64>,
    pub parent_source_id: Option<String>,
    pub is_comment: bool,
    pub analysis: ItemAnalysis,
}

/// One record per (source, collection attempt).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub id: i64,
    pub source: Source,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub status: RunStatus,
    /// Newly inserted items only — duplicates skipped by the upsert
    /// are not counted.
    pub items_collected: i64,
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_roundtrip() {
        for source in [
            Source::Social,
            Source::Channel,
            Source::News,
            Source::Forum,
            Source::Web,
        ] {
            assert_eq!(Source::parse(source.as_str()), source);
        }
    }

    #[test]
    fn test_unknown_source_maps_to_web() {
        assert_eq!(Source::parse("telegraph"), Source::Web);
    }

    #[test]
    fn test_unknown_label_maps_to_neutral() {
        assert_eq!(SentimentLabel::parse("ecstatic"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_unknown_moderation_maps_to_pending() {
        assert_eq!(ModerationStatus::parse("held"), ModerationStatus::Pending);
    }
}
