// Collector abstraction — one implementation per source type.
//
// Collectors only read from external sources and yield transient item
// descriptors; they never touch the store. Partial failures inside a
// collector (one sub-query, one thread fetch) are skipped with a warning;
// only total source-level failure propagates as an error, which the
// orchestrator records on that source's run log.

pub mod channel;
pub mod client;
pub mod news;
pub mod social;
pub mod web;

use anyhow::Result;
use async_trait::async_trait;

use crate::db::models::Source;

pub use channel::ChannelCollector;
pub use client::ApiClient;
pub use news::NewsCollector;
pub use social::SocialCollector;
pub use web::WebCollector;

/// A not-yet-persisted content item as a collector sees it.
///
/// Comments carry the `source_id` of their parent so the persistence layer
/// can resolve the link even when the parent lands in the same batch.
#[derive(Debug, Clone)]
pub struct ItemDescriptor {
    pub source: Source,
    pub source_id: String,
    pub author: Option<String>,
    pub author_id: Option<String>,
    pub text: String,
    pub url: Option<String>,
    pub published_at: Option<String>,
    pub is_comment: bool,
    pub parent_source_id: Option<String>,
}

impl ItemDescriptor {
    /// A top-level (non-comment) descriptor. Comments are derived from
    /// these via `reply_to`.
    pub fn post(source: Source, source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source,
            source_id: source_id.into(),
            author: None,
            author_id: None,
            text: text.into(),
            url: None,
            published_at: None,
            is_comment: false,
            parent_source_id: None,
        }
    }

    /// Mark this descriptor as a comment on `parent_source_id`.
    pub fn reply_to(mut self, parent_source_id: impl Into<String>) -> Self {
        self.is_comment = true;
        self.parent_source_id = Some(parent_source_id.into());
        self
    }
}

/// One content source the orchestrator can poll.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Which source this collector reads from.
    fn source(&self) -> Source;

    /// Gather mentions of the monitored entity. When `include_comments` is
    /// set, also fetch replies/comment threads where the source supports
    /// them. Returns an error only for total source failure.
    async fn collect(&self, include_comments: bool) -> Result<Vec<ItemDescriptor>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_descriptor_defaults() {
        let d = ItemDescriptor::post(Source::Social, "social-1", "hello");
        assert!(!d.is_comment);
        assert!(d.parent_source_id.is_none());
        assert!(d.author.is_none());
    }

    #[test]
    fn test_reply_to_sets_threading_fields() {
        let d = ItemDescriptor::post(Source::Social, "social-2", "re: hello")
            .reply_to("social-1");
        assert!(d.is_comment);
        assert_eq!(d.parent_source_id.as_deref(), Some("social-1"));
    }
}
