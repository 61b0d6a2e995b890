// Generic web collector — polls configured JSON feed endpoints and keeps
// entries mentioning the monitored entity.
//
// Feeds are full URLs, one request each. A failed feed is skipped; the
// source only fails when every configured feed fails.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::db::models::Source;

use super::{Collector, ItemDescriptor};

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    entries: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

pub struct WebCollector {
    client: reqwest::Client,
    feeds: Vec<String>,
    query: String,
    max_items: usize,
}

impl WebCollector {
    pub fn new(feeds: Vec<String>, query: &str, max_items: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("driftnet/0.1 (mention-monitoring)")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            feeds,
            query: query.to_lowercase(),
            max_items,
        })
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<FeedEntry>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Feed request failed: {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("Feed {url} returned {}", response.status());
        }

        let feed: FeedResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to deserialize feed: {url}"))?;
        Ok(feed.entries)
    }

    fn mentions_query(&self, entry: &FeedEntry) -> bool {
        entry.title.to_lowercase().contains(&self.query)
            || entry.text.to_lowercase().contains(&self.query)
    }

    fn descriptor(&self, entry: &FeedEntry) -> ItemDescriptor {
        let text = if entry.text.is_empty() {
            entry.title.clone()
        } else if entry.title.is_empty() {
            entry.text.clone()
        } else {
            format!("{}. {}", entry.title, entry.text)
        };

        let mut d = ItemDescriptor::post(Source::Web, format!("web-{}", entry.id), text);
        d.author = entry.author.clone();
        d.url = entry.url.clone();
        d.published_at = entry.published_at.clone();
        d
    }
}

#[async_trait]
impl Collector for WebCollector {
    fn source(&self) -> Source {
        Source::Web
    }

    async fn collect(&self, _include_comments: bool) -> Result<Vec<ItemDescriptor>> {
        if self.feeds.is_empty() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        let mut failures = 0;

        for feed in &self.feeds {
            match self.fetch_feed(feed).await {
                Ok(entries) => {
                    debug!(feed = %feed, count = entries.len(), "Feed fetched");
                    items.extend(
                        entries
                            .iter()
                            .filter(|e| self.mentions_query(e))
                            .map(|e| self.descriptor(e)),
                    );
                }
                Err(e) => {
                    warn!(feed = %feed, error = %e, "Feed failed, skipping");
                    failures += 1;
                }
            }
        }

        if failures == self.feeds.len() {
            anyhow::bail!("All {} configured feeds failed", failures);
        }

        items.truncate(self.max_items);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, title: &str, text: &str) -> FeedEntry {
        FeedEntry {
            id: id.to_string(),
            title: title.to_string(),
            text: text.to_string(),
            author: None,
            url: None,
            published_at: None,
        }
    }

    #[test]
    fn test_query_match_is_case_insensitive() {
        let collector = WebCollector::new(vec![], "driftnet", 10).unwrap();
        assert!(collector.mentions_query(&entry("1", "DriftNet review", "")));
        assert!(collector.mentions_query(&entry("2", "", "tried driftnet today")));
        assert!(!collector.mentions_query(&entry("3", "unrelated", "nothing here")));
    }

    #[test]
    fn test_descriptor_text_fallbacks() {
        let collector = WebCollector::new(vec![], "driftnet", 10).unwrap();
        assert_eq!(collector.descriptor(&entry("1", "Only title", "")).text, "Only title");
        assert_eq!(collector.descriptor(&entry("2", "", "Only body")).text, "Only body");
        assert_eq!(
            collector.descriptor(&entry("3", "Title", "Body")).text,
            "Title. Body"
        );
    }

    #[tokio::test]
    async fn test_no_feeds_yields_empty() {
        let collector = WebCollector::new(vec![], "driftnet", 10).unwrap();
        let items = collector.collect(false).await.unwrap();
        assert!(items.is_empty());
    }
}
