// Social network collector — Mastodon-compatible status search.
//
// Searches public statuses mentioning the monitored entity, paginating
// until the configured cap. When comments are requested, each status's
// context endpoint is fetched and its descendants become comment
// descriptors. A failed context fetch skips that thread; a failed first
// search page fails the whole source.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::db::models::Source;

use super::client::ApiClient;
use super::{Collector, ItemDescriptor};
use async_trait::async_trait;

/// Statuses requested per search page.
const PAGE_SIZE: usize = 40;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    statuses: Vec<Status>,
}

#[derive(Debug, Deserialize)]
struct ContextResponse {
    #[serde(default)]
    descendants: Vec<Status>,
}

#[derive(Debug, Deserialize)]
struct Status {
    id: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    account: Option<Account>,
    #[serde(default)]
    in_reply_to_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Account {
    id: String,
    #[serde(default)]
    acct: String,
}

pub struct SocialCollector {
    client: ApiClient,
    query: String,
    max_items: usize,
}

impl SocialCollector {
    pub fn new(api_url: &str, query: &str, max_items: usize) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(api_url)?,
            query: query.to_string(),
            max_items,
        })
    }

    fn descriptor(&self, status: &Status, parent_source_id: Option<&str>) -> ItemDescriptor {
        let mut d = ItemDescriptor::post(
            Source::Social,
            format!("social-{}", status.id),
            strip_html(&status.content),
        );
        if let Some(account) = &status.account {
            d.author = Some(account.acct.clone());
            d.author_id = Some(account.id.clone());
        }
        d.url = status.url.clone();
        d.published_at = status.created_at.clone();
        if let Some(parent) = parent_source_id {
            d = d.reply_to(parent);
        }
        d
    }

    async fn search_page(&self, max_id: Option<&str>) -> Result<Vec<Status>> {
        let limit = PAGE_SIZE.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("q", self.query.as_str()),
            ("type", "statuses"),
            ("limit", limit.as_str()),
        ];
        if let Some(id) = max_id {
            params.push(("max_id", id));
        }

        let response: SearchResponse = self
            .client
            .get_json("api/v2/search", &params)
            .await
            .context("Status search failed")?;
        Ok(response.statuses)
    }
}

#[async_trait]
impl Collector for SocialCollector {
    fn source(&self) -> Source {
        Source::Social
    }

    async fn collect(&self, include_comments: bool) -> Result<Vec<ItemDescriptor>> {
        let mut items = Vec::new();
        let mut max_id: Option<String> = None;
        let mut statuses = Vec::new();

        // First page failing means the source is unreachable. Later pages
        // failing just truncate the run.
        loop {
            let page = if max_id.is_none() {
                self.search_page(None).await?
            } else {
                match self.search_page(max_id.as_deref()).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(error = %e, "Search page failed, stopping pagination");
                        break;
                    }
                }
            };

            if page.is_empty() {
                break;
            }
            max_id = page.last().map(|s| s.id.clone());
            statuses.extend(page);
            if statuses.len() >= self.max_items {
                statuses.truncate(self.max_items);
                break;
            }
        }

        debug!(count = statuses.len(), "Statuses found");

        for status in &statuses {
            // Replies that matched the search directly still thread correctly
            let parent_id = status
                .in_reply_to_id
                .as_ref()
                .map(|id| format!("social-{id}"));
            items.push(self.descriptor(status, parent_id.as_deref()));

            if include_comments && status.in_reply_to_id.is_none() {
                let path = format!("api/v1/statuses/{}/context", status.id);
                match self.client.get_json::<ContextResponse>(&path, &[]).await {
                    Ok(ctx) => {
                        let parent = format!("social-{}", status.id);
                        for reply in &ctx.descendants {
                            items.push(self.descriptor(reply, Some(&parent)));
                        }
                    }
                    Err(e) => {
                        warn!(status_id = %status.id, error = %e, "Context fetch failed, skipping thread");
                    }
                }
            }
        }

        Ok(items)
    }
}

/// Strip HTML tags and entities from status content. Mastodon statuses are
/// HTML fragments; a tag-stripper is enough for sentiment text.
fn strip_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_tag = false;
    for c in content.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        let html = "<p>Great service from <a href=\"#\">@driftnet</a> &amp; co</p>";
        assert_eq!(strip_html(html), "Great service from @driftnet & co");
    }

    #[test]
    fn test_strip_html_plain_text_unchanged() {
        assert_eq!(strip_html("no markup here"), "no markup here");
    }

    #[test]
    fn test_descriptor_threading() {
        let collector = SocialCollector::new("https://social.example", "driftnet", 10).unwrap();
        let status = Status {
            id: "42".to_string(),
            content: "<p>reply</p>".to_string(),
            url: None,
            created_at: Some("2026-08-01T00:00:00Z".to_string()),
            account: Some(Account {
                id: "acc-1".to_string(),
                acct: "alice@social.example".to_string(),
            }),
            in_reply_to_id: None,
        };

        let top = collector.descriptor(&status, None);
        assert_eq!(top.source_id, "social-42");
        assert!(!top.is_comment);
        assert_eq!(top.author.as_deref(), Some("alice@social.example"));

        let reply = collector.descriptor(&status, Some("social-41"));
        assert!(reply.is_comment);
        assert_eq!(reply.parent_source_id.as_deref(), Some("social-41"));
    }
}
