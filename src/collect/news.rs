// News collector — article search plus optional per-article comments.
//
// Articles come from a search endpoint; the article body summary is the
// classified text. Comment fetches fail per-article, not per-source.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::db::models::Source;

use super::client::ApiClient;
use super::{Collector, ItemDescriptor};

#[derive(Debug, Deserialize)]
struct ArticleSearchResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    outlet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentsResponse {
    #[serde(default)]
    comments: Vec<ArticleComment>,
}

#[derive(Debug, Deserialize)]
struct ArticleComment {
    id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    posted_at: Option<String>,
}

pub struct NewsCollector {
    client: ApiClient,
    query: String,
    max_items: usize,
}

impl NewsCollector {
    pub fn new(api_url: &str, query: &str, max_items: usize) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(api_url)?,
            query: query.to_string(),
            max_items,
        })
    }

    fn article_descriptor(&self, article: &Article) -> ItemDescriptor {
        // Title plus summary gives the classifier enough signal even for
        // teaser-only feeds.
        let text = if article.summary.is_empty() {
            article.title.clone()
        } else {
            format!("{}. {}", article.title, article.summary)
        };

        let mut d = ItemDescriptor::post(Source::News, format!("news-{}", article.id), text);
        d.author = article.outlet.clone();
        d.url = article.url.clone();
        d.published_at = article.published_at.clone();
        d
    }

    fn comment_descriptor(&self, article_id: &str, comment: &ArticleComment) -> ItemDescriptor {
        let mut d = ItemDescriptor::post(
            Source::News,
            format!("news-{}-c{}", article_id, comment.id),
            comment.text.clone(),
        )
        .reply_to(format!("news-{article_id}"));
        d.author = comment.author.clone();
        d.published_at = comment.posted_at.clone();
        d
    }
}

#[async_trait]
impl Collector for NewsCollector {
    fn source(&self) -> Source {
        Source::News
    }

    async fn collect(&self, include_comments: bool) -> Result<Vec<ItemDescriptor>> {
        let limit = self.max_items.to_string();
        let response: ArticleSearchResponse = self
            .client
            .get_json(
                "articles/search",
                &[("q", self.query.as_str()), ("limit", limit.as_str())],
            )
            .await
            .context("Article search failed")?;

        debug!(count = response.articles.len(), "Articles found");

        let mut items = Vec::new();
        for article in response.articles.iter().take(self.max_items) {
            items.push(self.article_descriptor(article));

            if include_comments {
                let path = format!("articles/{}/comments", article.id);
                match self.client.get_json::<CommentsResponse>(&path, &[]).await {
                    Ok(thread) => {
                        for comment in &thread.comments {
                            items.push(self.comment_descriptor(&article.id, comment));
                        }
                    }
                    Err(e) => {
                        warn!(
                            article_id = %article.id,
                            error = %e,
                            "Comment fetch failed, skipping article comments"
                        );
                    }
                }
            }
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_text_combines_title_and_summary() {
        let collector = NewsCollector::new("https://news.example", "driftnet", 10).unwrap();
        let article = Article {
            id: "a1".to_string(),
            title: "Driftnet expands".to_string(),
            summary: "The service added two regions.".to_string(),
            url: None,
            published_at: None,
            outlet: Some("Example Daily".to_string()),
        };
        let d = collector.article_descriptor(&article);
        assert_eq!(d.text, "Driftnet expands. The service added two regions.");
        assert_eq!(d.source_id, "news-a1");
        assert_eq!(d.author.as_deref(), Some("Example Daily"));
    }

    #[test]
    fn test_comment_links_to_article() {
        let collector = NewsCollector::new("https://news.example", "driftnet", 10).unwrap();
        let comment = ArticleComment {
            id: "9".to_string(),
            text: "about time".to_string(),
            author: None,
            posted_at: None,
        };
        let d = collector.comment_descriptor("a1", &comment);
        assert_eq!(d.source_id, "news-a1-c9");
        assert!(d.is_comment);
        assert_eq!(d.parent_source_id.as_deref(), Some("news-a1"));
    }
}
