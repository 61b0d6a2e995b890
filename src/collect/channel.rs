// Channel message collector — polls a single configured channel for
// messages mentioning the monitored entity, with optional thread replies.
//
// The API shape follows the common channel-export convention: a messages
// listing endpoint plus a per-message replies endpoint. Reply fetch
// failures skip that thread only.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::db::models::Source;

use super::client::ApiClient;
use super::{Collector, ItemDescriptor};

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct RepliesResponse {
    #[serde(default)]
    replies: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    author_id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    posted_at: Option<String>,
    #[serde(default)]
    reply_count: usize,
}

pub struct ChannelCollector {
    client: ApiClient,
    channel: String,
    query: String,
    max_items: usize,
}

impl ChannelCollector {
    pub fn new(api_url: &str, channel: &str, query: &str, max_items: usize) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(api_url)?,
            channel: channel.to_string(),
            query: query.to_string(),
            max_items,
        })
    }

    fn descriptor(&self, message: &Message, parent_source_id: Option<&str>) -> ItemDescriptor {
        let mut d = ItemDescriptor::post(
            Source::Channel,
            format!("channel-{}-{}", self.channel, message.id),
            message.text.clone(),
        );
        d.author = message.author.clone();
        d.author_id = message.author_id.clone();
        d.url = message.url.clone();
        d.published_at = message.posted_at.clone();
        if let Some(parent) = parent_source_id {
            d = d.reply_to(parent);
        }
        d
    }
}

#[async_trait]
impl Collector for ChannelCollector {
    fn source(&self) -> Source {
        Source::Channel
    }

    async fn collect(&self, include_comments: bool) -> Result<Vec<ItemDescriptor>> {
        let limit = self.max_items.to_string();
        let path = format!("channels/{}/messages", self.channel);
        let response: MessagesResponse = self
            .client
            .get_json(&path, &[("q", self.query.as_str()), ("limit", limit.as_str())])
            .await
            .with_context(|| format!("Failed to fetch messages for channel {}", self.channel))?;

        debug!(
            channel = %self.channel,
            count = response.messages.len(),
            "Channel messages found"
        );

        let mut items = Vec::new();
        for message in response.messages.iter().take(self.max_items) {
            items.push(self.descriptor(message, None));

            if include_comments && message.reply_count > 0 {
                let path = format!("channels/{}/messages/{}/replies", self.channel, message.id);
                match self.client.get_json::<RepliesResponse>(&path, &[]).await {
                    Ok(thread) => {
                        let parent = format!("channel-{}-{}", self.channel, message.id);
                        for reply in &thread.replies {
                            items.push(self.descriptor(reply, Some(&parent)));
                        }
                    }
                    Err(e) => {
                        warn!(
                            message_id = %message.id,
                            error = %e,
                            "Reply fetch failed, skipping thread"
                        );
                    }
                }
            }
        }

        Ok(items)
    }
}
