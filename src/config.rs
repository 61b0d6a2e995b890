// Central configuration loaded from environment variables.
//
// The .env file is loaded automatically at startup via dotenvy. A collector
// is enabled by setting its endpoint variable; unset means that source is
// skipped. Only db_path has a default that always works — the monitored
// query is required for anything beyond `init` and `status`.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::collect::{
    ChannelCollector, Collector, NewsCollector, SocialCollector, WebCollector,
};
use crate::moderation;
use crate::sentiment::{BackendKind, ExtraAlphabet};

pub struct Config {
    pub db_path: String,
    /// The monitored entity — the search query every collector uses.
    pub query: String,

    /// Mastodon-compatible API base URL. Enables the social collector.
    pub social_api_url: Option<String>,
    /// Channel API base URL plus channel name. Both required to enable.
    pub channel_api_url: Option<String>,
    pub channel: Option<String>,
    /// News API base URL. Enables the news collector.
    pub news_api_url: Option<String>,
    /// Comma-separated JSON feed URLs. Enables the web collector.
    pub web_feeds: Vec<String>,

    /// Blocklist terms, comma-separated in the environment.
    pub blocklist: Vec<String>,
    /// Profanity regex patterns, comma-separated; defaults built in.
    pub profanity_patterns: Vec<String>,
    /// Sentiment below this goes to manual review (default -0.5).
    pub negative_threshold: f64,
    /// Minimum class mass for a non-neutral label (default 0.3).
    pub label_threshold: f64,

    /// Seconds between scheduled runs in watch mode (default 900).
    pub run_interval_secs: u64,
    /// Cap on items fetched per source request (default 100).
    pub max_items: usize,

    /// Explicit backend override; unset means probe in priority order.
    pub sentiment_backend: Option<BackendKind>,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,

    /// Extra alphabet kept by keyword extraction (default cyrillic).
    pub keyword_alphabet: ExtraAlphabet,
    pub keyword_top_n: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("DRIFTNET_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::sentiment::download::default_model_dir());

        let sentiment_backend = match env::var("DRIFTNET_SENTIMENT_BACKEND") {
            Ok(name) => Some(BackendKind::parse(&name).with_context(|| {
                format!("Unknown DRIFTNET_SENTIMENT_BACKEND: {name} (onnx/compound/lexicon)")
            })?),
            Err(_) => None,
        };

        Ok(Self {
            db_path: env::var("DRIFTNET_DB_PATH").unwrap_or_else(|_| "./driftnet.db".to_string()),
            query: env::var("DRIFTNET_QUERY").unwrap_or_default(),
            social_api_url: env::var("DRIFTNET_SOCIAL_API_URL").ok(),
            channel_api_url: env::var("DRIFTNET_CHANNEL_API_URL").ok(),
            channel: env::var("DRIFTNET_CHANNEL").ok(),
            news_api_url: env::var("DRIFTNET_NEWS_API_URL").ok(),
            web_feeds: split_list(&env::var("DRIFTNET_WEB_FEED_URLS").unwrap_or_default()),
            blocklist: split_list(&env::var("DRIFTNET_BLOCKLIST").unwrap_or_default()),
            profanity_patterns: match env::var("DRIFTNET_PROFANITY_PATTERNS") {
                Ok(raw) => split_list(&raw),
                Err(_) => moderation::DEFAULT_PROFANITY_PATTERNS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            negative_threshold: parse_env("DRIFTNET_NEGATIVE_THRESHOLD", -0.5)?,
            label_threshold: parse_env("DRIFTNET_LABEL_THRESHOLD", 0.3)?,
            run_interval_secs: parse_env("DRIFTNET_RUN_INTERVAL_SECS", 900)?,
            max_items: parse_env("DRIFTNET_MAX_ITEMS", 100)?,
            sentiment_backend,
            model_dir,
            keyword_alphabet: ExtraAlphabet::parse(
                &env::var("DRIFTNET_KEYWORD_ALPHABET").unwrap_or_else(|_| "cyrillic".to_string()),
            ),
            keyword_top_n: parse_env("DRIFTNET_KEYWORD_TOP_N", 10)?,
        })
    }

    /// Check that the monitored query is configured.
    /// Call this before any operation that collects content.
    pub fn require_query(&self) -> Result<()> {
        if self.query.is_empty() {
            anyhow::bail!(
                "DRIFTNET_QUERY not set. Add the monitored entity name to your .env file."
            );
        }
        Ok(())
    }

    /// Build a collector for every source with a configured endpoint.
    pub fn configured_collectors(&self) -> Result<Vec<Box<dyn Collector>>> {
        let mut collectors: Vec<Box<dyn Collector>> = Vec::new();

        if let Some(url) = &self.social_api_url {
            collectors.push(Box::new(SocialCollector::new(
                url,
                &self.query,
                self.max_items,
            )?));
        }
        if let (Some(url), Some(channel)) = (&self.channel_api_url, &self.channel) {
            collectors.push(Box::new(ChannelCollector::new(
                url,
                channel,
                &self.query,
                self.max_items,
            )?));
        }
        if let Some(url) = &self.news_api_url {
            collectors.push(Box::new(NewsCollector::new(
                url,
                &self.query,
                self.max_items,
            )?));
        }
        if !self.web_feeds.is_empty() {
            collectors.push(Box::new(WebCollector::new(
                self.web_feeds.clone(),
                &self.query,
                self.max_items,
            )?));
        }

        if collectors.is_empty() {
            anyhow::bail!(
                "No sources configured. Set at least one of DRIFTNET_SOCIAL_API_URL, \
                 DRIFTNET_CHANNEL_API_URL (+DRIFTNET_CHANNEL), DRIFTNET_NEWS_API_URL, \
                 DRIFTNET_WEB_FEED_URLS."
            );
        }
        Ok(collectors)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid {name}: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("scam, fraud ,, ripoff"),
            vec!["scam".to_string(), "fraud".to_string(), "ripoff".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
