// Per-source ingestion pipeline: collect -> classify -> moderate -> persist.
//
// The persistence step is the dedup point. Each source run owns one
// ParentCache so comments processed after their parent in the same batch
// link up before any cross-run lookup is possible. A comment processed
// before its parent keeps a null parent id for this run; `reprocess` can
// repair those later from the recorded parent natural key.

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, info};

use crate::collect::{Collector, ItemDescriptor};
use crate::db::models::{ItemAnalysis, NewContentItem};
use crate::db::Database;
use crate::moderation::ModerationEngine;
use crate::sentiment::{KeywordExtractor, SentimentCascade};

/// In-run map from a parent's natural key to its assigned row id.
///
/// Scoped to one source's pipeline execution — built as non-comment items
/// are persisted, consulted before falling back to a store lookup, and
/// discarded when the run ends. Never shared across concurrent sources.
#[derive(Debug, Default)]
pub struct ParentCache {
    resolved: HashMap<String, i64>,
}

impl ParentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source_id: &str, id: i64) {
        self.resolved.insert(source_id.to_string(), id);
    }

    pub fn get(&self, source_id: &str) -> Option<i64> {
        self.resolved.get(source_id).copied()
    }
}

/// Upsert one descriptor. Returns the new row id, or `None` when an item
/// with the same natural key already exists (no fields are touched then).
pub async fn upsert(
    db: &dyn Database,
    cache: &mut ParentCache,
    descriptor: &ItemDescriptor,
    analysis: ItemAnalysis,
) -> Result<Option<i64>> {
    if let Some(existing) = db.find_item_by_source_id(&descriptor.source_id).await? {
        // Duplicate: still register non-comments so later comments in this
        // batch resolve against the already-stored parent.
        if !descriptor.is_comment {
            cache.register(&descriptor.source_id, existing.id);
        }
        debug!(source_id = %descriptor.source_id, "Duplicate natural key, skipping");
        return Ok(None);
    }

    let parent_id = if let (true, Some(parent_key)) =
        (descriptor.is_comment, descriptor.parent_source_id.as_deref())
    {
        match cache.get(parent_key) {
            Some(id) => Some(id),
            None => db
                .find_item_by_source_id(parent_key)
                .await?
                .map(|parent| parent.id),
        }
    } else {
        None
    };

    let item = NewContentItem {
        source: descriptor.source,
        source_id: descriptor.source_id.clone(),
        author: descriptor.author.clone(),
        author_id: descriptor.author_id.clone(),
        text: descriptor.text.clone(),
        url: descriptor.url.clone(),
        published_at: descriptor.published_at.clone(),
        parent_id,
        parent_source_id: descriptor.parent_source_id.clone(),
        is_comment: descriptor.is_comment,
        analysis,
    };

    let id = db.insert_item(&item).await?;
    if !descriptor.is_comment {
        cache.register(&descriptor.source_id, id);
    }
    Ok(Some(id))
}

/// Run one source's full pipeline. Returns the count of newly inserted
/// items (duplicates are skipped, not counted).
///
/// Only collector failure propagates; classification degrades to neutral
/// inside the cascade and moderation cannot fail.
pub async fn ingest_source(
    db: &dyn Database,
    collector: &dyn Collector,
    cascade: &SentimentCascade,
    keywords: &KeywordExtractor,
    moderation: &ModerationEngine,
    include_comments: bool,
) -> Result<usize> {
    let descriptors = collector.collect(include_comments).await?;
    if descriptors.is_empty() {
        info!(source = collector.source().as_str(), "No items collected");
        return Ok(0);
    }

    let texts: Vec<String> = descriptors.iter().map(|d| d.text.clone()).collect();
    let sentiments = cascade.classify_batch(&texts).await;

    let mut cache = ParentCache::new();
    let mut inserted = 0;

    // Items are processed in collector order — comments after their parent
    // resolve through the cache.
    for (descriptor, sentiment) in descriptors.iter().zip(sentiments) {
        let decision = moderation.moderate(&descriptor.text, Some(sentiment.score));
        let analysis = ItemAnalysis {
            sentiment_score: sentiment.score,
            sentiment_label: sentiment.label,
            keywords: keywords.extract(&descriptor.text),
            moderation_status: decision.status,
            moderation_reason: decision.reason,
            requires_manual_review: decision.requires_manual_review,
        };

        if upsert(db, &mut cache, descriptor, analysis).await?.is_some() {
            inserted += 1;
        }
    }

    info!(
        source = collector.source().as_str(),
        collected = descriptors.len(),
        inserted,
        "Source ingested"
    );
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Source;
    use crate::db::{Database, SqliteDatabase};
    use rusqlite::Connection;

    fn test_db() -> SqliteDatabase {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::schema::create_tables(&conn).unwrap();
        SqliteDatabase::new(conn)
    }

    fn post(source_id: &str) -> ItemDescriptor {
        ItemDescriptor::post(Source::Social, source_id, "some text")
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let db = test_db();
        let mut cache = ParentCache::new();
        let d = post("social-p1");

        let first = upsert(&db, &mut cache, &d, ItemAnalysis::default())
            .await
            .unwrap();
        assert!(first.is_some());

        let second = upsert(&db, &mut cache, &d, ItemAnalysis::default())
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(db.count_items().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_comment_after_parent_resolves_via_cache() {
        let db = test_db();
        let mut cache = ParentCache::new();

        let parent_id = upsert(&db, &mut cache, &post("social-p1"), ItemAnalysis::default())
            .await
            .unwrap()
            .unwrap();

        let comment = post("social-c1").reply_to("social-p1");
        let comment_id = upsert(&db, &mut cache, &comment, ItemAnalysis::default())
            .await
            .unwrap()
            .unwrap();

        let stored = db.get_item(comment_id).await.unwrap().unwrap();
        assert_eq!(stored.parent_id, Some(parent_id));
    }

    #[tokio::test]
    async fn test_comment_before_parent_stays_unlinked() {
        let db = test_db();
        let mut cache = ParentCache::new();

        let comment = post("social-c1").reply_to("social-p1");
        let comment_id = upsert(&db, &mut cache, &comment, ItemAnalysis::default())
            .await
            .unwrap()
            .unwrap();

        upsert(&db, &mut cache, &post("social-p1"), ItemAnalysis::default())
            .await
            .unwrap();

        // Out-of-order arrival within a run is not repaired by ingestion
        let stored = db.get_item(comment_id).await.unwrap().unwrap();
        assert_eq!(stored.parent_id, None);
        assert_eq!(stored.parent_source_id.as_deref(), Some("social-p1"));
    }

    #[tokio::test]
    async fn test_comment_resolves_parent_from_earlier_run() {
        let db = test_db();

        let mut run1 = ParentCache::new();
        let parent_id = upsert(&db, &mut run1, &post("social-p1"), ItemAnalysis::default())
            .await
            .unwrap()
            .unwrap();

        // Fresh cache: the store lookup still finds the parent
        let mut run2 = ParentCache::new();
        let comment = post("social-c1").reply_to("social-p1");
        let comment_id = upsert(&db, &mut run2, &comment, ItemAnalysis::default())
            .await
            .unwrap()
            .unwrap();

        let stored = db.get_item(comment_id).await.unwrap().unwrap();
        assert_eq!(stored.parent_id, Some(parent_id));
    }

    #[tokio::test]
    async fn test_duplicate_parent_still_registers_for_comments() {
        let db = test_db();

        let mut run1 = ParentCache::new();
        let parent_id = upsert(&db, &mut run1, &post("social-p1"), ItemAnalysis::default())
            .await
            .unwrap()
            .unwrap();

        // Second run re-collects the parent (skip) then a new comment
        let mut run2 = ParentCache::new();
        assert!(upsert(&db, &mut run2, &post("social-p1"), ItemAnalysis::default())
            .await
            .unwrap()
            .is_none());
        assert_eq!(run2.get("social-p1"), Some(parent_id));
    }
}
