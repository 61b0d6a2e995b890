// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points — Rust enforces this because
// MutexGuard is !Send.
//
// The free functions in queries.rs remain unchanged so tests can exercise
// them against Connection directly.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{
    ContentItem, ItemAnalysis, ModerationStatus, NewContentItem, RunLog, RunStatus, Source,
};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn get_item(&self, id: i64) -> Result<Option<ContentItem>> {
        let conn = self.conn.lock().await;
        super::queries::get_item(&conn, id)
    }

    async fn find_item_by_source_id(&self, source_id: &str) -> Result<Option<ContentItem>> {
        let conn = self.conn.lock().await;
        super::queries::find_item_by_source_id(&conn, source_id)
    }

    async fn insert_item(&self, item: &NewContentItem) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_item(&conn, item)
    }

    async fn update_item_analysis(&self, id: i64, analysis: &ItemAnalysis) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::update_item_analysis(&conn, id, analysis)
    }

    async fn items_pending_review(&self, limit: u32) -> Result<Vec<ContentItem>> {
        let conn = self.conn.lock().await;
        super::queries::items_pending_review(&conn, limit)
    }

    async fn all_items(&self, limit: u32) -> Result<Vec<ContentItem>> {
        let conn = self.conn.lock().await;
        super::queries::all_items(&conn, limit)
    }

    async fn count_items(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_items(&conn)
    }

    async fn count_by_moderation(&self, status: ModerationStatus) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_by_moderation(&conn, status)
    }

    async fn resolve_orphaned_comments(&self) -> Result<usize> {
        let conn = self.conn.lock().await;
        super::queries::resolve_orphaned_comments(&conn)
    }

    async fn insert_run_log(&self, source: Source) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_run_log(&conn, source)
    }

    async fn finalize_run_log(
        &self,
        id: i64,
        status: RunStatus,
        items_collected: i64,
        error_message: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::finalize_run_log(&conn, id, status, items_collected, error_message)
    }

    async fn recent_run_logs(&self, limit: u32) -> Result<Vec<RunLog>> {
        let conn = self.conn.lock().await;
        super::queries::recent_run_logs(&conn, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ItemAnalysis, SentimentLabel};
    use crate::db::schema::create_tables;

    async fn test_db() -> SqliteDatabase {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        SqliteDatabase::new(conn)
    }

    fn sample_item(source_id: &str) -> NewContentItem {
        NewContentItem {
            source: Source::Channel,
            source_id: source_id.to_string(),
            author: None,
            author_id: None,
            text: "release day".to_string(),
            url: None,
            published_at: None,
            parent_id: None,
            parent_source_id: None,
            is_comment: false,
            analysis: ItemAnalysis {
                sentiment_score: 0.0,
                sentiment_label: SentimentLabel::Neutral,
                keywords: vec![],
                moderation_status: ModerationStatus::Approved,
                moderation_reason: None,
                requires_manual_review: false,
            },
        }
    }

    #[tokio::test]
    async fn test_trait_insert_and_lookup() {
        let db = test_db().await;
        let id = db.insert_item(&sample_item("channel-9")).await.unwrap();
        let found = db.find_item_by_source_id("channel-9").await.unwrap();
        assert_eq!(found.unwrap().id, id);
        assert!(db.find_item_by_source_id("channel-10").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trait_run_log_lifecycle() {
        let db = test_db().await;
        let id = db.insert_run_log(Source::Web).await.unwrap();
        db.finalize_run_log(id, RunStatus::Success, 3, None)
            .await
            .unwrap();
        let logs = db.recent_run_logs(5).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, RunStatus::Success);
        assert_eq!(logs[0].items_collected, 3);
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let db = test_db().await;
        assert_eq!(db.table_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_trait_counts() {
        let db = test_db().await;
        db.insert_item(&sample_item("channel-1")).await.unwrap();
        db.insert_item(&sample_item("channel-2")).await.unwrap();
        assert_eq!(db.count_items().await.unwrap(), 2);
        assert_eq!(
            db.count_by_moderation(ModerationStatus::Approved).await.unwrap(),
            2
        );
    }
}
