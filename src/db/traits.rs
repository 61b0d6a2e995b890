// Database trait — backend-agnostic async interface for all DB operations.
//
// Implementor: SqliteDatabase (wraps rusqlite). All methods are async so a
// native async backend could sit behind the same interface later; the
// orchestrator and pipelines only ever see `Arc<dyn Database>`.
//
// The trait mirrors the queries.rs function signatures, so tests can
// exercise the free functions against a Connection directly.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{ContentItem, ItemAnalysis, ModerationStatus, NewContentItem, RunLog, RunStatus, Source};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Content items ---

    /// Look up an item by its store-assigned row id.
    async fn get_item(&self, id: i64) -> Result<Option<ContentItem>>;

    /// Look up an item by its natural key.
    async fn find_item_by_source_id(&self, source_id: &str) -> Result<Option<ContentItem>>;

    /// Insert a new item, returning its assigned row id.
    async fn insert_item(&self, item: &NewContentItem) -> Result<i64>;

    /// Overwrite an item's analysis columns; identity is never touched.
    async fn update_item_analysis(&self, id: i64, analysis: &ItemAnalysis) -> Result<()>;

    /// Items pending a human decision, newest first.
    async fn items_pending_review(&self, limit: u32) -> Result<Vec<ContentItem>>;

    /// All items in insertion order, for batch reprocessing.
    async fn all_items(&self, limit: u32) -> Result<Vec<ContentItem>>;

    /// Total number of stored items.
    async fn count_items(&self) -> Result<i64>;

    /// Number of items with the given moderation status.
    async fn count_by_moderation(&self, status: ModerationStatus) -> Result<i64>;

    /// Link orphaned comments whose parents arrived in a later run.
    /// Returns the number of comments linked.
    async fn resolve_orphaned_comments(&self) -> Result<usize>;

    // --- Run logs ---

    /// Open a run log for a source (status = running). Returns the log id.
    async fn insert_run_log(&self, source: Source) -> Result<i64>;

    /// Close a run log with its terminal status. Called exactly once per run.
    async fn finalize_run_log(
        &self,
        id: i64,
        status: RunStatus,
        items_collected: i64,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// Most recent run logs across all sources, newest first.
    async fn recent_run_logs(&self, limit: u32) -> Result<Vec<RunLog>>;
}
