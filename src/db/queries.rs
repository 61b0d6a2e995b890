// Database queries — CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.
//
// The store exclusively owns item identity: inserts assign row ids and
// collected_at, and the UNIQUE source_id constraint enforces natural-key
// deduplication. Callers never update identity fields after insert.

use anyhow::Result;
use rusqlite::{params, Connection};

use super::models::{
    ContentItem, ItemAnalysis, ModerationStatus, NewContentItem, RunLog, RunStatus,
    SentimentLabel, Source,
};

/// UTC timestamp in the same "YYYY-MM-DD HH:MM:SS" shape SQLite's
/// datetime() produces, so stored timestamps sort and compare uniformly.
fn now_utc() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// --- Content items ---

/// Map a content_items row (selected with ITEM_COLUMNS order) to a ContentItem.
const ITEM_COLUMNS: &str = "id, source, source_id, author, author_id, text, url,
        published_at, collected_at, sentiment_score, sentiment_label, keywords,
        moderation_status, moderation_reason, requires_manual_review,
        processed, processed_at, parent_id, parent_source_id, is_comment";

fn map_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContentItem> {
    let source: String = row.get(1)?;
    let label: String = row.get(10)?;
    let keywords_json: String = row.get(11)?;
    let status: String = row.get(12)?;
    Ok(ContentItem {
        id: row.get(0)?,
        source: Source::parse(&source),
        source_id: row.get(2)?,
        author: row.get(3)?,
        author_id: row.get(4)?,
        text: row.get(5)?,
        url: row.get(6)?,
        published_at: row.get(7)?,
        collected_at: row.get(8)?,
        sentiment_score: row.get(9)?,
        sentiment_label: SentimentLabel::parse(&label),
        keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
        moderation_status: ModerationStatus::parse(&status),
        moderation_reason: row.get(13)?,
        requires_manual_review: row.get::<_, i32>(14)? != 0,
        processed: row.get::<_, i32>(15)? != 0,
        processed_at: row.get(16)?,
        parent_id: row.get(17)?,
        parent_source_id: row.get(18)?,
        is_comment: row.get::<_, i32>(19)? != 0,
    })
}

/// Look up an item by its store-assigned row id.
pub fn get_item(conn: &Connection, id: i64) -> Result<Option<ContentItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM content_items WHERE id = ?1"
    ))?;
    let result = stmt.query_row(params![id], map_item).optional()?;
    Ok(result)
}

/// Look up an item by its natural key.
pub fn find_item_by_source_id(conn: &Connection, source_id: &str) -> Result<Option<ContentItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM content_items WHERE source_id = ?1"
    ))?;
    let result = stmt.query_row(params![source_id], map_item).optional()?;
    Ok(result)
}

/// Insert a new content item and return its assigned row id.
///
/// collected_at and processed_at are set here, once — re-ingesting the same
/// source_id never reaches this function (callers check for duplicates first,
/// and the UNIQUE constraint backstops them).
pub fn insert_item(conn: &Connection, item: &NewContentItem) -> Result<i64> {
    let keywords_json = serde_json::to_string(&item.analysis.keywords)?;
    conn.execute(
        "INSERT INTO content_items
            (source, source_id, author, author_id, text, url, published_at,
             sentiment_score, sentiment_label, keywords,
             moderation_status, moderation_reason, requires_manual_review,
             processed, processed_at, parent_id, parent_source_id, is_comment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                 1, ?14, ?15, ?16, ?17)",
        params![
            item.source.as_str(),
            item.source_id,
            item.author,
            item.author_id,
            item.text,
            item.url,
            item.published_at,
            item.analysis.sentiment_score,
            item.analysis.sentiment_label.as_str(),
            keywords_json,
            item.analysis.moderation_status.as_str(),
            item.analysis.moderation_reason,
            item.analysis.requires_manual_review as i32,
            now_utc(),
            item.parent_id,
            item.parent_source_id,
            item.is_comment as i32,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite an item's analysis columns (sentiment, keywords, moderation).
///
/// Identity fields and collected_at are never touched — this exists for the
/// reprocess command, which re-runs classification after tuning.
pub fn update_item_analysis(conn: &Connection, id: i64, analysis: &ItemAnalysis) -> Result<()> {
    let keywords_json = serde_json::to_string(&analysis.keywords)?;
    conn.execute(
        "UPDATE content_items SET
            sentiment_score = ?2,
            sentiment_label = ?3,
            keywords = ?4,
            moderation_status = ?5,
            moderation_reason = ?6,
            requires_manual_review = ?7,
            processed = 1,
            processed_at = ?8
         WHERE id = ?1",
        params![
            id,
            analysis.sentiment_score,
            analysis.sentiment_label.as_str(),
            keywords_json,
            analysis.moderation_status.as_str(),
            analysis.moderation_reason,
            analysis.requires_manual_review as i32,
            now_utc(),
        ],
    )?;
    Ok(())
}

/// Items waiting for a human decision — pending status or flagged for
/// manual review — newest first.
pub fn items_pending_review(conn: &Connection, limit: u32) -> Result<Vec<ContentItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM content_items
         WHERE moderation_status = 'pending' OR requires_manual_review = 1
         ORDER BY collected_at DESC
         LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], map_item)?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

/// All items in insertion order, for batch reprocessing.
pub fn all_items(conn: &Connection, limit: u32) -> Result<Vec<ContentItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM content_items ORDER BY id LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], map_item)?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

/// Total number of stored items.
pub fn count_items(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM content_items", [], |row| row.get(0))?;
    Ok(count)
}

/// Number of items with the given moderation status.
pub fn count_by_moderation(conn: &Connection, status: ModerationStatus) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM content_items WHERE moderation_status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Link orphaned comments to parents that arrived in a later run.
///
/// A comment persisted before its parent keeps a NULL parent_id for that
/// run; this pass repairs the linkage using the stored parent_source_id.
/// Returns the number of comments linked.
pub fn resolve_orphaned_comments(conn: &Connection) -> Result<usize> {
    let updated = conn.execute(
        "UPDATE content_items SET parent_id =
            (SELECT p.id FROM content_items p
             WHERE p.source_id = content_items.parent_source_id)
         WHERE is_comment = 1
           AND parent_id IS NULL
           AND parent_source_id IS NOT NULL
           AND EXISTS (SELECT 1 FROM content_items p
                       WHERE p.source_id = content_items.parent_source_id)",
        [],
    )?;
    Ok(updated)
}

// --- Run logs ---

/// Open a run log for a source. Status starts as 'running'.
pub fn insert_run_log(conn: &Connection, source: Source) -> Result<i64> {
    conn.execute(
        "INSERT INTO run_logs (source, status) VALUES (?1, 'running')",
        params![source.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Close a run log with its terminal status. Called exactly once per run —
/// a run log is never re-opened.
pub fn finalize_run_log(
    conn: &Connection,
    id: i64,
    status: RunStatus,
    items_collected: i64,
    error_message: Option<&str>,
) -> Result<()> {
    conn.execute(
        "UPDATE run_logs SET
            completed_at = ?5,
            status = ?2,
            items_collected = ?3,
            error_message = ?4
         WHERE id = ?1",
        params![id, status.as_str(), items_collected, error_message, now_utc()],
    )?;
    Ok(())
}

/// Most recent run logs across all sources, newest first.
pub fn recent_run_logs(conn: &Connection, limit: u32) -> Result<Vec<RunLog>> {
    let mut stmt = conn.prepare(
        "SELECT id, source, started_at, completed_at, status, items_collected, error_message
         FROM run_logs
         ORDER BY started_at DESC, id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        let source: String = row.get(1)?;
        let status: String = row.get(4)?;
        Ok(RunLog {
            id: row.get(0)?,
            source: Source::parse(&source),
            started_at: row.get(2)?,
            completed_at: row.get(3)?,
            status: RunStatus::parse(&status),
            items_collected: row.get(5)?,
            error_message: row.get(6)?,
        })
    })?;

    let mut logs = Vec::new();
    for row in rows {
        logs.push(row?);
    }
    Ok(logs)
}

// rusqlite's optional() helper — converts "no rows" into None
use rusqlite::OptionalExtension;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn sample_item(source_id: &str) -> NewContentItem {
        NewContentItem {
            source: Source::Social,
            source_id: source_id.to_string(),
            author: Some("ada".to_string()),
            author_id: Some("u1".to_string()),
            text: "the launch went well".to_string(),
            url: Some("https://example.social/p/1".to_string()),
            published_at: Some("2026-08-20T10:00:00Z".to_string()),
            parent_id: None,
            parent_source_id: None,
            is_comment: false,
            analysis: ItemAnalysis {
                sentiment_score: 0.4,
                sentiment_label: SentimentLabel::Positive,
                keywords: vec!["launch".to_string()],
                moderation_status: ModerationStatus::Approved,
                moderation_reason: None,
                requires_manual_review: false,
            },
        }
    }

    #[test]
    fn test_insert_and_find_by_source_id() {
        let conn = test_db();
        let id = insert_item(&conn, &sample_item("social-1")).unwrap();
        assert!(id > 0);

        let found = find_item_by_source_id(&conn, "social-1").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.text, "the launch went well");
        assert_eq!(found.sentiment_label, SentimentLabel::Positive);
        assert_eq!(found.keywords, vec!["launch".to_string()]);
        assert!(found.processed);
        assert!(found.processed_at.is_some());
        assert!(!found.collected_at.is_empty());
    }

    #[test]
    fn test_find_missing_returns_none() {
        let conn = test_db();
        assert!(find_item_by_source_id(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_source_id_is_rejected() {
        let conn = test_db();
        insert_item(&conn, &sample_item("social-1")).unwrap();
        assert!(insert_item(&conn, &sample_item("social-1")).is_err());
        assert_eq!(count_items(&conn).unwrap(), 1);
    }

    #[test]
    fn test_update_analysis_preserves_identity() {
        let conn = test_db();
        let id = insert_item(&conn, &sample_item("social-1")).unwrap();
        let before = get_item(&conn, id).unwrap().unwrap();

        let analysis = ItemAnalysis {
            sentiment_score: -0.6,
            sentiment_label: SentimentLabel::Negative,
            keywords: vec![],
            moderation_status: ModerationStatus::Pending,
            moderation_reason: Some("negative sentiment".to_string()),
            requires_manual_review: true,
        };
        update_item_analysis(&conn, id, &analysis).unwrap();

        let after = get_item(&conn, id).unwrap().unwrap();
        assert_eq!(after.source_id, before.source_id);
        assert_eq!(after.collected_at, before.collected_at);
        assert_eq!(after.sentiment_label, SentimentLabel::Negative);
        assert_eq!(after.moderation_status, ModerationStatus::Pending);
        assert!(after.requires_manual_review);
    }

    #[test]
    fn test_pending_review_queue() {
        let conn = test_db();
        insert_item(&conn, &sample_item("social-1")).unwrap();

        let mut flagged = sample_item("social-2");
        flagged.analysis.moderation_status = ModerationStatus::Pending;
        flagged.analysis.requires_manual_review = true;
        insert_item(&conn, &flagged).unwrap();

        let queue = items_pending_review(&conn, 10).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].source_id, "social-2");
    }

    #[test]
    fn test_resolve_orphaned_comments() {
        let conn = test_db();

        // Comment arrives first — parent unknown, parent_id stays NULL
        let mut comment = sample_item("social-c1");
        comment.is_comment = true;
        comment.parent_source_id = Some("social-p1".to_string());
        let comment_id = insert_item(&conn, &comment).unwrap();
        assert!(get_item(&conn, comment_id).unwrap().unwrap().parent_id.is_none());

        // Parent arrives in a "later run"
        let parent_id = insert_item(&conn, &sample_item("social-p1")).unwrap();

        let linked = resolve_orphaned_comments(&conn).unwrap();
        assert_eq!(linked, 1);
        assert_eq!(
            get_item(&conn, comment_id).unwrap().unwrap().parent_id,
            Some(parent_id)
        );

        // Second pass is a no-op
        assert_eq!(resolve_orphaned_comments(&conn).unwrap(), 0);
    }

    #[test]
    fn test_run_log_lifecycle() {
        let conn = test_db();
        let id = insert_run_log(&conn, Source::News).unwrap();

        let logs = recent_run_logs(&conn, 10).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, RunStatus::Running);
        assert!(logs[0].completed_at.is_none());

        finalize_run_log(&conn, id, RunStatus::Success, 7, None).unwrap();
        let logs = recent_run_logs(&conn, 10).unwrap();
        assert_eq!(logs[0].status, RunStatus::Success);
        assert_eq!(logs[0].items_collected, 7);
        assert!(logs[0].completed_at.is_some());
    }

    #[test]
    fn test_run_log_error_message() {
        let conn = test_db();
        let id = insert_run_log(&conn, Source::Channel).unwrap();
        finalize_run_log(&conn, id, RunStatus::Error, 0, Some("connection refused")).unwrap();

        let logs = recent_run_logs(&conn, 10).unwrap();
        assert_eq!(logs[0].status, RunStatus::Error);
        assert_eq!(logs[0].error_message.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_count_by_moderation() {
        let conn = test_db();
        insert_item(&conn, &sample_item("social-1")).unwrap();
        let mut rejected = sample_item("social-2");
        rejected.analysis.moderation_status = ModerationStatus::Rejected;
        insert_item(&conn, &rejected).unwrap();

        assert_eq!(count_by_moderation(&conn, ModerationStatus::Approved).unwrap(), 1);
        assert_eq!(count_by_moderation(&conn, ModerationStatus::Rejected).unwrap(), 1);
        assert_eq!(count_by_moderation(&conn, ModerationStatus::Pending).unwrap(), 0);
    }
}
