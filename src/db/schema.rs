// Database schema — table creation and migrations.
//
// We use a simple version-based migration approach: a `schema_version` table
// tracks which migrations have run, and each migration is a function that
// executes SQL statements.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Every collected post, message, article, or comment.
        -- source_id is the natural key: the UNIQUE constraint is the sole
        -- deduplication mechanism and the only concurrency control we need.
        CREATE TABLE IF NOT EXISTS content_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,              -- social / channel / news / forum / web
            source_id TEXT NOT NULL UNIQUE,    -- stable across re-collection
            author TEXT,
            author_id TEXT,
            text TEXT NOT NULL,
            url TEXT,
            published_at TEXT,                 -- origin-reported timestamp
            collected_at TEXT NOT NULL DEFAULT (datetime('now')),
            sentiment_score REAL NOT NULL DEFAULT 0,
            sentiment_label TEXT NOT NULL DEFAULT 'neutral',
            keywords TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
            moderation_status TEXT NOT NULL DEFAULT 'pending',
            moderation_reason TEXT,
            requires_manual_review INTEGER NOT NULL DEFAULT 0,
            processed INTEGER NOT NULL DEFAULT 0,
            processed_at TEXT,
            parent_id INTEGER REFERENCES content_items(id),
            parent_source_id TEXT,             -- parent natural key, for late linkage
            is_comment INTEGER NOT NULL DEFAULT 0
        );

        -- One row per (source, collection attempt)
        CREATE TABLE IF NOT EXISTS run_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,
            started_at TEXT NOT NULL DEFAULT (datetime('now')),
            completed_at TEXT,                 -- NULL until the run finishes
            status TEXT NOT NULL DEFAULT 'running',
            items_collected INTEGER NOT NULL DEFAULT 0,
            error_message TEXT
        );

        -- Index for the review queue (pending + manual-review lookups)
        CREATE INDEX IF NOT EXISTS idx_items_moderation
            ON content_items(moderation_status, requires_manual_review);

        -- Index for thread reconstruction
        CREATE INDEX IF NOT EXISTS idx_items_parent
            ON content_items(parent_id);

        -- Index for finding orphaned comments by their parent's natural key
        CREATE INDEX IF NOT EXISTS idx_items_parent_source
            ON content_items(parent_source_id);

        -- Index for the per-source run history view
        CREATE INDEX IF NOT EXISTS idx_runs_source
            ON run_logs(source, started_at);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
