// System status display — DB stats, moderation counts, recent runs.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::db::models::ModerationStatus;
use crate::db::Database;
use crate::output::terminal;
use crate::sentiment::BackendKind;

/// Display system status to the terminal.
pub async fn show(
    db: &Arc<dyn Database>,
    db_display_path: &str,
    active_backend: BackendKind,
) -> Result<()> {
    if !Path::new(db_display_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `driftnet init` to set up the database.");
        return Ok(());
    }

    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);
    println!("Sentiment backend: {}", active_backend.as_str());

    let total = db.count_items().await?;
    if total == 0 {
        println!("Items: none collected yet");
        println!("  Run `driftnet run` to collect mentions");
        return Ok(());
    }

    let approved = db.count_by_moderation(ModerationStatus::Approved).await?;
    let rejected = db.count_by_moderation(ModerationStatus::Rejected).await?;
    let pending = db.count_by_moderation(ModerationStatus::Pending).await?;
    println!(
        "Items: {} total ({} approved, {} rejected, {} pending)",
        total, approved, rejected, pending
    );

    let review = db.items_pending_review(1000).await?;
    println!("Review queue: {} items", review.len());

    println!("\nRecent runs:");
    let logs = db.recent_run_logs(8).await?;
    terminal::display_run_logs(&logs);

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
