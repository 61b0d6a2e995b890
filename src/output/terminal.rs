// Colored terminal output for run summaries, the review queue, and run
// history. The main.rs command handlers delegate here.

use colored::Colorize;

use crate::db::models::{ContentItem, ModerationStatus, RunLog, RunStatus, SentimentLabel};
use crate::moderation::Decision;
use crate::pipeline::RunSummary;
use crate::sentiment::Sentiment;

/// Display the aggregate outcome of one run.
pub fn display_run_summary(summary: &RunSummary) {
    println!("\n{}", "=== Run Summary ===".bold());
    println!("  Sources attempted: {}", summary.sources_attempted);

    let succeeded = if summary.succeeded > 0 {
        summary.succeeded.to_string().green().to_string()
    } else {
        summary.succeeded.to_string()
    };
    let failed = if summary.failed > 0 {
        summary.failed.to_string().red().bold().to_string()
    } else {
        summary.failed.to_string()
    };
    println!("  Succeeded: {succeeded}  Failed: {failed}");
    println!("  New items: {}", summary.new_items);
    println!("  Duration: {:.1}s", summary.duration.as_secs_f64());
    println!();
}

/// Display items waiting for a human decision, newest first.
pub fn display_review_queue(items: &[ContentItem]) {
    if items.is_empty() {
        println!("Review queue is empty.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Review Queue ({} items) ===", items.len()).bold()
    );
    println!();

    for item in items {
        let preview = super::truncate_chars(&item.text, 100);
        let reason = item.moderation_reason.as_deref().unwrap_or("-");

        println!(
            "  #{:<6} [{}] {} {}",
            item.id,
            item.source.as_str(),
            colorize_label(item.sentiment_label),
            colorize_status(item.moderation_status),
        );
        println!("    {}", preview.dimmed());
        println!(
            "    reason: {}  score: {:.2}  author: {}",
            reason,
            item.sentiment_score,
            item.author.as_deref().unwrap_or("unknown"),
        );
        println!();
    }
}

/// Display recent run logs, newest first.
pub fn display_run_logs(logs: &[RunLog]) {
    if logs.is_empty() {
        println!("  No runs recorded yet.");
        return;
    }

    println!(
        "  {:<10} {:<20} {:<10} {:>6}  {}",
        "Source".dimmed(),
        "Started".dimmed(),
        "Status".dimmed(),
        "Items".dimmed(),
        "Error".dimmed(),
    );

    for log in logs {
        let status = match log.status {
            RunStatus::Success => log.status.as_str().green().to_string(),
            RunStatus::Error => log.status.as_str().red().bold().to_string(),
            RunStatus::Running => log.status.as_str().yellow().to_string(),
        };
        println!(
            "  {:<10} {:<20} {:<10} {:>6}  {}",
            log.source.as_str(),
            log.started_at,
            status,
            log.items_collected,
            log.error_message.as_deref().unwrap_or("-").dimmed(),
        );
    }
}

/// Display a one-off classification result (the `classify` command).
pub fn display_classification(
    text: &str,
    sentiment: &Sentiment,
    backend: &str,
    decision: &Decision,
) {
    println!("\n  Text: {}", super::truncate_chars(text, 140));
    println!("  Backend: {backend}");
    println!(
        "  Label: {}  Score: {:.3}  Confidence: {:.2}",
        colorize_label(sentiment.label),
        sentiment.score,
        sentiment.confidence,
    );
    println!(
        "  Moderation: {}  Manual review: {}",
        colorize_status(decision.status),
        if decision.requires_manual_review {
            "yes".yellow().to_string()
        } else {
            "no".to_string()
        },
    );
    if let Some(reason) = &decision.reason {
        println!("  Reason: {reason}");
    }
    println!();
}

fn colorize_label(label: SentimentLabel) -> colored::ColoredString {
    match label {
        SentimentLabel::Positive => label.as_str().green(),
        SentimentLabel::Negative => label.as_str().red(),
        SentimentLabel::Neutral => label.as_str().dimmed(),
    }
}

fn colorize_status(status: ModerationStatus) -> colored::ColoredString {
    match status {
        ModerationStatus::Approved => status.as_str().green(),
        ModerationStatus::Rejected => status.as_str().red().bold(),
        ModerationStatus::Pending => status.as_str().yellow(),
    }
}
