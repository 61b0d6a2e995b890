use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use driftnet::config::Config;
use driftnet::db::models::ItemAnalysis;
use driftnet::db::Database;
use driftnet::moderation::ModerationEngine;
use driftnet::output::terminal;
use driftnet::pipeline::Orchestrator;
use driftnet::sentiment::{self, KeywordExtractor, SentimentCascade};

/// Driftnet: mention monitoring and triage for public-web content.
///
/// Collects posts, messages, articles and their comments mentioning a
/// monitored entity, classifies sentiment, applies moderation rules, and
/// stores everything for review.
#[derive(Parser)]
#[command(name = "driftnet", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Download the ONNX sentiment model (~125 MB)
    DownloadModel,

    /// Collect from every configured source once
    Run {
        /// Also fetch comments and thread replies
        #[arg(long)]
        comments: bool,
    },

    /// Collect on a fixed interval until stopped
    Watch {
        /// Seconds between runs (overrides DRIFTNET_RUN_INTERVAL_SECS)
        #[arg(long)]
        interval: Option<u64>,

        /// Also fetch comments and thread replies
        #[arg(long)]
        comments: bool,
    },

    /// Show system status (DB stats, moderation counts, recent runs)
    Status,

    /// List items waiting for manual review
    Review {
        /// Max items to show (default: 20)
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Re-classify and re-moderate every stored item, then link any
    /// orphaned comments whose parent has since arrived
    Reprocess,

    /// Classify a single text and print the result
    Classify {
        /// The text to classify
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("driftnet=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Driftnet database...");
            let config = Config::load()?;
            let db = driftnet::db::initialize(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nDriftnet is ready. Next step: set up your .env file");
            println!("  (DRIFTNET_QUERY plus at least one source endpoint)");
            println!("\nThen run: cargo run -- run");
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading sentiment model...");
            println!("  Destination: {}", model_dir.display());

            sentiment::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("The next run will use the ONNX backend automatically.");
        }

        Commands::Run { comments } => {
            let config = Config::load()?;
            config.require_query()?;
            let db = driftnet::db::open(&config.db_path)?;

            let orchestrator = build_orchestrator(&config, db)?;
            println!(
                "Collecting mentions of \"{}\" from {} source(s)...",
                config.query,
                orchestrator.sources()
            );

            match orchestrator.run_all(comments).await? {
                Some(summary) => terminal::display_run_summary(&summary),
                None => println!("A run is already in progress, skipped."),
            }
        }

        Commands::Watch { interval, comments } => {
            let config = Config::load()?;
            config.require_query()?;
            let db = driftnet::db::open(&config.db_path)?;

            let secs = interval.unwrap_or(config.run_interval_secs);
            let orchestrator = Arc::new(build_orchestrator(&config, db)?);
            println!(
                "Watching {} source(s) every {}s. Ctrl-C to stop.",
                orchestrator.sources(),
                secs
            );

            orchestrator
                .run_forever(Duration::from_secs(secs), comments)
                .await;
        }

        Commands::Status => {
            let config = Config::load()?;
            let cascade = build_cascade(&config);
            if std::path::Path::new(&config.db_path).exists() {
                let db = driftnet::db::open(&config.db_path)?;
                driftnet::status::show(&db, &config.db_path, cascade.active_backend()).await?;
            } else {
                println!("Database: not initialized");
                println!("\nRun `driftnet init` to set up the database.");
            }
        }

        Commands::Review { limit } => {
            let config = Config::load()?;
            let db = driftnet::db::open(&config.db_path)?;
            let items = db.items_pending_review(limit).await?;
            terminal::display_review_queue(&items);
        }

        Commands::Reprocess => {
            let config = Config::load()?;
            let db = driftnet::db::open(&config.db_path)?;
            reprocess(&config, db).await?;
        }

        Commands::Classify { text } => {
            let config = Config::load()?;
            let cascade = build_cascade(&config);
            let moderation = ModerationEngine::new(
                &config.blocklist,
                &config.profanity_patterns,
                config.negative_threshold,
            )?;
            let sentiment = cascade.classify(&text).await;
            let decision = moderation.moderate(&text, Some(sentiment.score));
            terminal::display_classification(
                &text,
                &sentiment,
                cascade.active_backend().as_str(),
                &decision,
            );
        }
    }

    Ok(())
}

/// Build the sentiment cascade, honoring an explicit backend override.
fn build_cascade(config: &Config) -> SentimentCascade {
    match config.sentiment_backend {
        Some(kind) => {
            SentimentCascade::probe_order(&[kind], &config.model_dir, config.label_threshold)
        }
        None => SentimentCascade::probe(&config.model_dir, config.label_threshold),
    }
}

/// Wire the full pipeline from configuration.
fn build_orchestrator(config: &Config, db: Arc<dyn Database>) -> Result<Orchestrator> {
    let cascade = Arc::new(build_cascade(config));
    let keywords = Arc::new(KeywordExtractor::new(
        config.keyword_top_n,
        config.keyword_alphabet,
    ));
    let moderation = Arc::new(ModerationEngine::new(
        &config.blocklist,
        &config.profanity_patterns,
        config.negative_threshold,
    )?);
    let collectors = config.configured_collectors()?;

    Ok(Orchestrator::new(db, cascade, keywords, moderation, collectors))
}

/// Re-run classification and moderation over every stored item, then
/// resolve comments whose parent arrived in a later run.
async fn reprocess(config: &Config, db: Arc<dyn Database>) -> Result<()> {
    let cascade = build_cascade(config);
    let keywords = KeywordExtractor::new(config.keyword_top_n, config.keyword_alphabet);
    let moderation = ModerationEngine::new(
        &config.blocklist,
        &config.profanity_patterns,
        config.negative_threshold,
    )?;

    let items = db.all_items(u32::MAX).await?;
    if items.is_empty() {
        println!("Nothing to reprocess.");
        return Ok(());
    }

    println!(
        "Reprocessing {} items with the {} backend...",
        items.len(),
        cascade.active_backend().as_str()
    );

    let pb = ProgressBar::new(items.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Items [{bar:30}] {pos}/{len} ({eta})")
            .expect("valid template"),
    );

    for item in &items {
        let sentiment = cascade.classify(&item.text).await;
        let decision = moderation.moderate(&item.text, Some(sentiment.score));
        let analysis = ItemAnalysis {
            sentiment_score: sentiment.score,
            sentiment_label: sentiment.label,
            keywords: keywords.extract(&item.text),
            moderation_status: decision.status,
            moderation_reason: decision.reason,
            requires_manual_review: decision.requires_manual_review,
        };
        db.update_item_analysis(item.id, &analysis).await?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    let linked = db.resolve_orphaned_comments().await?;
    println!("Reprocessed {} items.", items.len());
    if linked > 0 {
        println!("Linked {linked} previously orphaned comment(s) to their parents.");
    }

    Ok(())
}
