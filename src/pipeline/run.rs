// Orchestrator — runs every configured collector concurrently and guards
// against overlapping runs.
//
// Per-source pipelines are independent futures polled together on the
// coordinator; a source that fails records its own run log error and never
// cancels its siblings. The run summary is logged, not persisted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::collect::Collector;
use crate::db::models::RunStatus;
use crate::db::Database;
use crate::moderation::ModerationEngine;
use crate::sentiment::{KeywordExtractor, SentimentCascade};

use super::ingest;

/// Re-entrancy guard owned by the orchestrator. A trigger that fires while
/// a run is active is skipped, never queued.
#[derive(Debug, Default)]
pub struct RunState {
    active: AtomicBool,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the run slot. Returns false when a run is already active.
    pub fn try_begin(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn end(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Aggregate outcome of one full run, for logging and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sources_attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub new_items: usize,
    pub duration: Duration,
}

pub struct Orchestrator {
    db: Arc<dyn Database>,
    cascade: Arc<SentimentCascade>,
    keywords: Arc<KeywordExtractor>,
    moderation: Arc<ModerationEngine>,
    collectors: Vec<Box<dyn Collector>>,
    state: RunState,
}

impl Orchestrator {
    pub fn new(
        db: Arc<dyn Database>,
        cascade: Arc<SentimentCascade>,
        keywords: Arc<KeywordExtractor>,
        moderation: Arc<ModerationEngine>,
        collectors: Vec<Box<dyn Collector>>,
    ) -> Self {
        Self {
            db,
            cascade,
            keywords,
            moderation,
            collectors,
            state: RunState::new(),
        }
    }

    pub fn sources(&self) -> usize {
        self.collectors.len()
    }

    /// Run every configured source once, concurrently. Returns `None` when
    /// a run was already active (the trigger is skipped, not queued).
    pub async fn run_all(&self, include_comments: bool) -> Result<Option<RunSummary>> {
        if !self.state.try_begin() {
            warn!("Run already in progress, skipping this trigger");
            return Ok(None);
        }

        let started = Instant::now();
        info!(sources = self.collectors.len(), "Run started");

        // One future per source, polled together. Each catches its own
        // error at the source boundary.
        let futures = self
            .collectors
            .iter()
            .map(|collector| self.run_source(collector.as_ref(), include_comments));
        let results: Vec<Result<usize>> = join_all(futures).await;

        self.state.end();

        let mut summary = RunSummary {
            sources_attempted: results.len(),
            succeeded: 0,
            failed: 0,
            new_items: 0,
            duration: started.elapsed(),
        };
        for result in results {
            match result {
                Ok(count) => {
                    summary.succeeded += 1;
                    summary.new_items += count;
                }
                Err(_) => summary.failed += 1,
            }
        }

        info!(
            attempted = summary.sources_attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            new_items = summary.new_items,
            duration_ms = summary.duration.as_millis() as u64,
            "Run finished"
        );
        Ok(Some(summary))
    }

    /// One source's run: open a run log, ingest, close the run log with a
    /// terminal status. The returned error never crosses to other sources.
    async fn run_source(&self, collector: &dyn Collector, include_comments: bool) -> Result<usize> {
        let source = collector.source();
        let run_id = self.db.insert_run_log(source).await?;

        match ingest::ingest_source(
            self.db.as_ref(),
            collector,
            &self.cascade,
            &self.keywords,
            &self.moderation,
            include_comments,
        )
        .await
        {
            Ok(inserted) => {
                self.db
                    .finalize_run_log(run_id, RunStatus::Success, inserted as i64, None)
                    .await?;
                Ok(inserted)
            }
            Err(e) => {
                error!(source = source.as_str(), error = %e, "Source run failed");
                self.db
                    .finalize_run_log(run_id, RunStatus::Error, 0, Some(&e.to_string()))
                    .await?;
                Err(e)
            }
        }
    }

    /// Run on a fixed interval until the process is stopped. Each tick
    /// submits a run task whose outcome lands in the run logs; ticks that
    /// fire mid-run are skipped by the guard.
    pub async fn run_forever(self: Arc<Self>, interval: Duration, include_comments: bool) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let orchestrator = Arc::clone(&self);
            let handle = tokio::spawn(async move {
                if let Err(e) = orchestrator.run_all(include_comments).await {
                    error!(error = %e, "Scheduled run failed");
                }
            });
            // Observable completion: a panicked run task is logged, the
            // schedule keeps going.
            if let Err(e) = handle.await {
                error!(error = %e, "Run task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_guards_reentry() {
        let state = RunState::new();
        assert!(state.try_begin());
        assert!(!state.try_begin());
        state.end();
        assert!(state.try_begin());
    }

    #[test]
    fn test_run_state_reports_active() {
        let state = RunState::new();
        assert!(!state.is_active());
        state.try_begin();
        assert!(state.is_active());
        state.end();
        assert!(!state.is_active());
    }
}
