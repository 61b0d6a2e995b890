// Pipeline stages: per-source ingestion and the concurrent orchestrator.

pub mod ingest;
pub mod run;

pub use ingest::{ingest_source, upsert, ParentCache};
pub use run::{Orchestrator, RunState, RunSummary};
