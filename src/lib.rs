// Driftnet: mention monitoring and triage for public-web content
//
// This is the library root. Each module corresponds to a major subsystem
// of the ingestion-and-triage pipeline.

pub mod collect;
pub mod config;
pub mod db;
pub mod moderation;
pub mod output;
pub mod pipeline;
pub mod sentiment;
pub mod status;
