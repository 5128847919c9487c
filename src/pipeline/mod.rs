//! Fetch -> normalize -> persist -> enrich -> persist, per source and per listing.

pub mod orchestrator;
pub mod outcome;

pub use orchestrator::{Pipeline, PipelineConfig, StartedJob};
pub use outcome::{ListingOutcome, RunSummary, Stage};
