use crate::models::SourceCounts;
use serde::Serialize;
use std::fmt;

/// Pipeline step a listing failed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PersistListing,
    Classify,
    PersistIntent,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::PersistListing => "persist_listing",
            Stage::Classify => "classify",
            Stage::PersistIntent => "persist_intent",
        })
    }
}

/// What happened to one raw listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ListingOutcome {
    Enriched { listing_id: String, intent_id: String },
    /// Outside the requested geofence; not persisted
    OutOfArea { listing_id: String },
    Skipped { listing_id: String, stage: Stage, reason: String },
}

impl ListingOutcome {
    pub fn is_enriched(&self) -> bool {
        matches!(self, ListingOutcome::Enriched { .. })
    }

    pub fn listing_id(&self) -> &str {
        match self {
            ListingOutcome::Enriched { listing_id, .. }
            | ListingOutcome::OutOfArea { listing_id }
            | ListingOutcome::Skipped { listing_id, .. } => listing_id,
        }
    }
}

/// Totals for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub sources: Vec<SourceCounts>,
    pub total_enriched: usize,
}

impl SourceCounts {
    /// Fold one listing outcome into the per-source counts
    pub fn record(&mut self, outcome: &ListingOutcome) {
        // Normalization never fails, so every outcome went through it
        self.normalized += 1;
        match outcome {
            ListingOutcome::Enriched { .. } => self.enriched += 1,
            ListingOutcome::OutOfArea { .. } => self.out_of_area += 1,
            ListingOutcome::Skipped { .. } => self.failed += 1,
        }
    }
}
