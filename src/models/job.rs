use super::{Coordinates, Source};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parameters for one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestionRequest {
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_radius_miles")]
    pub radius_miles: u32,
    #[serde(default = "default_sources")]
    pub sources: Vec<Source>,
    /// Per-source cap on fetched items
    #[serde(default = "default_max_listings")]
    pub max_listings: usize,
    /// Optional geofence centre; listings with coordinates outside the radius are dropped
    #[serde(default)]
    pub center: Option<Coordinates>,
}

fn default_location() -> String {
    "Tucson, AZ".to_string()
}

fn default_radius_miles() -> u32 {
    50
}

fn default_sources() -> Vec<Source> {
    vec![Source::CarsCom]
}

fn default_max_listings() -> usize {
    50
}

impl Default for IngestionRequest {
    fn default() -> Self {
        Self {
            location: default_location(),
            radius_miles: default_radius_miles(),
            sources: default_sources(),
            max_listings: default_max_listings(),
            center: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Per-source progress of an ingestion job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceCounts {
    pub source: Source,
    pub fetched: usize,
    /// Items the scraper could not parse
    pub skipped: usize,
    /// Listings that went through normalization, whatever happened after
    pub normalized: usize,
    /// Listings dropped by the geofence
    pub out_of_area: usize,
    pub enriched: usize,
    pub failed: usize,
    pub fetch_error: Option<String>,
}

impl SourceCounts {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            fetched: 0,
            skipped: 0,
            normalized: 0,
            out_of_area: 0,
            enriched: 0,
            failed: 0,
            fetch_error: None,
        }
    }
}

/// Trackable record of one detached pipeline run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestionJob {
    pub job_id: String,
    pub state: JobState,
    pub request: IngestionRequest,
    pub sources: Vec<SourceCounts>,
    pub total_enriched: usize,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl IngestionJob {
    pub fn new(job_id: impl Into<String>, request: IngestionRequest) -> Self {
        Self {
            job_id: job_id.into(),
            state: JobState::Pending,
            request,
            sources: Vec::new(),
            total_enriched: 0,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Replace the counts for `counts.source`, appending if it is new
    pub fn record_source(&mut self, counts: SourceCounts) {
        match self.sources.iter_mut().find(|c| c.source == counts.source) {
            Some(existing) => *existing = counts,
            None => self.sources.push(counts),
        }
        self.total_enriched = self.sources.iter().map(|c| c.enriched).sum();
    }
}
