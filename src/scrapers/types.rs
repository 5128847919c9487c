use crate::error::FetchError;
use crate::models::RawListing;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Search parameters for one `fetch_listings` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Free-text location, e.g. "Tucson, AZ"
    pub location: String,
    pub radius_miles: u32,
    /// Maximum number of items to parse from the results page
    pub max_results: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            location: "Tucson, AZ".to_string(),
            radius_miles: 50,
            max_results: 50,
        }
    }
}

/// Read-only settings shared by every scraper instance
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Overrides the source's public base URL (used for local fixtures)
    pub base_url: Option<String>,
    /// Pause between successive items within one fetch
    pub request_delay: Duration,
    /// Timeout for the results page request
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(10),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

/// Outcome of one `fetch_listings` call
#[derive(Debug, Default)]
pub struct FetchReport {
    pub listings: Vec<RawListing>,
    /// Items dropped because they could not be parsed
    pub skipped: usize,
    /// Page-level failure that ended the fetch early
    pub failure: Option<FetchError>,
}

impl FetchReport {
    pub fn failed(failure: FetchError) -> Self {
        Self {
            listings: Vec::new(),
            skipped: 0,
            failure: Some(failure),
        }
    }
}
