use super::Source;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque source-specific fields extracted from one listing fragment
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One listing as fetched from a source, before normalization.
///
/// Transport object for a single pipeline run; never written to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    pub source: Source,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
    /// Markup fragment the fields were parsed from, kept for debugging
    pub raw_html: Option<String>,
    pub raw_data: FieldMap,
}

impl RawListing {
    pub fn new(source: Source, url: impl Into<String>, raw_data: FieldMap) -> Self {
        Self {
            source,
            url: url.into(),
            scraped_at: Utc::now(),
            raw_html: None,
            raw_data,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.raw_html = Some(html.into());
        self
    }
}

/// Canonical listing schema shared by every source.
///
/// Numeric fields are `None` when unknown, never zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedListing {
    pub listing_id: String,
    pub source: Source,
    pub url: String,

    // Vehicle details
    pub title: String,
    pub price: Option<f64>,
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub mileage: Option<u64>,
    pub condition: Option<String>,

    // Location
    pub location: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    // Seller and contact
    pub seller_name: Option<String>,
    pub seller_type: String,
    pub phone: Option<String>,
    pub email: Option<String>,

    // Metadata
    pub description: Option<String>,
    pub images: Vec<String>,
    pub listing_date: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
}

impl NormalizedListing {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    pub fn has_contact(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
            || self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}
