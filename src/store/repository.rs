//! Typed access to the listing, intent and job collections.

use crate::error::{PersistenceError, PersistenceResult};
use crate::models::{ConsumerIntent, IngestionJob, IntentType, NormalizedListing, Urgency};
use crate::store::{Query, StoreGateway};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const LISTINGS: &str = "normalized_listings";
pub const INTENTS: &str = "consumer_intents";
pub const JOBS: &str = "ingestion_jobs";

/// Filters for `query_intents`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentQuery {
    /// Matched against the intent's city (first comma segment)
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub intent_type: Option<IntentType>,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_limit() -> usize {
    100
}

impl Default for IntentQuery {
    fn default() -> Self {
        Self {
            location: None,
            intent_type: None,
            min_confidence: default_min_confidence(),
            urgency: None,
            start_date: None,
            end_date: None,
            limit: default_limit(),
        }
    }
}

impl IntentQuery {
    pub const MAX_LIMIT: usize = 1000;

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(format!("min_confidence must be within [0, 1], got {}", self.min_confidence));
        }
        if self.limit == 0 || self.limit > Self::MAX_LIMIT {
            return Err(format!("limit must be within [1, {}], got {}", Self::MAX_LIMIT, self.limit));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err("start_date must not be after end_date".to_string());
            }
        }
        Ok(())
    }

    /// City a location filter resolves to
    pub fn city(&self) -> Option<&str> {
        self.location
            .as_deref()
            .and_then(|l| l.split(',').next())
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn to_query(&self) -> Query {
        let mut query = Query::new()
            .gte("confidence_score", self.min_confidence)
            .order_by_desc("detected_at")
            .limit(self.limit);
        if let Some(city) = self.city() {
            query = query.eq("city", city);
        }
        if let Some(intent_type) = self.intent_type {
            query = query.eq("intent_type", intent_type.as_str());
        }
        if let Some(urgency) = self.urgency {
            query = query.eq("urgency", urgency.as_str());
        }
        if let Some(start) = self.start_date {
            query = query.gte("detected_at", start.to_rfc3339());
        }
        if let Some(end) = self.end_date {
            query = query.lte("detected_at", end.to_rfc3339());
        }
        query
    }
}

/// Aggregate figures over stored intents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentStats {
    pub total_intents: usize,
    pub high_urgency_count: usize,
    pub avg_confidence: f64,
}

pub async fn save_listing(store: &dyn StoreGateway, listing: &NormalizedListing) -> PersistenceResult<()> {
    store
        .upsert(LISTINGS, &listing.listing_id, serde_json::to_value(listing)?)
        .await
}

pub async fn get_listing(store: &dyn StoreGateway, listing_id: &str) -> PersistenceResult<Option<NormalizedListing>> {
    get_typed(store, LISTINGS, listing_id).await
}

pub async fn save_intent(store: &dyn StoreGateway, intent: &ConsumerIntent) -> PersistenceResult<()> {
    store
        .upsert(INTENTS, &intent.intent_id, serde_json::to_value(intent)?)
        .await
}

pub async fn get_intent(store: &dyn StoreGateway, intent_id: &str) -> PersistenceResult<Option<ConsumerIntent>> {
    get_typed(store, INTENTS, intent_id).await
}

pub async fn save_job(store: &dyn StoreGateway, job: &IngestionJob) -> PersistenceResult<()> {
    store.upsert(JOBS, &job.job_id, serde_json::to_value(job)?).await
}

pub async fn get_job(store: &dyn StoreGateway, job_id: &str) -> PersistenceResult<Option<IngestionJob>> {
    get_typed(store, JOBS, job_id).await
}

/// Matching intents, newest first. Documents that no longer decode are skipped.
pub async fn query_intents(store: &dyn StoreGateway, filter: &IntentQuery) -> PersistenceResult<Vec<ConsumerIntent>> {
    let documents = store.query(INTENTS, &filter.to_query()).await?;
    Ok(documents
        .into_iter()
        .filter_map(|doc| match serde_json::from_value::<ConsumerIntent>(doc) {
            Ok(intent) => Some(intent),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable intent document");
                None
            }
        })
        .filter(|intent| intent.confidence_score.value() >= filter.min_confidence)
        .collect())
}

pub async fn intent_stats(store: &dyn StoreGateway) -> PersistenceResult<IntentStats> {
    let documents = store.query(INTENTS, &Query::new()).await?;
    let mut total = 0usize;
    let mut high = 0usize;
    let mut confidence_sum = 0.0;
    for doc in &documents {
        let Some(score) = doc.get("confidence_score").and_then(Value::as_f64) else {
            continue;
        };
        total += 1;
        confidence_sum += score;
        if doc.get("urgency").and_then(Value::as_str) == Some(Urgency::High.as_str()) {
            high += 1;
        }
    }
    Ok(IntentStats {
        total_intents: total,
        high_urgency_count: high,
        avg_confidence: if total == 0 { 0.0 } else { confidence_sum / total as f64 },
    })
}

async fn get_typed<T: DeserializeOwned>(
    store: &dyn StoreGateway,
    collection: &str,
    key: &str,
) -> PersistenceResult<Option<T>> {
    let Some(doc) = store.get(collection, key).await? else {
        return Ok(None);
    };
    serde_json::from_value(doc)
        .map(Some)
        .map_err(|e| PersistenceError::Corrupt {
            collection: collection.to_string(),
            key: key.to_string(),
            reason: e.to_string(),
        })
}
