#![allow(dead_code)]

use async_trait::async_trait;
use intent_scout::enrichment::{ChatRequest, Classifier, CompletionClient};
use intent_scout::error::{EnrichmentError, FetchError, PersistenceError, PersistenceResult};
use intent_scout::models::{FieldMap, RawListing, Source};
use intent_scout::pipeline::{Pipeline, PipelineConfig};
use intent_scout::scrapers::{FetchReport, ScraperRegistry, ScraperTrait, SearchParams};
use intent_scout::store::{MemoryStore, Query, StoreGateway};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scraper that serves fixed items, optionally ending with a page failure.
pub struct FakeScraper {
    pub source: Source,
    pub items: Vec<Value>,
    pub fail: bool,
    pub delay: Duration,
    pub in_flight: Option<Arc<InFlight>>,
}

impl FakeScraper {
    pub fn new(source: Source, items: Vec<Value>) -> Self {
        Self {
            source,
            items,
            fail: false,
            delay: Duration::ZERO,
            in_flight: None,
        }
    }

    pub fn failing(source: Source) -> Self {
        Self {
            fail: true,
            ..Self::new(source, vec![])
        }
    }
}

/// Tracks the peak number of concurrent fetches.
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    pub peak: AtomicUsize,
}

#[async_trait]
impl ScraperTrait for FakeScraper {
    async fn fetch_listings(&self, params: &SearchParams) -> FetchReport {
        if let Some(counter) = &self.in_flight {
            let now = counter.current.fetch_add(1, Ordering::SeqCst) + 1;
            counter.peak.fetch_max(now, Ordering::SeqCst);
        }
        tokio::time::sleep(self.delay).await;
        if let Some(counter) = &self.in_flight {
            counter.current.fetch_sub(1, Ordering::SeqCst);
        }

        if self.fail {
            return FetchReport::failed(FetchError::Status {
                url: format!("https://{}/search", self.source),
                status: 503,
            });
        }
        let listings = self
            .items
            .iter()
            .take(params.max_results)
            .map(|item| {
                let data = self.parse_listing(&item.to_string());
                let url = data.get("url").and_then(Value::as_str).unwrap_or_default().to_string();
                RawListing::new(self.source, url, data)
            })
            .collect();
        FetchReport {
            listings,
            ..Default::default()
        }
    }

    fn parse_listing(&self, fragment: &str) -> FieldMap {
        serde_json::from_str(fragment).unwrap_or_default()
    }

    fn source(&self) -> Source {
        self.source
    }
}

/// Scraper whose fetch panics.
pub struct PanickingScraper(pub Source);

#[async_trait]
impl ScraperTrait for PanickingScraper {
    async fn fetch_listings(&self, _params: &SearchParams) -> FetchReport {
        panic!("scraper blew up");
    }

    fn parse_listing(&self, _fragment: &str) -> FieldMap {
        FieldMap::new()
    }

    fn source(&self) -> Source {
        self.0
    }
}

/// Completion client that answers by listing title:
/// "Broken" gets prose, "Lowball" gets 0.3 confidence, anything else 0.85.
#[derive(Default)]
pub struct ScriptedClient {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let context = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let title = context
            .lines()
            .find_map(|line| line.strip_prefix("Title: "))
            .unwrap_or_default();

        if title.contains("Broken") {
            return Ok("I think this seller is motivated.".to_string());
        }
        let confidence = if title.contains("Lowball") { 0.3 } else { 0.85 };
        Ok(json!({
            "urgency": "high",
            "confidence_score": confidence,
            "purchase_timeline": "within 2 weeks",
            "budget_min": 15000,
            "budget_max": 20000,
            "keywords": ["sedan", "low miles"],
            "preferences": {"body": "sedan"}
        })
        .to_string())
    }
}

pub fn item(title: &str, url: &str) -> Value {
    json!({
        "title": title,
        "url": url,
        "price": "$18,500",
        "mileage": "42,000 mi.",
        "location": "Tucson, AZ",
        "seller_type": "dealer"
    })
}

pub struct Harness {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<MemoryStore>,
    pub client: Arc<ScriptedClient>,
}

pub fn harness(registry: ScraperRegistry) -> Harness {
    harness_with(registry, PipelineConfig::default())
}

pub fn harness_with(registry: ScraperRegistry, config: PipelineConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    build(registry, config, store.clone(), store)
}

/// Harness whose `collection` writes fail for documents titled with `marker`.
/// `Harness::store` still sees every write that went through.
pub fn failing_harness(registry: ScraperRegistry, collection: &'static str, marker: &'static str) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(FailingStore {
        inner: store.clone(),
        collection,
        marker,
    });
    build(registry, PipelineConfig::default(), gateway, store)
}

fn build(
    registry: ScraperRegistry,
    config: PipelineConfig,
    gateway: Arc<dyn StoreGateway>,
    store: Arc<MemoryStore>,
) -> Harness {
    let client = Arc::new(ScriptedClient::default());
    let classifier = Arc::new(Classifier::new(
        client.clone(),
        "test-model",
        Duration::from_secs(5),
    ));
    let pipeline = Arc::new(Pipeline::new(registry, classifier, gateway, config));
    Harness {
        pipeline,
        store,
        client,
    }
}

/// Store that rejects upserts into one collection for matching titles.
pub struct FailingStore {
    inner: Arc<MemoryStore>,
    collection: &'static str,
    marker: &'static str,
}

#[async_trait]
impl StoreGateway for FailingStore {
    async fn upsert(&self, collection: &str, key: &str, document: Value) -> PersistenceResult<()> {
        let title = document
            .get("title")
            .or_else(|| document.pointer("/source_listing/title"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if collection == self.collection && title.contains(self.marker) {
            return Err(PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.upsert(collection, key, document).await
    }

    async fn get(&self, collection: &str, key: &str) -> PersistenceResult<Option<Value>> {
        self.inner.get(collection, key).await
    }

    async fn query(&self, collection: &str, query: &Query) -> PersistenceResult<Vec<Value>> {
        self.inner.query(collection, query).await
    }
}
