use crate::enrichment::Classifier;
use crate::geo;
use crate::ids;
use crate::models::{Coordinates, IngestionJob, IngestionRequest, JobState, RawListing, Source, SourceCounts};
use crate::normalizer;
use crate::pipeline::outcome::{ListingOutcome, RunSummary, Stage};
use crate::scrapers::{ScraperRegistry, SearchParams};
use crate::store::{repository, StoreGateway};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on sources fetched at the same time
    pub max_concurrent_sources: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sources: 3,
        }
    }
}

/// A job that has been accepted and is running in the background
pub struct StartedJob {
    /// Job record as first written (state `pending`)
    pub job: IngestionJob,
    /// Resolves to the final job record
    pub handle: JoinHandle<IngestionJob>,
}

/// Drives scrapers, the normalizer and the classifier, writing to the store.
///
/// Failures are isolated per listing and per source; nothing short of a
/// panic ends a run early.
pub struct Pipeline {
    scrapers: ScraperRegistry,
    classifier: Arc<Classifier>,
    store: Arc<dyn StoreGateway>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        scrapers: ScraperRegistry,
        classifier: Arc<Classifier>,
        store: Arc<dyn StoreGateway>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            scrapers,
            classifier,
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn StoreGateway> {
        &self.store
    }

    /// Record a pending job and run it detached from the caller.
    pub async fn start(self: &Arc<Self>, request: IngestionRequest) -> StartedJob {
        let job = IngestionJob::new(ids::job_id(), request);
        self.save_job(&job).await;

        info!("🚀 Starting ingestion {} for {}", job.job_id, job.request.location);

        let pipeline = Arc::clone(self);
        let pending = job.clone();
        let handle = tokio::spawn(async move { pipeline.run_job(pending).await });

        StartedJob { job, handle }
    }

    /// Run a job to completion, persisting its progress after every source.
    pub async fn run_job(self: Arc<Self>, mut job: IngestionJob) -> IngestionJob {
        job.state = JobState::Running;
        job.started_at = Some(Utc::now());
        self.save_job(&job).await;

        let request = job.request.clone();
        let summary = self.run_with_progress(&request, Some(&mut job)).await;

        let all_failed = !summary.sources.is_empty()
            && summary.total_enriched == 0
            && summary.sources.iter().all(|s| s.fetch_error.is_some());
        job.state = if all_failed {
            job.error = Some("every requested source failed".to_string());
            JobState::Failed
        } else {
            JobState::Completed
        };
        job.finished_at = Some(Utc::now());
        self.save_job(&job).await;

        job
    }

    /// Run every requested source with bounded concurrency.
    pub async fn run(self: &Arc<Self>, request: &IngestionRequest) -> RunSummary {
        self.run_with_progress(request, None).await
    }

    async fn run_with_progress(
        self: &Arc<Self>,
        request: &IngestionRequest,
        mut job: Option<&mut IngestionJob>,
    ) -> RunSummary {
        let mut sources: Vec<Source> = Vec::new();
        for source in &request.sources {
            if !sources.contains(source) {
                sources.push(*source);
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_sources.max(1)));
        let mut tasks = JoinSet::new();
        for source in sources.iter().copied() {
            let pipeline = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            let request = request.clone();
            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                pipeline.run_source(source, &request).await
            });
        }

        let mut reports = Vec::with_capacity(sources.len());
        while let Some(joined) = tasks.join_next().await {
            let counts = match joined {
                Ok(counts) => counts,
                Err(e) => {
                    error!(error = %e, "Source task aborted");
                    continue;
                }
            };
            if let Some(job) = job.as_deref_mut() {
                job.record_source(counts.clone());
                self.save_job(job).await;
            }
            reports.push(counts);
        }
        reports.sort_by_key(|c| c.source);

        let total_enriched = reports.iter().map(|c| c.enriched).sum();
        info!("✅ Ingestion complete: {} consumer intents detected", total_enriched);

        RunSummary {
            sources: reports,
            total_enriched,
        }
    }

    /// Fetch one source and process each of its listings in turn.
    pub async fn run_source(&self, source: Source, request: &IngestionRequest) -> SourceCounts {
        let mut counts = SourceCounts::new(source);

        let Some(scraper) = self.scrapers.get(source) else {
            warn!(%source, "No scraper registered for source");
            counts.fetch_error = Some(format!("no scraper registered for {}", source));
            return counts;
        };

        info!("📥 Fetching listings from {}...", source);
        let params = SearchParams {
            location: request.location.clone(),
            radius_miles: request.radius_miles,
            max_results: request.max_listings,
        };
        let report = scraper.fetch_listings(&params).await;

        counts.fetched = report.listings.len();
        counts.skipped = report.skipped;
        if let Some(failure) = &report.failure {
            error!(%source, error = %failure, "Error fetching listings");
            counts.fetch_error = Some(failure.to_string());
        }

        info!("🔄 Normalizing {} listings from {}...", report.listings.len(), source);
        let geofence = request
            .center
            .map(|center| (center, f64::from(request.radius_miles)));
        for raw in &report.listings {
            let outcome = self.process_listing(raw, geofence).await;
            if let ListingOutcome::Skipped { listing_id, stage, reason } = &outcome {
                warn!(%source, %listing_id, %stage, %reason, "Failed to process listing");
            }
            counts.record(&outcome);
        }

        info!(
            "{}: {} fetched, {} enriched, {} failed",
            source, counts.fetched, counts.enriched, counts.failed
        );
        counts
    }

    /// Normalize, persist, classify and persist one listing.
    pub async fn process_listing(
        &self,
        raw: &RawListing,
        geofence: Option<(Coordinates, f64)>,
    ) -> ListingOutcome {
        let listing = normalizer::normalize(raw);
        let listing_id = listing.listing_id.clone();

        if let (Some((center, radius)), Some(point)) = (geofence, listing.coordinates()) {
            if !geo::within_radius(center, point, radius) {
                return ListingOutcome::OutOfArea { listing_id };
            }
        }

        if let Err(e) = repository::save_listing(self.store.as_ref(), &listing).await {
            return ListingOutcome::Skipped {
                listing_id,
                stage: Stage::PersistListing,
                reason: e.to_string(),
            };
        }

        info!("🤖 Enriching with AI: {}...", listing_id);
        let intent = match self.classifier.classify(&listing).await {
            Ok(intent) => intent,
            Err(e) => {
                return ListingOutcome::Skipped {
                    listing_id,
                    stage: Stage::Classify,
                    reason: e.to_string(),
                }
            }
        };

        if let Err(e) = repository::save_intent(self.store.as_ref(), &intent).await {
            return ListingOutcome::Skipped {
                listing_id,
                stage: Stage::PersistIntent,
                reason: e.to_string(),
            };
        }

        ListingOutcome::Enriched {
            listing_id,
            intent_id: intent.intent_id,
        }
    }

    async fn save_job(&self, job: &IngestionJob) {
        if let Err(e) = repository::save_job(self.store.as_ref(), job).await {
            warn!(job_id = %job.job_id, error = %e, "Failed to record job progress");
        }
    }
}
