use crate::api::{ApiError, AppState};
use crate::error::PersistenceError;
use crate::models::{Coordinates, IngestionJob, IngestionRequest, Source};
use crate::store::repository;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// Body of a start request; absent fields take the server defaults.
#[derive(Debug, Default, Deserialize)]
pub struct StartIngestion {
    pub location: Option<String>,
    pub radius_miles: Option<u32>,
    pub sources: Option<Vec<Source>>,
    pub max_listings: Option<usize>,
    pub center: Option<Coordinates>,
}

impl StartIngestion {
    pub fn into_request(self, defaults: &IngestionRequest) -> IngestionRequest {
        IngestionRequest {
            location: self.location.unwrap_or_else(|| defaults.location.clone()),
            radius_miles: self.radius_miles.unwrap_or(defaults.radius_miles),
            sources: self.sources.unwrap_or_else(|| defaults.sources.clone()),
            max_listings: self.max_listings.unwrap_or(defaults.max_listings),
            center: self.center.or(defaults.center),
        }
    }
}

const MAX_LISTINGS_PER_SOURCE: usize = 500;

fn validate(request: &IngestionRequest) -> Result<(), ApiError> {
    if request.location.trim().is_empty() {
        return Err(ApiError::BadRequest("location must not be empty".into()));
    }
    if request.sources.is_empty() {
        return Err(ApiError::BadRequest("at least one source is required".into()));
    }
    if request.max_listings == 0 || request.max_listings > MAX_LISTINGS_PER_SOURCE {
        return Err(ApiError::BadRequest(format!(
            "max_listings must be within [1, {}]",
            MAX_LISTINGS_PER_SOURCE
        )));
    }
    Ok(())
}

/// Accept an ingestion request and return before any fetching happens.
pub async fn start_ingestion(
    State(state): State<AppState>,
    Json(body): Json<StartIngestion>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request = body.into_request(&state.defaults);
    validate(&request)?;

    let started = state.pipeline.start(request).await;
    let job = started.job;
    info!(job_id = %job.job_id, "Ingestion accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "accepted",
            "job_id": job.job_id,
            "message": format!("Data ingestion initiated for {}", job.request.location),
            "location": job.request.location,
            "radius_miles": job.request.radius_miles,
            "sources": job.request.sources,
            "max_listings": job.request.max_listings,
        })),
    ))
}

pub async fn ingestion_status() -> Json<Value> {
    Json(json!({
        "status": "operational",
        "message": "Use POST /api/v1/ingestion/start to begin data collection, then GET /api/v1/ingestion/jobs/{job_id}"
    }))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<IngestionJob>, ApiError> {
    repository::get_job(state.store.as_ref(), &job_id)
        .await
        .map_err(lookup_error("job"))?
        .map(Json)
        .ok_or(ApiError::NotFound("job"))
}

/// Ids that cannot be store keys cannot exist either.
pub(crate) fn lookup_error(entity: &'static str) -> impl Fn(PersistenceError) -> ApiError {
    move |e| match e {
        PersistenceError::InvalidKey(_) => ApiError::NotFound(entity),
        other => ApiError::Persistence(other),
    }
}
