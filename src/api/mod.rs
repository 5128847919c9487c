//! HTTP surface: start ingestion runs, inspect jobs, query intents.

pub mod error;
pub mod ingestion;
pub mod intents;

pub use error::ApiError;

use crate::models::IngestionRequest;
use crate::pipeline::Pipeline;
use crate::store::StoreGateway;
use axum::{
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<dyn StoreGateway>,
    /// Fills fields a start request leaves out
    pub defaults: IngestionRequest,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let store = Arc::clone(pipeline.store());
        Self {
            pipeline,
            store,
            defaults: IngestionRequest::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: IngestionRequest) -> Self {
        self.defaults = defaults;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/v1/ingestion/start", post(ingestion::start_ingestion))
        .route("/api/v1/ingestion/status", get(ingestion::ingestion_status))
        .route("/api/v1/ingestion/jobs/:job_id", get(ingestion::get_job))
        .route("/api/v1/intents/query", post(intents::query_intents))
        .route("/api/v1/intents/stats/summary", get(intents::stats_summary))
        .route("/api/v1/intents/:intent_id", get(intents::get_intent))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Consumer Intent Detector API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational"
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339()
    }))
}
