use crate::api::ingestion::lookup_error;
use crate::api::{ApiError, AppState};
use crate::models::ConsumerIntent;
use crate::store::{repository, IntentQuery, IntentStats};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

pub async fn query_intents(
    State(state): State<AppState>,
    Json(filter): Json<IntentQuery>,
) -> Result<Json<Value>, ApiError> {
    filter.validate().map_err(ApiError::BadRequest)?;

    let intents = repository::query_intents(state.store.as_ref(), &filter).await?;
    info!("📊 Query returned {} consumer intents", intents.len());

    Ok(Json(json!({
        "total_results": intents.len(),
        "filters_applied": {
            "location": filter.location,
            "intent_type": filter.intent_type,
            "min_confidence": filter.min_confidence,
            "urgency": filter.urgency,
        },
        "intents": intents,
    })))
}

pub async fn get_intent(
    State(state): State<AppState>,
    Path(intent_id): Path<String>,
) -> Result<Json<ConsumerIntent>, ApiError> {
    repository::get_intent(state.store.as_ref(), &intent_id)
        .await
        .map_err(lookup_error("intent"))?
        .map(Json)
        .ok_or(ApiError::NotFound("intent"))
}

pub async fn stats_summary(State(state): State<AppState>) -> Result<Json<IntentStats>, ApiError> {
    Ok(Json(repository::intent_stats(state.store.as_ref()).await?))
}
