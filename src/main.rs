use anyhow::Context;
use intent_scout::api::{self, AppState};
use intent_scout::config::AppConfig;
use intent_scout::enrichment::{Classifier, OpenAiClient};
use intent_scout::models::IngestionRequest;
use intent_scout::pipeline::Pipeline;
use intent_scout::scrapers::ScraperRegistry;
use intent_scout::store::FileStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚗 Intent Scout - Consumer Intent Detector");
    info!("==========================================");
    info!("Environment: {}", config.environment);

    let store = Arc::new(FileStore::new(&config.data_dir));
    info!("💾 Storing documents under {}", config.data_dir.display());

    let scrapers = ScraperRegistry::with_defaults(&config.scraper_config())?;

    let client = OpenAiClient::new(&config.openai_api_key, config.classify_timeout)?
        .with_base_url(&config.openai_base_url);
    let classifier = Arc::new(Classifier::new(
        Arc::new(client),
        &config.openai_model,
        config.classify_timeout,
    ));

    let pipeline = Arc::new(Pipeline::new(
        scrapers,
        classifier,
        store,
        config.pipeline_config(),
    ));

    let state = AppState::new(pipeline).with_defaults(IngestionRequest {
        location: config.default_location.clone(),
        radius_miles: config.default_radius_miles,
        ..IngestionRequest::default()
    });
    let app = api::build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🌐 Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
