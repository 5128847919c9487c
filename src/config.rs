use crate::pipeline::PipelineConfig;
use crate::scrapers::ScraperConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Settings read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    // AI / LLM
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,

    // Storage
    pub data_dir: PathBuf,

    // API server
    pub api_host: String,
    pub api_port: u16,
    pub environment: String,
    pub log_level: String,

    // Ingestion defaults
    pub default_location: String,
    pub default_radius_miles: u32,
    pub scraping_delay: Duration,
    pub fetch_timeout: Duration,
    pub classify_timeout: Duration,
    pub max_concurrent_sources: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build from any key lookup; unset or empty keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            data_dir: get("DATA_DIR").unwrap_or_else(|| "./data".to_string()).into(),
            api_host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            api_port: parse_or(&get, "API_PORT", 8000)?,
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            default_location: get("DEFAULT_LOCATION").unwrap_or_else(|| "Tucson, AZ".to_string()),
            default_radius_miles: parse_or(&get, "DEFAULT_RADIUS_MILES", 50)?,
            scraping_delay: Duration::from_millis(parse_or(&get, "SCRAPING_DELAY_MS", 2000)?),
            fetch_timeout: Duration::from_secs(parse_or(&get, "FETCH_TIMEOUT_SECS", 10)?),
            classify_timeout: Duration::from_secs(parse_or(&get, "CLASSIFY_TIMEOUT_SECS", 30)?),
            max_concurrent_sources: parse_or(&get, "MAX_CONCURRENT_SOURCES", 3)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    pub fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            request_delay: self.scraping_delay,
            timeout: self.fetch_timeout,
            ..ScraperConfig::default()
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_concurrent_sources: self.max_concurrent_sources.max(1),
        }
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
            format!("{}...({} chars)", &val[..n], val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  OPENAI_API_KEY: {}", preview(&self.openai_api_key));
        tracing::info!("  OPENAI_MODEL: {}", self.openai_model);
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
        tracing::info!("  ENVIRONMENT: {}", self.environment);
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.api_port, 8000);
        assert_eq!(config.default_location, "Tucson, AZ");
        assert_eq!(config.scraping_delay, Duration::from_millis(2000));
        assert_eq!(config.max_concurrent_sources, 3);
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn api_key_is_required() {
        assert!(AppConfig::from_lookup(lookup(&[])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).is_err());
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let result = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "k"), ("API_PORT", "eighty")]));
        assert!(result.is_err());
    }

    #[test]
    fn scraper_settings_follow_config() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "k"),
            ("SCRAPING_DELAY_MS", "0"),
            ("FETCH_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        let scraper = config.scraper_config();
        assert_eq!(scraper.request_delay, Duration::ZERO);
        assert_eq!(scraper.timeout, Duration::from_secs(3));
        assert!(scraper.base_url.is_none());
    }
}
