use crate::models::{FieldMap, Source};
use crate::scrapers::page::{self, first_attr, first_text};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::{FetchReport, ScraperConfig, SearchParams};
use crate::text;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde_json::{json, Value};

const BASE_URL: &str = "https://www.cars.com";
const CARD_SELECTOR: &str = "div.vehicle-card";

/// Cars.com scraper implementation
pub struct CarsComScraper {
    client: Client,
    config: ScraperConfig,
}

impl CarsComScraper {
    pub fn new() -> Result<Self> {
        Self::with_config(ScraperConfig::default())
    }

    pub fn with_config(config: ScraperConfig) -> Result<Self> {
        let client = page::build_client(&config)?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(BASE_URL)
    }

    /// `"Tucson, AZ"` -> `"tucson-az"`
    pub fn location_slug(location: &str) -> String {
        location
            .trim()
            .to_lowercase()
            .replace(", ", "-")
            .replace([' ', ','], "-")
    }

    pub fn search_url(&self, params: &SearchParams) -> String {
        format!(
            "{}/shopping/results/?stock_type=all&makes[]=&models[]=&list_price_max=&maximum_distance={}&zip={}",
            self.base_url().trim_end_matches('/'),
            params.radius_miles,
            Self::location_slug(&params.location)
        )
    }
}

#[async_trait]
impl ScraperTrait for CarsComScraper {
    async fn fetch_listings(&self, params: &SearchParams) -> FetchReport {
        let url = self.search_url(params);
        page::scrape_results(
            self,
            &self.client,
            &url,
            CARD_SELECTOR,
            params.max_results,
            self.config.request_delay,
        )
        .await
    }

    fn parse_listing(&self, fragment: &str) -> FieldMap {
        let doc = Html::parse_fragment(fragment);
        let root = doc.root_element();
        let mut data = FieldMap::new();

        if let Some(title) = first_text(root, "h2.title a").or_else(|| first_text(root, "h2.title")) {
            data.insert("title".into(), json!(title));
        }
        if let Some(href) = first_attr(root, "h2.title a", "href") {
            data.insert("url".into(), json!(page::absolute_url(self.base_url(), &href)));
        }
        if let Some(price) = first_text(root, "span.primary-price").and_then(|p| text::parse_price(&p)) {
            data.insert("price".into(), json!(price));
        }
        if let Some(mileage) = first_text(root, "div.mileage").and_then(|m| text::parse_mileage(&m)) {
            data.insert("mileage".into(), json!(mileage));
        }
        if let Some(location) = first_text(root, "div.miles-from") {
            data.insert("location".into(), json!(location));
        }
        if let Some(dealer) = first_text(root, "div.dealer-name") {
            data.insert("seller_name".into(), json!(dealer));
            data.insert("seller_type".into(), json!("dealer"));
        }
        if let Some(src) = first_attr(root, "img.vehicle-image", "src") {
            data.insert("images".into(), Value::Array(vec![json!(src)]));
        }

        data
    }

    fn source(&self) -> Source {
        Source::CarsCom
    }
}
