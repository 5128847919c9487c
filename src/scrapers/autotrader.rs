use crate::models::{FieldMap, Source};
use crate::scrapers::page::{self, first_attr, first_text};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::{FetchReport, ScraperConfig, SearchParams};
use crate::text;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde_json::json;
use std::borrow::Cow;

const BASE_URL: &str = "https://www.autotrader.com";
const CARD_SELECTOR: &str = r#"div[data-cmp="inventoryListing"]"#;
const DEFAULT_ZIP: &str = "85701";

// No geocoding; unmapped locations search around the default ZIP
const ZIP_CODES: &[(&str, &str)] = &[
    ("Tucson, AZ", "85701"),
    ("Phoenix, AZ", "85001"),
    ("Los Angeles, CA", "90001"),
];

/// AutoTrader scraper implementation
pub struct AutoTraderScraper {
    client: Client,
    config: ScraperConfig,
}

impl AutoTraderScraper {
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

    pub fn zip_for(location: &str) -> Cow<'static, str> {
        // A location that already is a ZIP is used as-is
        let trimmed = location.trim();
        if trimmed.len() == 5 && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Cow::Owned(trimmed.to_string());
        }
        Cow::Borrowed(page::lookup(ZIP_CODES, location, DEFAULT_ZIP))
    }

    pub fn search_url(&self, params: &SearchParams) -> String {
        format!(
            "{}/cars-for-sale/all-cars/{}?searchRadius={}",
            self.base_url().trim_end_matches('/'),
            Self::zip_for(&params.location),
            params.radius_miles
        )
    }
}

#[async_trait]
impl ScraperTrait for AutoTraderScraper {
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

        if let Some(title) = first_text(root, "div.item-title") {
            data.insert("title".into(), json!(title));
        }
        if let Some(href) = first_attr(root, "a[href]", "href") {
            data.insert("url".into(), json!(page::absolute_url(self.base_url(), &href)));
        }
        if let Some(price) = first_text(root, "span.item-price").and_then(|p| text::parse_price(&p)) {
            data.insert("price".into(), json!(price));
        }
        if let Some(mileage) = first_text(root, "span.item-mileage").and_then(|m| text::parse_mileage(&m)) {
            data.insert("mileage".into(), json!(mileage));
        }
        if let Some(location) = first_text(root, "span.item-location") {
            data.insert("location".into(), json!(location));
        }

        data
    }

    fn source(&self) -> Source {
        Source::AutoTrader
    }
}
