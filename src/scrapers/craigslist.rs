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

const ITEM_SELECTOR: &str = "li.result-row";
const DEFAULT_SUBDOMAIN: &str = "tucson";

const SUBDOMAINS: &[(&str, &str)] = &[
    ("Tucson, AZ", "tucson"),
    ("Phoenix, AZ", "phoenix"),
    ("Los Angeles, CA", "losangeles"),
];

/// Craigslist cars+trucks scraper implementation
pub struct CraigslistScraper {
    client: Client,
    config: ScraperConfig,
}

impl CraigslistScraper {
    pub fn new() -> Result<Self> {
        Self::with_config(ScraperConfig::default())
    }

    pub fn with_config(config: ScraperConfig) -> Result<Self> {
        let client = page::build_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn subdomain_for(location: &str) -> &'static str {
        page::lookup(SUBDOMAINS, location, DEFAULT_SUBDOMAIN)
    }

    pub fn search_url(&self, params: &SearchParams) -> String {
        let subdomain = Self::subdomain_for(&params.location);
        match &self.config.base_url {
            Some(base) => format!("{}/search/cta?area={}", base.trim_end_matches('/'), subdomain),
            None => format!("https://{}.craigslist.org/search/cta", subdomain),
        }
    }
}

#[async_trait]
impl ScraperTrait for CraigslistScraper {
    async fn fetch_listings(&self, params: &SearchParams) -> FetchReport {
        let url = self.search_url(params);
        page::scrape_results(
            self,
            &self.client,
            &url,
            ITEM_SELECTOR,
            params.max_results,
            self.config.request_delay,
        )
        .await
    }

    fn parse_listing(&self, fragment: &str) -> FieldMap {
        let doc = Html::parse_fragment(fragment);
        let root = doc.root_element();
        let mut data = FieldMap::new();

        if let Some(title) = first_text(root, "a.result-title") {
            data.insert("title".into(), json!(title));
        }
        if let Some(href) = first_attr(root, "a.result-title", "href") {
            data.insert("url".into(), json!(href));
        }
        if let Some(price) = first_text(root, "span.result-price").and_then(|p| text::parse_price(&p)) {
            data.insert("price".into(), json!(price));
        }
        if let Some(hood) = first_text(root, "span.result-hood") {
            let hood = hood.trim_start_matches('(').trim_end_matches(')').trim();
            if !hood.is_empty() {
                data.insert("location".into(), json!(hood));
            }
        }
        if let Some(date) = first_attr(root, "time.result-date", "datetime") {
            data.insert("listing_date".into(), json!(date));
        }

        // Private sellers sometimes put contact details straight in the post text
        let body = text::clean(&root.text().collect::<Vec<_>>().join(" "));
        if let Some(phone) = text::extract_phone(&body) {
            data.insert("phone".into(), json!(phone));
        }
        if let Some(email) = text::extract_email(&body) {
            data.insert("email".into(), json!(email));
        }
        data.insert("seller_type".into(), json!("private"));

        data
    }

    fn source(&self) -> Source {
        Source::Craigslist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_result_row() {
        let scraper = CraigslistScraper::new().unwrap();
        let data = scraper.parse_listing(
            r#"<li class="result-row">
                 <time class="result-date" datetime="2024-03-01 14:30">Mar 1</time>
                 <a class="result-title" href="https://tucson.craigslist.org/cto/d/1234.html">2012 Jeep Wrangler - call 520-555-0199</a>
                 <span class="result-price">$15,000</span>
                 <span class="result-hood"> (Oro Valley, AZ)</span>
               </li>"#,
        );
        assert_eq!(data["url"], "https://tucson.craigslist.org/cto/d/1234.html");
        assert_eq!(data["price"], 15000.0);
        assert_eq!(data["location"], "Oro Valley, AZ");
        assert_eq!(data["listing_date"], "2024-03-01 14:30");
        assert_eq!(data["phone"], "520-555-0199");
        assert!(data.get("email").is_none());
    }

    #[test]
    fn row_without_title_fails_item_parse() {
        let scraper = CraigslistScraper::new().unwrap();
        let result = scraper.parse_item(r#"<li class="result-row"><span class="result-price">$900</span></li>"#);
        assert!(result.is_err());
    }

    #[test]
    fn subdomain_lookup_falls_back() {
        assert_eq!(CraigslistScraper::subdomain_for("Los Angeles, CA"), "losangeles");
        assert_eq!(CraigslistScraper::subdomain_for("Nowhere"), "tucson");
    }
}
