use crate::error::ParseError;
use crate::models::{FieldMap, RawListing, Source};
use crate::scrapers::types::{FetchReport, SearchParams};
use async_trait::async_trait;

/// Common contract for all listing sources.
/// New sources plug in by implementing this and registering with `ScraperRegistry`.
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Fetch up to `params.max_results` listings.
    ///
    /// Never fails outright: unparseable items are counted and skipped, and a
    /// page-level failure is reported alongside whatever was collected.
    async fn fetch_listings(&self, params: &SearchParams) -> FetchReport;

    /// Extract known fields from one source-native fragment.
    /// Fields that are missing or unparseable are simply left out.
    fn parse_listing(&self, fragment: &str) -> FieldMap;

    /// Source this scraper serves
    fn source(&self) -> Source;

    /// Parse one fragment into a `RawListing`, rejecting items with neither
    /// a title nor a URL.
    fn parse_item(&self, fragment: &str) -> Result<RawListing, ParseError> {
        let data = self.parse_listing(fragment);
        let has = |key: &str| {
            data.get(key)
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.trim().is_empty())
        };
        if !has("title") && !has("url") {
            return Err(ParseError::MissingField("title"));
        }
        let url = data
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(RawListing::new(self.source(), url, data).with_html(fragment))
    }
}
