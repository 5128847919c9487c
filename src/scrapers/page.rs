//! Results-page plumbing shared by the HTML scrapers.

use crate::error::FetchError;
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::{FetchReport, ScraperConfig};
use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

pub fn build_client(config: &ScraperConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.as_str())
        .build()
        .context("Failed to create HTTP client")
}

/// Fetch a results page body, mapping every failure to a `FetchError`.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, FetchError> {
    debug!("Fetching URL: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        warn!(%url, %status, "Source returned non-success status");
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    if body.trim().is_empty() {
        return Err(FetchError::InvalidDocument {
            url: url.to_string(),
            reason: "empty body".to_string(),
        });
    }

    debug!("Downloaded {} bytes of HTML", body.len());
    Ok(body)
}

/// Outer HTML of the first `limit` elements matching `css`.
pub fn select_fragments(html: &str, css: &str, limit: usize) -> Result<Vec<String>, String> {
    let selector = Selector::parse(css).map_err(|e| format!("bad selector {css}: {e}"))?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .take(limit)
        .map(|el| el.html())
        .collect())
}

/// Fetch `url`, split it into item fragments and parse each one, pausing
/// `delay` between items.
pub async fn scrape_results<S>(
    scraper: &S,
    client: &Client,
    url: &str,
    card_css: &str,
    limit: usize,
    delay: Duration,
) -> FetchReport
where
    S: ScraperTrait + ?Sized,
{
    let source = scraper.source();
    info!("Fetching listings from {}: {}", source, url);

    let html = match fetch_page(client, url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(%source, error = %e, "Results page fetch failed");
            return FetchReport::failed(e);
        }
    };

    let fragments = match select_fragments(&html, card_css, limit) {
        Ok(fragments) => fragments,
        Err(reason) => {
            return FetchReport::failed(FetchError::InvalidDocument {
                url: url.to_string(),
                reason,
            })
        }
    };
    debug!("Found {} listing cards", fragments.len());

    let mut report = FetchReport::default();
    let total = fragments.len();
    for (idx, fragment) in fragments.iter().enumerate() {
        match scraper.parse_item(fragment) {
            Ok(listing) => report.listings.push(listing),
            Err(e) => {
                warn!(%source, error = %e, "Failed to parse listing");
                report.skipped += 1;
            }
        }

        if idx + 1 < total && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    info!("Fetched {} listings from {}", report.listings.len(), source);
    report
}

/// Collapsed text of the first element under `root` matching `css`.
pub fn first_text(root: ElementRef<'_>, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let text = root
        .select(&selector)
        .next()?
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let text = crate::text::clean(&text);
    (!text.is_empty()).then_some(text)
}

/// Attribute of the first element under `root` matching `css`.
pub fn first_attr(root: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    root.select(&selector)
        .next()?
        .value()
        .attr(attr)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Make a relative link absolute against `base`.
pub fn absolute_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href)
    }
}

/// Case-insensitive lookup in a static location table.
pub fn lookup<'a>(table: &[(&str, &'a str)], location: &str, fallback: &'a str) -> &'a str {
    let location = location.trim();
    table
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(location))
        .map(|(_, value)| *value)
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_limited_fragments() {
        let html = r#"<ul><li class="row">a</li><li class="row">b</li><li class="row">c</li></ul>"#;
        let fragments = select_fragments(html, "li.row", 2).unwrap();
        assert_eq!(fragments.len(), 2);
        assert!(fragments[0].contains(">a<"));
    }

    #[test]
    fn absolute_url_handles_relative_and_absolute() {
        assert_eq!(absolute_url("https://x.com/", "/a/b"), "https://x.com/a/b");
        assert_eq!(absolute_url("https://x.com", "a"), "https://x.com/a");
        assert_eq!(absolute_url("https://x.com", "https://y.com/z"), "https://y.com/z");
    }

    #[test]
    fn lookup_falls_back_for_unknown_locations() {
        let table = [("Tucson, AZ", "tucson"), ("Phoenix, AZ", "phoenix")];
        assert_eq!(lookup(&table, "phoenix, az", "tucson"), "phoenix");
        assert_eq!(lookup(&table, "Boise, ID", "tucson"), "tucson");
    }
}
