//! Maps raw, source-native listings onto the canonical schema.
//!
//! `normalize` never fails: anything it cannot derive is left as `None`.

use crate::ids;
use crate::models::{FieldMap, NormalizedListing, RawListing};
use crate::text;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

const UNKNOWN_TITLE: &str = "Unknown";
const UNKNOWN_SELLER_TYPE: &str = "unknown";

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub fn normalize(raw: &RawListing) -> NormalizedListing {
    let data = &raw.raw_data;

    let url = string_field(data, "url").unwrap_or_else(|| raw.url.clone());
    let title = string_field(data, "title").unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let listing_id = ids::listing_id(raw.source, &url, &title);

    let location = string_field(data, "location").unwrap_or_default();
    let (city, state, zip_code) = parse_location(&location);

    let parsed_title = text::parse_vehicle_title(&title);
    let year = year_field(data).or(parsed_title.as_ref().map(|(y, _, _)| *y));
    let make = string_field(data, "make").or_else(|| parsed_title.as_ref().map(|(_, m, _)| m.clone()));
    let model = string_field(data, "model").or_else(|| parsed_title.as_ref().map(|(_, _, m)| m.clone()));

    let normalized = NormalizedListing {
        listing_id,
        source: raw.source,
        url,
        title,
        price: price_field(data),
        year,
        make,
        model,
        mileage: mileage_field(data),
        condition: string_field(data, "condition"),
        location,
        city,
        state,
        zip_code,
        latitude: coordinate_field(data, "latitude", 90.0),
        longitude: coordinate_field(data, "longitude", 180.0),
        seller_name: string_field(data, "seller_name"),
        seller_type: string_field(data, "seller_type")
            .unwrap_or_else(|| UNKNOWN_SELLER_TYPE.to_string()),
        phone: string_field(data, "phone"),
        email: string_field(data, "email"),
        description: string_field(data, "description"),
        images: images_field(data),
        listing_date: data.get("listing_date").and_then(Value::as_str).and_then(parse_date),
        scraped_at: raw.scraped_at,
    };

    debug!(listing_id = %normalized.listing_id, source = %normalized.source, "Normalized listing");
    normalized
}

/// Split `"City, ST, 85701"` positionally; missing segments stay `None`.
pub fn parse_location(location: &str) -> (Option<String>, Option<String>, Option<String>) {
    if location.trim().is_empty() {
        return (None, None, None);
    }
    let mut parts = location.split(',').map(|p| {
        let p = p.trim();
        (!p.is_empty()).then(|| p.to_string())
    });
    let city = parts.next().flatten();
    let state = parts.next().flatten();
    let zip = parts.next().flatten();
    (city, state, zip)
}

/// ISO-8601-like timestamps; naive values are read as UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn string_field(data: &FieldMap, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => {
            let cleaned = text::clean(s);
            (!cleaned.is_empty()).then_some(cleaned)
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn price_field(data: &FieldMap) -> Option<f64> {
    match data.get("price")? {
        Value::Number(n) => n.as_f64().filter(|p| p.is_finite() && *p >= 0.0),
        Value::String(s) => text::parse_price(s),
        _ => None,
    }
}

fn mileage_field(data: &FieldMap) -> Option<u64> {
    match data.get("mileage")? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|m| m.is_finite() && *m >= 0.0).map(|m| m.round() as u64)),
        Value::String(s) => text::parse_mileage(s),
        _ => None,
    }
}

fn year_field(data: &FieldMap) -> Option<i32> {
    let year = match data.get("year")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    (1886..=2100).contains(&year).then_some(year as i32)
}

fn coordinate_field(data: &FieldMap, key: &str, bound: f64) -> Option<f64> {
    let value = match data.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (value.is_finite() && value.abs() <= bound).then_some(value)
}

fn images_field(data: &FieldMap) -> Vec<String> {
    match data.get("images") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
