//! Small text helpers shared by the scrapers, normalizer and classifier.

use regex::Regex;
use std::sync::OnceLock;

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("valid phone regex"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
    })
}

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:(?:Used|New|Certified)\s+)?((?:19|20)\d{2})\s+(\S+)\s+(\S+)")
            .expect("valid title regex")
    })
}

/// Collapse runs of whitespace and trim.
pub fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `"$15,000"` -> `15000.0`. Anything that is not a plain number after
/// stripping currency symbols and separators yields `None`.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

/// `"45,120 mi."` -> `45120`
pub fn parse_mileage(text: &str) -> Option<u64> {
    let lowered = text.trim().to_ascii_lowercase();
    let stripped = lowered
        .trim_end_matches('.')
        .trim_end_matches("miles")
        .trim_end_matches("mi")
        .trim();
    let digits: String = stripped.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Leading model year, make and model from titles like `"2018 Honda Civic LX"`.
pub fn parse_vehicle_title(title: &str) -> Option<(i32, String, String)> {
    let caps = title_regex().captures(title)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    Some((year, caps[2].to_string(), caps[3].to_string()))
}

pub fn extract_phone(text: &str) -> Option<String> {
    phone_regex().find(text).map(|m| m.as_str().to_string())
}

pub fn extract_email(text: &str) -> Option<String> {
    email_regex().find(text).map(|m| m.as_str().to_string())
}

/// Truncate to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Strip a markdown code fence wrapped around a model response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}
