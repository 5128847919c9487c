//! Turns a normalized listing into a scored `ConsumerIntent`.
//!
//! The model response is untrusted. It is parsed and validated here, and no
//! intent is built from a value outside its declared domain.

use crate::enrichment::client::{ChatRequest, CompletionClient, Message};
use crate::error::EnrichmentError;
use crate::ids;
use crate::models::intent::UNKNOWN;
use crate::models::{Confidence, ConsumerIntent, ContactInfo, FieldMap, IntentType, NormalizedListing, Urgency};
use crate::text;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 500;
const DESCRIPTION_LIMIT: usize = 500;
const DEFAULT_CONFIDENCE: f64 = 0.5;

const SYSTEM_PROMPT: &str = r#"You are an expert at detecting consumer purchase intent from marketplace listings.

Analyze the provided car listing and extract:
1. **Urgency**: How quickly the consumer wants to buy (high/medium/low)
2. **Confidence Score**: Likelihood this represents genuine buyer intent (0.0-1.0)
3. **Purchase Timeline**: Estimated timeframe (e.g., "within 1 week", "1-2 months")
4. **Budget Range**: Inferred price range the buyer is targeting
5. **Keywords**: Key search terms or preferences
6. **Preferences**: Any specific requirements (e.g., fuel type, features)

Consider factors like:
- Listing freshness (newer = higher urgency)
- Price positioning (deals = higher urgency)
- Description urgency signals ("must sell", "motivated seller")
- Contact availability (phone/email = higher intent)

Return ONLY valid JSON with this structure:
{
    "urgency": "high|medium|low",
    "confidence_score": 0.85,
    "purchase_timeline": "within 1 week",
    "budget_min": 15000,
    "budget_max": 25000,
    "keywords": ["SUV", "low mileage", "4WD"],
    "preferences": {
        "vehicle_type": "SUV",
        "max_mileage": 50000,
        "features": ["4WD", "leather seats"]
    }
}"#;

/// Validated model output
#[derive(Debug, Clone, PartialEq)]
pub struct IntentSignals {
    pub urgency: Urgency,
    pub confidence: Confidence,
    pub purchase_timeline: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub keywords: Vec<String>,
    pub preferences: FieldMap,
}

pub struct Classifier {
    client: Arc<dyn CompletionClient>,
    model: String,
    timeout: Duration,
}

impl Classifier {
    pub fn new(client: Arc<dyn CompletionClient>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            model: model.into(),
            timeout,
        }
    }

    /// Classify one listing. Errors are per-listing and never affect siblings.
    pub async fn classify(&self, listing: &NormalizedListing) -> Result<ConsumerIntent, EnrichmentError> {
        let request = ChatRequest::new(&self.model)
            .message(Message::system(SYSTEM_PROMPT))
            .message(Message::user(build_context(listing)))
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS);

        let raw = tokio::time::timeout(self.timeout, self.client.complete(request))
            .await
            .map_err(|_| EnrichmentError::Timeout(self.timeout))??;

        let signals = parse_response(&raw)?;
        let intent = build_intent(listing, signals);

        info!(
            "✅ AI enrichment complete: {} (confidence: {:.2})",
            intent.intent_id,
            intent.confidence_score.value()
        );
        Ok(intent)
    }
}

/// Deterministic prompt context for one listing
pub fn build_context(listing: &NormalizedListing) -> String {
    let price = listing
        .price
        .map(|p| format!("${}", thousands(p.round() as u64)))
        .unwrap_or_else(|| "Not listed".to_string());
    let mileage = listing
        .mileage
        .map(|m| format!("{} miles", thousands(m)))
        .unwrap_or_else(|| "Unknown".to_string());
    let listed = listing
        .listing_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let description = listing
        .description
        .as_deref()
        .map(|d| text::truncate_chars(d, DESCRIPTION_LIMIT))
        .unwrap_or("No description available");

    format!(
        "**Car Listing Analysis**\n\n\
         Title: {}\n\
         Price: {}\n\
         Mileage: {}\n\
         Location: {}\n\
         Seller: {} ({})\n\
         Source: {}\n\
         Listed: {}\n\
         Scraped: {}\n\n\
         Description: {}\n\n\
         Contact Available: {}",
        listing.title,
        price,
        mileage,
        listing.location,
        listing.seller_name.as_deref().unwrap_or("Unknown"),
        listing.seller_type,
        listing.source,
        listed,
        listing.scraped_at.format("%Y-%m-%d"),
        description,
        if listing.has_contact() { "Yes" } else { "No" },
    )
}

/// Validate a raw model payload. Urgency falls back to medium and a missing
/// confidence to 0.5; any other out-of-domain value fails the call.
pub fn parse_response(raw: &str) -> Result<IntentSignals, EnrichmentError> {
    let value: Value = serde_json::from_str(text::strip_code_blocks(raw))
        .map_err(|e| EnrichmentError::MalformedResponse(e.to_string()))?;
    let Value::Object(output) = value else {
        return Err(EnrichmentError::MalformedResponse("expected a JSON object".into()));
    };

    let urgency = match output.get("urgency").and_then(Value::as_str) {
        Some(s) => s.parse().unwrap_or_else(|_| {
            debug!(urgency = %s, "Unrecognized urgency, using medium");
            Urgency::Medium
        }),
        None => Urgency::Medium,
    };

    let confidence = match output.get("confidence_score") {
        None | Some(Value::Null) => DEFAULT_CONFIDENCE,
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid("confidence_score", n))?,
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid("confidence_score", s))?,
        Some(other) => return Err(invalid("confidence_score", other)),
    };
    let confidence = Confidence::new(confidence).ok_or_else(|| invalid("confidence_score", confidence))?;

    let purchase_timeline = output
        .get("purchase_timeline")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let mut budget_min = budget_field(&output, "budget_min");
    let mut budget_max = budget_field(&output, "budget_max");
    if let (Some(min), Some(max)) = (budget_min, budget_max) {
        if min > max {
            budget_min = Some(max);
            budget_max = Some(min);
        }
    }

    let keywords = match output.get("keywords") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    let preferences = match output.get("preferences") {
        Some(Value::Object(map)) => map.clone(),
        _ => FieldMap::new(),
    };

    Ok(IntentSignals {
        urgency,
        confidence,
        purchase_timeline,
        budget_min,
        budget_max,
        keywords,
        preferences,
    })
}

/// Assemble the intent. Contact fields come from the listing, never the model.
pub fn build_intent(listing: &NormalizedListing, signals: IntentSignals) -> ConsumerIntent {
    let contact_info = ContactInfo::from_listing(listing);
    ConsumerIntent {
        intent_id: ids::intent_id(),
        intent_type: IntentType::CarBuyer,
        location: listing.location.clone(),
        city: listing.city.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        state: listing.state.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        latitude: listing.latitude,
        longitude: listing.longitude,
        urgency: signals.urgency,
        confidence_score: signals.confidence,
        purchase_timeline: signals.purchase_timeline,
        budget_min: signals.budget_min,
        budget_max: signals.budget_max,
        keywords: signals.keywords,
        preferences: signals.preferences,
        source_listing: listing.clone(),
        detected_at: Utc::now(),
        contact_available: contact_info.is_some(),
        contact_info,
    }
}

fn budget_field(output: &FieldMap, key: &str) -> Option<f64> {
    match output.get(key)? {
        Value::Number(n) => n.as_f64().filter(|b| b.is_finite() && *b >= 0.0),
        Value::String(s) => text::parse_price(s),
        _ => None,
    }
}

fn invalid(field: &'static str, value: impl std::fmt::Display) -> EnrichmentError {
    EnrichmentError::InvalidField {
        field,
        reason: format!("{} is not a score in [0, 1]", value),
    }
}

fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn listing() -> NormalizedListing {
        NormalizedListing {
            listing_id: "abc".into(),
            source: Source::CarsCom,
            url: "https://www.cars.com/v/1".into(),
            title: "2019 Toyota Camry SE".into(),
            price: Some(21450.0),
            year: Some(2019),
            make: Some("Toyota".into()),
            model: Some("Camry".into()),
            mileage: Some(32110),
            condition: None,
            location: "Tucson, AZ".into(),
            city: Some("Tucson".into()),
            state: Some("AZ".into()),
            zip_code: None,
            latitude: None,
            longitude: None,
            seller_name: Some("Desert Auto".into()),
            seller_type: "dealer".into(),
            phone: None,
            email: None,
            description: Some("x".repeat(800)),
            images: vec![],
            listing_date: None,
            scraped_at: Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap(),
        }
    }

    struct Canned(&'static str);

    #[async_trait]
    impl CompletionClient for Canned {
        async fn complete(&self, _request: ChatRequest) -> Result<String, EnrichmentError> {
            Ok(self.0.to_string())
        }
    }

    struct Slow;

    #[async_trait]
    impl CompletionClient for Slow {
        async fn complete(&self, _request: ChatRequest) -> Result<String, EnrichmentError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("{}".to_string())
        }
    }

    #[test]
    fn context_is_deterministic_and_bounded() {
        let l = listing();
        let a = build_context(&l);
        assert_eq!(a, build_context(&l));
        assert!(a.contains("Price: $21,450"));
        assert!(a.contains("Mileage: 32,110 miles"));
        assert!(a.contains("Seller: Desert Auto (dealer)"));
        assert!(a.contains("Contact Available: No"));
        assert!(!a.contains(&"x".repeat(501)));
    }

    #[test]
    fn context_marks_unknown_values() {
        let mut l = listing();
        l.price = None;
        l.mileage = None;
        l.description = None;
        let context = build_context(&l);
        assert!(context.contains("Price: Not listed"));
        assert!(context.contains("Mileage: Unknown"));
        assert!(context.contains("No description available"));
    }

    #[test]
    fn parses_well_formed_response() {
        let signals = parse_response(
            r#"```json
            {"urgency": "high", "confidence_score": 0.82, "purchase_timeline": "within 1 week",
             "budget_min": 15000, "budget_max": "$25,000", "keywords": ["sedan", 4, " "],
             "preferences": {"fuel": "gas"}}
            ```"#,
        )
        .unwrap();
        assert_eq!(signals.urgency, Urgency::High);
        assert_eq!(signals.confidence.value(), 0.82);
        assert_eq!(signals.budget_max, Some(25000.0));
        assert_eq!(signals.keywords, vec!["sedan".to_string()]);
        assert_eq!(signals.preferences["fuel"], "gas");
    }

    #[test]
    fn invalid_urgency_defaults_to_medium() {
        let signals = parse_response(r#"{"urgency": "asap", "confidence_score": 0.4}"#).unwrap();
        assert_eq!(signals.urgency, Urgency::Medium);
        let signals = parse_response(r#"{"confidence_score": 0.4}"#).unwrap();
        assert_eq!(signals.urgency, Urgency::Medium);
    }

    #[test]
    fn missing_confidence_defaults() {
        let signals = parse_response(r#"{"urgency": "low"}"#).unwrap();
        assert_eq!(signals.confidence.value(), 0.5);
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        for body in [
            r#"{"confidence_score": 1.7}"#,
            r#"{"confidence_score": -0.2}"#,
            r#"{"confidence_score": "very"}"#,
            r#"{"confidence_score": [0.5]}"#,
        ] {
            assert!(matches!(
                parse_response(body),
                Err(EnrichmentError::InvalidField { field: "confidence_score", .. })
            ));
        }
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            parse_response("I think this buyer is serious."),
            Err(EnrichmentError::MalformedResponse(_))
        ));
        assert!(matches!(parse_response("[1, 2]"), Err(EnrichmentError::MalformedResponse(_))));
    }

    #[test]
    fn inverted_budget_is_swapped() {
        let signals = parse_response(r#"{"budget_min": 30000, "budget_max": 20000}"#).unwrap();
        assert_eq!((signals.budget_min, signals.budget_max), (Some(20000.0), Some(30000.0)));
    }

    #[test]
    fn contact_fields_follow_listing() {
        let signals = parse_response("{}").unwrap();

        let intent = build_intent(&listing(), signals.clone());
        assert!(!intent.contact_available);
        assert!(intent.contact_info.is_none());

        let mut with_email = listing();
        with_email.email = Some("buyer@example.com".into());
        let intent = build_intent(&with_email, signals.clone());
        assert!(intent.contact_available);
        assert_eq!(
            intent.contact_info.unwrap().email.as_deref(),
            Some("buyer@example.com")
        );

        let mut blank_phone = listing();
        blank_phone.phone = Some("   ".into());
        let intent = build_intent(&blank_phone, signals);
        assert!(!intent.contact_available);
        assert!(intent.contact_info.is_none());
    }

    #[test]
    fn missing_city_and_state_become_unknown() {
        let mut l = listing();
        l.city = None;
        l.state = None;
        let intent = build_intent(&l, parse_response("{}").unwrap());
        assert_eq!(intent.city, "Unknown");
        assert_eq!(intent.state, "Unknown");
    }

    #[tokio::test]
    async fn classify_builds_intent() {
        let classifier = Classifier::new(
            Arc::new(Canned(r#"{"urgency": "high", "confidence_score": 0.9}"#)),
            "gpt-4o-mini",
            Duration::from_secs(5),
        );
        let intent = classifier.classify(&listing()).await.unwrap();
        assert_eq!(intent.urgency, Urgency::High);
        assert_eq!(intent.source_listing.listing_id, "abc");
        assert_eq!(intent.intent_type, IntentType::CarBuyer);
    }

    #[tokio::test]
    async fn classify_times_out() {
        let classifier = Classifier::new(Arc::new(Slow), "gpt-4o-mini", Duration::from_millis(50));
        let err = classifier.classify(&listing()).await.unwrap_err();
        assert!(matches!(err, EnrichmentError::Timeout(d) if d == Duration::from_millis(50)));
        assert!(err.to_string().contains("50ms"));
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
