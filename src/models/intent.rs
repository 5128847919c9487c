use super::{FieldMap, NormalizedListing};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder for a city or state the source listing did not provide
pub const UNKNOWN: &str = "Unknown";

/// Kind of purchase the consumer is looking to make
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    CarBuyer,
    HomeBuyer,
    RentalSeeker,
    ServiceSeeker,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::CarBuyer => "car_buyer",
            IntentType::HomeBuyer => "home_buyer",
            IntentType::RentalSeeker => "rental_seeker",
            IntentType::ServiceSeeker => "service_seeker",
        }
    }
}

/// How soon the consumer is expected to transact
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    #[default]
    Medium,
    Low,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::High => "high",
            Urgency::Medium => "medium",
            Urgency::Low => "low",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Urgency::High),
            "medium" => Ok(Urgency::Medium),
            "low" => Ok(Urgency::Low),
            other => Err(format!("invalid urgency: {}", other)),
        }
    }
}

/// Confidence score, always within `[0.0, 1.0]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Confidence::new(value).ok_or_else(|| format!("confidence {} outside [0, 1]", value))
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> f64 {
        confidence.0
    }
}

/// Ways to reach the seller behind a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub seller_name: Option<String>,
}

impl ContactInfo {
    /// Present only when the listing carries a non-empty phone or email.
    pub fn from_listing(listing: &NormalizedListing) -> Option<Self> {
        listing.has_contact().then(|| Self {
            phone: non_empty(listing.phone.as_deref()),
            email: non_empty(listing.email.as_deref()),
            seller_name: listing.seller_name.clone(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Scored consumer intent derived from one normalized listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumerIntent {
    pub intent_id: String,
    pub intent_type: IntentType,

    // Consumer location
    pub location: String,
    pub city: String,
    pub state: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    // Intent details
    pub urgency: Urgency,
    pub confidence_score: Confidence,
    pub purchase_timeline: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub keywords: Vec<String>,
    pub preferences: FieldMap,

    pub source_listing: NormalizedListing,
    pub detected_at: DateTime<Utc>,

    /// True iff `contact_info` is present
    pub contact_available: bool,
    pub contact_info: Option<ContactInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_rejects_out_of_range() {
        assert!(Confidence::new(0.0).is_some());
        assert!(Confidence::new(1.0).is_some());
        assert!(Confidence::new(1.01).is_none());
        assert!(Confidence::new(-0.1).is_none());
        assert!(Confidence::new(f64::NAN).is_none());
    }

    #[test]
    fn confidence_deserialization_is_validated() {
        assert!(serde_json::from_str::<Confidence>("0.75").is_ok());
        assert!(serde_json::from_str::<Confidence>("1.5").is_err());
    }

    #[test]
    fn urgency_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Urgency>().unwrap(), Urgency::High);
        assert_eq!(" low ".parse::<Urgency>().unwrap(), Urgency::Low);
        assert!("urgent".parse::<Urgency>().is_err());
    }

    #[test]
    fn intent_type_uses_snake_case_on_the_wire() {
        let json = serde_json::to_value(IntentType::CarBuyer).unwrap();
        assert_eq!(json, serde_json::json!("car_buyer"));
        assert_eq!(IntentType::CarBuyer.as_str(), "car_buyer");
    }
}
