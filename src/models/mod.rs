pub mod intent;
pub mod job;
pub mod listing;

pub use intent::{Confidence, ConsumerIntent, ContactInfo, IntentType, Urgency};
pub use job::{IngestionJob, IngestionRequest, JobState, SourceCounts};
pub use listing::{Coordinates, FieldMap, NormalizedListing, RawListing};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    #[serde(rename = "cars.com")]
    CarsCom,
    #[serde(rename = "autotrader.com")]
    AutoTrader,
    #[serde(rename = "craigslist.org")]
    Craigslist,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::CarsCom, Source::AutoTrader, Source::Craigslist];

    /// Stable wire identifier, also used as input to the listing id hash
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::CarsCom => "cars.com",
            Source::AutoTrader => "autotrader.com",
            Source::Craigslist => "craigslist.org",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown source: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_serializes_to_domain_name() {
        let json = serde_json::to_string(&Source::AutoTrader).unwrap();
        assert_eq!(json, "\"autotrader.com\"");
        let back: Source = serde_json::from_str("\"craigslist.org\"").unwrap();
        assert_eq!(back, Source::Craigslist);
    }

    #[test]
    fn source_from_str_is_case_insensitive() {
        assert_eq!("Cars.com".parse::<Source>().unwrap(), Source::CarsCom);
        assert!("ebay.com".parse::<Source>().is_err());
    }
}
