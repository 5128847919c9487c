//! Identifier generation.
//!
//! Listing ids are content-derived so re-ingesting the same page upserts the
//! same record. Intent and job ids are random.

use crate::models::Source;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Stable id over `(source, url, title)`. Other fields never participate.
pub fn listing_id(source: Source, url: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    // Length-prefix each part so ("a|b", "c") and ("a", "b|c") cannot collide
    for part in [source.as_str(), url, title] {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();
    format!("{:x}", digest)[..32].to_string()
}

pub fn intent_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn job_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_give_same_id() {
        let a = listing_id(Source::CarsCom, "https://www.cars.com/vehicledetail/1/", "2018 Honda Civic");
        let b = listing_id(Source::CarsCom, "https://www.cars.com/vehicledetail/1/", "2018 Honda Civic");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn source_participates_in_id() {
        let url = "https://example.com/listing/1";
        let a = listing_id(Source::CarsCom, url, "2018 Honda Civic");
        let b = listing_id(Source::AutoTrader, url, "2018 Honda Civic");
        assert_ne!(a, b);
    }

    #[test]
    fn part_boundaries_are_unambiguous() {
        let a = listing_id(Source::Craigslist, "ab", "c");
        let b = listing_id(Source::Craigslist, "a", "bc");
        assert_ne!(a, b);
    }

    #[test]
    fn intent_ids_are_unique() {
        assert_ne!(intent_id(), intent_id());
    }
}
