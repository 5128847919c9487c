//! Great-circle distance checks for the optional geofence.

use crate::models::Coordinates;

const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Haversine distance in miles
pub fn distance_miles(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().min(1.0).asin()
}

pub fn within_radius(center: Coordinates, point: Coordinates, radius_miles: f64) -> bool {
    distance_miles(center, point) <= radius_miles
}

#[cfg(test)]
mod tests {
    use super::*;

    const TUCSON: Coordinates = Coordinates {
        latitude: 32.2226,
        longitude: -110.9747,
    };
    const PHOENIX: Coordinates = Coordinates {
        latitude: 33.4484,
        longitude: -112.0740,
    };

    #[test]
    fn tucson_to_phoenix_is_about_106_miles() {
        let d = distance_miles(TUCSON, PHOENIX);
        assert!((d - 106.0).abs() < 3.0, "got {d}");
    }

    #[test]
    fn radius_check() {
        assert!(within_radius(TUCSON, TUCSON, 0.0));
        assert!(within_radius(TUCSON, PHOENIX, 150.0));
        assert!(!within_radius(TUCSON, PHOENIX, 50.0));
    }
}
