//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Mean Earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] when `lat` is outside
    /// `[-90, 90]` or `lng` is outside `[-180, 180]`.
    pub fn new(lat: f64, lng: f64) -> Result<Self, ConfigError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ConfigError::InvalidSetting {
                field: "latitude".to_string(),
                reason: format!("{lat} is not a valid latitude"),
            });
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ConfigError::InvalidSetting {
                field: "longitude".to_string(),
                reason: format!("{lng} is not a valid longitude"),
            });
        }
        Ok(Self { lat, lng })
    }
}

/// Great-circle distance between two points in meters (haversine).
#[must_use]
pub fn distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Rounds to one decimal place, the precision every derived figure is
/// reported at.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn same_point_is_zero() {
        let p = coord(-27.4698, 153.0251);
        assert!(distance_m(p, p).abs() < f64::EPSILON);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_m(coord(0.0, 0.0), coord(1.0, 0.0)) / 1000.0;
        assert!((d - 111.2).abs() < 0.2, "got {d}");
    }

    #[test]
    fn brisbane_to_gold_coast() {
        // Brisbane CBD to Surfers Paradise, roughly 70 km.
        let d = distance_m(coord(-27.4698, 153.0251), coord(-28.0023, 153.4145)) / 1000.0;
        assert!((65.0..76.0).contains(&d), "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = coord(-19.2590, 146.8169);
        let b = coord(-16.9186, 145.7781);
        assert!((distance_m(a, b) - distance_m(b, a)).abs() < 1e-6);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, 181.0).is_err());
    }

    #[test]
    fn round1_rounds_half_away_from_zero() {
        assert!((round1(1.25) - 1.3).abs() < 1e-9);
        assert!((round1(-0.04) - 0.0).abs() < 1e-9);
        assert!((round1(12.345) - 12.3).abs() < 1e-9);
    }
}
