//! crates/wayfarer_core/src/geo.rs
//!
//! Pure great-circle distance math and the distance-bucket filter.
//! No dependencies on the rest of the core; everything here is
//! deterministic and synchronous.

use crate::domain::Place;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle (haversine) distance between two coordinates, in meters.
///
/// NaN coordinates propagate as a NaN distance; this function never panics.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// A distance bucket in meters, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusBounds {
    pub min_m: f64,
    pub max_m: f64,
}

impl RadiusBounds {
    pub fn new(min_m: f64, max_m: f64) -> Self {
        Self { min_m, max_m }
    }

    /// Membership test. A NaN distance is never a member.
    pub fn contains(&self, distance_m: f64) -> bool {
        distance_m >= self.min_m && distance_m <= self.max_m
    }
}

/// Keeps the places whose distance from the origin falls inside `bounds`.
///
/// Catalog order is preserved: the candidate list is paired one-to-one with
/// generated commentary downstream, and the catalog's own relevance ordering
/// is deliberately favored over raw proximity.
pub fn filter_by_bounds(
    origin_lat: f64,
    origin_lon: f64,
    bounds: RadiusBounds,
    places: Vec<Place>,
) -> Vec<Place> {
    places
        .into_iter()
        .filter(|p| {
            bounds.contains(distance_meters(
                origin_lat,
                origin_lon,
                p.latitude,
                p.longitude,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Mood, TimeBudget};

    fn place(name: &str, lat: f64, lon: f64) -> Place {
        Place {
            name: name.to_string(),
            latitude: lat,
            longitude: lon,
            mood: Mood::Cafe,
            source_url: None,
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(distance_meters(33.5897, 130.4207, 33.5897, 130.4207), 0.0);
        assert_eq!(distance_meters(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = distance_meters(33.5897, 130.4207, 33.5914, 130.3989);
        let ba = distance_meters(33.5914, 130.3989, 33.5897, 130.4207);
        assert_eq!(ab, ba);
    }

    #[test]
    fn distance_matches_known_pair() {
        // Hakata Station to Tenjin Station is roughly 2 km.
        let d = distance_meters(33.5897, 130.4207, 33.5914, 130.3989);
        assert!((1900.0..2200.0).contains(&d), "got {d}");
    }

    #[test]
    fn nan_coordinates_propagate_without_panicking() {
        assert!(distance_meters(f64::NAN, 130.4, 33.6, 130.4).is_nan());
        assert!(distance_meters(33.6, 130.4, 33.6, f64::NAN).is_nan());
    }

    #[test]
    fn buckets_are_contiguous_and_ascending() {
        let b30 = TimeBudget::Min30.radius_bounds();
        let b60 = TimeBudget::Min60.radius_bounds();
        let b120 = TimeBudget::Min120.radius_bounds();

        assert_eq!(b30.max_m, b60.min_m);
        assert_eq!(b60.max_m, b120.min_m);
        assert!(b30.min_m < b30.max_m);
        assert!(b60.min_m < b60.max_m);
        assert!(b120.min_m < b120.max_m);
    }

    #[test]
    fn bounds_are_inclusive_on_both_ends() {
        let bounds = RadiusBounds::new(500.0, 1000.0);
        assert!(bounds.contains(500.0));
        assert!(bounds.contains(1000.0));
        assert!(!bounds.contains(499.999));
        assert!(!bounds.contains(1000.001));
        assert!(!bounds.contains(f64::NAN));
    }

    #[test]
    fn filter_keeps_catalog_order() {
        // ~0.001 degrees of latitude is ~111 m.
        let origin = (33.5897, 130.4207);
        let places = vec![
            place("near-b", 33.5907, 130.4207),
            place("far", 33.6897, 130.4207),
            place("near-a", 33.5902, 130.4207),
        ];
        let kept = filter_by_bounds(
            origin.0,
            origin.1,
            TimeBudget::Min30.radius_bounds(),
            places,
        );
        let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["near-b", "near-a"]);
    }
}
