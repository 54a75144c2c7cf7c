//! Property-based tests for the haversine distance.
//!
//! # Invariants tested
//!
//! - **Identity:** the distance from a point to itself is zero.
//! - **Symmetry:** swapping the endpoints does not change the distance.
//! - **Bounds:** distances are finite, non-negative and at most half the
//!   Earth's circumference.
//! - **Ordering:** moving further along a meridian never brings a point
//!   closer.

use std::f64::consts::PI;

use geo::Coord;
use places_core::{EARTH_RADIUS_KM, distance_km, haversine_km};
use proptest::prelude::*;

fn coord_strategy() -> impl Strategy<Value = Coord<f64>> {
    (-180.0_f64..=180.0, -90.0_f64..=90.0).prop_map(|(x, y)| Coord { x, y })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn distance_to_self_is_zero(point in coord_strategy()) {
        prop_assert!(haversine_km(point, point).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric(a in coord_strategy(), b in coord_strategy()) {
        let forward = haversine_km(a, b);
        let backward = haversine_km(b, a);
        prop_assert!(
            (forward - backward).abs() < 1e-6,
            "forward {forward} differs from backward {backward}"
        );
    }

    #[test]
    fn distance_is_bounded(a in coord_strategy(), b in coord_strategy()) {
        let km = haversine_km(a, b);
        prop_assert!(km.is_finite());
        prop_assert!(km >= 0.0);
        prop_assert!(km <= PI * EARTH_RADIUS_KM + 1e-6);
    }

    #[test]
    fn meridian_distance_grows_with_latitude(
        lon in -180.0_f64..=180.0,
        near in 0.0_f64..=45.0,
        extra in 0.0_f64..=45.0,
    ) {
        let equator = distance_km(0.0, lon, 0.0, lon);
        let closer = distance_km(0.0, lon, near, lon);
        let further = distance_km(0.0, lon, near + extra, lon);
        prop_assert!(equator.abs() < 1e-9);
        prop_assert!(closer <= further + 1e-9);
    }

    #[test]
    fn argument_order_matches_coordinates(a in coord_strategy(), b in coord_strategy()) {
        let via_coords = haversine_km(a, b);
        let via_degrees = distance_km(a.y, a.x, b.y, b.x);
        prop_assert!((via_coords - via_degrees).abs() < 1e-9);
    }
}
