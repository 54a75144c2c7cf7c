//! Great-circle distance between coordinates.
//!
//! Coordinates follow the `geo` convention used throughout the crate:
//! `x` is longitude and `y` is latitude, both in degrees.

use geo::Coord;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two WGS84 coordinates.
///
/// The function is total: out-of-range input yields a number without
/// geographic meaning rather than an error. Validate coordinates first when
/// that matters.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use places_core::haversine_km;
///
/// let origin = Coord { x: 0.0, y: 0.0 };
/// let north = Coord { x: 0.0, y: 1.0 };
/// let km = haversine_km(origin, north);
/// assert!((km - 111.19).abs() < 0.01);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "haversine is defined in floating-point trigonometry"
)]
pub fn haversine_km(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let lat1 = from.y.to_radians();
    let lat2 = to.y.to_radians();
    let half_dlat = (to.y - from.y).to_radians() / 2.0;
    let half_dlon = (to.x - from.x).to_radians() / 2.0;

    let a = (half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2))
        .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Haversine distance taking latitude and longitude as separate arguments.
#[must_use]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_km(Coord { x: lon1, y: lat1 }, Coord { x: lon2, y: lat2 })
}
