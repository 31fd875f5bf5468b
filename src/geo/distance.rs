//! Great-circle distance along a trajectory.

use crate::state::Point;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two lat/lng pairs (degrees), in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push near-antipodal pairs just past 1
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two points, in kilometers.
pub fn point_distance_km(a: &Point, b: &Point) -> f64 {
    haversine_km(a.lat, a.lng, b.lat, b.lng)
}

/// Total distance over consecutive point pairs, in sequence order.
///
/// Zero for fewer than two points.
pub fn trajectory_distance_km(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|pair| point_distance_km(&pair[0], &pair[1]))
        .sum()
}
