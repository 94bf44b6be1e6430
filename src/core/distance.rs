use crate::models::{BoundingBox, GeoPoint};

/// Earth's radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
#[inline]
pub fn haversine_distance(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance in whole kilometers, rounded to the nearest integer
#[inline]
pub fn distance_km_rounded(from: GeoPoint, to: GeoPoint) -> u32 {
    haversine_distance(from, to).round() as u32
}

/// Calculate a bounding box around a center point
///
/// Used as an index-friendly pre-filter before the exact spherical distance.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude).
/// Boxes that would cross a pole or the antimeridian fall back to the full
/// longitude range.
pub fn calculate_bounding_box(center: GeoPoint, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / 111.0;
    let cos_lat = center.latitude.to_radians().cos().abs();

    let min_lat = (center.latitude - lat_delta).max(-90.0);
    let max_lat = (center.latitude + lat_delta).min(90.0);

    if cos_lat < 1e-6 {
        return BoundingBox { min_lat, max_lat, min_lon: -180.0, max_lon: 180.0 };
    }

    let lon_delta = radius_km / (111.0 * cos_lat);
    let min_lon = center.longitude - lon_delta;
    let max_lon = center.longitude + lon_delta;

    if min_lon < -180.0 || max_lon > 180.0 {
        return BoundingBox { min_lat, max_lat, min_lon: -180.0, max_lon: 180.0 };
    }

    BoundingBox { min_lat, max_lat, min_lon, max_lon }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(point: GeoPoint, bbox: &BoundingBox) -> bool {
    point.latitude >= bbox.min_lat
        && point.latitude <= bbox.max_lat
        && point.longitude >= bbox.min_lon
        && point.longitude <= bbox.max_lon
}
