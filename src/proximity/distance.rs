use crate::types::query::LatLon;

/// Mean Earth radius in kilometers (IUGG), used for all great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance in kilometers between two points, using the haversine formula
/// on a spherical Earth of radius [`EARTH_RADIUS_KM`].
///
/// # Examples
///
/// ```
/// use bom_stations::{haversine_km, LatLon};
///
/// let sydney = LatLon(-33.8688, 151.2093);
/// let newcastle = LatLon(-32.9283, 151.7817);
/// let d = haversine_km(sydney, newcastle);
/// assert!((d - haversine_km(newcastle, sydney)).abs() < 1e-9);
/// assert!(d > 100.0 && d < 130.0);
/// ```
pub fn haversine_km(from: LatLon, to: LatLon) -> f64 {
    let lat1 = from.0.to_radians();
    let lat2 = to.0.to_radians();
    let d_lat = (to.0 - from.0).to_radians();
    let d_lon = (to.1 - from.1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}
