//! Query-side types: geographic coordinates and validated radius queries.

use crate::proximity::error::ProximityError;
use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate using latitude and longitude (WGS84 degrees).
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use bom_stations::LatLon;
///
/// let sydney = LatLon(-33.8688, 151.2093);
/// assert_eq!(sydney.0, -33.8688); // Latitude
/// assert_eq!(sydney.1, 151.2093); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// Whether both components are finite and within the WGS84 ranges
    /// (latitude in [-90, 90], longitude in [-180, 180]).
    pub fn is_valid(&self) -> bool {
        latitude_in_range(self.0) && longitude_in_range(self.1)
    }
}

pub(crate) fn latitude_in_range(latitude: f64) -> bool {
    latitude.is_finite() && (-90.0..=90.0).contains(&latitude)
}

pub(crate) fn longitude_in_range(longitude: f64) -> bool {
    longitude.is_finite() && (-180.0..=180.0).contains(&longitude)
}

/// Serialized form of a [`LatLon`], as used in response envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LatLon> for SearchLocation {
    fn from(value: LatLon) -> Self {
        SearchLocation {
            latitude: value.0,
            longitude: value.1,
        }
    }
}

/// A validated radius query: a center point and a search radius in kilometers.
///
/// The only way to build one is [`QueryPoint::new`], so every `QueryPoint` in circulation
/// has in-range coordinates and a finite, non-negative radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryPoint {
    location: LatLon,
    radius_km: f64,
}

impl QueryPoint {
    /// Validates and creates a new query.
    ///
    /// # Errors
    ///
    /// Returns [`ProximityError::InvalidArgument`] if the latitude is outside [-90, 90], the
    /// longitude is outside [-180, 180], the radius is negative, or any value is not finite.
    /// A radius of exactly `0.0` is accepted and matches only stations at the query point.
    ///
    /// # Examples
    ///
    /// ```
    /// use bom_stations::{QueryPoint, ProximityError};
    ///
    /// let q = QueryPoint::new(-33.8688, 151.2093, 50.0).unwrap();
    /// assert_eq!(q.radius_km(), 50.0);
    ///
    /// let err = QueryPoint::new(-33.8688, 151.2093, -5.0).unwrap_err();
    /// assert!(matches!(err, ProximityError::InvalidArgument { name: "radius_km", .. }));
    /// ```
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Result<Self, ProximityError> {
        if !latitude_in_range(latitude) {
            return Err(ProximityError::invalid(
                "latitude",
                latitude,
                "must be a finite value in [-90, 90]",
            ));
        }
        if !longitude_in_range(longitude) {
            return Err(ProximityError::invalid(
                "longitude",
                longitude,
                "must be a finite value in [-180, 180]",
            ));
        }
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(ProximityError::invalid(
                "radius_km",
                radius_km,
                "must be a finite, non-negative number of kilometers",
            ));
        }
        Ok(QueryPoint {
            location: LatLon(latitude, longitude),
            radius_km,
        })
    }

    /// Same as [`QueryPoint::new`], taking the center as a [`LatLon`].
    pub fn around(location: LatLon, radius_km: f64) -> Result<Self, ProximityError> {
        Self::new(location.0, location.1, radius_km)
    }

    pub fn location(&self) -> LatLon {
        self.location
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_query() {
        let q = QueryPoint::new(-33.8688, 151.2093, 50.0).unwrap();
        assert_eq!(q.location(), LatLon(-33.8688, 151.2093));
        assert_eq!(q.radius_km(), 50.0);
    }

    #[test]
    fn test_extreme_but_valid_coordinates() {
        assert!(QueryPoint::new(90.0, 180.0, 1.0).is_ok());
        assert!(QueryPoint::new(-90.0, -180.0, 1.0).is_ok());
    }

    #[test]
    fn test_zero_radius_is_accepted() {
        assert!(QueryPoint::new(0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_negative_radius_rejected() {
        let err = QueryPoint::new(-33.8688, 151.2093, -5.0).unwrap_err();
        assert_eq!(
            err,
            ProximityError::InvalidArgument {
                name: "radius_km",
                value: -5.0,
                reason: "must be a finite, non-negative number of kilometers",
            }
        );
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        assert!(matches!(
            QueryPoint::new(91.0, 0.0, 10.0),
            Err(ProximityError::InvalidArgument { name: "latitude", .. })
        ));
        assert!(matches!(
            QueryPoint::new(0.0, -180.5, 10.0),
            Err(ProximityError::InvalidArgument { name: "longitude", .. })
        ));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        assert!(QueryPoint::new(f64::NAN, 0.0, 10.0).is_err());
        assert!(QueryPoint::new(0.0, f64::INFINITY, 10.0).is_err());
        assert!(QueryPoint::new(0.0, 0.0, f64::NAN).is_err());
        assert!(QueryPoint::new(0.0, 0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_latlon_validity() {
        assert!(LatLon(-33.86, 151.20).is_valid());
        assert!(!LatLon(-95.0, 151.20).is_valid());
        assert!(!LatLon(-33.86, 181.0).is_valid());
    }
}
