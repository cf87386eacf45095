//! Result types produced by radius queries.

use crate::types::query::{QueryPoint, SearchLocation};
use crate::types::station::Station;
use serde::Serialize;

/// A station found by a radius query, with its great-circle distance from the query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProximityResult<'a> {
    pub station: &'a Station,
    pub distance_km: f64,
}

/// The response envelope for a radius query, ready to be serialized to JSON.
///
/// ```json
/// {"search_location": {"latitude": -33.8688, "longitude": 151.2093},
///  "radius_km": 50.0, "stations_found": 1,
///  "stations": [{"station": {...}, "distance_km": 1.29}]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyStations<'a> {
    pub search_location: SearchLocation,
    pub radius_km: f64,
    pub stations_found: usize,
    pub stations: Vec<ProximityResult<'a>>,
}

impl<'a> NearbyStations<'a> {
    pub fn new(query: &QueryPoint, stations: Vec<ProximityResult<'a>>) -> Self {
        NearbyStations {
            search_location: query.location().into(),
            radius_km: query.radius_km(),
            stations_found: stations.len(),
            stations,
        }
    }
}
