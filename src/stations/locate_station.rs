use crate::proximity::distance::{haversine_km, EARTH_RADIUS_KM};
use crate::types::proximity::ProximityResult;
use crate::types::query::{LatLon, QueryPoint};
use crate::types::station::{Station, StationPoint};
use ordered_float::OrderedFloat;
use rstar::{RTree, AABB};
use std::f64::consts::PI;

// Slack added to every envelope edge so rounding never drops a station that sits on the radius.
const ENVELOPE_PAD_DEG: f64 = 1e-6;

/// An owned station collection with an R-tree over the located stations.
///
/// Answers the same radius query as [`crate::find_within_radius`], and returns identical
/// results, but only computes haversine distances for stations inside a bounding box around
/// the query circle.
///
/// # Examples
///
/// ```
/// use bom_stations::{QueryPoint, Station, StationLocator};
///
/// let locator = StationLocator::new(vec![
///     Station::builder().id("1").name("Sydney Obs").latitude(-33.86).longitude(151.20).build(),
///     Station::builder().id("2").name("Newcastle").latitude(-32.9283).longitude(151.7817).build(),
///     Station::builder().id("3").name("Unknown").build(),
/// ]);
/// assert_eq!(locator.len(), 3);
/// assert_eq!(locator.located_len(), 2);
///
/// let query = QueryPoint::new(-33.8688, 151.2093, 200.0)?;
/// let names: Vec<_> = locator.query(&query, None).iter().map(|r| r.station.name.as_str()).collect();
/// assert_eq!(names, ["Sydney Obs", "Newcastle"]);
/// # Ok::<(), bom_stations::ProximityError>(())
/// ```
#[derive(Debug, Clone)]
pub struct StationLocator {
    stations: Vec<Station>,
    rtree: RTree<StationPoint>,
}

impl StationLocator {
    pub fn new(stations: Vec<Station>) -> Self {
        let points: Vec<StationPoint> = stations
            .iter()
            .enumerate()
            .filter_map(|(position, station)| {
                station.coordinates().map(|LatLon(latitude, longitude)| StationPoint {
                    position,
                    latitude,
                    longitude,
                })
            })
            .collect();
        log::debug!(
            "Indexed {} located stations out of {}",
            points.len(),
            stations.len()
        );
        let rtree = RTree::bulk_load(points);
        StationLocator { stations, rtree }
    }

    /// All stations, located or not, in their original order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Looks a station up by its identifier.
    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Number of stations with usable coordinates.
    pub fn located_len(&self) -> usize {
        self.rtree.size()
    }

    /// Finds up to `limit` stations within the query radius, closest first.
    ///
    /// Ties in distance are broken by the stations' order in the collection, and stations
    /// without coordinates never appear, exactly as in [`crate::find_within_radius`].
    pub fn query(&self, query: &QueryPoint, limit: Option<usize>) -> Vec<ProximityResult<'_>> {
        if limit == Some(0) {
            return vec![];
        }

        let center = query.location();
        let mut candidates: Vec<(OrderedFloat<f64>, usize)> = Vec::new();
        for envelope in search_envelopes(center, query.radius_km()) {
            for point in self.rtree.locate_in_envelope(&envelope) {
                let distance_km =
                    haversine_km(center, LatLon(point.latitude, point.longitude));
                if distance_km <= query.radius_km() {
                    candidates.push((OrderedFloat(distance_km), point.position));
                }
            }
        }

        // Envelopes split at the antimeridian share the ±180 edge; drop the doubles.
        candidates.sort_unstable();
        candidates.dedup_by_key(|(_, position)| *position);

        if let Some(limit) = limit {
            candidates.truncate(limit);
        }
        log::debug!(
            "Indexed radius query ({}, {}) r={} km matched {} stations",
            center.0,
            center.1,
            query.radius_km(),
            candidates.len()
        );
        candidates
            .into_iter()
            .map(|(distance_km, position)| ProximityResult {
                station: &self.stations[position],
                distance_km: distance_km.into_inner(),
            })
            .collect()
    }

    /// The closest station within the query radius, if any.
    pub fn nearest_within(&self, query: &QueryPoint) -> Option<ProximityResult<'_>> {
        self.query(query, Some(1)).into_iter().next()
    }
}

/// Latitude/longitude boxes that together cover every point within `radius_km` of `center`.
///
/// The longitude half-width follows the bounding-circle formula
/// `asin(sin(r) / cos(lat))`. When the circle reaches a pole, every longitude is covered;
/// when it crosses the antimeridian, the box is split in two.
fn search_envelopes(center: LatLon, radius_km: f64) -> Vec<AABB<[f64; 2]>> {
    let LatLon(lat, lon) = center;
    let angular = radius_km / EARTH_RADIUS_KM;
    let d_lat = angular.to_degrees() + ENVELOPE_PAD_DEG;
    let min_lat = (lat - d_lat).max(-90.0);
    let max_lat = (lat + d_lat).min(90.0);

    let all_longitudes = || vec![AABB::from_corners([min_lat, -180.0], [max_lat, 180.0])];

    if angular >= PI || min_lat <= -90.0 || max_lat >= 90.0 {
        return all_longitudes();
    }
    let ratio = angular.sin() / lat.to_radians().cos();
    if ratio >= 1.0 {
        return all_longitudes();
    }

    let d_lon = ratio.asin().to_degrees() + ENVELOPE_PAD_DEG;
    let min_lon = lon - d_lon;
    let max_lon = lon + d_lon;
    if min_lon < -180.0 {
        vec![
            AABB::from_corners([min_lat, min_lon + 360.0], [max_lat, 180.0]),
            AABB::from_corners([min_lat, -180.0], [max_lat, max_lon]),
        ]
    } else if max_lon > 180.0 {
        vec![
            AABB::from_corners([min_lat, min_lon], [max_lat, 180.0]),
            AABB::from_corners([min_lat, -180.0], [max_lat, max_lon - 360.0]),
        ]
    } else {
        vec![AABB::from_corners([min_lat, min_lon], [max_lat, max_lon])]
    }
}
