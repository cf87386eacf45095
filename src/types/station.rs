//! Defines the data structures representing BOM weather stations and their summary metrics,
//! the flat record form they are exchanged in, and the point type used for spatial indexing
//! with the `rstar` crate.

use crate::types::query::{latitude_in_range, longitude_in_range, LatLon};
use bon::bon;
use chrono::NaiveDate;
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Deserializer, Serialize};

// --- Data Structures ---

/// Represents a single weather station and its summary metrics.
///
/// A `Station` is read-only to this crate: it is produced by whatever ingests the station list
/// (a JSON export, a database query) and only consumed by the proximity queries.
///
/// On the wire a station is one flat JSON object, e.g.
///
/// ```json
/// {"id": "066062", "name": "Sydney (Observatory Hill)", "state": "NSW",
///  "latitude": -33.8607, "longitude": 151.205, "record_count": 3650,
///  "avg_rainfall": 3.36, "avg_evapotranspiration": 3.9}
/// ```
///
/// Records without usable coordinates deserialize to [`StationLocation::Unlocated`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StationRecord", into = "StationRecord")]
pub struct Station {
    /// The station identifier (the BOM station code, e.g. "066062").
    pub id: String,
    /// Display name (e.g. "Sydney (Observatory Hill)").
    pub name: String,
    /// State or territory code (e.g. "NSW", "VIC"), if known.
    pub state: Option<String>,
    /// Where the station is, if known.
    pub location: StationLocation,
    /// Elevation above sea level in meters, if available.
    pub elevation: Option<f64>,
    /// Aggregates over the station's observation history.
    pub metrics: StationMetrics,
}

/// Whether a station has a usable coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StationLocation {
    /// Latitude and longitude, both finite and within WGS84 ranges.
    Located(LatLon),
    /// Coordinates are missing or invalid. Such stations never appear in proximity results.
    Unlocated,
}

impl StationLocation {
    /// Builds a location from optional raw coordinates. Anything other than two finite,
    /// in-range values yields [`StationLocation::Unlocated`].
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) if latitude_in_range(lat) && longitude_in_range(lon) => {
                StationLocation::Located(LatLon(lat, lon))
            }
            _ => StationLocation::Unlocated,
        }
    }

    pub fn coordinates(&self) -> Option<LatLon> {
        match self {
            StationLocation::Located(lat_lon) => Some(*lat_lon),
            StationLocation::Unlocated => None,
        }
    }

    pub fn is_located(&self) -> bool {
        matches!(self, StationLocation::Located(_))
    }
}

/// Summary statistics for a station's observation history.
///
/// All fields are optional; a freshly registered station has none of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationMetrics {
    /// Number of daily observation records held for the station.
    pub record_count: Option<u64>,
    /// Average daily rainfall (mm, 09:00 to 09:00).
    pub avg_rainfall_mm: Option<f64>,
    /// Average daily evapotranspiration (mm).
    pub avg_evapotranspiration_mm: Option<f64>,
    /// Average daily maximum temperature (°C).
    pub avg_max_temp_c: Option<f64>,
    /// Average daily minimum temperature (°C).
    pub avg_min_temp_c: Option<f64>,
    /// First and last observation dates.
    pub observed: DateRange,
}

/// Represents a date range with optional start and end dates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRange {
    /// The earliest observation date, if known.
    pub start: Option<NaiveDate>,
    /// The latest observation date, if known.
    pub end: Option<NaiveDate>,
}

#[bon]
impl Station {
    /// Builds a station from raw record values.
    ///
    /// Coordinates go through the same validation as deserialized records, so a missing or
    /// out-of-range latitude or longitude produces an unlocated station.
    ///
    /// # Examples
    ///
    /// ```
    /// use bom_stations::{LatLon, Station, StationLocation};
    ///
    /// let station = Station::builder()
    ///     .id("066062")
    ///     .name("Sydney (Observatory Hill)")
    ///     .state("NSW")
    ///     .latitude(-33.8607)
    ///     .longitude(151.2050)
    ///     .build();
    /// assert_eq!(station.location, StationLocation::Located(LatLon(-33.8607, 151.2050)));
    ///
    /// let unlocated = Station::builder().id("X").name("Nowhere").latitude(-33.0).build();
    /// assert!(!unlocated.location.is_located());
    /// ```
    #[builder]
    pub fn new(
        #[builder(into)] id: String,
        #[builder(into)] name: String,
        #[builder(into)] state: Option<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        elevation: Option<f64>,
        metrics: Option<StationMetrics>,
    ) -> Self {
        Station {
            id,
            name,
            state,
            location: StationLocation::from_parts(latitude, longitude),
            elevation,
            metrics: metrics.unwrap_or_default(),
        }
    }

    /// The station's coordinates, if it has any.
    pub fn coordinates(&self) -> Option<LatLon> {
        self.location.coordinates()
    }
}

// --- Wire Format ---

/// The flat record a [`Station`] is serialized as. Field names follow the JSON the
/// station listing endpoint produced; `station_code`/`station_name` are accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StationRecord {
    #[serde(alias = "station_code")]
    id: String,
    #[serde(alias = "station_name")]
    name: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    elevation: Option<f64>,
    #[serde(default)]
    record_count: Option<u64>,
    #[serde(default)]
    avg_rainfall: Option<f64>,
    #[serde(default)]
    avg_evapotranspiration: Option<f64>,
    #[serde(default)]
    avg_max_temp: Option<f64>,
    #[serde(default)]
    avg_min_temp: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    date_range_start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    date_range_end: Option<NaiveDate>,
}

// The listing endpoint emits "" for stations without observations.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl From<StationRecord> for Station {
    fn from(record: StationRecord) -> Self {
        let location = StationLocation::from_parts(record.latitude, record.longitude);
        if !location.is_located() && record.latitude.is_some() && record.longitude.is_some() {
            log::warn!(
                "Station {} has invalid coordinates ({:?}, {:?}); treating it as unlocated",
                record.id,
                record.latitude,
                record.longitude
            );
        }
        Station {
            id: record.id,
            name: record.name,
            state: record.state,
            location,
            elevation: record.elevation,
            metrics: StationMetrics {
                record_count: record.record_count,
                avg_rainfall_mm: record.avg_rainfall,
                avg_evapotranspiration_mm: record.avg_evapotranspiration,
                avg_max_temp_c: record.avg_max_temp,
                avg_min_temp_c: record.avg_min_temp,
                observed: DateRange {
                    start: record.date_range_start,
                    end: record.date_range_end,
                },
            },
        }
    }
}

impl From<Station> for StationRecord {
    fn from(station: Station) -> Self {
        let coordinates = station.location.coordinates();
        StationRecord {
            id: station.id,
            name: station.name,
            state: station.state,
            latitude: coordinates.map(|c| c.0),
            longitude: coordinates.map(|c| c.1),
            elevation: station.elevation,
            record_count: station.metrics.record_count,
            avg_rainfall: station.metrics.avg_rainfall_mm,
            avg_evapotranspiration: station.metrics.avg_evapotranspiration_mm,
            avg_max_temp: station.metrics.avg_max_temp_c,
            avg_min_temp: station.metrics.avg_min_temp_c,
            date_range_start: station.metrics.observed.start,
            date_range_end: station.metrics.observed.end,
        }
    }
}

// --- R-Tree Implementations ---

/// A located station as stored in the spatial index: its coordinates plus its position in the
/// station slice the index was built from.
///
/// Keeping the position instead of the station itself lets the index live next to the
/// station list without cloning it, and gives queries a stable tie-breaker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StationPoint {
    pub(crate) position: usize,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
}

/// Implementation required by `rstar` to treat a `StationPoint` as an object within an R-Tree.
impl RTreeObject for StationPoint {
    /// An Axis-Aligned Bounding Box in (latitude, longitude) degree space.
    type Envelope = AABB<[f64; 2]>;

    /// A station is a point, so its envelope is the degenerate box containing only that point.
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.latitude, self.longitude])
    }
}

/// Squared Euclidean distance in degree space.
///
/// This is only used by `rstar` internally; geographic distances are always computed with the
/// haversine formula after the candidate set has been narrowed down.
impl PointDistance for StationPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.latitude - point[0];
        let dy = self.longitude - point[1];
        dx * dx + dy * dy
    }
}
