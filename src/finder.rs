//! This module provides the main entry point of the crate: a client that loads a station
//! collection once and answers proximity queries against it.

use crate::error::BomStationsError;
use crate::stations::catalog::{StationCatalog, StationSource};
use crate::stations::locate_station::StationLocator;
use crate::stations::statistics::{overview, state_summary, CatalogOverview};
use crate::types::proximity::{NearbyStations, ProximityResult};
use crate::types::query::{LatLon, QueryPoint};
use crate::types::station::Station;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use polars::prelude::LazyFrame;
use std::path::PathBuf;

const DEFAULT_RADIUS_KM: f64 = 100.0;
const DEFAULT_NEAREST_MAX_DISTANCE_KM: f64 = 1.0;

/// The main client for finding weather stations.
///
/// Holds the station collection in memory, indexed for radius queries. Create one with
/// [`StationFinder::new()`] (default cache directory), [`StationFinder::with_cache_folder()`],
/// or [`StationFinder::from_stations()`] when the stations are already at hand.
///
/// `StationFinder` is immutable after construction, so it can be shared between threads
/// (e.g. behind an `Arc` in a web handler) without locking.
///
/// # Examples
///
/// ```rust
/// use bom_stations::{LatLon, Station, StationFinder};
///
/// let finder = StationFinder::from_stations(vec![
///     Station::builder().id("1").name("Sydney Obs").latitude(-33.86).longitude(151.20).build(),
///     Station::builder().id("2").name("Newcastle").latitude(-32.9283).longitude(151.7817).build(),
/// ]);
///
/// let results = finder
///     .find_stations()
///     .location(LatLon(-33.8688, 151.2093))
///     .radius_km(50.0)
///     .call()?;
/// assert_eq!(results.len(), 1);
/// # Ok::<(), bom_stations::BomStationsError>(())
/// ```
#[derive(Debug, Clone)]
pub struct StationFinder {
    locator: StationLocator,
}

#[bon]
impl StationFinder {
    /// Loads the stations from `source`, caching remote sources under `cache_folder`.
    ///
    /// For URL sources the directory is created if it doesn't exist. File sources never touch it.
    ///
    /// # Errors
    ///
    /// Returns [`BomStationsError::CacheDirCreation`] if the directory cannot be created, and
    /// [`BomStationsError::Catalog`] if loading or parsing the station list fails.
    pub async fn with_cache_folder(
        cache_folder: PathBuf,
        source: StationSource,
    ) -> Result<Self, BomStationsError> {
        Self::load()
            .cache_folder(cache_folder)
            .source(source)
            .call()
            .await
    }

    /// Loads the stations from `source` using the default cache directory
    /// (e.g. `~/.cache/bom_stations_cache` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`BomStationsError::CacheDirResolution`] if the default cache directory cannot
    /// be found, plus everything [`StationFinder::with_cache_folder`] can return.
    pub async fn new(source: StationSource) -> Result<Self, BomStationsError> {
        Self::load().source(source).call().await
    }

    /// Loads the stations from `source`.
    ///
    /// * `.source(StationSource)`: **Required.**
    /// * `.cache_folder(PathBuf)`: Optional. Defaults to the system cache directory. Only used
    ///   for URL sources.
    /// * `.refresh(bool)`: Optional. Re-download URL sources even if cached. Defaults to `false`.
    #[builder]
    pub async fn load(
        source: StationSource,
        cache_folder: Option<PathBuf>,
        refresh: Option<bool>,
    ) -> Result<Self, BomStationsError> {
        let cache_folder = match source {
            StationSource::File(_) => cache_folder.unwrap_or_default(),
            StationSource::Url(_) => {
                let folder = match cache_folder {
                    Some(folder) => folder,
                    None => get_cache_dir().map_err(BomStationsError::CacheDirResolution)?,
                };
                ensure_cache_dir_exists(&folder)
                    .await
                    .map_err(|e| BomStationsError::CacheDirCreation(folder.clone(), e))?;
                folder
            }
        };

        let stations = StationCatalog::new(&cache_folder)
            .load(&source, refresh.unwrap_or(false))
            .await?;
        Ok(Self::from_stations(stations))
    }

    /// Wraps an already loaded station collection.
    pub fn from_stations(stations: Vec<Station>) -> Self {
        StationFinder {
            locator: StationLocator::new(stations),
        }
    }

    /// Finds weather stations within a radius of a location, closest first.
    ///
    /// * `.location(LatLon)`: **Required.** The search center.
    /// * `.radius_km(f64)`: Optional. Search radius in kilometers. Defaults to `100.0`.
    /// * `.station_limit(usize)`: Optional. Maximum number of stations returned. No limit by default.
    ///
    /// # Errors
    ///
    /// Returns [`BomStationsError::Proximity`] if the location is out of range or the radius
    /// is negative or not finite. Finding nothing is not an error.
    #[builder]
    pub fn find_stations<'a>(
        &'a self,
        location: LatLon,
        radius_km: Option<f64>,
        station_limit: Option<usize>,
    ) -> Result<Vec<ProximityResult<'a>>, BomStationsError> {
        let query = QueryPoint::around(location, radius_km.unwrap_or(DEFAULT_RADIUS_KM))?;
        Ok(self.locator.query(&query, station_limit))
    }

    /// Same query as [`StationFinder::find_stations`], wrapped in a [`NearbyStations`] envelope
    /// that records the search location and radius.
    #[builder]
    pub fn nearby<'a>(
        &'a self,
        location: LatLon,
        radius_km: Option<f64>,
        station_limit: Option<usize>,
    ) -> Result<NearbyStations<'a>, BomStationsError> {
        let query = QueryPoint::around(location, radius_km.unwrap_or(DEFAULT_RADIUS_KM))?;
        Ok(NearbyStations::new(
            &query,
            self.locator.query(&query, station_limit),
        ))
    }

    /// The closest station to `location`, if one lies within `max_distance_km`
    /// (defaults to `1.0`). Useful to check whether a point already has a station.
    #[builder]
    pub fn nearest_station<'a>(
        &'a self,
        location: LatLon,
        max_distance_km: Option<f64>,
    ) -> Result<Option<ProximityResult<'a>>, BomStationsError> {
        let query = QueryPoint::around(
            location,
            max_distance_km.unwrap_or(DEFAULT_NEAREST_MAX_DISTANCE_KM),
        )?;
        Ok(self.locator.nearest_within(&query))
    }

    /// Looks a station up by its identifier.
    pub fn station(&self, id: &str) -> Option<&Station> {
        self.locator.get(id)
    }

    /// Headline counts over the loaded stations.
    pub fn overview(&self) -> CatalogOverview {
        overview(self.locator.stations())
    }

    /// Per-state aggregates as a Polars `LazyFrame`. See [`crate::state_summary`].
    pub fn state_summary(&self) -> Result<LazyFrame, BomStationsError> {
        Ok(state_summary(self.locator.stations())?)
    }

    pub fn locator(&self) -> &StationLocator {
        &self.locator
    }
}
