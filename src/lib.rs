mod error;
mod finder;
mod proximity;
mod stations;
mod types;
mod utils;

pub use error::BomStationsError;
pub use finder::*;

pub use proximity::distance::{haversine_km, EARTH_RADIUS_KM};
pub use proximity::search::find_within_radius;

pub use stations::catalog::{StationCatalog, StationSource};
pub use stations::locate_station::StationLocator;
pub use stations::statistics::{overview, state_summary, stations_frame, CatalogOverview};

pub use types::proximity::{NearbyStations, ProximityResult};
pub use types::query::{LatLon, QueryPoint, SearchLocation};
pub use types::station::{DateRange, Station, StationLocation, StationMetrics};

pub use proximity::error::ProximityError;
pub use stations::error::CatalogError;
