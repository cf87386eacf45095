use crate::proximity::distance::haversine_km;
use crate::types::proximity::ProximityResult;
use crate::types::query::QueryPoint;
use crate::types::station::Station;
use ordered_float::OrderedFloat;

/// Finds every station within `query.radius_km()` of the query point, closest first.
///
/// Stations without coordinates are skipped. Distances are great-circle distances computed
/// with [`haversine_km`]; a station exactly on the radius is included. The sort is stable, so
/// stations at equal distance keep their order from `stations`. If `limit` is given, at most
/// that many results are returned.
///
/// This is a linear scan over `stations`. For repeated queries against the same collection,
/// [`crate::StationLocator`] gives the same results without visiting every station.
///
/// # Examples
///
/// ```
/// use bom_stations::{find_within_radius, QueryPoint, Station};
///
/// let stations = vec![
///     Station::builder().id("1").name("Sydney Obs").latitude(-33.86).longitude(151.20).build(),
///     Station::builder().id("2").name("Newcastle").latitude(-32.9283).longitude(151.7817).build(),
/// ];
///
/// let query = QueryPoint::new(-33.8688, 151.2093, 50.0)?;
/// let results = find_within_radius(&query, &stations, None);
/// assert_eq!(results.len(), 1);
/// assert_eq!(results[0].station.name, "Sydney Obs");
/// # Ok::<(), bom_stations::ProximityError>(())
/// ```
pub fn find_within_radius<'a>(
    query: &QueryPoint,
    stations: &'a [Station],
    limit: Option<usize>,
) -> Vec<ProximityResult<'a>> {
    if limit == Some(0) {
        return vec![];
    }

    let center = query.location();
    let mut results: Vec<ProximityResult<'a>> = stations
        .iter()
        .filter_map(|station| {
            let coordinates = station.coordinates()?;
            let distance_km = haversine_km(center, coordinates);
            (distance_km <= query.radius_km()).then_some(ProximityResult {
                station,
                distance_km,
            })
        })
        .collect();

    // `sort_by_key` is stable: equal distances keep input order.
    results.sort_by_key(|r| OrderedFloat(r.distance_km));

    if let Some(limit) = limit {
        results.truncate(limit);
    }
    log::debug!(
        "Radius query ({}, {}) r={} km matched {} of {} stations",
        center.0,
        center.1,
        query.radius_km(),
        results.len(),
        stations.len()
    );
    results
}
