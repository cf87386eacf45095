//! Summary statistics over a station collection: a plain overview, and a Polars frame
//! view for per-state aggregation.

use crate::types::station::Station;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;

/// Headline counts for a station collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogOverview {
    pub total_stations: usize,
    pub located_stations: usize,
    pub unlocated_stations: usize,
    /// Sum of `record_count` over all stations; stations without a count contribute nothing.
    pub total_records: u64,
    /// Distinct state codes, sorted.
    pub states: Vec<String>,
}

pub fn overview(stations: &[Station]) -> CatalogOverview {
    let located_stations = stations.iter().filter(|s| s.location.is_located()).count();
    let total_records = stations
        .iter()
        .filter_map(|s| s.metrics.record_count)
        .sum();
    let states: BTreeSet<&str> = stations.iter().filter_map(|s| s.state.as_deref()).collect();

    CatalogOverview {
        total_stations: stations.len(),
        located_stations,
        unlocated_stations: stations.len() - located_stations,
        total_records,
        states: states.into_iter().map(str::to_string).collect(),
    }
}

/// One row per station.
///
/// Columns: `id`, `name`, `state`, `latitude`, `longitude`, `elevation`, `record_count`,
/// `avg_rainfall_mm`, `avg_evapotranspiration_mm`, `avg_max_temp_c`, `avg_min_temp_c`.
/// Missing values are nulls.
pub fn stations_frame(stations: &[Station]) -> PolarsResult<DataFrame> {
    let coordinates: Vec<_> = stations.iter().map(|s| s.coordinates()).collect();

    df!(
        "id" => stations.iter().map(|s| s.id.clone()).collect::<Vec<String>>(),
        "name" => stations.iter().map(|s| s.name.clone()).collect::<Vec<String>>(),
        "state" => stations.iter().map(|s| s.state.clone()).collect::<Vec<Option<String>>>(),
        "latitude" => coordinates.iter().map(|c| c.map(|c| c.0)).collect::<Vec<Option<f64>>>(),
        "longitude" => coordinates.iter().map(|c| c.map(|c| c.1)).collect::<Vec<Option<f64>>>(),
        "elevation" => stations.iter().map(|s| s.elevation).collect::<Vec<Option<f64>>>(),
        "record_count" => stations.iter().map(|s| s.metrics.record_count).collect::<Vec<Option<u64>>>(),
        "avg_rainfall_mm" => stations.iter().map(|s| s.metrics.avg_rainfall_mm).collect::<Vec<Option<f64>>>(),
        "avg_evapotranspiration_mm" => stations.iter().map(|s| s.metrics.avg_evapotranspiration_mm).collect::<Vec<Option<f64>>>(),
        "avg_max_temp_c" => stations.iter().map(|s| s.metrics.avg_max_temp_c).collect::<Vec<Option<f64>>>(),
        "avg_min_temp_c" => stations.iter().map(|s| s.metrics.avg_min_temp_c).collect::<Vec<Option<f64>>>(),
    )
}

/// Per-state aggregates, sorted by state (stations without a state form a null group).
///
/// Columns:
/// * `state`
/// * `stations`: number of stations
/// * `located`: stations with coordinates
/// * `records`: total observation records
/// * `mean_rainfall_mm`: mean of the stations' average daily rainfall
/// * `mean_evapotranspiration_mm`: mean of the stations' average daily evapotranspiration
pub fn state_summary(stations: &[Station]) -> PolarsResult<LazyFrame> {
    Ok(stations_frame(stations)?
        .lazy()
        .group_by([col("state")])
        .agg([
            len().alias("stations"),
            col("latitude").count().alias("located"),
            col("record_count").sum().alias("records"),
            col("avg_rainfall_mm").mean().alias("mean_rainfall_mm"),
            col("avg_evapotranspiration_mm")
                .mean()
                .alias("mean_evapotranspiration_mm"),
        ])
        .sort(["state"], SortMultipleOptions::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::station::StationMetrics;

    fn station(
        id: &str,
        state: Option<&str>,
        coords: Option<(f64, f64)>,
        records: Option<u64>,
        rainfall: Option<f64>,
    ) -> Station {
        Station::builder()
            .id(id)
            .name(format!("Station {}", id))
            .maybe_state(state)
            .maybe_latitude(coords.map(|c| c.0))
            .maybe_longitude(coords.map(|c| c.1))
            .metrics(StationMetrics {
                record_count: records,
                avg_rainfall_mm: rainfall,
                ..Default::default()
            })
            .build()
    }

    fn sample() -> Vec<Station> {
        vec![
            station("1", Some("NSW"), Some((-33.86, 151.20)), Some(100), Some(3.0)),
            station("2", Some("NSW"), Some((-32.92, 151.80)), Some(50), Some(2.0)),
            station("3", Some("NSW"), None, None, None),
            station("4", Some("VIC"), Some((-37.83, 144.98)), Some(10), Some(1.5)),
            station("5", None, None, Some(5), None),
        ]
    }

    #[test]
    fn test_overview_counts() {
        let overview = overview(&sample());
        assert_eq!(overview.total_stations, 5);
        assert_eq!(overview.located_stations, 3);
        assert_eq!(overview.unlocated_stations, 2);
        assert_eq!(overview.total_records, 165);
        assert_eq!(overview.states, ["NSW", "VIC"]);
    }

    #[test]
    fn test_overview_empty() {
        let overview = overview(&[]);
        assert_eq!(overview.total_stations, 0);
        assert_eq!(overview.total_records, 0);
        assert!(overview.states.is_empty());
    }

    #[test]
    fn test_stations_frame_shape() -> Result<(), Box<dyn std::error::Error>> {
        let df = stations_frame(&sample())?;
        assert_eq!(df.height(), 5);
        assert_eq!(df.width(), 11);
        assert_eq!(df.column("latitude")?.null_count(), 2);
        assert_eq!(df.column("state")?.null_count(), 1);
        assert_eq!(df.column("record_count")?.dtype(), &DataType::UInt64);
        Ok(())
    }

    #[test]
    fn test_state_summary_nsw() -> Result<(), Box<dyn std::error::Error>> {
        let summary = state_summary(&sample())?;
        let nsw = summary
            .clone()
            .filter(col("state").eq(lit("NSW")))
            .collect()?;
        assert_eq!(nsw.height(), 1);
        assert_eq!(nsw.column("stations")?.u32()?.get(0), Some(3));
        assert_eq!(nsw.column("located")?.u32()?.get(0), Some(2));
        assert_eq!(nsw.column("records")?.u64()?.get(0), Some(150));
        assert_eq!(nsw.column("mean_rainfall_mm")?.f64()?.get(0), Some(2.5));

        // NSW, VIC and the null-state group.
        assert_eq!(summary.collect()?.height(), 3);
        Ok(())
    }
}
