use bom_stations::{BomStationsError, StationFinder, StationSource};
use std::path::PathBuf;

/// Loads a station export (JSON, optionally gzipped) given on the command line and prints
/// summary statistics.
///
/// `cargo run --example catalog_statistics -- stations.json.gz`
#[tokio::main]
async fn main() -> Result<(), BomStationsError> {
    let source = match std::env::args().nth(1) {
        Some(arg) if arg.starts_with("http://") || arg.starts_with("https://") => {
            StationSource::Url(arg)
        }
        Some(arg) => StationSource::File(PathBuf::from(arg)),
        None => {
            eprintln!("usage: catalog_statistics <stations.json[.gz] | url>");
            return Ok(());
        }
    };

    let finder = StationFinder::new(source).await?;
    let overview = finder.overview();
    println!(
        "{} stations ({} located, {} without coordinates), {} records",
        overview.total_stations,
        overview.located_stations,
        overview.unlocated_stations,
        overview.total_records
    );

    let summary = finder.state_summary()?.collect()?;
    println!("{}", summary);
    Ok(())
}
