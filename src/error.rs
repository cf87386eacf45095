use crate::proximity::error::ProximityError;
use crate::stations::error::CatalogError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BomStationsError {
    #[error(transparent)]
    Proximity(#[from] ProximityError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Failed to build station statistics")]
    Statistics(#[from] PolarsError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
