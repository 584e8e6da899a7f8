//! High level operations used by the command line.

use std::path::Path;

use log::info;

use crate::catalog::{Column, CreateRequest};
use crate::config::ConnectorConfig;
use crate::drivers::resolve_driver;
use crate::error::{DriverError, FormatError, IoError, Result};
use crate::scan::FileReader;
use crate::source::{Source, SpatialSource};
use crate::types::{DatasetInfo, TableInfo};

/// Runs a full ingestion: create, prepare, collect the requests and close.
///
/// # Errors
///
/// Returns the first configuration, scanning or reading error.
pub async fn ingest(config: ConnectorConfig) -> Result<Vec<CreateRequest>> {
    let mut source = SpatialSource::create(config)?;
    source.prepare().await?;
    let requests = source.requests();
    source.close();
    let requests = requests?;
    info!("Produced {} creation request(s)", requests.len());
    Ok(requests)
}

/// Reads a single file and describes its tables with mapped column types.
///
/// # Errors
///
/// Returns an error when the file is missing, no driver or reader handles it, or it
/// cannot be read.
pub fn info(path: &Path) -> Result<DatasetInfo> {
    if !path.is_file() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let resolved = resolve_driver(path).ok_or_else(|| DriverError::NoDriverForExtension {
        path: path.to_path_buf(),
        kind: "Vector or Raster".to_string(),
    })?;
    let driver = resolved.driver;
    let reader =
        FileReader::for_driver(&driver).ok_or_else(|| DriverError::OperationNotSupported {
            driver: driver.short_name.to_string(),
            operation: "schema reading".to_string(),
        })?;
    let schema = reader.read(path).map_err(|source| FormatError::Read {
        driver: driver.short_name.to_string(),
        path: path.to_path_buf(),
        source,
    })?;

    let tables = schema
        .tables()
        .into_iter()
        .map(|(name, properties)| TableInfo {
            name,
            columns: properties
                .iter()
                .map(|(key, value)| Column::from_property(key, value))
                .collect(),
        })
        .collect();

    Ok(DatasetInfo {
        dataset: path.display().to_string(),
        driver: driver.short_name.to_string(),
        driver_long_name: driver.long_name.to_string(),
        kind: resolved.kind.as_str().to_string(),
        tables,
    })
}
