//! Vector format schema readers for `GeoCatalog`.
//!
//! Each reader implements [`VectorSchemaReader`] and turns a file into one
//! [`LayerSchema`](geocatalog_core_common::LayerSchema) per layer:
//!
//! - [`GeoJsonReader`] / [`GeoJsonSeqReader`]: inferred from the features
//! - [`CsvReader`]: inferred from sampled records, WKT or coordinate geometry
//! - [`GeoParquetReader`]: Parquet footer and GeoParquet `geo` metadata
//! - [`OgrReader`]: ESRI Shapefile and GeoPackage through GDAL/OGR

pub mod delimited;
pub mod geoparquet;
pub mod infer;
pub mod json;
pub mod ogr;

pub use delimited::{CsvReader, CsvSchemaOptions};
use geocatalog_core_common::VectorSchemaReader;
pub use geoparquet::{ArrowDataTypeExt, GeoParquetReader};
pub use json::{GeoJsonReader, GeoJsonSeqReader};
pub use ogr::OgrReader;

/// Returns the schema reader registered for a vector driver short name.
#[must_use]
pub fn reader_for_driver(short_name: &str) -> Option<Box<dyn VectorSchemaReader>> {
    let reader: Box<dyn VectorSchemaReader> = match short_name {
        "GeoJSON" => Box::new(GeoJsonReader),
        "GeoJSONSeq" => Box::new(GeoJsonSeqReader),
        "CSV" => Box::new(CsvReader::default()),
        "ESRI Shapefile" => Box::new(OgrReader::new("ESRI Shapefile")),
        "GPKG" => Box::new(OgrReader::new("GPKG")),
        "Parquet" => Box::new(GeoParquetReader),
        _ => return None,
    };
    Some(reader)
}
