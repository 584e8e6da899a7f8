//! `geocatalog-core` is the core library for the `GeoCatalog` project: it scans
//! geospatial files and publishes their schemas as catalog creation requests.
//!
//! This crate includes:
//! - **Driver Registry**: vector and raster drivers with extension based resolution.
//! - **Scanning**: directory walks and single-file reads through the format readers.
//! - **Type Mapping**: native schema types to catalog column types.
//! - **Catalog Requests**: service, database, schema and table creation requests.
//! - **Source**: the connector lifecycle, including remote files.

pub mod catalog;
pub mod config;
pub mod drivers;
pub mod error;
pub mod mapping;
pub mod operations;
pub mod scan;
pub mod source;
pub mod types;

pub use catalog::{CreateRequest, SchemaNaming};
pub use config::ConnectorConfig;
pub use error::{GeoCatalogError, Result};
pub use source::{Source, SpatialSource};
