//! Common types and traits shared across `GeoCatalog` crates.
//!
//! This crate provides the abstractions shared between `geocatalog-core` and the
//! format reader crates, preventing circular dependencies.

pub mod crs;
pub mod drivers;
pub mod error;
pub mod io;
pub mod schema;

// Re-export commonly used types
pub use crs::Crs;
pub use drivers::{Driver, DriverCapabilities, DriverKind, SupportStatus};
pub use error::{SchemaReadError, SchemaResult, SourcePosition};
pub use io::{RasterProfileReader, VectorSchemaReader, layer_name_from_path};
pub use schema::{
    FieldSchema, FileSchema, GEOMETRY_KEY, LayerSchema, Property, RASTER_PROFILE_TABLE,
    RasterProfile,
};
