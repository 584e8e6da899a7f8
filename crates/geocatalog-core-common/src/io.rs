//! Reader traits that format implementations provide.
//!
//! Vector formats expose one or more layers, each read into a [`LayerSchema`];
//! raster formats expose a single [`RasterProfile`].

use std::path::Path;

use crate::error::SchemaResult;
use crate::schema::{LayerSchema, RasterProfile};

/// Reads attribute schemas from a vector format.
pub trait VectorSchemaReader: Send + Sync {
    /// Lists the layer names contained in the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened or is not valid for this format.
    fn list_layers(&self, path: &Path) -> SchemaResult<Vec<String>>;

    /// Reads the schema of `layer` in the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the layer does not exist or cannot be parsed.
    fn read_layer(&self, path: &Path, layer: &str) -> SchemaResult<LayerSchema>;
}

/// Reads the profile of a raster format.
pub trait RasterProfileReader: Send + Sync {
    /// Reads CRS, band count, resolution and dimensions of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened or its header is invalid.
    fn read_profile(&self, path: &Path) -> SchemaResult<RasterProfile>;
}

/// Layer name derived from the file stem, as single-layer formats name their layer.
#[must_use]
pub fn layer_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
