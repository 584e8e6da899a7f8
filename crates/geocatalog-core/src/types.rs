//! Data types describing a single inspected file.

use crate::catalog::Column;

/// Information about a dataset.
#[derive(Debug, Clone)]
pub struct DatasetInfo {
    /// Path to the dataset
    pub dataset: String,
    /// Driver name
    pub driver: String,
    /// Driver long name
    pub driver_long_name: String,
    /// `Vector` or `Raster`
    pub kind: String,
    /// One entry per layer, or a single `profile` table for rasters
    pub tables: Vec<TableInfo>,
}

/// Information about one table of a dataset.
#[derive(Debug, Clone)]
pub struct TableInfo {
    /// Layer name or `profile`
    pub name: String,
    /// Columns with their catalog types
    pub columns: Vec<Column>,
}
