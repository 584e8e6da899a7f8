//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions
//! for presenting drivers, scan results and dataset schemas in a human-readable format.

use tabled::{Table, Tabled};

use geocatalog_core::drivers::Driver;
use geocatalog_core::scan::CatalogData;
use geocatalog_core::types::DatasetInfo;

/// Table row representation for displaying column information.
#[derive(Tabled)]
pub struct ColumnRow {
    /// Name of the column.
    #[tabled(rename = "Column")]
    pub name: String,
    /// Catalog data type of the column.
    #[tabled(rename = "Type")]
    pub data_type: String,
    /// Native type string the catalog type was mapped from.
    #[tabled(rename = "Native Type")]
    pub native_type: String,
}

/// Table row representation for displaying driver information.
#[derive(Tabled)]
pub struct DriverRow {
    /// Short identifier for the driver (e.g., `GeoJSON`, `GTiff`).
    #[tabled(rename = "Short Name")]
    pub short_name: String,
    /// Full descriptive name of the driver format.
    #[tabled(rename = "Long Name")]
    pub long_name: String,
    /// `Vector` or `Raster`.
    #[tabled(rename = "Kind")]
    pub kind: String,
    /// File extensions the driver is resolved from.
    #[tabled(rename = "Extensions")]
    pub extensions: String,
    /// Support status for reading schema information.
    #[tabled(rename = "Info")]
    pub info: String,
}

impl From<&Driver> for DriverRow {
    fn from(d: &Driver) -> Self {
        Self {
            short_name: d.short_name.to_string(),
            long_name: d.long_name.to_string(),
            kind: d.kind.as_str().to_string(),
            extensions: d.extensions.join(", "),
            info: d.capabilities.info.as_str().to_string(),
        }
    }
}

/// Table row for one scanned table.
#[derive(Tabled)]
pub struct ScanRow {
    #[tabled(rename = "Driver")]
    pub driver: String,
    #[tabled(rename = "File")]
    pub file: String,
    #[tabled(rename = "Table")]
    pub table: String,
    #[tabled(rename = "Columns")]
    pub columns: usize,
}

/// Display drivers and their capabilities.
pub fn display_drivers(drivers: &[Driver]) {
    println!("\nDrivers ({} total):\n", drivers.len());
    let rows: Vec<DriverRow> = drivers.iter().map(DriverRow::from).collect();
    println!("{}", Table::new(rows));
}

/// Flattens scanned data into one row per table.
#[must_use]
pub fn scan_rows(data: &CatalogData) -> Vec<ScanRow> {
    let mut rows = Vec::new();
    for (driver, files) in data.iter() {
        for (path, tables) in files {
            for (table, properties) in tables {
                rows.push(ScanRow {
                    driver: driver.clone(),
                    file: path.display().to_string(),
                    table: table.clone(),
                    columns: properties.len(),
                });
            }
        }
    }
    rows
}

/// Display a summary of scanned data.
pub fn display_scan(data: &CatalogData) {
    println!(
        "\nScanned {} file(s), {} table(s)\n",
        data.file_count(),
        data.table_count()
    );
    if !data.is_empty() {
        println!("{}", Table::new(scan_rows(data)));
    }
}

/// Display dataset information in a formatted table.
///
/// This function presents the dataset driver and, for each table, its columns with
/// their catalog types, written to standard output.
///
/// # Arguments
///
/// * `info` - The dataset information to display
pub fn display_dataset_info(info: &DatasetInfo) {
    println!("\nDataset: {}", info.dataset);
    println!("Driver: {} ({})", info.driver, info.driver_long_name);
    println!("Kind: {}", info.kind);

    for table in &info.tables {
        println!("\n=== Table: {} ===", table.name);
        if table.columns.is_empty() {
            println!("(no columns)");
            continue;
        }

        let rows: Vec<ColumnRow> = table
            .columns
            .iter()
            .map(|c| ColumnRow {
                name: c.name.clone(),
                data_type: c.data_type.to_string(),
                native_type: c.description.clone(),
            })
            .collect();
        println!("{}", Table::new(rows));
    }
}
