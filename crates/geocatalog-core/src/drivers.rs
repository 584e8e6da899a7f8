//! Driver registry and extension based driver resolution.
//!
//! This module provides a static registry of geospatial file format drivers, split into
//! vector and raster tables the way GDAL/OGR splits them. A file is resolved against the
//! vector table first and the raster table second, using only its extension.
//!
//! # Examples
//!
//! ```
//! use std::path::Path;
//! use geocatalog_core::drivers::{DriverKind, find_driver, resolve_driver};
//!
//! let shapefile = find_driver("esri shapefile").expect("shapefile driver should exist");
//! assert!(shapefile.capabilities.info.is_supported());
//!
//! let resolved = resolve_driver(Path::new("dem/elevation.TIF")).expect("GeoTIFF resolves");
//! assert_eq!(resolved.driver.short_name, "GTiff");
//! assert_eq!(resolved.kind, DriverKind::Raster);
//! ```

use std::path::Path;

use log::info;

use crate::error::DriverError;
pub use geocatalog_core_common::drivers::{Driver, DriverCapabilities, DriverKind, SupportStatus};

/// Returns the vector format drivers.
#[must_use]
pub fn get_vector_drivers() -> Vec<Driver> {
    use DriverKind::Vector;
    use SupportStatus::{NotSupported, Planned, Supported};

    vec![
        Driver::new(
            "ESRI Shapefile",
            "ESRI Shapefile / DBF",
            Vector,
            &["shp", "dbf"],
            Supported,
        ),
        Driver::new("GeoJSON", "GeoJSON", Vector, &["geojson", "json"], Supported),
        Driver::new(
            "GeoJSONSeq",
            "GeoJSONSeq: sequence of GeoJSON features",
            Vector,
            &["geojsonl", "geojsons"],
            Supported,
        ),
        Driver::new(
            "CSV",
            "Comma Separated Value (.csv)",
            Vector,
            &["csv"],
            Supported,
        ),
        Driver::new("GPKG", "GeoPackage vector", Vector, &["gpkg"], Supported),
        Driver::new("FlatGeobuf", "FlatGeobuf", Vector, &["fgb"], Planned),
        Driver::new(
            "Parquet",
            "(Geo)Parquet",
            Vector,
            &["parquet", "geoparquet"],
            Supported,
        ),
        Driver::new(
            "GML",
            "Geography Markup Language",
            Vector,
            &["gml"],
            NotSupported,
        ),
        Driver::new("GPX", "GPS Exchange Format", Vector, &["gpx"], NotSupported),
        Driver::new(
            "KML",
            "Keyhole Markup Language",
            Vector,
            &["kml"],
            NotSupported,
        ),
        Driver::new(
            "MapInfo File",
            "MapInfo TAB and MIF/MID",
            Vector,
            &["tab", "mif", "mid"],
            NotSupported,
        ),
        Driver::new("DGN", "Microstation DGN", Vector, &["dgn"], NotSupported),
        Driver::new(
            "OGR_GMT",
            "GMT ASCII Vectors (.gmt)",
            Vector,
            &["gmt"],
            NotSupported,
        ),
        Driver::new("SQLite", "SQLite / Spatialite", Vector, &["sqlite"], NotSupported),
        Driver::new("DXF", "AutoCAD DXF", Vector, &["dxf"], NotSupported),
    ]
}

/// Returns the raster format drivers.
#[must_use]
pub fn get_raster_drivers() -> Vec<Driver> {
    use DriverKind::Raster;
    use SupportStatus::{NotSupported, Supported};

    vec![
        Driver::new(
            "GTiff",
            "GeoTIFF",
            Raster,
            &["tif", "tiff", "gtiff"],
            Supported,
        ),
        Driver::new(
            "AAIGrid",
            "Arc/Info ASCII Grid",
            Raster,
            &["asc"],
            Supported,
        ),
        Driver::new(
            "PNG",
            "Portable Network Graphics",
            Raster,
            &["png"],
            Supported,
        ),
        Driver::new("JPEG", "JPEG JFIF", Raster, &["jpg", "jpeg"], Supported),
        Driver::new(
            "GIF",
            "Graphics Interchange Format (.gif)",
            Raster,
            &["gif"],
            NotSupported,
        ),
        Driver::new(
            "BMP",
            "MS Windows Device Independent Bitmap",
            Raster,
            &["bmp"],
            NotSupported,
        ),
        Driver::new("VRT", "Virtual Raster", Raster, &["vrt"], NotSupported),
        Driver::new(
            "HFA",
            "Erdas Imagine Images (.img)",
            Raster,
            &["img"],
            NotSupported,
        ),
        Driver::new(
            "netCDF",
            "Network Common Data Format",
            Raster,
            &["nc"],
            Supported,
        ),
        Driver::new(
            "JP2OpenJPEG",
            "JPEG-2000 driver based on OpenJPEG library",
            Raster,
            &["jp2"],
            NotSupported,
        ),
        Driver::new("MBTiles", "MBTiles", Raster, &["mbtiles"], NotSupported),
        Driver::new(
            "ERS",
            "ERMapper .ers Labelled",
            Raster,
            &["ers"],
            NotSupported,
        ),
        Driver::new("XYZ", "ASCII Gridded XYZ", Raster, &["xyz"], NotSupported),
    ]
}

/// Returns the complete registry: vector drivers followed by raster drivers.
///
/// # Examples
///
/// ```
/// use geocatalog_core::drivers::get_drivers;
///
/// let all_drivers = get_drivers();
/// let info_capable = all_drivers
///     .iter()
///     .filter(|d| d.capabilities.info.is_supported())
///     .count();
/// assert_eq!(info_capable, 11);
/// ```
#[must_use]
pub fn get_drivers() -> Vec<Driver> {
    let mut drivers = get_vector_drivers();
    drivers.extend(get_raster_drivers());
    drivers
}

/// Returns the drivers whose schema or profile can be read.
#[must_use]
pub fn get_available_drivers() -> Vec<Driver> {
    list_drivers_with_status(SupportStatus::Supported)
}

/// Finds a driver by short name (case-insensitive).
///
/// # Examples
///
/// ```
/// use geocatalog_core::drivers::find_driver;
///
/// assert_eq!(find_driver("gtiff").map(|d| d.short_name), Some("GTiff"));
/// assert!(find_driver("NonExistent").is_none());
/// ```
#[must_use]
pub fn find_driver(name: &str) -> Option<Driver> {
    get_drivers()
        .into_iter()
        .find(|d| d.short_name.eq_ignore_ascii_case(name))
}

/// Lists drivers whose `info` capability has the given status.
#[must_use]
pub fn list_drivers_with_status(status: SupportStatus) -> Vec<Driver> {
    get_drivers()
        .into_iter()
        .filter(|d| d.capabilities.info == status)
        .collect()
}

/// Returns all driver short names in alphabetically sorted order.
#[must_use]
pub fn get_driver_names() -> Vec<&'static str> {
    let mut names: Vec<_> = get_drivers().iter().map(|d| d.short_name).collect();
    names.sort_unstable();
    names
}

/// Lowercase extension of `path`, without the dot.
#[must_use]
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn driver_from_extension(
    path: &Path,
    drivers: Vec<Driver>,
    kind: DriverKind,
) -> Result<Driver, DriverError> {
    let no_driver = || DriverError::NoDriverForExtension {
        path: path.to_path_buf(),
        kind: kind.as_str().to_string(),
    };
    let extension = file_extension(path).ok_or_else(no_driver)?;
    drivers
        .into_iter()
        .find(|d| d.matches_extension(&extension))
        .ok_or_else(no_driver)
}

/// Resolves the vector driver for `path` from its extension.
///
/// # Errors
///
/// Returns [`DriverError::NoDriverForExtension`] when no vector driver claims the extension.
pub fn vector_driver_from_extension(path: &Path) -> Result<Driver, DriverError> {
    driver_from_extension(path, get_vector_drivers(), DriverKind::Vector)
}

/// Resolves the raster driver for `path` from its extension.
///
/// # Errors
///
/// Returns [`DriverError::NoDriverForExtension`] when no raster driver claims the extension.
pub fn raster_driver_from_extension(path: &Path) -> Result<Driver, DriverError> {
    driver_from_extension(path, get_raster_drivers(), DriverKind::Raster)
}

/// A driver resolved for a concrete file.
#[derive(Debug, Clone)]
pub struct ResolvedDriver {
    /// The matching driver.
    pub driver: Driver,
    /// Which table it was found in.
    pub kind: DriverKind,
}

/// Resolves `path` against the vector table first, then the raster table.
#[must_use]
pub fn resolve_driver(path: &Path) -> Option<ResolvedDriver> {
    match vector_driver_from_extension(path) {
        Ok(driver) => {
            info!("Vector driver {} found for file {}", driver.short_name, path.display());
            return Some(ResolvedDriver {
                driver,
                kind: DriverKind::Vector,
            });
        },
        Err(e) => info!("No vector driver found for file {}: {e}", path.display()),
    }
    match raster_driver_from_extension(path) {
        Ok(driver) => {
            info!("Raster driver {} found for file {}", driver.short_name, path.display());
            Some(ResolvedDriver {
                driver,
                kind: DriverKind::Raster,
            })
        },
        Err(e) => {
            info!("No raster driver found for file {}: {e}", path.display());
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_driver() {
        let driver = find_driver("GeoJSON");
        assert!(driver.is_some());
        assert_eq!(driver.unwrap().short_name, "GeoJSON");
    }

    #[test]
    fn test_find_driver_case_insensitive() {
        let driver = find_driver("aaigrid");
        assert!(driver.is_some());
        assert_eq!(driver.unwrap().short_name, "AAIGrid");
    }

    #[test]
    fn test_available_drivers() {
        let names: Vec<_> = get_available_drivers()
            .iter()
            .map(|d| d.short_name)
            .collect();
        assert_eq!(
            names,
            vec![
                "ESRI Shapefile",
                "GeoJSON",
                "GeoJSONSeq",
                "CSV",
                "GPKG",
                "Parquet",
                "GTiff",
                "AAIGrid",
                "PNG",
                "JPEG",
                "netCDF"
            ]
        );
        assert!(get_available_drivers().len() < get_drivers().len());
    }

    #[test]
    fn test_list_planned_drivers() {
        let names: Vec<_> = list_drivers_with_status(SupportStatus::Planned)
            .iter()
            .map(|d| d.short_name)
            .collect();
        assert_eq!(names, vec!["FlatGeobuf"]);
        assert!(
            list_drivers_with_status(SupportStatus::NotSupported)
                .iter()
                .all(|d| !d.capabilities.info.is_available())
        );
    }

    #[test]
    fn test_driver_names_are_sorted_and_unique() {
        let names = get_driver_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_extensions_are_unique_per_table() {
        for drivers in [get_vector_drivers(), get_raster_drivers()] {
            let mut extensions: Vec<_> = drivers.iter().flat_map(|d| d.extensions).collect();
            let total = extensions.len();
            extensions.sort_unstable();
            extensions.dedup();
            assert_eq!(extensions.len(), total);
        }
    }

    #[test]
    fn test_vector_table_wins() {
        let resolved = resolve_driver(Path::new("/data/roads.SHP")).unwrap();
        assert_eq!(resolved.driver.short_name, "ESRI Shapefile");
        assert_eq!(resolved.kind, DriverKind::Vector);

        let resolved = resolve_driver(Path::new("points.geojsonl")).unwrap();
        assert_eq!(resolved.driver.short_name, "GeoJSONSeq");
    }

    #[test]
    fn test_raster_fallback() {
        let resolved = resolve_driver(Path::new("scan.jpeg")).unwrap();
        assert_eq!(resolved.driver.short_name, "JPEG");
        assert_eq!(resolved.kind, DriverKind::Raster);
    }

    #[test]
    fn test_unresolved_extensions() {
        assert!(resolve_driver(Path::new("notes.txt")).is_none());
        assert!(resolve_driver(Path::new("Makefile")).is_none());

        let err = vector_driver_from_extension(Path::new("dem.tif")).unwrap_err();
        assert!(matches!(err, DriverError::NoDriverForExtension { .. }));
        assert!(raster_driver_from_extension(Path::new("roads.shp")).is_err());
    }
}
