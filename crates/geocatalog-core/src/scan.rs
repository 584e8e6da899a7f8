//! Directory and file scanning.
//!
//! Scanning resolves a driver for every file, reads its schema through the
//! matching format reader and accumulates the flattened tables in a
//! [`CatalogData`] keyed by driver, then file, then table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use geocatalog_core_common::{
    Driver, DriverKind, FileSchema, LayerSchema, Property, RasterProfile, RasterProfileReader,
    SchemaReadError, SchemaResult, VectorSchemaReader,
};
use log::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::BASE_SKIP_LIST;
use crate::drivers::{raster_driver_from_extension, resolve_driver, vector_driver_from_extension};
use crate::error::{DriverError, FormatError, Result, ScanError};

/// Tables of one file: table name to ordered `(key, native type)` properties.
pub type TableMap = BTreeMap<String, Vec<Property>>;

/// Everything scanned in one run: driver short name → file → tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogData {
    drivers: BTreeMap<String, BTreeMap<PathBuf, TableMap>>,
}

impl CatalogData {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the schema of `path` under `driver`, creating the driver bucket on first use.
    pub fn insert(&mut self, driver: &str, path: PathBuf, schema: &FileSchema) {
        let tables: TableMap = schema.tables().into_iter().collect();
        self.drivers
            .entry(driver.to_string())
            .or_default()
            .insert(path, tables);
    }

    /// Iterates drivers with their files.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<PathBuf, TableMap>)> {
        self.drivers.iter()
    }

    /// Driver short names in order.
    pub fn driver_names(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }

    /// Files recorded under `driver`.
    #[must_use]
    pub fn files(&self, driver: &str) -> Option<&BTreeMap<PathBuf, TableMap>> {
        self.drivers.get(driver)
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Number of files across all drivers.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.drivers.values().map(BTreeMap::len).sum()
    }

    /// Number of tables across all files.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.drivers
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }
}

/// Options for scanning directories.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Lowercase extensions that are never parsed.
    pub skip_list: Vec<String>,
    /// Whether to follow symbolic links
    pub follow_links: bool,
    /// Maximum directory depth to scan (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            skip_list: BASE_SKIP_LIST.iter().map(ToString::to_string).collect(),
            follow_links: false,
            max_depth: None,
        }
    }
}

impl ScanOptions {
    /// Returns `true` when the text after the last `.` of the file name, lowercased,
    /// is in the skip list.
    #[must_use]
    pub fn is_skipped(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        let suffix = file_name
            .rsplit('.')
            .next()
            .unwrap_or(file_name)
            .to_ascii_lowercase();
        self.skip_list.iter().any(|skip| *skip == suffix)
    }
}

/// The schema reader behind a driver.
pub enum FileReader {
    /// Layered vector reader.
    Vector(Box<dyn VectorSchemaReader>),
    /// Raster profile reader.
    Raster(Box<dyn RasterProfileReader>),
}

impl FileReader {
    /// Looks up the reader implementing `driver`, if any.
    #[must_use]
    pub fn for_driver(driver: &Driver) -> Option<Self> {
        match driver.kind {
            DriverKind::Vector => {
                geocatalog_vector::reader_for_driver(driver.short_name).map(FileReader::Vector)
            },
            DriverKind::Raster => {
                geocatalog_raster::reader_for_driver(driver.short_name).map(FileReader::Raster)
            },
        }
    }

    /// Reads the schema of `path`.
    ///
    /// # Errors
    ///
    /// Returns the reader error for unreadable files.
    pub fn read(&self, path: &Path) -> SchemaResult<FileSchema> {
        match self {
            FileReader::Vector(reader) => {
                parse_vector_file(reader.as_ref(), path).map(FileSchema::Vector)
            },
            FileReader::Raster(reader) => {
                parse_raster_file(reader.as_ref(), path).map(FileSchema::Raster)
            },
        }
    }
}

/// Reads every layer of a vector file. Layers that fail to read are logged and skipped.
///
/// # Errors
///
/// Returns an error when the layers cannot be listed.
pub fn parse_vector_file(
    reader: &dyn VectorSchemaReader,
    path: &Path,
) -> SchemaResult<Vec<LayerSchema>> {
    let layers = reader.list_layers(path).inspect_err(|e| {
        error!("Error listing layers in file {}: {e}", path.display());
    })?;

    let mut schemas = Vec::with_capacity(layers.len());
    for layer in layers {
        match reader.read_layer(path, &layer) {
            Ok(schema) => schemas.push(schema),
            Err(e) => error!("Error reading layer {layer} in file {}: {e}", path.display()),
        }
    }
    Ok(schemas)
}

/// Reads the profile of a raster file.
///
/// # Errors
///
/// Returns the reader error unchanged.
pub fn parse_raster_file(
    reader: &dyn RasterProfileReader,
    path: &Path,
) -> SchemaResult<RasterProfile> {
    reader.read_profile(path).inspect_err(|_| {
        error!("Error reading raster file: {}", path.display());
    })
}

fn read_file(driver: &Driver, reader: &FileReader, path: &Path) -> Result<FileSchema> {
    reader.read(path).map_err(|source: SchemaReadError| {
        FormatError::Read {
            driver: driver.short_name.to_string(),
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Walks `root` and records every readable geospatial file.
///
/// Vector drivers are resolved for all files first; files no vector driver claims are
/// then tried against the raster drivers.
///
/// # Errors
///
/// Returns an error when the walk fails or any resolved file cannot be read.
pub fn scan_directory(root: &Path, options: &ScanOptions) -> Result<CatalogData> {
    let mut walker = WalkDir::new(root)
        .contents_first(true)
        .follow_links(options.follow_links)
        .sort_by_file_name();
    if let Some(max) = options.max_depth {
        walker = walker.max_depth(max);
    }

    let mut parsing: Vec<(PathBuf, Driver)> = Vec::new();
    let mut no_vector_driver: Vec<PathBuf> = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| {
            error!("Error reading geospatial directory: {source}");
            ScanError::Walk {
                root: root.to_path_buf(),
                source,
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if options.is_skipped(&path) {
            debug!("Skipping {}", path.display());
            continue;
        }
        match vector_driver_from_extension(&path) {
            Ok(driver) => parsing.push((path, driver)),
            Err(e) => {
                info!("Error finding vector driver for file {}: {e}", path.display());
                no_vector_driver.push(path);
            },
        }
    }

    for path in no_vector_driver {
        match raster_driver_from_extension(&path) {
            Ok(driver) => parsing.push((path, driver)),
            Err(e) => info!("Error finding raster driver for file {}: {e}", path.display()),
        }
    }

    let mut data = CatalogData::new();
    for (path, driver) in parsing {
        let Some(reader) = FileReader::for_driver(&driver) else {
            warn!(
                "No schema reader for {} driver, ignoring {}",
                driver.short_name,
                path.display()
            );
            continue;
        };
        let schema = read_file(&driver, &reader, &path)?;
        data.insert(driver.short_name, path, &schema);
    }
    info!(
        "Scanned {}: {} file(s) across {} driver(s)",
        root.display(),
        data.file_count(),
        data.drivers.len()
    );
    Ok(data)
}

/// Reads a single file and records it under its own path.
///
/// # Errors
///
/// Returns an error when no driver or reader handles the file, or it cannot be read.
pub fn scan_file(path: &Path) -> Result<CatalogData> {
    scan_file_as(path, path.to_path_buf())
}

/// Reads the file at `path` and records it under `key`, e.g. the URL it was downloaded from.
///
/// # Errors
///
/// Returns an error when no driver or reader handles the file, or it cannot be read.
pub fn scan_file_as(path: &Path, key: PathBuf) -> Result<CatalogData> {
    let resolved = resolve_driver(path).ok_or_else(|| DriverError::NoDriverForExtension {
        path: key.clone(),
        kind: "Vector or Raster".to_string(),
    })?;
    let driver = resolved.driver;
    let reader =
        FileReader::for_driver(&driver).ok_or_else(|| DriverError::OperationNotSupported {
            driver: driver.short_name.to_string(),
            operation: "schema reading".to_string(),
        })?;

    let schema = read_file(&driver, &reader, path)?;
    let mut data = CatalogData::new();
    data.insert(driver.short_name, key, &schema);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_list_uses_last_suffix() {
        let options = ScanOptions::default();
        assert!(options.is_skipped(Path::new("/data/roads.shx")));
        assert!(options.is_skipped(Path::new("/data/roads.DBF")));
        assert!(options.is_skipped(Path::new("/data/parcels.shp.xml")));
        assert!(options.is_skipped(Path::new("/data/lock")));
        assert!(!options.is_skipped(Path::new("/data/roads.shp")));
        assert!(!options.is_skipped(Path::new("/data/dbf.geojson")));
    }

    #[test]
    fn catalog_data_buckets() {
        let mut data = CatalogData::new();
        assert!(data.is_empty());

        let profile = RasterProfile {
            crs: None,
            count: 1,
            res: (1.0, 1.0),
            width: 2,
            height: 2,
        };
        data.insert("GTiff", PathBuf::from("/a.tif"), &FileSchema::Raster(profile.clone()));
        data.insert("GTiff", PathBuf::from("/b.tif"), &FileSchema::Raster(profile));
        data.insert(
            "GeoJSON",
            PathBuf::from("/c.geojson"),
            &FileSchema::Vector(vec![LayerSchema::new("c"), LayerSchema::new("d")]),
        );

        assert_eq!(data.driver_names().collect::<Vec<_>>(), vec!["GTiff", "GeoJSON"]);
        assert_eq!(data.file_count(), 3);
        assert_eq!(data.table_count(), 4);
        let tiffs = data.files("GTiff").unwrap();
        assert!(tiffs[Path::new("/a.tif")].contains_key("profile"));
    }

    #[test]
    fn scan_file_without_driver() {
        let err = scan_file(Path::new("/nowhere/readme.txt")).unwrap_err();
        assert!(err.to_string().contains("No Vector or Raster driver found"));
    }

    #[test]
    fn scan_file_without_reader() {
        let err = scan_file(Path::new("/nowhere/world.fgb")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Driver 'FlatGeobuf' does not support schema reading"
        );
    }

    /// Two-layer reader whose `broken` layer always fails.
    struct FlakyReader;

    impl VectorSchemaReader for FlakyReader {
        fn list_layers(&self, _path: &Path) -> SchemaResult<Vec<String>> {
            Ok(vec!["roads".to_string(), "broken".to_string()])
        }

        fn read_layer(&self, path: &Path, layer: &str) -> SchemaResult<LayerSchema> {
            match layer {
                "roads" => Ok(LayerSchema::new("roads")),
                _ => Err(SchemaReadError::parse("corrupt layer", path)),
            }
        }
    }

    /// Reader that cannot even list its layers.
    struct UnlistableReader;

    impl VectorSchemaReader for UnlistableReader {
        fn list_layers(&self, path: &Path) -> SchemaResult<Vec<String>> {
            Err(SchemaReadError::parse("not a container", path))
        }

        fn read_layer(&self, _path: &Path, layer: &str) -> SchemaResult<LayerSchema> {
            Ok(LayerSchema::new(layer))
        }
    }

    #[test]
    fn failing_layers_are_skipped() {
        let layers = parse_vector_file(&FlakyReader, Path::new("/data/city.gpkg")).unwrap();
        assert_eq!(layers, vec![LayerSchema::new("roads")]);

        let reader = FileReader::Vector(Box::new(FlakyReader));
        let FileSchema::Vector(layers) = reader.read(Path::new("/data/city.gpkg")).unwrap() else {
            panic!("expected vector layers");
        };
        assert_eq!(layers.len(), 1);
    }

    #[test]
    fn unlistable_file_is_an_error() {
        let err = parse_vector_file(&UnlistableReader, Path::new("/data/x.gpkg")).unwrap_err();
        assert!(err.to_string().contains("not a container"));
    }
}
