//! Catalog creation requests.
//!
//! A scan is published as a fixed sequence of requests: the database service,
//! one database per driver, one schema per file and one table per layer (or
//! raster profile). Requests serialize to the JSON shape the catalog API
//! accepts, tagged with a `type` field.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{CUSTOM_DATABASE, ConnectorConfig, ServiceConnection};
use crate::mapping::{ColumnDataType, column_name, map_datatype};
use crate::scan::CatalogData;

/// Request to create the database service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatabaseService {
    pub name: String,
    pub service_type: String,
    pub connection: ServiceConnection,
}

/// Request to create a database (one per driver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatabase {
    pub name: String,
    /// Fully qualified name of the service.
    pub service: String,
    pub description: String,
}

/// Request to create a database schema (one per file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatabaseSchema {
    pub name: String,
    /// Fully qualified name of the database.
    pub database: String,
    pub description: String,
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub data_type: ColumnDataType,
    pub description: String,
}

impl Column {
    /// Builds the column for one `(key, native type)` property.
    #[must_use]
    pub fn from_property(key: &str, value: &str) -> Self {
        Self {
            name: column_name(key).to_string(),
            data_type: map_datatype(key, value),
            description: value.to_string(),
        }
    }
}

/// Request to create a table (one per layer or raster profile).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTable {
    pub name: String,
    /// Fully qualified name of the schema.
    pub database_schema: String,
    pub columns: Vec<Column>,
}

/// Any creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CreateRequest {
    DatabaseService(CreateDatabaseService),
    Database(CreateDatabase),
    DatabaseSchema(CreateDatabaseSchema),
    Table(CreateTable),
}

impl CreateRequest {
    /// Entity kind of the request.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DatabaseService(_) => "DatabaseService",
            Self::Database(_) => "Database",
            Self::DatabaseSchema(_) => "DatabaseSchema",
            Self::Table(_) => "Table",
        }
    }

    /// Name of the entity to create.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::DatabaseService(r) => &r.name,
            Self::Database(r) => &r.name,
            Self::DatabaseSchema(r) => &r.name,
            Self::Table(r) => &r.name,
        }
    }
}

/// How file paths turn into schema names.
///
/// Names end at the first `.` that does not open a path component, so every
/// extension is dropped (`dem.v2.tif` → `dem`) and so is everything after a
/// dotted directory (`v1.2/pts.csv` → `v1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNaming {
    /// `/`-separated path relative to the scanned directory.
    RelativeTo(PathBuf),
    /// File name only (single file and remote sources).
    FileStem,
}

impl SchemaNaming {
    /// Schema name for `path`.
    ///
    /// ```
    /// use std::path::{Path, PathBuf};
    /// use geocatalog_core::catalog::SchemaNaming;
    ///
    /// let naming = SchemaNaming::RelativeTo(PathBuf::from("/data"));
    /// assert_eq!(naming.schema_name(Path::new("/data/roads/main.shp")), "roads/main");
    /// assert_eq!(naming.schema_name(Path::new("/data/v1.2/pts.csv")), "v1");
    /// assert_eq!(SchemaNaming::FileStem.schema_name(Path::new("/data/dem.v2.tif")), "dem");
    /// ```
    #[must_use]
    pub fn schema_name(&self, path: &Path) -> String {
        let name = match self {
            Self::RelativeTo(root) => {
                let relative = path.strip_prefix(root).unwrap_or(path);
                relative
                    .components()
                    .filter_map(|component| match component {
                        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("/")
            },
            Self::FileStem => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        until_first_dot(&name).to_string()
    }
}

fn until_first_dot(name: &str) -> &str {
    let mut previous = '/';
    for (index, c) in name.char_indices() {
        if c == '.' && previous != '/' {
            return &name[..index];
        }
        previous = c;
    }
    name
}

/// Database name for a driver: spaces become underscores.
#[must_use]
pub fn database_name(driver: &str) -> String {
    driver.replace(' ', "_")
}

/// Joins name components into a fully qualified name, quoting components that contain `.`.
///
/// ```
/// use geocatalog_core::catalog::fqn;
///
/// assert_eq!(fqn(&["spatial", "GTiff", "dem"]), "spatial.GTiff.dem");
/// assert_eq!(fqn(&["spatial", "CSV", "v1.2/points"]), "spatial.CSV.\"v1.2/points\"");
/// ```
#[must_use]
pub fn fqn(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| {
            if part.contains('.') {
                format!("\"{part}\"")
            } else {
                (*part).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Builds the creation requests for scanned data.
#[derive(Debug, Clone)]
pub struct CatalogBuilder<'a> {
    config: &'a ConnectorConfig,
    naming: SchemaNaming,
}

impl<'a> CatalogBuilder<'a> {
    /// Creates a builder for the service described by `config`.
    #[must_use]
    pub fn new(config: &'a ConnectorConfig, naming: SchemaNaming) -> Self {
        Self { config, naming }
    }

    /// The service creation request.
    #[must_use]
    pub fn service_request(&self) -> CreateRequest {
        CreateRequest::DatabaseService(CreateDatabaseService {
            name: self.config.service_name.clone(),
            service_type: CUSTOM_DATABASE.to_string(),
            connection: self.config.service_connection(),
        })
    }

    /// One database per driver.
    #[must_use]
    pub fn database_requests(&self, data: &CatalogData) -> Vec<CreateRequest> {
        let service = fqn(&[&self.config.service_name]);
        data.driver_names()
            .map(|driver| {
                CreateRequest::Database(CreateDatabase {
                    name: database_name(driver),
                    service: service.clone(),
                    description: format!("Database for {driver}"),
                })
            })
            .collect()
    }

    /// One schema per file.
    #[must_use]
    pub fn schema_requests(&self, data: &CatalogData) -> Vec<CreateRequest> {
        let mut requests = Vec::new();
        for (driver, files) in data.iter() {
            let database = fqn(&[&self.config.service_name, &database_name(driver)]);
            for path in files.keys() {
                requests.push(CreateRequest::DatabaseSchema(CreateDatabaseSchema {
                    name: self.naming.schema_name(path),
                    database: database.clone(),
                    description: format!("Path: {}", path.display()),
                }));
            }
        }
        requests
    }

    /// One table per layer or raster profile.
    #[must_use]
    pub fn table_requests(&self, data: &CatalogData) -> Vec<CreateRequest> {
        let mut requests = Vec::new();
        for (driver, files) in data.iter() {
            let database = database_name(driver);
            for (path, tables) in files {
                let schema = self.naming.schema_name(path);
                let database_schema = fqn(&[&self.config.service_name, &database, &schema]);
                for (table, properties) in tables {
                    requests.push(CreateRequest::Table(CreateTable {
                        name: table.clone(),
                        database_schema: database_schema.clone(),
                        columns: properties
                            .iter()
                            .map(|(key, value)| Column::from_property(key, value))
                            .collect(),
                    }));
                }
            }
        }
        requests
    }

    /// The full sequence: service, databases, schemas, tables.
    #[must_use]
    pub fn requests(&self, data: &CatalogData) -> Vec<CreateRequest> {
        let mut requests = vec![self.service_request()];
        requests.extend(self.database_requests(data));
        requests.extend(self.schema_requests(data));
        requests.extend(self.table_requests(data));
        requests
    }
}
