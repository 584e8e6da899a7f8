//! Connector configuration.
//!
//! A connector is configured from an ingestion workflow document:
//!
//! ```json
//! {
//!   "source": {
//!     "type": "custom-database",
//!     "serviceName": "spatial",
//!     "serviceConnection": {
//!       "config": {
//!         "type": "CustomDatabase",
//!         "sourcePythonClass": "connector.spatial_connector.SpatialConnector",
//!         "connectionOptions": {
//!           "search_directory": "/data/gis",
//!           "skip": "txt,md",
//!           "remote": "false"
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! The same options can be set directly through the builder methods on
//! [`ConnectorConfig`], which is what the command line does.

use std::fmt;
use std::path::Path;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, IoErrorExt, Result};
use crate::scan::ScanOptions;

/// Service type every connection is registered under.
pub const CUSTOM_DATABASE: &str = "CustomDatabase";

/// Extensions that are never parsed on their own: sidecars, indexes and lock files.
pub const BASE_SKIP_LIST: [&str; 20] = [
    "shx", "dbf", "prj", "sbn", "sbx", "spx", "atx", "idx", "freelist", "xml", "gdbtablx",
    "gdbtable", "gdbindexes", "dwg", "bak", "cpg", "lock", "lyr", "dwl", "dwl2",
];

/// Root of an ingestion workflow document. Only the `source` block is read.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// The source block.
    pub source: WorkflowSource,
}

/// The `source` block of a workflow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSource {
    /// Name of the catalog service to create.
    pub service_name: String,
    /// Service connection wrapper.
    pub service_connection: ServiceConnection,
}

/// `serviceConnection` wrapper around the connection config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConnection {
    /// The connection config.
    pub config: CustomDatabaseConnection,
}

/// A `CustomDatabase` connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDatabaseConnection {
    /// Connection type, `CustomDatabase` when present.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<String>,
    /// Plugin class path recorded by the catalog host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_python_class: Option<String>,
    /// Connector specific options.
    #[serde(default)]
    pub connection_options: ConnectionOptions,
}

/// The `connectionOptions` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Directory to walk, single file, or URL when `remote` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_directory: Option<String>,
    /// Comma separated extensions to skip in addition to [`BASE_SKIP_LIST`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    /// Whether `search_directory` is a URL.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub remote: bool,
}

/// Accepts `true`/`false` as JSON booleans or strings.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean or one of the strings \"true\" / \"false\"")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<bool, E> {
            Ok(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<bool, E> {
            parse_flag(value).ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<bool, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

/// Parses a `"true"`/`"false"` flag (case-insensitive).
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" | "" => Some(false),
        _ => None,
    }
}

/// Resolved connector settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorConfig {
    /// Catalog service name.
    pub service_name: String,
    /// Directory, file or URL to ingest.
    pub search_directory: Option<String>,
    /// Extra extensions to skip, comma separated.
    pub skip: Option<String>,
    /// Whether `search_directory` is a URL.
    pub remote: bool,
    /// Plugin class path echoed into the service request.
    pub source_python_class: Option<String>,
    /// Follow symbolic links while walking a local directory.
    pub follow_links: bool,
    /// Maximum walk depth below the search directory (None = unlimited).
    pub max_depth: Option<usize>,
}

impl ConnectorConfig {
    /// Creates a config for a local path.
    #[must_use]
    pub fn new(service_name: impl Into<String>, search_directory: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            search_directory: Some(search_directory.into()),
            skip: None,
            remote: false,
            source_python_class: None,
            follow_links: false,
            max_depth: None,
        }
    }

    /// Sets the extra skip extensions.
    #[must_use]
    pub fn with_skip(mut self, skip: impl Into<String>) -> Self {
        self.skip = Some(skip.into());
        self
    }

    /// Marks the search location as a URL.
    #[must_use]
    pub fn with_remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    /// Follows symbolic links during directory walks.
    #[must_use]
    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Limits how deep directory walks descend.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builds a config from a parsed workflow.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] when the connection is not a `CustomDatabase`.
    pub fn from_workflow(workflow: WorkflowConfig) -> Result<Self> {
        let WorkflowSource {
            service_name,
            service_connection,
        } = workflow.source;
        let connection = service_connection.config;

        if let Some(connection_type) = &connection.connection_type
            && connection_type != CUSTOM_DATABASE
        {
            return Err(ConfigError::InvalidOption {
                option: "serviceConnection.config.type".to_string(),
                message: format!("expected {CUSTOM_DATABASE}, but got {connection_type}"),
            }
            .into());
        }

        let options = connection.connection_options;
        Ok(Self {
            service_name,
            search_directory: options.search_directory,
            skip: options.skip,
            remote: options.remote,
            source_python_class: connection.source_python_class,
            follow_links: false,
            max_depth: None,
        })
    }

    /// Parses a workflow JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Workflow`] when the document does not have the workflow shape.
    pub fn from_workflow_str(json: &str) -> Result<Self> {
        let workflow: WorkflowConfig = serde_json::from_str(json).map_err(ConfigError::from)?;
        Self::from_workflow(workflow)
    }

    /// Reads and parses a workflow JSON file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be read, or a configuration error.
    pub fn from_workflow_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).with_read_context("workflow configuration", path)?;
        Self::from_workflow_str(&json)
    }

    /// The search location, which must be set and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] when `search_directory` is absent.
    pub fn require_search_directory(&self) -> Result<&str> {
        self.search_directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ConfigError::MissingRequired {
                    option: "search_directory".to_string(),
                }
                .into()
            })
    }

    /// Base skip list extended with the configured extra extensions.
    #[must_use]
    pub fn skip_list(&self) -> Vec<String> {
        let mut skip_list: Vec<String> = BASE_SKIP_LIST.iter().map(ToString::to_string).collect();
        if let Some(skip) = &self.skip {
            skip_list.extend(
                skip.split(',')
                    .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|ext| !ext.is_empty()),
            );
        }
        skip_list
    }

    /// Walk options for a local directory scan.
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            skip_list: self.skip_list(),
            follow_links: self.follow_links,
            max_depth: self.max_depth,
        }
    }

    /// The connection block echoed into the service creation request.
    #[must_use]
    pub fn service_connection(&self) -> ServiceConnection {
        ServiceConnection {
            config: CustomDatabaseConnection {
                connection_type: Some(CUSTOM_DATABASE.to_string()),
                source_python_class: self.source_python_class.clone(),
                connection_options: ConnectionOptions {
                    search_directory: self.search_directory.clone(),
                    skip: self.skip.clone(),
                    remote: self.remote,
                },
            },
        }
    }
}
