//! Custom error types for `GeoCatalog` operations.
//!
//! This module provides structured error handling using `thiserror`. Format readers
//! report [`SchemaReadError`]s; they are wrapped here together with the driver and file
//! that produced them, alongside configuration, scanning and remote fetch failures.

use std::path::PathBuf;

use geocatalog_core_common::SchemaReadError;
use thiserror::Error;

/// Main error type for `GeoCatalog` operations.
///
/// It uses `#[error(transparent)]` to delegate display formatting to the
/// underlying error variants.
#[derive(Debug, Error)]
pub enum GeoCatalogError {
    /// Driver-related errors (not found, no reader, unresolved extension)
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// I/O errors (file read/write, path issues, permissions)
    #[error(transparent)]
    Io(#[from] IoError),

    /// Schema or profile reading errors
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Directory scanning errors
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Remote source errors
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Generic errors from dependencies
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Driver-related errors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Driver was not found in the registry
    #[error("Driver '{name}' not found. Available drivers: {available}")]
    NotFound {
        /// The requested driver name
        name: String,
        /// Comma-separated list of available drivers
        available: String,
    },

    /// No driver of the requested kind claims the file extension
    #[error("No {kind} driver found for '{path}'")]
    NoDriverForExtension {
        /// The file path
        path: PathBuf,
        /// `Vector` or `Raster`
        kind: String,
    },

    /// Driver does not support the requested operation
    #[error("Driver '{driver}' does not support {operation}")]
    OperationNotSupported {
        /// The driver name
        driver: String,
        /// The operation that's not supported (e.g., "schema reading")
        operation: String,
    },
}

/// I/O related errors.
#[derive(Debug, Error)]
pub enum IoError {
    /// Failed to read from a file
    #[error("Failed to read {format} file '{path}': {source}")]
    Read {
        /// What was being read (e.g., "workflow configuration")
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to write to a file
    #[error("Failed to write {format} file '{path}': {source}")]
    Write {
        /// What was being written
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// File or directory was not found
    #[error("Source data path does not exist: '{path}'")]
    FileNotFound {
        /// The missing path
        path: PathBuf,
    },

    /// Path is neither a file nor a directory
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The invalid path
        path: PathBuf,
        /// Why the path is invalid
        reason: String,
    },
}

/// Schema and profile reading errors.
#[derive(Debug, Error)]
pub enum FormatError {
    /// A reader failed on a file
    #[error("Error reading {driver} file '{path}': {source}")]
    Read {
        /// The driver short name
        driver: String,
        /// The file path
        path: PathBuf,
        /// The reader error
        #[source]
        source: SchemaReadError,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// Required option is missing
    #[error("Missing required option: {option}")]
    MissingRequired {
        /// The missing option name
        option: String,
    },

    /// The workflow document could not be parsed
    #[error("Invalid workflow configuration: {0}")]
    Workflow(#[from] serde_json::Error),
}

/// Directory scanning errors.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Walking the directory tree failed
    #[error("Error reading geospatial directory '{root}': {source}")]
    Walk {
        /// The search root
        root: PathBuf,
        /// The underlying walk error
        #[source]
        source: walkdir::Error,
    },

    /// Requests were asked for before the source was prepared
    #[error("Source has not been prepared")]
    NotPrepared,
}

/// Remote source errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The configured location is not a URL
    #[error("Invalid remote URL '{url}': {source}")]
    InvalidUrl {
        /// The configured location
        url: String,
        /// The parse failure
        #[source]
        source: url::ParseError,
    },

    /// The URL scheme cannot be fetched
    #[error("Unsupported URL scheme '{scheme}' in '{url}'")]
    UnsupportedScheme {
        /// The URL
        url: String,
        /// Its scheme
        scheme: String,
    },

    /// The URL path does not name a file
    #[error("Remote URL '{url}' does not name a file")]
    MissingFileName {
        /// The URL
        url: String,
    },

    /// The HTTP request failed
    #[error("Failed to fetch '{url}': {source}")]
    Fetch {
        /// The URL
        url: String,
        /// The HTTP client error
        #[source]
        source: reqwest::Error,
    },
}

/// Type alias for Results using `GeoCatalogError`.
pub type Result<T> = std::result::Result<T, GeoCatalogError>;

impl GeoCatalogError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Driver(e) => e.user_message(),
            Self::Io(e) => e.to_string(),
            Self::Format(e) => e.user_message(),
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Scan(e) => e.to_string(),
            Self::Remote(e) => format!("Remote source error: {e}"),
            Self::Other(e) => format!("Error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Driver(e) => e.recovery_suggestion(),
            Self::Io(IoError::FileNotFound { .. }) => {
                Some("Check that search_directory points to an existing file or directory.".to_string())
            },
            Self::Format(_) => Some(
                "Check the file format and ensure it's valid, or add its extension to the skip list."
                    .to_string(),
            ),
            Self::Config(ConfigError::MissingRequired { option }) => Some(format!(
                "Set '{option}' in connectionOptions or pass it on the command line."
            )),
            Self::Scan(ScanError::NotPrepared) => {
                Some("Call prepare() before requesting catalog records.".to_string())
            },
            _ => None,
        }
    }
}

impl DriverError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { name, available } => {
                format!(
                    "Driver '{name}' not found.\n\nAvailable drivers:\n{}",
                    available
                        .split(", ")
                        .map(|d| format!("  - {d}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            },
            Self::NoDriverForExtension { .. } | Self::OperationNotSupported { .. } => {
                self.to_string()
            },
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } | Self::NoDriverForExtension { .. } => {
                Some("Run 'geocatalog drivers' to see all available drivers.".to_string())
            },
            Self::OperationNotSupported { .. } => None,
        }
    }
}

impl FormatError {
    fn user_message(&self) -> String {
        match self {
            Self::Read { driver, path, .. } => {
                format!("Failed to read {driver} file: {}", path.display())
            },
        }
    }
}

/// Extension trait for adding I/O context to errors.
pub trait IoErrorExt<T> {
    /// Add read context to an error.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError::Read`] if the underlying operation fails.
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T>;

    /// Add write context to an error.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError::Write`] if the underlying operation fails.
    fn with_write_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T, E> IoErrorExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            GeoCatalogError::Io(IoError::Read {
                format: format.to_string(),
                path: path.into(),
                source: Box::new(e),
            })
        })
    }

    fn with_write_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            GeoCatalogError::Io(IoError::Write {
                format: format.to_string(),
                path: path.into(),
                source: Box::new(e),
            })
        })
    }
}

/// Helper to create `DriverError::NotFound` with available drivers.
#[must_use]
pub fn driver_not_found(name: &str) -> DriverError {
    use crate::drivers::get_driver_names;

    let available = get_driver_names().join(", ");
    DriverError::NotFound {
        name: name.to_string(),
        available,
    }
}
