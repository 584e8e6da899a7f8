use std::error::Error as StdError;
use std::fmt;
use std::path::Path;

/// A position within a source file, such as a CSV record or a `GeoJSON` sequence line.
///
/// All indices are 1-based where possible to align with human expectations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePosition {
    /// Line number in the source (1-based)
    pub line: Option<u64>,
    /// Byte offset from the start of the source
    pub byte_offset: Option<u64>,
    /// Logical record number reported by the parser
    pub record: Option<u64>,
}

impl SourcePosition {
    /// Position pointing at a line.
    #[must_use]
    pub fn line(line: u64) -> Self {
        Self {
            line: Some(line),
            ..Self::default()
        }
    }

    /// Position pointing at a byte offset.
    #[must_use]
    pub fn byte(offset: u64) -> Self {
        Self {
            byte_offset: Some(offset),
            ..Self::default()
        }
    }

    /// Returns true when the position does not contain any location metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line.is_none() && self.byte_offset.is_none() && self.record.is_none()
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(line) = self.line {
            parts.push(format!("line {line}"));
        }
        if let Some(record) = self.record {
            parts.push(format!("record {record}"));
        }
        if let Some(byte) = self.byte_offset {
            parts.push(format!("byte {byte}"));
        }

        if parts.is_empty() {
            write!(f, "unknown position")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Errors raised while reading a layer schema or raster profile.
#[derive(Debug)]
pub enum SchemaReadError {
    /// An underlying I/O failure occurred.
    Io {
        /// The originating error.
        source: std::io::Error,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// Parsing failed for the input source.
    Parse {
        /// Human readable description of the failure.
        message: String,
        /// Optional position describing where the failure occurred.
        position: Option<SourcePosition>,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// The requested layer does not exist in the file.
    LayerNotFound {
        /// Requested layer name.
        layer: String,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// GDAL failed to open or describe the file.
    Gdal {
        /// The originating error.
        source: gdal::errors::GdalError,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// Other error type not classified above.
    Other {
        /// Human readable description of the failure.
        message: String,
    },
}

impl SchemaReadError {
    /// I/O failure while reading `path`.
    #[must_use]
    pub fn io(source: std::io::Error, path: &Path) -> Self {
        SchemaReadError::Io {
            source,
            context: Some(path.display().to_string()),
        }
    }

    /// GDAL failure while reading `path`.
    #[must_use]
    pub fn gdal(source: gdal::errors::GdalError, path: &Path) -> Self {
        SchemaReadError::Gdal {
            source,
            context: Some(path.display().to_string()),
        }
    }

    /// Parse failure without position information.
    pub fn parse(message: impl Into<String>, path: &Path) -> Self {
        SchemaReadError::Parse {
            message: message.into(),
            position: None,
            context: Some(path.display().to_string()),
        }
    }

    fn fmt_context(context: Option<&str>) -> String {
        context
            .map(|c| format!(" while reading {c}"))
            .unwrap_or_default()
    }

    fn fmt_position(position: Option<&SourcePosition>) -> String {
        position
            .filter(|pos| !pos.is_empty())
            .map(|pos| format!(" at {pos}"))
            .unwrap_or_default()
    }

    /// Attach additional context to the error, returning the updated error.
    #[must_use]
    pub fn with_additional_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            SchemaReadError::Io {
                context: existing, ..
            }
            | SchemaReadError::Parse {
                context: existing, ..
            }
            | SchemaReadError::LayerNotFound {
                context: existing, ..
            }
            | SchemaReadError::Gdal {
                context: existing, ..
            } => match existing {
                Some(existing) if !existing.is_empty() => {
                    existing.push_str("; ");
                    existing.push_str(&context);
                },
                _ => *existing = Some(context),
            },
            SchemaReadError::Other { message } => {
                message.push_str(" (");
                message.push_str(&context);
                message.push(')');
            },
        }
        self
    }
}

impl fmt::Display for SchemaReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaReadError::Io { source, context } => {
                write!(
                    f,
                    "I/O error{}: {source}",
                    Self::fmt_context(context.as_deref())
                )
            },
            SchemaReadError::Parse {
                message,
                position,
                context,
            } => write!(
                f,
                "Parse error{}{}: {message}",
                Self::fmt_context(context.as_deref()),
                Self::fmt_position(position.as_ref())
            ),
            SchemaReadError::LayerNotFound { layer, context } => write!(
                f,
                "Layer '{layer}' not found{}",
                Self::fmt_context(context.as_deref())
            ),
            SchemaReadError::Gdal { source, context } => write!(
                f,
                "GDAL error{}: {source}",
                Self::fmt_context(context.as_deref())
            ),
            SchemaReadError::Other { message } => f.write_str(message),
        }
    }
}

impl StdError for SchemaReadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SchemaReadError::Io { source, .. } => Some(source),
            SchemaReadError::Gdal { source, .. } => Some(source),
            SchemaReadError::Parse { .. }
            | SchemaReadError::LayerNotFound { .. }
            | SchemaReadError::Other { .. } => None,
        }
    }
}

/// Result type alias that uses [`SchemaReadError`].
pub type SchemaResult<T> = Result<T, SchemaReadError>;
