//! Mapping of native schema types to catalog column types.
//!
//! Keys and values come from [`LayerSchema::properties`] and
//! [`RasterProfile::properties`]. Raster profile keys carry a `#` prefix and map
//! by key; everything else maps by substring of the native type string, first
//! match wins.
//!
//! [`LayerSchema::properties`]: geocatalog_core_common::LayerSchema::properties
//! [`RasterProfile::properties`]: geocatalog_core_common::RasterProfile::properties

use std::fmt;

use geocatalog_core_common::GEOMETRY_KEY;
use serde::{Deserialize, Serialize};

/// Catalog column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnDataType {
    String,
    Int,
    Tuple,
    Point,
    Geometry,
    Datetime,
    Date,
    Boolean,
    Decimal,
    Double,
    Long,
    Varchar,
    Timestamp,
    Time,
    Float,
}

impl ColumnDataType {
    /// Catalog name of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Int => "INT",
            Self::Tuple => "TUPLE",
            Self::Point => "POINT",
            Self::Geometry => "GEOMETRY",
            Self::Datetime => "DATETIME",
            Self::Date => "DATE",
            Self::Boolean => "BOOLEAN",
            Self::Decimal => "DECIMAL",
            Self::Double => "DOUBLE",
            Self::Long => "LONG",
            Self::Varchar => "VARCHAR",
            Self::Timestamp => "TIMESTAMP",
            Self::Time => "TIME",
            Self::Float => "FLOAT",
        }
    }
}

impl fmt::Display for ColumnDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Order matters: `datetime` before `date`, `timestamp` before `time`.
const SUBSTRING_TYPES: [(&str, ColumnDataType); 12] = [
    ("datetime", ColumnDataType::Datetime),
    ("date", ColumnDataType::Date),
    ("bool", ColumnDataType::Boolean),
    ("decimal", ColumnDataType::Decimal),
    ("double", ColumnDataType::Double),
    ("long", ColumnDataType::Long),
    ("varchar", ColumnDataType::Varchar),
    ("timestamp", ColumnDataType::Timestamp),
    ("time", ColumnDataType::Time),
    ("int", ColumnDataType::Int),
    ("float", ColumnDataType::Float),
    ("str", ColumnDataType::String),
];

/// Maps a property key and its native type string to a column type.
///
/// Matching is case-sensitive: only a lowercase `point` in a geometry descriptor
/// yields [`ColumnDataType::Point`], so `Point/4326` is a plain geometry.
///
/// ```
/// use geocatalog_core::mapping::{ColumnDataType, map_datatype};
///
/// assert_eq!(map_datatype("#res", "[30.0, 30.0]"), ColumnDataType::Tuple);
/// assert_eq!(map_datatype("geometry", "MultiPoint/4326"), ColumnDataType::Geometry);
/// assert_eq!(map_datatype("geometry", "point/4326"), ColumnDataType::Point);
/// assert_eq!(map_datatype("NAME", "str:80"), ColumnDataType::String);
/// assert_eq!(map_datatype("LENGTH", "float:24.15"), ColumnDataType::Float);
/// ```
#[must_use]
pub fn map_datatype(key: &str, value: &str) -> ColumnDataType {
    match key {
        "#crs" => return ColumnDataType::String,
        "#count" | "#width" | "#height" => return ColumnDataType::Int,
        "#res" => return ColumnDataType::Tuple,
        _ => {},
    }

    if key == GEOMETRY_KEY {
        return if value.contains("point") {
            ColumnDataType::Point
        } else {
            ColumnDataType::Geometry
        };
    }

    SUBSTRING_TYPES
        .iter()
        .find(|(pattern, _)| value.contains(pattern))
        .map_or(ColumnDataType::String, |(_, data_type)| *data_type)
}

/// Column name for a property key: one leading `#` is removed.
#[must_use]
pub fn column_name(key: &str) -> &str {
    key.strip_prefix('#').unwrap_or(key)
}
