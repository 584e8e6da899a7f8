//! Attribute and geometry type inference for schema-less formats.
//!
//! `GeoJSON` and CSV carry no declared schema, so the attribute types are widened
//! across every observed value and the geometry type across every observed geometry.

use std::collections::HashMap;

use geocatalog_core_common::FieldSchema;

/// Kind of a single observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    Date,
    Time,
    DateTime,
    Str,
}

impl ValueKind {
    /// Native type string reported for a field of this kind.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Date => "date",
            ValueKind::Time => "time",
            ValueKind::DateTime => "datetime",
            ValueKind::Str => "str",
        }
    }

    /// Smallest kind able to hold values of both `self` and `other`.
    #[must_use]
    pub fn widen(self, other: ValueKind) -> ValueKind {
        use ValueKind::{Date, DateTime, Float, Int, Str};
        match (self, other) {
            (a, b) if a == b => a,
            (Int, Float) | (Float, Int) => Float,
            (Date, DateTime) | (DateTime, Date) => DateTime,
            _ => Str,
        }
    }
}

/// Classifies a JSON string value: temporal formats or plain `str`.
#[must_use]
pub fn classify_string(value: &str) -> ValueKind {
    if is_date(value) {
        ValueKind::Date
    } else if is_datetime(value) {
        ValueKind::DateTime
    } else if is_time(value) {
        ValueKind::Time
    } else {
        ValueKind::Str
    }
}

/// Classifies an untyped text cell (CSV). Empty cells carry no type.
#[must_use]
pub fn classify_text(value: &str) -> Option<ValueKind> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.parse::<i64>().is_ok() {
        return Some(ValueKind::Int);
    }
    if value.parse::<f64>().is_ok() && value.chars().any(|c| c.is_ascii_digit()) {
        return Some(ValueKind::Float);
    }
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
        return Some(ValueKind::Bool);
    }
    Some(classify_string(value))
}

fn all_digits(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit)
}

fn is_date(value: &str) -> bool {
    let b = value.as_bytes();
    b.len() == 10
        && all_digits(&b[0..4])
        && all_digits(&b[5..7])
        && all_digits(&b[8..10])
        && ((b[4] == b'-' && b[7] == b'-') || (b[4] == b'/' && b[7] == b'/'))
}

fn is_time(value: &str) -> bool {
    let b = value.as_bytes();
    if b.len() < 5 || !all_digits(&b[0..2]) || b[2] != b':' || !all_digits(&b[3..5]) {
        return false;
    }
    match b.len() {
        5 => true,
        8 => b[5] == b':' && all_digits(&b[6..8]),
        n if n > 9 => b[5] == b':' && all_digits(&b[6..8]) && b[8] == b'.' && all_digits(&b[9..]),
        _ => false,
    }
}

fn strip_zone(value: &str) -> &str {
    if let Some(stripped) = value.strip_suffix('Z') {
        return stripped;
    }
    let b = value.as_bytes();
    if b.len() > 6 {
        let zone = &b[b.len() - 6..];
        if (zone[0] == b'+' || zone[0] == b'-')
            && all_digits(&zone[1..3])
            && zone[3] == b':'
            && all_digits(&zone[4..6])
        {
            return &value[..value.len() - 6];
        }
    }
    value
}

fn is_datetime(value: &str) -> bool {
    if !value.is_ascii() || value.len() < 16 {
        return false;
    }
    let b = value.as_bytes();
    is_date(&value[..10]) && (b[10] == b'T' || b[10] == b' ') && is_time(strip_zone(&value[11..]))
}

/// Accumulates attribute kinds, preserving first-seen field order.
#[derive(Debug, Default)]
pub struct FieldTypes {
    order: Vec<String>,
    kinds: HashMap<String, Option<ValueKind>>,
}

impl FieldTypes {
    /// Records one value of `name`. `None` is a null and only registers the field.
    pub fn observe(&mut self, name: &str, kind: Option<ValueKind>) {
        match self.kinds.get_mut(name) {
            Some(existing) => {
                if let Some(kind) = kind {
                    *existing = Some(existing.map_or(kind, |current| current.widen(kind)));
                }
            },
            None => {
                self.order.push(name.to_string());
                self.kinds.insert(name.to_string(), kind);
            },
        }
    }

    /// Field schemas in first-seen order; fields that were only ever null become `str`.
    #[must_use]
    pub fn into_fields(mut self) -> Vec<FieldSchema> {
        self.order
            .into_iter()
            .map(|name| {
                let kind = self
                    .kinds
                    .remove(&name)
                    .flatten()
                    .unwrap_or(ValueKind::Str);
                FieldSchema::new(name, kind.type_name())
            })
            .collect()
    }
}

/// Accumulates geometry types across features.
#[derive(Debug, Default)]
pub struct GeometryTypes {
    current: Option<String>,
    has_z: bool,
}

fn multi_of(geometry_type: &str) -> Option<&'static str> {
    match geometry_type {
        "Point" | "MultiPoint" => Some("MultiPoint"),
        "LineString" | "MultiLineString" => Some("MultiLineString"),
        "Polygon" | "MultiPolygon" => Some("MultiPolygon"),
        _ => None,
    }
}

impl GeometryTypes {
    /// Records one geometry of `geometry_type` (`Point`, `Polygon`, ...).
    pub fn observe(&mut self, geometry_type: &str, has_z: bool) {
        self.has_z |= has_z;
        self.current = Some(match self.current.take() {
            None => geometry_type.to_string(),
            Some(current) if current == geometry_type => current,
            Some(current) => match (multi_of(&current), multi_of(geometry_type)) {
                (Some(a), Some(b)) if a == b => a.to_string(),
                _ => "Unknown".to_string(),
            },
        });
    }

    /// Final geometry type, `3D ` prefixed when any coordinate had a Z value.
    /// `None` when no geometry was observed.
    #[must_use]
    pub fn finish(self) -> Option<String> {
        let current = self.current?;
        if self.has_z && current != "Unknown" {
            Some(format!("3D {current}"))
        } else {
            Some(current)
        }
    }
}

/// Geometry type named by the leading keyword of a WKT string.
#[must_use]
pub fn wkt_geometry_type(wkt: &str) -> Option<(&'static str, bool)> {
    let upper = wkt.trim_start().to_ascii_uppercase();
    let keyword: String = upper
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let geometry_type = match keyword.as_str() {
        "POINT" => "Point",
        "LINESTRING" => "LineString",
        "POLYGON" => "Polygon",
        "MULTIPOINT" => "MultiPoint",
        "MULTILINESTRING" => "MultiLineString",
        "MULTIPOLYGON" => "MultiPolygon",
        "GEOMETRYCOLLECTION" => "GeometryCollection",
        _ => return None,
    };
    let rest = upper[keyword.len()..].trim_start();
    Some((geometry_type, rest.starts_with('Z')))
}
