//! `GeoJSON` and `GeoJSONSeq` schema readers.
//!
//! A `GeoJSON` document holds a single layer. The layer schema is inferred from
//! every feature in the document: property types are widened across features and
//! the geometry type across geometries.

use std::path::Path;

use geocatalog_core_common::{
    Crs, LayerSchema, SchemaReadError, SchemaResult, SourcePosition, VectorSchemaReader,
    layer_name_from_path,
};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use log::debug;

use crate::infer::{FieldTypes, GeometryTypes, ValueKind, classify_string};

const RECORD_SEPARATOR: char = '\u{1e}';

/// Reader for `.geojson` / `.json` documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoJsonReader;

/// Reader for newline-delimited `GeoJSON` (`.geojsonl`, `.geojsons`).
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoJsonSeqReader;

/// Everything needed to describe a parsed document.
#[derive(Debug, Default)]
struct Document {
    name: Option<String>,
    crs: Option<Crs>,
    fields: FieldTypes,
    geometries: GeometryTypes,
    features: usize,
}

impl Document {
    fn add_feature(&mut self, feature: &Feature) {
        self.features += 1;
        if let Some(properties) = &feature.properties {
            self.add_properties(properties);
        }
        if let Some(geometry) = &feature.geometry {
            self.add_geometry(geometry);
        }
    }

    fn add_properties(&mut self, properties: &JsonObject) {
        for (name, value) in properties {
            self.fields.observe(name, classify_value(value));
        }
    }

    fn add_geometry(&mut self, geometry: &Geometry) {
        self.geometries
            .observe(geometry_type(&geometry.value), has_z(&geometry.value));
    }

    fn add_collection(&mut self, collection: &FeatureCollection) {
        if let Some(members) = &collection.foreign_members {
            if self.name.is_none() {
                self.name = members
                    .get("name")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string);
            }
            if self.crs.is_none() {
                self.crs = members.get("crs").and_then(legacy_crs);
            }
        }
        for feature in &collection.features {
            self.add_feature(feature);
        }
    }

    fn add_geojson(&mut self, geojson: &GeoJson) {
        match geojson {
            GeoJson::FeatureCollection(collection) => self.add_collection(collection),
            GeoJson::Feature(feature) => self.add_feature(feature),
            GeoJson::Geometry(geometry) => {
                self.features += 1;
                self.add_geometry(geometry);
            },
        }
    }

    fn into_layer(self, default_name: String) -> LayerSchema {
        let geometry = self.geometries.finish();
        let crs = geometry
            .as_ref()
            .map(|_| self.crs.unwrap_or_else(Crs::wgs84));
        LayerSchema {
            name: self.name.unwrap_or(default_name),
            fields: self.fields.into_fields(),
            geometry,
            crs,
        }
    }
}

fn classify_value(value: &JsonValue) -> Option<ValueKind> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(_) => Some(ValueKind::Bool),
        JsonValue::Number(number) if number.is_i64() || number.is_u64() => Some(ValueKind::Int),
        JsonValue::Number(_) => Some(ValueKind::Float),
        JsonValue::String(text) => Some(classify_string(text)),
        JsonValue::Array(_) | JsonValue::Object(_) => Some(ValueKind::Str),
    }
}

fn geometry_type(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn has_z(value: &Value) -> bool {
    match value {
        Value::Point(position) => position.len() > 2,
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            positions.iter().any(|p| p.len() > 2)
        },
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter().flatten().any(|p| p.len() > 2)
        },
        Value::MultiPolygon(polygons) => polygons.iter().flatten().flatten().any(|p| p.len() > 2),
        Value::GeometryCollection(geometries) => geometries.iter().any(|g| has_z(&g.value)),
    }
}

/// Reads the pre-RFC 7946 `crs` member: `{"type": "name", "properties": {"name": ...}}`
/// or `{"type": "EPSG", "properties": {"code": ...}}`.
fn legacy_crs(value: &JsonValue) -> Option<Crs> {
    let properties = value.get("properties")?;
    if let Some(name) = properties.get("name").and_then(JsonValue::as_str) {
        return Crs::from_identifier(name);
    }
    properties
        .get("code")
        .and_then(JsonValue::as_u64)
        .and_then(|code| u32::try_from(code).ok())
        .map(Crs::epsg)
}

fn read_bytes(path: &Path) -> SchemaResult<Vec<u8>> {
    std::fs::read(path).map_err(|err| SchemaReadError::io(err, path))
}

fn parse_document(bytes: &[u8], path: &Path) -> SchemaResult<Document> {
    let geojson = GeoJson::from_reader(std::io::Cursor::new(bytes)).map_err(|err| {
        SchemaReadError::parse(format!("Failed to parse GeoJSON document: {err}"), path)
    })?;
    let mut document = Document::default();
    document.add_geojson(&geojson);
    Ok(document)
}

fn parse_sequence(bytes: &[u8], path: &Path) -> SchemaResult<Document> {
    let mut document = Document::default();
    for (line_idx, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let line_number = (line_idx + 1) as u64;
        let line = std::str::from_utf8(raw_line).map_err(|err| SchemaReadError::Parse {
            message: format!("GeoJSON line is not valid UTF-8: {err}"),
            position: Some(SourcePosition::line(line_number)),
            context: Some(path.display().to_string()),
        })?;
        let line = line.trim().trim_start_matches(RECORD_SEPARATOR).trim();
        if line.is_empty() {
            continue;
        }

        let geojson = line
            .parse::<GeoJson>()
            .map_err(|err| SchemaReadError::Parse {
                message: format!("Failed to parse GeoJSON feature: {err}"),
                position: Some(SourcePosition::line(line_number)),
                context: Some(path.display().to_string()),
            })?;
        document.add_geojson(&geojson);
    }

    if document.features == 0 {
        return Err(SchemaReadError::parse("No GeoJSON features found", path));
    }
    Ok(document)
}

fn ensure_layer(layer: &str, schema: LayerSchema, path: &Path) -> SchemaResult<LayerSchema> {
    if schema.name == layer {
        Ok(schema)
    } else {
        Err(SchemaReadError::LayerNotFound {
            layer: layer.to_string(),
            context: Some(path.display().to_string()),
        })
    }
}

impl GeoJsonReader {
    /// Reads the single layer of the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not `GeoJSON`.
    pub fn read(&self, path: &Path) -> SchemaResult<LayerSchema> {
        let bytes = read_bytes(path)?;
        let document = parse_document(&bytes, path)?;
        debug!(
            "Parsed {} GeoJSON feature(s) from {}",
            document.features,
            path.display()
        );
        Ok(document.into_layer(layer_name_from_path(path)))
    }
}

impl VectorSchemaReader for GeoJsonReader {
    fn list_layers(&self, path: &Path) -> SchemaResult<Vec<String>> {
        Ok(vec![self.read(path)?.name])
    }

    fn read_layer(&self, path: &Path, layer: &str) -> SchemaResult<LayerSchema> {
        ensure_layer(layer, self.read(path)?, path)
    }
}

impl GeoJsonSeqReader {
    /// Reads the layer formed by every feature of the sequence at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when a line is not valid `GeoJSON` or the file holds no features.
    pub fn read(&self, path: &Path) -> SchemaResult<LayerSchema> {
        let bytes = read_bytes(path)?;
        let mut document = parse_sequence(&bytes, path)?;
        // Sequences carry no collection-level name.
        document.name = None;
        Ok(document.into_layer(layer_name_from_path(path)))
    }
}

impl VectorSchemaReader for GeoJsonSeqReader {
    fn list_layers(&self, path: &Path) -> SchemaResult<Vec<String>> {
        Ok(vec![self.read(path)?.name])
    }

    fn read_layer(&self, path: &Path, layer: &str) -> SchemaResult<LayerSchema> {
        ensure_layer(layer, self.read(path)?, path)
    }
}
