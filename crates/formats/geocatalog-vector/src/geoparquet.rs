//! (Geo)Parquet schema reader.
//!
//! The Arrow schema is decoded from the Parquet footer. When the file carries
//! GeoParquet `geo` metadata, its primary geometry column becomes the layer
//! geometry; plain Parquet files are read as attribute-only layers.

use std::fs::File;
use std::path::Path;

use arrow_schema::{DataType, Schema};
use geocatalog_core_common::{
    Crs, FieldSchema, LayerSchema, SchemaReadError, SchemaResult, VectorSchemaReader,
    layer_name_from_path,
};
use log::debug;
use parquet::arrow::parquet_to_arrow_schema;
use parquet::file::reader::{FileReader, SerializedFileReader};
use serde_json::Value as JsonValue;

use crate::infer::GeometryTypes;

/// Key of the GeoParquet file metadata entry.
pub const GEO_METADATA_KEY: &str = "geo";

/// Reader for `.parquet` / `.geoparquet` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoParquetReader;

/// Extension trait mapping Arrow [`DataType`]s to native type strings.
pub trait ArrowDataTypeExt {
    /// Native type string for this Arrow type (`int32`, `long`, `double`, `str`, ...).
    fn native_type(&self) -> String;
}

impl ArrowDataTypeExt for DataType {
    fn native_type(&self) -> String {
        match self {
            DataType::Boolean => "bool".to_string(),
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::UInt8
            | DataType::UInt16 => "int32".to_string(),
            DataType::Int64 | DataType::UInt32 | DataType::UInt64 => "long".to_string(),
            DataType::Float16 | DataType::Float32 => "float".to_string(),
            DataType::Float64 => "double".to_string(),
            DataType::Decimal128(precision, scale) | DataType::Decimal256(precision, scale) => {
                format!("decimal({precision},{scale})")
            },
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => "str".to_string(),
            DataType::Binary
            | DataType::LargeBinary
            | DataType::BinaryView
            | DataType::FixedSizeBinary(_) => "bytes".to_string(),
            DataType::Date32 | DataType::Date64 => "date".to_string(),
            DataType::Timestamp(..) => "timestamp".to_string(),
            DataType::Time32(_) | DataType::Time64(_) => "time".to_string(),
            DataType::List(_) | DataType::LargeList(_) | DataType::FixedSizeList(..) => {
                "list".to_string()
            },
            DataType::Struct(_) => "struct".to_string(),
            DataType::Map(..) => "map".to_string(),
            other => format!("{other:?}").to_ascii_lowercase(),
        }
    }
}

/// Geometry column description from the `geo` metadata.
#[derive(Debug, Clone, PartialEq)]
struct GeoColumn {
    name: String,
    encoding: String,
    geometry: Option<String>,
    crs: Option<Crs>,
}

/// Parsed `geo` metadata: primary column first.
#[derive(Debug, Default)]
struct GeoMetadata {
    primary: Option<GeoColumn>,
    secondary: Vec<GeoColumn>,
}

impl GeoMetadata {
    fn column(&self, name: &str) -> Option<&GeoColumn> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .find(|c| c.name == name)
    }
}

/// CRS of a geometry column: absent means OGC:CRS84, `null` means undefined.
fn column_crs(column: &JsonValue) -> Option<Crs> {
    let Some(crs) = column.get("crs") else {
        return Some(Crs::wgs84());
    };
    match crs {
        JsonValue::Null => None,
        JsonValue::String(identifier) => Crs::from_identifier(identifier),
        JsonValue::Object(_) => {
            let id = crs.get("id")?;
            let authority = id.get("authority")?.as_str()?.to_ascii_uppercase();
            let code = match id.get("code")? {
                JsonValue::Number(n) => n.to_string(),
                JsonValue::String(s) => s.clone(),
                _ => return None,
            };
            if authority == "OGC" && code == "CRS84" {
                return Some(Crs::wgs84());
            }
            Some(Crs { authority, code })
        },
        _ => None,
    }
}

fn column_geometry(column: &JsonValue) -> Option<String> {
    let types = column.get("geometry_types")?.as_array()?;
    if types.is_empty() {
        return Some("Unknown".to_string());
    }
    let mut geometries = GeometryTypes::default();
    for geometry_type in types.iter().filter_map(JsonValue::as_str) {
        let (base, has_z) = match geometry_type.strip_suffix(" Z") {
            Some(base) => (base, true),
            None => (geometry_type, false),
        };
        geometries.observe(base, has_z);
    }
    geometries.finish()
}

fn parse_geo_metadata(raw: &str, path: &Path) -> SchemaResult<GeoMetadata> {
    let value: JsonValue = serde_json::from_str(raw).map_err(|err| {
        SchemaReadError::parse(format!("Invalid GeoParquet metadata: {err}"), path)
    })?;
    let primary_name = value
        .get("primary_column")
        .and_then(JsonValue::as_str)
        .unwrap_or("geometry");

    let mut metadata = GeoMetadata::default();
    if let Some(columns) = value.get("columns").and_then(JsonValue::as_object) {
        for (name, column) in columns {
            let geo_column = GeoColumn {
                name: name.clone(),
                encoding: column
                    .get("encoding")
                    .and_then(JsonValue::as_str)
                    .unwrap_or("WKB")
                    .to_ascii_lowercase(),
                geometry: column_geometry(column).or_else(|| Some("Unknown".to_string())),
                crs: column_crs(column),
            };
            if name == primary_name {
                metadata.primary = Some(geo_column);
            } else {
                metadata.secondary.push(geo_column);
            }
        }
    }
    Ok(metadata)
}

fn read_footer(path: &Path) -> SchemaResult<(Schema, Option<GeoMetadata>)> {
    let file = File::open(path).map_err(|err| SchemaReadError::io(err, path))?;
    let reader = SerializedFileReader::new(file)
        .map_err(|err| SchemaReadError::parse(format!("Invalid Parquet file: {err}"), path))?;
    let file_metadata = reader.metadata().file_metadata();
    let key_value_metadata = file_metadata.key_value_metadata();

    let schema = parquet_to_arrow_schema(file_metadata.schema_descr(), key_value_metadata)
        .map_err(|err| {
            SchemaReadError::parse(format!("Failed to decode Parquet schema: {err}"), path)
        })?;

    let geo = key_value_metadata
        .and_then(|entries| entries.iter().find(|kv| kv.key == GEO_METADATA_KEY))
        .and_then(|kv| kv.value.as_deref())
        .map(|raw| parse_geo_metadata(raw, path))
        .transpose()?;
    debug!(
        "Parquet schema of {} has {} column(s), geo metadata: {}",
        path.display(),
        schema.fields().len(),
        geo.is_some()
    );
    Ok((schema, geo))
}

fn layer_from_schema(name: String, schema: &Schema, geo: Option<&GeoMetadata>) -> LayerSchema {
    let primary = geo.and_then(|g| g.primary.as_ref());
    let fields = schema
        .fields()
        .iter()
        .filter(|field| primary.is_none_or(|p| &p.name != field.name()))
        .map(|field| {
            let field_type = match geo.and_then(|g| g.column(field.name())) {
                Some(column) => column.encoding.clone(),
                None => field.data_type().native_type(),
            };
            FieldSchema::new(field.name().clone(), field_type)
        })
        .collect();

    LayerSchema {
        name,
        fields,
        geometry: primary.and_then(|p| p.geometry.clone()),
        crs: primary.and_then(|p| p.crs.clone()),
    }
}

impl GeoParquetReader {
    /// Reads the layer schema of the Parquet file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the footer cannot be decoded or the `geo` metadata is invalid.
    pub fn read(&self, path: &Path) -> SchemaResult<LayerSchema> {
        let (schema, geo) = read_footer(path)?;
        Ok(layer_from_schema(
            layer_name_from_path(path),
            &schema,
            geo.as_ref(),
        ))
    }
}

impl VectorSchemaReader for GeoParquetReader {
    fn list_layers(&self, path: &Path) -> SchemaResult<Vec<String>> {
        Ok(vec![self.read(path)?.name])
    }

    fn read_layer(&self, path: &Path, layer: &str) -> SchemaResult<LayerSchema> {
        if layer_name_from_path(path) != layer {
            return Err(SchemaReadError::LayerNotFound {
                layer: layer.to_string(),
                context: Some(path.display().to_string()),
            });
        }
        self.read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_schema::{Field, TimeUnit};

    const GEO: &str = r#"{
        "version": "1.1.0",
        "primary_column": "geometry",
        "columns": {
            "geometry": {
                "encoding": "WKB",
                "geometry_types": ["Polygon", "MultiPolygon"],
                "crs": {"id": {"authority": "EPSG", "code": 32633}}
            },
            "centroid": {"encoding": "point", "geometry_types": ["Point"]}
        }
    }"#;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("area", DataType::Float64, true),
            Field::new(
                "updated",
                DataType::Timestamp(TimeUnit::Millisecond, None),
                true,
            ),
            Field::new("centroid", DataType::Binary, true),
            Field::new("geometry", DataType::Binary, true),
        ])
    }

    #[test]
    fn geoparquet_layer() {
        let geo = parse_geo_metadata(GEO, Path::new("parcels.parquet")).unwrap();
        let layer = layer_from_schema("parcels".to_string(), &schema(), Some(&geo));

        assert_eq!(
            layer.fields,
            vec![
                FieldSchema::new("id", "long"),
                FieldSchema::new("name", "str"),
                FieldSchema::new("area", "double"),
                FieldSchema::new("updated", "timestamp"),
                FieldSchema::new("centroid", "point"),
            ]
        );
        assert_eq!(layer.geometry.as_deref(), Some("MultiPolygon"));
        assert_eq!(layer.geometry_descriptor().as_deref(), Some("MultiPolygon/32633"));
    }

    #[test]
    fn crs_defaults_and_nulls() {
        let absent: JsonValue = serde_json::json!({"encoding": "WKB"});
        assert_eq!(column_crs(&absent), Some(Crs::wgs84()));

        let null: JsonValue = serde_json::json!({"crs": null});
        assert_eq!(column_crs(&null), None);

        let crs84: JsonValue =
            serde_json::json!({"crs": {"id": {"authority": "OGC", "code": "CRS84"}}});
        assert_eq!(column_crs(&crs84), Some(Crs::wgs84()));
    }

    #[test]
    fn three_dimensional_geometry_types() {
        let column: JsonValue = serde_json::json!({"geometry_types": ["Point Z"]});
        assert_eq!(column_geometry(&column).as_deref(), Some("3D Point"));

        let empty: JsonValue = serde_json::json!({"geometry_types": []});
        assert_eq!(column_geometry(&empty).as_deref(), Some("Unknown"));
    }

    #[test]
    fn plain_parquet_is_attribute_only() {
        let layer = layer_from_schema("plain".to_string(), &schema(), None);
        assert_eq!(layer.geometry, None);
        assert_eq!(layer.fields.len(), 6);
        assert_eq!(layer.fields[5], FieldSchema::new("geometry", "bytes"));
    }

    #[test]
    fn invalid_geo_metadata() {
        assert!(parse_geo_metadata("{", Path::new("x.parquet")).is_err());
    }

    #[test]
    fn arrow_type_strings() {
        assert_eq!(DataType::Boolean.native_type(), "bool");
        assert_eq!(DataType::Int16.native_type(), "int32");
        assert_eq!(DataType::Float32.native_type(), "float");
        assert_eq!(DataType::Decimal128(10, 2).native_type(), "decimal(10,2)");
        assert_eq!(DataType::Date32.native_type(), "date");
        assert_eq!(DataType::Null.native_type(), "null");
    }
}
