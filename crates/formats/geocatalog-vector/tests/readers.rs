use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};
use gdal::DriverManager;
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldDefn, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType};
use geocatalog_core_common::{Crs, FieldSchema, SchemaReadError, VectorSchemaReader};
use geocatalog_vector::reader_for_driver;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use tempfile::TempDir;

fn write_bytes(path: &Path, bytes: &[u8]) {
    let mut file = File::create(path).unwrap();
    file.write_all(bytes).unwrap();
}

/// Writes an empty `.shp` main file and its `.shx` index with the given shape type.
fn write_shp(path: &Path, shape_type: i32) {
    let mut header = vec![0u8; 100];
    header[0..4].copy_from_slice(&9994i32.to_be_bytes());
    header[24..28].copy_from_slice(&50i32.to_be_bytes());
    header[28..32].copy_from_slice(&1000i32.to_le_bytes());
    header[32..36].copy_from_slice(&shape_type.to_le_bytes());
    write_bytes(path, &header);
    write_bytes(&path.with_extension("shx"), &header);
}

/// Writes a `.dbf` with no records and the given `(raw name, type, length, decimals)` fields.
fn write_dbf(path: &Path, fields: &[(&[u8], u8, u8, u8)]) {
    let header_len = 32 + 32 * fields.len() + 1;
    let record_len: usize = 1 + fields.iter().map(|f| usize::from(f.2)).sum::<usize>();

    let mut bytes = vec![0u8; 32];
    bytes[0] = 0x03;
    bytes[8..10].copy_from_slice(&u16::try_from(header_len).unwrap().to_le_bytes());
    bytes[10..12].copy_from_slice(&u16::try_from(record_len).unwrap().to_le_bytes());
    for (name, kind, length, decimals) in fields {
        let mut descriptor = [0u8; 32];
        descriptor[..name.len()].copy_from_slice(name);
        descriptor[11] = *kind;
        descriptor[16] = *length;
        descriptor[17] = *decimals;
        bytes.extend_from_slice(&descriptor);
    }
    bytes.push(0x0D);
    bytes.push(0x1A);
    write_bytes(path, &bytes);
}

fn add_field<L: LayerAccess>(layer: &L, name: &str, field_type: u32, width: i32, precision: i32) {
    let field = FieldDefn::new(name, field_type).unwrap();
    field.set_width(width);
    field.set_precision(precision);
    field.add_to_layer(layer).unwrap();
}

/// Creates `roads.shp` in UTM 33N through the OGR shapefile driver.
fn shapefile_fixture(dir: &TempDir) -> PathBuf {
    let shp = dir.path().join("roads.shp");
    let driver = DriverManager::get_driver_by_name("ESRI Shapefile").unwrap();
    let mut dataset = driver.create_vector_only(&shp).unwrap();
    let srs = SpatialRef::from_epsg(32633).unwrap();
    let layer = dataset
        .create_layer(LayerOptions {
            name: "roads",
            srs: Some(&srs),
            ty: OGRwkbGeometryType::wkbLineString,
            options: None,
        })
        .unwrap();
    add_field(&layer, "NAME", OGRFieldType::OFTString, 80, 0);
    add_field(&layer, "LANES", OGRFieldType::OFTInteger, 4, 0);
    add_field(&layer, "LENGTH", OGRFieldType::OFTReal, 24, 15);
    add_field(&layer, "BUILT", OGRFieldType::OFTDate, 8, 0);
    add_field(&layer, "STRAßE", OGRFieldType::OFTString, 40, 0);
    shp
}

/// Creates a GeoPackage with a polygon layer and an attribute-only table.
fn geopackage_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("cadastre.gpkg");
    let driver = DriverManager::get_driver_by_name("GPKG").unwrap();
    let mut dataset = driver.create_vector_only(&path).unwrap();

    let srs = SpatialRef::from_epsg(2154).unwrap();
    {
        let parcels = dataset
            .create_layer(LayerOptions {
                name: "parcels",
                srs: Some(&srs),
                ty: OGRwkbGeometryType::wkbMultiPolygon,
                options: None,
            })
            .unwrap();
        add_field(&parcels, "owner", OGRFieldType::OFTString, 0, 0);
        add_field(&parcels, "area", OGRFieldType::OFTReal, 0, 0);
        add_field(&parcels, "surveyed", OGRFieldType::OFTDateTime, 0, 0);
    }

    let owners = dataset
        .create_layer(LayerOptions {
            name: "owners",
            srs: None,
            ty: OGRwkbGeometryType::wkbNone,
            options: None,
        })
        .unwrap();
    add_field(&owners, "name", OGRFieldType::OFTString, 0, 0);
    add_field(&owners, "parcel_count", OGRFieldType::OFTInteger64, 0, 0);
    path
}

#[test]
fn test_shapefile_layer_schema() {
    let dir = TempDir::new().unwrap();
    let shp = shapefile_fixture(&dir);
    let reader = reader_for_driver("ESRI Shapefile").expect("shapefile reader");

    let layers = reader.list_layers(&shp).unwrap();
    assert_eq!(layers, vec!["roads".to_string()]);

    let layer = reader.read_layer(&shp, "roads").unwrap();
    assert_eq!(
        layer.fields,
        vec![
            FieldSchema::new("NAME", "str:80"),
            FieldSchema::new("LANES", "int:4"),
            FieldSchema::new("LENGTH", "float:24.15"),
            FieldSchema::new("BUILT", "date"),
            FieldSchema::new("STRAßE", "str:40"),
        ]
    );
    assert_eq!(layer.geometry.as_deref(), Some("LineString"));
    assert_eq!(layer.crs, Some(Crs::epsg(32633)));
    assert_eq!(
        layer.properties().last().map(|(k, v)| (k.as_str(), v.as_str())),
        Some(("geometry", "LineString/32633"))
    );
}

#[test]
fn test_shapefile_field_names_follow_code_page() {
    let dir = TempDir::new().unwrap();
    let shp = dir.path().join("streets.shp");
    write_shp(&shp, 11);
    // "STRAßE" in windows-1252
    write_dbf(
        &dir.path().join("streets.dbf"),
        &[(&b"STRA\xdfE"[..], b'C', 40, 0), (&b"NR"[..], b'N', 5, 0)],
    );
    write_bytes(&dir.path().join("streets.cpg"), b"1252");

    let reader = reader_for_driver("ESRI Shapefile").unwrap();
    let layer = reader.read_layer(&shp, "streets").unwrap();
    assert_eq!(
        layer.fields,
        vec![FieldSchema::new("STRAßE", "str:40"), FieldSchema::new("NR", "int:5")]
    );
    assert_eq!(layer.geometry.as_deref(), Some("3D Point"));
    assert_eq!(layer.crs, None);
    assert_eq!(layer.geometry_descriptor().as_deref(), Some("3D Point/"));
}

#[test]
fn test_shapefile_with_bad_file_code() {
    let dir = TempDir::new().unwrap();
    let shp = dir.path().join("broken.shp");
    write_bytes(&shp, &[0u8; 100]);

    let reader = reader_for_driver("ESRI Shapefile").unwrap();
    let err = reader.list_layers(&shp).unwrap_err();
    assert!(matches!(err, SchemaReadError::Gdal { .. }));
    assert!(err.to_string().contains("broken.shp"));
}

#[test]
fn test_geopackage_lists_every_layer() {
    let dir = TempDir::new().unwrap();
    let path = geopackage_fixture(&dir);
    let reader = reader_for_driver("GPKG").expect("geopackage reader");

    let mut layers = reader.list_layers(&path).unwrap();
    layers.sort();
    assert_eq!(layers, vec!["owners".to_string(), "parcels".to_string()]);

    let parcels = reader.read_layer(&path, "parcels").unwrap();
    assert_eq!(
        parcels.properties(),
        vec![
            ("owner".to_string(), "str".to_string()),
            ("area".to_string(), "float".to_string()),
            ("surveyed".to_string(), "datetime".to_string()),
            ("geometry".to_string(), "MultiPolygon/2154".to_string()),
        ]
    );

    let owners = reader.read_layer(&path, "owners").unwrap();
    assert_eq!(owners.geometry.as_deref(), Some("None"));
    assert_eq!(
        owners.properties(),
        vec![
            ("name".to_string(), "str".to_string()),
            ("parcel_count".to_string(), "int".to_string()),
        ]
    );

    let missing = reader.read_layer(&path, "buildings").unwrap_err();
    assert!(matches!(missing, SchemaReadError::LayerNotFound { .. }));
}

/// Writes an empty Parquet file with an id, name, height and WKB geometry column.
fn write_parquet(path: &Path, geo: Option<&str>) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("height", DataType::Float64, true),
        Field::new("geometry", DataType::Binary, true),
    ]));
    let properties = WriterProperties::builder()
        .set_key_value_metadata(
            geo.map(|geo| vec![KeyValue::new("geo".to_string(), geo.to_string())]),
        )
        .build();
    let writer = ArrowWriter::try_new(File::create(path).unwrap(), schema, Some(properties))
        .unwrap();
    writer.close().unwrap();
}

#[test]
fn test_geoparquet_file_through_registry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("buildings.parquet");
    write_parquet(
        &path,
        Some(
            r#"{"version":"1.1.0","primary_column":"geometry","columns":{"geometry":{"encoding":"WKB","geometry_types":["Polygon","MultiPolygon"],"crs":{"id":{"authority":"EPSG","code":3857}}}}}"#,
        ),
    );

    let reader = reader_for_driver("Parquet").unwrap();
    assert_eq!(reader.list_layers(&path).unwrap(), vec!["buildings".to_string()]);
    let layer = reader.read_layer(&path, "buildings").unwrap();
    assert_eq!(
        layer.properties(),
        vec![
            ("id".to_string(), "long".to_string()),
            ("name".to_string(), "str".to_string()),
            ("height".to_string(), "double".to_string()),
            ("geometry".to_string(), "MultiPolygon/3857".to_string()),
        ]
    );
}

#[test]
fn test_plain_parquet_file_through_registry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("readings.parquet");
    write_parquet(&path, None);

    let layer = reader_for_driver("Parquet")
        .unwrap()
        .read_layer(&path, "readings")
        .unwrap();
    assert_eq!(layer.geometry, None);
    assert_eq!(layer.fields[3], FieldSchema::new("geometry", "bytes"));
    assert_eq!(layer.properties().len(), 4);
}

#[test]
fn test_geojson_reader_through_registry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cities.geojson");
    write_bytes(
        &path,
        br#"{"type":"FeatureCollection","features":[
{"type":"Feature","geometry":{"type":"Point","coordinates":[-74.0060,40.7128]},"properties":{"name":"New York","population":8336817}},
{"type":"Feature","geometry":{"type":"Point","coordinates":[-118.2437,34.0522]},"properties":{"name":"Los Angeles","population":3979576}}
]}"#,
    );

    let reader = reader_for_driver("GeoJSON").unwrap();
    assert_eq!(reader.list_layers(&path).unwrap(), vec!["cities".to_string()]);

    let layer = reader.read_layer(&path, "cities").unwrap();
    assert_eq!(
        layer.properties(),
        vec![
            ("name".to_string(), "str".to_string()),
            ("population".to_string(), "int".to_string()),
            ("geometry".to_string(), "Point/4326".to_string()),
        ]
    );

    let missing = reader.read_layer(&path, "towns").unwrap_err();
    assert!(matches!(missing, SchemaReadError::LayerNotFound { .. }));
}

#[test]
fn test_geojson_seq_reader_through_registry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracks.geojsonl");
    write_bytes(
        &path,
        br#"{"type":"Feature","geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]},"properties":{"speed":1.5}}
{"type":"Feature","geometry":{"type":"LineString","coordinates":[[1,1],[2,2]]},"properties":{"speed":2}}
"#,
    );

    let reader = reader_for_driver("GeoJSONSeq").unwrap();
    let layer = reader.read_layer(&path, "tracks").unwrap();
    assert_eq!(layer.fields, vec![FieldSchema::new("speed", "float")]);
    assert_eq!(layer.geometry.as_deref(), Some("LineString"));
}

#[test]
fn test_unknown_driver_has_no_reader() {
    assert!(reader_for_driver("FlatGeobuf").is_none());
    assert!(reader_for_driver("GTiff").is_none());
}
