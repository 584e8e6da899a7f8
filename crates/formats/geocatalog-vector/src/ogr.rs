//! OGR backed schema reader.
//!
//! Formats with binary containers or sidecar files (ESRI Shapefile, GeoPackage) are
//! opened through GDAL. Field and geometry types are rendered as the native type
//! strings the rest of the catalog expects (`str:80`, `float:24.15`, `3D Point`, ...).

use std::path::Path;

use gdal::vector::{LayerAccess, OGRFieldType, OGRwkbGeometryType};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use geocatalog_core_common::{
    Crs, FieldSchema, LayerSchema, SchemaReadError, SchemaResult, VectorSchemaReader,
};
use log::debug;

const WKB_25D_FLAG: u32 = 0x8000_0000;

/// Reader for the OGR driver with the given short name.
#[derive(Debug, Clone, Copy)]
pub struct OgrReader {
    driver: &'static str,
}

impl OgrReader {
    /// Reader restricted to one OGR driver, e.g. `"GPKG"`.
    #[must_use]
    pub const fn new(driver: &'static str) -> Self {
        Self { driver }
    }

    fn open(&self, path: &Path) -> SchemaResult<Dataset> {
        let drivers = [self.driver];
        Dataset::open_ex(
            path,
            DatasetOptions {
                open_flags: GdalOpenFlags::GDAL_OF_VECTOR | GdalOpenFlags::GDAL_OF_READONLY,
                allowed_drivers: Some(drivers.as_slice()),
                ..DatasetOptions::default()
            },
        )
        .map_err(|err| SchemaReadError::gdal(err, path))
    }
}

/// Native type string for an OGR field definition.
///
/// ```
/// use gdal::vector::OGRFieldType;
/// use geocatalog_vector::ogr::ogr_field_type;
///
/// assert_eq!(ogr_field_type(OGRFieldType::OFTString, 80, 0), "str:80");
/// assert_eq!(ogr_field_type(OGRFieldType::OFTReal, 24, 15), "float:24.15");
/// assert_eq!(ogr_field_type(OGRFieldType::OFTInteger64, 0, 0), "int");
/// ```
#[must_use]
pub fn ogr_field_type(field_type: OGRFieldType::Type, width: i32, precision: i32) -> String {
    let sized = |name: &str| {
        if width > 0 {
            format!("{name}:{width}")
        } else {
            name.to_string()
        }
    };
    match field_type {
        OGRFieldType::OFTString => sized("str"),
        OGRFieldType::OFTInteger | OGRFieldType::OFTInteger64 => sized("int"),
        OGRFieldType::OFTReal if width > 0 && precision > 0 => {
            format!("float:{width}.{precision}")
        },
        OGRFieldType::OFTReal => sized("float"),
        OGRFieldType::OFTDate => "date".to_string(),
        OGRFieldType::OFTTime => "time".to_string(),
        OGRFieldType::OFTDateTime => "datetime".to_string(),
        OGRFieldType::OFTBinary => "bytes".to_string(),
        _ => "str".to_string(),
    }
}

/// Geometry type name for an OGR `wkbGeometryType` code.
///
/// Measured (`M`) variants collapse to their base type; `Z` variants get a `3D `
/// prefix.
///
/// ```
/// use gdal::vector::OGRwkbGeometryType;
/// use geocatalog_vector::ogr::geometry_type_name;
///
/// assert_eq!(geometry_type_name(OGRwkbGeometryType::wkbPolygon), "Polygon");
/// assert_eq!(geometry_type_name(OGRwkbGeometryType::wkbPoint25D), "3D Point");
/// assert_eq!(geometry_type_name(OGRwkbGeometryType::wkbNone), "None");
/// ```
#[must_use]
pub fn geometry_type_name(code: OGRwkbGeometryType::Type) -> String {
    if code == OGRwkbGeometryType::wkbNone {
        return "None".to_string();
    }
    let iso = code & !WKB_25D_FLAG;
    let has_z = code & WKB_25D_FLAG != 0 || matches!(iso / 1000, 1 | 3);
    let name = match iso % 1000 {
        1 => "Point",
        2 => "LineString",
        3 => "Polygon",
        4 => "MultiPoint",
        5 => "MultiLineString",
        6 => "MultiPolygon",
        7 => "GeometryCollection",
        _ => return "Unknown".to_string(),
    };
    if has_z {
        format!("3D {name}")
    } else {
        name.to_string()
    }
}

fn layer_schema<L: LayerAccess>(layer: &L) -> LayerSchema {
    let defn = layer.defn();
    let fields = defn
        .fields()
        .map(|field| {
            FieldSchema::new(
                field.name(),
                ogr_field_type(field.field_type(), field.width(), field.precision()),
            )
        })
        .collect();

    let (geometry, crs) = match defn.geom_fields().next() {
        Some(geom_field) => {
            let crs = geom_field
                .spatial_ref()
                .ok()
                .and_then(|spatial_ref| Crs::from_spatial_ref(&spatial_ref));
            (Some(geometry_type_name(geom_field.field_type())), crs)
        },
        None => (Some("None".to_string()), None),
    };

    LayerSchema {
        name: layer.name(),
        fields,
        geometry,
        crs,
    }
}

impl VectorSchemaReader for OgrReader {
    fn list_layers(&self, path: &Path) -> SchemaResult<Vec<String>> {
        let dataset = self.open(path)?;
        let layers: Vec<String> = dataset.layers().map(|layer| layer.name()).collect();
        debug!("{} layer(s) in {}: {layers:?}", self.driver, path.display());
        Ok(layers)
    }

    fn read_layer(&self, path: &Path, layer: &str) -> SchemaResult<LayerSchema> {
        let dataset = self.open(path)?;
        let found = dataset
            .layer_by_name(layer)
            .map_err(|_| SchemaReadError::LayerNotFound {
                layer: layer.to_string(),
                context: Some(path.display().to_string()),
            })?;
        Ok(layer_schema(&found))
    }
}
