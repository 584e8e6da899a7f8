//! CSV schema reader.
//!
//! Column types are inferred from a sample of records. Geometry comes either from a
//! WKT column (`wkt`, `geometry`, `geom`, `the_geom`) or from a coordinate column
//! pair (`lon`/`lat`, `longitude`/`latitude`, `x`/`y`).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use geocatalog_core_common::{
    Crs, LayerSchema, SchemaReadError, SchemaResult, SourcePosition, VectorSchemaReader,
    layer_name_from_path,
};
use log::debug;

use crate::infer::{FieldTypes, GeometryTypes, ValueKind, classify_text, wkt_geometry_type};

const WKT_COLUMNS: &[&str] = &["wkt", "geometry", "geom", "the_geom"];
const LON_COLUMNS: &[&str] = &["lon", "lng", "long", "longitude"];
const LAT_COLUMNS: &[&str] = &["lat", "latitude"];
const CANDIDATE_DELIMITERS: &[u8] = b",;\t|";

/// CSV schema inference options.
#[derive(Debug, Clone)]
pub struct CsvSchemaOptions {
    /// Field delimiter; detected from the header line when `None`.
    pub delimiter: Option<u8>,
    /// Maximum number of records sampled for type inference.
    pub schema_infer_max_rec: usize,
}

impl Default for CsvSchemaOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            schema_infer_max_rec: 1000,
        }
    }
}

impl CsvSchemaOptions {
    /// Set the delimiter explicitly.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Set maximum records for schema inference.
    #[must_use]
    pub fn with_schema_infer_max_rec(mut self, max_rec: usize) -> Self {
        self.schema_infer_max_rec = max_rec;
        self
    }
}

/// Reader for `.csv` files.
#[derive(Debug, Clone, Default)]
pub struct CsvReader {
    options: CsvSchemaOptions,
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

/// Picks the candidate delimiter occurring most often in the header line.
fn detect_delimiter(header_line: &str) -> u8 {
    CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .max_by_key(|d| header_line.bytes().filter(|b| b == d).count())
        .filter(|d| header_line.as_bytes().contains(d))
        .unwrap_or(b',')
}

impl CsvReader {
    /// Creates a reader with explicit options.
    #[must_use]
    pub fn new(options: CsvSchemaOptions) -> Self {
        Self { options }
    }

    fn delimiter_for(&self, path: &Path) -> SchemaResult<u8> {
        if let Some(delimiter) = self.options.delimiter {
            return Ok(delimiter);
        }
        let file = File::open(path).map_err(|err| SchemaReadError::io(err, path))?;
        let mut header_line = String::new();
        BufReader::new(file)
            .read_line(&mut header_line)
            .map_err(|err| SchemaReadError::io(err, path))?;
        Ok(detect_delimiter(&header_line))
    }

    /// Infers the layer schema of the CSV file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or has no header row.
    pub fn read(&self, path: &Path) -> SchemaResult<LayerSchema> {
        let delimiter = self.delimiter_for(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|err| csv_error(err, path))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|err| csv_error(err, path))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(SchemaReadError::parse("CSV file has no header row", path));
        }

        let mut records = Vec::new();
        for result in reader.records().take(self.options.schema_infer_max_rec) {
            records.push(result.map_err(|err| csv_error(err, path))?);
        }
        debug!(
            "Sampled {} CSV record(s) from {}",
            records.len(),
            path.display()
        );

        let wkt_idx = find_column(&headers, WKT_COLUMNS).filter(|&idx| {
            records
                .iter()
                .filter_map(|r| r.get(idx).map(str::trim))
                .find(|v| !v.is_empty())
                .is_some_and(|v| wkt_geometry_type(v).is_some())
        });

        let mut fields = FieldTypes::default();
        for (idx, name) in headers.iter().enumerate() {
            if Some(idx) == wkt_idx {
                continue;
            }
            fields.observe(name, None);
            for record in &records {
                fields.observe(name, record.get(idx).and_then(classify_text));
            }
        }

        let (geometry, crs) = if let Some(idx) = wkt_idx {
            let mut geometries = GeometryTypes::default();
            for value in records.iter().filter_map(|r| r.get(idx)) {
                if let Some((geometry_type, has_z)) = wkt_geometry_type(value) {
                    geometries.observe(geometry_type, has_z);
                }
            }
            (geometries.finish(), None)
        } else {
            coordinate_geometry(&headers, &records)
        };

        Ok(LayerSchema {
            name: layer_name_from_path(path),
            fields: fields.into_fields(),
            geometry,
            crs,
        })
    }
}

/// `Point` geometry in WGS 84 from a numeric coordinate column pair.
fn coordinate_geometry(
    headers: &[String],
    records: &[csv::StringRecord],
) -> (Option<String>, Option<Crs>) {
    let numeric = |idx: usize| {
        records
            .iter()
            .filter_map(|r| r.get(idx).and_then(classify_text))
            .all(|kind| matches!(kind, ValueKind::Int | ValueKind::Float))
    };

    let pair = find_column(headers, LON_COLUMNS)
        .zip(find_column(headers, LAT_COLUMNS))
        .or_else(|| find_column(headers, &["x"]).zip(find_column(headers, &["y"])));
    if let Some((x, y)) = pair
        && numeric(x)
        && numeric(y)
    {
        return (Some("Point".to_string()), Some(Crs::wgs84()));
    }
    (None, None)
}

fn csv_error(err: csv::Error, path: &Path) -> SchemaReadError {
    let position = err.position().map(|pos| SourcePosition {
        line: Some(pos.line()),
        byte_offset: Some(pos.byte()),
        record: Some(pos.record()),
    });
    match err.into_kind() {
        csv::ErrorKind::Io(source) => SchemaReadError::io(source, path),
        kind => SchemaReadError::Parse {
            message: format!("{kind:?}"),
            position,
            context: Some(path.display().to_string()),
        },
    }
}

impl VectorSchemaReader for CsvReader {
    fn list_layers(&self, path: &Path) -> SchemaResult<Vec<String>> {
        Ok(vec![self.read(path)?.name])
    }

    fn read_layer(&self, path: &Path, layer: &str) -> SchemaResult<LayerSchema> {
        let schema = self.read(path)?;
        if schema.name != layer {
            return Err(SchemaReadError::LayerNotFound {
                layer: layer.to_string(),
                context: Some(path.display().to_string()),
            });
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocatalog_core_common::FieldSchema;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn infers_types_and_lon_lat_points() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "stations.csv",
            "id,name,lon,lat,opened,active\n1,Alpha,10.5,45.1,2020-01-02,true\n2,Beta,11,46.2,2021-05-06,false\n",
        );

        let layer = CsvReader::default().read(&path).unwrap();
        assert_eq!(layer.name, "stations");
        assert_eq!(
            layer.fields,
            vec![
                FieldSchema::new("id", "int"),
                FieldSchema::new("name", "str"),
                FieldSchema::new("lon", "float"),
                FieldSchema::new("lat", "float"),
                FieldSchema::new("opened", "date"),
                FieldSchema::new("active", "bool"),
            ]
        );
        assert_eq!(layer.geometry_descriptor().as_deref(), Some("Point/4326"));
    }

    #[test]
    fn x_y_columns_are_wgs84_points() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "wells.csv", "X,Y,depth
10.1,45.2,120
10.3,45.4,80
");

        let layer = CsvReader::default().read(&path).unwrap();
        assert_eq!(layer.geometry.as_deref(), Some("Point"));
        assert_eq!(layer.crs, Some(Crs::wgs84()));
        assert_eq!(layer.geometry_descriptor().as_deref(), Some("Point/4326"));
    }

    #[test]
    fn non_numeric_x_y_is_not_geometry() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "grid.csv", "x,y
A,B
");

        let layer = CsvReader::default().read(&path).unwrap();
        assert_eq!(layer.geometry, None);
        assert_eq!(layer.crs, None);
    }

    #[test]
    fn wkt_column_becomes_geometry() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "zones.csv",
            "WKT;code\n\"POLYGON ((0 0, 1 0, 1 1, 0 0))\";A\n\"MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)))\";B\n",
        );

        let layer = CsvReader::default().read(&path).unwrap();
        assert_eq!(layer.fields, vec![FieldSchema::new("code", "str")]);
        assert_eq!(layer.geometry.as_deref(), Some("MultiPolygon"));
        assert_eq!(layer.crs, None);
    }

    #[test]
    fn attribute_only_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "plain.csv", "a,b\n,\n");

        let layer = CsvReader::default().read(&path).unwrap();
        assert_eq!(
            layer.fields,
            vec![FieldSchema::new("a", "str"), FieldSchema::new("b", "str")]
        );
        assert_eq!(layer.geometry, None);
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "empty.csv", "");

        assert!(CsvReader::default().read(&path).is_err());
    }

    #[test]
    fn delimiter_detection() {
        assert_eq!(detect_delimiter("a;b;c\n"), b';');
        assert_eq!(detect_delimiter("a\tb\n"), b'\t');
        assert_eq!(detect_delimiter("single\n"), b',');
    }
}
