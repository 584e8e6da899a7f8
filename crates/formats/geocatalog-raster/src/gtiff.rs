//! `GeoTIFF` profile reader.
//!
//! Dimensions and band count come from the first image file directory, the pixel
//! size from `ModelPixelScale` (or `ModelTransformation`) and the CRS from the
//! GeoKey directory.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geocatalog_core_common::{
    Crs, RasterProfile, RasterProfileReader, SchemaReadError, SchemaResult,
};
use log::debug;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

// GeoTIFF tag IDs
const GEOTIFF_MODELPIXELSCALE: u16 = 33550;
const GEOTIFF_MODELTRANSFORMATION: u16 = 34264;
const GEOTIFF_GEOKEYDIRECTORY: u16 = 34735;

// GeoKey IDs
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

const USER_DEFINED: u16 = 32767;

/// Reader for `.tif` / `.tiff` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoTiffReader;

fn tiff_error(err: tiff::TiffError, path: &Path) -> SchemaReadError {
    match err {
        tiff::TiffError::IoError(source) => SchemaReadError::io(source, path),
        other => SchemaReadError::parse(format!("Invalid TIFF: {other}"), path),
    }
}

/// EPSG code of the GeoKey directory, projected key first.
///
/// The directory is a header `[version, revision, minor, count]` followed by
/// `count` entries of `[key id, tag location, count, value]`; only inline values
/// (tag location 0) are considered.
#[must_use]
pub fn crs_from_geokeys(geokeys: &[u16]) -> Option<Crs> {
    let count = usize::from(*geokeys.get(3)?);
    let entries: Vec<&[u16]> = geokeys
        .get(4..)?
        .chunks_exact(4)
        .take(count)
        .filter(|entry| entry[1] == 0)
        .collect();

    [PROJECTED_CS_TYPE_GEO_KEY, GEOGRAPHIC_TYPE_GEO_KEY]
        .iter()
        .find_map(|key| {
            entries
                .iter()
                .find(|entry| entry[0] == *key)
                .map(|entry| entry[3])
        })
        .filter(|code| *code != 0 && *code != USER_DEFINED)
        .map(|code| Crs::epsg(u32::from(code)))
}

/// Pixel size from `ModelPixelScale` `[sx, sy, sz]` or a 4x4 `ModelTransformation`.
#[must_use]
pub fn resolution(scale: Option<&[f64]>, transformation: Option<&[f64]>) -> (f64, f64) {
    if let Some(scale) = scale
        && scale.len() >= 2
    {
        return (scale[0].abs(), scale[1].abs());
    }
    if let Some(matrix) = transformation
        && matrix.len() >= 6
    {
        return (matrix[0].abs(), matrix[5].abs());
    }
    (1.0, 1.0)
}

impl RasterProfileReader for GeoTiffReader {
    fn read_profile(&self, path: &Path) -> SchemaResult<RasterProfile> {
        let file = File::open(path).map_err(|err| SchemaReadError::io(err, path))?;
        let mut decoder =
            Decoder::new(BufReader::new(file)).map_err(|err| tiff_error(err, path))?;

        let (width, height) = decoder.dimensions().map_err(|err| tiff_error(err, path))?;
        let count = decoder
            .find_tag(Tag::SamplesPerPixel)
            .and_then(|value| value.map(tiff::decoder::ifd::Value::into_u32).transpose())
            .map_err(|err| tiff_error(err, path))?
            .unwrap_or(1);

        let mut f64_tag = |code: u16| {
            decoder
                .find_tag(Tag::from_u16_exhaustive(code))
                .and_then(|value| value.map(tiff::decoder::ifd::Value::into_f64_vec).transpose())
                .map_err(|err| tiff_error(err, path))
        };
        let scale = f64_tag(GEOTIFF_MODELPIXELSCALE)?;
        let transformation = f64_tag(GEOTIFF_MODELTRANSFORMATION)?;

        let geokeys = decoder
            .find_tag(Tag::from_u16_exhaustive(GEOTIFF_GEOKEYDIRECTORY))
            .and_then(|value| value.map(tiff::decoder::ifd::Value::into_u16_vec).transpose())
            .map_err(|err| tiff_error(err, path))?;
        let crs = geokeys.as_deref().and_then(crs_from_geokeys);
        debug!(
            "GeoTIFF {}: {width}x{height}, {count} band(s), crs {crs:?}",
            path.display()
        );

        Ok(RasterProfile {
            crs,
            count,
            res: resolution(scale.as_deref(), transformation.as_deref()),
            width: u64::from(width),
            height: u64::from(height),
        })
    }
}
