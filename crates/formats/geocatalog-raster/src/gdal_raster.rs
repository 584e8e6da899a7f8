//! GDAL backed profile reader.
//!
//! Used for the raster formats without a dedicated reader (ASCII grids, PNG, JPEG,
//! netCDF). World files and `.prj`/`.aux.xml` sidecars are picked up by GDAL.

use std::path::Path;

use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use geocatalog_core_common::{
    Crs, RasterProfile, RasterProfileReader, SchemaReadError, SchemaResult,
};
use log::debug;

/// Reader for the GDAL raster driver with the given short name.
#[derive(Debug, Clone, Copy)]
pub struct GdalRasterReader {
    driver: &'static str,
}

impl GdalRasterReader {
    /// Reader restricted to one GDAL driver, e.g. `"AAIGrid"`.
    #[must_use]
    pub const fn new(driver: &'static str) -> Self {
        Self { driver }
    }
}

/// Pixel size from a GDAL geotransform, accounting for rotation terms.
///
/// ```
/// use geocatalog_raster::gdal_raster::resolution;
///
/// assert_eq!(resolution(&[500_000.0, 30.0, 0.0, 4_600_000.0, 0.0, -30.0]), (30.0, 30.0));
/// assert_eq!(resolution(&[0.0, 3.0, 0.0, 0.0, 4.0, 0.0]), (5.0, 0.0));
/// ```
#[must_use]
pub fn resolution(geo_transform: &[f64; 6]) -> (f64, f64) {
    (
        geo_transform[1].hypot(geo_transform[4]),
        geo_transform[2].hypot(geo_transform[5]),
    )
}

impl RasterProfileReader for GdalRasterReader {
    fn read_profile(&self, path: &Path) -> SchemaResult<RasterProfile> {
        let drivers = [self.driver];
        let dataset = Dataset::open_ex(
            path,
            DatasetOptions {
                open_flags: GdalOpenFlags::GDAL_OF_RASTER | GdalOpenFlags::GDAL_OF_READONLY,
                allowed_drivers: Some(drivers.as_slice()),
                ..DatasetOptions::default()
            },
        )
        .map_err(|err| SchemaReadError::gdal(err, path))?;

        let (width, height) = dataset.raster_size();
        let count = u32::try_from(dataset.raster_count()).map_err(|_| {
            SchemaReadError::parse("Band count does not fit in 32 bits", path)
        })?;
        let res = match dataset.geo_transform() {
            Ok(geo_transform) => resolution(&geo_transform),
            Err(err) => {
                debug!("No geotransform for {}: {err}", path.display());
                (1.0, 1.0)
            },
        };
        let crs = dataset
            .spatial_ref()
            .ok()
            .and_then(|spatial_ref| Crs::from_spatial_ref(&spatial_ref));
        debug!(
            "{} raster {}: {width}x{height}, {count} band(s)",
            self.driver,
            path.display()
        );

        Ok(RasterProfile {
            crs,
            count,
            res,
            width: width as u64,
            height: height as u64,
        })
    }
}
