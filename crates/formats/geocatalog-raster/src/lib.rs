//! Raster format profile readers for `GeoCatalog`.
//!
//! Each reader implements [`RasterProfileReader`] and summarizes a raster file
//! as a [`RasterProfile`](geocatalog_core_common::RasterProfile): CRS, band
//! count, pixel size and dimensions. Pixel data is never decoded.
//!
//! GeoTIFF headers are read with the `tiff` crate; every other supported format
//! goes through GDAL.

pub mod gdal_raster;
pub mod gtiff;

pub use gdal_raster::GdalRasterReader;
use geocatalog_core_common::RasterProfileReader;
pub use gtiff::GeoTiffReader;

/// Returns the profile reader registered for a raster driver short name.
#[must_use]
pub fn reader_for_driver(short_name: &str) -> Option<Box<dyn RasterProfileReader>> {
    let reader: Box<dyn RasterProfileReader> = match short_name {
        "GTiff" => Box::new(GeoTiffReader),
        "AAIGrid" => Box::new(GdalRasterReader::new("AAIGrid")),
        "PNG" => Box::new(GdalRasterReader::new("PNG")),
        "JPEG" => Box::new(GdalRasterReader::new("JPEG")),
        "netCDF" => Box::new(GdalRasterReader::new("netCDF")),
        _ => return None,
    };
    Some(reader)
}
