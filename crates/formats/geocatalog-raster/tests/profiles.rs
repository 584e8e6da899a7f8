use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use geocatalog_core_common::{Crs, RasterProfile, SchemaReadError};
use geocatalog_raster::reader_for_driver;
use tempfile::TempDir;
use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::{Gray8, RGB8};
use tiff::tags::Tag;

const GEOTIFF_MODELPIXELSCALE: u16 = 33550;
const GEOTIFF_MODELTIEPOINT: u16 = 33922;
const GEOTIFF_GEOKEYDIRECTORY: u16 = 34735;

fn read(driver: &str, path: &Path) -> RasterProfile {
    reader_for_driver(driver)
        .expect("registered raster reader")
        .read_profile(path)
        .unwrap()
}

/// Writes a single band north-up GeoTIFF in UTM 33N with 10m pixels.
fn write_gray_geotiff(path: &Path, width: u32, height: u32) {
    let writer = BufWriter::new(File::create(path).unwrap());
    let mut encoder = TiffEncoder::new(writer).unwrap();
    let mut image = encoder.new_image::<Gray8>(width, height).unwrap();

    let pixel_scale = [10.0f64, 10.0, 0.0];
    let tiepoint = [0.0f64, 0.0, 0.0, 500_000.0, 4_600_000.0, 0.0];
    let geokeys: [u16; 16] = [1, 1, 0, 3, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, 32633];
    let dir = image.encoder();
    dir.write_tag(Tag::Unknown(GEOTIFF_MODELPIXELSCALE), &pixel_scale[..])
        .unwrap();
    dir.write_tag(Tag::Unknown(GEOTIFF_MODELTIEPOINT), &tiepoint[..])
        .unwrap();
    dir.write_tag(Tag::Unknown(GEOTIFF_GEOKEYDIRECTORY), &geokeys[..])
        .unwrap();

    let pixels = vec![0u8; (width * height) as usize];
    image.write_data(&pixels).unwrap();
}

fn write_plain_rgb_tiff(path: &Path) {
    let writer = BufWriter::new(File::create(path).unwrap());
    let mut encoder = TiffEncoder::new(writer).unwrap();
    encoder
        .write_image::<RGB8>(2, 3, &[255u8; 2 * 3 * 3])
        .unwrap();
}

#[test]
fn test_geotiff_profile() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("elevation.tif");
    write_gray_geotiff(&path, 8, 4);

    let profile = read("GTiff", &path);
    assert_eq!(profile.width, 8);
    assert_eq!(profile.height, 4);
    assert_eq!(profile.count, 1);
    assert_eq!(profile.res, (10.0, 10.0));
    assert_eq!(profile.crs, Some(Crs::epsg(32633)));

    let properties = profile.properties();
    assert_eq!(
        properties,
        vec![
            ("#crs".to_string(), "EPSG:32633".to_string()),
            ("#count".to_string(), "1".to_string()),
            ("#res".to_string(), "[10.0, 10.0]".to_string()),
            ("#width".to_string(), "8".to_string()),
            ("#height".to_string(), "4".to_string()),
        ]
    );
}

#[test]
fn test_plain_tiff_has_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.tiff");
    write_plain_rgb_tiff(&path);

    let profile = read("GTiff", &path);
    assert_eq!((profile.width, profile.height), (2, 3));
    assert_eq!(profile.count, 3);
    assert_eq!(profile.res, (1.0, 1.0));
    assert_eq!(profile.crs, None);
    assert_eq!(profile.properties()[0].1, "None");
}

#[test]
fn test_invalid_tiff_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path: PathBuf = dir.path().join("broken.tif");
    std::fs::write(&path, b"not a tiff at all").unwrap();

    let err = reader_for_driver("GTiff")
        .unwrap()
        .read_profile(&path)
        .unwrap_err();
    assert!(err.to_string().contains("broken.tif"));
}

/// 3x2 single band grayscale PNG.
const GRAY_PNG: [u8; 71] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48,
    0x44, 0x52, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x02, 0x08, 0x00, 0x00, 0x00,
    0x00, 0xb8, 0x1f, 0x39, 0xc6, 0x00, 0x00, 0x00, 0x0e, 0x49, 0x44, 0x41, 0x54, 0x78,
    0x9c, 0x63, 0xe0, 0x12, 0x91, 0x63, 0x00, 0x62, 0x00, 0x01, 0xc0, 0x00, 0x79, 0x45,
    0x17, 0xbf, 0xc7, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#;

#[test]
fn test_ascii_grid_through_registry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("slope.asc");
    std::fs::write(
        &path,
        "ncols 5\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 0.5\n0 0 0 0 0\n1 1 1 1 1\n",
    )
    .unwrap();

    let profile = read("AAIGrid", &path);
    assert_eq!((profile.width, profile.height), (5, 2));
    assert_eq!(profile.count, 1);
    assert_eq!(profile.res, (0.5, 0.5));
    assert_eq!(profile.crs, None);
}

#[test]
fn test_ascii_grid_with_projection_sidecar() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("grid.asc");
    std::fs::write(
        &path,
        "ncols 3\nnrows 3\nxllcorner 10\nyllcorner 45\ncellsize 0.25\n0 0 0\n0 0 0\n0 0 0\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("grid.prj"), WGS84_WKT).unwrap();

    let profile = read("AAIGrid", &path);
    assert_eq!(profile.crs, Some(Crs::wgs84()));
    assert_eq!(profile.properties()[0].1, "EPSG:4326");
    assert_eq!(profile.properties()[2].1, "[0.25, 0.25]");
}

#[test]
fn test_png_with_world_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scan.png");
    std::fs::write(&path, GRAY_PNG).unwrap();
    std::fs::write(
        dir.path().join("scan.pgw"),
        "2.0\n0.0\n0.0\n-2.0\n100.0\n200.0\n",
    )
    .unwrap();

    let profile = read("PNG", &path);
    assert_eq!((profile.width, profile.height), (3, 2));
    assert_eq!(profile.count, 1);
    assert_eq!(profile.res, (2.0, 2.0));
    assert_eq!(profile.crs, None);
}

#[test]
fn test_png_without_georeferencing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logo.png");
    std::fs::write(&path, GRAY_PNG).unwrap();

    let profile = read("PNG", &path);
    assert_eq!(profile.res, (1.0, 1.0));
}

#[test]
fn test_gdal_formats_report_unreadable_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.jpg");
    std::fs::write(&path, b"not a jpeg").unwrap();

    let err = reader_for_driver("JPEG")
        .unwrap()
        .read_profile(&path)
        .unwrap_err();
    assert!(matches!(err, SchemaReadError::Gdal { .. }));
    assert!(err.to_string().contains("photo.jpg"));

    assert!(reader_for_driver("netCDF").is_some());
}

#[test]
fn test_unknown_raster_driver() {
    assert!(reader_for_driver("GeoJSON").is_none());
    assert!(reader_for_driver("HFA").is_none());
}
