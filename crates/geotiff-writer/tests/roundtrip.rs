//! Write daily rasters to disk and decode them with the TIFF reader.

use geotiff_writer::{partial_path, write_geotiff, Compression, GeoTiffOptions, GeoTiffRaster};
use test_utils::{assert_approx_eq, create_grid_with_nans, create_tmax_grid};
use tmax_common::GeoGrid;

fn italy_like_grid() -> GeoGrid {
    // 0.1 degree cells, north-first latitudes
    let lons: Vec<f64> = (0..8).map(|i| 13.0 + i as f64 * 0.1).collect();
    let lats: Vec<f64> = (0..5).map(|i| 47.0 - i as f64 * 0.1).collect();
    GeoGrid::from_axes(&lons, &lats).unwrap()
}

#[test]
fn test_values_survive_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tmax_20230601.tif");
    let grid = italy_like_grid();
    let data: Vec<f32> = create_tmax_grid(grid.width, grid.height, 0)
        .into_iter()
        .map(|k| k - 273.15)
        .collect();

    let bytes = write_geotiff(&path, &grid, &data, &GeoTiffOptions::default()).unwrap();
    assert!(bytes > 0);

    let raster = GeoTiffRaster::read(&path).unwrap();
    assert_eq!((raster.width, raster.height), (8, 5));
    assert_eq!(raster.data, data);
}

#[test]
fn test_georeferencing_tags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tmax_20230602.tif");
    let grid = italy_like_grid();

    write_geotiff(&path, &grid, &vec![20.0; grid.len()], &GeoTiffOptions::default()).unwrap();
    let raster = GeoTiffRaster::read(&path).unwrap();

    assert_eq!(raster.pixel_scale.len(), 3);
    assert_approx_eq!(raster.pixel_scale[0], 0.1, 1e-9);
    assert_approx_eq!(raster.pixel_scale[1], 0.1, 1e-9);

    assert_eq!(raster.tiepoint.len(), 6);
    assert_approx_eq!(raster.tiepoint[3], 12.95, 1e-9);
    assert_approx_eq!(raster.tiepoint[4], 47.05, 1e-9);

    assert_eq!(raster.geographic_epsg(), Some(4326));
}

#[test]
fn test_compression_codes() {
    let dir = tempfile::tempdir().unwrap();
    let grid = italy_like_grid();
    let data = vec![25.5; grid.len()];

    let cases = [
        (Compression::Lzw, 5),
        (Compression::Deflate, 8),
        (Compression::None, 1),
    ];
    for (compression, code) in cases {
        let path = dir.path().join(format!("{compression:?}.tif"));
        let options = GeoTiffOptions {
            compression,
            ..Default::default()
        };
        write_geotiff(&path, &grid, &data, &options).unwrap();

        let raster = GeoTiffRaster::read(&path).unwrap();
        assert_eq!(raster.compression, code, "{compression:?}");
        assert_eq!(raster.data, data);
    }
}

#[test]
fn test_nan_cells_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tmax_20230603.tif");
    let grid = italy_like_grid();
    let data = create_grid_with_nans(grid.width, grid.height, 31.5, &[(0, 0), (7, 4), (3, 2)]);

    write_geotiff(&path, &grid, &data, &GeoTiffOptions::default()).unwrap();
    let raster = GeoTiffRaster::read(&path).unwrap();

    assert!(raster.data[0].is_nan());
    assert!(raster.data[4 * 8 + 7].is_nan());
    for (got, want) in raster.data.iter().zip(&data) {
        if want.is_nan() {
            assert!(got.is_nan());
        } else {
            assert_eq!(got, want);
        }
    }
}

#[test]
fn test_no_partial_file_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tmax_20230604.tif");
    let grid = italy_like_grid();

    write_geotiff(&path, &grid, &vec![1.0; grid.len()], &GeoTiffOptions::default()).unwrap();

    assert!(path.exists());
    assert!(!partial_path(&path).exists());
}

#[test]
fn test_failed_write_leaves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tmax_20230605.tif");
    let grid = italy_like_grid();

    let result = write_geotiff(&path, &grid, &[1.0; 3], &GeoTiffOptions::default());

    assert!(result.is_err());
    assert!(!path.exists());
    assert!(!partial_path(&path).exists());
}

#[test]
fn test_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tmax_20230606.tif");
    let grid = italy_like_grid();

    write_geotiff(&path, &grid, &vec![1.0; grid.len()], &GeoTiffOptions::default()).unwrap();
    write_geotiff(&path, &grid, &vec![2.0; grid.len()], &GeoTiffOptions::default()).unwrap();

    let raster = GeoTiffRaster::read(&path).unwrap();
    assert!(raster.data.iter().all(|v| *v == 2.0));
}
