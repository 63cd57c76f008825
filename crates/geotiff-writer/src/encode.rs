//! GeoTIFF encoding for single-band f32 grids.
//!
//! Writes a baseline TIFF (one strip-organised Gray32Float image) plus the
//! three GeoTIFF tags readers need to place it on the globe:
//! - ModelPixelScaleTag: cell size
//! - ModelTiepointTag: top-left corner
//! - GeoKeyDirectoryTag: the CRS
//!
//! NaN marks missing cells and is advertised through GDAL_NODATA.

use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::compression::{Compression as TiffCompression, Deflate, Lzw, Uncompressed};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tmax_common::{CrsCode, GeoGrid};
use tracing::debug;

use crate::error::{GeoTiffError, GeoTiffResult};

pub(crate) const MODEL_PIXEL_SCALE: u16 = 33550;
pub(crate) const MODEL_TIEPOINT: u16 = 33922;
pub(crate) const GEO_KEY_DIRECTORY: u16 = 34735;
pub(crate) const GDAL_NODATA: u16 = 42113;

/// Lossless compression applied to the image strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Lzw,
    Deflate,
    None,
}

/// Options for [`write_geotiff`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffOptions {
    pub compression: Compression,
    pub crs: CrsCode,
}

/// Encode a grid into any seekable writer.
pub fn encode_geotiff<W: Write + Seek>(
    writer: W,
    grid: &GeoGrid,
    data: &[f32],
    options: &GeoTiffOptions,
) -> GeoTiffResult<()> {
    if data.len() != grid.len() {
        return Err(GeoTiffError::ShapeMismatch {
            width: grid.width,
            height: grid.height,
            got: data.len(),
        });
    }
    if grid.is_empty() {
        return Err(GeoTiffError::Unsupported("empty grid".to_string()));
    }

    let width = u32::try_from(grid.width).map_err(|_| too_large(grid))?;
    let height = u32::try_from(grid.height).map_err(|_| too_large(grid))?;

    let mut encoder = TiffEncoder::new(writer)?;
    match options.compression {
        Compression::Lzw => {
            write_image(&mut encoder, width, height, grid, data, options, Lzw::default())
        }
        Compression::Deflate => {
            write_image(&mut encoder, width, height, grid, data, options, Deflate::default())
        }
        Compression::None => {
            write_image(&mut encoder, width, height, grid, data, options, Uncompressed)
        }
    }
}

fn write_image<W: Write + Seek, D: TiffCompression>(
    encoder: &mut TiffEncoder<W>,
    width: u32,
    height: u32,
    grid: &GeoGrid,
    data: &[f32],
    options: &GeoTiffOptions,
    compression: D,
) -> GeoTiffResult<()> {
    let mut image =
        encoder.new_image_with_compression::<Gray32Float, D>(width, height, compression)?;

    let directory = image.encoder();
    directory.write_tag(tag(MODEL_PIXEL_SCALE), &grid.pixel_scale()[..])?;
    directory.write_tag(tag(MODEL_TIEPOINT), &grid.tiepoint()[..])?;
    directory.write_tag(tag(GEO_KEY_DIRECTORY), &options.crs.geo_key_directory()[..])?;
    directory.write_tag(tag(GDAL_NODATA), "nan")?;

    image.write_data(data)?;
    Ok(())
}

/// Write a grid to `path`.
///
/// The file is first written next to its destination with a `.partial`
/// suffix and renamed into place, so a reader never observes a truncated
/// raster under the final name. Returns the number of bytes written.
pub fn write_geotiff(
    path: &Path,
    grid: &GeoGrid,
    data: &[f32],
    options: &GeoTiffOptions,
) -> GeoTiffResult<u64> {
    let partial = partial_path(path);

    let result = write_then_rename(&partial, path, grid, data, options);
    match &result {
        Ok(bytes) => debug!(path = %path.display(), bytes, crs = %options.crs, "Wrote GeoTIFF"),
        Err(_) => {
            let _ = fs::remove_file(&partial);
        }
    }

    result
}

fn write_then_rename(
    partial: &Path,
    path: &Path,
    grid: &GeoGrid,
    data: &[f32],
    options: &GeoTiffOptions,
) -> GeoTiffResult<u64> {
    let file = File::create(partial)?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(&mut writer, grid, data, options)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    fs::rename(partial, path)?;
    Ok(fs::metadata(path)?.len())
}

/// Sibling path used while a raster is being written.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

pub(crate) fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn too_large(grid: &GeoGrid) -> GeoTiffError {
    GeoTiffError::TooLarge {
        width: grid.width,
        height: grid.height,
    }
}
