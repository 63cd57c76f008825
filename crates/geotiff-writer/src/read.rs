//! Reading back rasters written by this crate.
//!
//! Only the single-band f32 layout produced by [`crate::write_geotiff`] is
//! supported; anything else is reported as [`GeoTiffError::Unsupported`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use crate::encode::{tag, GEO_KEY_DIRECTORY, MODEL_PIXEL_SCALE, MODEL_TIEPOINT};
use crate::error::{GeoTiffError, GeoTiffResult};

/// A decoded single-band raster with its georeferencing tags.
#[derive(Debug, Clone)]
pub struct GeoTiffRaster {
    pub width: usize,
    pub height: usize,
    /// Row-major, north-up values
    pub data: Vec<f32>,
    /// ModelPixelScaleTag
    pub pixel_scale: Vec<f64>,
    /// ModelTiepointTag
    pub tiepoint: Vec<f64>,
    /// GeoKeyDirectoryTag
    pub geo_keys: Vec<u16>,
    /// TIFF Compression tag value (1 = none, 5 = LZW, 8 = Deflate)
    pub compression: u16,
}

impl GeoTiffRaster {
    pub fn read(path: &Path) -> GeoTiffResult<Self> {
        let file = File::open(path)?;
        let mut decoder = Decoder::new(BufReader::new(file))?;

        let (width, height) = decoder.dimensions()?;
        let compression = decoder.get_tag_u32(Tag::Compression)? as u16;
        let pixel_scale = decoder.get_tag_f64_vec(tag(MODEL_PIXEL_SCALE))?;
        let tiepoint = decoder.get_tag_f64_vec(tag(MODEL_TIEPOINT))?;
        let geo_keys = decoder
            .get_tag_u32_vec(tag(GEO_KEY_DIRECTORY))?
            .into_iter()
            .map(|v| v as u16)
            .collect();

        let data = match decoder.read_image()? {
            DecodingResult::F32(data) => data,
            _ => {
                return Err(GeoTiffError::Unsupported(format!(
                    "{} is not a 32-bit float raster",
                    path.display()
                )))
            }
        };

        Ok(Self {
            width: width as usize,
            height: height as usize,
            data,
            pixel_scale,
            tiepoint,
            geo_keys,
            compression,
        })
    }

    /// EPSG code from the GeographicTypeGeoKey, if present.
    pub fn geographic_epsg(&self) -> Option<u16> {
        self.geo_keys
            .get(4..)?
            .chunks(4)
            .find(|key| key.first() == Some(&2048))
            .and_then(|key| key.get(3).copied())
    }
}
