//! In-memory GeoTIFF writer for decoder and service tests.
//!
//! Produces small float GeoTIFFs with the same tags real NDVI / rainfall
//! exports carry: `ModelPixelScale` + `ModelTiepoint` (or a
//! `ModelTransformation` matrix), a minimal GeoKey directory and optionally
//! `GDAL_NODATA`.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use tiff::encoder::colortype::{Gray32Float, RGB32Float};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tiff::{TiffError, TiffResult};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// How the fixture is georeferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Georeference {
    TiepointAndScale,
    ModelTransformation,
    /// Plain TIFF, no geo tags at all.
    None,
}

/// Builder for a float GeoTIFF.
///
/// ```
/// use test_utils::GeoTiffFixture;
///
/// let bytes = GeoTiffFixture::new(2, 2, vec![0.1, 0.2, 0.3, 0.4])
///     .origin(3.0, 7.0)
///     .pixel_size(0.5, 0.5)
///     .encode()
///     .unwrap();
/// assert_eq!(&bytes[0..2], b"II");
/// ```
#[derive(Debug, Clone)]
pub struct GeoTiffFixture {
    width: u32,
    height: u32,
    bands: usize,
    values: Vec<f32>,
    origin: (f64, f64),
    pixel_size: (f64, f64),
    nodata: Option<String>,
    georeference: Georeference,
}

impl GeoTiffFixture {
    /// Single-band fixture, values row-major from the top-left pixel.
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> Self {
        Self {
            width,
            height,
            bands: 1,
            values,
            origin: (0.0, 0.0),
            pixel_size: (1.0, 1.0),
            nodata: None,
            georeference: Georeference::TiepointAndScale,
        }
    }

    /// Three-band fixture, values pixel-interleaved.
    pub fn three_band(width: u32, height: u32, values: Vec<f32>) -> Self {
        Self {
            bands: 3,
            ..Self::new(width, height, values)
        }
    }

    /// Top-left corner `(lng, lat)`.
    pub fn origin(mut self, lng: f64, lat: f64) -> Self {
        self.origin = (lng, lat);
        self
    }

    /// Pixel size in degrees, both positive.
    pub fn pixel_size(mut self, x: f64, y: f64) -> Self {
        self.pixel_size = (x, y);
        self
    }

    pub fn nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata.to_string());
        self
    }

    /// Raw `GDAL_NODATA` text, for exercising odd encodings.
    pub fn nodata_text(mut self, text: &str) -> Self {
        self.nodata = Some(text.to_string());
        self
    }

    pub fn georeference(mut self, georeference: Georeference) -> Self {
        self.georeference = georeference;
        self
    }

    /// Encode to little-endian TIFF bytes.
    pub fn encode(&self) -> TiffResult<Vec<u8>> {
        let expected = self.width as usize * self.height as usize * self.bands;
        if self.values.len() != expected {
            return Err(TiffError::LimitsExceeded);
        }

        let mut buf = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buf))?;
            match self.bands {
                3 => {
                    let mut image = encoder.new_image::<RGB32Float>(self.width, self.height)?;
                    self.write_geo_tags(image.encoder())?;
                    image.write_data(&self.values)?;
                }
                _ => {
                    let mut image = encoder.new_image::<Gray32Float>(self.width, self.height)?;
                    self.write_geo_tags(image.encoder())?;
                    image.write_data(&self.values)?;
                }
            }
        }
        Ok(buf)
    }

    /// Encode and write to `dir/name`.
    pub fn write_to(&self, dir: &Path, name: &str) -> std::io::Result<PathBuf> {
        let bytes = self
            .encode()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        let path = dir.join(name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    fn write_geo_tags<W: std::io::Write + std::io::Seek, K: tiff::encoder::TiffKind>(
        &self,
        dir: &mut tiff::encoder::DirectoryEncoder<'_, W, K>,
    ) -> TiffResult<()> {
        let (x, y) = self.origin;
        let (sx, sy) = self.pixel_size;

        match self.georeference {
            Georeference::TiepointAndScale => {
                dir.write_tag(
                    Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE),
                    &[sx, sy, 0.0][..],
                )?;
                dir.write_tag(
                    Tag::from_u16_exhaustive(MODEL_TIEPOINT),
                    &[0.0, 0.0, 0.0, x, y, 0.0][..],
                )?;
            }
            Georeference::ModelTransformation => {
                let matrix = [
                    sx, 0.0, 0.0, x, //
                    0.0, -sy, 0.0, y, //
                    0.0, 0.0, 0.0, 0.0, //
                    0.0, 0.0, 0.0, 1.0,
                ];
                dir.write_tag(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION), &matrix[..])?;
            }
            Georeference::None => return self.write_nodata(dir),
        }

        // GTModelType = geographic, GTRasterType = pixel-is-area, GeographicType = WGS84.
        let geokeys: [u16; 16] = [
            1, 1, 0, 3, //
            1024, 0, 1, 2, //
            1025, 0, 1, 1, //
            2048, 0, 1, 4326,
        ];
        dir.write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY), &geokeys[..])?;

        self.write_nodata(dir)
    }

    fn write_nodata<W: std::io::Write + std::io::Seek, K: tiff::encoder::TiffKind>(
        &self,
        dir: &mut tiff::encoder::DirectoryEncoder<'_, W, K>,
    ) -> TiffResult<()> {
        if let Some(nodata) = &self.nodata {
            dir.write_tag(Tag::from_u16_exhaustive(GDAL_NODATA), nodata.as_str())?;
        }
        Ok(())
    }
}
