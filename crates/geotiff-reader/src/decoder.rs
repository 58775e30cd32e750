//! GeoTIFF bytes to [`DecodedRaster`].

use std::io::{Cursor, Read, Seek};

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::{debug, warn};

use crate::error::{DecodeError, DecodeResult};
use crate::raster::DecodedRaster;
use crate::tags;
use crate::transform::GeoTransform;

/// Decode an in-memory GeoTIFF.
///
/// Reads the first image of the file. Georeferencing comes from
/// `ModelTiepoint` + `ModelPixelScale`, falling back to
/// `ModelTransformation`; a file with neither is rejected. The GDAL no-data
/// tag is honored when present.
pub fn decode(bytes: &[u8]) -> DecodeResult<DecodedRaster> {
    let mut decoder = Decoder::new(Cursor::new(bytes))?;

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyRaster { width, height });
    }

    let transform = read_transform(&mut decoder)?;
    let nodata = read_nodata(&mut decoder)?;

    let values = to_f32(decoder.read_image()?)?;
    if values.len() % (width * height) != 0 {
        return Err(DecodeError::SampleCountMismatch {
            samples: values.len(),
            width,
            height,
        });
    }

    let raster = DecodedRaster::new(width, height, values, transform, nodata)?;
    debug!(
        width,
        height,
        bands = raster.band_count(),
        nodata = ?nodata,
        "Decoded GeoTIFF"
    );
    Ok(raster)
}

fn find_f64_vec<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    code: u16,
) -> DecodeResult<Option<Vec<f64>>> {
    let value = decoder.find_tag(Tag::from_u16_exhaustive(code))?;
    Ok(value.map(|v| v.into_f64_vec()).transpose()?)
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> DecodeResult<GeoTransform> {
    let tiepoint = find_f64_vec(decoder, tags::MODEL_TIEPOINT)?;
    let scale = find_f64_vec(decoder, tags::MODEL_PIXEL_SCALE)?;

    if let (Some(tiepoint), Some(scale)) = (tiepoint, scale) {
        return GeoTransform::from_tiepoint_and_scale(&tiepoint, &scale);
    }

    match find_f64_vec(decoder, tags::MODEL_TRANSFORMATION)? {
        Some(matrix) => GeoTransform::from_model_transformation(&matrix),
        None => Err(DecodeError::MissingGeoreference),
    }
}

/// GDAL stores no-data as an ASCII number.
fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> DecodeResult<Option<f64>> {
    let Some(value) = decoder.find_tag(Tag::from_u16_exhaustive(tags::GDAL_NODATA))? else {
        return Ok(None);
    };

    let text = value.into_string()?;
    let trimmed = text.trim_matches(char::from(0)).trim();
    match trimmed.parse::<f64>() {
        Ok(nodata) => Ok(Some(nodata)),
        Err(_) => {
            warn!(value = %trimmed, "Ignoring unparseable GDAL_NODATA tag");
            Ok(None)
        }
    }
}

#[allow(unreachable_patterns)]
fn to_f32(result: DecodingResult) -> DecodeResult<Vec<f32>> {
    let values = match result {
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        _ => return Err(DecodeError::UnsupportedSampleFormat),
    };
    Ok(values)
}
