//! Indexed PNG encoding (color type 3).
//!
//! Classified overlays never have more colors than classes plus one
//! transparent no-data entry, so they always fit a palette and are written
//! as PNG8: one byte per pixel, a `PLTE` chunk and a `tRNS` chunk carrying
//! per-entry alpha.

use std::io::Write;

use crate::error::{RenderError, RenderResult};

/// PNG8 palette limit.
pub const MAX_PALETTE_SIZE: usize = 256;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Encode palette indices as an indexed PNG.
///
/// `palette` entries are RGBA; `indices` are row-major, one per pixel, and
/// must all address an existing palette entry.
pub fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[[u8; 4]],
    indices: &[u8],
) -> RenderResult<Vec<u8>> {
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(RenderError::PaletteSize(palette.len()));
    }
    if indices.len() != width * height {
        return Err(RenderError::DimensionMismatch {
            expected: width * height,
            actual: indices.len(),
        });
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= palette.len()) {
        return Err(RenderError::IndexOutOfPalette {
            index: bad,
            palette: palette.len(),
        });
    }

    let mut png = Vec::with_capacity(64 + palette.len() * 4 + indices.len() / 4);
    png.extend_from_slice(&SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr.extend_from_slice(&[
        8, // bit depth
        3, // color type: indexed
        0, // compression
        0, // filter
        0, // interlace
    ]);
    write_chunk(&mut png, b"IHDR", &ihdr);

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    // tRNS may be shorter than the palette; trailing opaque entries are implied.
    if let Some(last_translucent) = palette.iter().rposition(|c| c[3] < 255) {
        let trns: Vec<u8> = palette[..=last_translucent].iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_chunk(&mut png, b"IDAT", &deflate_scanlines(indices, width, height)?);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn deflate_scanlines(indices: &[u8], width: usize, height: usize) -> RenderResult<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (width + 1));
    for row in indices.chunks_exact(width.max(1)).take(height) {
        raw.push(0); // filter: none
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

fn write_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(kind);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_and_ihdr() {
        let png = encode_indexed(3, 2, &[[0, 0, 0, 0], [255, 255, 255, 255]], &[0, 1, 1, 0, 1, 0])
            .unwrap();
        assert_eq!(&png[0..8], &SIGNATURE);
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 3);
        assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 2);
        assert_eq!(png[24], 8);
        assert_eq!(png[25], 3);
    }

    #[test]
    fn test_chunk_crc_covers_type_and_data() {
        let mut out = Vec::new();
        write_chunk(&mut out, b"IEND", &[]);
        assert_eq!(out.len(), 12);
        assert_eq!(&out[8..12], &crc32fast::hash(b"IEND").to_be_bytes());
    }

    #[test]
    fn test_rejects_out_of_palette_index() {
        let err = encode_indexed(1, 1, &[[0, 0, 0, 255]], &[3]).unwrap_err();
        assert!(matches!(err, RenderError::IndexOutOfPalette { index: 3, .. }));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = encode_indexed(2, 2, &[[0, 0, 0, 255]], &[0, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            RenderError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_rejects_empty_palette() {
        assert!(matches!(
            encode_indexed(1, 1, &[], &[0]).unwrap_err(),
            RenderError::PaletteSize(0)
        ));
    }
}
