//! Rendering district fixtures end to end: GeoTIFF bytes to PNG overlay.

use std::io::Read;

use geotiff_reader::decode;
use overlay_common::ThresholdClassifier;
use renderer::{classify_raster, render_overlay};
use test_utils::{ndvi_geotiff, rainfall_geotiff, FIXTURE_HEIGHT, FIXTURE_WIDTH};

// ============================================================================
// Helper functions
// ============================================================================

/// Split a PNG into `(type, data)` chunks after the signature.
fn chunks(png: &[u8]) -> Vec<([u8; 4], Vec<u8>)> {
    let mut out = Vec::new();
    let mut pos = 8;
    while pos + 12 <= png.len() {
        let len = u32::from_be_bytes([png[pos], png[pos + 1], png[pos + 2], png[pos + 3]]) as usize;
        let kind = [png[pos + 4], png[pos + 5], png[pos + 6], png[pos + 7]];
        let data = png[pos + 8..pos + 8 + len].to_vec();
        let crc = u32::from_be_bytes([
            png[pos + 8 + len],
            png[pos + 9 + len],
            png[pos + 10 + len],
            png[pos + 11 + len],
        ]);
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&kind);
        hasher.update(&data);
        assert_eq!(hasher.finalize(), crc, "bad CRC on {:?}", kind);
        out.push((kind, data));
        pos += 12 + len;
    }
    out
}

fn find<'a>(chunks: &'a [([u8; 4], Vec<u8>)], kind: &[u8; 4]) -> Option<&'a Vec<u8>> {
    chunks.iter().find(|(k, _)| k == kind).map(|(_, d)| d)
}

// ============================================================================
// PNG structure
// ============================================================================

#[test]
fn test_ndvi_overlay_structure() {
    let raster = decode(&ndvi_geotiff()).unwrap();
    let png = render_overlay(&raster, &ThresholdClassifier::ndvi(), 0, 0.8).unwrap();
    let chunks = chunks(&png);

    let kinds: Vec<&[u8; 4]> = chunks.iter().map(|(k, _)| k).collect();
    assert_eq!(kinds, vec![b"IHDR", b"PLTE", b"tRNS", b"IDAT", b"IEND"]);

    // Four NDVI classes plus no-data.
    assert_eq!(find(&chunks, b"PLTE").unwrap().len(), 5 * 3);
    let trns = find(&chunks, b"tRNS").unwrap();
    assert_eq!(trns.len(), 5);
    assert_eq!(trns[4], 0);
    assert_eq!(trns[0], 204);
}

#[test]
fn test_idat_inflates_to_scanlines() {
    let raster = decode(&ndvi_geotiff()).unwrap();
    let png = render_overlay(&raster, &ThresholdClassifier::ndvi(), 0, 1.0).unwrap();
    let chunks = chunks(&png);
    let idat = find(&chunks, b"IDAT").unwrap();

    let mut raw = Vec::new();
    flate2::read::ZlibDecoder::new(&idat[..])
        .read_to_end(&mut raw)
        .unwrap();
    let (w, h) = (FIXTURE_WIDTH as usize, FIXTURE_HEIGHT as usize);
    assert_eq!(raw.len(), h * (w + 1));
    assert!(raw.chunks(w + 1).all(|line| line[0] == 0));
}

#[test]
fn test_full_opacity_keeps_class_alpha() {
    let raster = decode(&ndvi_geotiff()).unwrap();
    let png = render_overlay(&raster, &ThresholdClassifier::ndvi(), 0, 1.0).unwrap();
    let chunks = chunks(&png);
    // No-data is still transparent so tRNS runs up to it.
    let trns = find(&chunks, b"tRNS").unwrap();
    assert_eq!(&trns[..4], &[255, 255, 255, 255]);
    assert_eq!(trns[4], 0);
}

// ============================================================================
// Classification of fixtures
// ============================================================================

#[test]
fn test_ndvi_fixture_uses_every_class() {
    let raster = decode(&ndvi_geotiff()).unwrap();
    let image = classify_raster(&raster, &ThresholdClassifier::ndvi(), 0, 1.0).unwrap();
    let histogram = image.histogram();
    assert_eq!(histogram.len(), 5);
    assert!(histogram.iter().all(|&n| n > 0), "{:?}", histogram);

    // The no-data border ring.
    let (w, h) = (FIXTURE_WIDTH as usize, FIXTURE_HEIGHT as usize);
    assert_eq!(histogram[4], 2 * w + 2 * (h - 2));
}

#[test]
fn test_ndvi_columns_are_monotonic() {
    let raster = decode(&ndvi_geotiff()).unwrap();
    let image = classify_raster(&raster, &ThresholdClassifier::ndvi(), 0, 1.0).unwrap();
    let w = image.width;
    let row = &image.indices[5 * w + 1..5 * w + w - 1];
    assert!(row.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_rainfall_fixture_classes_by_row() {
    let raster = decode(&rainfall_geotiff()).unwrap();
    let image = classify_raster(&raster, &ThresholdClassifier::rainfall_anomaly(), 0, 1.0).unwrap();
    let w = image.width;
    // Top interior row is a severe deficit, bottom interior row a surplus.
    assert_eq!(image.indices[w + 5], 0);
    assert_eq!(image.indices[(image.height - 2) * w + 5], 2);
}
