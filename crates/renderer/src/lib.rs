//! Overlay rendering for classified rasters.
//!
//! A decoded raster band is mapped through a [`ThresholdClassifier`] into
//! palette indices (one per class plus transparent no-data) and written as
//! an indexed PNG the map widget can stretch over the raster bounds.
//!
//! [`ThresholdClassifier`]: overlay_common::ThresholdClassifier

pub mod classify;
pub mod error;
pub mod png;

pub use classify::{classify_raster, overlay_palette, render_overlay, ClassifiedImage};
pub use error::{RenderError, RenderResult};
