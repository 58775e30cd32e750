//! Common types shared across the raster overlay crates.

pub mod bbox;
pub mod error;
pub mod layer;
pub mod legend;
pub mod sample;
pub mod style;

pub use bbox::BoundingBox;
pub use error::{OverlayError, OverlayResult};
pub use layer::{LayerId, LayerState};
pub use legend::{escape_html, Basemap, Legend, LegendEntry, MapView, TitleBanner};
pub use sample::RasterSample;
pub use style::{ClassBreak, Color, StyleError, TerminalClass, ThresholdClassifier};
