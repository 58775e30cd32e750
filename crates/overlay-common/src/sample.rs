//! Per-pixel raster samples.

use serde::Serialize;

/// The band values read at one pixel, or the absence of data.
///
/// A sample built from an empty band list is `NoData`. Individual bands may
/// still be NaN; [`RasterSample::band`] reports those as missing so that a
/// classifier never turns them into a color.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum RasterSample {
    #[default]
    NoData,
    Bands(Vec<f64>),
}

impl RasterSample {
    /// Build a sample from band values. No values means no data.
    pub fn from_bands(values: impl IntoIterator<Item = f64>) -> Self {
        let bands: Vec<f64> = values.into_iter().collect();
        if bands.is_empty() {
            RasterSample::NoData
        } else {
            RasterSample::Bands(bands)
        }
    }

    /// Single-band sample.
    pub fn single(value: f64) -> Self {
        RasterSample::Bands(vec![value])
    }

    /// Value of band `index`, or `None` when absent or NaN.
    pub fn band(&self, index: usize) -> Option<f64> {
        match self {
            RasterSample::NoData => None,
            RasterSample::Bands(values) => values.get(index).copied().filter(|v| !v.is_nan()),
        }
    }

    /// Raw band values (NaN included). Empty for `NoData`.
    pub fn bands(&self) -> &[f64] {
        match self {
            RasterSample::NoData => &[],
            RasterSample::Bands(values) => values,
        }
    }

    /// True when no band carries a usable value.
    pub fn is_no_data(&self) -> bool {
        self.bands().iter().all(|v| v.is_nan())
    }
}

impl From<f64> for RasterSample {
    fn from(value: f64) -> Self {
        RasterSample::single(value)
    }
}

impl From<Option<f64>> for RasterSample {
    fn from(value: Option<f64>) -> Self {
        value.map(RasterSample::single).unwrap_or_default()
    }
}
