//! Ordered-threshold classification of raster samples.
//!
//! A classifier is a table of ascending upper bounds, each carrying a color
//! and a legend label, closed by a terminal class that takes every value
//! above the last bound. The first bound the value does not exceed wins, so
//! a value sitting exactly on a bound belongs to that bound's (lower) class.
//!
//! The NDVI and rainfall-anomaly tables are presets of the same classifier;
//! custom tables can be loaded from YAML or JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::sample::RasterSample;

/// Errors raised while building or loading classifier tables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StyleError {
    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    #[error("Class bound must be finite, got {0}")]
    NonFiniteBound(f64),

    #[error("Class bounds must be strictly increasing ({previous} is followed by {next})")]
    UnorderedBounds { previous: f64, next: f64 },

    #[error("Unknown classifier preset: {0}")]
    UnknownPreset(String),
}

// ============================================================================
// Color
// ============================================================================

/// An RGBA color.
///
/// Deserializes from `"#rrggbb"`, `"#rrggbbaa"`, a named color, or an
/// `[r, g, b]` / `[r, g, b, a]` array. Serializes as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorSpec", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorSpec {
    Text(String),
    Array(Vec<u8>),
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Result<Self, StyleError> {
        let hex = s.trim().trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| StyleError::InvalidColor(s.to_string()))
        };

        match hex.len() {
            6 => Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(StyleError::InvalidColor(s.to_string())),
        }
    }

    /// Lowercase hex; the alpha pair is only written when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Scale alpha by a layer opacity in [0, 1].
    pub fn with_opacity(&self, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        Self {
            a: (self.a as f32 * opacity).round() as u8,
            ..*self
        }
    }

    pub fn to_rgba(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name.to_lowercase().as_str() {
        "transparent" => Color::transparent(),
        "black" => Color::rgb(0, 0, 0),
        "white" => Color::rgb(255, 255, 255),
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "darkgreen" | "dark-green" => Color::rgb(0, 77, 0),
        "blue" => Color::rgb(33, 102, 172),
        "yellow" => Color::rgb(255, 255, 0),
        "brown" => Color::rgb(140, 81, 10),
        "orange" => Color::rgb(255, 165, 0),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        _ => return None,
    };
    Some(color)
}

impl FromStr for Color {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim_start().starts_with('#') {
            return Color::from_hex(s);
        }
        named_color(s.trim()).map_or_else(|| Color::from_hex(s), Ok)
    }
}

impl TryFrom<ColorSpec> for Color {
    type Error = StyleError;

    fn try_from(spec: ColorSpec) -> Result<Self, Self::Error> {
        match spec {
            ColorSpec::Text(s) => s.parse(),
            ColorSpec::Array(arr) => match arr.as_slice() {
                [r, g, b] => Ok(Color::rgb(*r, *g, *b)),
                [r, g, b, a] => Ok(Color::new(*r, *g, *b, *a)),
                _ => Err(StyleError::InvalidColor(format!("{:?}", arr))),
            },
        }
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// One bounded class: values up to and including `upper` not claimed by an
/// earlier class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassBreak {
    pub upper: f64,
    pub color: Color,
    #[serde(default)]
    pub label: String,
}

impl ClassBreak {
    pub fn new(upper: f64, color: Color, label: impl Into<String>) -> Self {
        Self {
            upper,
            color,
            label: label.into(),
        }
    }
}

/// The catch-all class above the last bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalClass {
    pub color: Color,
    #[serde(default)]
    pub label: String,
}

impl TerminalClass {
    pub fn new(color: Color, label: impl Into<String>) -> Self {
        Self {
            color,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClassTable {
    #[serde(default)]
    breaks: Vec<ClassBreak>,
    terminal: TerminalClass,
}

/// Generic ordered-threshold classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClassTable", into = "ClassTable")]
pub struct ThresholdClassifier {
    breaks: Vec<ClassBreak>,
    terminal: TerminalClass,
}

impl ThresholdClassifier {
    /// Build a classifier, checking that bounds are finite and strictly
    /// increasing.
    pub fn new(breaks: Vec<ClassBreak>, terminal: TerminalClass) -> Result<Self, StyleError> {
        for class in &breaks {
            if !class.upper.is_finite() {
                return Err(StyleError::NonFiniteBound(class.upper));
            }
        }
        for pair in breaks.windows(2) {
            if pair[1].upper <= pair[0].upper {
                return Err(StyleError::UnorderedBounds {
                    previous: pair[0].upper,
                    next: pair[1].upper,
                });
            }
        }
        Ok(Self { breaks, terminal })
    }

    /// NDVI vegetation health: Low / Moderate / Healthy / Dense.
    pub fn ndvi() -> Self {
        Self {
            breaks: vec![
                ClassBreak::new(0.25, Color::rgb(0xff, 0xff, 0xff), "Low"),
                ClassBreak::new(0.5, Color::rgb(0xff, 0xff, 0x00), "Moderate"),
                ClassBreak::new(0.75, Color::rgb(0x00, 0x80, 0x00), "Healthy"),
            ],
            terminal: TerminalClass::new(Color::rgb(0x00, 0x4d, 0x00), "Dense"),
        }
    }

    /// Rainfall anomaly (mm) on a brown / white / blue scale.
    pub fn rainfall_anomaly() -> Self {
        Self {
            breaks: vec![
                ClassBreak::new(-50.0, Color::rgb(0x8c, 0x51, 0x0a), "Severe deficit"),
                ClassBreak::new(0.0, Color::rgb(0xff, 0xff, 0xff), "Below normal"),
            ],
            terminal: TerminalClass::new(Color::rgb(0x21, 0x66, 0xac), "Surplus"),
        }
    }

    /// Two-class rainfall anomaly split at zero.
    pub fn rainfall_anomaly_binary() -> Self {
        Self {
            breaks: vec![ClassBreak::new(
                0.0,
                Color::rgb(0x8c, 0x51, 0x0a),
                "Deficit",
            )],
            terminal: TerminalClass::new(Color::rgb(0x21, 0x66, 0xac), "Surplus"),
        }
    }

    /// Look up a built-in table by name.
    pub fn preset(name: &str) -> Result<Self, StyleError> {
        match name.to_lowercase().as_str() {
            "ndvi" => Ok(Self::ndvi()),
            "rainfall_anomaly" => Ok(Self::rainfall_anomaly()),
            "rainfall_anomaly_binary" => Ok(Self::rainfall_anomaly_binary()),
            _ => Err(StyleError::UnknownPreset(name.to_string())),
        }
    }

    /// Class index for a value; `None` for NaN.
    ///
    /// Ranks run from 0 (first break) to `class_count() - 1` (terminal).
    pub fn rank_value(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let rank = self
            .breaks
            .iter()
            .position(|class| value <= class.upper)
            .unwrap_or(self.breaks.len());
        Some(rank)
    }

    /// Class index for the first band of a sample.
    pub fn rank(&self, sample: &RasterSample) -> Option<usize> {
        sample.band(0).and_then(|v| self.rank_value(v))
    }

    /// Color for a value; `None` for NaN.
    pub fn classify_value(&self, value: f64) -> Option<Color> {
        self.rank_value(value).map(|rank| self.color_at(rank))
    }

    /// Color for the first band of a sample.
    pub fn classify(&self, sample: &RasterSample) -> Option<Color> {
        self.classify_band(sample, 0)
    }

    /// Color for a chosen band of a sample; `None` when that band is absent.
    pub fn classify_band(&self, sample: &RasterSample, band: usize) -> Option<Color> {
        sample.band(band).and_then(|v| self.classify_value(v))
    }

    /// Number of classes including the terminal one.
    pub fn class_count(&self) -> usize {
        self.breaks.len() + 1
    }

    /// `(label, color)` for every class in rank order.
    pub fn classes(&self) -> impl Iterator<Item = (&str, Color)> + '_ {
        self.breaks
            .iter()
            .map(|c| (c.label.as_str(), c.color))
            .chain(std::iter::once((
                self.terminal.label.as_str(),
                self.terminal.color,
            )))
    }

    /// Label of the class at `rank`.
    pub fn label_at(&self, rank: usize) -> &str {
        self.breaks
            .get(rank)
            .map(|c| c.label.as_str())
            .unwrap_or(self.terminal.label.as_str())
    }

    /// Class colors in rank order.
    pub fn palette(&self) -> Vec<Color> {
        self.classes().map(|(_, color)| color).collect()
    }

    pub fn breaks(&self) -> &[ClassBreak] {
        &self.breaks
    }

    pub fn terminal(&self) -> &TerminalClass {
        &self.terminal
    }

    fn color_at(&self, rank: usize) -> Color {
        self.breaks
            .get(rank)
            .map(|c| c.color)
            .unwrap_or(self.terminal.color)
    }
}

impl TryFrom<ClassTable> for ThresholdClassifier {
    type Error = StyleError;

    fn try_from(table: ClassTable) -> Result<Self, Self::Error> {
        ThresholdClassifier::new(table.breaks, table.terminal)
    }
}

impl From<ThresholdClassifier> for ClassTable {
    fn from(classifier: ThresholdClassifier) -> Self {
        ClassTable {
            breaks: classifier.breaks,
            terminal: classifier.terminal,
        }
    }
}
