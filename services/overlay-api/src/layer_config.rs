//! Map configuration loader.
//!
//! A map is described by one YAML file: the initial view, the title banner
//! and the list of raster layers with their source, band, opacity and
//! classifier. Without a file the built-in configuration is used, which
//! reproduces the Ado-Odo/Ota food security map (NDVI primary, rainfall
//! anomaly registered hidden).

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use overlay_common::{
    LayerId, MapView, OverlayError, OverlayResult, ThresholdClassifier, TitleBanner,
};
use serde::Deserialize;
use tracing::{info, warn};

/// Where a layer's GeoTIFF bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterSource {
    /// Fetched over HTTP(S).
    Url(String),
    /// Read from disk, relative paths resolved against the data directory.
    Path(PathBuf),
}

impl RasterSource {
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Url(source.to_string())
        } else {
            Self::Path(PathBuf::from(source))
        }
    }
}

impl fmt::Display for RasterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Immutable description of one overlay layer.
#[derive(Debug, Clone)]
pub struct LayerDescriptor {
    pub id: LayerId,
    pub title: String,
    pub source: RasterSource,
    /// Band fed to the classifier and inspected first.
    pub band: usize,
    pub opacity: f32,
    /// The primary layer becomes the inspected raster and sets the viewport.
    pub primary: bool,
    pub visible_by_default: bool,
    pub classifier: ThresholdClassifier,
    pub legend_title: String,
}

impl LayerDescriptor {
    /// NDVI layer as shipped: shown on load, fits the map to its bounds.
    pub fn ndvi() -> Self {
        Self {
            id: LayerId::new("ndvi"),
            title: "NDVI (September 2025)".to_string(),
            source: RasterSource::parse("Geodata/NDVI_AdoOdoOta_Sep2025.tif"),
            band: 0,
            opacity: 1.0,
            primary: true,
            visible_by_default: true,
            classifier: ThresholdClassifier::ndvi(),
            legend_title: "NDVI Classes".to_string(),
        }
    }

    /// Rainfall anomaly layer as shipped: registered hidden.
    pub fn rainfall_anomaly() -> Self {
        Self {
            id: LayerId::new("rainfall_anomaly"),
            title: "Rainfall Anomaly (September 2025)".to_string(),
            source: RasterSource::parse("Geodata/RainfallAnomaly_AdoOdoOta_Sep2025.tif"),
            band: 0,
            opacity: 0.8,
            primary: false,
            visible_by_default: false,
            classifier: ThresholdClassifier::rainfall_anomaly(),
            legend_title: "Rainfall Anomaly (mm)".to_string(),
        }
    }
}

/// Complete map configuration.
#[derive(Debug, Clone)]
pub struct MapConfig {
    pub view: MapView,
    pub title: TitleBanner,
    pub layers: Vec<LayerDescriptor>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            view: MapView::default(),
            title: TitleBanner::default(),
            layers: vec![LayerDescriptor::ndvi(), LayerDescriptor::rainfall_anomaly()],
        }
    }
}

// ============================================================================
// YAML Parsing Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct YamlMapFile {
    #[serde(default)]
    view: Option<MapView>,
    #[serde(default)]
    title: Option<TitleBanner>,
    layers: Vec<YamlLayer>,
}

#[derive(Debug, Deserialize)]
struct YamlLayer {
    id: String,
    title: Option<String>,
    source: String,
    #[serde(default)]
    band: usize,
    #[serde(default = "default_opacity")]
    opacity: f32,
    #[serde(default)]
    primary: bool,
    /// Defaults to `primary`.
    visible: Option<bool>,
    style: YamlStyle,
    legend_title: Option<String>,
}

/// Either a preset name or an inline table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YamlStyle {
    Preset(String),
    Table(ThresholdClassifier),
}

fn default_opacity() -> f32 {
    1.0
}

impl MapConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(contents: &str) -> OverlayResult<Self> {
        let yaml: YamlMapFile = serde_yaml::from_str(contents)
            .map_err(|e| OverlayError::Config(format!("YAML parse error: {}", e)))?;

        let layers = yaml
            .layers
            .into_iter()
            .map(|l| {
                let classifier = match l.style {
                    YamlStyle::Preset(name) => ThresholdClassifier::preset(&name)?,
                    YamlStyle::Table(table) => table,
                };
                Ok(LayerDescriptor {
                    title: l.title.unwrap_or_else(|| l.id.clone()),
                    legend_title: l.legend_title.unwrap_or_else(|| l.id.clone()),
                    id: LayerId::new(l.id),
                    source: RasterSource::parse(&l.source),
                    band: l.band,
                    opacity: l.opacity,
                    visible_by_default: l.visible.unwrap_or(l.primary),
                    primary: l.primary,
                    classifier,
                })
            })
            .collect::<OverlayResult<Vec<_>>>()?;

        let config = Self {
            view: yaml.view.unwrap_or_default(),
            title: yaml.title.unwrap_or_default(),
            layers,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> OverlayResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            OverlayError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml_str(&contents)?;
        info!(
            path = %path.display(),
            layers = config.layers.len(),
            "Loaded map config"
        );
        Ok(config)
    }

    /// Load `path` when given, otherwise the built-in map.
    pub fn load_or_default(path: Option<&Path>) -> OverlayResult<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                info!("No map config given, using built-in layers");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> OverlayResult<()> {
        if self.layers.is_empty() {
            return Err(OverlayError::Config("no layers configured".to_string()));
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            if layer.id.as_str().is_empty() {
                return Err(OverlayError::Config("layer id must not be empty".to_string()));
            }
            if !seen.insert(layer.id.as_str()) {
                return Err(OverlayError::Config(format!(
                    "duplicate layer id '{}'",
                    layer.id
                )));
            }
            if !(0.0..=1.0).contains(&layer.opacity) {
                return Err(OverlayError::Config(format!(
                    "layer '{}' opacity {} outside [0, 1]",
                    layer.id, layer.opacity
                )));
            }
        }

        let primaries = self.layers.iter().filter(|l| l.primary).count();
        if primaries > 1 {
            return Err(OverlayError::Config(format!(
                "{} layers marked primary, at most one allowed",
                primaries
            )));
        }
        if primaries == 0 {
            warn!("No primary layer configured; the first layer to load becomes the inspected one");
        }
        Ok(())
    }

    pub fn layer(&self, id: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.id.as_str() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
view:
  center: [6.7, 3.0]
  zoom: 10
title:
  title: Drought Watch
layers:
  - id: ndvi
    source: Geodata/ndvi.tif
    primary: true
    style: ndvi
    legend_title: NDVI Classes
  - id: rain
    source: https://example.org/rain.tif
    opacity: 0.6
    style:
      breaks:
        - { upper: 0, color: "#8c510a", label: Deficit }
      terminal: { color: "#2166ac", label: Surplus }
"##;

    #[test]
    fn test_default_matches_district_map() {
        let config = MapConfig::default();
        assert_eq!(config.layers.len(), 2);
        assert!(config.layers[0].primary);
        assert!(config.layers[0].visible_by_default);
        assert!(!config.layers[1].visible_by_default);
        assert_eq!(config.view.zoom, 11);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let config = MapConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.view.zoom, 10);
        assert_eq!(config.title.title, "Drought Watch");

        let ndvi = config.layer("ndvi").unwrap();
        assert!(ndvi.visible_by_default);
        assert_eq!(ndvi.opacity, 1.0);
        assert_eq!(ndvi.classifier.class_count(), 4);
        assert_eq!(ndvi.source, RasterSource::Path(PathBuf::from("Geodata/ndvi.tif")));

        let rain = config.layer("rain").unwrap();
        assert!(!rain.visible_by_default);
        assert_eq!(rain.classifier.class_count(), 2);
        assert_eq!(rain.legend_title, "rain");
        assert!(matches!(rain.source, RasterSource::Url(_)));
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let yaml = "layers:\n  - id: a\n    source: a.tif\n    style: sparkles\n";
        let err = MapConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, OverlayError::Style(_)));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let yaml = "layers:\n  - { id: a, source: a.tif, style: ndvi }\n  - { id: a, source: b.tif, style: ndvi }\n";
        assert!(matches!(
            MapConfig::from_yaml_str(yaml),
            Err(OverlayError::Config(_))
        ));
    }

    #[test]
    fn test_two_primaries_rejected() {
        let yaml = "layers:\n  - { id: a, source: a.tif, style: ndvi, primary: true }\n  - { id: b, source: b.tif, style: ndvi, primary: true }\n";
        assert!(MapConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_opacity_out_of_range_rejected() {
        let yaml = "layers:\n  - { id: a, source: a.tif, style: ndvi, opacity: 1.5 }\n";
        assert!(MapConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = MapConfig::load_from_file("/nonexistent/map.yaml").unwrap_err();
        assert!(matches!(err, OverlayError::Config(_)));
    }

    #[test]
    fn test_shipped_config_matches_built_in() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/map.yaml");
        let config = MapConfig::load_from_file(path).unwrap();
        let built_in = MapConfig::default();

        assert_eq!(config.view, built_in.view);
        for (loaded, expected) in config.layers.iter().zip(&built_in.layers) {
            assert_eq!(loaded.id, expected.id);
            assert_eq!(loaded.source, expected.source);
            assert_eq!(loaded.primary, expected.primary);
            assert_eq!(loaded.visible_by_default, expected.visible_by_default);
            assert_eq!(loaded.opacity, expected.opacity);
            assert_eq!(loaded.classifier, expected.classifier);
            assert_eq!(loaded.legend_title, expected.legend_title);
        }
    }

    #[test]
    fn test_raster_source_parse() {
        assert_eq!(
            RasterSource::parse("https://host/x.tif"),
            RasterSource::Url("https://host/x.tif".to_string())
        );
        assert_eq!(
            RasterSource::parse("Geodata/x.tif").to_string(),
            "Geodata/x.tif"
        );
    }
}
