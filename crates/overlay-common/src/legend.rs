//! Legend, title banner and initial map view.
//!
//! Legends are derived from the classifier table so labels and swatches
//! always match what the renderer draws.

use serde::{Deserialize, Serialize};

use crate::style::{Color, ThresholdClassifier};

/// One legend swatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

/// A static list of class labels and colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    pub fn from_classifier(title: impl Into<String>, classifier: &ThresholdClassifier) -> Self {
        let entries = classifier
            .classes()
            .map(|(label, color)| LegendEntry {
                label: label.to_string(),
                color,
            })
            .collect();

        Self {
            title: title.into(),
            entries,
        }
    }

    /// HTML fragment for a bottom-right legend control.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"info legend\">\n");
        html.push_str(&format!("  <strong>{}</strong><br/>\n", escape_html(&self.title)));
        for entry in &self.entries {
            html.push_str(&format!(
                "  <i style=\"background:{}; width:18px; height:18px; float:left; margin-right:8px; opacity:0.9;\"></i>{}<br/>\n",
                entry.color,
                escape_html(&entry.label)
            ));
        }
        html.push_str("</div>");
        html
    }
}

/// Static title and credit text shown top-right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleBanner {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub credit: Option<String>,
}

impl Default for TitleBanner {
    fn default() -> Self {
        Self {
            title: "Food Security Analysis".to_string(),
            subtitle: Some("Ado-Odo/Ota — Low Risk (October 2025)".to_string()),
            credit: Some("Map by Emmanuel Irekponor, 2025".to_string()),
        }
    }
}

impl TitleBanner {
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"map-title\">\n");
        html.push_str(&format!(
            "  <h3 style=\"margin:0; font-weight:600;\">{}</h3>\n",
            escape_html(&self.title)
        ));
        if let Some(subtitle) = &self.subtitle {
            html.push_str(&format!("  <h4>{}</h4>\n", escape_html(subtitle)));
        }
        if let Some(credit) = &self.credit {
            html.push_str(&format!("  {}\n", escape_html(credit)));
        }
        html.push_str("</div>");
        html
    }
}

/// Basemap tile source drawn under the overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basemap {
    pub url_template: String,
    pub attribution: String,
}

impl Default for Basemap {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
        }
    }
}

/// Initial view before any layer bounds are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    /// `[lat, lng]`
    pub center: [f64; 2],
    pub zoom: u8,
    #[serde(default)]
    pub basemap: Basemap,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: [6.7, 3.0],
            zoom: 11,
            basemap: Basemap::default(),
        }
    }
}

/// Minimal escaping for text placed inside HTML fragments.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
