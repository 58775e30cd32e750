//! Tests for legends and HTML fragments, through the crate-root exports.

use overlay_common::{escape_html, Legend, ThresholdClassifier};

#[test]
fn test_escape_html() {
    assert_eq!(escape_html("Rain < 0 & \"dry\""), "Rain &lt; 0 &amp; &quot;dry&quot;");
    assert_eq!(escape_html("Ado-Odo/Ota"), "Ado-Odo/Ota");
}

#[test]
fn test_legend_html_escapes_title() {
    let legend = Legend::from_classifier("<NDVI>", &ThresholdClassifier::ndvi());
    let html = legend.to_html();
    assert!(html.contains("&lt;NDVI&gt;"));
    assert!(!html.contains("<NDVI>"));
    assert_eq!(legend.entries.len(), 4);
}
