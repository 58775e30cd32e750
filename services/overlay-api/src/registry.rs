//! Layer registry: layer id to load state, visibility and decoded raster.
//!
//! Entries are independent. A layer that never finishes loading, or fails,
//! has no effect on the others; readers treat anything not `Ready` as "not
//! yet available".

use std::sync::Arc;

use chrono::{DateTime, Utc};
use geotiff_reader::DecodedRaster;
use overlay_common::{LayerId, LayerState, OverlayError, OverlayResult};

use crate::layer_config::LayerDescriptor;

/// One registered layer.
#[derive(Debug, Clone)]
pub struct LayerEntry {
    pub descriptor: LayerDescriptor,
    pub state: LayerState,
    pub visible: bool,
    /// Present exactly when `state` is `Ready`.
    pub raster: Option<Arc<DecodedRaster>>,
    pub updated_at: DateTime<Utc>,
}

impl LayerEntry {
    fn new(descriptor: LayerDescriptor) -> Self {
        Self {
            descriptor,
            state: LayerState::Unloaded,
            visible: false,
            raster: None,
            updated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &LayerId {
        &self.descriptor.id
    }

    /// The decoded raster, only for `Ready` layers.
    pub fn ready_raster(&self) -> Option<&Arc<DecodedRaster>> {
        if self.state.is_ready() {
            self.raster.as_ref()
        } else {
            None
        }
    }
}

/// Ordered collection of layer entries, in registration order.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    entries: Vec<LayerEntry>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layer as `Unloaded` and hidden.
    pub fn register(&mut self, descriptor: LayerDescriptor) -> OverlayResult<()> {
        if self.get(descriptor.id.as_str()).is_some() {
            return Err(OverlayError::Config(format!(
                "layer '{}' is already registered",
                descriptor.id
            )));
        }
        self.entries.push(LayerEntry::new(descriptor));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&LayerEntry> {
        self.entries.iter().find(|e| e.id().as_str() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut LayerEntry> {
        self.entries.iter_mut().find(|e| e.id().as_str() == id)
    }

    /// Like [`get`](Self::get) but with a `LayerNotFound` error.
    pub fn require(&self, id: &str) -> OverlayResult<&LayerEntry> {
        self.get(id)
            .ok_or_else(|| OverlayError::LayerNotFound(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerEntry> {
        self.entries.iter()
    }

    pub fn ready(&self) -> impl Iterator<Item = &LayerEntry> {
        self.entries.iter().filter(|e| e.state.is_ready())
    }

    pub fn ids(&self) -> Vec<LayerId> {
        self.entries.iter().map(|e| e.id().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move a layer to `next`, rejecting illegal transitions.
    ///
    /// The raster is attached on `Ready` and dropped otherwise.
    pub fn transition(
        &mut self,
        id: &str,
        next: LayerState,
        raster: Option<Arc<DecodedRaster>>,
    ) -> OverlayResult<&mut LayerEntry> {
        let entry = self
            .get_mut(id)
            .ok_or_else(|| OverlayError::LayerNotFound(id.to_string()))?;

        if !entry.state.can_transition_to(&next) {
            return Err(OverlayError::InvalidTransition {
                layer: id.to_string(),
                from: entry.state.name().to_string(),
                to: next.name().to_string(),
            });
        }

        entry.raster = if next.is_ready() { raster } else { None };
        entry.state = next;
        entry.updated_at = Utc::now();
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotiff_reader::GeoTransform;

    fn raster() -> Arc<DecodedRaster> {
        Arc::new(
            DecodedRaster::new(1, 1, vec![0.5], GeoTransform::north_up(0.0, 1.0, 1.0, 1.0), None)
                .unwrap(),
        )
    }

    fn registry() -> LayerRegistry {
        let mut registry = LayerRegistry::new();
        registry.register(LayerDescriptor::ndvi()).unwrap();
        registry.register(LayerDescriptor::rainfall_anomaly()).unwrap();
        registry
    }

    #[test]
    fn test_register_starts_unloaded_hidden() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        let entry = registry.get("ndvi").unwrap();
        assert_eq!(entry.state, LayerState::Unloaded);
        assert!(!entry.visible);
        assert!(entry.ready_raster().is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = registry();
        assert!(registry.register(LayerDescriptor::ndvi()).is_err());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut registry = registry();
        registry.transition("ndvi", LayerState::Loading, None).unwrap();
        registry
            .transition("ndvi", LayerState::Ready, Some(raster()))
            .unwrap();
        assert!(registry.get("ndvi").unwrap().ready_raster().is_some());
        assert_eq!(registry.ready().count(), 1);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut registry = registry();
        let err = registry
            .transition("ndvi", LayerState::Ready, Some(raster()))
            .unwrap_err();
        assert!(matches!(err, OverlayError::InvalidTransition { .. }));

        registry.transition("ndvi", LayerState::Loading, None).unwrap();
        registry
            .transition(
                "ndvi",
                LayerState::Failed {
                    reason: "boom".into(),
                },
                None,
            )
            .unwrap();
        // Terminal: no way back.
        assert!(registry
            .transition("ndvi", LayerState::Loading, None)
            .is_err());
        assert!(registry
            .transition("ndvi", LayerState::Unloaded, None)
            .is_err());
    }

    #[test]
    fn test_unknown_layer() {
        let mut registry = registry();
        assert!(matches!(
            registry.transition("nope", LayerState::Loading, None),
            Err(OverlayError::LayerNotFound(_))
        ));
        assert!(registry.require("nope").is_err());
    }

    #[test]
    fn test_entries_are_independent() {
        let mut registry = registry();
        registry.transition("ndvi", LayerState::Loading, None).unwrap();
        registry
            .transition("ndvi", LayerState::Ready, Some(raster()))
            .unwrap();
        // Rainfall never loads; NDVI is still the only ready layer.
        let ready: Vec<_> = registry.ready().map(|e| e.id().to_string()).collect();
        assert_eq!(ready, vec!["ndvi"]);
        assert_eq!(
            registry.get("rainfall_anomaly").unwrap().state,
            LayerState::Unloaded
        );
    }
}
