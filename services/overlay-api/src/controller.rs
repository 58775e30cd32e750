//! Map controller.
//!
//! One controller per map instance. It owns the layer registry, the
//! "active" (inspected) layer, the attached map surfaces and the load state
//! machine. Loads run as independent tasks and only take the write lock to
//! record a transition, so a partially loaded map is always readable.

use std::sync::Arc;

use geotiff_reader::DecodedRaster;
use overlay_common::{
    Color, LayerId, LayerState, Legend, MapView, OverlayError, OverlayResult, RasterSample,
    ThresholdClassifier, TitleBanner,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::layer_config::{LayerDescriptor, MapConfig, RasterSource};
use crate::registry::{LayerEntry, LayerRegistry};
use crate::surface::MapSurface;

/// Controller shared between handlers and load tasks.
pub type SharedController = Arc<RwLock<MapController>>;

/// Class a sample fell into.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMatch {
    pub label: String,
    pub color: Color,
}

/// Answer to a click at `(lat, lng)` on one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectResult {
    pub layer: Option<LayerId>,
    pub lat: f64,
    pub lng: f64,
    pub sample: RasterSample,
    /// `None` for no-data.
    pub class: Option<ClassMatch>,
}

impl InspectResult {
    fn no_data(layer: Option<LayerId>, lat: f64, lng: f64) -> Self {
        Self {
            layer,
            lat,
            lng,
            sample: RasterSample::NoData,
            class: None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.sample.is_no_data()
    }
}

/// Public status of one layer.
#[derive(Debug, Clone, Serialize)]
pub struct LayerStatus {
    pub id: LayerId,
    pub title: String,
    #[serde(flatten)]
    pub state: LayerState,
    pub visible: bool,
    pub primary: bool,
    pub opacity: f32,
    pub source: String,
    /// `[[south, west], [north, east]]` once Ready.
    pub bounds: Option<[[f64; 2]; 2]>,
    pub band_count: Option<usize>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&LayerEntry> for LayerStatus {
    fn from(entry: &LayerEntry) -> Self {
        let raster = entry.ready_raster();
        Self {
            id: entry.descriptor.id.clone(),
            title: entry.descriptor.title.clone(),
            state: entry.state.clone(),
            visible: entry.visible,
            primary: entry.descriptor.primary,
            opacity: entry.descriptor.opacity,
            source: entry.descriptor.source.to_string(),
            bounds: raster.map(|r| r.bounds().to_lat_lng_bounds()),
            band_count: raster.map(|r| r.band_count()),
            updated_at: entry.updated_at,
        }
    }
}

/// Everything a client needs to draw the map.
#[derive(Debug, Clone, Serialize)]
pub struct MapSnapshot {
    pub id: Uuid,
    pub view: MapView,
    pub title: TitleBanner,
    pub active_layer: Option<LayerId>,
    pub layers: Vec<LayerStatus>,
}

/// What the renderer needs, cloned out so rendering runs without the lock.
#[derive(Debug, Clone)]
pub struct OverlaySource {
    pub layer: LayerId,
    pub raster: Arc<DecodedRaster>,
    pub classifier: ThresholdClassifier,
    pub band: usize,
    pub opacity: f32,
}

pub struct MapController {
    id: Uuid,
    view: MapView,
    title: TitleBanner,
    registry: LayerRegistry,
    active: Option<LayerId>,
    surfaces: Vec<Arc<dyn MapSurface>>,
    closed: bool,
}

impl std::fmt::Debug for MapController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapController")
            .field("id", &self.id)
            .field("layers", &self.registry.len())
            .field("active", &self.active)
            .field("surfaces", &self.surfaces.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl MapController {
    /// Build a controller with every configured layer registered `Unloaded`.
    pub fn new(config: &MapConfig) -> OverlayResult<Self> {
        let mut registry = LayerRegistry::new();
        for layer in &config.layers {
            registry.register(layer.clone())?;
        }

        let controller = Self {
            id: Uuid::new_v4(),
            view: config.view.clone(),
            title: config.title.clone(),
            registry,
            active: None,
            surfaces: Vec::new(),
            closed: false,
        };
        info!(map = %controller.id, layers = controller.registry.len(), "Map controller created");
        Ok(controller)
    }

    pub fn into_shared(self) -> SharedController {
        Arc::new(RwLock::new(self))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn title(&self) -> &TitleBanner {
        &self.title
    }

    pub fn active_layer(&self) -> Option<&LayerId> {
        self.active.as_ref()
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.registry.ids()
    }

    /// Start forwarding layer changes to `surface`.
    pub fn attach(&mut self, surface: Arc<dyn MapSurface>) {
        self.surfaces.push(surface);
    }

    // ------------------------------------------------------------------
    // Load state machine
    // ------------------------------------------------------------------

    fn ensure_open(&self, layer: &LayerId, action: &str) -> OverlayResult<()> {
        if self.closed {
            warn!(layer = %layer, action, "Ignoring transition on torn down controller");
            return Err(OverlayError::ControllerClosed);
        }
        Ok(())
    }

    /// `Unloaded -> Loading`. Returns the source to fetch.
    pub fn begin_loading(&mut self, layer: &LayerId) -> OverlayResult<RasterSource> {
        self.ensure_open(layer, "begin_loading")?;
        let entry = self
            .registry
            .transition(layer.as_str(), LayerState::Loading, None)
            .map_err(|e| {
                warn!(layer = %layer, error = %e, "Rejected transition");
                e
            })?;
        debug!(layer = %layer, source = %entry.descriptor.source, "Layer loading");
        Ok(entry.descriptor.source.clone())
    }

    /// `Loading -> Ready`, then apply the visibility policy.
    ///
    /// A layer becomes visible if it is visible by default or the user
    /// already toggled it on while it loaded. The primary layer (or the
    /// first Ready layer when none is primary) becomes the active raster,
    /// and the primary layer's bounds are fitted.
    pub fn complete_load(&mut self, layer: &LayerId, raster: DecodedRaster) -> OverlayResult<()> {
        self.ensure_open(layer, "complete_load")?;
        let raster = Arc::new(raster);
        let bounds = raster.bounds();

        let entry = self
            .registry
            .transition(layer.as_str(), LayerState::Ready, Some(raster))
            .map_err(|e| {
                warn!(layer = %layer, error = %e, "Rejected transition");
                e
            })?;

        entry.visible = entry.visible || entry.descriptor.visible_by_default;
        let visible = entry.visible;
        let primary = entry.descriptor.primary;
        let opacity = entry.descriptor.opacity;

        info!(
            layer = %layer,
            visible,
            primary,
            bounds = ?bounds.to_lat_lng_bounds(),
            "Layer ready"
        );

        if visible {
            for surface in &self.surfaces {
                surface.add_layer(layer, &bounds, opacity);
            }
        }
        if primary {
            for surface in &self.surfaces {
                surface.fit_bounds(&bounds);
            }
        }
        if primary || self.active.is_none() {
            self.active = Some(layer.clone());
        }
        Ok(())
    }

    /// `Loading -> Failed(reason)`. Other layers are unaffected.
    pub fn fail_load(&mut self, layer: &LayerId, reason: impl Into<String>) -> OverlayResult<()> {
        self.ensure_open(layer, "fail_load")?;
        let reason = reason.into();
        self.registry
            .transition(
                layer.as_str(),
                LayerState::Failed {
                    reason: reason.clone(),
                },
                None,
            )
            .map_err(|e| {
                warn!(layer = %layer, error = %e, "Rejected transition");
                e
            })?;
        warn!(layer = %layer, reason = %reason, "Layer failed to load");
        Ok(())
    }

    // ------------------------------------------------------------------
    // User interaction
    // ------------------------------------------------------------------

    /// Toggle a layer. Layers that are not Ready keep the flag and are
    /// shown once they finish loading.
    pub fn set_visibility(&mut self, layer: &str, visible: bool) -> OverlayResult<()> {
        if self.closed {
            return Err(OverlayError::ControllerClosed);
        }
        let entry = self
            .registry
            .get_mut(layer)
            .ok_or_else(|| OverlayError::LayerNotFound(layer.to_string()))?;

        let changed = entry.visible != visible;
        entry.visible = visible;

        if changed {
            if let Some(raster) = entry.ready_raster() {
                let bounds = raster.bounds();
                let id = entry.descriptor.id.clone();
                let opacity = entry.descriptor.opacity;
                for surface in &self.surfaces {
                    if visible {
                        surface.add_layer(&id, &bounds, opacity);
                    } else {
                        surface.remove_layer(&id);
                    }
                }
            }
        }
        debug!(layer, visible, changed, "Layer visibility set");
        Ok(())
    }

    /// Make a Ready layer the inspected one.
    pub fn set_active(&mut self, layer: &str) -> OverlayResult<()> {
        if self.closed {
            return Err(OverlayError::ControllerClosed);
        }
        let entry = self.registry.require(layer)?;
        require_ready(entry)?;
        self.active = Some(entry.descriptor.id.clone());
        info!(layer, "Active layer changed");
        Ok(())
    }

    /// Sample the active layer. Never fails: no active layer, a point
    /// outside the raster, NaN and the no-data value all give "no data".
    pub fn inspect(&self, lat: f64, lng: f64) -> InspectResult {
        let entry = self
            .active
            .as_ref()
            .and_then(|id| self.registry.get(id.as_str()));
        match entry {
            Some(entry) => inspect_entry(entry, lat, lng),
            None => InspectResult::no_data(None, lat, lng),
        }
    }

    /// Sample every Ready layer, in registration order.
    pub fn inspect_all(&self, lat: f64, lng: f64) -> Vec<InspectResult> {
        self.registry
            .ready()
            .map(|entry| inspect_entry(entry, lat, lng))
            .collect()
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    /// Everything needed to render a layer's overlay.
    pub fn overlay_source(&self, layer: &str) -> OverlayResult<OverlaySource> {
        let entry = self.registry.require(layer)?;
        let raster = require_ready(entry)?;
        Ok(OverlaySource {
            layer: entry.descriptor.id.clone(),
            raster: Arc::clone(raster),
            classifier: entry.descriptor.classifier.clone(),
            band: entry.descriptor.band,
            opacity: entry.descriptor.opacity,
        })
    }

    /// Legend for any registered layer, loaded or not.
    pub fn legend(&self, layer: &str) -> OverlayResult<Legend> {
        let descriptor = &self.registry.require(layer)?.descriptor;
        Ok(Legend::from_classifier(
            descriptor.legend_title.clone(),
            &descriptor.classifier,
        ))
    }

    pub fn layer_status(&self, layer: &str) -> OverlayResult<LayerStatus> {
        self.registry.require(layer).map(LayerStatus::from)
    }

    pub fn layer_statuses(&self) -> Vec<LayerStatus> {
        self.registry.iter().map(LayerStatus::from).collect()
    }

    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            id: self.id,
            view: self.view.clone(),
            title: self.title.clone(),
            active_layer: self.active.clone(),
            layers: self.layer_statuses(),
        }
    }

    pub fn descriptor(&self, layer: &str) -> Option<&LayerDescriptor> {
        self.registry.get(layer).map(|e| &e.descriptor)
    }

    /// Detach every surface. Later transitions are ignored.
    pub fn teardown(&mut self) {
        if self.closed {
            return;
        }
        for surface in self.surfaces.drain(..) {
            surface.detach();
        }
        self.closed = true;
        info!(map = %self.id, "Map controller torn down");
    }
}

fn require_ready(entry: &LayerEntry) -> OverlayResult<&Arc<DecodedRaster>> {
    match &entry.state {
        LayerState::Failed { reason } => Err(OverlayError::LayerFailed {
            layer: entry.descriptor.id.to_string(),
            reason: reason.clone(),
        }),
        state => entry.ready_raster().ok_or_else(|| OverlayError::LayerNotReady {
            layer: entry.descriptor.id.to_string(),
            state: state.name().to_string(),
        }),
    }
}

fn inspect_entry(entry: &LayerEntry, lat: f64, lng: f64) -> InspectResult {
    let layer = Some(entry.descriptor.id.clone());
    let Some(raster) = entry.ready_raster() else {
        return InspectResult::no_data(layer, lat, lng);
    };

    let sample = raster.sample_at_coordinate(lat, lng);
    let classifier = &entry.descriptor.classifier;
    let class = sample
        .band(entry.descriptor.band)
        .and_then(|v| classifier.rank_value(v))
        .map(|rank| ClassMatch {
            label: classifier.label_at(rank).to_string(),
            color: classifier.palette()[rank],
        });

    InspectResult {
        layer,
        lat,
        lng,
        sample,
        class,
    }
}
