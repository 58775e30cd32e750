//! Map surface abstraction.
//!
//! The controller never talks to a map widget directly. It drives one or
//! more [`MapSurface`]s; the service's implementation turns each call into
//! a [`MapEvent`] on a broadcast channel that clients can follow.

use overlay_common::{BoundingBox, LayerId};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// What the controller can ask of a map.
pub trait MapSurface: Send + Sync {
    fn add_layer(&self, layer: &LayerId, bounds: &BoundingBox, opacity: f32);

    fn remove_layer(&self, layer: &LayerId);

    fn fit_bounds(&self, bounds: &BoundingBox);

    /// Stop listening; called once on teardown.
    fn detach(&self);
}

/// A change the map should apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    LayerAdded {
        layer: LayerId,
        /// `[[south, west], [north, east]]`
        bounds: [[f64; 2]; 2],
        opacity: f32,
    },
    LayerRemoved {
        layer: LayerId,
    },
    FitBounds {
        bounds: [[f64; 2]; 2],
    },
    Detached,
}

impl MapEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MapEvent::LayerAdded { .. } => "layer_added",
            MapEvent::LayerRemoved { .. } => "layer_removed",
            MapEvent::FitBounds { .. } => "fit_bounds",
            MapEvent::Detached => "detached",
        }
    }
}

/// [`MapSurface`] that publishes [`MapEvent`]s.
#[derive(Debug, Clone)]
pub struct BroadcastSurface {
    sender: broadcast::Sender<MapEvent>,
}

impl BroadcastSurface {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: MapEvent) {
        debug!(event = event.kind(), "Map event");
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }
}

impl MapSurface for BroadcastSurface {
    fn add_layer(&self, layer: &LayerId, bounds: &BoundingBox, opacity: f32) {
        self.publish(MapEvent::LayerAdded {
            layer: layer.clone(),
            bounds: bounds.to_lat_lng_bounds(),
            opacity,
        });
    }

    fn remove_layer(&self, layer: &LayerId) {
        self.publish(MapEvent::LayerRemoved {
            layer: layer.clone(),
        });
    }

    fn fit_bounds(&self, bounds: &BoundingBox) {
        self.publish(MapEvent::FitBounds {
            bounds: bounds.to_lat_lng_bounds(),
        });
    }

    fn detach(&self) {
        self.publish(MapEvent::Detached);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let surface = BroadcastSurface::new(8);
        let mut rx = surface.subscribe();

        let bounds = BoundingBox::new(2.7, 6.4, 3.1, 6.9);
        surface.add_layer(&LayerId::new("ndvi"), &bounds, 1.0);
        surface.fit_bounds(&bounds);

        match rx.recv().await.unwrap() {
            MapEvent::LayerAdded { layer, bounds, .. } => {
                assert_eq!(layer.as_str(), "ndvi");
                assert_eq!(bounds, [[6.4, 2.7], [6.9, 3.1]]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(rx.recv().await.unwrap().kind(), "fit_bounds");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let surface = BroadcastSurface::new(1);
        surface.detach();
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(MapEvent::LayerRemoved {
            layer: LayerId::new("rainfall_anomaly"),
        })
        .unwrap();
        assert_eq!(json["type"], "layer_removed");
        assert_eq!(json["layer"], "rainfall_anomaly");
    }
}
