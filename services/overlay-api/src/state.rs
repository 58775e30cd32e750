//! Application state and shared resources.

use std::sync::Arc;

use crate::controller::SharedController;
use crate::metrics::MetricsCollector;
use crate::surface::BroadcastSurface;

/// Shared application state.
pub struct AppState {
    pub controller: SharedController,
    /// Source of `/api/events`; also attached to the controller.
    pub events: BroadcastSurface,
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    /// Attach `events` to the controller and wrap everything up.
    pub async fn new(controller: SharedController, events: BroadcastSurface) -> Self {
        controller
            .write()
            .await
            .attach(Arc::new(events.clone()));
        Self {
            controller,
            events,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }
}
