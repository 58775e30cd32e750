//! HTTP request handlers.
//!
//! This module is organized into submodules:
//! - `map`: map snapshot and title banner
//! - `layers`: layer status, visibility, active layer, overlay PNG, legend
//! - `inspect`: click-to-inspect
//! - `events`: server-sent map events
//! - `metrics`: health, readiness and Prometheus metrics
//! - `common`: JSON error bodies and response formats

pub mod common;
pub mod events;
pub mod inspect;
pub mod layers;
pub mod map;
pub mod metrics;

pub use common::{ApiError, ApiResult, ResponseFormat};

pub use map::{map_handler, title_handler};

pub use layers::{
    layer_handler, legend_handler, list_layers_handler, overlay_handler, set_active_handler,
    set_visibility_handler,
};

pub use inspect::inspect_handler;

pub use events::events_handler;

pub use metrics::{api_metrics_handler, health_handler, metrics_handler, ready_handler};
