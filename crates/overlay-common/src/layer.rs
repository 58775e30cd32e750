//! Layer identity and load state.

use serde::{Deserialize, Serialize};

/// Unique identifier for a layer (e.g. "ndvi", "rainfall_anomaly").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Load lifecycle of a layer.
///
/// `Unloaded -> Loading -> Ready | Failed`. There is no way back to
/// `Unloaded` and terminal states never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LayerState {
    Unloaded,
    Loading,
    Ready,
    Failed { reason: String },
}

impl LayerState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: &LayerState) -> bool {
        matches!(
            (self, next),
            (LayerState::Unloaded, LayerState::Loading)
                | (LayerState::Loading, LayerState::Ready)
                | (LayerState::Loading, LayerState::Failed { .. })
        )
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LayerState::Ready)
    }

    /// Failure reason, if this layer failed to load.
    pub fn failure(&self) -> Option<&str> {
        match self {
            LayerState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LayerState::Unloaded => "unloaded",
            LayerState::Loading => "loading",
            LayerState::Ready => "ready",
            LayerState::Failed { .. } => "failed",
        }
    }
}
