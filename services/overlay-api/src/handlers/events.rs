//! Server-sent map events.
//!
//! Every change the controller applies to its surfaces (layer added or
//! removed, bounds fitted, teardown) is streamed to subscribers so a map
//! widget can mirror it.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::Extension,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, warn};

use crate::state::AppState;
use crate::surface::MapEvent;

/// GET /api/events - `text/event-stream` of [`MapEvent`]s
pub async fn events_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Event stream subscriber connected");
    Sse::new(event_stream(state.events.subscribe())).keep_alive(KeepAlive::default())
}

/// Ends after forwarding `Detached` or when the channel closes.
fn event_stream(rx: Receiver<MapEvent>) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(Some(rx), |rx| async move {
        let mut rx = rx?;
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let detached = matches!(event, MapEvent::Detached);
                    match Event::default().event(event.kind()).json_data(&event) {
                        Ok(sse) => {
                            let next = if detached { None } else { Some(rx) };
                            return Some((Ok(sse), next));
                        }
                        Err(e) => warn!(error = %e, "Failed to serialize map event"),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use overlay_common::{BoundingBox, LayerId};

    use crate::surface::{BroadcastSurface, MapSurface};

    #[tokio::test]
    async fn test_stream_ends_after_detach() {
        let surface = BroadcastSurface::new(8);
        let stream = event_stream(surface.subscribe());

        surface.add_layer(&LayerId::new("ndvi"), &BoundingBox::new(2.7, 6.4, 3.1, 6.9), 1.0);
        surface.detach();
        surface.remove_layer(&LayerId::new("ndvi"));

        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 2);
    }
}
