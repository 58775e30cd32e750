//! Raster fetching and the per-layer load task.
//!
//! Each layer loads in its own task: fetch bytes, decode on the blocking
//! pool, then take the controller's write lock just long enough to record
//! `Ready` or `Failed`. Nothing here is fatal to the process.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use geotiff_reader::DecodedRaster;
use overlay_common::LayerId;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::controller::SharedController;
use crate::layer_config::RasterSource;
use crate::metrics;

/// Source of raw GeoTIFF bytes.
#[async_trait]
pub trait RasterFetcher: Send + Sync {
    async fn fetch(&self, source: &RasterSource) -> Result<Bytes>;
}

/// Fetches URLs with `reqwest` and paths from the data directory.
pub struct SourceFetcher {
    client: Client,
    data_dir: PathBuf,
}

impl SourceFetcher {
    pub fn new(data_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            data_dir: data_dir.into(),
        })
    }

    fn resolve(&self, path: &std::path::Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}

#[async_trait]
impl RasterFetcher for SourceFetcher {
    async fn fetch(&self, source: &RasterSource) -> Result<Bytes> {
        match source {
            RasterSource::Url(url) => {
                let response = self.client.get(url).send().await?;
                if !response.status().is_success() {
                    return Err(anyhow!("Download failed: {}", response.status()));
                }
                Ok(response.bytes().await?)
            }
            RasterSource::Path(path) => {
                let path = self.resolve(path);
                let data = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("cannot read {}", path.display()))?;
                Ok(Bytes::from(data))
            }
        }
    }
}

/// How a load task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready,
    Failed(String),
    /// The layer was not `Unloaded` or the controller was torn down.
    Skipped,
}

impl LoadOutcome {
    fn as_label(&self) -> &'static str {
        match self {
            LoadOutcome::Ready => "ready",
            LoadOutcome::Failed(_) => "failed",
            LoadOutcome::Skipped => "skipped",
        }
    }
}

async fn fetch_and_decode(fetcher: &dyn RasterFetcher, source: &RasterSource) -> Result<DecodedRaster> {
    let bytes = fetcher.fetch(source).await?;
    debug!(bytes = bytes.len(), "Fetched raster");

    let raster = tokio::task::spawn_blocking(move || geotiff_reader::decode(&bytes))
        .await
        .context("decode task aborted")?
        .context("decode failed")?;
    Ok(raster)
}

/// Load one layer through its whole state machine.
#[instrument(skip(controller, fetcher), fields(layer = %layer))]
pub async fn load_layer(
    controller: SharedController,
    fetcher: Arc<dyn RasterFetcher>,
    layer: LayerId,
) -> LoadOutcome {
    let start = Instant::now();

    let source = match controller.write().await.begin_loading(&layer) {
        Ok(source) => source,
        Err(e) => {
            warn!(error = %e, "Skipping load");
            return LoadOutcome::Skipped;
        }
    };

    // No lock is held while fetching or decoding.
    let result = fetch_and_decode(fetcher.as_ref(), &source).await;

    let outcome = {
        let mut controller = controller.write().await;
        let recorded = match result {
            Ok(raster) => controller
                .complete_load(&layer, raster)
                .map(|_| LoadOutcome::Ready),
            Err(e) => {
                let reason = format!("{:#}", e);
                controller
                    .fail_load(&layer, reason.clone())
                    .map(|_| LoadOutcome::Failed(reason))
            }
        };
        recorded.unwrap_or_else(|e| {
            warn!(error = %e, "Load result discarded");
            LoadOutcome::Skipped
        })
    };

    let elapsed = start.elapsed();
    metrics::record_layer_load(layer.as_str(), outcome.as_label(), elapsed);
    info!(
        outcome = outcome.as_label(),
        source = %source,
        duration_ms = elapsed.as_millis() as u64,
        "Layer load finished"
    );
    outcome
}

/// Spawn one load task per registered layer.
pub async fn spawn_all(
    controller: SharedController,
    fetcher: Arc<dyn RasterFetcher>,
) -> Vec<(LayerId, JoinHandle<LoadOutcome>)> {
    let layers = controller.read().await.layer_ids();
    layers
        .into_iter()
        .map(|layer| {
            let handle = tokio::spawn(load_layer(
                controller.clone(),
                fetcher.clone(),
                layer.clone(),
            ));
            (layer, handle)
        })
        .collect()
}
