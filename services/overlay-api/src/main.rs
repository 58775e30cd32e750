//! Raster overlay API service.
//!
//! HTTP server that loads NDVI and rainfall anomaly GeoTIFFs and serves
//! them as color-classified overlays with legends and click-to-inspect.

use anyhow::{Context, Result};
use clap::Parser;
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use overlay_api::{
    build_router,
    controller::MapController,
    layer_config::MapConfig,
    loader::{self, RasterFetcher, SourceFetcher},
    metrics::describe_metrics,
    state::AppState,
    surface::BroadcastSurface,
};

#[derive(Parser, Debug)]
#[command(name = "overlay-api")]
#[command(about = "Classified raster overlay server")]
struct Args {
    /// Listen address
    #[arg(short, long, env = "OVERLAY_LISTEN", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Log level
    #[arg(long, env = "OVERLAY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Directory that relative layer paths are resolved against
    #[arg(long, env = "OVERLAY_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Map configuration file (YAML); built-in layers when omitted
    #[arg(short, long, env = "OVERLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Timeout for fetching remote rasters
    #[arg(long, env = "OVERLAY_FETCH_TIMEOUT_SECS", default_value = "60")]
    fetch_timeout_secs: u64,

    /// Capacity of the map event channel
    #[arg(long, default_value = "64")]
    event_capacity: usize,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long, env = "TOKIO_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))?;
    Ok(())
}

async fn async_main(args: Args) -> Result<()> {
    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    describe_metrics();

    info!(
        data_dir = %args.data_dir.display(),
        config = ?args.config,
        worker_threads = ?args.worker_threads,
        "Starting overlay API server"
    );

    let config = MapConfig::load_or_default(args.config.as_deref())?;
    let controller = MapController::new(&config)?.into_shared();
    let events = BroadcastSurface::new(args.event_capacity);
    let state = Arc::new(AppState::new(controller.clone(), events).await);

    // Layers load in the background; the server answers immediately.
    let fetcher: Arc<dyn RasterFetcher> = Arc::new(SourceFetcher::new(
        &args.data_dir,
        Duration::from_secs(args.fetch_timeout_secs),
    )?);
    let loads = loader::spawn_all(controller.clone(), fetcher).await;
    info!(layers = loads.len(), "Layer loads started");

    let app = build_router(state, Some(prometheus_handle));

    let addr: SocketAddr = args.listen.parse()?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    overlay_api::serve(listener, app, controller, shutdown_signal()).await?;

    for (layer, handle) in loads {
        if !handle.is_finished() {
            warn!(layer = %layer, "Abandoning unfinished layer load");
            handle.abort();
        }
    }
    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
