//! Mortality map API service.
//!
//! Builds the joined state table at startup and serves the choropleth page.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use renderer::ChoroplethRenderer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use map_api::{build_joined_table, router, AppState, MapConfig};

#[derive(Parser, Debug)]
#[command(name = "map-api")]
#[command(about = "Alzheimer's mortality choropleth server")]
struct Args {
    /// Listen address
    #[arg(short, long, env = "MAP_LISTEN_ADDR", default_value = "0.0.0.0:5000")]
    listen: String,

    /// Log level, used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// YAML configuration file
    #[arg(short, long, env = "MAP_CONFIG")]
    config: Option<PathBuf>,

    /// Mortality CSV (overrides the config file)
    #[arg(long, env = "MAP_CSV_PATH")]
    csv: Option<PathBuf>,

    /// State boundaries GeoJSON (overrides the config file)
    #[arg(long, env = "MAP_BOUNDARY_PATH")]
    boundaries: Option<PathBuf>,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long, env = "MAP_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(true)
        .json()
        .init();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        info!("Configuring tokio runtime with {} worker threads", threads);
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => MapConfig::load(path)?,
        None => MapConfig::default(),
    };
    if let Some(csv) = args.csv {
        config.csv_path = csv;
    }
    if let Some(boundaries) = args.boundaries {
        config.boundary_path = boundaries;
    }

    info!(
        csv = %config.csv_path.display(),
        boundaries = %config.boundary_path.display(),
        "Starting mortality map server"
    );

    let table = build_joined_table(&config.csv_path, &config.boundary_path, &config)
        .inspect_err(|e| error!(error = %e, kind = e.kind(), "Startup pipeline failed"))
        .context("Failed to build state table")?;

    let options = config
        .render_options(table.value_range())
        .context("Invalid render configuration")?;
    let renderer = ChoroplethRenderer::new(options).context("Invalid render configuration")?;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    let state = Arc::new(AppState::new(table, renderer, config.render.cache));
    info!(
        states = state.table.len(),
        cache = state.cache.is_some(),
        "State table ready"
    );

    let app = router(state, prometheus_handle);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
