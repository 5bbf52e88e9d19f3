//! HTTP server exposing the zone resolution API.
//!
//! Serves serviceability checks, courier zone lookups, covering-zone
//! listings and distance-to-edge queries over a TTL-cached zone snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use zonal::config::Config;
use zonal::store::{JsonFileSource, ZoneStore};
use zonal::ResolutionService;

mod handlers;
use handlers::{
    courier_zone_handler, covering_handler, diagnostics_handler, distance_handler,
    health_handler, serviceable_handler, AppState,
};

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Zone resolution server")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Zone records JSON file (overrides config)
    #[arg(long)]
    zones: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)?,
            None => {
                let zones = self
                    .zones
                    .clone()
                    .context("Either --config or --zones is required")?;
                Config::for_zones(zones)
            }
        };
        if let Some(zones) = self.zones {
            config.zones.path = zones;
        }
        if let Some(listen) = self.listen {
            config.server.listen = listen;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().into_config()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Zonal Resolution Server");
    info!(
        "Zones from {} (refresh every {}s)",
        config.zones.path.display(),
        config.zones.refresh_ttl_secs
    );

    let store = Arc::new(ZoneStore::new(
        JsonFileSource::new(&config.zones.path),
        config.refresh_ttl(),
    ));

    // Fail fast on an unreadable zone file; later refresh failures fall back
    // to the last good snapshot
    let snapshot = store.refresh().context("Initial zone load failed")?;
    info!(
        "Loaded {} zones with {} diagnostics",
        snapshot.len(),
        snapshot.diagnostics().len()
    );

    let mut service = ResolutionService::new(store);
    if let Some(fees) = config.fees {
        info!(
            "Courier fees: base {} + {}/km beyond {}m",
            fees.base_fee, fees.per_km, fees.included_meters
        );
        service = service.with_fees(fees);
    }

    let state = Arc::new(AppState { service });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/serviceable", get(serviceable_handler))
        .route("/v1/courier-zone", get(courier_zone_handler))
        .route("/v1/zones/covering", get(covering_handler))
        .route("/v1/zones/{id}/distance", get(distance_handler))
        .route("/v1/diagnostics", get(diagnostics_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
