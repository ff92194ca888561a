//! Freightline logistics HTTP service binary.
//!
//! # Configuration
//!
//! - `FREIGHTLINE_DB_PATH` - SQLite file (default: `freightline.db`)
//! - `FREIGHTLINE_MANAGEMENT_URL`, `FREIGHTLINE_FLEET_URL` - collaborator base URLs
//! - `FREIGHTLINE_MAPS_URL`, `FREIGHTLINE_MAPS_API_KEY` - distance-matrix provider
//! - `FREIGHTLINE_TARIFF_*`, `FREIGHTLINE_DEPOSIT_MARGIN` - pricing and routing knobs
//! - `RUST_LOG`, `LOG_FORMAT` - logging
//! - `METRICS_ENABLED`, `METRICS_PATH` - Prometheus endpoint
//! - `SERVICE_PORT` - HTTP port (default: 8080)

use std::env;
use std::net::SocketAddr;

use tracing::{error, info};

use freightline_lib::FreightlineConfig;
use freightline_service_logistics::router;
use freightline_service_shared::{
    init_logging, init_metrics, AppState, LoggingConfig, MetricsConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("logistics");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let config = FreightlineConfig::from_env();
    info!(
        db_path = %config.db_path.display(),
        maps_configured = !config.maps_api_key.is_empty(),
        port,
        "starting logistics service"
    );

    // The collaborator clients are blocking and must not be built on a runtime worker.
    let state = tokio::task::spawn_blocking(move || AppState::load(&config))
        .await?
        .map_err(|e| {
            error!(error = %e, "failed to load application state");
            e
        })?;
    info!(state = ?state, "application state loaded");

    let app = router(state, &metrics_config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
