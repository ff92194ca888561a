//! Prometheus metrics for the freightline services.
//!
//! HTTP-level metrics are recorded by [`crate::MetricsLayer`]; the helpers
//! below cover lifecycle events that a request-level view cannot see.
//!
//! ```no_run
//! use freightline_service_shared::metrics::{MetricsConfig, init_metrics, metrics_handler};
//! use axum::{Router, routing::get};
//!
//! init_metrics(&MetricsConfig::default()).expect("failed to initialize metrics");
//! let app: Router = Router::new().route("/metrics", get(metrics_handler));
//! ```

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use freightline_lib::{ErrorKind, LegState, ShipmentState};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Route the exposition endpoint is mounted on.
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// - `METRICS_ENABLED`: anything but "false" enables metrics (default: true)
    /// - `METRICS_PATH`: exposition route (default: "/metrics")
    pub fn from_env() -> Self {
        let enabled = std::env::var("METRICS_ENABLED")
            .map(|v| !v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        let path = std::env::var("METRICS_PATH")
            .ok()
            .filter(|p| p.starts_with('/'))
            .unwrap_or_else(|| "/metrics".to_string());

        Self { enabled, path }
    }
}

/// Install the global Prometheus recorder. Only the first call succeeds.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Axum handler rendering the Prometheus exposition text.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

#[derive(Debug, Clone)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Lifecycle metrics
// =============================================================================

/// Count a shipment entering `to`.
pub fn record_shipment_transition(to: ShipmentState) {
    metrics::counter!("freightline_shipment_transitions_total", "to" => to.as_str())
        .increment(1);
}

/// Count a leg entering `to`.
pub fn record_leg_transition(to: LegState) {
    metrics::counter!("freightline_leg_transitions_total", "to" => to.as_str()).increment(1);
}

/// Count a rejected lifecycle operation by error kind.
pub fn record_operation_failed(operation: &'static str, kind: ErrorKind) {
    metrics::counter!(
        "freightline_operations_failed_total",
        "operation" => operation,
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record the estimated cost of a freshly routed shipment.
pub fn record_estimated_cost(cost: f64) {
    metrics::histogram!("freightline_estimated_cost").record(cost);
}
