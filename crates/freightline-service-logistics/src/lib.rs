//! Freightline logistics HTTP service.
//!
//! Exposes the shipment and leg lifecycles from `freightline-lib` over REST.
//! The binary in `main.rs` only wires configuration; the router lives here so
//! integration tests can drive it in-process.
//!
//! # Endpoints
//!
//! - `POST /shipments`, `GET /shipments`, `GET /shipments/pending`
//! - `GET|DELETE /shipments/{id}`, `POST /shipments/estimate`
//! - `POST /shipments/{id}/route|cancel|finalize`, `GET /shipments/{id}/tracking`
//! - `GET /containers/{id}/status`
//! - `POST /legs`, `GET /legs`, `GET /legs/{id}`, `POST /legs/{id}/assign|start|finish`
//! - `POST /deposits/on-route`, `POST /tariffs/quote`
//! - `GET /health/live`, `GET /health/ready`, Prometheus metrics

#![deny(warnings)]

pub mod handlers;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use freightline_service_shared::{
    health_live, health_ready, metrics_handler, AppState, MetricsConfig, MetricsLayer,
};

use handlers::{catalog, legs, shipments};

/// Build the service router.
pub fn router(state: AppState, metrics: &MetricsConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    let mut app = Router::new()
        .route(
            "/shipments",
            post(shipments::create_shipment).get(shipments::list_shipments),
        )
        .route("/shipments/pending", get(shipments::pending_shipments))
        .route("/shipments/estimate", post(shipments::estimate_route))
        .route(
            "/shipments/{id}",
            get(shipments::get_shipment).delete(shipments::delete_shipment),
        )
        .route("/shipments/{id}/route", post(shipments::assign_route))
        .route("/shipments/{id}/cancel", post(shipments::cancel_shipment))
        .route("/shipments/{id}/finalize", post(shipments::finalize_shipment))
        .route("/shipments/{id}/tracking", get(shipments::shipment_tracking))
        .route("/containers/{id}/status", get(catalog::container_status))
        .route("/legs", post(legs::create_leg).get(legs::list_legs))
        .route("/legs/{id}", get(legs::get_leg))
        .route("/legs/{id}/assign", post(legs::assign_truck))
        .route("/legs/{id}/start", post(legs::start_leg))
        .route("/legs/{id}/finish", post(legs::finish_leg))
        .route("/deposits/on-route", post(catalog::deposits_on_route))
        .route("/tariffs/quote", post(catalog::tariff_quote))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready));

    if metrics.enabled {
        app = app.route(&metrics.path, get(metrics_handler));
    }

    app.layer(cors).layer(MetricsLayer).with_state(state)
}
