//! Shared infrastructure for the freightline HTTP services.
//!
//! - [`AppState`]: the shipment and leg lifecycles behind one cloneable handle
//! - [`health`]: liveness/readiness probes
//! - [`ProblemDetails`]: RFC 9457 error bodies, mapped from library errors
//! - [`ServiceResponse`]: successful JSON bodies with their status code
//! - [`metrics`], [`logging`], [`middleware`]: observability plumbing
//! - Request bodies and query strings with validation for each endpoint
//!
//! # Architecture
//!
//! Handlers stay thin; every lifecycle rule lives in `freightline-lib`:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Parse request JSON / query                               │
//! │  - Validate parameters                                      │
//! │  - Call freightline-lib on the blocking pool                │
//! │  - Map the result to ServiceResponse or ProblemDetails      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! Enable the `test-utils` feature to use [`test_utils`] from dependent crates.

#![deny(warnings)]

mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_estimated_cost, record_leg_transition,
    record_operation_failed, record_shipment_transition, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId, REQUEST_ID_HEADER};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_BUSINESS_RULE, PROBLEM_DEPENDENCY_UNAVAILABLE,
    PROBLEM_DUPLICATE_KEY, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST, PROBLEM_INVALID_STATE,
    PROBLEM_NOT_FOUND,
};
pub use request::{
    AssignTruckRequest, CreateLegRequest, CreateShipmentRequest, EstimateRouteRequest,
    FinishLegRequest, LegQuery, OnRouteRequest, PendingQuery, QuoteRequest, ShipmentQuery,
    Validate,
};
pub use response::ServiceResponse;
pub use state::{AppState, AppStateError};
