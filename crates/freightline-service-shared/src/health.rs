//! Health check handlers for Kubernetes probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health status response for liveness and readiness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "ok", or "not_ready: <reason>".
    pub status: String,

    pub service: String,

    pub version: String,

    /// Whether the SQLite store answered a ping (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_ready: Option<bool>,

    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            store_ready: None,
            checked_at: Utc::now(),
        }
    }

    pub fn ready(service: &str, version: &str) -> Self {
        Self {
            store_ready: Some(true),
            ..Self::alive(service, version)
        }
    }

    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            store_ready: Some(false),
            ..Self::alive(service, version)
        }
    }
}

/// Liveness probe handler. Never touches the store.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"freightline-service-shared","version":"0.1.0","checked_at":"..."}
/// ```
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe handler. Answers 503 while the store cannot be queried.
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    let ready = tokio::task::spawn_blocking(move || state.is_ready())
        .await
        .unwrap_or(false);

    if !ready {
        let status = HealthStatus::not_ready(service, version, "store unavailable");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response();
    }

    (StatusCode::OK, Json(HealthStatus::ready(service, version))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;

    #[test]
    fn test_health_status_alive() {
        let status = HealthStatus::alive("logistics", "1.0.0");
        assert_eq!(status.status, "ok");
        assert_eq!(status.service, "logistics");
        assert!(status.store_ready.is_none());
    }

    #[test]
    fn test_health_status_not_ready() {
        let status = HealthStatus::not_ready("logistics", "1.0.0", "store unavailable");
        assert!(status.status.starts_with("not_ready"));
        assert_eq!(status.store_ready, Some(false));
    }

    #[test]
    fn test_health_status_serialization_skips_store_on_liveness() {
        let json = serde_json::to_string(&HealthStatus::alive("logistics", "1.0.0")).unwrap();
        assert!(!json.contains("store_ready"));
        assert!(json.contains("checked_at"));
    }

    #[tokio::test]
    async fn test_health_ready_with_in_memory_store() {
        let response = health_ready(State(test_state())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
