//! RFC 9457 Problem Details for the freightline HTTP API.
//!
//! Every failure leaves the service as `application/problem+json`. Library
//! errors are classified through [`freightline_lib::ErrorKind`] so a new error
//! variant only needs a kind to get the right status code here.
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use freightline_lib::{Error as LibError, ErrorKind};

/// Problem type URI for missing shipments, routes, legs, or containers.
pub const PROBLEM_NOT_FOUND: &str = "/problems/not-found";

/// Problem type URI for operations rejected by the lifecycle state machines.
pub const PROBLEM_INVALID_STATE: &str = "/problems/invalid-state";

/// Problem type URI for uniqueness violations such as a reused tracking code.
pub const PROBLEM_DUPLICATE_KEY: &str = "/problems/duplicate-key";

/// Problem type URI for deterministic business rule rejections.
pub const PROBLEM_BUSINESS_RULE: &str = "/problems/business-rule-violation";

/// Problem type URI for invalid request parameters.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for collaborator or mapping provider outages.
pub const PROBLEM_DEPENDENCY_UNAVAILABLE: &str = "/problems/dependency-unavailable";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// RFC 9457 Problem Details response structure.
///
/// # Example
///
/// ```
/// use freightline_service_shared::{ProblemDetails, PROBLEM_INVALID_STATE};
/// use axum::http::StatusCode;
///
/// let problem = ProblemDetails::new(PROBLEM_INVALID_STATE, "Invalid State", StatusCode::CONFLICT)
///     .with_detail("cannot assign a route to shipment 7 while it is SCHEDULED")
///     .with_request_id("req-12345");
/// assert_eq!(problem.status, 409);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem.
    pub title: String,

    /// HTTP status code for this problem.
    pub status: u16,

    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Request identifier of the failing call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Whether repeating the same call later may succeed.
    #[serde(default)]
    pub retryable: bool,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            retryable: false,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// 400 for malformed input.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 500 for anything the caller cannot fix.
    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.detail.as_deref().unwrap_or(""))
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Json(&self).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        *response.status_mut() = status;
        response
    }
}

/// Convert a library error into the problem the caller sees.
///
/// The library message is passed through as `detail`, except for storage
/// failures whose SQLite text is not meant for clients.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    let kind = error.kind();
    let (type_uri, title, status) = match kind {
        ErrorKind::NotFound => (PROBLEM_NOT_FOUND, "Not Found", StatusCode::NOT_FOUND),
        ErrorKind::InvalidState => (PROBLEM_INVALID_STATE, "Invalid State", StatusCode::CONFLICT),
        ErrorKind::DuplicateKey => (PROBLEM_DUPLICATE_KEY, "Duplicate Key", StatusCode::CONFLICT),
        ErrorKind::BusinessRuleViolation => (
            PROBLEM_BUSINESS_RULE,
            "Business Rule Violation",
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        ErrorKind::InvalidInput => (
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        ),
        ErrorKind::DependencyUnavailable => (
            PROBLEM_DEPENDENCY_UNAVAILABLE,
            "Dependency Unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        ),
        ErrorKind::Internal => {
            return ProblemDetails::internal_error("storage failure", request_id);
        }
    };

    ProblemDetails::new(type_uri, title, status)
        .with_detail(error.to_string())
        .with_request_id(request_id)
        .retryable(kind.is_retryable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use freightline_lib::BusinessRuleViolation;

    #[test]
    fn test_problem_details_new() {
        let problem = ProblemDetails::new(PROBLEM_NOT_FOUND, "Not Found", StatusCode::NOT_FOUND);
        assert_eq!(problem.type_uri, PROBLEM_NOT_FOUND);
        assert_eq!(problem.status, 404);
        assert!(!problem.retryable);
    }

    #[test]
    fn test_problem_details_serialization() {
        let problem = ProblemDetails::bad_request("tracking_code must not be blank", "req-test");
        let json = serde_json::to_string(&problem).unwrap();

        assert!(json.contains("\"type\":\"/problems/invalid-request\""));
        assert!(json.contains("\"status\":400"));
        assert!(json.contains("\"instance\":\"req-test\""));
    }

    #[test]
    fn test_from_lib_error_invalid_state_is_conflict() {
        let error = LibError::InvalidState {
            entity: "shipment",
            id: "7".to_string(),
            state: "SCHEDULED".to_string(),
            operation: "assign a route to",
        };
        let problem = from_lib_error(&error, "req-state");

        assert_eq!(problem.type_uri, PROBLEM_INVALID_STATE);
        assert_eq!(problem.status, 409);
        assert!(problem.detail.as_deref().unwrap().contains("SCHEDULED"));
    }

    #[test]
    fn test_from_lib_error_business_rule_lists_eligible_trucks() {
        let error = LibError::from(BusinessRuleViolation::TruckNotEligible {
            truck_id: "ZZ000ZZ".to_string(),
            eligible: vec!["AA111AA".to_string()],
        });
        let problem = from_lib_error(&error, "req-truck");

        assert_eq!(problem.status, 422);
        assert!(problem.detail.as_deref().unwrap().contains("AA111AA"));
        assert!(!problem.retryable);
    }

    #[test]
    fn test_from_lib_error_geo_failure_is_retryable_outage() {
        let error = LibError::GeoLookupFailed {
            message: "ZERO_RESULTS".to_string(),
        };
        let problem = from_lib_error(&error, "req-geo");

        assert_eq!(problem.type_uri, PROBLEM_DEPENDENCY_UNAVAILABLE);
        assert_eq!(problem.status, 503);
        assert!(problem.retryable);
    }

    #[test]
    fn test_from_lib_error_storage_hides_sqlite_text() {
        let error = LibError::Storage(rusqlite::Error::QueryReturnedNoRows);
        let problem = from_lib_error(&error, "req-db");

        assert_eq!(problem.status, 500);
        assert_eq!(problem.detail.as_deref(), Some("storage failure"));
    }
}
