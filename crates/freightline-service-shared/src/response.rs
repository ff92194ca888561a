//! Successful HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// A JSON body paired with the status code it leaves with.
///
/// Payloads are serialized as-is so list endpoints can answer with a bare
/// JSON array.
///
/// # Example
///
/// ```
/// use freightline_service_shared::ServiceResponse;
/// use axum::http::StatusCode;
///
/// let response = ServiceResponse::created(vec![1, 2, 3]);
/// assert_eq!(response.status, StatusCode::CREATED);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceResponse<T> {
    pub status: StatusCode,
    pub data: T,
}

impl<T> ServiceResponse<T> {
    /// 200 OK.
    pub fn new(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    /// 201 Created.
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

impl<T> From<T> for ServiceResponse<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

impl<T: Serialize> IntoResponse for ServiceResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.data)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    struct Quote {
        estimated_cost: f64,
    }

    #[test]
    fn test_service_response_defaults_to_ok() {
        let response = ServiceResponse::new(Quote {
            estimated_cost: 105_530.0,
        });
        assert_eq!(response.status, StatusCode::OK);
    }

    #[test]
    fn test_service_response_into_response_keeps_status() {
        let response = ServiceResponse::created(vec!["TRK-001"]).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(axum::http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
