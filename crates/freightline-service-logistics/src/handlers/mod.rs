//! HTTP handlers for the logistics service.
//!
//! Every handler follows the same shape: decode and validate the input,
//! run the blocking library call through [`blocking`], and turn the outcome
//! into a [`ServiceResponse`] or a [`ProblemDetails`].

pub mod catalog;
pub mod legs;
pub mod shipments;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Json, Path, Query};
use tracing::{error, warn};

use freightline_lib::{ErrorKind, Result as LibResult};
use freightline_service_shared::{
    from_lib_error, record_operation_failed, AppState, ProblemDetails, RequestId, ServiceResponse,
    Validate,
};

pub type ApiResult<T> = Result<ServiceResponse<T>, ProblemDetails>;

/// Run a library call on the blocking pool and map its error.
pub(crate) async fn blocking<T, F>(
    state: &AppState,
    request_id: &RequestId,
    operation: &'static str,
    call: F,
) -> Result<T, ProblemDetails>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> LibResult<T> + Send + 'static,
{
    let state = state.clone();
    match tokio::task::spawn_blocking(move || call(&state)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            let kind = err.kind();
            record_operation_failed(operation, kind);
            if matches!(kind, ErrorKind::Internal | ErrorKind::DependencyUnavailable) {
                error!(request_id = %request_id, operation, error = %err, "operation failed");
            } else {
                warn!(request_id = %request_id, operation, error = %err, kind = %kind, "operation rejected");
            }
            Err(from_lib_error(&err, request_id.as_str()))
        }
        Err(join) => {
            error!(request_id = %request_id, operation, error = %join, "blocking task did not complete");
            Err(ProblemDetails::internal_error(
                "operation was aborted",
                request_id.as_str(),
            ))
        }
    }
}

/// Decode and validate a JSON body.
pub(crate) fn json_body<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
    request_id: &RequestId,
) -> Result<T, ProblemDetails> {
    let Json(body) = body
        .map_err(|rejection| ProblemDetails::bad_request(rejection.body_text(), request_id.as_str()))?;
    body.validate(request_id.as_str()).map_err(|problem| *problem)?;
    Ok(body)
}

/// Decode a numeric path id.
pub(crate) fn path_id(
    id: Result<Path<i64>, PathRejection>,
    request_id: &RequestId,
) -> Result<i64, ProblemDetails> {
    id.map(|Path(id)| id)
        .map_err(|rejection| ProblemDetails::bad_request(rejection.body_text(), request_id.as_str()))
}

/// Decode a query string.
pub(crate) fn query<T>(
    query: Result<Query<T>, QueryRejection>,
    request_id: &RequestId,
) -> Result<T, ProblemDetails> {
    query
        .map(|Query(query)| query)
        .map_err(|rejection| ProblemDetails::bad_request(rejection.body_text(), request_id.as_str()))
}
