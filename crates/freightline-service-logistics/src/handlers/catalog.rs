//! Read-only helpers: container status, deposits on a route, tariff quotes.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path, State};

use freightline_lib::{ContainerStatus, Deposit, Quote, QuoteInput};
use freightline_service_shared::{
    AppState, OnRouteRequest, QuoteRequest, RequestId, ServiceResponse,
};

use super::{blocking, json_body, path_id, ApiResult};

/// `GET /containers/{id}/status`
pub async fn container_status(
    request_id: RequestId,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<ContainerStatus> {
    let id = path_id(id, &request_id)?;
    let status = blocking(&state, &request_id, "container_status", move |s| {
        s.shipments().container_status(id)
    })
    .await?;
    Ok(ServiceResponse::new(status))
}

/// `POST /deposits/on-route`
pub async fn deposits_on_route(
    request_id: RequestId,
    State(state): State<AppState>,
    body: Result<Json<OnRouteRequest>, JsonRejection>,
) -> ApiResult<Vec<Deposit>> {
    let request = json_body(body, &request_id)?;
    let deposits = blocking(&state, &request_id, "deposits_on_route", move |s| {
        s.shipments()
            .deposits_on_route(&request.origin, &request.destination)
    })
    .await?;
    Ok(ServiceResponse::new(deposits))
}

/// `POST /tariffs/quote`. Pure arithmetic, so it stays on the async worker.
pub async fn tariff_quote(
    request_id: RequestId,
    State(state): State<AppState>,
    body: Result<Json<QuoteRequest>, JsonRejection>,
) -> ApiResult<Quote> {
    let input: QuoteInput = json_body(body, &request_id)?.into();
    Ok(ServiceResponse::new(state.tariff().quote(&input)))
}
