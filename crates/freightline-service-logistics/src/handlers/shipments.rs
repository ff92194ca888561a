//! Shipment ("solicitud") endpoints.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use tracing::debug;

use freightline_lib::{
    EstimateRequest, NewShipment, PendingShipment, RouteAssignment, RouteEstimate, Shipment,
    ShipmentState, TrackingReport,
};
use freightline_service_shared::{
    record_estimated_cost, record_shipment_transition, AppState, CreateShipmentRequest,
    EstimateRouteRequest, PendingQuery, ProblemDetails, RequestId, ServiceResponse, ShipmentQuery,
};

use super::{blocking, json_body, path_id, query, ApiResult};

/// `POST /shipments`
pub async fn create_shipment(
    request_id: RequestId,
    State(state): State<AppState>,
    body: Result<Json<CreateShipmentRequest>, JsonRejection>,
) -> ApiResult<Shipment> {
    let new: NewShipment = json_body(body, &request_id)?.into();
    let shipment = blocking(&state, &request_id, "create_shipment", move |s| {
        s.shipments().create(&new)
    })
    .await?;

    record_shipment_transition(ShipmentState::Draft);
    debug!(
        request_id = %request_id,
        shipment_id = shipment.id,
        tracking_code = %shipment.tracking_code,
        "shipment created"
    );
    Ok(ServiceResponse::created(shipment))
}

/// `GET /shipments`
pub async fn list_shipments(
    request_id: RequestId,
    State(state): State<AppState>,
    params: Result<Query<ShipmentQuery>, QueryRejection>,
) -> ApiResult<Vec<Shipment>> {
    let filter = query(params, &request_id)?
        .into_filter(request_id.as_str())
        .map_err(|problem| *problem)?;
    let shipments = blocking(&state, &request_id, "list_shipments", move |s| {
        s.shipments().list(&filter)
    })
    .await?;
    Ok(ServiceResponse::new(shipments))
}

/// `GET /shipments/pending`
pub async fn pending_shipments(
    request_id: RequestId,
    State(state): State<AppState>,
    params: Result<Query<PendingQuery>, QueryRejection>,
) -> ApiResult<Vec<PendingShipment>> {
    let params = query(params, &request_id)?;
    let pending = blocking(&state, &request_id, "pending_shipments", move |s| {
        s.shipments()
            .pending(params.state.as_deref(), params.container_id)
    })
    .await?;
    Ok(ServiceResponse::new(pending))
}

/// `GET /shipments/{id}`
pub async fn get_shipment(
    request_id: RequestId,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Shipment> {
    let id = path_id(id, &request_id)?;
    let shipment = blocking(&state, &request_id, "get_shipment", move |s| {
        s.shipments().get(id)
    })
    .await?;
    Ok(ServiceResponse::new(shipment))
}

/// `DELETE /shipments/{id}`. Administrative; removes the route and legs too.
pub async fn delete_shipment(
    request_id: RequestId,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ProblemDetails> {
    let id = path_id(id, &request_id)?;
    blocking(&state, &request_id, "delete_shipment", move |s| {
        s.shipments().delete(id)
    })
    .await?;
    debug!(request_id = %request_id, shipment_id = id, "shipment deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /shipments/estimate`
pub async fn estimate_route(
    request_id: RequestId,
    State(state): State<AppState>,
    body: Result<Json<EstimateRouteRequest>, JsonRejection>,
) -> ApiResult<RouteEstimate> {
    let request: EstimateRequest = json_body(body, &request_id)?.into();
    let estimate = blocking(&state, &request_id, "estimate_route", move |s| {
        s.shipments().estimate_route(&request)
    })
    .await?;
    Ok(ServiceResponse::new(estimate))
}

/// `POST /shipments/{id}/route`
pub async fn assign_route(
    request_id: RequestId,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<RouteAssignment> {
    let id = path_id(id, &request_id)?;
    let assignment = blocking(&state, &request_id, "assign_route", move |s| {
        s.shipments().assign_route(id)
    })
    .await?;

    record_shipment_transition(ShipmentState::Scheduled);
    if let Some(cost) = assignment.shipment.estimated_cost {
        record_estimated_cost(cost);
    }
    debug!(
        request_id = %request_id,
        shipment_id = id,
        route_id = assignment.route.id,
        legs = assignment.legs.len(),
        "route assigned"
    );
    Ok(ServiceResponse::new(assignment))
}

/// `POST /shipments/{id}/cancel`
pub async fn cancel_shipment(
    request_id: RequestId,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Shipment> {
    let id = path_id(id, &request_id)?;
    let shipment = blocking(&state, &request_id, "cancel_shipment", move |s| {
        s.shipments().cancel(id)
    })
    .await?;
    record_shipment_transition(ShipmentState::Cancelled);
    Ok(ServiceResponse::new(shipment))
}

/// `POST /shipments/{id}/finalize`
///
/// Normally finalization happens when the last leg finishes; this lets an
/// operator re-drive it. Repeated calls leave a delivered shipment untouched.
pub async fn finalize_shipment(
    request_id: RequestId,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Shipment> {
    let id = path_id(id, &request_id)?;
    let (before, shipment) = blocking(&state, &request_id, "finalize_shipment", move |s| {
        let before = s.shipments().get(id)?.state;
        Ok((before, s.shipments().finalize(id)?))
    })
    .await?;
    if before != shipment.state {
        record_shipment_transition(shipment.state);
    }
    Ok(ServiceResponse::new(shipment))
}

/// `GET /shipments/{id}/tracking`
pub async fn shipment_tracking(
    request_id: RequestId,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<TrackingReport> {
    let id = path_id(id, &request_id)?;
    let report = blocking(&state, &request_id, "shipment_tracking", move |s| {
        s.shipments().tracking(id)
    })
    .await?;
    Ok(ServiceResponse::new(report))
}
