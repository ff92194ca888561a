//! Leg ("tramo") endpoints.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use tracing::debug;

use freightline_lib::{FinishLeg, Leg, LegFinish, LegState, NewLeg, ShipmentState};
use freightline_service_shared::{
    record_leg_transition, record_shipment_transition, AppState, AssignTruckRequest,
    CreateLegRequest, FinishLegRequest, LegQuery, RequestId, ServiceResponse,
};

use super::{blocking, json_body, path_id, query, ApiResult};

/// `POST /legs`
pub async fn create_leg(
    request_id: RequestId,
    State(state): State<AppState>,
    body: Result<Json<CreateLegRequest>, JsonRejection>,
) -> ApiResult<Leg> {
    let new: NewLeg = json_body(body, &request_id)?.into();
    let leg = blocking(&state, &request_id, "create_leg", move |s| {
        s.legs().create_leg(&new)
    })
    .await?;
    record_leg_transition(LegState::Estimated);
    debug!(request_id = %request_id, leg_id = leg.id, route_id = leg.route_id, "leg created");
    Ok(ServiceResponse::created(leg))
}

/// `GET /legs`
pub async fn list_legs(
    request_id: RequestId,
    State(state): State<AppState>,
    params: Result<Query<LegQuery>, QueryRejection>,
) -> ApiResult<Vec<Leg>> {
    let filter = query(params, &request_id)?
        .into_filter(request_id.as_str())
        .map_err(|problem| *problem)?;
    let legs = blocking(&state, &request_id, "list_legs", move |s| {
        s.legs().list(&filter)
    })
    .await?;
    Ok(ServiceResponse::new(legs))
}

/// `GET /legs/{id}`
pub async fn get_leg(
    request_id: RequestId,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Leg> {
    let id = path_id(id, &request_id)?;
    let leg = blocking(&state, &request_id, "get_leg", move |s| s.legs().get(id)).await?;
    Ok(ServiceResponse::new(leg))
}

/// `POST /legs/{id}/assign`
pub async fn assign_truck(
    request_id: RequestId,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<AssignTruckRequest>, JsonRejection>,
) -> ApiResult<Leg> {
    let id = path_id(id, &request_id)?;
    let request = json_body(body, &request_id)?;
    let leg = blocking(&state, &request_id, "assign_truck", move |s| {
        s.legs()
            .assign_truck(id, request.truck_id.trim(), request.weight_kg, request.volume_m3)
    })
    .await?;
    record_leg_transition(LegState::Assigned);
    Ok(ServiceResponse::new(leg))
}

/// `POST /legs/{id}/start`
pub async fn start_leg(
    request_id: RequestId,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Leg> {
    let id = path_id(id, &request_id)?;
    let leg = blocking(&state, &request_id, "start_leg", move |s| s.legs().start(id)).await?;
    record_leg_transition(LegState::Started);
    Ok(ServiceResponse::new(leg))
}

/// `POST /legs/{id}/finish`. Carries the delivered shipment when this was the last open leg.
pub async fn finish_leg(
    request_id: RequestId,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<FinishLegRequest>, JsonRejection>,
) -> ApiResult<LegFinish> {
    let id = path_id(id, &request_id)?;
    let report: FinishLeg = json_body(body, &request_id)?.into();
    let finished = blocking(&state, &request_id, "finish_leg", move |s| {
        s.legs().finish(id, &report)
    })
    .await?;

    record_leg_transition(LegState::Finished);
    if let Some(shipment) = &finished.delivered_shipment {
        record_shipment_transition(ShipmentState::Delivered);
        debug!(
            request_id = %request_id,
            shipment_id = shipment.id,
            final_cost = shipment.final_cost,
            "last leg finished; shipment delivered"
        );
    }
    Ok(ServiceResponse::new(finished))
}
