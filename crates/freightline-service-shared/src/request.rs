//! Request bodies and query strings accepted by the logistics endpoints.
//!
//! Validation here only rejects what is malformed on its face. State and
//! business rule checks stay in `freightline-lib`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freightline_lib::{
    Coordinates, EstimateRequest, FinishLeg, LegFilter, NewLeg, NewShipment, Place, QuoteInput,
    RouteId, ShipmentFilter, StorageStay, TruckFigures,
};

use crate::ProblemDetails;

/// Validation trait for request types.
///
/// Returns a boxed `ProblemDetails` to avoid large `Result::Err` variants.
pub trait Validate {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

fn bad_request(detail: String, request_id: &str) -> Box<ProblemDetails> {
    Box::new(ProblemDetails::bad_request(detail, request_id))
}

fn require_text(field: &str, value: &str, request_id: &str) -> Result<(), Box<ProblemDetails>> {
    if value.trim().is_empty() {
        return Err(bad_request(
            format!("The '{field}' field is required and cannot be empty"),
            request_id,
        ));
    }
    Ok(())
}

fn require_non_negative(
    field: &str,
    value: f64,
    request_id: &str,
) -> Result<(), Box<ProblemDetails>> {
    if !value.is_finite() || value < 0.0 {
        return Err(bad_request(
            format!("The '{field}' field must be a non-negative number"),
            request_id,
        ));
    }
    Ok(())
}

fn require_coordinates(
    field: &str,
    point: &Coordinates,
    request_id: &str,
) -> Result<(), Box<ProblemDetails>> {
    let valid = (-90.0..=90.0).contains(&point.latitude)
        && (-180.0..=180.0).contains(&point.longitude);
    if !valid {
        return Err(bad_request(
            format!("The '{field}' coordinates are outside the valid latitude/longitude range"),
            request_id,
        ));
    }
    Ok(())
}

fn require_place(field: &str, place: &Place, request_id: &str) -> Result<(), Box<ProblemDetails>> {
    require_text(field, &place.address, request_id)?;
    if let Some(point) = &place.coordinates {
        require_coordinates(field, point, request_id)?;
    }
    Ok(())
}

/// Body of `POST /shipments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShipmentRequest {
    pub tracking_code: String,
    pub container_id: i64,
    pub customer_id: i64,
    pub origin: Place,
    pub destination: Place,
}

impl Validate for CreateShipmentRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_text("tracking_code", &self.tracking_code, request_id)?;
        require_place("origin", &self.origin, request_id)?;
        require_place("destination", &self.destination, request_id)
    }
}

impl From<CreateShipmentRequest> for NewShipment {
    fn from(request: CreateShipmentRequest) -> Self {
        NewShipment {
            tracking_code: request.tracking_code.trim().to_string(),
            container_id: request.container_id,
            customer_id: request.customer_id,
            origin: request.origin,
            destination: request.destination,
        }
    }
}

/// Body of `POST /shipments/estimate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateRouteRequest {
    pub origin: Place,
    pub destination: Place,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_m3: Option<f64>,
}

impl Validate for EstimateRouteRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_place("origin", &self.origin, request_id)?;
        require_place("destination", &self.destination, request_id)?;
        if let Some(weight) = self.weight_kg {
            require_non_negative("weight_kg", weight, request_id)?;
        }
        if let Some(volume) = self.volume_m3 {
            require_non_negative("volume_m3", volume, request_id)?;
        }
        Ok(())
    }
}

impl From<EstimateRouteRequest> for EstimateRequest {
    fn from(request: EstimateRouteRequest) -> Self {
        EstimateRequest {
            origin: request.origin,
            destination: request.destination,
            weight_kg: request.weight_kg,
            volume_m3: request.volume_m3,
        }
    }
}

/// Body of `POST /legs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLegRequest {
    pub route_id: RouteId,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_end: Option<DateTime<Utc>>,
}

impl Validate for CreateLegRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_text("origin", &self.origin, request_id)?;
        require_text("destination", &self.destination, request_id)?;
        require_non_negative("distance_km", self.distance_km, request_id)?;
        if let (Some(start), Some(end)) = (self.planned_start, self.planned_end) {
            if end < start {
                return Err(bad_request(
                    "The 'planned_end' field must not precede 'planned_start'".to_string(),
                    request_id,
                ));
            }
        }
        Ok(())
    }
}

impl From<CreateLegRequest> for NewLeg {
    fn from(request: CreateLegRequest) -> Self {
        NewLeg {
            route_id: request.route_id,
            origin: request.origin,
            destination: request.destination,
            distance_km: request.distance_km,
            planned_start: request.planned_start,
            planned_end: request.planned_end,
        }
    }
}

/// Body of `POST /legs/{id}/assign`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignTruckRequest {
    pub truck_id: String,
    pub weight_kg: f64,
    pub volume_m3: f64,
}

impl Validate for AssignTruckRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_text("truck_id", &self.truck_id, request_id)?;
        require_non_negative("weight_kg", self.weight_kg, request_id)?;
        require_non_negative("volume_m3", self.volume_m3, request_id)
    }
}

/// Body of `POST /legs/{id}/finish`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishLegRequest {
    pub real_distance_km: f64,
    pub truck_rate_per_km: f64,
    pub truck_consumption: f64,
}

impl Validate for FinishLegRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_non_negative("real_distance_km", self.real_distance_km, request_id)?;
        require_non_negative("truck_rate_per_km", self.truck_rate_per_km, request_id)?;
        require_non_negative("truck_consumption", self.truck_consumption, request_id)
    }
}

impl From<FinishLegRequest> for FinishLeg {
    fn from(request: FinishLegRequest) -> Self {
        FinishLeg {
            real_distance_km: request.real_distance_km,
            truck_rate_per_km: request.truck_rate_per_km,
            truck_consumption: request.truck_consumption,
        }
    }
}

/// Body of `POST /deposits/on-route`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnRouteRequest {
    pub origin: Coordinates,
    pub destination: Coordinates,
}

impl Validate for OnRouteRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_coordinates("origin", &self.origin, request_id)?;
        require_coordinates("destination", &self.destination, request_id)
    }
}

/// Body of `POST /tariffs/quote`.
///
/// Without truck figures only the estimated leg cost is quoted; with both
/// `truck_rate_per_km` and `truck_consumption` the real cost is quoted too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub distance_km: f64,
    /// Average fleet consumption in litres per km. Falls back to the tariff's assumption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_consumption: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truck_rate_per_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truck_consumption: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_rate_per_day: Option<f64>,
}

impl Validate for QuoteRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_non_negative("distance_km", self.distance_km, request_id)?;
        let optional = [
            ("average_consumption", self.average_consumption),
            ("truck_rate_per_km", self.truck_rate_per_km),
            ("truck_consumption", self.truck_consumption),
            ("storage_days", self.storage_days),
            ("storage_rate_per_day", self.storage_rate_per_day),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                require_non_negative(field, value, request_id)?;
            }
        }
        let pairs = [
            (
                "truck_rate_per_km",
                "truck_consumption",
                self.truck_rate_per_km.is_some(),
                self.truck_consumption.is_some(),
            ),
            (
                "storage_days",
                "storage_rate_per_day",
                self.storage_days.is_some(),
                self.storage_rate_per_day.is_some(),
            ),
        ];
        for (first, second, has_first, has_second) in pairs {
            if has_first != has_second {
                return Err(bad_request(
                    format!("'{first}' and '{second}' must be given together"),
                    request_id,
                ));
            }
        }
        Ok(())
    }
}

impl From<QuoteRequest> for QuoteInput {
    fn from(request: QuoteRequest) -> Self {
        QuoteInput {
            distance_km: request.distance_km,
            average_consumption: request.average_consumption,
            truck: request
                .truck_rate_per_km
                .zip(request.truck_consumption)
                .map(|(rate_per_km, consumption)| TruckFigures {
                    rate_per_km,
                    consumption,
                }),
            storage: request
                .storage_days
                .zip(request.storage_rate_per_day)
                .map(|(days, rate_per_day)| StorageStay { days, rate_per_day }),
        }
    }
}

/// Query string of `GET /shipments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentQuery {
    pub customer_id: Option<i64>,
    pub container_id: Option<i64>,
    pub state: Option<String>,
    pub tracking_code: Option<String>,
}

impl ShipmentQuery {
    /// Resolve the query into a library filter, rejecting unknown state labels.
    pub fn into_filter(self, request_id: &str) -> Result<ShipmentFilter, Box<ProblemDetails>> {
        let state = self
            .state
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|err: freightline_lib::Error| bad_request(err.to_string(), request_id))?;
        Ok(ShipmentFilter {
            customer_id: self.customer_id,
            container_id: self.container_id,
            state,
            tracking_code: self.tracking_code,
        })
    }
}

/// Query string of `GET /shipments/pending`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingQuery {
    pub state: Option<String>,
    pub container_id: Option<i64>,
}

/// Query string of `GET /legs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegQuery {
    pub route_id: Option<RouteId>,
    pub truck_id: Option<String>,
    pub state: Option<String>,
}

impl LegQuery {
    pub fn into_filter(self, request_id: &str) -> Result<LegFilter, Box<ProblemDetails>> {
        let state = self
            .state
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|err: freightline_lib::Error| bad_request(err.to_string(), request_id))?;
        Ok(LegFilter {
            route_id: self.route_id,
            truck_id: self.truck_id,
            state,
        })
    }
}
