//! Shipment, route, and leg records plus their lifecycle states.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geo::Coordinates;

pub type ShipmentId = i64;
pub type RouteId = i64;
pub type LegId = i64;

/// Lifecycle of a shipment.
///
/// `IN_TRANSIT` is never stored; it is derived from the legs when building
/// location views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentState {
    Draft,
    Scheduled,
    Delivered,
    Cancelled,
}

impl ShipmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentState::Draft => "DRAFT",
            ShipmentState::Scheduled => "SCHEDULED",
            ShipmentState::Delivered => "DELIVERED",
            ShipmentState::Cancelled => "CANCELLED",
        }
    }

    /// Terminal shipments no longer show up in pending views.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentState::Delivered | ShipmentState::Cancelled)
    }
}

/// Lifecycle of a leg. Transitions are strictly linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegState {
    Estimated,
    Assigned,
    Started,
    Finished,
}

impl LegState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegState::Estimated => "ESTIMATED",
            LegState::Assigned => "ASSIGNED",
            LegState::Started => "STARTED",
            LegState::Finished => "FINISHED",
        }
    }
}

macro_rules! state_label_impls {
    ($ty:ident, $name:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            /// Labels are matched case-insensitively.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($ty::$variant.as_str()) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(Error::invalid_input(format!("unknown {} '{}'", $name, s)))
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let label = value.as_str()?;
                label
                    .parse()
                    .map_err(|err: Error| FromSqlError::Other(Box::new(err)))
            }
        }
    };
}

state_label_impls!(ShipmentState, "shipment state", [Draft, Scheduled, Delivered, Cancelled]);
state_label_impls!(LegState, "leg state", [Estimated, Assigned, Started, Finished]);

/// A free-text address with optional coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl Place {
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            coordinates: None,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some(Coordinates::new(latitude, longitude));
        self
    }
}

/// One request to move one container from an origin to a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub tracking_code: String,
    pub container_id: i64,
    pub customer_id: i64,
    pub origin: Place,
    pub destination: Place,
    pub state: ShipmentState,
    pub estimated_cost: Option<f64>,
    pub estimated_hours: Option<f64>,
    pub final_cost: Option<f64>,
    pub final_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Fields a client supplies when opening a shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShipment {
    pub tracking_code: String,
    pub container_id: i64,
    pub customer_id: i64,
    pub origin: Place,
    pub destination: Place,
}

/// The planned path for one shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub shipment_id: ShipmentId,
    pub created_at: DateTime<Utc>,
}

/// One truck-operated segment of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub id: LegId,
    pub route_id: RouteId,
    /// Position of the leg within its route, starting at 1.
    pub sequence: i64,
    pub truck_id: Option<String>,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub state: LegState,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub real_cost: Option<f64>,
}

impl Leg {
    /// Hours between actual start and end, when both are known.
    pub fn actual_hours(&self) -> Option<f64> {
        match (self.actual_start, self.actual_end) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 3_600_000.0),
            _ => None,
        }
    }
}

/// Fields needed to append a leg to an existing route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLeg {
    pub route_id: RouteId,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    #[serde(default)]
    pub planned_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub planned_end: Option<DateTime<Utc>>,
}

/// Optional filters for shipment listings. Empty filters match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentFilter {
    pub customer_id: Option<i64>,
    pub container_id: Option<i64>,
    pub state: Option<ShipmentState>,
    pub tracking_code: Option<String>,
}

/// Optional filters for leg listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegFilter {
    pub route_id: Option<RouteId>,
    pub truck_id: Option<String>,
    pub state: Option<LegState>,
}
