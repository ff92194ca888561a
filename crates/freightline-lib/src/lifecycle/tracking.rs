//! Read-side views derived from a shipment and its legs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Leg, LegId, LegState, Route, Shipment, ShipmentId, ShipmentState};

/// Where a shipment's container currently is, derived from its legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationTag {
    Origin,
    InDepot,
    InTransit,
    PendingAssignment,
    NoActiveRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentLocation {
    pub tag: LocationTag,
    pub description: String,
}

/// The leg that best describes a shipment's present position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentLeg {
    pub leg_id: LegId,
    pub origin: String,
    pub destination: String,
    pub state: LegState,
    pub truck_id: Option<String>,
}

impl From<&Leg> for CurrentLeg {
    fn from(leg: &Leg) -> Self {
        Self {
            leg_id: leg.id,
            origin: leg.origin.clone(),
            destination: leg.destination.clone(),
            state: leg.state,
            truck_id: leg.truck_id.clone(),
        }
    }
}

/// A non-terminal shipment together with its derived location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingShipment {
    pub shipment: Shipment,
    pub location: CurrentLocation,
    pub current_leg: Option<CurrentLeg>,
}

/// Active shipment for a container, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub container_id: i64,
    pub shipment_id: Option<ShipmentId>,
    pub tracking_code: Option<String>,
    pub state: Option<ShipmentState>,
    pub location: CurrentLocation,
    pub current_leg: Option<CurrentLeg>,
}

impl ContainerStatus {
    pub(crate) fn idle(container_id: i64) -> Self {
        Self {
            container_id,
            shipment_id: None,
            tracking_code: None,
            state: None,
            location: CurrentLocation {
                tag: LocationTag::NoActiveRequest,
                description: format!("No active shipment for container {container_id}"),
            },
            current_leg: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingEventKind {
    ShipmentCreated,
    RouteAssigned,
    LegStarted,
    LegFinished,
    ShipmentDelivered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub at: DateTime<Utc>,
    pub kind: TrackingEventKind,
    pub state: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg_id: Option<LegId>,
}

/// Chronological history of a shipment ("seguimiento").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingReport {
    pub shipment_id: ShipmentId,
    pub tracking_code: String,
    pub state: ShipmentState,
    pub estimated_cost: Option<f64>,
    pub estimated_hours: Option<f64>,
    pub final_cost: Option<f64>,
    pub final_hours: Option<f64>,
    pub events: Vec<TrackingEvent>,
}

/// Derive the location tag and current leg from a shipment's legs.
///
/// Legs are expected in route order.
pub(crate) fn locate(shipment: &Shipment, legs: &[Leg]) -> (CurrentLocation, Option<CurrentLeg>) {
    if legs.is_empty() {
        return (
            CurrentLocation {
                tag: LocationTag::Origin,
                description: format!("At origin: {}", shipment.origin.address),
            },
            None,
        );
    }

    if let Some(leg) = legs.iter().find(|l| l.state == LegState::Started) {
        return (
            CurrentLocation {
                tag: LocationTag::InTransit,
                description: format!("In transit from {} to {}", leg.origin, leg.destination),
            },
            Some(leg.into()),
        );
    }

    if let Some(leg) = legs.iter().find(|l| l.state == LegState::Assigned) {
        return (
            CurrentLocation {
                tag: LocationTag::InDepot,
                description: format!("At depot: {}", leg.origin),
            },
            Some(leg.into()),
        );
    }

    if let Some(last) = legs.iter().rev().find(|l| l.state == LegState::Finished) {
        let next = legs.iter().find(|l| l.state != LegState::Finished).unwrap_or(last);
        return (
            CurrentLocation {
                tag: LocationTag::InDepot,
                description: format!("At depot: {}", last.destination),
            },
            Some(next.into()),
        );
    }

    (
        CurrentLocation {
            tag: LocationTag::PendingAssignment,
            description: "Awaiting truck assignment".to_string(),
        },
        legs.first().map(CurrentLeg::from),
    )
}

/// Rebuild the event history from stored timestamps, oldest first.
pub(crate) fn build_events(
    shipment: &Shipment,
    route: Option<&Route>,
    legs: &[Leg],
) -> Vec<TrackingEvent> {
    let mut events = vec![TrackingEvent {
        at: shipment.created_at,
        kind: TrackingEventKind::ShipmentCreated,
        state: ShipmentState::Draft.to_string(),
        description: format!("Shipment {} created", shipment.tracking_code),
        leg_id: None,
    }];

    if let Some(route) = route {
        let plural = if legs.len() == 1 { "" } else { "s" };
        events.push(TrackingEvent {
            at: shipment.scheduled_at.unwrap_or(route.created_at),
            kind: TrackingEventKind::RouteAssigned,
            state: ShipmentState::Scheduled.to_string(),
            description: format!("Route computed with {} leg{plural}", legs.len()),
            leg_id: None,
        });
    }

    for leg in legs {
        if let Some(at) = leg.actual_start {
            events.push(TrackingEvent {
                at,
                kind: TrackingEventKind::LegStarted,
                state: "IN_TRANSIT".to_string(),
                description: format!(
                    "Leg {} started: {} to {}",
                    leg.sequence, leg.origin, leg.destination
                ),
                leg_id: Some(leg.id),
            });
        }
        if let Some(at) = leg.actual_end {
            events.push(TrackingEvent {
                at,
                kind: TrackingEventKind::LegFinished,
                state: LegState::Finished.to_string(),
                description: format!("Leg {} finished at {}", leg.sequence, leg.destination),
                leg_id: Some(leg.id),
            });
        }
    }

    if let Some(at) = shipment.delivered_at {
        events.push(TrackingEvent {
            at,
            kind: TrackingEventKind::ShipmentDelivered,
            state: ShipmentState::Delivered.to_string(),
            description: "Shipment delivered".to_string(),
            leg_id: None,
        });
    }

    // Stable sort keeps causal order for events sharing a timestamp.
    events.sort_by_key(|e| e.at);
    events
}
