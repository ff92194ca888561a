use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::tracking::{self, ContainerStatus, PendingShipment, TrackingReport};
use super::Collaborators;
use crate::clients::NewCustomer;
use crate::db::Store;
use crate::distance::{DistanceEstimate, Location};
use crate::error::{BusinessRuleViolation, Error, Result};
use crate::geo::{self, Coordinates, Deposit, DEFAULT_DETOUR_MARGIN};
use crate::model::{
    Leg, LegState, NewLeg, NewShipment, Place, Route, Shipment, ShipmentFilter, ShipmentId,
    ShipmentState,
};
use crate::repo;
use crate::tariff::TariffEngine;

/// Inputs for a route estimate that does not touch any shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub origin: Place,
    pub destination: Place,
    /// When both load figures are given, consumption is averaged over eligible trucks.
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub volume_m3: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegEstimate {
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub estimated_cost: f64,
    pub estimated_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub duration_hours: f64,
    pub average_consumption: f64,
    pub estimated_cost: f64,
    pub estimated_hours: f64,
    pub legs: Vec<LegEstimate>,
}

/// Outcome of a successful route assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAssignment {
    pub shipment: Shipment,
    pub route: Route,
    pub legs: Vec<Leg>,
}

struct Plan {
    distance: DistanceEstimate,
    estimated_cost: f64,
    estimated_hours: f64,
}

/// Owns the shipment state machine.
#[derive(Clone)]
pub struct ShipmentManager {
    store: Arc<Store>,
    collaborators: Collaborators,
    tariff: TariffEngine,
    deposit_margin: f64,
}

impl ShipmentManager {
    pub fn new(store: Arc<Store>, collaborators: Collaborators, tariff: TariffEngine) -> Self {
        Self {
            store,
            collaborators,
            tariff,
            deposit_margin: DEFAULT_DETOUR_MARGIN,
        }
    }

    #[must_use]
    pub fn with_deposit_margin(mut self, margin: f64) -> Self {
        self.deposit_margin = margin;
        self
    }

    pub fn tariff(&self) -> &TariffEngine {
        &self.tariff
    }

    /// Open a shipment in `DRAFT`.
    pub fn create(&self, new: &NewShipment) -> Result<Shipment> {
        if new.tracking_code.trim().is_empty() {
            return Err(Error::invalid_input("tracking_code must not be blank"));
        }
        if new.origin.address.trim().is_empty() || new.destination.address.trim().is_empty() {
            return Err(Error::invalid_input("origin and destination addresses are required"));
        }

        let shipment = self
            .store
            .write(|tx| repo::insert_shipment(tx, new, Utc::now()))?;
        info!(
            shipment_id = shipment.id,
            tracking_code = %shipment.tracking_code,
            "shipment created"
        );
        Ok(shipment)
    }

    pub fn get(&self, id: ShipmentId) -> Result<Shipment> {
        self.store.read(|conn| repo::require_shipment(conn, id))
    }

    pub fn by_tracking_code(&self, code: &str) -> Result<Shipment> {
        let filter = ShipmentFilter {
            tracking_code: Some(code.to_string()),
            ..ShipmentFilter::default()
        };
        self.list(&filter)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("shipment", code))
    }

    pub fn list(&self, filter: &ShipmentFilter) -> Result<Vec<Shipment>> {
        let shipments = self.store.read(|conn| repo::list_shipments(conn, filter))?;
        debug!(count = shipments.len(), "listed shipments");
        Ok(shipments)
    }

    /// Price a trip without persisting anything.
    pub fn estimate_route(&self, request: &EstimateRequest) -> Result<RouteEstimate> {
        let consumption = match (request.weight_kg, request.volume_m3) {
            (Some(weight), Some(volume)) => {
                let trucks = self.collaborators.fleet.eligible_trucks(weight, volume)?;
                let values: Vec<f64> = trucks.iter().map(|t| t.consumption_l_per_km).collect();
                TariffEngine::average_consumption(&values)
            }
            _ => self.tariff.config().assumed_consumption,
        };

        let plan = self.plan(&request.origin, &request.destination, consumption)?;
        Ok(RouteEstimate {
            distance_km: plan.distance.distance_km,
            duration_hours: plan.distance.duration_hours,
            average_consumption: consumption,
            estimated_cost: plan.estimated_cost,
            estimated_hours: plan.estimated_hours,
            legs: vec![LegEstimate {
                origin: plan.distance.origin_label.clone(),
                destination: plan.distance.destination_label.clone(),
                distance_km: plan.distance.distance_km,
                estimated_cost: plan.estimated_cost,
                estimated_hours: plan.estimated_hours,
            }],
        })
    }

    /// `DRAFT → SCHEDULED`: compute the trip, persist one route with one leg.
    ///
    /// Collaborators are consulted before the store is locked; the `DRAFT`
    /// precondition is checked again inside the write transaction.
    pub fn assign_route(&self, id: ShipmentId) -> Result<RouteAssignment> {
        let shipment = self.get(id)?;
        ensure_state(&shipment, ShipmentState::Draft, "assign a route to")?;

        self.ensure_customer(shipment.customer_id)?;
        if self
            .collaborators
            .containers
            .find_container(shipment.container_id)?
            .is_none()
        {
            warn!(shipment_id = id, container_id = shipment.container_id, "container missing");
            return Err(BusinessRuleViolation::ContainerNotFound {
                container_id: shipment.container_id,
            }
            .into());
        }

        let plan = self.plan(
            &shipment.origin,
            &shipment.destination,
            self.tariff.config().assumed_consumption,
        )?;

        let assignment = self.store.write(|tx| {
            let current = repo::require_shipment(tx, id)?;
            ensure_state(&current, ShipmentState::Draft, "assign a route to")?;

            let now = Utc::now();
            let (planned_start, planned_end) = schedule(now, plan.estimated_hours)?;

            let route = repo::insert_route(tx, id, now)?;
            let leg = repo::insert_leg(
                tx,
                &NewLeg {
                    route_id: route.id,
                    origin: plan.distance.origin_label.clone(),
                    destination: plan.distance.destination_label.clone(),
                    distance_km: plan.distance.distance_km,
                    planned_start: Some(planned_start),
                    planned_end: Some(planned_end),
                },
            )?;
            repo::schedule_shipment(tx, id, plan.estimated_cost, plan.estimated_hours, now)?;

            Ok(RouteAssignment {
                shipment: repo::require_shipment(tx, id)?,
                route,
                legs: vec![leg],
            })
        })?;

        info!(
            shipment_id = id,
            route_id = assignment.route.id,
            distance_km = plan.distance.distance_km,
            estimated_cost = plan.estimated_cost,
            "shipment scheduled"
        );
        Ok(assignment)
    }

    /// `DRAFT | SCHEDULED → CANCELLED`.
    pub fn cancel(&self, id: ShipmentId) -> Result<Shipment> {
        let shipment = self.store.write(|tx| {
            let shipment = repo::require_shipment(tx, id)?;
            if !matches!(shipment.state, ShipmentState::Draft | ShipmentState::Scheduled) {
                return Err(Error::invalid_state("shipment", id, shipment.state, "cancel"));
            }
            repo::set_shipment_state(tx, id, ShipmentState::Cancelled)?;
            repo::require_shipment(tx, id)
        })?;
        info!(shipment_id = id, "shipment cancelled");
        Ok(shipment)
    }

    /// Administrative delete; removes the route and legs as well.
    pub fn delete(&self, id: ShipmentId) -> Result<()> {
        let deleted = self.store.write(|tx| repo::delete_shipment(tx, id))?;
        if !deleted {
            return Err(Error::not_found("shipment", id));
        }
        info!(shipment_id = id, "shipment deleted");
        Ok(())
    }

    /// `SCHEDULED → DELIVERED` once every leg is finished. A no-op in any other state.
    pub fn finalize(&self, id: ShipmentId) -> Result<Shipment> {
        self.store.write(|tx| match finalize_within(tx, id, Utc::now())? {
            Some(delivered) => Ok(delivered),
            None => repo::require_shipment(tx, id),
        })
    }

    /// Non-terminal shipments with their derived location.
    pub fn pending(
        &self,
        state: Option<&str>,
        container_id: Option<i64>,
    ) -> Result<Vec<PendingShipment>> {
        let state = state.map(str::parse::<ShipmentState>).transpose()?;
        let filter = ShipmentFilter {
            container_id,
            state,
            ..ShipmentFilter::default()
        };

        self.store.read(|conn| {
            repo::list_shipments(conn, &filter)?
                .into_iter()
                .filter(|s| !s.state.is_terminal())
                .map(|shipment| -> Result<PendingShipment> {
                    let (_, legs) = route_and_legs(conn, shipment.id)?;
                    let (location, current_leg) = tracking::locate(&shipment, &legs);
                    Ok(PendingShipment {
                        shipment,
                        location,
                        current_leg,
                    })
                })
                .collect()
        })
    }

    /// Where a container is, judged by its most recent active shipment.
    pub fn container_status(&self, container_id: i64) -> Result<ContainerStatus> {
        let active = self
            .pending(None, Some(container_id))?
            .into_iter()
            .max_by_key(|p| p.shipment.id);

        Ok(match active {
            Some(pending) => ContainerStatus {
                container_id,
                shipment_id: Some(pending.shipment.id),
                tracking_code: Some(pending.shipment.tracking_code),
                state: Some(pending.shipment.state),
                location: pending.location,
                current_leg: pending.current_leg,
            },
            None => ContainerStatus::idle(container_id),
        })
    }

    /// Chronological history ("seguimiento") of a shipment.
    pub fn tracking(&self, id: ShipmentId) -> Result<TrackingReport> {
        self.store.read(|conn| {
            let shipment = repo::require_shipment(conn, id)?;
            let (route, legs) = route_and_legs(conn, id)?;
            let events = tracking::build_events(&shipment, route.as_ref(), &legs);
            Ok(TrackingReport {
                shipment_id: shipment.id,
                tracking_code: shipment.tracking_code,
                state: shipment.state,
                estimated_cost: shipment.estimated_cost,
                estimated_hours: shipment.estimated_hours,
                final_cost: shipment.final_cost,
                final_hours: shipment.final_hours,
                events,
            })
        })
    }

    /// Deposits worth stopping at between two points.
    pub fn deposits_on_route(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
    ) -> Result<Vec<Deposit>> {
        let candidates = self.collaborators.deposits.list_deposits()?;
        let found = geo::find_on_route(origin, destination, &candidates, self.deposit_margin);
        debug!(
            candidates = candidates.len(),
            matches = found.len(),
            "deposit-on-route search"
        );
        Ok(found)
    }

    fn ensure_customer(&self, customer_id: i64) -> Result<()> {
        if self.collaborators.customers.find_customer(customer_id)?.is_some() {
            return Ok(());
        }
        info!(customer_id, "customer missing; provisioning placeholder record");
        self.collaborators
            .customers
            .create_customer(&NewCustomer::placeholder(customer_id))?;
        Ok(())
    }

    fn plan(&self, origin: &Place, destination: &Place, consumption: f64) -> Result<Plan> {
        let distance = self
            .collaborators
            .distance
            .compute_distance(&Location::from(origin), &Location::from(destination))?;

        for (name, value) in [
            ("distance", distance.distance_km),
            ("duration", distance.duration_hours),
        ] {
            if !value.is_finite() || value < 0.0 {
                warn!(name, value, "provider returned an unusable figure");
                return Err(Error::GeoLookupFailed {
                    message: format!("provider returned {name} {value}"),
                });
            }
        }

        let estimated_hours = if distance.duration_hours > 0.0 {
            distance.duration_hours
        } else {
            self.tariff.estimated_travel_hours(distance.distance_km)
        };

        Ok(Plan {
            estimated_cost: self.tariff.estimated_leg_cost(distance.distance_km, consumption),
            estimated_hours,
            distance,
        })
    }
}

fn ensure_state(shipment: &Shipment, expected: ShipmentState, operation: &'static str) -> Result<()> {
    if shipment.state != expected {
        return Err(Error::invalid_state(
            "shipment",
            shipment.id,
            shipment.state,
            operation,
        ));
    }
    Ok(())
}

/// Planned window for a freshly routed leg: starts a day after `now`.
fn schedule(now: DateTime<Utc>, estimated_hours: f64) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let out_of_range = || Error::GeoLookupFailed {
        message: format!("trip duration of {estimated_hours} h is out of range"),
    };
    let planned_start = now
        .checked_add_signed(Duration::days(1))
        .ok_or_else(out_of_range)?;
    let trip = Duration::try_milliseconds((estimated_hours * 3_600_000.0).round() as i64)
        .ok_or_else(out_of_range)?;
    let planned_end = planned_start
        .checked_add_signed(trip)
        .ok_or_else(out_of_range)?;
    Ok((planned_start, planned_end))
}

fn route_and_legs(conn: &Connection, shipment_id: ShipmentId) -> Result<(Option<Route>, Vec<Leg>)> {
    match repo::route_for_shipment(conn, shipment_id)? {
        Some(route) => {
            let legs = repo::legs_for_route(conn, route.id)?;
            Ok((Some(route), legs))
        }
        None => Ok((None, Vec::new())),
    }
}

/// Close out a shipment whose legs are all finished.
///
/// Returns `Some` with the delivered shipment when the transition happened and
/// `None` when the shipment was not `SCHEDULED` (already delivered, cancelled).
/// The shipment is resolved only through the route-to-shipment link.
pub(crate) fn finalize_within(
    conn: &Connection,
    shipment_id: ShipmentId,
    now: DateTime<Utc>,
) -> Result<Option<Shipment>> {
    let shipment = repo::require_shipment(conn, shipment_id)?;
    if shipment.state != ShipmentState::Scheduled {
        debug!(shipment_id, state = %shipment.state, "finalize skipped");
        return Ok(None);
    }

    let (_, legs) = route_and_legs(conn, shipment_id)?;
    if legs.is_empty() || legs.iter().any(|l| l.state != LegState::Finished) {
        return Err(Error::invalid_state(
            "shipment",
            shipment_id,
            shipment.state,
            "finalize",
        ));
    }

    let mut final_cost = 0.0;
    let mut final_hours = 0.0;
    for leg in &legs {
        final_cost += leg.real_cost.unwrap_or(0.0);
        if let Some(h) = leg.actual_hours() {
            final_hours += h;
        }
    }

    repo::deliver_shipment(conn, shipment_id, final_cost, final_hours, now)?;
    info!(shipment_id, final_cost, final_hours, "shipment delivered");
    repo::require_shipment(conn, shipment_id).map(Some)
}
