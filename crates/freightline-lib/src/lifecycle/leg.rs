use std::sync::Arc;

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::shipment::finalize_within;
use crate::capacity::CapacityValidator;
use crate::clients::FleetDirectory;
use crate::db::Store;
use crate::error::{Error, Result};
use crate::model::{Leg, LegFilter, LegId, LegState, NewLeg, Shipment, ShipmentState};
use crate::repo;
use crate::tariff::TariffEngine;

/// Figures reported by the driver when a leg ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinishLeg {
    pub real_distance_km: f64,
    pub truck_rate_per_km: f64,
    /// Litres per km.
    pub truck_consumption: f64,
}

impl FinishLeg {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("real_distance_km", self.real_distance_km),
            ("truck_rate_per_km", self.truck_rate_per_km),
            ("truck_consumption", self.truck_consumption),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_input(format!(
                    "{name} must be a finite non-negative number"
                )));
            }
        }
        Ok(())
    }
}

/// Result of finishing a leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegFinish {
    pub leg: Leg,
    /// Set when this was the last open leg and the shipment was delivered.
    pub delivered_shipment: Option<Shipment>,
}

/// Owns the leg state machine.
#[derive(Clone)]
pub struct LegManager {
    store: Arc<Store>,
    capacity: CapacityValidator,
    tariff: TariffEngine,
}

impl LegManager {
    pub fn new(store: Arc<Store>, fleet: Arc<dyn FleetDirectory>, tariff: TariffEngine) -> Self {
        Self {
            store,
            capacity: CapacityValidator::new(fleet),
            tariff,
        }
    }

    /// Append an `ESTIMATED` leg to the route of a scheduled shipment.
    pub fn create_leg(&self, new: &NewLeg) -> Result<Leg> {
        if new.origin.trim().is_empty() || new.destination.trim().is_empty() {
            return Err(Error::invalid_input("leg origin and destination are required"));
        }
        if !new.distance_km.is_finite() || new.distance_km < 0.0 {
            return Err(Error::invalid_input("distance_km must be a finite non-negative number"));
        }

        let leg = self.store.write(|tx| {
            let route = repo::find_route(tx, new.route_id)?
                .ok_or_else(|| Error::not_found("route", new.route_id))?;
            let shipment = repo::require_shipment(tx, route.shipment_id)?;
            if shipment.state != ShipmentState::Scheduled {
                return Err(Error::invalid_state(
                    "shipment",
                    shipment.id,
                    shipment.state,
                    "add a leg to",
                ));
            }
            repo::insert_leg(tx, new)
        })?;
        info!(leg_id = leg.id, route_id = leg.route_id, "leg created");
        Ok(leg)
    }

    pub fn get(&self, id: LegId) -> Result<Leg> {
        self.store.read(|conn| repo::require_leg(conn, id))
    }

    pub fn list(&self, filter: &LegFilter) -> Result<Vec<Leg>> {
        let legs = self.store.read(|conn| repo::list_legs(conn, filter))?;
        debug!(count = legs.len(), "listed legs");
        Ok(legs)
    }

    /// `ESTIMATED → ASSIGNED`, gated by the fleet capacity check.
    pub fn assign_truck(
        &self,
        leg_id: LegId,
        truck_id: &str,
        weight_kg: f64,
        volume_m3: f64,
    ) -> Result<Leg> {
        if truck_id.trim().is_empty() {
            return Err(Error::invalid_input("truck_id must not be blank"));
        }
        for (name, value) in [("weight_kg", weight_kg), ("volume_m3", volume_m3)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_input(format!(
                    "{name} must be a finite non-negative number"
                )));
            }
        }

        let leg = self.get(leg_id)?;
        ensure_leg_state(&leg, LegState::Estimated, "assign a truck to")?;

        let truck = self
            .capacity
            .validate(leg_id, truck_id, weight_kg, volume_m3)?;

        let leg = self.store.write(|tx| {
            let mut leg = repo::require_leg(tx, leg_id)?;
            ensure_leg_state(&leg, LegState::Estimated, "assign a truck to")?;
            ensure_shipment_scheduled(tx, &leg, "assign a truck to")?;
            leg.truck_id = Some(truck.id.clone());
            leg.state = LegState::Assigned;
            repo::update_leg(tx, &leg)?;
            Ok(leg)
        })?;
        info!(leg_id, truck_id = %truck.id, "truck assigned");
        Ok(leg)
    }

    /// `ASSIGNED → STARTED`, stamping the actual start time.
    pub fn start(&self, leg_id: LegId) -> Result<Leg> {
        let leg = self.store.write(|tx| {
            let mut leg = repo::require_leg(tx, leg_id)?;
            ensure_leg_state(&leg, LegState::Assigned, "start")?;
            ensure_shipment_scheduled(tx, &leg, "start a leg of")?;
            leg.actual_start = Some(Utc::now());
            leg.state = LegState::Started;
            repo::update_leg(tx, &leg)?;
            Ok(leg)
        })?;
        info!(leg_id, "leg started");
        Ok(leg)
    }

    /// `STARTED → FINISHED`, pricing the leg and delivering the shipment when
    /// it was the last open leg. Both happen in one transaction.
    pub fn finish(&self, leg_id: LegId, report: &FinishLeg) -> Result<LegFinish> {
        report.validate()?;

        let outcome = self.store.write(|tx| {
            let mut leg = repo::require_leg(tx, leg_id)?;
            ensure_leg_state(&leg, LegState::Started, "finish")?;
            ensure_shipment_scheduled(tx, &leg, "finish a leg of")?;

            let now = Utc::now();
            leg.actual_end = Some(now);
            leg.distance_km = report.real_distance_km;
            leg.real_cost = Some(self.tariff.real_leg_cost(
                report.real_distance_km,
                report.truck_rate_per_km,
                report.truck_consumption,
            ));
            leg.state = LegState::Finished;
            repo::update_leg(tx, &leg)?;

            let siblings = repo::legs_for_route(tx, leg.route_id)?;
            let delivered_shipment = if siblings.iter().all(|l| l.state == LegState::Finished) {
                let route = repo::find_route(tx, leg.route_id)?
                    .ok_or_else(|| Error::not_found("route", leg.route_id))?;
                finalize_within(tx, route.shipment_id, now)?
            } else {
                None
            };

            Ok(LegFinish {
                leg,
                delivered_shipment,
            })
        })?;

        info!(
            leg_id,
            real_cost = outcome.leg.real_cost,
            delivered = outcome.delivered_shipment.is_some(),
            "leg finished"
        );
        Ok(outcome)
    }
}

fn ensure_leg_state(leg: &Leg, expected: LegState, operation: &'static str) -> Result<()> {
    if leg.state != expected {
        return Err(Error::invalid_state("leg", leg.id, leg.state, operation));
    }
    Ok(())
}

/// Trucks are only dispatched for shipments that are still scheduled.
fn ensure_shipment_scheduled(conn: &Connection, leg: &Leg, operation: &'static str) -> Result<()> {
    let route = repo::find_route(conn, leg.route_id)?
        .ok_or_else(|| Error::not_found("route", leg.route_id))?;
    let shipment = repo::require_shipment(conn, route.shipment_id)?;
    if shipment.state != ShipmentState::Scheduled {
        return Err(Error::invalid_state(
            "shipment",
            shipment.id,
            shipment.state,
            operation,
        ));
    }
    Ok(())
}
