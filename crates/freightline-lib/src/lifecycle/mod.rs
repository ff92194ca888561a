//! Shipment and leg state machines.
//!
//! ```text
//! Shipment:  DRAFT ──assign route──▶ SCHEDULED ──last leg finished──▶ DELIVERED
//!              └──────────────cancel──────┴──▶ CANCELLED
//!
//! Leg:       ESTIMATED ──assign truck──▶ ASSIGNED ──start──▶ STARTED ──finish──▶ FINISHED
//! ```
//!
//! The only coupling between the two machines is the finalize step, which the
//! leg manager runs inside the same transaction as the finishing leg.

mod leg;
mod shipment;
mod tracking;

use std::sync::Arc;

use crate::clients::{
    ContainerDirectory, CustomerDirectory, DepositDirectory, FleetClient, FleetDirectory,
    ManagementClient,
};
use crate::config::FreightlineConfig;
use crate::distance::{DistanceMatrixClient, DistanceProvider};
use crate::error::Result;

pub use leg::{FinishLeg, LegFinish, LegManager};
pub use shipment::{
    EstimateRequest, LegEstimate, RouteAssignment, RouteEstimate, ShipmentManager,
};
pub use tracking::{
    ContainerStatus, CurrentLeg, CurrentLocation, LocationTag, PendingShipment, TrackingEvent,
    TrackingEventKind, TrackingReport,
};

/// Every external service the lifecycle managers talk to.
#[derive(Clone)]
pub struct Collaborators {
    pub distance: Arc<dyn DistanceProvider>,
    pub customers: Arc<dyn CustomerDirectory>,
    pub containers: Arc<dyn ContainerDirectory>,
    pub deposits: Arc<dyn DepositDirectory>,
    pub fleet: Arc<dyn FleetDirectory>,
}

impl Collaborators {
    /// Build HTTP-backed collaborators from configuration.
    pub fn from_config(config: &FreightlineConfig) -> Result<Self> {
        let management = Arc::new(ManagementClient::new(
            config.management_url.clone(),
            config.http_timeout,
        )?);
        let fleet = Arc::new(FleetClient::new(config.fleet_url.clone(), config.http_timeout)?);
        let distance = Arc::new(DistanceMatrixClient::new(
            config.maps_url.clone(),
            config.maps_api_key.clone(),
            config.http_timeout,
        )?);

        Ok(Self {
            distance,
            customers: management.clone(),
            containers: management.clone(),
            deposits: management,
            fleet,
        })
    }
}
