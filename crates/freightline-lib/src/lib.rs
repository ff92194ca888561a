//! Freightline library entry points.
//!
//! This crate owns the shipment ("solicitud") and leg ("tramo") state
//! machines together with everything they lean on: the tariff engine, the
//! deposit-on-route finder, the mapping provider adapter, the fleet capacity
//! gate, and the SQLite store. Services and the CLI should only depend on the
//! functions exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod capacity;
pub mod clients;
pub mod config;
pub mod db;
pub mod distance;
pub mod error;
pub mod geo;
pub mod lifecycle;
pub mod model;
pub mod repo;
pub mod tariff;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers;

pub use capacity::CapacityValidator;
pub use clients::{
    Container, ContainerDirectory, Customer, CustomerDirectory, DepositDirectory, FleetClient,
    FleetDirectory, ManagementClient, NewCustomer, Truck,
};
pub use config::FreightlineConfig;
pub use db::Store;
pub use distance::{DistanceEstimate, DistanceMatrixClient, DistanceProvider, Location};
pub use error::{BusinessRuleViolation, Error, ErrorKind, Result};
pub use geo::{find_on_route, haversine_km, Coordinates, Deposit};
pub use lifecycle::{
    Collaborators, ContainerStatus, CurrentLeg, CurrentLocation, EstimateRequest, FinishLeg,
    LegEstimate, LegFinish, LegManager, LocationTag, PendingShipment, RouteAssignment,
    RouteEstimate, ShipmentManager, TrackingEvent, TrackingEventKind, TrackingReport,
};
pub use model::{
    Leg, LegFilter, LegId, LegState, NewLeg, NewShipment, Place, Route, RouteId, Shipment,
    ShipmentFilter, ShipmentId, ShipmentState,
};
pub use tariff::{Quote, QuoteInput, StorageStay, TariffConfig, TariffEngine, TruckFigures};
