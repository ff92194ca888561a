// In-memory collaborators and fixtures for freightline tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::clients::{
    Container, ContainerDirectory, Customer, CustomerDirectory, DepositDirectory, FleetDirectory,
    NewCustomer, Truck,
};
use crate::db::Store;
use crate::distance::{DistanceEstimate, DistanceProvider, Location};
use crate::error::{Error, Result};
use crate::geo::Deposit;
use crate::lifecycle::{Collaborators, LegManager, ShipmentManager};
use crate::model::{NewShipment, Place};
use crate::tariff::{TariffConfig, TariffEngine};

pub const CUSTOMER_ID: i64 = 20;
pub const CONTAINER_ID: i64 = 10;

/// Mapping provider that answers every lookup with the same script.
#[derive(Debug)]
pub struct ScriptedDistance {
    distance_km: f64,
    duration_hours: f64,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedDistance {
    pub fn fixed(distance_km: f64, duration_hours: f64) -> Self {
        Self {
            distance_km,
            duration_hours,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            distance_km: 0.0,
            duration_hours: 0.0,
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DistanceProvider for ScriptedDistance {
    fn compute_distance(
        &self,
        origin: &Location,
        destination: &Location,
    ) -> Result<DistanceEstimate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(Error::GeoLookupFailed {
                message: message.clone(),
            });
        }
        Ok(DistanceEstimate {
            distance_km: self.distance_km,
            duration_hours: self.duration_hours,
            origin_label: origin.to_query(),
            destination_label: destination.to_query(),
        })
    }
}

/// Customer directory backed by a map; remembers every record it creates.
#[derive(Debug, Default)]
pub struct InMemoryCustomers {
    customers: Mutex<HashMap<i64, Customer>>,
    created: Mutex<Vec<NewCustomer>>,
}

impl InMemoryCustomers {
    pub fn with_ids(ids: &[i64]) -> Self {
        let customers = ids
            .iter()
            .map(|&id| {
                (
                    id,
                    Customer {
                        id,
                        name: format!("Customer {id}"),
                        surname: String::new(),
                        email: String::new(),
                        phone: String::new(),
                    },
                )
            })
            .collect();
        Self {
            customers: Mutex::new(customers),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> Vec<NewCustomer> {
        self.created.lock().expect("created lock").clone()
    }
}

impl CustomerDirectory for InMemoryCustomers {
    fn find_customer(&self, id: i64) -> Result<Option<Customer>> {
        Ok(self.customers.lock().expect("customers lock").get(&id).cloned())
    }

    fn create_customer(&self, customer: &NewCustomer) -> Result<Customer> {
        self.created
            .lock()
            .expect("created lock")
            .push(customer.clone());
        let record = Customer {
            id: customer.id,
            name: customer.name.clone(),
            surname: customer.surname.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
        };
        self.customers
            .lock()
            .expect("customers lock")
            .insert(customer.id, record.clone());
        Ok(record)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryContainers {
    containers: HashMap<i64, Container>,
}

impl InMemoryContainers {
    pub fn new(containers: Vec<Container>) -> Self {
        Self {
            containers: containers.into_iter().map(|c| (c.id, c)).collect(),
        }
    }
}

impl ContainerDirectory for InMemoryContainers {
    fn find_container(&self, id: i64) -> Result<Option<Container>> {
        Ok(self.containers.get(&id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct StaticDeposits(pub Vec<Deposit>);

impl DepositDirectory for StaticDeposits {
    fn list_deposits(&self) -> Result<Vec<Deposit>> {
        Ok(self.0.clone())
    }
}

/// Fleet that filters a fixed truck list by capacity, or is down entirely.
#[derive(Debug, Default)]
pub struct StaticFleet {
    trucks: Vec<Truck>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl StaticFleet {
    pub fn new(trucks: Vec<Truck>) -> Self {
        Self {
            trucks,
            unavailable: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            trucks: Vec::new(),
            unavailable: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FleetDirectory for StaticFleet {
    fn eligible_trucks(&self, weight_kg: f64, volume_m3: f64) -> Result<Vec<Truck>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(Error::DependencyUnavailable {
                service: "fleet service",
                message: "connection refused".to_string(),
            });
        }
        Ok(self
            .trucks
            .iter()
            .filter(|t| t.weight_capacity_kg >= weight_kg && t.volume_capacity_m3 >= volume_m3)
            .cloned()
            .collect())
    }
}

/// A truck with round-number pricing: 200 per km, 0.3 L/km.
pub fn truck(id: &str, weight_capacity_kg: f64, volume_capacity_m3: f64) -> Truck {
    Truck {
        id: id.to_string(),
        weight_capacity_kg,
        volume_capacity_m3,
        consumption_l_per_km: 0.3,
        cost_per_km: 200.0,
        available: true,
    }
}

pub fn container(id: i64, weight_kg: f64, volume_m3: f64) -> Container {
    Container {
        id,
        weight_kg,
        volume_m3,
        customer_id: Some(CUSTOMER_ID),
    }
}

/// Córdoba to Buenos Aires for the default container and customer.
pub fn new_shipment(tracking_code: &str) -> NewShipment {
    NewShipment {
        tracking_code: tracking_code.to_string(),
        container_id: CONTAINER_ID,
        customer_id: CUSTOMER_ID,
        origin: Place::address("Córdoba, Argentina"),
        destination: Place::address("Buenos Aires, Argentina"),
    }
}

/// Everything a lifecycle test needs, wired against in-memory fakes.
pub struct Fixture {
    pub store: Arc<Store>,
    pub distance: Arc<ScriptedDistance>,
    pub customers: Arc<InMemoryCustomers>,
    pub fleet: Arc<StaticFleet>,
    pub collaborators: Collaborators,
    pub shipments: ShipmentManager,
    pub legs: LegManager,
}

pub struct FixtureBuilder {
    distance: ScriptedDistance,
    customers: InMemoryCustomers,
    containers: InMemoryContainers,
    deposits: Vec<Deposit>,
    fleet: StaticFleet,
    tariff: TariffConfig,
}

impl FixtureBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            distance: ScriptedDistance::fixed(702.0, 7.5),
            customers: InMemoryCustomers::with_ids(&[CUSTOMER_ID]),
            containers: InMemoryContainers::new(vec![container(CONTAINER_ID, 20_000.0, 30.0)]),
            deposits: Vec::new(),
            fleet: StaticFleet::new(vec![
                truck("AA111AA", 30_000.0, 60.0),
                truck("BB222BB", 45_000.0, 90.0),
            ]),
            tariff: TariffConfig::default(),
        }
    }

    pub fn distance(mut self, distance: ScriptedDistance) -> Self {
        self.distance = distance;
        self
    }

    pub fn customers(mut self, customers: InMemoryCustomers) -> Self {
        self.customers = customers;
        self
    }

    pub fn containers(mut self, containers: InMemoryContainers) -> Self {
        self.containers = containers;
        self
    }

    pub fn deposits(mut self, deposits: Vec<Deposit>) -> Self {
        self.deposits = deposits;
        self
    }

    pub fn fleet(mut self, fleet: StaticFleet) -> Self {
        self.fleet = fleet;
        self
    }

    pub fn tariff(mut self, tariff: TariffConfig) -> Self {
        self.tariff = tariff;
        self
    }

    pub fn build(self) -> Fixture {
        let store = Arc::new(Store::open_in_memory().expect("open in-memory store"));
        let distance = Arc::new(self.distance);
        let customers = Arc::new(self.customers);
        let fleet = Arc::new(self.fleet);
        let collaborators = Collaborators {
            distance: distance.clone(),
            customers: customers.clone(),
            containers: Arc::new(self.containers),
            deposits: Arc::new(StaticDeposits(self.deposits)),
            fleet: fleet.clone(),
        };
        let tariff = TariffEngine::new(self.tariff).expect("valid tariff");

        Fixture {
            shipments: ShipmentManager::new(store.clone(), collaborators.clone(), tariff),
            legs: LegManager::new(store.clone(), fleet.clone(), tariff),
            store,
            distance,
            customers,
            fleet,
            collaborators,
        }
    }
}

impl Default for FixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn fixture() -> Fixture {
    FixtureBuilder::new().build()
}
