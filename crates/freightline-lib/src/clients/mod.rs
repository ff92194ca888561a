//! Collaborator services consumed by the lifecycle managers.
//!
//! Each collaborator sits behind a narrow trait so the managers can be tested
//! with in-memory fakes. The HTTP implementations treat a 404 on a lookup as
//! "absent" and every other failure as [`Error::DependencyUnavailable`].
//!
//! [`Error::DependencyUnavailable`]: crate::Error::DependencyUnavailable

pub(crate) mod http;
mod fleet;
mod management;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo::Deposit;

pub use fleet::FleetClient;
pub use management::ManagementClient;

/// Customer record owned by the management service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Payload for creating a customer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
}

impl NewCustomer {
    /// Minimal record created when a shipment references an unknown customer.
    pub fn placeholder(id: i64) -> Self {
        Self {
            id,
            name: "Customer".to_string(),
            surname: format!("AutoGenerated-{id}"),
            email: format!("customer{id}@autogenerated.local"),
            phone: "+54-11-0000-0000".to_string(),
        }
    }
}

/// Container record owned by the management service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: i64,
    #[serde(default)]
    pub weight_kg: f64,
    #[serde(default)]
    pub volume_m3: f64,
    #[serde(default)]
    pub customer_id: Option<i64>,
}

/// Truck record owned by the fleet service, keyed by licence plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    pub id: String,
    pub weight_capacity_kg: f64,
    pub volume_capacity_m3: f64,
    /// Litres of fuel per km.
    pub consumption_l_per_km: f64,
    pub cost_per_km: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

pub trait CustomerDirectory: Send + Sync {
    fn find_customer(&self, id: i64) -> Result<Option<Customer>>;
    fn create_customer(&self, customer: &NewCustomer) -> Result<Customer>;
}

pub trait ContainerDirectory: Send + Sync {
    fn find_container(&self, id: i64) -> Result<Option<Container>>;
}

pub trait DepositDirectory: Send + Sync {
    fn list_deposits(&self) -> Result<Vec<Deposit>>;
}

pub trait FleetDirectory: Send + Sync {
    /// Trucks whose capacity meets or exceeds both `weight_kg` and `volume_m3`.
    fn eligible_trucks(&self, weight_kg: f64, volume_m3: f64) -> Result<Vec<Truck>>;
}
