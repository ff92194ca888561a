use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::http::{build_client, fetch, join_url};
use super::{FleetDirectory, Truck};
use crate::error::Result;

const SERVICE: &str = "fleet service";

/// HTTP client for the truck fleet service.
#[derive(Debug, Clone)]
pub struct FleetClient {
    client: Client,
    base_url: String,
}

impl FleetClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(SERVICE, timeout)?,
            base_url: base_url.into(),
        })
    }
}

impl FleetDirectory for FleetClient {
    fn eligible_trucks(&self, weight_kg: f64, volume_m3: f64) -> Result<Vec<Truck>> {
        debug!(weight_kg, volume_m3, "querying eligible trucks");
        let request = self
            .client
            .get(join_url(&self.base_url, "trucks/eligible"))
            .query(&[("weight_kg", weight_kg), ("volume_m3", volume_m3)]);
        fetch(SERVICE, request)
    }
}
