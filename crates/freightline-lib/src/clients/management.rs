use std::time::Duration;

use reqwest::blocking::Client;
use tracing::info;

use super::http::{build_client, fetch, fetch_optional, join_url};
use super::{Container, ContainerDirectory, Customer, CustomerDirectory, DepositDirectory, NewCustomer};
use crate::error::Result;
use crate::geo::Deposit;

const SERVICE: &str = "management service";

/// HTTP client for the customer/container/deposit service.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    client: Client,
    base_url: String,
}

impl ManagementClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(SERVICE, timeout)?,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

impl CustomerDirectory for ManagementClient {
    fn find_customer(&self, id: i64) -> Result<Option<Customer>> {
        fetch_optional(SERVICE, self.client.get(self.url(&format!("customers/{id}"))))
    }

    fn create_customer(&self, customer: &NewCustomer) -> Result<Customer> {
        info!(customer_id = customer.id, "creating customer record");
        fetch(SERVICE, self.client.post(self.url("customers")).json(customer))
    }
}

impl ContainerDirectory for ManagementClient {
    fn find_container(&self, id: i64) -> Result<Option<Container>> {
        fetch_optional(SERVICE, self.client.get(self.url(&format!("containers/{id}"))))
    }
}

impl DepositDirectory for ManagementClient {
    fn list_deposits(&self) -> Result<Vec<Deposit>> {
        fetch(SERVICE, self.client.get(self.url("deposits")))
    }
}
