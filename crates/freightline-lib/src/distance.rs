//! Mapping provider adapter.
//!
//! Wraps a distance-matrix style HTTP API. Provider units are converted
//! exactly (metres / 1000, seconds / 3600) and every anomaly in the response
//! is reported as [`Error::GeoLookupFailed`]. No retries are attempted here.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clients::http::build_client;
use crate::error::{Error, Result};
use crate::geo::Coordinates;
use crate::model::Place;

/// Default distance-matrix endpoint.
pub const DEFAULT_MAPS_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

const RESPONSE_LANGUAGE: &str = "es";

/// What the provider is asked about: an address or a coordinate pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Address(String),
    Coordinates(Coordinates),
}

impl Location {
    /// Provider query form; coordinates become `"lat,lon"`.
    pub fn to_query(&self) -> String {
        match self {
            Location::Address(address) => address.clone(),
            Location::Coordinates(c) => format!("{:.6},{:.6}", c.latitude, c.longitude),
        }
    }
}

impl From<&Place> for Location {
    /// Coordinates win over the free-text address when both are present.
    fn from(place: &Place) -> Self {
        match place.coordinates {
            Some(coords) => Location::Coordinates(coords),
            None => Location::Address(place.address.clone()),
        }
    }
}

/// Distance and duration between two locations, in km and hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceEstimate {
    pub distance_km: f64,
    pub duration_hours: f64,
    pub origin_label: String,
    pub destination_label: String,
}

/// Source of road distances between two locations.
pub trait DistanceProvider: Send + Sync {
    fn compute_distance(&self, origin: &Location, destination: &Location)
        -> Result<DistanceEstimate>;
}

/// Distance-matrix API response.
#[derive(Debug, Deserialize)]
pub struct MatrixResponse {
    /// Top-level status, `"OK"` on success.
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub origin_addresses: Vec<String>,
    #[serde(default)]
    pub destination_addresses: Vec<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixRow {
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixElement {
    pub status: String,
    pub distance: Option<MatrixValue>,
    pub duration: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixValue {
    pub value: f64,
    #[serde(default)]
    pub text: String,
}

impl MatrixResponse {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }

    /// Extract the single origin/destination pair from the response.
    pub fn into_estimate(self, origin: &Location, destination: &Location) -> Result<DistanceEstimate> {
        if !self.is_ok() {
            let detail = self
                .error_message
                .map(|m| format!(" ({m})"))
                .unwrap_or_default();
            return Err(geo_failure(format!("provider status {}{detail}", self.status)));
        }

        let element = self
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or_else(|| geo_failure("provider returned an empty matrix"))?;

        if element.status != "OK" {
            return Err(geo_failure(format!("element status {}", element.status)));
        }

        let (distance, duration) = match (element.distance, element.duration) {
            (Some(distance), Some(duration)) => (distance, duration),
            _ => return Err(geo_failure("element is missing distance or duration")),
        };

        if [distance.value, duration.value]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(geo_failure("element carries a negative or non-finite figure"));
        }

        Ok(DistanceEstimate {
            distance_km: distance.value / 1000.0,
            duration_hours: duration.value / 3600.0,
            origin_label: first_or(self.origin_addresses, origin),
            destination_label: first_or(self.destination_addresses, destination),
        })
    }
}

fn first_or(labels: Vec<String>, fallback: &Location) -> String {
    labels
        .into_iter()
        .next()
        .filter(|label| !label.trim().is_empty())
        .unwrap_or_else(|| fallback.to_query())
}

fn geo_failure(message: impl Into<String>) -> Error {
    Error::GeoLookupFailed {
        message: message.into(),
    }
}

/// Blocking HTTP client for the distance-matrix API.
#[derive(Debug, Clone)]
pub struct DistanceMatrixClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl DistanceMatrixClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client("mapping provider", timeout)?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

impl DistanceProvider for DistanceMatrixClient {
    fn compute_distance(
        &self,
        origin: &Location,
        destination: &Location,
    ) -> Result<DistanceEstimate> {
        let origins = origin.to_query();
        let destinations = destination.to_query();
        debug!(origin = %origins, destination = %destinations, "querying mapping provider");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("key", self.api_key.as_str()),
                ("language", RESPONSE_LANGUAGE),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|err| {
                warn!(error = %err, "mapping provider request failed");
                geo_failure(format!("transport error: {err}"))
            })?;

        let body: MatrixResponse = response
            .json()
            .map_err(|err| geo_failure(format!("undecodable response: {err}")))?;

        body.into_estimate(origin, destination).inspect_err(|err| {
            warn!(error = %err, "mapping provider rejected lookup");
        })
    }
}
