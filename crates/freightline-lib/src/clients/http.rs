use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Build a blocking client whose every request is bounded by `timeout`.
pub(crate) fn build_client(service: &'static str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent())
        .build()
        .map_err(|err| Error::DependencyUnavailable {
            service,
            message: format!("failed to build HTTP client: {err}"),
        })
}

fn user_agent() -> String {
    format!("freightline-lib/{}", env!("CARGO_PKG_VERSION"))
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Send a request whose 404 means "absent".
pub(crate) fn fetch_optional<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
) -> Result<Option<T>> {
    let response = send(service, request)?;
    if response.status() == StatusCode::NOT_FOUND {
        debug!(service, "collaborator reported record absent");
        return Ok(None);
    }
    decode(service, response).map(Some)
}

/// Send a request that must succeed and decode its JSON body.
pub(crate) fn fetch<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
) -> Result<T> {
    let response = send(service, request)?;
    decode(service, response)
}

fn send(service: &'static str, request: RequestBuilder) -> Result<Response> {
    request.send().map_err(|err| {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        warn!(service, error = %message, "collaborator call failed");
        Error::DependencyUnavailable { service, message }
    })
}

fn decode<T: DeserializeOwned>(service: &'static str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        warn!(service, status = status.as_u16(), "collaborator returned error status");
        return Err(Error::DependencyUnavailable {
            service,
            message: format!("unexpected status {status}"),
        });
    }
    response.json::<T>().map_err(|err| Error::DependencyUnavailable {
        service,
        message: format!("undecodable response: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://h:1/", "/customers/1"), "http://h:1/customers/1");
        assert_eq!(join_url("http://h:1", "trucks"), "http://h:1/trucks");
    }
}
