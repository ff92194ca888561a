//! Environment-driven configuration shared by the services and the CLI.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::distance::DEFAULT_MAPS_URL;
use crate::geo::DEFAULT_DETOUR_MARGIN;
use crate::tariff::TariffConfig;

pub const DB_PATH_ENV: &str = "FREIGHTLINE_DB_PATH";
pub const MANAGEMENT_URL_ENV: &str = "FREIGHTLINE_MANAGEMENT_URL";
pub const FLEET_URL_ENV: &str = "FREIGHTLINE_FLEET_URL";
pub const MAPS_URL_ENV: &str = "FREIGHTLINE_MAPS_URL";
pub const MAPS_API_KEY_ENV: &str = "FREIGHTLINE_MAPS_API_KEY";
pub const HTTP_TIMEOUT_ENV: &str = "FREIGHTLINE_HTTP_TIMEOUT_SECS";
pub const TARIFF_BASE_FEE_ENV: &str = "FREIGHTLINE_TARIFF_BASE_FEE";
pub const TARIFF_FUEL_PRICE_ENV: &str = "FREIGHTLINE_TARIFF_FUEL_PRICE";
pub const TARIFF_RATE_PER_KM_ENV: &str = "FREIGHTLINE_TARIFF_RATE_PER_KM";
pub const TARIFF_SPEED_ENV: &str = "FREIGHTLINE_TARIFF_SPEED_KMH";
pub const TARIFF_CONSUMPTION_ENV: &str = "FREIGHTLINE_TARIFF_CONSUMPTION";
pub const DEPOSIT_MARGIN_ENV: &str = "FREIGHTLINE_DEPOSIT_MARGIN";

const DEFAULT_DB_PATH: &str = "freightline.db";
const DEFAULT_MANAGEMENT_URL: &str = "http://localhost:8081";
const DEFAULT_FLEET_URL: &str = "http://localhost:8082";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;

/// Runtime configuration for the orchestration core.
#[derive(Debug, Clone, PartialEq)]
pub struct FreightlineConfig {
    pub db_path: PathBuf,
    pub management_url: String,
    pub fleet_url: String,
    pub maps_url: String,
    pub maps_api_key: String,
    /// Upper bound applied to every outbound call.
    pub http_timeout: Duration,
    pub tariff: TariffConfig,
    pub deposit_margin: f64,
}

impl Default for FreightlineConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            management_url: DEFAULT_MANAGEMENT_URL.to_string(),
            fleet_url: DEFAULT_FLEET_URL.to_string(),
            maps_url: DEFAULT_MAPS_URL.to_string(),
            maps_api_key: String::new(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            tariff: TariffConfig::default(),
            deposit_margin: DEFAULT_DETOUR_MARGIN,
        }
    }
}

impl FreightlineConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Malformed numbers fall back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let string = |key: &str, default: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };
        let number = |key: &str, default: f64| parse_number(key, lookup(key), default);

        let timeout_secs = parse_number(
            HTTP_TIMEOUT_ENV,
            lookup(HTTP_TIMEOUT_ENV),
            DEFAULT_HTTP_TIMEOUT_SECS as f64,
        );

        Self {
            db_path: PathBuf::from(string(DB_PATH_ENV, DEFAULT_DB_PATH.to_string())),
            management_url: string(MANAGEMENT_URL_ENV, defaults.management_url),
            fleet_url: string(FLEET_URL_ENV, defaults.fleet_url),
            maps_url: string(MAPS_URL_ENV, defaults.maps_url),
            maps_api_key: lookup(MAPS_API_KEY_ENV).unwrap_or_default(),
            http_timeout: http_timeout(timeout_secs),
            tariff: TariffConfig {
                base_fee: number(TARIFF_BASE_FEE_ENV, defaults.tariff.base_fee),
                fuel_price_per_liter: number(
                    TARIFF_FUEL_PRICE_ENV,
                    defaults.tariff.fuel_price_per_liter,
                ),
                base_rate_per_km: number(TARIFF_RATE_PER_KM_ENV, defaults.tariff.base_rate_per_km),
                average_speed_kmh: number(TARIFF_SPEED_ENV, defaults.tariff.average_speed_kmh),
                assumed_consumption: number(
                    TARIFF_CONSUMPTION_ENV,
                    defaults.tariff.assumed_consumption,
                ),
            },
            deposit_margin: non_negative(
                DEPOSIT_MARGIN_ENV,
                number(DEPOSIT_MARGIN_ENV, defaults.deposit_margin),
                defaults.deposit_margin,
            ),
        }
    }
}

/// Timeouts below 100 ms are raised to it; unrepresentable ones fall back to the default.
fn http_timeout(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.1)).unwrap_or_else(|_| {
        warn!(key = HTTP_TIMEOUT_ENV, value = secs, "timeout out of range, using default");
        Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
    })
}

fn non_negative(key: &str, value: f64, default: f64) -> f64 {
    if value < 0.0 {
        warn!(key, value, default, "ignoring negative setting");
        return default;
    }
    value
}

fn parse_number(key: &str, raw: Option<String>, default: f64) -> f64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            warn!(key, value = %raw, default, "ignoring malformed numeric setting");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = FreightlineConfig::from_lookup(lookup(&[]));
        assert_eq!(config, FreightlineConfig::default());
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.tariff.base_fee, 5000.0);
    }

    #[test]
    fn overrides_are_applied() {
        let config = FreightlineConfig::from_lookup(lookup(&[
            (FLEET_URL_ENV, "http://fleet:9000"),
            (TARIFF_BASE_FEE_ENV, "100"),
            (HTTP_TIMEOUT_ENV, "2"),
            (DB_PATH_ENV, ":memory:"),
        ]));
        assert_eq!(config.fleet_url, "http://fleet:9000");
        assert_eq!(config.tariff.base_fee, 100.0);
        assert_eq!(config.http_timeout, Duration::from_secs(2));
        assert_eq!(config.db_path, PathBuf::from(":memory:"));
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let config = FreightlineConfig::from_lookup(lookup(&[
            (TARIFF_SPEED_ENV, "fast"),
            (DEPOSIT_MARGIN_ENV, "NaN"),
        ]));
        assert_eq!(config.tariff.average_speed_kmh, 60.0);
        assert_eq!(config.deposit_margin, DEFAULT_DETOUR_MARGIN);
    }

    #[test]
    fn huge_timeout_falls_back_instead_of_panicking() {
        let config = FreightlineConfig::from_lookup(lookup(&[(HTTP_TIMEOUT_ENV, "1e30")]));
        assert_eq!(config.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    }

    #[test]
    fn tiny_timeout_is_raised_to_floor() {
        let config = FreightlineConfig::from_lookup(lookup(&[(HTTP_TIMEOUT_ENV, "0")]));
        assert_eq!(config.http_timeout, Duration::from_millis(100));
    }

    #[test]
    fn negative_deposit_margin_falls_back() {
        let config = FreightlineConfig::from_lookup(lookup(&[(DEPOSIT_MARGIN_ENV, "-0.2")]));
        assert_eq!(config.deposit_margin, DEFAULT_DETOUR_MARGIN);

        let zero = FreightlineConfig::from_lookup(lookup(&[(DEPOSIT_MARGIN_ENV, "0")]));
        assert_eq!(zero.deposit_margin, 0.0);
    }
}
