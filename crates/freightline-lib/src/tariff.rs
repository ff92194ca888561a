//! Tariff and cost engine.
//!
//! All prices come from an injected [`TariffConfig`] so deployments can tune
//! them without a rebuild and tests can pin them to round numbers.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Consumption reported by [`TariffEngine::average_consumption`] for an empty fleet.
///
/// This is a placeholder, not the consumption of any real truck.
pub const FALLBACK_CONSUMPTION: f64 = 0.1;

/// Pricing parameters used by the [`TariffEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TariffConfig {
    /// Flat fee charged once per leg.
    pub base_fee: f64,
    /// Fuel price per litre.
    pub fuel_price_per_liter: f64,
    /// Per-km rate used for estimates, before a truck is known.
    pub base_rate_per_km: f64,
    /// Average speed used to turn distance into travel time.
    pub average_speed_kmh: f64,
    /// Litres per km assumed for route estimates when no fleet data is available.
    pub assumed_consumption: f64,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            base_fee: 5000.0,
            fuel_price_per_liter: 1200.0,
            base_rate_per_km: 150.0,
            average_speed_kmh: 60.0,
            assumed_consumption: 0.15,
        }
    }
}

impl TariffConfig {
    /// Validate the tariff configuration.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("base_fee", self.base_fee),
            ("fuel_price_per_liter", self.fuel_price_per_liter),
            ("base_rate_per_km", self.base_rate_per_km),
            ("average_speed_kmh", self.average_speed_kmh),
            ("assumed_consumption", self.assumed_consumption),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::TariffConfig {
                    message: format!("{name} must be a finite non-negative number, got {value}"),
                });
            }
        }

        if self.average_speed_kmh == 0.0 {
            return Err(Error::TariffConfig {
                message: "average_speed_kmh must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// A specific truck's pricing figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruckFigures {
    pub rate_per_km: f64,
    /// Litres per km.
    pub consumption: f64,
}

/// A stay in a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageStay {
    pub days: f64,
    pub rate_per_day: f64,
}

/// What to price in [`TariffEngine::quote`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteInput {
    pub distance_km: f64,
    pub average_consumption: Option<f64>,
    pub truck: Option<TruckFigures>,
    pub storage: Option<StorageStay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub distance_km: f64,
    pub average_consumption: f64,
    pub estimated_cost: f64,
    pub estimated_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_cost: Option<f64>,
}

/// Stateless cost calculator parameterised by a validated [`TariffConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TariffEngine {
    config: TariffConfig,
}

impl TariffEngine {
    /// Build an engine, rejecting configurations that would produce nonsense.
    pub fn new(config: TariffConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TariffConfig {
        &self.config
    }

    /// `base_fee + d * base_rate_per_km + d * consumption * fuel_price`.
    ///
    /// ```
    /// use freightline_lib::tariff::{TariffConfig, TariffEngine};
    ///
    /// let engine = TariffEngine::new(TariffConfig::default()).unwrap();
    /// // 5000 + 100*150 + 100*0.1*1200
    /// assert_eq!(engine.estimated_leg_cost(100.0, 0.1), 32_000.0);
    /// ```
    pub fn estimated_leg_cost(&self, distance_km: f64, avg_consumption: f64) -> f64 {
        self.config.base_fee
            + distance_km * self.config.base_rate_per_km
            + distance_km * avg_consumption * self.config.fuel_price_per_liter
    }

    /// Same shape as the estimate, priced with the truck's own rate and consumption.
    pub fn real_leg_cost(
        &self,
        distance_km: f64,
        truck_rate_per_km: f64,
        truck_consumption: f64,
    ) -> f64 {
        self.config.base_fee
            + distance_km * truck_rate_per_km
            + distance_km * truck_consumption * self.config.fuel_price_per_liter
    }

    pub fn estimated_travel_hours(&self, distance_km: f64) -> f64 {
        distance_km / self.config.average_speed_kmh
    }

    pub fn storage_cost(&self, days: f64, rate_per_day: f64) -> f64 {
        days * rate_per_day
    }

    /// Price a distance the way a leg would be priced, for ad-hoc quotes.
    ///
    /// Without an average consumption the configured `assumed_consumption` is used.
    pub fn quote(&self, input: &QuoteInput) -> Quote {
        let average_consumption = input
            .average_consumption
            .unwrap_or(self.config.assumed_consumption);
        Quote {
            distance_km: input.distance_km,
            average_consumption,
            estimated_cost: self.estimated_leg_cost(input.distance_km, average_consumption),
            estimated_hours: self.estimated_travel_hours(input.distance_km),
            real_cost: input.truck.map(|truck| {
                self.real_leg_cost(input.distance_km, truck.rate_per_km, truck.consumption)
            }),
            storage_cost: input
                .storage
                .map(|stay| self.storage_cost(stay.days, stay.rate_per_day)),
        }
    }

    /// Arithmetic mean of `consumptions`, or [`FALLBACK_CONSUMPTION`] when empty.
    pub fn average_consumption(consumptions: &[f64]) -> f64 {
        if consumptions.is_empty() {
            return FALLBACK_CONSUMPTION;
        }
        consumptions.iter().sum::<f64>() / consumptions.len() as f64
    }
}
