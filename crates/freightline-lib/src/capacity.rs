//! Fleet capacity gate used before a truck is assigned to a leg.

use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::{FleetDirectory, Truck};
use crate::error::{BusinessRuleViolation, Result};
use crate::model::LegId;

/// Confirms that a chosen truck can carry a load by asking the fleet service.
#[derive(Clone)]
pub struct CapacityValidator {
    fleet: Arc<dyn FleetDirectory>,
}

impl CapacityValidator {
    pub fn new(fleet: Arc<dyn FleetDirectory>) -> Self {
        Self { fleet }
    }

    /// Returns the eligible truck record matching `truck_id`.
    ///
    /// # Errors
    /// * [`BusinessRuleViolation::NoEligibleTruck`] when no truck fits the load.
    /// * [`BusinessRuleViolation::TruckNotEligible`] when `truck_id` is not among them.
    /// * `DependencyUnavailable` when the fleet service cannot be reached.
    pub fn validate(
        &self,
        leg_id: LegId,
        truck_id: &str,
        weight_kg: f64,
        volume_m3: f64,
    ) -> Result<Truck> {
        let eligible = self.fleet.eligible_trucks(weight_kg, volume_m3)?;
        debug!(leg_id, count = eligible.len(), "fleet returned eligible trucks");

        if eligible.is_empty() {
            info!(leg_id, weight_kg, volume_m3, "no truck can carry load");
            return Err(BusinessRuleViolation::NoEligibleTruck {
                weight_kg,
                volume_m3,
            }
            .into());
        }

        let ids: Vec<String> = eligible.iter().map(|t| t.id.clone()).collect();
        match eligible.into_iter().find(|t| t.id == truck_id) {
            Some(truck) => Ok(truck),
            None => {
                info!(leg_id, truck_id, "truck rejected by capacity check");
                Err(BusinessRuleViolation::TruckNotEligible {
                    truck_id: truck_id.to_string(),
                    eligible: ids,
                }
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::test_helpers::{truck, StaticFleet};

    fn validator(fleet: StaticFleet) -> CapacityValidator {
        CapacityValidator::new(Arc::new(fleet))
    }

    #[test]
    fn accepts_truck_in_eligible_set() {
        let fleet = StaticFleet::new(vec![truck("AA111AA", 30_000.0, 60.0)]);
        let chosen = validator(fleet)
            .validate(1, "AA111AA", 10_000.0, 30.0)
            .expect("eligible");
        assert_eq!(chosen.id, "AA111AA");
    }

    #[test]
    fn empty_fleet_is_no_eligible_truck() {
        let fleet = StaticFleet::new(vec![truck("AA111AA", 20_000.0, 60.0)]);
        let err = validator(fleet)
            .validate(1, "AA111AA", 50_000.0, 30.0)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::BusinessRule(BusinessRuleViolation::NoEligibleTruck { .. })
        ));
    }

    #[test]
    fn unknown_truck_lists_eligible_ones() {
        let fleet = StaticFleet::new(vec![
            truck("AA111AA", 30_000.0, 60.0),
            truck("BB222BB", 40_000.0, 80.0),
        ]);
        let err = validator(fleet)
            .validate(1, "CC333CC", 10_000.0, 30.0)
            .unwrap_err();
        match err {
            Error::BusinessRule(BusinessRuleViolation::TruckNotEligible { truck_id, eligible }) => {
                assert_eq!(truck_id, "CC333CC");
                assert_eq!(eligible, vec!["AA111AA".to_string(), "BB222BB".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn fleet_outage_is_not_a_business_rule() {
        let err = validator(StaticFleet::unavailable())
            .validate(1, "AA111AA", 10.0, 1.0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
    }
}
