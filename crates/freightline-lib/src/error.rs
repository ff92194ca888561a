use std::fmt;

use thiserror::Error;

/// Convenient result alias for the freightline library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a shipment, route, leg, or collaborator record is absent.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Raised when an operation is not legal in the entity's current lifecycle state.
    #[error("cannot {operation} {entity} {id} while it is {state}")]
    InvalidState {
        entity: &'static str,
        id: String,
        state: String,
        operation: &'static str,
    },

    /// Raised when a uniqueness constraint (e.g. tracking code) is violated.
    #[error("{field} '{value}' is already in use")]
    DuplicateKey { field: &'static str, value: String },

    /// A collaborator service could not be reached or answered with an unexpected shape.
    #[error("{service} unavailable: {message}")]
    DependencyUnavailable {
        service: &'static str,
        message: String,
    },

    /// The mapping provider failed to produce a distance for the requested pair.
    #[error("geo lookup failed: {message}")]
    GeoLookupFailed { message: String },

    /// A business rule rejected the operation.
    #[error(transparent)]
    BusinessRule(#[from] BusinessRuleViolation),

    /// Raised when caller supplied values are malformed.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Raised when tariff parameters fail validation.
    #[error("invalid tariff configuration: {message}")]
    TariffConfig { message: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

/// Rejections that are deterministic and never worth retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BusinessRuleViolation {
    /// The fleet has no truck able to carry the requested load.
    #[error("no eligible truck for {weight_kg} kg / {volume_m3} m3")]
    NoEligibleTruck { weight_kg: f64, volume_m3: f64 },

    /// The chosen truck is not among the trucks able to carry the load.
    #[error("truck {truck_id} is not eligible for this load{}", format_eligible(.eligible))]
    TruckNotEligible {
        truck_id: String,
        eligible: Vec<String>,
    },

    /// The shipment references a container the management service does not know.
    #[error("container {container_id} does not exist")]
    ContainerNotFound { container_id: i64 },
}

fn format_eligible(eligible: &[String]) -> String {
    format!("; eligible trucks: {}", eligible.join(", "))
}

/// Coarse classification of [`Error`] used at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    DuplicateKey,
    DependencyUnavailable,
    BusinessRuleViolation,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    /// Only a dependency outage is worth retrying.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::DependencyUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::DuplicateKey => "duplicate_key",
            ErrorKind::DependencyUnavailable => "dependency_unavailable",
            ErrorKind::BusinessRuleViolation => "business_rule_violation",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Internal => "internal",
        };
        f.write_str(label)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InvalidState { .. } => ErrorKind::InvalidState,
            Error::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Error::DependencyUnavailable { .. } | Error::GeoLookupFailed { .. } => {
                ErrorKind::DependencyUnavailable
            }
            Error::BusinessRule(_) => ErrorKind::BusinessRuleViolation,
            Error::InvalidInput { .. } | Error::TariffConfig { .. } => ErrorKind::InvalidInput,
            Error::Storage(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid_state(
        entity: &'static str,
        id: impl ToString,
        state: impl ToString,
        operation: &'static str,
    ) -> Self {
        Error::InvalidState {
            entity,
            id: id.to_string(),
            state: state.to_string(),
            operation,
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truck_not_eligible_names_every_eligible_truck() {
        let err = BusinessRuleViolation::TruckNotEligible {
            truck_id: "AB123CD".to_string(),
            eligible: vec!["AA000AA".to_string(), "ZZ999ZZ".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("AB123CD"));
        assert!(message.contains("AA000AA, ZZ999ZZ"));
    }

    #[test]
    fn geo_failures_are_dependency_outages() {
        let err = Error::GeoLookupFailed {
            message: "ZERO_RESULTS".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
        assert!(err.kind().is_retryable());
    }

    #[test]
    fn business_rules_are_not_retryable() {
        let err: Error = BusinessRuleViolation::NoEligibleTruck {
            weight_kg: 50_000.0,
            volume_m3: 30.0,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::BusinessRuleViolation);
        assert!(!err.kind().is_retryable());
    }

    #[test]
    fn invalid_state_message_names_operation() {
        let err = Error::invalid_state("leg", 7, "ESTIMATED", "finish");
        assert_eq!(err.to_string(), "cannot finish leg 7 while it is ESTIMATED");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}
