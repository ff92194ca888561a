//! Application state for the freightline HTTP services.
//!
//! Handlers reach the shipment and leg lifecycles through [`AppState`]. All
//! calls into it block (SQLite and the collaborator clients are synchronous),
//! so async handlers should run them on `tokio::task::spawn_blocking`.

use std::sync::Arc;

use freightline_lib::{
    Collaborators, Error as LibError, FreightlineConfig, LegManager, ShipmentManager, Store,
    TariffEngine,
};

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// The SQLite store could not be opened or migrated.
    StoreOpen(LibError),

    /// A collaborator client could not be built.
    Collaborators(LibError),

    /// The configured tariff parameters are invalid.
    Tariff(LibError),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreOpen(e) => write!(f, "failed to open store: {}", e),
            Self::Collaborators(e) => write!(f, "failed to build collaborator clients: {}", e),
            Self::Tariff(e) => write!(f, "failed to load tariff: {}", e),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StoreOpen(e) | Self::Collaborators(e) | Self::Tariff(e) => Some(e),
        }
    }
}

/// Shared application state for all axum handlers.
///
/// Cheaply cloneable (`Arc` internally); share it via axum's `State` extractor.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::get, extract::State};
/// use freightline_service_shared::AppState;
///
/// async fn handler(State(state): State<AppState>) {
///     let shipments = state.shipments().clone();
///     // ...
/// }
///
/// let state = AppState::load(&FreightlineConfig::from_env()).unwrap();
/// let app = Router::new().route("/shipments", get(handler)).with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<Store>,
    shipments: ShipmentManager,
    legs: LegManager,
}

impl AppState {
    /// Open the store and wire the collaborator clients described by `config`.
    ///
    /// The collaborator clients are blocking `reqwest` clients; call this
    /// outside of an async context.
    pub fn load(config: &FreightlineConfig) -> Result<Self, AppStateError> {
        tracing::info!(path = %config.db_path.display(), "opening store");
        let store = Store::open(&config.db_path).map_err(AppStateError::StoreOpen)?;
        let collaborators =
            Collaborators::from_config(config).map_err(AppStateError::Collaborators)?;
        let tariff = TariffEngine::new(config.tariff).map_err(AppStateError::Tariff)?;
        tracing::info!(
            management_url = %config.management_url,
            fleet_url = %config.fleet_url,
            "collaborator clients ready"
        );

        Ok(Self::from_components(
            Arc::new(store),
            collaborators,
            tariff,
            config.deposit_margin,
        ))
    }

    /// Create application state from already-built components.
    pub fn from_components(
        store: Arc<Store>,
        collaborators: Collaborators,
        tariff: TariffEngine,
        deposit_margin: f64,
    ) -> Self {
        let legs = LegManager::new(store.clone(), collaborators.fleet.clone(), tariff);
        let shipments = ShipmentManager::new(store.clone(), collaborators, tariff)
            .with_deposit_margin(deposit_margin);
        Self {
            inner: Arc::new(AppStateInner {
                store,
                shipments,
                legs,
            }),
        }
    }

    pub fn shipments(&self) -> &ShipmentManager {
        &self.inner.shipments
    }

    pub fn legs(&self) -> &LegManager {
        &self.inner.legs
    }

    pub fn tariff(&self) -> &TariffEngine {
        self.inner.shipments.tariff()
    }

    /// Whether the store still answers queries.
    pub fn is_ready(&self) -> bool {
        match self.inner.store.ping() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "store ping failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tariff", self.tariff().config())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freightline_lib::test_helpers::FixtureBuilder;
    use freightline_lib::TariffConfig;

    #[test]
    fn test_from_components_is_ready() {
        let fixture = FixtureBuilder::new().build();
        let tariff = TariffEngine::new(TariffConfig::default()).unwrap();
        let state = AppState::from_components(fixture.store, fixture.collaborators, tariff, 0.15);

        assert!(state.is_ready());
        assert_eq!(state.tariff().config().base_fee, 5000.0);
    }

    #[test]
    fn test_load_rejects_invalid_tariff() {
        let mut config = FreightlineConfig::default();
        config.db_path = ":memory:".into();
        config.tariff.average_speed_kmh = 0.0;

        let err = AppState::load(&config).unwrap_err();
        assert!(matches!(err, AppStateError::Tariff(_)));
        assert!(err.to_string().contains("tariff"));
    }

    #[test]
    fn test_debug_shows_tariff() {
        let fixture = FixtureBuilder::new().build();
        let tariff = TariffEngine::new(TariffConfig::default()).unwrap();
        let state = AppState::from_components(fixture.store, fixture.collaborators, tariff, 0.15);
        assert!(format!("{:?}", state).contains("AppState"));
    }
}
