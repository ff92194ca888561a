//! Fixtures for handler tests.
//!
//! State built here runs on an in-memory store with the in-process
//! collaborator fakes from `freightline_lib::test_helpers`, so no network or
//! disk is touched. Each call returns an independent state.

use freightline_lib::test_helpers::{Fixture, FixtureBuilder};
use freightline_lib::TariffEngine;

use crate::state::AppState;

pub use freightline_lib::test_helpers;

/// Deposit margin used by test state.
pub const TEST_DEPOSIT_MARGIN: f64 = 0.15;

/// Fresh state with the default fixture (702 km / 7.5 h provider, two trucks).
pub fn test_state() -> AppState {
    test_state_with(FixtureBuilder::new()).0
}

/// State over a customised fixture. The returned [`Fixture`] shares the
/// fakes with the state, so tests can inspect call counts afterwards.
///
/// # Panics
///
/// Panics if the fixture's tariff is invalid.
pub fn test_state_with(builder: FixtureBuilder) -> (AppState, Fixture) {
    let fixture = builder.build();
    let tariff = TariffEngine::new(*fixture.shipments.tariff().config())
        .unwrap_or_else(|e| panic!("fixture tariff rejected: {e}"));
    let state = AppState::from_components(
        fixture.store.clone(),
        fixture.collaborators.clone(),
        tariff,
        TEST_DEPOSIT_MARGIN,
    );
    (state, fixture)
}

/// A unique request id for tests.
pub fn test_request_id() -> String {
    format!("test-{}", uuid::Uuid::now_v7())
}
