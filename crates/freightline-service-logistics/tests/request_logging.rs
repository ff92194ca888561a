//! Lifecycle events are logged at `info` by the library; handlers only add
//! request-scoped detail at `debug`.

use std::fmt;
use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use serde_json::{json, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use freightline_service_logistics::router;
use freightline_service_shared::test_utils::test_state;
use freightline_service_shared::MetricsConfig;

type Captured = Arc<Mutex<Vec<(Level, String)>>>;

struct Capture(Captured);

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

fn info_messages(captured: &Captured) -> Vec<String> {
    captured
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, _)| *level == Level::INFO)
        .map(|(_, message)| message.clone())
        .collect()
}

#[tokio::test(flavor = "current_thread")]
async fn test_creation_handlers_do_not_repeat_library_info_logs() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::registry().with(Capture(captured.clone()));
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = TestServer::new(router(test_state(), &MetricsConfig::default())).unwrap();
    let created = server
        .post("/shipments")
        .json(&json!({
            "tracking_code": "TRK-LOG-1",
            "container_id": 10,
            "customer_id": 20,
            "origin": { "address": "Córdoba, Argentina" },
            "destination": { "address": "Buenos Aires, Argentina" }
        }))
        .await;
    let id = created.json::<Value>()["id"].as_i64().unwrap();
    let assignment = server.post(&format!("/shipments/{id}/route")).await.json::<Value>();
    let route_id = assignment["route"]["id"].as_i64().unwrap();
    server
        .post("/legs")
        .json(&json!({
            "route_id": route_id,
            "origin": "Buenos Aires, Argentina",
            "destination": "La Plata, Argentina",
            "distance_km": 60.0
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let info = info_messages(&captured);
    assert!(
        info.iter().any(|m| m == "request completed"),
        "request log missing: {info:?}"
    );
    for duplicate in ["shipment created", "leg created", "route assigned"] {
        assert!(
            !info.iter().any(|m| m == duplicate),
            "handler logged '{duplicate}' at info: {info:?}"
        );
    }

    let debug_count = captured
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, m)| *level == Level::DEBUG && m == "shipment created")
        .count();
    assert_eq!(debug_count, 1);
}
