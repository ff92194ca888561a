use freightline_lib::test_helpers::{
    fixture, new_shipment, FixtureBuilder, InMemoryContainers, InMemoryCustomers,
    ScriptedDistance, StaticFleet, CUSTOMER_ID,
};
use freightline_lib::{
    BusinessRuleViolation, Error, ErrorKind, EstimateRequest, LegState, Place, ShipmentFilter,
    ShipmentState,
};

#[test]
fn assigning_a_route_schedules_the_shipment_with_one_estimated_leg() {
    let fx = fixture();
    let shipment = fx
        .shipments
        .create(&new_shipment("SEG-0001"))
        .expect("create shipment");
    assert_eq!(shipment.state, ShipmentState::Draft);

    let assignment = fx.shipments.assign_route(shipment.id).expect("assign route");

    assert_eq!(assignment.shipment.state, ShipmentState::Scheduled);
    assert_eq!(assignment.legs.len(), 1);
    let leg = &assignment.legs[0];
    assert_eq!(leg.state, LegState::Estimated);
    assert_eq!(leg.distance_km, 702.0);
    assert_eq!(leg.origin, "Córdoba, Argentina");
    assert_eq!(leg.destination, "Buenos Aires, Argentina");
    assert!(leg.truck_id.is_none());

    let planned_start = leg.planned_start.expect("planned start");
    let planned_end = leg.planned_end.expect("planned end");
    assert_eq!((planned_end - planned_start).num_minutes(), 450);

    // 5000 + 702*150 + 702*0.15*1200
    let cost = assignment.shipment.estimated_cost.expect("estimated cost");
    assert!((cost - 236_660.0).abs() < 1e-6, "got {cost}");
    assert_eq!(assignment.shipment.estimated_hours, Some(7.5));
    assert!(assignment.shipment.final_cost.is_none());
}

#[test]
fn assigning_a_route_twice_is_an_invalid_state() {
    let fx = fixture();
    let shipment = fx.shipments.create(&new_shipment("SEG-0002")).expect("create");
    fx.shipments.assign_route(shipment.id).expect("first assignment");

    let err = fx.shipments.assign_route(shipment.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(fx.distance.calls(), 1, "no provider call after the state check fails");
}

#[test]
fn missing_customer_is_auto_provisioned() {
    let fx = FixtureBuilder::new()
        .customers(InMemoryCustomers::with_ids(&[]))
        .build();
    let shipment = fx.shipments.create(&new_shipment("SEG-0003")).expect("create");

    fx.shipments.assign_route(shipment.id).expect("assign route");

    let created = fx.customers.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].id, CUSTOMER_ID);
    assert_eq!(created[0].surname, format!("AutoGenerated-{CUSTOMER_ID}"));
}

#[test]
fn missing_container_is_a_hard_failure() {
    let fx = FixtureBuilder::new()
        .containers(InMemoryContainers::new(Vec::new()))
        .build();
    let shipment = fx.shipments.create(&new_shipment("SEG-0004")).expect("create");

    let err = fx.shipments.assign_route(shipment.id).unwrap_err();
    assert!(matches!(
        err,
        Error::BusinessRule(BusinessRuleViolation::ContainerNotFound { container_id: 10 })
    ));
    let unchanged = fx.shipments.get(shipment.id).expect("reload");
    assert_eq!(unchanged.state, ShipmentState::Draft);
}

#[test]
fn provider_failure_leaves_shipment_in_draft() {
    let fx = FixtureBuilder::new()
        .distance(ScriptedDistance::failing("ZERO_RESULTS"))
        .build();
    let shipment = fx.shipments.create(&new_shipment("SEG-0005")).expect("create");

    let err = fx.shipments.assign_route(shipment.id).unwrap_err();
    assert!(matches!(err, Error::GeoLookupFailed { .. }));
    assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);

    let unchanged = fx.shipments.get(shipment.id).expect("reload");
    assert_eq!(unchanged.state, ShipmentState::Draft);
    assert!(unchanged.estimated_cost.is_none());
}

#[test]
fn zero_duration_falls_back_to_average_speed() {
    let fx = FixtureBuilder::new()
        .distance(ScriptedDistance::fixed(120.0, 0.0))
        .build();
    let shipment = fx.shipments.create(&new_shipment("SEG-0006")).expect("create");
    let assignment = fx.shipments.assign_route(shipment.id).expect("assign");
    assert_eq!(assignment.shipment.estimated_hours, Some(2.0));
}

#[test]
fn out_of_range_duration_is_a_lookup_failure_not_a_crash() {
    let fx = FixtureBuilder::new()
        .distance(ScriptedDistance::fixed(702.0, 1.0e15))
        .build();
    let shipment = fx.shipments.create(&new_shipment("SEG-0015")).expect("create");

    let err = fx.shipments.assign_route(shipment.id).unwrap_err();
    assert!(matches!(err, Error::GeoLookupFailed { .. }));
    assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);

    let unchanged = fx.shipments.get(shipment.id).expect("reload");
    assert_eq!(unchanged.state, ShipmentState::Draft);
    assert!(fx.legs.list(&Default::default()).expect("legs").is_empty());
}

#[test]
fn negative_provider_distance_is_rejected() {
    let fx = FixtureBuilder::new()
        .distance(ScriptedDistance::fixed(-5.0, 1.0))
        .build();
    let shipment = fx.shipments.create(&new_shipment("SEG-0016")).expect("create");

    let err = fx.shipments.assign_route(shipment.id).unwrap_err();
    assert!(matches!(err, Error::GeoLookupFailed { .. }));
    assert_eq!(
        fx.shipments.get(shipment.id).expect("reload").state,
        ShipmentState::Draft
    );
}

#[test]
fn duplicate_tracking_code_is_rejected_and_first_is_unaffected() {
    let fx = fixture();
    let first = fx.shipments.create(&new_shipment("SEG-0007")).expect("create");

    let mut other = new_shipment("SEG-0007");
    other.customer_id = 99;
    let err = fx.shipments.create(&other).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateKey);

    let reloaded = fx.shipments.by_tracking_code("SEG-0007").expect("lookup");
    assert_eq!(reloaded, first);
}

#[test]
fn blank_tracking_code_is_invalid_input() {
    let fx = fixture();
    let err = fx.shipments.create(&new_shipment("   ")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn unknown_shipment_is_not_found() {
    let fx = fixture();
    assert_eq!(fx.shipments.get(404).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        fx.shipments.assign_route(404).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(fx.shipments.tracking(404).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn cancel_is_allowed_from_draft_and_scheduled_only() {
    let fx = fixture();
    let draft = fx.shipments.create(&new_shipment("SEG-0008")).expect("create");
    let cancelled = fx.shipments.cancel(draft.id).expect("cancel draft");
    assert_eq!(cancelled.state, ShipmentState::Cancelled);

    let again = fx.shipments.cancel(draft.id).unwrap_err();
    assert_eq!(again.kind(), ErrorKind::InvalidState);

    let scheduled = fx.shipments.create(&new_shipment("SEG-0009")).expect("create");
    fx.shipments.assign_route(scheduled.id).expect("assign");
    assert_eq!(
        fx.shipments.cancel(scheduled.id).expect("cancel").state,
        ShipmentState::Cancelled
    );
}

#[test]
fn listing_filters_by_customer_and_state() {
    let fx = fixture();
    let a = fx.shipments.create(&new_shipment("SEG-0010")).expect("create");
    let mut other_customer = new_shipment("SEG-0011");
    other_customer.customer_id = 77;
    fx.shipments.create(&other_customer).expect("create");
    fx.shipments.assign_route(a.id).expect("assign");

    let by_customer = fx
        .shipments
        .list(&ShipmentFilter {
            customer_id: Some(77),
            ..ShipmentFilter::default()
        })
        .expect("list");
    assert_eq!(by_customer.len(), 1);
    assert_eq!(by_customer[0].tracking_code, "SEG-0011");

    let scheduled = fx
        .shipments
        .list(&ShipmentFilter {
            state: Some(ShipmentState::Scheduled),
            ..ShipmentFilter::default()
        })
        .expect("list");
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].id, a.id);
}

#[test]
fn delete_removes_shipment_and_route() {
    let fx = fixture();
    let shipment = fx.shipments.create(&new_shipment("SEG-0012")).expect("create");
    let assignment = fx.shipments.assign_route(shipment.id).expect("assign");

    fx.shipments.delete(shipment.id).expect("delete");
    assert_eq!(fx.shipments.get(shipment.id).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        fx.legs.get(assignment.legs[0].id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(fx.shipments.delete(shipment.id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn estimate_uses_assumed_consumption_without_load_figures() {
    let fx = fixture();
    let estimate = fx
        .shipments
        .estimate_route(&EstimateRequest {
            origin: Place::address("Córdoba, Argentina"),
            destination: Place::address("Buenos Aires, Argentina"),
            weight_kg: None,
            volume_m3: None,
        })
        .expect("estimate");

    assert_eq!(estimate.average_consumption, 0.15);
    assert_eq!(estimate.legs.len(), 1);
    assert_eq!(estimate.legs[0].distance_km, 702.0);
    assert_eq!(fx.fleet.calls(), 0);
}

#[test]
fn estimate_averages_eligible_truck_consumption() {
    let fx = fixture();
    let estimate = fx
        .shipments
        .estimate_route(&EstimateRequest {
            origin: Place::address("Córdoba").with_coordinates(-31.42, -64.19),
            destination: Place::address("Buenos Aires"),
            weight_kg: Some(10_000.0),
            volume_m3: Some(20.0),
        })
        .expect("estimate");

    assert!((estimate.average_consumption - 0.3).abs() < 1e-12);
    assert_eq!(estimate.legs[0].origin, "-31.420000,-64.190000");
    assert_eq!(fx.fleet.calls(), 1);
}

#[test]
fn estimate_with_no_eligible_trucks_uses_fallback_consumption() {
    let fx = FixtureBuilder::new().fleet(StaticFleet::new(Vec::new())).build();
    let estimate = fx
        .shipments
        .estimate_route(&EstimateRequest {
            origin: Place::address("A"),
            destination: Place::address("B"),
            weight_kg: Some(1.0),
            volume_m3: Some(1.0),
        })
        .expect("estimate");
    assert_eq!(estimate.average_consumption, 0.1);
}

#[test]
fn deposits_on_route_come_from_the_management_service() {
    use freightline_lib::{Coordinates, Deposit};

    let deposit = |id: i64, lat: f64, lon: f64| Deposit {
        id,
        name: format!("Deposit {id}"),
        address: String::new(),
        latitude: Some(lat),
        longitude: Some(lon),
        daily_rate: Some(1500.0),
    };
    let fx = FixtureBuilder::new()
        .deposits(vec![
            deposit(1, -33.8, -60.3),
            deposit(2, -32.4075, -63.2402),
            deposit(3, -24.78, -65.41),
        ])
        .build();

    let found = fx
        .shipments
        .deposits_on_route(
            &Coordinates::new(-31.4201, -64.1888),
            &Coordinates::new(-34.6037, -58.3816),
        )
        .expect("search");
    let ids: Vec<i64> = found.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![2, 1]);
}
