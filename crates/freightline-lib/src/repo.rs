//! Row-level persistence helpers operating on a borrowed connection.
//!
//! Callers decide the transaction boundary; every function here accepts a
//! `&Connection` so it works equally inside [`Store::read`] and
//! [`Store::write`].
//!
//! [`Store::read`]: crate::db::Store::read
//! [`Store::write`]: crate::db::Store::write

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::{Error, Result};
use crate::geo::Coordinates;
use crate::model::{
    Leg, LegFilter, LegId, LegState, NewLeg, NewShipment, Place, Route, RouteId, Shipment, ShipmentFilter,
    ShipmentId, ShipmentState,
};

const SHIPMENT_COLUMNS: &str = "id, tracking_code, container_id, customer_id, \
    origin_address, origin_lat, origin_lon, destination_address, destination_lat, destination_lon, \
    state, estimated_cost, estimated_hours, final_cost, final_hours, created_at, scheduled_at, delivered_at";

const LEG_COLUMNS: &str = "id, route_id, sequence, truck_id, origin, destination, distance_km, \
    state, planned_start, planned_end, actual_start, actual_end, real_cost";

fn place(address: String, lat: Option<f64>, lon: Option<f64>) -> Place {
    let coordinates = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
        _ => None,
    };
    Place {
        address,
        coordinates,
    }
}

fn shipment_from_row(row: &Row<'_>) -> rusqlite::Result<Shipment> {
    Ok(Shipment {
        id: row.get(0)?,
        tracking_code: row.get(1)?,
        container_id: row.get(2)?,
        customer_id: row.get(3)?,
        origin: place(row.get(4)?, row.get(5)?, row.get(6)?),
        destination: place(row.get(7)?, row.get(8)?, row.get(9)?),
        state: row.get(10)?,
        estimated_cost: row.get(11)?,
        estimated_hours: row.get(12)?,
        final_cost: row.get(13)?,
        final_hours: row.get(14)?,
        created_at: row.get(15)?,
        scheduled_at: row.get(16)?,
        delivered_at: row.get(17)?,
    })
}

fn leg_from_row(row: &Row<'_>) -> rusqlite::Result<Leg> {
    Ok(Leg {
        id: row.get(0)?,
        route_id: row.get(1)?,
        sequence: row.get(2)?,
        truck_id: row.get(3)?,
        origin: row.get(4)?,
        destination: row.get(5)?,
        distance_km: row.get(6)?,
        state: row.get(7)?,
        planned_start: row.get(8)?,
        planned_end: row.get(9)?,
        actual_start: row.get(10)?,
        actual_end: row.get(11)?,
        real_cost: row.get(12)?,
    })
}

fn route_from_row(row: &Row<'_>) -> rusqlite::Result<Route> {
    Ok(Route {
        id: row.get(0)?,
        shipment_id: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Insert a shipment in state `DRAFT`.
pub fn insert_shipment(
    conn: &Connection,
    new: &NewShipment,
    now: DateTime<Utc>,
) -> Result<Shipment> {
    let origin = new.origin.coordinates;
    let destination = new.destination.coordinates;
    conn.execute(
        "INSERT INTO shipments (tracking_code, container_id, customer_id, \
            origin_address, origin_lat, origin_lon, \
            destination_address, destination_lat, destination_lon, state, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            new.tracking_code,
            new.container_id,
            new.customer_id,
            new.origin.address,
            origin.map(|c| c.latitude),
            origin.map(|c| c.longitude),
            new.destination.address,
            destination.map(|c| c.latitude),
            destination.map(|c| c.longitude),
            ShipmentState::Draft,
            now,
        ],
    )
    .map_err(|err| {
        if is_unique_violation(&err) {
            Error::DuplicateKey {
                field: "tracking_code",
                value: new.tracking_code.clone(),
            }
        } else {
            Error::Storage(err)
        }
    })?;

    let id = conn.last_insert_rowid();
    require_shipment(conn, id)
}

pub fn find_shipment(conn: &Connection, id: ShipmentId) -> Result<Option<Shipment>> {
    let sql = format!("SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = ?1");
    Ok(conn
        .query_row(&sql, [id], shipment_from_row)
        .optional()?)
}

pub fn require_shipment(conn: &Connection, id: ShipmentId) -> Result<Shipment> {
    find_shipment(conn, id)?.ok_or_else(|| Error::not_found("shipment", id))
}

/// List shipments matching every populated field of `filter`, ordered by id.
pub fn list_shipments(conn: &Connection, filter: &ShipmentFilter) -> Result<Vec<Shipment>> {
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(customer_id) = filter.customer_id {
        clauses.push("customer_id = ?");
        values.push(Value::Integer(customer_id));
    }
    if let Some(container_id) = filter.container_id {
        clauses.push("container_id = ?");
        values.push(Value::Integer(container_id));
    }
    if let Some(state) = filter.state {
        clauses.push("state = ?");
        values.push(Value::Text(state.as_str().to_string()));
    }
    if let Some(code) = &filter.tracking_code {
        clauses.push("tracking_code = ?");
        values.push(Value::Text(code.clone()));
    }

    let mut sql = format!("SELECT {SHIPMENT_COLUMNS} FROM shipments");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), shipment_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Record the route estimate and move the shipment to `SCHEDULED`.
pub fn schedule_shipment(
    conn: &Connection,
    id: ShipmentId,
    estimated_cost: f64,
    estimated_hours: f64,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "UPDATE shipments SET state = ?1, estimated_cost = ?2, estimated_hours = ?3, scheduled_at = ?4 \
         WHERE id = ?5",
        params![ShipmentState::Scheduled, estimated_cost, estimated_hours, now, id],
    )?;
    Ok(())
}

/// Record final totals and move the shipment to `DELIVERED`.
pub fn deliver_shipment(
    conn: &Connection,
    id: ShipmentId,
    final_cost: f64,
    final_hours: f64,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "UPDATE shipments SET state = ?1, final_cost = ?2, final_hours = ?3, delivered_at = ?4 \
         WHERE id = ?5",
        params![ShipmentState::Delivered, final_cost, final_hours, now, id],
    )?;
    Ok(())
}

pub fn set_shipment_state(conn: &Connection, id: ShipmentId, state: ShipmentState) -> Result<()> {
    conn.execute(
        "UPDATE shipments SET state = ?1 WHERE id = ?2",
        params![state, id],
    )?;
    Ok(())
}

/// Delete a shipment; routes and legs go with it through `ON DELETE CASCADE`.
pub fn delete_shipment(conn: &Connection, id: ShipmentId) -> Result<bool> {
    let affected = conn.execute("DELETE FROM shipments WHERE id = ?1", [id])?;
    Ok(affected > 0)
}

pub fn insert_route(conn: &Connection, shipment_id: ShipmentId, now: DateTime<Utc>) -> Result<Route> {
    conn.execute(
        "INSERT INTO routes (shipment_id, created_at) VALUES (?1, ?2)",
        params![shipment_id, now],
    )?;
    Ok(Route {
        id: conn.last_insert_rowid(),
        shipment_id,
        created_at: now,
    })
}

pub fn find_route(conn: &Connection, id: RouteId) -> Result<Option<Route>> {
    Ok(conn
        .query_row(
            "SELECT id, shipment_id, created_at FROM routes WHERE id = ?1",
            [id],
            route_from_row,
        )
        .optional()?)
}

/// The authoritative route of a shipment: the most recently created one.
pub fn route_for_shipment(conn: &Connection, shipment_id: ShipmentId) -> Result<Option<Route>> {
    Ok(conn
        .query_row(
            "SELECT id, shipment_id, created_at FROM routes WHERE shipment_id = ?1 \
             ORDER BY id DESC LIMIT 1",
            [shipment_id],
            route_from_row,
        )
        .optional()?)
}

/// Append a leg in state `ESTIMATED` at the end of its route.
pub fn insert_leg(conn: &Connection, new: &NewLeg) -> Result<Leg> {
    let next_sequence: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sequence), 0) + 1 FROM legs WHERE route_id = ?1",
        [new.route_id],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO legs (route_id, sequence, origin, destination, distance_km, state, \
            planned_start, planned_end) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.route_id,
            next_sequence,
            new.origin,
            new.destination,
            new.distance_km,
            LegState::Estimated,
            new.planned_start,
            new.planned_end,
        ],
    )?;
    require_leg(conn, conn.last_insert_rowid())
}

pub fn find_leg(conn: &Connection, id: LegId) -> Result<Option<Leg>> {
    let sql = format!("SELECT {LEG_COLUMNS} FROM legs WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], leg_from_row).optional()?)
}

pub fn require_leg(conn: &Connection, id: LegId) -> Result<Leg> {
    find_leg(conn, id)?.ok_or_else(|| Error::not_found("leg", id))
}

pub fn legs_for_route(conn: &Connection, route_id: RouteId) -> Result<Vec<Leg>> {
    list_legs(
        conn,
        &LegFilter {
            route_id: Some(route_id),
            ..LegFilter::default()
        },
    )
}

/// List legs matching every populated field of `filter`, ordered by route then sequence.
pub fn list_legs(conn: &Connection, filter: &LegFilter) -> Result<Vec<Leg>> {
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(route_id) = filter.route_id {
        clauses.push("route_id = ?");
        values.push(Value::Integer(route_id));
    }
    if let Some(truck_id) = &filter.truck_id {
        clauses.push("truck_id = ?");
        values.push(Value::Text(truck_id.clone()));
    }
    if let Some(state) = filter.state {
        clauses.push("state = ?");
        values.push(Value::Text(state.as_str().to_string()));
    }

    let mut sql = format!("SELECT {LEG_COLUMNS} FROM legs");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY route_id, sequence");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), leg_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Persist every mutable column of `leg`.
pub fn update_leg(conn: &Connection, leg: &Leg) -> Result<()> {
    conn.execute(
        "UPDATE legs SET truck_id = ?1, distance_km = ?2, state = ?3, actual_start = ?4, \
            actual_end = ?5, real_cost = ?6 WHERE id = ?7",
        params![
            leg.truck_id,
            leg.distance_km,
            leg.state,
            leg.actual_start,
            leg.actual_end,
            leg.real_cost,
            leg.id,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    fn new_shipment(code: &str) -> NewShipment {
        NewShipment {
            tracking_code: code.to_string(),
            container_id: 10,
            customer_id: 20,
            origin: Place::address("Córdoba, Argentina").with_coordinates(-31.42, -64.19),
            destination: Place::address("Buenos Aires, Argentina"),
        }
    }

    #[test]
    fn shipment_round_trips_through_sqlite() {
        let store = Store::open_in_memory().expect("open");
        let now = Utc::now();
        let inserted = store
            .write(|tx| insert_shipment(tx, &new_shipment("SEG-0001"), now))
            .expect("insert");

        assert_eq!(inserted.state, ShipmentState::Draft);
        assert_eq!(inserted.origin.coordinates, Some(Coordinates::new(-31.42, -64.19)));
        assert_eq!(inserted.destination.coordinates, None);
        assert_eq!(inserted.created_at, now);
    }

    #[test]
    fn duplicate_tracking_code_maps_to_duplicate_key() {
        let store = Store::open_in_memory().expect("open");
        let now = Utc::now();
        store
            .write(|tx| insert_shipment(tx, &new_shipment("SEG-0001"), now))
            .expect("first insert");
        let err = store
            .write(|tx| insert_shipment(tx, &new_shipment("SEG-0001"), now))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { field: "tracking_code", .. }));
    }

    #[test]
    fn legs_get_sequential_positions_and_filters_apply() {
        let store = Store::open_in_memory().expect("open");
        let now = Utc::now();
        let legs = store
            .write(|tx| {
                let shipment = insert_shipment(tx, &new_shipment("SEG-0002"), now)?;
                let route = insert_route(tx, shipment.id, now)?;
                let mut legs = Vec::new();
                for (from, to) in [("A", "B"), ("B", "C")] {
                    legs.push(insert_leg(
                        tx,
                        &NewLeg {
                            route_id: route.id,
                            origin: from.into(),
                            destination: to.into(),
                            distance_km: 10.0,
                            planned_start: None,
                            planned_end: None,
                        },
                    )?);
                }
                Ok(legs)
            })
            .expect("insert legs");

        assert_eq!(legs[0].sequence, 1);
        assert_eq!(legs[1].sequence, 2);

        let mut second = legs[1].clone();
        second.truck_id = Some("AA111AA".into());
        second.state = LegState::Assigned;
        store.write(|tx| update_leg(tx, &second)).expect("update");

        let assigned = store
            .read(|conn| {
                list_legs(
                    conn,
                    &LegFilter {
                        state: Some(LegState::Assigned),
                        ..LegFilter::default()
                    },
                )
            })
            .expect("list");
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].truck_id.as_deref(), Some("AA111AA"));
    }

    #[test]
    fn deleting_shipment_cascades() {
        let store = Store::open_in_memory().expect("open");
        let now = Utc::now();
        let (shipment_id, route_id) = store
            .write(|tx| {
                let shipment = insert_shipment(tx, &new_shipment("SEG-0003"), now)?;
                let route = insert_route(tx, shipment.id, now)?;
                Ok((shipment.id, route.id))
            })
            .expect("seed");

        assert!(store.write(|tx| delete_shipment(tx, shipment_id)).expect("delete"));
        let route = store.read(|conn| find_route(conn, route_id)).expect("lookup");
        assert!(route.is_none());
    }
}
