//! Great-circle distances and the deposit-on-route heuristic.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by [`haversine_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default detour tolerance: a deposit may lengthen the trip by at most 15%.
pub const DEFAULT_DETOUR_MARGIN: f64 = 0.15;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another point in kilometres.
    pub fn distance_to(&self, other: &Self) -> f64 {
        haversine_km(self, other)
    }
}

/// Haversine distance between two points on a sphere of radius [`EARTH_RADIUS_KM`].
///
/// ```
/// use freightline_lib::geo::{haversine_km, Coordinates};
///
/// let cordoba = Coordinates::new(-31.4201, -64.1888);
/// let buenos_aires = Coordinates::new(-34.6037, -58.3816);
/// let d = haversine_km(&cordoba, &buenos_aires);
/// assert!((640.0..660.0).contains(&d));
/// ```
pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// A storage deposit as published by the management service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Storage price per day, when the deposit publishes one.
    #[serde(default)]
    pub daily_rate: Option<f64>,
}

impl Deposit {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

/// Returns the deposits worth stopping at between `origin` and `destination`.
///
/// A deposit qualifies when passing through it adds no more than
/// `margin_ratio` of the direct distance. Deposits without coordinates are
/// skipped. Results are ordered by their distance from `origin`.
pub fn find_on_route(
    origin: &Coordinates,
    destination: &Coordinates,
    candidates: &[Deposit],
    margin_ratio: f64,
) -> Vec<Deposit> {
    let direct = haversine_km(origin, destination);
    let tolerance = direct * margin_ratio;

    let mut matches: Vec<(f64, &Deposit)> = candidates
        .iter()
        .filter_map(|deposit| {
            let point = deposit.coordinates()?;
            let from_origin = haversine_km(origin, &point);
            let detour = from_origin + haversine_km(&point, destination);
            (detour - direct <= tolerance).then_some((from_origin, deposit))
        })
        .collect();

    matches.sort_by(|a, b| a.0.total_cmp(&b.0));
    matches.into_iter().map(|(_, d)| d.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit(id: i64, lat: Option<f64>, lon: Option<f64>) -> Deposit {
        Deposit {
            id,
            name: format!("Deposit {id}"),
            address: String::new(),
            latitude: lat,
            longitude: lon,
            daily_rate: None,
        }
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_identity() {
        let a = Coordinates::new(-31.4201, -64.1888);
        let b = Coordinates::new(-34.6037, -58.3816);
        assert!((haversine_km(&a, &b) - haversine_km(&b, &a)).abs() < 1e-9);
        assert_eq!(haversine_km(&a, &a), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(1.0, 0.0);
        let d = haversine_km(&a, &b);
        assert!((d - 111.195).abs() < 0.01, "got {d}");
    }

    #[test]
    fn deposits_at_endpoints_qualify() {
        let origin = Coordinates::new(-31.4201, -64.1888);
        let destination = Coordinates::new(-34.6037, -58.3816);
        let candidates = vec![
            deposit(1, Some(destination.latitude), Some(destination.longitude)),
            deposit(2, Some(origin.latitude), Some(origin.longitude)),
        ];

        let found = find_on_route(&origin, &destination, &candidates, DEFAULT_DETOUR_MARGIN);
        let ids: Vec<i64> = found.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn far_detours_are_rejected_and_missing_coordinates_skipped() {
        let origin = Coordinates::new(-31.4201, -64.1888);
        let destination = Coordinates::new(-34.6037, -58.3816);
        let candidates = vec![
            // Villa María sits close to the straight line.
            deposit(1, Some(-32.4075), Some(-63.2402)),
            // Mendoza is far to the west.
            deposit(2, Some(-32.8895), Some(-68.8458)),
            deposit(3, None, Some(-60.0)),
        ];

        let found = find_on_route(&origin, &destination, &candidates, DEFAULT_DETOUR_MARGIN);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn results_are_ordered_by_distance_from_origin() {
        let origin = Coordinates::new(0.0, 0.0);
        let destination = Coordinates::new(0.0, 10.0);
        let candidates = vec![
            deposit(1, Some(0.0), Some(8.0)),
            deposit(2, Some(0.0), Some(2.0)),
            deposit(3, Some(0.0), Some(5.0)),
        ];

        let found = find_on_route(&origin, &destination, &candidates, 0.01);
        let ids: Vec<i64> = found.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
