//! Parsing of command-line values and input files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use freightline_lib::{Coordinates, Deposit, Location};

/// Parse `"LAT,LON"` in decimal degrees. Used as a clap value parser.
pub fn parse_coordinates(value: &str) -> Result<Coordinates, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON but got '{value}'"))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude {latitude} is outside -90..90"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("longitude {longitude} is outside -180..180"));
    }
    Ok(Coordinates::new(latitude, longitude))
}

/// A coordinate pair when the text parses as one, otherwise a free-text address.
pub fn parse_location(value: &str) -> Location {
    match parse_coordinates(value) {
        Ok(coordinates) => Location::Coordinates(coordinates),
        Err(_) => Location::Address(value.trim().to_string()),
    }
}

/// Read a JSON array of deposits, in the shape the management service publishes.
pub fn load_deposits(path: &Path) -> Result<Vec<Deposit>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read deposits from {}", path.display()))?;
    let deposits: Vec<Deposit> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of deposits", path.display()))?;
    tracing::debug!(count = deposits.len(), path = %path.display(), "deposits loaded");
    Ok(deposits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_parse_with_spaces() {
        let c = parse_coordinates("-31.42, -64.18").unwrap();
        assert_eq!(c, Coordinates::new(-31.42, -64.18));
    }

    #[test]
    fn coordinates_reject_out_of_range() {
        assert!(parse_coordinates("91,0").is_err());
        assert!(parse_coordinates("0,181").is_err());
        assert!(parse_coordinates("north,0").is_err());
        assert!(parse_coordinates("12.5").is_err());
    }

    #[test]
    fn location_falls_back_to_address() {
        assert_eq!(
            parse_location(" Rosario, Santa Fe "),
            Location::Address("Rosario, Santa Fe".to_string())
        );
        assert_eq!(
            parse_location("-32.95,-60.66"),
            Location::Coordinates(Coordinates::new(-32.95, -60.66))
        );
    }

    #[test]
    fn deposits_file_accepts_missing_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deposits.json");
        fs::write(&path, r#"[{"id": 1, "name": "Norte"}, {"id": 2, "latitude": -32.4, "longitude": -63.2}]"#)
            .unwrap();

        let deposits = load_deposits(&path).unwrap();
        assert_eq!(deposits.len(), 2);
        assert!(deposits[0].coordinates().is_none());
        assert!(deposits[1].coordinates().is_some());
    }

    #[test]
    fn deposits_file_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let err = load_deposits(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
