//! Rendering of command results as plain text or JSON.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use freightline_lib::{haversine_km, Coordinates, Deposit, DistanceEstimate, Quote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// A deposit on the route together with its distance from the origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepositMatch {
    #[serde(flatten)]
    pub deposit: Deposit,
    pub km_from_origin: f64,
}

impl DepositMatch {
    pub fn from_origin(origin: &Coordinates, deposit: Deposit) -> Self {
        let km_from_origin = deposit
            .coordinates()
            .map(|point| haversine_km(origin, &point))
            .unwrap_or_default();
        Self {
            deposit,
            km_from_origin,
        }
    }
}

pub fn render_quote(quote: &Quote, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(quote),
        OutputFormat::Text => {
            let mut lines = vec![
                format!("Distance:        {:.1} km", quote.distance_km),
                format!("Consumption:     {:.3} L/km", quote.average_consumption),
                format!("Estimated cost:  {}", format_amount(quote.estimated_cost)),
                format!("Estimated time:  {:.1} h", quote.estimated_hours),
            ];
            if let Some(real) = quote.real_cost {
                lines.push(format!("Real cost:       {}", format_amount(real)));
            }
            if let Some(storage) = quote.storage_cost {
                lines.push(format!("Storage cost:    {}", format_amount(storage)));
            }
            Ok(lines.join("\n"))
        }
    }
}

pub fn render_deposits(matches: &[DepositMatch], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(&matches),
        OutputFormat::Text if matches.is_empty() => Ok("No deposits on route.".to_string()),
        OutputFormat::Text => {
            let mut lines = vec![format!("Deposits on route ({}):", matches.len())];
            for m in matches {
                let rate = m
                    .deposit
                    .daily_rate
                    .map(|r| format!(", {}/day", format_amount(r)))
                    .unwrap_or_default();
                lines.push(format!(
                    "- [{}] {} ({:.1} km from origin{rate})",
                    m.deposit.id, m.deposit.name, m.km_from_origin
                ));
            }
            Ok(lines.join("\n"))
        }
    }
}

pub fn render_distance(estimate: &DistanceEstimate, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(estimate),
        OutputFormat::Text => Ok(format!(
            "{} -> {}\n{:.1} km, {:.1} h",
            estimate.origin_label,
            estimate.destination_label,
            estimate.distance_km,
            estimate.duration_hours
        )),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}

/// Two decimals with thousands separators, e.g. `236,660.00`.
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, c) in whole.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{grouped}.{:02}", cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote() -> Quote {
        Quote {
            distance_km: 100.0,
            average_consumption: 0.1,
            estimated_cost: 32_000.0,
            estimated_hours: 100.0 / 60.0,
            real_cost: None,
            storage_cost: Some(4_500.0),
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(236_660.0), "236,660.00");
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(-1500.0), "-1,500.00");
    }

    #[test]
    fn test_text_quote_omits_missing_costs() {
        let text = render_quote(&quote(), OutputFormat::Text).unwrap();
        assert!(text.contains("Estimated cost:  32,000.00"));
        assert!(text.contains("Storage cost:    4,500.00"));
        assert!(!text.contains("Real cost"));
    }

    #[test]
    fn test_json_quote_is_parseable() {
        let json = render_quote(&quote(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["estimated_cost"], 32_000.0);
        assert!(value.get("real_cost").is_none());
    }

    #[test]
    fn test_deposit_match_flattens_deposit() {
        let origin = Coordinates::new(-31.42, -64.18);
        let deposit = Deposit {
            id: 7,
            name: "Villa María".into(),
            address: String::new(),
            latitude: Some(-32.41),
            longitude: Some(-63.24),
            daily_rate: Some(1500.0),
        };
        let m = DepositMatch::from_origin(&origin, deposit);
        assert!(m.km_from_origin > 100.0 && m.km_from_origin < 160.0);

        let json = render_deposits(&[m.clone()], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["id"], 7);
        assert!(value[0]["km_from_origin"].is_number());

        let text = render_deposits(&[m], OutputFormat::Text).unwrap();
        assert!(text.contains("[7] Villa María"));
        assert!(text.contains("1,500.00/day"));
    }

    #[test]
    fn test_empty_deposit_list_text() {
        assert_eq!(
            render_deposits(&[], OutputFormat::Text).unwrap(),
            "No deposits on route."
        );
    }
}
