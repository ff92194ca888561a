use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use freightline_cli::input::{load_deposits, parse_coordinates, parse_location};
use freightline_cli::output::{
    render_deposits, render_distance, render_quote, DepositMatch, OutputFormat,
};
use freightline_lib::{
    find_on_route, Coordinates, DistanceMatrixClient, DistanceProvider, FreightlineConfig,
    QuoteInput, StorageStay, TariffEngine, TruckFigures,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Freightline tariff and routing utilities")]
struct Cli {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Price a trip with the configured tariff.
    Quote {
        #[arg(long)]
        distance_km: f64,
        /// Average consumption in L/km; defaults to the configured assumption.
        #[arg(long)]
        consumption: Option<f64>,
        /// Truck rate per km, for the real cost.
        #[arg(long, requires = "truck_consumption")]
        rate_per_km: Option<f64>,
        /// Truck consumption in L/km, for the real cost.
        #[arg(long, requires = "rate_per_km")]
        truck_consumption: Option<f64>,
        #[arg(long, requires = "storage_rate")]
        storage_days: Option<f64>,
        /// Storage price per day.
        #[arg(long, requires = "storage_days")]
        storage_rate: Option<f64>,
    },
    /// List deposits worth stopping at between two points.
    OnRoute {
        /// JSON file with an array of deposits.
        #[arg(long)]
        deposits: PathBuf,
        #[arg(long = "from", value_parser = parse_coordinates, allow_hyphen_values = true)]
        from: Coordinates,
        #[arg(long = "to", value_parser = parse_coordinates, allow_hyphen_values = true)]
        to: Coordinates,
        /// Detour tolerance as a ratio of the direct distance.
        #[arg(long)]
        margin: Option<f64>,
    },
    /// Ask the mapping provider for the road distance between two places.
    Distance {
        /// Address or LAT,LON.
        #[arg(long = "from", allow_hyphen_values = true)]
        from: String,
        /// Address or LAT,LON.
        #[arg(long = "to", allow_hyphen_values = true)]
        to: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = FreightlineConfig::from_env();

    let rendered = match cli.command {
        Command::Quote {
            distance_km,
            consumption,
            rate_per_km,
            truck_consumption,
            storage_days,
            storage_rate,
        } => {
            let input = QuoteInput {
                distance_km,
                average_consumption: consumption,
                truck: rate_per_km.zip(truck_consumption).map(|(rate_per_km, consumption)| {
                    TruckFigures {
                        rate_per_km,
                        consumption,
                    }
                }),
                storage: storage_days.zip(storage_rate).map(|(days, rate_per_day)| {
                    StorageStay { days, rate_per_day }
                }),
            };
            handle_quote(&config, &input, cli.format)?
        }
        Command::OnRoute {
            deposits,
            from,
            to,
            margin,
        } => handle_on_route(
            &deposits,
            &from,
            &to,
            margin.unwrap_or(config.deposit_margin),
            cli.format,
        )?,
        Command::Distance { from, to } => handle_distance(&config, &from, &to, cli.format)?,
    };

    println!("{rendered}");
    Ok(())
}

fn handle_quote(config: &FreightlineConfig, input: &QuoteInput, format: OutputFormat) -> Result<String> {
    for (name, value) in [
        ("--distance-km", Some(input.distance_km)),
        ("--consumption", input.average_consumption),
    ] {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be a non-negative number");
            }
        }
    }

    let engine = TariffEngine::new(config.tariff).context("invalid tariff configuration")?;
    render_quote(&engine.quote(input), format)
}

fn handle_on_route(
    deposits: &Path,
    from: &Coordinates,
    to: &Coordinates,
    margin: f64,
    format: OutputFormat,
) -> Result<String> {
    if !margin.is_finite() || margin < 0.0 {
        bail!("--margin must be a non-negative ratio");
    }
    let candidates = load_deposits(deposits)?;
    let matches: Vec<DepositMatch> = find_on_route(from, to, &candidates, margin)
        .into_iter()
        .map(|deposit| DepositMatch::from_origin(from, deposit))
        .collect();
    tracing::info!(
        candidates = candidates.len(),
        matches = matches.len(),
        margin,
        "deposit search finished"
    );
    render_deposits(&matches, format)
}

fn handle_distance(
    config: &FreightlineConfig,
    from: &str,
    to: &str,
    format: OutputFormat,
) -> Result<String> {
    if config.maps_api_key.trim().is_empty() {
        bail!("FREIGHTLINE_MAPS_API_KEY is not set; the mapping provider needs a key");
    }
    let client = DistanceMatrixClient::new(
        config.maps_url.clone(),
        config.maps_api_key.clone(),
        config.http_timeout,
    )
    .context("failed to build the mapping provider client")?;

    let estimate = client
        .compute_distance(&parse_location(from), &parse_location(to))
        .with_context(|| format!("distance lookup from '{from}' to '{to}' failed"))?;
    render_distance(&estimate, format)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
