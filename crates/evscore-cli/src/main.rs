//! Command-line access to station search and scoring.
//!
//! Each subcommand runs one pipeline operation against the configured
//! database and routing engine and prints the same JSON envelope the HTTP
//! API returns. Logs go to stderr so stdout stays machine-readable.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use evscore_core::{AppConfig, Coordinate};
use evscore_db::{PgGeoStore, PoolConfig};
use evscore_pipeline::{PipelineSettings, ScoringPipeline};
use evscore_routing::{RoutingClient, RoutingClientConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "evscore-cli")]
#[command(about = "Find and score EV charging stations along a route")]
struct Cli {
    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List stations reachable from a route point, nearest first
    Stations {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Road distance bounding the search, in meters
        #[arg(long)]
        distance: f64,
    },
    /// Score reachable stations by distance and nearby amenities
    Score {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Road distance bounding the station search, in meters
        #[arg(long)]
        station_distance: f64,
        /// Straight-line radius for amenities around each station, in meters
        #[arg(long, default_value = "500")]
        amenity_distance: f64,
    },
    /// List amenities around a station
    Restaurants {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Straight-line radius, in meters
        #[arg(long)]
        distance: f64,
    },
    /// Check database connectivity and the PostGIS version
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("evscore-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = evscore_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool = evscore_db::connect_pool(
        &config.database_url,
        PoolConfig::from_app_config(&config),
    )
    .await
    .context("failed to connect to the database")?;
    let store = PgGeoStore::new(pool);

    tracing::debug!(?command, "running command");
    match command {
        Commands::Health => {
            let version = evscore_db::health_check(store.pool()).await?;
            print_json(&serde_json::json!({"database": "ok", "postgis": version}), cli.pretty)
        }
        Commands::Stations { lon, lat, distance } => {
            let pipeline = build_pipeline(&config, store)?;
            let collection = pipeline.stations(coordinate(lon, lat)?, distance).await?;
            print_json(&collection, cli.pretty)
        }
        Commands::Score {
            lon,
            lat,
            station_distance,
            amenity_distance,
        } => {
            let pipeline = build_pipeline(&config, store)?;
            let collection = pipeline
                .score_stations(coordinate(lon, lat)?, station_distance, amenity_distance)
                .await?;
            print_json(&collection, cli.pretty)
        }
        Commands::Restaurants { lon, lat, distance } => {
            let pipeline = build_pipeline(&config, store)?;
            let collection = pipeline.restaurants(coordinate(lon, lat)?, distance).await?;
            print_json(&collection, cli.pretty)
        }
    }
}

fn build_pipeline(config: &AppConfig, store: PgGeoStore) -> anyhow::Result<ScoringPipeline> {
    let client = RoutingClient::new(&RoutingClientConfig::from_app_config(config))
        .context("invalid routing configuration")?;
    Ok(ScoringPipeline::new(
        Arc::new(client),
        Arc::new(store),
        PipelineSettings::from_app_config(config),
    ))
}

fn coordinate(lon: f64, lat: f64) -> anyhow::Result<Coordinate> {
    Coordinate::new(lon, lat).context("invalid --lon/--lat")
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
