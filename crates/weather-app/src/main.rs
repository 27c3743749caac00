//! Weather Cache CLI
//!
//! Connects to the cache server, provisions the weather caches, loads random
//! readings and queries them by country.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use weather_app::{country_query, load_readings, load_temperatures};
use weather_cache::config::DEFAULT_PORT;
use weather_cache::{CacheConnector, ConnectionConfig, InMemoryTransport, ServerAddress};
use weather_domain::{Location, RandomWeatherService, default_locations};

#[derive(Parser, Debug)]
#[command(name = "weather-app")]
#[command(about = "Load weather readings into a remote cache server")]
struct Args {
    /// Server host, replaces CACHE_SERVERS
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(long)]
    port: Option<u16>,

    /// Username
    #[arg(short, long, env = "CACHE_USERNAME")]
    username: Option<String>,

    /// Password
    #[arg(short, long, env = "CACHE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Country to query readings for
    #[arg(short, long, default_value = "Italy")]
    country: String,

    /// Locations to load as "City, Country" (defaults to the built-in list)
    #[arg(short, long = "location")]
    locations: Vec<Location>,

    /// Dry run (in-memory server, no query)
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    /// Environment configuration with command line overrides applied
    fn connection_config(&self) -> Result<ConnectionConfig> {
        let mut config = ConnectionConfig::from_env().context("invalid cache configuration")?;

        if self.host.is_some() || self.port.is_some() {
            let current = config.servers.first();
            let host = self
                .host
                .clone()
                .or_else(|| current.map(|s| s.host.clone()))
                .unwrap_or_else(|| weather_cache::config::DEFAULT_HOST.to_string());
            let port = self
                .port
                .or_else(|| current.map(|s| s.port))
                .unwrap_or(DEFAULT_PORT);
            config.servers = vec![ServerAddress::new(host, port)];
        }
        if let Some(username) = &self.username {
            config.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("weather_app=info".parse()?)
                .add_directive("weather_cache=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = args.connection_config()?;
    let locations = if args.locations.is_empty() {
        default_locations()
    } else {
        args.locations.clone()
    };

    let mut connector = CacheConnector::new(config);
    if args.dry_run {
        info!("Dry run, using an in-memory cache server");
        connector
            .connect_with(Arc::new(InMemoryTransport::new()))
            .await?;
    } else {
        connector
            .connect()
            .await
            .context("failed to connect to the cache server")?;
    }

    let service = RandomWeatherService::new();

    let simple = connector.get_simple_cache().await?;
    let written = load_temperatures(&simple, &service, &locations).await?;
    info!(cache = simple.name(), written, "Loaded temperatures");

    let readings = connector.get_query_cache().await?;
    let written = load_readings(&readings, &service, &locations).await?;
    info!(cache = readings.name(), written, "Loaded readings");

    for location in &locations {
        match simple.get(&location.key()).await? {
            Some(temperature) => println!("{location}: {temperature:.1}°C"),
            None => warn!(%location, "Temperature missing from cache"),
        }
    }

    if args.dry_run {
        info!("Skipping query on the in-memory server");
    } else {
        let query = country_query(&args.country);
        info!(%query, "Querying readings");
        let results = readings.query(&query).await?;
        println!("=== {} ({} readings) ===", args.country, results.len());
        for weather in &results {
            println!("{weather}");
        }
    }

    connector.shutdown().await?;
    info!("Done");

    Ok(())
}
