//! CLI entry point for the inmueble_stats tool.
//!
//! Provides subcommands for building a market snapshot from the listing
//! API or a local file, inspecting the barrio ranking, expanding a single
//! listing's images, and refreshing the snapshot periodically.

mod infra;
mod services;

use crate::infra::mardel::client::MardelClient;
use crate::services::listing_api::ListingApi;
use anyhow::Result;
use clap::{Parser, Subcommand};
use inmueble_stats::{
    fetch::{BasicClient, fetch_bytes},
    listing::RawListing,
    output::{MarketSnapshot, print_json, write_snapshot},
    parser::parse_batch,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "inmueble_stats")]
#[command(about = "Normalizes and aggregates real-estate listings for the map dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the market snapshot and write it as JSON
    Snapshot {
        /// Path to a saved batch file or URL; defaults to the listing API
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// File to write the snapshot to
        #[arg(short, long, default_value = "snapshot.json")]
        output: String,
    },
    /// Log the ranked barrio table for a batch
    Barrios {
        /// Path to a saved batch file or URL; defaults to the listing API
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,
    },
    /// Expand one listing's image set into thumbnail URLs
    Images {
        /// Listing identifier
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Rebuild the snapshot periodically
    Watch {
        /// File to write the snapshot to
        #[arg(short, long, default_value = "snapshot.json")]
        output: String,

        /// Refresh rate: rebuild the snapshot every X seconds
        #[arg(short = 'r', long, default_value_t = 60)]
        refresh_rate: u64,

        /// Number of refreshes to run (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        num_refreshes: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/inmueble_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("inmueble_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Snapshot { source, output } => {
            let records = load_batch(source.as_deref()).await?;
            let snapshot = MarketSnapshot::from_batch(&records);

            info!(
                listings = snapshot.listings.len(),
                barrios = snapshot.neighborhoods.len(),
                output,
                "Snapshot built"
            );
            write_snapshot(&output, &snapshot)?;
        }
        Commands::Barrios { source } => {
            let records = load_batch(source.as_deref()).await?;
            let snapshot = MarketSnapshot::from_batch(&records);

            for stats in &snapshot.neighborhoods {
                info!(
                    barrio = %stats.barrio,
                    listings = stats.count,
                    avg_price_per_m2 = stats.avg_price_per_m2,
                    "Barrio"
                );
            }

            let with_avg = snapshot
                .neighborhoods
                .iter()
                .filter(|s| s.avg_price_per_m2.is_some())
                .count();

            info!(
                listings = snapshot.listings.len(),
                barrios = snapshot.neighborhoods.len(),
                with_avg,
                without_avg = snapshot.neighborhoods.len() - with_avg,
                "Barrio ranking summary"
            );
        }
        Commands::Images { id } => {
            let client = MardelClient::new()?;
            let images = client.fetch_images(id).await?;

            info!(id = images.id, count = images.images.len(), "Images expanded");
            print_json(&images)?;
        }
        Commands::Watch {
            output,
            refresh_rate,
            num_refreshes,
        } => {
            watch(&output, refresh_rate, num_refreshes).await?;
        }
    }

    Ok(())
}

/// Loads a raw batch from a local file, an explicit URL, or the listing API.
#[tracing::instrument]
async fn load_batch(source: Option<&str>) -> Result<Vec<RawListing>> {
    let records = match source {
        Some(path_or_url) if !path_or_url.starts_with("http") => {
            let bytes = std::fs::read(path_or_url)?;
            parse_batch(&bytes)?
        }
        Some(url) => {
            let client = BasicClient::new();
            let bytes = fetch_bytes(&client, url).await?;
            parse_batch(&bytes)?
        }
        None => MardelClient::new()?.fetch_batch().await?,
    };

    info!(records = records.len(), "Batch loaded");
    Ok(records)
}

/// Rebuilds the snapshot at a fixed interval, the server-side counterpart
/// of the dashboard's revalidation cadence. A failed refresh keeps the
/// previous snapshot file and the loop alive.
#[tracing::instrument]
async fn watch(output: &str, refresh_rate: u64, num_refreshes: usize) -> Result<()> {
    if num_refreshes == 0 {
        info!(refresh_rate, "Refreshing infinitely. Press Ctrl+C to stop.");
    } else {
        info!(num_refreshes, refresh_rate, "Starting snapshot refresh loop");
    }

    let client = MardelClient::new()?;
    let mut refresh_count = 0;

    loop {
        if num_refreshes > 0 && refresh_count >= num_refreshes {
            break;
        }

        refresh_count += 1;

        info!(
            refresh = refresh_count,
            total = if num_refreshes == 0 {
                None
            } else {
                Some(num_refreshes)
            },
            "Starting refresh"
        );

        match client.fetch_batch().await {
            Ok(records) => {
                let snapshot = MarketSnapshot::from_batch(&records);
                if let Err(e) = write_snapshot(output, &snapshot) {
                    error!(error = %e, "Failed to write snapshot");
                } else {
                    info!(
                        listings = snapshot.listings.len(),
                        barrios = snapshot.neighborhoods.len(),
                        "Snapshot refreshed"
                    );
                }
            }
            Err(e) => {
                error!(error = %e, "Batch fetch failed, keeping previous snapshot");
            }
        }

        if num_refreshes == 0 || refresh_count < num_refreshes {
            tokio::time::sleep(tokio::time::Duration::from_secs(refresh_rate)).await;
        }
    }

    info!(output, "Finished snapshot refresh loop");
    Ok(())
}
