//! Siram bot binary.
//!
//! Run locally against a seeded in-memory store, chatting on the console:
//! ```bash
//! SIRAM_CREDENTIALS='{"project_id":"local"}' \
//!   cargo run -p siram-bot -- --seed crates/siram-bot/fixtures/seed.json
//! ```
//! Then type lines such as `08123456789 status`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use siram_bot::{ConsoleTransport, CredentialStore, SeedData, SiramBot};
use siram_core::config::{self, Settings};
use siram_core::HttpForecastSource;
use siram_runtime::{PlantService, RuntimeConfig};
use siram_store::{MemoryDocumentStore, MemoryRealtimeStore};
use tracing_subscriber::EnvFilter;

/// Siram - plant watering notifications over chat
#[derive(Parser, Debug)]
#[command(name = "siram-bot")]
#[command(about = "Chat bot for the plant watering system")]
struct Args {
    /// JSON fixture to seed the in-memory stores with
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Weather service base URL (overrides SIRAM_WEATHER_URL)
    #[arg(long)]
    weather_url: Option<String>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load environment variables from config directory first
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let filter = match args.verbose {
        0 => "siram_bot=info,siram_runtime=info,siram_core=warn",
        1 => "siram_bot=debug,siram_runtime=debug,siram_core=info,siram_store=info",
        2 => "siram_bot=trace,siram_runtime=trace,siram_core=debug,siram_store=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start without store credentials");
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(project = %settings.credentials.project_id, "Credentials loaded");

    let (docs, realtime) = match &args.seed {
        Some(path) => SeedData::load(path)?.into_stores()?,
        None => {
            tracing::warn!("No seed file given, starting with empty stores");
            (
                Arc::new(MemoryDocumentStore::new()),
                Arc::new(MemoryRealtimeStore::new()),
            )
        }
    };

    let runtime_config = RuntimeConfig::default();
    let weather_url = args.weather_url.unwrap_or(settings.weather_url);
    let forecasts = HttpForecastSource::new(weather_url, runtime_config.weather_timeout)?;

    let service = Arc::new(PlantService::new(
        runtime_config,
        docs,
        realtime,
        Arc::new(forecasts),
    ));
    let bot = SiramBot::new(
        service.clone(),
        Arc::new(ConsoleTransport::new()),
        CredentialStore::new(config::auth_dir()),
    );

    println!("\nSiram bot");
    println!("   Type '<phone> <message>' to chat, Ctrl+D to log out\n");

    tokio::select! {
        result = bot.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            if service.is_started() {
                service.shutdown().await?;
            }
        }
    }

    Ok(())
}
