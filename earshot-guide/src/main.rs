//! Earshot guide engine - main entry point
//!
//! Runs the proximity coordinator against a JSON-lines driver on stdin,
//! standing in for the mobile shell that normally supplies location
//! updates, toggle changes, and floor switches. Playback goes through the
//! timer-backed adapter; events are logged from the bus.
//!
//! Input protocol, one JSON object per line:
//! - `{"latitude": 37.5665, "longitude": 126.978}` location update
//! - `{"autoplay": true}` toggle autoplay
//! - `{"floor_file": "floors/b1.json"}` switch floor/context

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use earshot_common::config::TomlConfig;
use earshot_common::events::EventBus;
use earshot_guide::indicator::TracingIndicator;
use earshot_guide::playback::TimedPlayer;
use earshot_guide::poi::load_floor_file;
use earshot_guide::GuideCoordinator;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for earshot-guide
#[derive(Parser, Debug)]
#[command(name = "earshot-guide")]
#[command(about = "Proximity-triggered audio guide engine")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "EARSHOT_CONFIG")]
    config: Option<PathBuf>,

    /// Initial floor/POI file (JSON)
    #[arg(short, long, env = "EARSHOT_FLOOR_FILE")]
    floor_file: Option<PathBuf>,

    /// Proximity threshold in meters (overrides config)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Start with autoplay enabled (overrides config)
    #[arg(long)]
    autoplay: bool,
}

/// One line of driver input
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DriverLine {
    Location { latitude: f64, longitude: f64 },
    Autoplay { autoplay: bool },
    FloorSwitch { floor_file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "earshot_guide={0},earshot_common={0}",
                    config.logging.level
                ))
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let threshold_m = args.threshold.unwrap_or(config.proximity_threshold_m);
    let autoplay = args.autoplay || config.autoplay_enabled;
    info!("Starting Earshot guide engine (threshold {threshold_m}m, autoplay {autoplay})");

    let bus = Arc::new(EventBus::new(config.event_capacity));
    let handle = GuideCoordinator::spawn(
        threshold_m,
        autoplay,
        Arc::new(TimedPlayer::new()),
        Arc::new(TracingIndicator),
        Arc::clone(&bus),
    );

    // Log everything the coordinator broadcasts
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!("event: {event:?}");
        }
    });

    if let Some(path) = &args.floor_file {
        let (floor, pois) = load_floor_file(path)
            .with_context(|| format!("Failed to load floor file {}", path.display()))?;
        info!("Loaded floor '{}' with {} POIs", floor.name, pois.len());
        handle.reset_context(Some(floor), pois)?;
    }

    let driver = drive_stdin(handle.clone());
    tokio::select! {
        result = driver => {
            result?;
            info!("Input stream ended");
        }
        _ = shutdown_signal() => {}
    }

    handle.shutdown()?;
    info!("Shutdown complete");
    Ok(())
}

/// Feed stdin lines into the coordinator until EOF
async fn drive_stdin(handle: earshot_guide::CoordinatorHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<DriverLine>(&line) {
            Ok(DriverLine::Location {
                latitude,
                longitude,
            }) => handle.location_update(latitude, longitude)?,
            Ok(DriverLine::Autoplay { autoplay }) => handle.set_autoplay(autoplay)?,
            Ok(DriverLine::FloorSwitch { floor_file }) => {
                match load_floor_file(&floor_file) {
                    Ok((floor, pois)) => handle.reset_context(Some(floor), pois)?,
                    Err(e) => warn!("Ignoring floor switch: {e}"),
                }
            }
            Err(e) => warn!("Ignoring malformed input line: {e}"),
        }
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
