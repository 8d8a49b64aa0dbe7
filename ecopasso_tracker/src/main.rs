use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use ecopasso_lib::trip_record::{CarDetails, FuelType};
use ecopasso_tracker::{
    config::TrackerConfig,
    notify::LogNotifier,
    pending::PendingQueue,
    replay,
    session::{AppState, SessionManager},
    submit::HttpSubmitter,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Headless EcoPasso trip tracker. Converts a stream of GPS fixes into
/// trip records and submits them to the backend; trips that cannot be
/// submitted are kept in a durable pending queue.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// JSON file with recorded fixes to feed through the tracker.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Treat the app as backgrounded, so finalized trips fire a
    /// notification instead of staying silent.
    #[arg(long)]
    background: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = TrackerConfig::from_env()?;

    tracing::info!("Starting trip tracker...");

    let pending = PendingQueue::open(config.pending_path.clone()).await?;
    let submitter = Arc::new(HttpSubmitter::new(&config));
    let (handle, mut prompts) =
        SessionManager::spawn(&config, submitter, pending, Arc::new(LogNotifier));

    if args.background {
        handle.set_app_state(AppState::Background).await?;
    }

    // Headless confirmation: accept every finalized trip, with default
    // car details when the classifier saw a car.
    let confirm_handle = handle.clone();
    tokio::spawn(async move {
        while let Some(prompt) = prompts.recv().await {
            tracing::info!(
                "Trip finalized: {:.2} km by {}",
                prompt.distance_km,
                prompt.transport
            );

            let details = prompt
                .needs_car_details
                .then(|| CarDetails::new(FuelType::default(), 1));

            if confirm_handle.confirm(details).await.is_err() {
                break;
            }
        }
    });

    if let Some(path) = args.replay.as_deref() {
        let fed = replay::replay_fixes(path, &handle, &config).await?;
        tracing::info!("Replayed {fed} fixes from {path:?}");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}
