//! Flight tracker service

use std::sync::Arc;

use flight_tracker::{
    config::AppConfig,
    database::Database,
    errors::FlightTrackerError,
    feed::FeedClient,
    updater::{FlightInfoUpdater, UpdateEvent, UpdaterHandle},
};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), FlightTrackerError> {
    #[cfg(feature = "dotenvy")]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration, preferring environment variables and config files
    let config = AppConfig::load()?;
    config.validate()?;

    let database = Arc::new(Database::connect(&config.database).await?);
    let feed = Arc::new(FeedClient::new(&config.feed)?);
    info!(
        "Starting updater: feed={}, limit={}, interval={:?}",
        feed.url(),
        config.updater.limit,
        config.updater.interval
    );

    let mut updater = FlightInfoUpdater::new(feed, database, &config.updater).start();

    // Setup signal handling for graceful shutdown
    let shutdown_signal = signal::ctrl_c();

    tokio::select! {
        _ = log_events(&mut updater) => {
            info!("Updater event stream closed");
        }
        _ = shutdown_signal => {
            info!("Received shutdown signal");
        }
    }

    updater.stop();
    if let Err(e) = updater.join().await {
        error!("Updater terminated with error: {}", e);
        return Err(e);
    }

    Ok(())
}

async fn log_events(updater: &mut UpdaterHandle) {
    while let Some(event) = updater.recv().await {
        match event {
            UpdateEvent::Added(count) => info!("Added {} flight infos", count),
            UpdateEvent::Refreshed(count) => info!("Refreshed {} flight infos", count),
        }
    }
}
