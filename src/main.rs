// Load configuration
// Set up logging
// Open storage and build the weather service
// Arm the refresh scheduler
// Stop the scheduler on shutdown, letting a running batch finish

use tracing::info;
use weather_cache_service::{logging, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging("info");
    info!("Starting weather-cache-service");

    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    let state = AppState::initialize(config).await?;
    state.scheduler.start();
    info!("Refresh scheduler started");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    state.scheduler.stop();
    state.scheduler.wait().await;
    info!("weather-cache-service stopped");

    Ok(())
}
