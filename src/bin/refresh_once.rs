use weather_cache_service::{logging, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging("info");

    let state = AppState::initialize(Config::from_env()).await?;
    println!("Running one refresh cycle over active regions...");

    let summary = state.scheduler.trigger_once().await;

    println!(
        "Refreshed {}/{} regions ({} failed), swept {} inactive",
        summary.success_count, summary.total, summary.error_count, summary.swept
    );
    if summary.error_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}
