use weather_cache_service::{logging, AppState, Config};

// Usage: lookup <latitude> <longitude> <timezone>
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging("warn");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [lat, lon, tz] = args.as_slice() else {
        eprintln!("usage: lookup <latitude> <longitude> <timezone>");
        std::process::exit(2);
    };
    let latitude: f64 = lat.parse()?;
    let longitude: f64 = lon.parse()?;

    let state = AppState::initialize(Config::from_env()).await?;

    let lookup = state.service.lookup(latitude, longitude, tz).await?;
    for degradation in &lookup.degraded {
        eprintln!("degraded: {}", degradation);
    }

    println!("{}", serde_json::to_string_pretty(&lookup.snapshot)?);
    Ok(())
}
