pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod scheduler;
pub mod service;
pub mod state;
pub mod upstream;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use cache::CoordinateKey;
pub use config::Config;
pub use models::{DataSource, WeatherSnapshot};
pub use scheduler::{RefreshScheduler, RefreshSummary, SchedulerState};
pub use service::{WeatherError, WeatherService};
pub use state::{AppState, Storage};
pub use validation::{validate_coordinates, ValidationError};
