pub mod client;
pub mod fetcher;
pub mod models;

// Re-exports for convenience
pub use client::{FetchError, OpenMeteoClient};
pub use fetcher::{Fetcher, HttpFetcher};
