use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::cache::{ActiveRegionRegistry, CacheStore, MemoryCacheStore, MemoryRegionRegistry, MemoryRequestLog, RequestLog};
use crate::config::{Config, StorageBackend};
use crate::db::{connection, SqliteCacheStore, SqliteRegionRegistry, SqliteRequestLog};
use crate::scheduler::clock::{Clock, SystemClock};
use crate::scheduler::{RefreshScheduler, SchedulerConfig};
use crate::service::WeatherService;
use crate::upstream::{FetchError, Fetcher, HttpFetcher, OpenMeteoClient};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Upstream client error: {0}")]
    Upstream(#[from] FetchError),
}

/// The three keyed collections behind the service
#[derive(Clone)]
pub struct Storage {
    pub cache: Arc<dyn CacheStore>,
    pub regions: Arc<dyn ActiveRegionRegistry>,
    pub request_log: Arc<dyn RequestLog>,
}

impl Storage {
    pub fn in_memory(capacity: u64) -> Self {
        Self {
            cache: Arc::new(MemoryCacheStore::new(capacity)),
            regions: Arc::new(MemoryRegionRegistry::new()),
            request_log: Arc::new(MemoryRequestLog::new()),
        }
    }

    pub fn sqlite(pool: sqlx::SqlitePool) -> Self {
        Self {
            cache: Arc::new(SqliteCacheStore::new(pool.clone())),
            regions: Arc::new(SqliteRegionRegistry::new(pool.clone())),
            request_log: Arc::new(SqliteRequestLog::new(pool)),
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self, sqlx::Error> {
        match config.storage_backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage (capacity {})", config.cache_max_capacity);
                Ok(Self::in_memory(config.cache_max_capacity))
            }
            StorageBackend::Sqlite => {
                let pool = connection::establish_connection(&config.database_url).await?;
                info!("Database connection established: {}", config.database_url);
                Ok(Self::sqlite(pool))
            }
        }
    }
}

/// Everything the process owns; built once at startup
pub struct AppState {
    pub config: Config,
    pub storage: Storage,
    pub service: Arc<WeatherService>,
    pub scheduler: RefreshScheduler,
}

impl AppState {
    pub async fn initialize(config: Config) -> Result<Self, StartupError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let storage = Storage::from_config(&config).await?;
        let client = OpenMeteoClient::new(&config)?;
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(client, clock.clone()));

        Ok(Self::assemble(config, storage, fetcher, clock))
    }

    /// Wire the service and scheduler over the given collaborators
    pub fn assemble(
        config: Config,
        storage: Storage,
        fetcher: Arc<dyn Fetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let service = Arc::new(WeatherService::new(
            fetcher,
            &storage,
            clock.clone(),
            config.freshness_window,
        ));
        let scheduler = RefreshScheduler::new(
            service.clone(),
            storage.regions.clone(),
            clock,
            SchedulerConfig::from(&config),
        );

        Self {
            config,
            storage,
            service,
            scheduler,
        }
    }
}
