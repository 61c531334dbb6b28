use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::StoreError;
use crate::models::RequestLogEntry;

/// Append-only, best-effort observability log of served requests
#[async_trait]
pub trait RequestLog: Send + Sync {
    async fn append(&self, entry: &RequestLogEntry) -> Result<(), StoreError>;

    /// Latest entries, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<RequestLogEntry>, StoreError>;
}

#[derive(Default)]
pub struct MemoryRequestLog {
    entries: RwLock<Vec<RequestLogEntry>>,
}

impl MemoryRequestLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestLog for MemoryRequestLog {
    async fn append(&self, entry: &RequestLogEntry) -> Result<(), StoreError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<RequestLogEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }
}
