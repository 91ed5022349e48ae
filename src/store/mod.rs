pub mod memory;
pub mod spanner;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{Config, StoreConfig};

pub use memory::MemoryStore;
pub use spanner::SpannerStore;

/// One key returned by a prefix listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct KeyInfo {
    pub name: String,
}

/// A page of keys matching a prefix, in ascending key order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyListing {
    pub keys: Vec<KeyInfo>,
    /// Continuation token for the next page; `None` once the listing is complete
    pub cursor: Option<String>,
}

impl KeyListing {
    pub fn list_complete(&self) -> bool {
        self.cursor.is_none()
    }
}

/// Parameters of a prefix listing
#[derive(Debug, Clone)]
pub struct ListOptions<'a> {
    pub prefix: &'a str,
    /// Resume after the key this cursor names
    pub cursor: Option<&'a str>,
    pub limit: usize,
}

/// String-keyed store with last-write-wins puts and prefix listing.
///
/// Values are opaque text; callers decide the encoding.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: String) -> Result<()>;

    async fn list(&self, options: ListOptions<'_>) -> Result<KeyListing>;

    /// Verify the backend is reachable
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Build the store selected by the configuration
pub async fn from_config(config: &Config) -> Result<Arc<dyn KvStore>> {
    match &config.store {
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreConfig::Spanner(spanner) => {
            let store = SpannerStore::from_config(spanner, &config.table).await?;
            Ok(Arc::new(store))
        }
    }
}
