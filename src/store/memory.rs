use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{KeyInfo, KeyListing, KvStore, ListOptions};

/// Process-local store for development and tests
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let store = self.inner.read().await;
        Ok(store.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        let mut store = self.inner.write().await;
        store.insert(key.to_string(), value);
        tracing::debug!("Stored value under key: {}", key);
        Ok(())
    }

    async fn list(&self, options: ListOptions<'_>) -> Result<KeyListing> {
        let store = self.inner.read().await;

        let start = match options.cursor {
            Some(cursor) if cursor >= options.prefix => Bound::Excluded(cursor.to_string()),
            _ => Bound::Included(options.prefix.to_string()),
        };

        // One extra key tells us whether another page exists
        let mut names: Vec<String> = store
            .range((start, Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(options.prefix))
            .take(options.limit + 1)
            .cloned()
            .collect();

        let cursor = if names.len() > options.limit {
            names.truncate(options.limit);
            names.last().cloned()
        } else {
            None
        };

        Ok(KeyListing {
            keys: names.into_iter().map(|name| KeyInfo { name }).collect(),
            cursor,
        })
    }
}
