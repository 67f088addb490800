use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// Keyed snapshot store over fetched backend state. Entries live until a
/// mutation invalidates their key family; there is no TTL and no optimistic
/// patching - stale reads are resolved by refetching after invalidation.
pub struct QueryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    cached_at: DateTime<Utc>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        entries.get(key).map(|entry| {
            debug!("Cache hit for {} (cached at {})", key, entry.cached_at);
            entry.value.clone()
        })
    }

    pub async fn put(&self, key: &str, value: Value) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), CacheEntry {
            value,
            cached_at: Utc::now(),
        });
    }

    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            debug!("Invalidated cache key {}", key);
        }
    }

    /// Drop every entry whose key starts with `prefix`. Mutations invalidate
    /// whole key families rather than patching individual snapshots.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Invalidated {} cache entries under {}", removed, prefix);
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
