use shared_config::AppConfig;

use crate::cache::QueryCache;

/// Shared handler state: the loaded configuration plus the process-wide
/// query cache. Services borrow the config to build an `EmrClient` and go
/// through the cache for read-through fetches and post-mutation
/// invalidation.
pub struct AppState {
    pub config: AppConfig,
    pub cache: QueryCache,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            cache: QueryCache::new(),
        }
    }
}
