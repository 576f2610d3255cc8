//! TTL-cached view of the active perimeter.
//!
//! The perimeter definition changes rarely; a short time-based cache bounds
//! staleness while avoiding a network call per location sample. Invalidation
//! is time-based only, no push invalidation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use shiftfence_core::{PerimeterProvider, ShiftApi};
use shiftfence_domain::{Perimeter, Result};
use tracing::debug;

const CACHE_KEY: &str = "active-perimeter";

/// Fetch-through cache over the collaborator's perimeter endpoint.
pub struct CachedPerimeterProvider {
    api: Arc<dyn ShiftApi>,
    cache: Cache<&'static str, Option<Perimeter>>,
}

impl CachedPerimeterProvider {
    pub fn new(api: Arc<dyn ShiftApi>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { api, cache }
    }

    /// Drop the cached value so the next read refetches.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl PerimeterProvider for CachedPerimeterProvider {
    async fn active_perimeter(&self) -> Result<Option<Perimeter>> {
        let api = Arc::clone(&self.api);
        let result = self
            .cache
            .try_get_with(CACHE_KEY, async move {
                debug!("perimeter cache miss, fetching settings");
                api.fetch_perimeter().await
            })
            .await;

        result.map_err(|e: Arc<shiftfence_domain::ShiftFenceError>| {
            shiftfence_domain::ShiftFenceError::Network(e.to_string())
        })
    }
}
