//! TTL caching decorator for snapshot sources.
//!
//! Keeps the last good payload of each endpoint for a declared
//! time-to-live so bursts of scans don't hammer the upstream feed.
//! When a refresh fails and a stale copy exists, the stale copy is
//! served instead of the error; a cold cache propagates the failure.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{FeedError, SnapshotSource};
use crate::config::FeedConfig;
use crate::types::{CatalogItem, GuidePrice, PricePoint, Quote, Timestep};

// ---------------------------------------------------------------------------
// TTLs
// ---------------------------------------------------------------------------

/// Declared time-to-live per cached endpoint.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtl {
    pub mapping: Duration,
    pub latest: Duration,
    pub volumes: Duration,
    pub timeseries: Duration,
    pub guide: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        CacheTtl::from(&FeedConfig::default())
    }
}

impl From<&FeedConfig> for CacheTtl {
    fn from(config: &FeedConfig) -> Self {
        Self {
            mapping: Duration::from_secs(config.mapping_ttl_secs),
            latest: Duration::from_secs(config.latest_ttl_secs),
            volumes: Duration::from_secs(config.volumes_ttl_secs),
            timeseries: Duration::from_secs(config.timeseries_ttl_secs),
            guide: Duration::from_secs(config.guide_ttl_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Cache slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    fetched_at: Instant,
}

impl<T> Slot<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

// ---------------------------------------------------------------------------
// Cached source
// ---------------------------------------------------------------------------

/// TTL cache wrapping any [`SnapshotSource`].
pub struct CachedSource<S> {
    inner: S,
    ttl: CacheTtl,
    catalog: Mutex<Option<Slot<Vec<CatalogItem>>>>,
    latest: Mutex<Option<Slot<HashMap<u32, Quote>>>>,
    volumes: Mutex<Option<Slot<HashMap<u32, u64>>>>,
    timeseries: Mutex<HashMap<(u32, Timestep), Slot<Vec<PricePoint>>>>,
    guide: Mutex<HashMap<u32, Slot<GuidePrice>>>,
}

impl<S: SnapshotSource> CachedSource<S> {
    pub fn new(inner: S, ttl: CacheTtl) -> Self {
        Self {
            inner,
            ttl,
            catalog: Mutex::new(None),
            latest: Mutex::new(None),
            volumes: Mutex::new(None),
            timeseries: Mutex::new(HashMap::new()),
            guide: Mutex::new(HashMap::new()),
        }
    }

    /// Serve a fresh slot, refresh an expired one, or fall back to the
    /// stale copy when the refresh fails. The slot lock is held across
    /// the refresh so concurrent scans don't stampede the upstream.
    async fn through_slot<T, F, Fut>(
        slot: &Mutex<Option<Slot<T>>>,
        ttl: Duration,
        what: &'static str,
        fetch: F,
    ) -> Result<T, FeedError>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FeedError>>,
    {
        let mut guard = slot.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.is_fresh(ttl) {
                return Ok(cached.value.clone());
            }
        }

        match fetch().await {
            Ok(value) => {
                *guard = Some(Slot::new(value.clone()));
                Ok(value)
            }
            Err(e) => match guard.as_ref() {
                Some(stale) => {
                    warn!(what, error = %e, "Refresh failed, serving stale copy");
                    Ok(stale.value.clone())
                }
                None => Err(e),
            },
        }
    }
}

#[async_trait]
impl<S: SnapshotSource> SnapshotSource for CachedSource<S> {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, FeedError> {
        Self::through_slot(&self.catalog, self.ttl.mapping, "catalog", || {
            self.inner.fetch_catalog()
        })
        .await
    }

    async fn fetch_latest(&self) -> Result<HashMap<u32, Quote>, FeedError> {
        Self::through_slot(&self.latest, self.ttl.latest, "latest", || {
            self.inner.fetch_latest()
        })
        .await
    }

    async fn fetch_volumes(&self) -> Result<HashMap<u32, u64>, FeedError> {
        Self::through_slot(&self.volumes, self.ttl.volumes, "volumes", || {
            self.inner.fetch_volumes()
        })
        .await
    }

    async fn fetch_timeseries(
        &self,
        id: u32,
        timestep: Timestep,
    ) -> Result<Vec<PricePoint>, FeedError> {
        let key = (id, timestep);
        let mut cache = self.timeseries.lock().await;

        if let Some(cached) = cache.get(&key) {
            if cached.is_fresh(self.ttl.timeseries) {
                return Ok(cached.value.clone());
            }
        }

        match self.inner.fetch_timeseries(id, timestep).await {
            Ok(points) => {
                cache.insert(key, Slot::new(points.clone()));
                Ok(points)
            }
            Err(e) => match cache.get(&key) {
                Some(stale) => {
                    warn!(id, %timestep, error = %e, "History refresh failed, serving stale copy");
                    Ok(stale.value.clone())
                }
                None => Err(e),
            },
        }
    }

    async fn fetch_guide_price(&self, id: u32) -> Result<Option<GuidePrice>, FeedError> {
        let mut cache = self.guide.lock().await;

        if let Some(cached) = cache.get(&id) {
            if cached.is_fresh(self.ttl.guide) {
                return Ok(Some(cached.value.clone()));
            }
        }

        match self.inner.fetch_guide_price(id).await {
            Ok(Some(price)) => {
                cache.insert(id, Slot::new(price.clone()));
                Ok(Some(price))
            }
            // Keep serving the previous guide price when the catalogue has
            // nothing fresh for this item.
            Ok(None) => {
                let stale = cache.get(&id).map(|slot| slot.value.clone());
                if stale.is_some() {
                    debug!(id, "Guide price gone upstream, serving previous value");
                }
                Ok(stale)
            }
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
