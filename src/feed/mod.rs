//! Market data feed.
//!
//! Defines the `SnapshotSource` trait and provides implementations:
//! - `WikiClient` — live HTTP feed (prices.runescape.wiki + official
//!   guide-price catalogue)
//! - `CachedSource` — TTL caching decorator over any source
//! - `StaticSource` — fixed in-memory fixtures for offline runs and tests

pub mod cache;
pub mod wiki;

pub use cache::{CacheTtl, CachedSource};
pub use wiki::WikiClient;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::types::{CatalogItem, GuidePrice, PricePoint, Quote, Timestep};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure while talking to an upstream price feed.
///
/// This is the only error the recommendation engine can surface: per-item
/// data problems are silent skips, never errors.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    UpstreamStatus { endpoint: &'static str, status: u16 },

    #[error("could not decode {endpoint} payload: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A consistent view of the market, fetched once per engine run.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    /// Catalog in upstream order; ranking ties preserve this order.
    pub catalog: Vec<CatalogItem>,
    pub quotes: HashMap<u32, Quote>,
    pub volumes: HashMap<u32, u64>,
    /// Unix seconds at which the snapshot was assembled; the staleness
    /// check measures quote ages against this single instant.
    pub taken_at: i64,
}

impl MarketSnapshot {
    pub fn quote(&self, id: u32) -> Option<&Quote> {
        self.quotes.get(&id)
    }

    /// Daily traded volume; absence counts as zero.
    pub fn volume(&self, id: u32) -> u64 {
        self.volumes.get(&id).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Abstraction over market data providers.
///
/// All three snapshot parts (catalog, latest quotes, daily volumes) must be
/// fetchable for one engine run; history and guide prices serve the item
/// detail endpoints only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the full item catalog.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, FeedError>;

    /// Fetch the latest two-sided quote per item.
    async fn fetch_latest(&self) -> Result<HashMap<u32, Quote>, FeedError>;

    /// Fetch the trailing-day trade counts per item.
    async fn fetch_volumes(&self) -> Result<HashMap<u32, u64>, FeedError>;

    /// Fetch the price history series for one item.
    async fn fetch_timeseries(
        &self,
        id: u32,
        timestep: Timestep,
    ) -> Result<Vec<PricePoint>, FeedError>;

    /// Fetch the official guide price for one item, if published.
    async fn fetch_guide_price(&self, id: u32) -> Result<Option<GuidePrice>, FeedError>;

    /// Source name for logging and identification.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Static fixtures
// ---------------------------------------------------------------------------

/// An in-memory source with fixed data. Selected by `FLIPSCOUT_MOCK_DATA=1`
/// for offline runs; also the workhorse of the integration tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub catalog: Vec<CatalogItem>,
    pub quotes: HashMap<u32, Quote>,
    pub volumes: HashMap<u32, u64>,
}

impl StaticSource {
    /// Three well-known items quoted as of `now_secs`: a high-volume
    /// commodity, a mid-volume food, and a low-volume weapon.
    pub fn sample(now_secs: i64) -> Self {
        let catalog = vec![
            CatalogItem {
                id: 2,
                name: "Cannonball".to_string(),
                members: true,
                limit: Some(11_000),
            },
            CatalogItem {
                id: 30,
                name: "Lobster".to_string(),
                members: false,
                limit: Some(6_000),
            },
            CatalogItem {
                id: 4151,
                name: "Abyssal whip".to_string(),
                members: true,
                limit: Some(70),
            },
        ];

        let quote = |high: i64, low: i64| Quote {
            high: Some(high),
            low: Some(low),
            high_time: now_secs,
            low_time: now_secs,
        };
        let quotes = HashMap::from([
            (2, quote(230, 220)),
            (30, quote(310, 290)),
            (4151, quote(1_950_000, 1_900_000)),
        ]);

        let volumes = HashMap::from([(2, 2_000_000), (30, 150_000), (4151, 7_500)]);

        Self {
            catalog,
            quotes,
            volumes,
        }
    }
}

#[async_trait]
impl SnapshotSource for StaticSource {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, FeedError> {
        Ok(self.catalog.clone())
    }

    async fn fetch_latest(&self) -> Result<HashMap<u32, Quote>, FeedError> {
        Ok(self.quotes.clone())
    }

    async fn fetch_volumes(&self) -> Result<HashMap<u32, u64>, FeedError> {
        Ok(self.volumes.clone())
    }

    async fn fetch_timeseries(
        &self,
        _id: u32,
        _timestep: Timestep,
    ) -> Result<Vec<PricePoint>, FeedError> {
        Ok(Vec::new())
    }

    async fn fetch_guide_price(&self, _id: u32) -> Result<Option<GuidePrice>, FeedError> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "static"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
