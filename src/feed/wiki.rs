//! Live price feed backed by the community wiki API.
//!
//! Endpoints (all public, no auth):
//! - `GET {base}/mapping`    — item catalog, changes on game updates only
//! - `GET {base}/latest`     — latest instant-buy/sell quote per item
//! - `GET {base}/volumes`    — trailing-day trade counts per item
//! - `GET {base}/timeseries` — averaged price history buckets
//!
//! The official guide price comes from the separate Jagex catalogue
//! endpoint, which reports prices either as numbers or as suffixed
//! strings such as `"1.2m"`.
//!
//! The wiki asks consumers to send a descriptive User-Agent; the client
//! sets it once at construction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::{FeedError, SnapshotSource};
use crate::config::FeedConfig;
use crate::types::{CatalogItem, GuidePrice, PricePoint, Quote, Timestep};

const SOURCE_NAME: &str = "wiki";

// ---------------------------------------------------------------------------
// API response types (wiki JSON → Rust)
// ---------------------------------------------------------------------------

/// `/latest` wraps the quote map in a `data` object keyed by item id
/// rendered as a string.
#[derive(Debug, Deserialize)]
struct LatestResponse {
    data: HashMap<String, Quote>,
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    data: HashMap<String, u64>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    #[serde(default)]
    data: Vec<PricePoint>,
}

#[derive(Debug, Deserialize)]
struct GuideDetailResponse {
    item: Option<GuideDetailItem>,
}

#[derive(Debug, Deserialize)]
struct GuideDetailItem {
    current: Option<GuideCurrent>,
}

#[derive(Debug, Deserialize)]
struct GuideCurrent {
    price: Option<serde_json::Value>,
    trend: Option<String>,
}

/// Re-key an upstream string-keyed map by numeric item id, dropping
/// entries whose key isn't a number.
fn parse_id_map<T>(raw: HashMap<String, T>) -> HashMap<u32, T> {
    raw.into_iter()
        .filter_map(|(key, value)| key.parse::<u32>().ok().map(|id| (id, value)))
        .collect()
}

/// Parse a guide price that may be a plain number or a suffixed string
/// (`"1.2m"`, `"850k"`, `"2,147m"`). Returns `None` for anything else.
fn parse_guide_price(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)
            }
        }
        serde_json::Value::String(s) => {
            let normalized = s.trim().to_lowercase().replace(',', "");
            if normalized.is_empty() {
                return None;
            }

            let (digits, multiplier) = match normalized.chars().last() {
                Some('k') => (&normalized[..normalized.len() - 1], 1_000.0),
                Some('m') => (&normalized[..normalized.len() - 1], 1_000_000.0),
                Some('b') => (&normalized[..normalized.len() - 1], 1_000_000_000.0),
                _ => (normalized.as_str(), 1.0),
            };

            if is_decimal(digits) {
                if let Ok(num) = digits.parse::<f64>() {
                    if num.is_finite() {
                        return Some((num * multiplier).round() as i64);
                    }
                }
            }

            // Last resort: whatever the plain string parses to.
            normalized
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f.round() as i64)
        }
        _ => None,
    }
}

/// `123` or `123.45` — digits with at most one dot, nothing else.
fn is_decimal(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().any(|b| b.is_ascii_digit())
        && s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && s.bytes().filter(|b| *b == b'.').count() <= 1
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Wiki price feed client.
pub struct WikiClient {
    http: Client,
    base_url: String,
    guide_url: String,
}

impl WikiClient {
    /// Create a new client with the configured base URLs, User-Agent and
    /// request timeout.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build wiki HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            guide_url: config.guide_url.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: String,
    ) -> Result<T, FeedError> {
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| FeedError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::UpstreamStatus {
                endpoint,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| FeedError::Decode { endpoint, source })
    }
}

#[async_trait]
impl SnapshotSource for WikiClient {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, FeedError> {
        let url = format!("{}/mapping", self.base_url);
        let catalog: Vec<CatalogItem> = self.get_json("/mapping", url).await?;
        debug!(items = catalog.len(), "Catalog fetched");
        Ok(catalog)
    }

    async fn fetch_latest(&self) -> Result<HashMap<u32, Quote>, FeedError> {
        let url = format!("{}/latest", self.base_url);
        let response: LatestResponse = self.get_json("/latest", url).await?;
        Ok(parse_id_map(response.data))
    }

    async fn fetch_volumes(&self) -> Result<HashMap<u32, u64>, FeedError> {
        let url = format!("{}/volumes", self.base_url);
        let response: VolumesResponse = self.get_json("/volumes", url).await?;
        Ok(parse_id_map(response.data))
    }

    async fn fetch_timeseries(
        &self,
        id: u32,
        timestep: Timestep,
    ) -> Result<Vec<PricePoint>, FeedError> {
        let url = format!(
            "{}/timeseries?timestep={}&id={}",
            self.base_url, timestep, id
        );
        match self.get_json::<TimeseriesResponse>("/timeseries", url).await {
            Ok(response) => Ok(response.data),
            // History is best-effort; a missing series is an empty one.
            Err(FeedError::UpstreamStatus { endpoint, status }) => {
                debug!(endpoint, status, id, "Timeseries unavailable");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_guide_price(&self, id: u32) -> Result<Option<GuidePrice>, FeedError> {
        let url = format!("{}?item={}", self.guide_url, id);
        let response: GuideDetailResponse = match self.get_json("/catalogue/detail", url).await {
            Ok(r) => r,
            // The catalogue 404s for untracked items.
            Err(FeedError::UpstreamStatus { endpoint, status }) => {
                debug!(endpoint, status, id, "No guide price");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let current = match response.item.and_then(|item| item.current) {
            Some(current) => current,
            None => return Ok(None),
        };

        Ok(Some(GuidePrice {
            price: current.price.as_ref().and_then(parse_guide_price),
            trend: current.trend,
        }))
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
