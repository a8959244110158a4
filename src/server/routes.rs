//! API route handlers.
//!
//! Query parsing is deliberately lenient: malformed numbers fall back to
//! their defaults instead of erroring, and unknown membership values mean
//! "all". The only hard failures are an invalid item id in the path (400)
//! and an upstream feed failure (502).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::error;

use super::AppState;
use crate::feed::FeedError;
use crate::types::{
    parse_budget, FlipCandidate, FlipRequest, Membership, PricePoint, Timestep,
    DEFAULT_AGGRESSIVENESS, DEFAULT_MAX_FILL_HOURS, DEFAULT_MIN_VOLUME, DEFAULT_RESULT_LIMIT,
    DEFAULT_SLOTS_PER_ITEM, DEFAULT_TOTAL_SLOTS,
};

type ApiError = (StatusCode, Json<Value>);

// ---------------------------------------------------------------------------
// Param helpers
// ---------------------------------------------------------------------------

fn parse_f64(params: &HashMap<String, String>, key: &str) -> Option<f64> {
    params
        .get(key)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_u64(params: &HashMap<String, String>, key: &str) -> Option<u64> {
    params.get(key).and_then(|raw| raw.trim().parse::<u64>().ok())
}

fn parse_u32(params: &HashMap<String, String>, key: &str) -> Option<u32> {
    params.get(key).and_then(|raw| raw.trim().parse::<u32>().ok())
}

fn parse_id_list(raw: &str) -> Vec<u32> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .collect()
}

fn parse_item_id(raw: &str) -> Result<u32, ApiError> {
    match raw.trim().parse::<u32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid item id" })),
        )),
    }
}

fn feed_failure(e: FeedError) -> ApiError {
    error!(error = %e, "Feed failure");
    (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() })))
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Echoes the resolved parameters so clients can see what the lenient
/// parsing actually produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestFlipsResponse {
    pub budget: i64,
    pub min_volume: u64,
    pub slots: u32,
    pub max_fill_hours: f64,
    pub buy_aggro: f64,
    pub sell_aggro: f64,
    pub limit: usize,
    pub total_slots: u32,
    pub favorites: Vec<u32>,
    pub membership: String,
    pub count: usize,
    pub flips: Vec<FlipCandidate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemListEntry {
    pub id: u32,
    pub name: String,
    pub members: bool,
    pub limit: Option<u32>,
    pub buy: Option<i64>,
    pub sell: Option<i64>,
    pub margin: Option<i64>,
    pub margin_pct: Option<f64>,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemListResponse {
    pub items: Vec<ItemListEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub id: u32,
    pub timestep: String,
    pub count: usize,
    pub points: Vec<PricePoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuideResponse {
    pub id: u32,
    pub price: Option<i64>,
    pub trend: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LitePrice {
    pub buy: i64,
    pub sell: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatestLiteResponse {
    pub latest: HashMap<u32, LitePrice>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/best-flips
pub async fn get_best_flips(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<BestFlipsResponse>, ApiError> {
    let budget = params
        .get("budget")
        .map(|raw| parse_budget(raw))
        .unwrap_or(crate::types::DEFAULT_BUDGET_GP);

    let request = FlipRequest {
        budget: budget as f64,
        min_volume: parse_u64(&params, "minVolume")
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MIN_VOLUME),
        limit: parse_u64(&params, "limit")
            .filter(|v| *v > 0)
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_RESULT_LIMIT),
        buy_aggressiveness: parse_f64(&params, "buyAggro").unwrap_or(DEFAULT_AGGRESSIVENESS),
        sell_aggressiveness: parse_f64(&params, "sellAggro").unwrap_or(DEFAULT_AGGRESSIVENESS),
        max_fill_hours: parse_f64(&params, "maxFillHours").unwrap_or(DEFAULT_MAX_FILL_HOURS),
        slots_per_item: parse_u32(&params, "slots").unwrap_or(DEFAULT_SLOTS_PER_ITEM),
        total_slots: parse_u32(&params, "totalSlots").unwrap_or(DEFAULT_TOTAL_SLOTS),
        auto_distribute: params
            .get("distribute")
            .map(|raw| raw == "1" || raw == "true")
            .unwrap_or(false),
        favorite_ids: params
            .get("favorites")
            .map(|raw| parse_id_list(raw).into_iter().collect())
            .unwrap_or_default(),
        membership: params
            .get("membership")
            .and_then(|raw| raw.parse::<Membership>().ok())
            .unwrap_or_default(),
    };

    let flips = state
        .engine
        .find_best_flips(&request)
        .await
        .map_err(feed_failure)?;

    let resolved = request.normalized();
    let mut favorites: Vec<u32> = resolved.favorite_ids.iter().copied().collect();
    favorites.sort_unstable();

    Ok(Json(BestFlipsResponse {
        budget: resolved.budget,
        min_volume: resolved.min_volume,
        slots: resolved.slots_per_item,
        max_fill_hours: resolved.max_fill_hours,
        buy_aggro: resolved.buy_aggressiveness,
        sell_aggro: resolved.sell_aggressiveness,
        limit: resolved.limit,
        total_slots: resolved.total_slots,
        favorites,
        membership: resolved.membership.to_string(),
        count: flips.len(),
        flips,
    }))
}

/// GET /api/items/list
pub async fn get_item_list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ItemListResponse>, ApiError> {
    let membership = params
        .get("membership")
        .and_then(|raw| raw.parse::<Membership>().ok())
        .unwrap_or_default();

    let (catalog, quotes, volumes) = tokio::try_join!(
        state.source.fetch_catalog(),
        state.source.fetch_latest(),
        state.source.fetch_volumes(),
    )
    .map_err(feed_failure)?;

    let items = catalog
        .into_iter()
        .filter(|item| membership.admits(item.members))
        .map(|item| {
            let quote = quotes.get(&item.id);
            let buy = quote.and_then(|q| q.low);
            let sell = quote.and_then(|q| q.high);
            let margin = match (buy, sell) {
                (Some(b), Some(s)) => Some(s - b),
                _ => None,
            };
            let margin_pct = match (margin, buy) {
                (Some(m), Some(b)) if b > 0 => Some(m as f64 / b as f64),
                _ => None,
            };
            ItemListEntry {
                id: item.id,
                name: item.name,
                members: item.members,
                limit: item.limit,
                buy,
                sell,
                margin,
                margin_pct,
                volume: volumes.get(&item.id).copied(),
            }
        })
        .collect();

    Ok(Json(ItemListResponse { items }))
}

/// GET /api/items/latest-lite
pub async fn get_latest_lite(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<LatestLiteResponse>, ApiError> {
    let ids: Option<Vec<u32>> = params
        .get("ids")
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_id_list(raw));

    let quotes = state.source.fetch_latest().await.map_err(feed_failure)?;

    let keep = |id: &u32| match &ids {
        Some(wanted) => wanted.contains(id),
        None => true,
    };

    let latest = quotes
        .iter()
        .filter(|(id, quote)| keep(id) && quote.is_two_sided())
        .map(|(id, quote)| {
            (
                *id,
                LitePrice {
                    buy: quote.buy_price(),
                    sell: quote.sell_price(),
                },
            )
        })
        .collect();

    Ok(Json(LatestLiteResponse { latest }))
}

/// GET /api/items/:id/history
pub async fn get_item_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let item_id = parse_item_id(&id)?;
    let timestep = params
        .get("timestep")
        .and_then(|raw| raw.parse::<Timestep>().ok())
        .unwrap_or(Timestep::Hour);

    let points = state
        .source
        .fetch_timeseries(item_id, timestep)
        .await
        .map_err(feed_failure)?;

    Ok(Json(HistoryResponse {
        id: item_id,
        timestep: timestep.to_string(),
        count: points.len(),
        points,
    }))
}

/// GET /api/items/:id/guide
pub async fn get_item_guide(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GuideResponse>, ApiError> {
    let item_id = parse_item_id(&id)?;

    match state
        .source
        .fetch_guide_price(item_id)
        .await
        .map_err(feed_failure)?
    {
        Some(guide) => Ok(Json(GuideResponse {
            id: item_id,
            price: guide.price,
            trend: guide.trend,
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No guide price" })),
        )),
    }
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
