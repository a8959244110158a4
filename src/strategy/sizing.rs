//! Capacity and sizing engine.
//!
//! Bounds the tradeable quantity by budget, exchange buy limit, available
//! liquidity, and the requested fill window, then shrinks the result by a
//! risk multiplier. When the full budget-bound stack would still clear
//! both legs within the window, the budget wins over the risk shrink.

use tracing::debug;

use super::admissibility::MarginProfile;
use super::pricing::TunedQuote;
use crate::types::{CatalogItem, ScanParams};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Quantity capacity and risk-scaling knobs.
#[derive(Debug, Clone)]
pub struct SizingConfig {
    /// A buy limit resets every exchange period; six periods approximate
    /// one trading day.
    pub limit_windows_per_day: u64,
    /// Share of an item's hourly flow our buy offer can realistically capture.
    pub buy_flow_share: f64,
    pub sell_flow_share: f64,
    /// Throughput haircut for tight windows: more competition per fill.
    pub tight_window_factor: f64,
    pub moderate_window_factor: f64,
    /// Favorites are assumed to fill half again as fast.
    pub favorite_fill_multiplier: f64,
    /// Floor of the combined risk multiplier.
    pub risk_floor: f64,
    pub high_risk_margin_ratio: f64,
    pub high_risk_factor: f64,
    pub moderate_risk_margin_ratio: f64,
    pub moderate_risk_factor: f64,
    pub thin_volume_multiple: u64,
    pub thin_volume_factor: f64,
    pub modest_volume_multiple: u64,
    pub modest_volume_factor: f64,
    pub tight_window_risk_factor: f64,
    pub moderate_window_risk_factor: f64,
    /// Never suggest more than this share of the affordable stack for a
    /// one-hour window.
    pub short_window_budget_share: f64,
    /// Extra slack allowed on the sell leg when preferring the full budget.
    pub sell_window_slack: f64,
    /// Floor for throughput-based time estimates, in hours.
    pub min_hourly_window: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            limit_windows_per_day: 6,
            buy_flow_share: 0.6,
            sell_flow_share: 0.5,
            tight_window_factor: 0.6,
            moderate_window_factor: 0.8,
            favorite_fill_multiplier: 1.5,
            risk_floor: 0.25,
            high_risk_margin_ratio: 0.35,
            high_risk_factor: 0.5,
            moderate_risk_margin_ratio: 0.20,
            moderate_risk_factor: 0.7,
            thin_volume_multiple: 3,
            thin_volume_factor: 0.7,
            modest_volume_multiple: 5,
            modest_volume_factor: 0.85,
            tight_window_risk_factor: 0.9,
            moderate_window_risk_factor: 0.95,
            short_window_budget_share: 0.5,
            sell_window_slack: 1.2,
            min_hourly_window: 0.25,
        }
    }
}

// ---------------------------------------------------------------------------
// Sizer
// ---------------------------------------------------------------------------

/// Sized position plus the throughput numbers downstream stages reuse.
#[derive(Debug, Clone, Copy)]
pub struct SizedOrder {
    /// Budget available to this item after optional slot distribution.
    pub budget_share: i64,
    pub max_affordable_qty: i64,
    pub effective_qty: i64,
    pub buy_per_hour: f64,
    pub sell_per_hour: f64,
    /// 1.5 for favorites, otherwise 1.0; widens the acceptable fill window.
    pub fill_multiplier: f64,
}

pub struct PositionSizer {
    config: SizingConfig,
}

impl PositionSizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Size the position for one admitted, priced candidate. `None` when
    /// nothing is affordable or every cap drives the quantity to zero.
    pub fn size(
        &self,
        item: &CatalogItem,
        profile: &MarginProfile,
        tuned: &TunedQuote,
        params: &ScanParams,
        is_favorite: bool,
    ) -> Option<SizedOrder> {
        let cfg = &self.config;
        let volume = profile.volume;

        // Bound by a day's worth of buy-limit windows when the item has one.
        let safe_volume = match item.limit {
            Some(limit) if limit > 0 => {
                volume.min((limit as u64).saturating_mul(cfg.limit_windows_per_day))
            }
            _ => volume,
        };

        let budget_share = if params.auto_distribute && params.total_slots > 0 {
            ((params.budget * params.slots_per_item as i64) / params.total_slots as i64).max(1)
        } else {
            params.budget
        };

        let max_affordable_qty = budget_share / tuned.recommended_buy;
        if max_affordable_qty <= 0 {
            return None;
        }

        let window_factor = self.window_factor(params.max_fill_hours);
        let per_hour_volume = volume as f64 / 24.0;
        let buy_per_hour = per_hour_volume * (cfg.buy_flow_share * window_factor);
        let sell_per_hour = per_hour_volume * (cfg.sell_flow_share * window_factor);
        let fill_multiplier = if is_favorite {
            cfg.favorite_fill_multiplier
        } else {
            1.0
        };

        let time_cap_qty = if buy_per_hour > 0.0 {
            (buy_per_hour * params.max_fill_hours * params.slots_per_item as f64 * fill_multiplier)
                .floor() as i64
        } else {
            0
        };

        let limit_qty = match item.limit {
            Some(limit) if limit > 0 => limit as i64,
            _ => i64::MAX,
        };

        let budget_bound_qty = max_affordable_qty.min(safe_volume as i64).min(limit_qty);
        let mut effective_qty = budget_bound_qty
            .min(if time_cap_qty > 0 {
                time_cap_qty
            } else {
                safe_volume as i64
            })
            .max(0);

        // Never suggest a full-budget stack for a one-hour window.
        if params.max_fill_hours <= 1.0 {
            let short_cap =
                (max_affordable_qty as f64 * cfg.short_window_budget_share).floor() as i64;
            if short_cap > 0 {
                effective_qty = effective_qty.min(short_cap);
            }
        }

        let risk = self.risk_multiplier(
            profile.margin_ratio,
            volume,
            params.min_volume,
            params.max_fill_hours,
        );
        effective_qty = (effective_qty as f64 * risk).floor() as i64;
        if effective_qty == 0 {
            // An affordable, otherwise-valid candidate never zeroes out.
            debug!(item = item.id, "Risk shrink floored quantity to 1");
            effective_qty = 1;
        }

        // If the budget-sized stack still fits both legs in the window,
        // prefer spending the budget over the risk-shrunk quantity.
        if budget_bound_qty > effective_qty {
            let floor_rate = 1.0 / (cfg.min_hourly_window * 24.0);
            let budget_fill_hours = if buy_per_hour > 0.0 {
                budget_bound_qty as f64 / buy_per_hour.max(floor_rate)
            } else {
                f64::INFINITY
            };
            let budget_sell_hours = if sell_per_hour > 0.0 {
                budget_bound_qty as f64 / sell_per_hour.max(floor_rate)
            } else {
                f64::INFINITY
            };
            if budget_fill_hours <= params.max_fill_hours * fill_multiplier
                && budget_sell_hours
                    <= params.max_fill_hours * fill_multiplier * cfg.sell_window_slack
            {
                effective_qty = budget_bound_qty;
            }
        }

        if effective_qty <= 0 {
            return None;
        }

        Some(SizedOrder {
            budget_share,
            max_affordable_qty,
            effective_qty,
            buy_per_hour,
            sell_per_hour,
            fill_multiplier,
        })
    }

    fn window_factor(&self, max_fill_hours: f64) -> f64 {
        if max_fill_hours <= 1.0 {
            self.config.tight_window_factor
        } else if max_fill_hours <= 2.0 {
            self.config.moderate_window_factor
        } else {
            1.0
        }
    }

    /// Multiplicative down-scaling for risky candidates, clamped to
    /// [risk_floor, 1].
    fn risk_multiplier(
        &self,
        margin_ratio: f64,
        volume: u64,
        min_volume: u64,
        max_fill_hours: f64,
    ) -> f64 {
        let cfg = &self.config;
        let mut multiplier = 1.0;

        if margin_ratio >= cfg.high_risk_margin_ratio {
            multiplier *= cfg.high_risk_factor;
        } else if margin_ratio >= cfg.moderate_risk_margin_ratio {
            multiplier *= cfg.moderate_risk_factor;
        }

        if volume < min_volume.saturating_mul(cfg.thin_volume_multiple) {
            multiplier *= cfg.thin_volume_factor;
        } else if volume < min_volume.saturating_mul(cfg.modest_volume_multiple) {
            multiplier *= cfg.modest_volume_factor;
        }

        if max_fill_hours <= 1.0 {
            multiplier *= cfg.tight_window_risk_factor;
        } else if max_fill_hours <= 2.0 {
            multiplier *= cfg.moderate_window_risk_factor;
        }

        multiplier.clamp(cfg.risk_floor, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
