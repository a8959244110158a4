//! Price tuner.
//!
//! Picks an execution bid/ask pair that is more likely to fill than the
//! raw quote while preserving most of the margin. Aggressiveness starts
//! at the requested values and is nudged by urgency, risk, and favorite
//! status before being converted into concrete prices.

use tracing::debug;

use super::admissibility::MarginProfile;
use crate::types::{clamp_aggro, ScanParams};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Aggressiveness tuning knobs.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Hard cap on tuned aggressiveness per side.
    pub aggressiveness_cap: f64,
    /// Never concede more than this share of the spread on either side.
    pub spread_share_cap: f64,
    /// Added to both sides for a ≤1h window; halved for ≤2h.
    pub short_window_bonus: f64,
    /// Large margins get priced patiently — they are more likely to be
    /// anomalies or to need time.
    pub moderate_risk_margin_ratio: f64,
    pub moderate_risk_penalty: f64,
    pub high_risk_margin_ratio: f64,
    pub high_risk_penalty: f64,
    /// Liquid favorites get priced for speed.
    pub favorite_bonus: f64,
    pub favorite_volume_floor: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            aggressiveness_cap: 0.5,
            spread_share_cap: 0.55,
            short_window_bonus: 0.05,
            moderate_risk_margin_ratio: 0.20,
            moderate_risk_penalty: 0.04,
            high_risk_margin_ratio: 0.35,
            high_risk_penalty: 0.08,
            favorite_bonus: 0.05,
            favorite_volume_floor: 50_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Tuner
// ---------------------------------------------------------------------------

/// Concrete execution prices for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct TunedQuote {
    pub recommended_buy: i64,
    pub recommended_sell: i64,
    pub adjusted_margin: i64,
}

pub struct PriceTuner {
    config: PricingConfig,
}

impl PriceTuner {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Compute the recommended bid/ask. `None` when the tuning collapsed
    /// the spread entirely.
    pub fn tune(
        &self,
        profile: &MarginProfile,
        params: &ScanParams,
        is_favorite: bool,
    ) -> Option<TunedQuote> {
        let cfg = &self.config;

        let urgency_bonus = if params.max_fill_hours <= 1.0 {
            cfg.short_window_bonus
        } else if params.max_fill_hours <= 2.0 {
            cfg.short_window_bonus / 2.0
        } else {
            0.0
        };

        let risk_penalty = if profile.margin_ratio >= cfg.high_risk_margin_ratio {
            cfg.high_risk_penalty
        } else if profile.margin_ratio >= cfg.moderate_risk_margin_ratio {
            cfg.moderate_risk_penalty
        } else {
            0.0
        };

        let favorite_bonus = if is_favorite && profile.volume > cfg.favorite_volume_floor {
            cfg.favorite_bonus
        } else {
            0.0
        };

        let tuned_buy = clamp_aggro(
            params.buy_aggressiveness + favorite_bonus + urgency_bonus - risk_penalty,
            cfg.aggressiveness_cap,
        );
        let tuned_sell = clamp_aggro(
            params.sell_aggressiveness + favorite_bonus + urgency_bonus - risk_penalty,
            cfg.aggressiveness_cap,
        );

        let buy = profile.buy_price as f64;
        let sell = profile.sell_price as f64;
        let margin = profile.margin as f64;

        let recommended_buy = (buy + margin * tuned_buy)
            .min(buy + margin * cfg.spread_share_cap)
            .floor() as i64;
        let recommended_buy = recommended_buy.min(profile.sell_price).max(1);

        let recommended_sell = (sell - margin * tuned_sell)
            .max(sell - margin * cfg.spread_share_cap)
            .floor() as i64;
        let recommended_sell = recommended_sell.max(recommended_buy + 1);

        let adjusted_margin = recommended_sell - recommended_buy;
        if adjusted_margin <= 0 {
            debug!(
                buy = profile.buy_price,
                sell = profile.sell_price,
                "Tuning collapsed the spread"
            );
            return None;
        }

        Some(TunedQuote {
            recommended_buy,
            recommended_sell,
            adjusted_margin,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
