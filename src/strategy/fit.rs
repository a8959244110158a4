//! Fit classifier.
//!
//! Labels each surviving candidate low/medium/high from liquidity
//! headroom, the tuned margin ratio, the raw spread, and how the full
//! buy-and-sell cycle compares to the requested window.

use super::admissibility::MarginProfile;
use super::pricing::TunedQuote;
use super::sizing::SizedOrder;
use super::timing::FlipTiming;
use crate::types::FitLevel;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds for the qualitative fit label.
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Below this volume-to-quantity headroom the flip crowds the market.
    pub thin_liquidity_ratio: f64,
    pub strong_liquidity_ratio: f64,
    /// Tuned margins above this are treated as volatile.
    pub volatile_margin_ratio: f64,
    pub high_fit_min_margin_ratio: f64,
    pub high_fit_max_margin_ratio: f64,
    pub wide_spread_ratio: f64,
    pub high_fit_max_spread_ratio: f64,
    /// Allowed overshoot of the full cycle vs the requested window.
    pub cycle_slack: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            thin_liquidity_ratio: 5.0,
            strong_liquidity_ratio: 15.0,
            volatile_margin_ratio: 0.5,
            high_fit_min_margin_ratio: 0.05,
            high_fit_max_margin_ratio: 0.35,
            wide_spread_ratio: 0.65,
            high_fit_max_spread_ratio: 0.5,
            cycle_slack: 1.05,
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

pub struct FitClassifier {
    config: FitConfig,
}

impl FitClassifier {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Classify a fully scored candidate. The margin judged here is the
    /// tuned one (adjusted margin over the recommended buy), while the
    /// spread is the raw quote spread over mid.
    pub fn classify(
        &self,
        profile: &MarginProfile,
        tuned: &TunedQuote,
        sized: &SizedOrder,
        timing: &FlipTiming,
        max_fill_hours: f64,
    ) -> (FitLevel, &'static str) {
        let cfg = &self.config;

        let margin_ratio = tuned.adjusted_margin as f64 / tuned.recommended_buy as f64;
        let volume_to_qty = if sized.effective_qty > 0 {
            profile.volume as f64 / sized.effective_qty as f64
        } else {
            0.0
        };
        // The raw fill+sell sum, without the quarter-hour floor used for
        // profit-per-hour.
        let cycle_hours = timing.fill_hours + timing.sell_hours;
        let meets_time = cycle_hours <= max_fill_hours * cfg.cycle_slack;

        if volume_to_qty < cfg.thin_liquidity_ratio
            || margin_ratio > cfg.volatile_margin_ratio
            || profile.spread_ratio > cfg.wide_spread_ratio
            || !meets_time
        {
            return (FitLevel::Low, "Thin liquidity or slow/volatile trade");
        }

        if volume_to_qty >= cfg.strong_liquidity_ratio
            && margin_ratio >= cfg.high_fit_min_margin_ratio
            && margin_ratio <= cfg.high_fit_max_margin_ratio
            && profile.spread_ratio <= cfg.high_fit_max_spread_ratio
            && meets_time
        {
            return (
                FitLevel::High,
                "Strong liquidity and moderate margin within window",
            );
        }

        (FitLevel::Medium, "Decent liquidity but watch fills/price moves")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
