//! Admissibility filter.
//!
//! First stage of the scoring pipeline: rejects items whose market data
//! is missing, stale, implausible, or too thin to trade against.
//! Rejection is a silent skip — the engine's contract is "return what
//! qualifies", not "explain every rejection".

use crate::types::{CatalogItem, Quote, ScanParams};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Data-quality and liquidity bounds for admitting an item.
#[derive(Debug, Clone)]
pub struct AdmissibilityConfig {
    /// Anything quoted under this is junk data, not a real market.
    pub min_plausible_price: i64,
    /// Anything above this is a corrupted feed value.
    pub max_plausible_price: i64,
    /// Quotes older than this on either side are discarded.
    pub max_quote_age_secs: i64,
    /// Margin ratios below this are noise not worth a slot.
    pub min_margin_ratio: f64,
    /// Margin ratios above this are corrupted spreads.
    pub max_margin_ratio: f64,
    /// Margins this large on thin items are usually stale or bad data.
    pub high_margin_ratio: f64,
    pub high_margin_min_volume: u64,
    /// Spreads this wide relative to mid need heavy volume behind them.
    pub wide_spread_ratio: f64,
    pub wide_spread_min_volume: u64,
}

impl Default for AdmissibilityConfig {
    fn default() -> Self {
        Self {
            min_plausible_price: 10,
            max_plausible_price: 1_000_000_000,
            max_quote_age_secs: 3600,
            min_margin_ratio: 0.005,
            max_margin_ratio: 4.0,
            high_margin_ratio: 0.30,
            high_margin_min_volume: 15_000,
            wide_spread_ratio: 0.65,
            wide_spread_min_volume: 50_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Raw market numbers for an item that passed admissibility.
#[derive(Debug, Clone, Copy)]
pub struct MarginProfile {
    pub buy_price: i64,
    pub sell_price: i64,
    pub margin: i64,
    /// margin / buy — the raw, pre-tuning margin ratio.
    pub margin_ratio: f64,
    /// margin / midprice.
    pub spread_ratio: f64,
    pub volume: u64,
}

pub struct AdmissibilityFilter {
    config: AdmissibilityConfig,
}

impl AdmissibilityFilter {
    pub fn new(config: AdmissibilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdmissibilityConfig {
        &self.config
    }

    /// Check one item against the membership filter and every data-quality
    /// and liquidity guard. `now_secs` is the snapshot instant used for
    /// staleness, never the wall clock.
    pub fn admit(
        &self,
        item: &CatalogItem,
        quote: Option<&Quote>,
        volume: u64,
        params: &ScanParams,
        now_secs: i64,
    ) -> Option<MarginProfile> {
        let cfg = &self.config;

        if !params.membership.admits(item.members) {
            return None;
        }

        let quote = quote?;
        let buy_price = quote.buy_price();
        let sell_price = quote.sell_price();
        if buy_price <= 0 || sell_price <= 0 {
            return None;
        }
        if buy_price < cfg.min_plausible_price || sell_price > cfg.max_plausible_price {
            return None;
        }

        // Stale price points produce nonsense margins.
        if now_secs - quote.low_time > cfg.max_quote_age_secs
            || now_secs - quote.high_time > cfg.max_quote_age_secs
        {
            return None;
        }

        let margin = sell_price - buy_price;
        if margin <= 0 {
            return None;
        }

        let margin_ratio = margin as f64 / buy_price as f64;
        if margin_ratio < cfg.min_margin_ratio || margin_ratio > cfg.max_margin_ratio {
            return None;
        }

        let midprice = (buy_price + sell_price) as f64 / 2.0;
        let spread_ratio = margin as f64 / midprice.max(1.0);

        let high_margin_thin = margin_ratio >= cfg.high_margin_ratio
            && volume < params.min_volume.max(cfg.high_margin_min_volume);
        let wide_spread_thin =
            spread_ratio >= cfg.wide_spread_ratio && volume < cfg.wide_spread_min_volume;
        if volume < params.min_volume || high_margin_thin || wide_spread_thin {
            return None;
        }

        Some(MarginProfile {
            buy_price,
            sell_price,
            margin,
            margin_ratio,
            spread_ratio,
            volume,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FlipRequest, Membership};

    const NOW: i64 = 1_700_000_000;

    fn filter() -> AdmissibilityFilter {
        AdmissibilityFilter::new(AdmissibilityConfig::default())
    }

    fn params() -> ScanParams {
        FlipRequest::default().normalized()
    }

    fn make_item(members: bool) -> CatalogItem {
        CatalogItem {
            id: 7,
            name: "Test item".to_string(),
            members,
            limit: None,
        }
    }

    fn make_quote(low: i64, high: i64) -> Quote {
        Quote {
            high: Some(high),
            low: Some(low),
            high_time: NOW,
            low_time: NOW,
        }
    }

    #[test]
    fn test_admits_clean_item() {
        let profile = filter()
            .admit(&make_item(false), Some(&make_quote(1000, 1100)), 100_000, &params(), NOW)
            .expect("should admit");
        assert_eq!(profile.margin, 100);
        assert!((profile.margin_ratio - 0.1).abs() < 1e-12);
        assert!((profile.spread_ratio - 100.0 / 1050.0).abs() < 1e-12);
        assert_eq!(profile.volume, 100_000);
    }

    #[test]
    fn test_membership_filter() {
        let mut p = params();
        p.membership = Membership::FreeToPlay;
        let quote = make_quote(1000, 1100);
        assert!(filter().admit(&make_item(true), Some(&quote), 100_000, &p, NOW).is_none());
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &p, NOW).is_some());

        p.membership = Membership::MembersOnly;
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &p, NOW).is_none());
    }

    #[test]
    fn test_rejects_missing_quote() {
        assert!(filter().admit(&make_item(false), None, 100_000, &params(), NOW).is_none());
    }

    #[test]
    fn test_rejects_one_sided_quote() {
        let quote = Quote {
            high: None,
            low: Some(1000),
            high_time: NOW,
            low_time: NOW,
        };
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &params(), NOW).is_none());
    }

    #[test]
    fn test_rejects_implausible_prices() {
        // Below the 10 gp floor.
        let quote = make_quote(5, 9);
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &params(), NOW).is_none());

        // Above the 1b ceiling.
        let quote = make_quote(999_000_000, 1_000_000_001);
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &params(), NOW).is_none());
    }

    #[test]
    fn test_rejects_stale_quotes() {
        let mut quote = make_quote(1000, 1100);
        quote.low_time = NOW - 3601;
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &params(), NOW).is_none());

        let mut quote = make_quote(1000, 1100);
        quote.high_time = NOW - 3601;
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &params(), NOW).is_none());

        // Exactly at the window is still fine.
        let mut quote = make_quote(1000, 1100);
        quote.low_time = NOW - 3600;
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &params(), NOW).is_some());
    }

    #[test]
    fn test_rejects_non_positive_margin() {
        let quote = make_quote(1100, 1100);
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &params(), NOW).is_none());

        let quote = make_quote(1100, 1000);
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &params(), NOW).is_none());
    }

    #[test]
    fn test_rejects_margin_ratio_out_of_bounds() {
        // 3 / 1000 = 0.003, below the 0.005 noise floor.
        let quote = make_quote(1000, 1003);
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &params(), NOW).is_none());

        // 410 / 100 = 4.1, above the 4.0 ceiling.
        let quote = make_quote(100, 510);
        assert!(filter().admit(&make_item(false), Some(&quote), 100_000, &params(), NOW).is_none());
    }

    #[test]
    fn test_rejects_below_min_volume() {
        let quote = make_quote(1000, 1100);
        assert!(filter().admit(&make_item(false), Some(&quote), 499, &params(), NOW).is_none());
        assert!(filter().admit(&make_item(false), Some(&quote), 500, &params(), NOW).is_some());
    }

    #[test]
    fn test_high_margin_thin_guard() {
        // 35% margin needs max(min_volume, 15,000) behind it.
        let quote = make_quote(1000, 1350);
        assert!(filter().admit(&make_item(false), Some(&quote), 14_999, &params(), NOW).is_none());
        assert!(filter().admit(&make_item(false), Some(&quote), 15_000, &params(), NOW).is_some());
    }

    #[test]
    fn test_high_margin_guard_respects_min_volume() {
        let mut p = params();
        p.min_volume = 20_000;
        let quote = make_quote(1000, 1350);
        // max(20,000, 15,000) = 20,000.
        assert!(filter().admit(&make_item(false), Some(&quote), 19_000, &p, NOW).is_none());
        assert!(filter().admit(&make_item(false), Some(&quote), 20_000, &p, NOW).is_some());
    }

    #[test]
    fn test_wide_spread_thin_guard() {
        // 100 → 200: spread ratio 100/150 ≈ 0.67 ≥ 0.65, margin ratio 1.0.
        // Needs 50,000 volume; the high-margin guard (15,000) passes first.
        let quote = make_quote(100, 200);
        assert!(filter().admit(&make_item(false), Some(&quote), 49_999, &params(), NOW).is_none());
        assert!(filter().admit(&make_item(false), Some(&quote), 50_000, &params(), NOW).is_some());
    }
}
