//! Timing estimator.
//!
//! Converts throughput into expected hours-to-fill and hours-to-sell for
//! the sized quantity, and derives the profit figures. Only the buy-side
//! fill estimate gates acceptance; the sell leg feeds the cycle estimate
//! alone.

use super::sizing::SizedOrder;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// Floor for throughput rates and the cycle estimate, in hours.
    pub min_hourly_window: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_hourly_window: 0.25,
        }
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Time and profit estimates for one sized candidate.
#[derive(Debug, Clone, Copy)]
pub struct FlipTiming {
    pub fill_hours: f64,
    pub sell_hours: f64,
    pub estimated_profit: i64,
    pub cycle_hours: f64,
    pub profit_per_hour: f64,
}

pub struct TimingEstimator {
    config: TimingConfig,
}

impl TimingEstimator {
    pub fn new(config: TimingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    /// Estimate fill/sell times and profit. `None` when the buy leg can't
    /// fill inside `max_fill_hours` (times the favorite multiplier) or the
    /// flip wouldn't profit.
    pub fn estimate(
        &self,
        sized: &SizedOrder,
        adjusted_margin: i64,
        max_fill_hours: f64,
    ) -> Option<FlipTiming> {
        let fill_hours = self.hours_to_trade(sized.effective_qty, sized.buy_per_hour);
        if fill_hours > max_fill_hours * sized.fill_multiplier {
            return None;
        }

        let sell_hours = self.hours_to_trade(sized.effective_qty, sized.sell_per_hour);

        let estimated_profit = adjusted_margin.saturating_mul(sized.effective_qty);
        if estimated_profit <= 0 {
            return None;
        }

        let cycle_hours = (fill_hours + sell_hours).max(self.config.min_hourly_window);
        let profit_per_hour = estimated_profit as f64 / cycle_hours;

        Some(FlipTiming {
            fill_hours,
            sell_hours,
            estimated_profit,
            cycle_hours,
            profit_per_hour,
        })
    }

    /// Hours to move `qty` units at `per_hour` flow, with the rate floored
    /// so trivial quantities don't report instant fills. Zero flow means
    /// the trade never completes.
    fn hours_to_trade(&self, qty: i64, per_hour: f64) -> f64 {
        if per_hour > 0.0 {
            qty as f64 / per_hour.max(1.0 / (self.config.min_hourly_window * 24.0))
        } else {
            f64::INFINITY
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
