//! Scoring pipeline — admissibility, price tuning, sizing, timing, and fit.

pub mod admissibility;
pub mod fit;
pub mod pricing;
pub mod sizing;
pub mod timing;

use crate::types::{CatalogItem, FlipCandidate, Quote, ScanParams};
use admissibility::{AdmissibilityConfig, AdmissibilityFilter};
use fit::{FitClassifier, FitConfig};
use pricing::{PriceTuner, PricingConfig};
use sizing::{PositionSizer, SizingConfig};
use timing::{TimingConfig, TimingEstimator};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Every numeric knob of the scoring policy, collected in one place so the
/// whole policy can be swapped or tested in isolation.
#[derive(Debug, Clone, Default)]
pub struct ScoringPolicy {
    pub admissibility: AdmissibilityConfig,
    pub pricing: PricingConfig,
    pub sizing: SizingConfig,
    pub timing: TimingConfig,
    pub fit: FitConfig,
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Pipelines admissibility → price tuning → sizing → timing → fit for a
/// single item.
///
/// A pure function of (item, quote, volume, params, now): no I/O, no
/// shared state, no clock reads. Identical inputs always produce the
/// identical candidate.
pub struct FlipScorer {
    filter: AdmissibilityFilter,
    tuner: PriceTuner,
    sizer: PositionSizer,
    timing: TimingEstimator,
    fit: FitClassifier,
}

impl FlipScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            filter: AdmissibilityFilter::new(policy.admissibility),
            tuner: PriceTuner::new(policy.pricing),
            sizer: PositionSizer::new(policy.sizing),
            timing: TimingEstimator::new(policy.timing),
            fit: FitClassifier::new(policy.fit),
        }
    }

    /// Score one item against the snapshot data. `None` means the item
    /// doesn't qualify — a silent skip, never an error.
    pub fn evaluate(
        &self,
        item: &CatalogItem,
        quote: Option<&Quote>,
        volume: u64,
        params: &ScanParams,
        now_secs: i64,
    ) -> Option<FlipCandidate> {
        let profile = self.filter.admit(item, quote, volume, params, now_secs)?;
        let is_favorite = params.is_favorite(item.id);
        let tuned = self.tuner.tune(&profile, params, is_favorite)?;
        let sized = self.sizer.size(item, &profile, &tuned, params, is_favorite)?;
        let timing = self
            .timing
            .estimate(&sized, tuned.adjusted_margin, params.max_fill_hours)?;
        let (fit, fit_reason) =
            self.fit
                .classify(&profile, &tuned, &sized, &timing, params.max_fill_hours);

        Some(FlipCandidate {
            id: item.id,
            name: item.name.clone(),
            buy_price: profile.buy_price,
            sell_price: profile.sell_price,
            margin: tuned.adjusted_margin,
            margin_pct: tuned.adjusted_margin as f64 / tuned.recommended_buy as f64,
            volume: profile.volume,
            max_affordable_qty: sized.max_affordable_qty,
            effective_qty: sized.effective_qty,
            estimated_profit: timing.estimated_profit,
            recommended_buy_price: tuned.recommended_buy,
            recommended_sell_price: tuned.recommended_sell,
            estimated_fill_hours: timing.fill_hours,
            estimated_sell_hours: timing.sell_hours,
            slots_used: params.slots_per_item,
            profit_per_hour: timing.profit_per_hour,
            fit,
            fit_reason: fit_reason.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
