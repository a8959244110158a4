//! Shared types for the FLIPSCOUT engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that feed, strategy, engine,
//! and server modules can depend on them without circular references.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Request defaults and bounds
// ---------------------------------------------------------------------------

/// Budget used when the caller supplies none (or garbage): 10m gp.
pub const DEFAULT_BUDGET_GP: i64 = 10_000_000;
/// Minimum daily volume an item must trade to be considered.
pub const DEFAULT_MIN_VOLUME: u64 = 500;
pub const DEFAULT_RESULT_LIMIT: usize = 25;
pub const MAX_RESULT_LIMIT: usize = 200;
/// How long we're willing to wait for fills, in hours.
pub const DEFAULT_MAX_FILL_HOURS: f64 = 6.0;
/// Floor for time-based calculations.
pub const MIN_FILL_WINDOW_HOURS: f64 = 0.25;
/// Share of the spread to concede on each side by default.
pub const DEFAULT_AGGRESSIVENESS: f64 = 0.2;
pub const AGGRESSIVENESS_CAP: f64 = 0.5;
/// The exchange offers six offer slots per account.
pub const MAX_SLOTS: u32 = 6;
pub const DEFAULT_SLOTS_PER_ITEM: u32 = 1;
pub const DEFAULT_TOTAL_SLOTS: u32 = 6;

// ---------------------------------------------------------------------------
// Catalog & market data
// ---------------------------------------------------------------------------

/// A tradeable item from the exchange catalog (`/mapping`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: u32,
    pub name: String,
    /// Whether the item is restricted to members-only worlds.
    #[serde(default)]
    pub members: bool,
    /// Per-period buy limit imposed by the exchange, when one exists.
    #[serde(default)]
    pub limit: Option<u32>,
}

impl fmt::Display for CatalogItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}{}{}",
            self.id,
            self.name,
            if self.members { " (members)" } else { "" },
            match self.limit {
                Some(l) => format!(" limit={l}"),
                None => String::new(),
            },
        )
    }
}

/// Latest instant-buy/instant-sell quote for one item.
///
/// `low` is the most recent instant-buy transaction price (what you can
/// buy at), `high` the instant-sell (what you can sell at). Timestamps
/// are unix seconds of the respective observations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default)]
    pub high: Option<i64>,
    #[serde(default)]
    pub low: Option<i64>,
    #[serde(default)]
    pub high_time: i64,
    #[serde(default)]
    pub low_time: i64,
}

impl Quote {
    /// Price we would buy at (0 when the side is missing).
    pub fn buy_price(&self) -> i64 {
        self.low.unwrap_or(0)
    }

    /// Price we would sell at (0 when the side is missing).
    pub fn sell_price(&self) -> i64 {
        self.high.unwrap_or(0)
    }

    /// Whether both sides of the book have been observed.
    pub fn is_two_sided(&self) -> bool {
        self.buy_price() > 0 && self.sell_price() > 0
    }
}

/// One bucket of the price history series for an item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub timestamp: i64,
    pub avg_high_price: Option<i64>,
    pub avg_low_price: Option<i64>,
    #[serde(default)]
    pub high_price_volume: Option<i64>,
    #[serde(default)]
    pub low_price_volume: Option<i64>,
}

/// Official guide price from the exchange catalogue, with its trend label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidePrice {
    pub price: Option<i64>,
    pub trend: Option<String>,
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which item pool a scan should consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    #[default]
    All,
    #[serde(rename = "members")]
    MembersOnly,
    #[serde(rename = "f2p")]
    FreeToPlay,
}

impl Membership {
    /// Whether an item with the given members flag passes this filter.
    pub fn admits(&self, is_members: bool) -> bool {
        match self {
            Membership::All => true,
            Membership::MembersOnly => is_members,
            Membership::FreeToPlay => !is_members,
        }
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Membership::All => write!(f, "all"),
            Membership::MembersOnly => write!(f, "members"),
            Membership::FreeToPlay => write!(f, "f2p"),
        }
    }
}

impl std::str::FromStr for Membership {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Membership::All),
            "members" | "p2p" => Ok(Membership::MembersOnly),
            "f2p" | "free" | "free-to-play" => Ok(Membership::FreeToPlay),
            _ => Err(anyhow::anyhow!("Unknown membership filter: {s}")),
        }
    }
}

/// Resolution of the price history series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timestep {
    FiveMinutes,
    Hour,
    Day,
}

impl Timestep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timestep::FiveMinutes => "5m",
            Timestep::Hour => "1h",
            Timestep::Day => "24h",
        }
    }
}

impl fmt::Display for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Timestep {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5m" => Ok(Timestep::FiveMinutes),
            "1h" => Ok(Timestep::Hour),
            "24h" => Ok(Timestep::Day),
            _ => Err(anyhow::anyhow!("Unknown timestep: {s}")),
        }
    }
}

/// Qualitative quality label attached to each candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for FitLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitLevel::Low => write!(f, "low"),
            FitLevel::Medium => write!(f, "medium"),
            FitLevel::High => write!(f, "high"),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine request
// ---------------------------------------------------------------------------

/// One scan's worth of tuning parameters. Not persisted; every run builds
/// its results from scratch against a fresh snapshot.
#[derive(Debug, Clone)]
pub struct FlipRequest {
    /// Total bankroll in gp. Non-finite or non-positive values fall back
    /// to [`DEFAULT_BUDGET_GP`].
    pub budget: f64,
    pub min_volume: u64,
    pub limit: usize,
    /// Share of the spread to bid above the current low, [0, 0.5].
    pub buy_aggressiveness: f64,
    /// Share of the spread to undercut the current high, [0, 0.5].
    pub sell_aggressiveness: f64,
    pub max_fill_hours: f64,
    pub slots_per_item: u32,
    pub total_slots: u32,
    /// Split the budget across `total_slots` instead of quoting the full
    /// bankroll against every item.
    pub auto_distribute: bool,
    pub favorite_ids: HashSet<u32>,
    pub membership: Membership,
}

impl Default for FlipRequest {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET_GP as f64,
            min_volume: DEFAULT_MIN_VOLUME,
            limit: DEFAULT_RESULT_LIMIT,
            buy_aggressiveness: DEFAULT_AGGRESSIVENESS,
            sell_aggressiveness: DEFAULT_AGGRESSIVENESS,
            max_fill_hours: DEFAULT_MAX_FILL_HOURS,
            slots_per_item: DEFAULT_SLOTS_PER_ITEM,
            total_slots: DEFAULT_TOTAL_SLOTS,
            auto_distribute: false,
            favorite_ids: HashSet::new(),
            membership: Membership::All,
        }
    }
}

impl FlipRequest {
    /// Apply defaults and clamps, producing the parameters the scoring
    /// stages actually see.
    pub fn normalized(&self) -> ScanParams {
        let budget = if self.budget.is_finite() && self.budget > 0.0 {
            self.budget.floor() as i64
        } else {
            DEFAULT_BUDGET_GP
        };
        let limit = if self.limit == 0 {
            DEFAULT_RESULT_LIMIT
        } else {
            self.limit.min(MAX_RESULT_LIMIT)
        };
        let max_fill_hours = if self.max_fill_hours.is_finite() {
            self.max_fill_hours.max(MIN_FILL_WINDOW_HOURS)
        } else {
            DEFAULT_MAX_FILL_HOURS
        };

        ScanParams {
            budget,
            min_volume: self.min_volume,
            limit,
            buy_aggressiveness: clamp_aggro(self.buy_aggressiveness, AGGRESSIVENESS_CAP),
            sell_aggressiveness: clamp_aggro(self.sell_aggressiveness, AGGRESSIVENESS_CAP),
            max_fill_hours,
            slots_per_item: self.slots_per_item.clamp(1, MAX_SLOTS),
            total_slots: self.total_slots.clamp(1, MAX_SLOTS),
            auto_distribute: self.auto_distribute,
            favorite_ids: self.favorite_ids.clone(),
            membership: self.membership,
        }
    }
}

/// Normalized scan parameters. Every field has been defaulted and clamped;
/// the scoring stages trust these values as-is.
#[derive(Debug, Clone)]
pub struct ScanParams {
    pub budget: i64,
    pub min_volume: u64,
    pub limit: usize,
    pub buy_aggressiveness: f64,
    pub sell_aggressiveness: f64,
    pub max_fill_hours: f64,
    pub slots_per_item: u32,
    pub total_slots: u32,
    pub auto_distribute: bool,
    pub favorite_ids: HashSet<u32>,
    pub membership: Membership,
}

impl ScanParams {
    pub fn is_favorite(&self, id: u32) -> bool {
        self.favorite_ids.contains(&id)
    }
}

/// Clamp an aggressiveness value to [0, cap]; NaN and negatives become 0.
pub(crate) fn clamp_aggro(value: f64, cap: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        return 0.0;
    }
    value.min(cap)
}

/// Parse a budget string like `"10m"`, `"500k"` or `"2,500,000"`.
/// Anything unparseable falls back to [`DEFAULT_BUDGET_GP`].
pub fn parse_budget(input: &str) -> i64 {
    let normalized = input.trim().to_lowercase().replace(',', "");
    if normalized.is_empty() {
        return DEFAULT_BUDGET_GP;
    }

    let (digits, multiplier) = if let Some(rest) = normalized.strip_suffix('m') {
        (rest, 1_000_000)
    } else if let Some(rest) = normalized.strip_suffix('k') {
        (rest, 1_000)
    } else {
        (normalized.as_str(), 1)
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return DEFAULT_BUDGET_GP;
    }

    match digits.parse::<i64>() {
        Ok(value) if value > 0 => value.saturating_mul(multiplier),
        _ => DEFAULT_BUDGET_GP,
    }
}

// ---------------------------------------------------------------------------
// Engine output
// ---------------------------------------------------------------------------

/// A fully scored flip recommendation.
///
/// `margin` and `margin_pct` refer to the *tuned* spread (recommended sell
/// minus recommended buy), not the raw quote spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipCandidate {
    pub id: u32,
    pub name: String,
    pub buy_price: i64,
    pub sell_price: i64,
    pub margin: i64,
    pub margin_pct: f64,
    pub volume: u64,
    pub max_affordable_qty: i64,
    pub effective_qty: i64,
    pub estimated_profit: i64,
    pub recommended_buy_price: i64,
    pub recommended_sell_price: i64,
    pub estimated_fill_hours: f64,
    pub estimated_sell_hours: f64,
    pub slots_used: u32,
    pub profit_per_hour: f64,
    pub fit: FitLevel,
    pub fit_reason: String,
}

impl fmt::Display for FlipCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} | buy {} → sell {} | qty {} | profit {} gp ({:.0} gp/h) | fill {:.1}h | fit={}",
            self.id,
            self.name,
            self.recommended_buy_price,
            self.recommended_sell_price,
            self.effective_qty,
            self.estimated_profit,
            self.profit_per_hour,
            self.estimated_fill_hours,
            self.fit,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Quote tests --

    #[test]
    fn test_quote_sides() {
        let q = Quote {
            high: Some(230),
            low: Some(220),
            high_time: 100,
            low_time: 100,
        };
        assert_eq!(q.buy_price(), 220);
        assert_eq!(q.sell_price(), 230);
        assert!(q.is_two_sided());
    }

    #[test]
    fn test_quote_one_sided() {
        let q = Quote {
            high: None,
            low: Some(220),
            high_time: 0,
            low_time: 100,
        };
        assert_eq!(q.sell_price(), 0);
        assert!(!q.is_two_sided());
    }

    #[test]
    fn test_quote_deserializes_wiki_shape() {
        let json = r#"{"high":230,"highTime":1700000000,"low":220,"lowTime":1700000050}"#;
        let q: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(q.high, Some(230));
        assert_eq!(q.low_time, 1700000050);
    }

    // -- Membership tests --

    #[test]
    fn test_membership_admits() {
        assert!(Membership::All.admits(true));
        assert!(Membership::All.admits(false));
        assert!(Membership::MembersOnly.admits(true));
        assert!(!Membership::MembersOnly.admits(false));
        assert!(Membership::FreeToPlay.admits(false));
        assert!(!Membership::FreeToPlay.admits(true));
    }

    #[test]
    fn test_membership_from_str() {
        assert_eq!("all".parse::<Membership>().unwrap(), Membership::All);
        assert_eq!("members".parse::<Membership>().unwrap(), Membership::MembersOnly);
        assert_eq!("F2P".parse::<Membership>().unwrap(), Membership::FreeToPlay);
        assert!("everyone".parse::<Membership>().is_err());
    }

    #[test]
    fn test_membership_display_roundtrip() {
        for m in [Membership::All, Membership::MembersOnly, Membership::FreeToPlay] {
            let parsed: Membership = m.to_string().parse().unwrap();
            assert_eq!(parsed, m);
        }
    }

    // -- Timestep tests --

    #[test]
    fn test_timestep_from_str() {
        assert_eq!("5m".parse::<Timestep>().unwrap(), Timestep::FiveMinutes);
        assert_eq!("1h".parse::<Timestep>().unwrap(), Timestep::Hour);
        assert_eq!("24h".parse::<Timestep>().unwrap(), Timestep::Day);
        assert!("7d".parse::<Timestep>().is_err());
    }

    // -- Budget parsing tests --

    #[test]
    fn test_parse_budget_plain() {
        assert_eq!(parse_budget("2500000"), 2_500_000);
    }

    #[test]
    fn test_parse_budget_suffixes() {
        assert_eq!(parse_budget("10m"), 10_000_000);
        assert_eq!(parse_budget("500k"), 500_000);
        assert_eq!(parse_budget("1M"), 1_000_000);
    }

    #[test]
    fn test_parse_budget_commas_and_whitespace() {
        assert_eq!(parse_budget(" 2,500,000 "), 2_500_000);
    }

    #[test]
    fn test_parse_budget_fallback() {
        assert_eq!(parse_budget(""), DEFAULT_BUDGET_GP);
        assert_eq!(parse_budget("abc"), DEFAULT_BUDGET_GP);
        assert_eq!(parse_budget("-5m"), DEFAULT_BUDGET_GP);
        assert_eq!(parse_budget("1.5m"), DEFAULT_BUDGET_GP); // integers only
        assert_eq!(parse_budget("0"), DEFAULT_BUDGET_GP);
    }

    // -- Normalization tests --

    #[test]
    fn test_normalized_defaults() {
        let params = FlipRequest::default().normalized();
        assert_eq!(params.budget, DEFAULT_BUDGET_GP);
        assert_eq!(params.min_volume, DEFAULT_MIN_VOLUME);
        assert_eq!(params.limit, DEFAULT_RESULT_LIMIT);
        assert!((params.buy_aggressiveness - 0.2).abs() < 1e-12);
        assert!((params.max_fill_hours - 6.0).abs() < 1e-12);
        assert_eq!(params.slots_per_item, 1);
        assert_eq!(params.total_slots, 6);
    }

    #[test]
    fn test_normalized_bad_budget_uses_default() {
        for bad in [0.0, -100.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let req = FlipRequest {
                budget: bad,
                ..Default::default()
            };
            assert_eq!(req.normalized().budget, DEFAULT_BUDGET_GP, "budget {bad}");
        }
    }

    #[test]
    fn test_normalized_budget_floors() {
        let req = FlipRequest {
            budget: 1_234_567.9,
            ..Default::default()
        };
        assert_eq!(req.normalized().budget, 1_234_567);
    }

    #[test]
    fn test_normalized_clamps_aggressiveness() {
        let req = FlipRequest {
            buy_aggressiveness: 0.9,
            sell_aggressiveness: -0.3,
            ..Default::default()
        };
        let params = req.normalized();
        assert!((params.buy_aggressiveness - 0.5).abs() < 1e-12);
        assert_eq!(params.sell_aggressiveness, 0.0);
    }

    #[test]
    fn test_normalized_nan_aggressiveness_is_zero() {
        let req = FlipRequest {
            buy_aggressiveness: f64::NAN,
            ..Default::default()
        };
        assert_eq!(req.normalized().buy_aggressiveness, 0.0);
    }

    #[test]
    fn test_normalized_fill_hours_floor() {
        let req = FlipRequest {
            max_fill_hours: 0.0,
            ..Default::default()
        };
        assert!((req.normalized().max_fill_hours - MIN_FILL_WINDOW_HOURS).abs() < 1e-12);

        let req = FlipRequest {
            max_fill_hours: f64::NAN,
            ..Default::default()
        };
        assert!((req.normalized().max_fill_hours - DEFAULT_MAX_FILL_HOURS).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_limit_bounds() {
        let req = FlipRequest {
            limit: 0,
            ..Default::default()
        };
        assert_eq!(req.normalized().limit, DEFAULT_RESULT_LIMIT);

        let req = FlipRequest {
            limit: 5_000,
            ..Default::default()
        };
        assert_eq!(req.normalized().limit, MAX_RESULT_LIMIT);
    }

    #[test]
    fn test_normalized_slot_clamps() {
        let req = FlipRequest {
            slots_per_item: 0,
            total_slots: 99,
            ..Default::default()
        };
        let params = req.normalized();
        assert_eq!(params.slots_per_item, 1);
        assert_eq!(params.total_slots, MAX_SLOTS);
    }

    #[test]
    fn test_scan_params_favorites() {
        let req = FlipRequest {
            favorite_ids: [2, 4151].into_iter().collect(),
            ..Default::default()
        };
        let params = req.normalized();
        assert!(params.is_favorite(2));
        assert!(!params.is_favorite(30));
    }

    // -- Serialization tests --

    #[test]
    fn test_catalog_item_defaults() {
        let item: CatalogItem = serde_json::from_str(r#"{"id":2,"name":"Cannonball"}"#).unwrap();
        assert!(!item.members);
        assert!(item.limit.is_none());
    }

    #[test]
    fn test_fit_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FitLevel::High).unwrap(), "\"high\"");
        let parsed: FitLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, FitLevel::Medium);
    }

    #[test]
    fn test_candidate_serializes_camel_case() {
        let candidate = sample_candidate();
        let json = serde_json::to_string(&candidate).unwrap();
        assert!(json.contains("recommendedBuyPrice"));
        assert!(json.contains("estimatedFillHours"));
        assert!(json.contains("\"fit\":\"high\""));
        assert!(!json.contains("recommended_buy_price"));
    }

    #[test]
    fn test_candidate_roundtrip() {
        let candidate = sample_candidate();
        let json = serde_json::to_string(&candidate).unwrap();
        let parsed: FlipCandidate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, candidate);
    }

    #[test]
    fn test_candidate_display() {
        let display = format!("{}", sample_candidate());
        assert!(display.contains("Lobster"));
        assert!(display.contains("fit=high"));
    }

    fn sample_candidate() -> FlipCandidate {
        FlipCandidate {
            id: 30,
            name: "Lobster".to_string(),
            buy_price: 290,
            sell_price: 310,
            margin: 12,
            margin_pct: 0.0408,
            volume: 150_000,
            max_affordable_qty: 34_129,
            effective_qty: 22_500,
            estimated_profit: 270_000,
            recommended_buy_price: 294,
            recommended_sell_price: 306,
            estimated_fill_hours: 6.0,
            estimated_sell_hours: 7.2,
            slots_used: 1,
            profit_per_hour: 20_454.5,
            fit: FitLevel::High,
            fit_reason: "Strong liquidity and moderate margin within window".to_string(),
        }
    }
}
