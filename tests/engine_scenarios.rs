//! End-to-end scenarios driving the public engine API over fixture feeds.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use flipscout::engine::FlipEngine;
use flipscout::feed::{MarketSnapshot, StaticSource};
use flipscout::types::{CatalogItem, FitLevel, FlipRequest, Quote};

const NOW: i64 = 1_700_000_000;

fn make_item(id: u32, name: &str, limit: Option<u32>) -> CatalogItem {
    CatalogItem {
        id,
        name: name.to_string(),
        members: false,
        limit,
    }
}

fn make_quote(low: i64, high: i64, at: i64) -> Quote {
    Quote {
        high: Some(high),
        low: Some(low),
        high_time: at,
        low_time: at,
    }
}

fn snapshot_of(rows: Vec<(CatalogItem, Quote, u64)>, taken_at: i64) -> MarketSnapshot {
    let mut catalog = Vec::new();
    let mut quotes = HashMap::new();
    let mut volumes = HashMap::new();
    for (item, quote, volume) in rows {
        quotes.insert(item.id, quote);
        volumes.insert(item.id, volume);
        catalog.push(item);
    }
    MarketSnapshot {
        catalog,
        quotes,
        volumes,
        taken_at,
    }
}

fn fixture_engine() -> FlipEngine {
    FlipEngine::new(Arc::new(StaticSource::sample(Utc::now().timestamp())))
}

#[tokio::test]
async fn sample_market_produces_ranked_recommendations() {
    let engine = fixture_engine();
    let flips = engine.find_best_flips(&FlipRequest::default()).await.unwrap();

    assert_eq!(flips.len(), 3);
    for pair in flips.windows(2) {
        assert!(pair[0].estimated_profit >= pair[1].estimated_profit);
    }

    // Every recommendation honours the core price/size invariants.
    for c in &flips {
        assert!(c.recommended_sell_price > c.recommended_buy_price);
        assert!(c.margin > 0);
        assert!(c.effective_qty >= 1);
        assert!(c.effective_qty * c.recommended_buy_price <= 10_000_000);
        assert!(c.estimated_profit > 0);
    }
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let engine = fixture_engine();
    let request = FlipRequest::default();
    let first = engine.find_best_flips(&request).await.unwrap();
    let second = engine.find_best_flips(&request).await.unwrap();
    assert_eq!(first, second);
}

#[test]
fn mixed_snapshot_keeps_only_clean_items() {
    let engine = fixture_engine();

    let snapshot = snapshot_of(
        vec![
            // Clean and liquid.
            (
                make_item(1, "Good", Some(2_000)),
                make_quote(1000, 1100, NOW),
                100_000,
            ),
            // Margin attractive but quotes an hour and a half old.
            (
                make_item(2, "Stale", None),
                make_quote(1000, 1200, NOW - 5_400),
                100_000,
            ),
            // Volume 10 is nowhere near the 500 minimum.
            (make_item(3, "Thin", None), make_quote(1000, 1100, NOW), 10),
            // Inverted book.
            (
                make_item(4, "Inverted", None),
                make_quote(1100, 1000, NOW),
                100_000,
            ),
        ],
        NOW,
    );

    let flips = engine.score_snapshot(&snapshot, &FlipRequest::default());
    assert_eq!(flips.len(), 1);
    assert_eq!(flips[0].name, "Good");
}

#[test]
fn big_margins_on_thin_books_are_distrusted() {
    let engine = fixture_engine();

    // 100 → 200 doubles your money on paper, which is exactly why it needs
    // deep volume behind it before the engine will touch it.
    let thin = snapshot_of(
        vec![(make_item(1, "Too thin", None), make_quote(100, 200, NOW), 10_000)],
        NOW,
    );
    assert!(engine.score_snapshot(&thin, &FlipRequest::default()).is_empty());

    let deep = snapshot_of(
        vec![(make_item(1, "Deep enough", None), make_quote(100, 200, NOW), 60_000)],
        NOW,
    );
    let flips = engine.score_snapshot(&deep, &FlipRequest::default());
    assert_eq!(flips.len(), 1);
    // Risk-penalised pricing: aggressiveness 0.2 − 0.08 = 0.12.
    assert_eq!(flips[0].recommended_buy_price, 112);
    assert_eq!(flips[0].recommended_sell_price, 188);
    // A doubled margin still reads as volatile.
    assert_eq!(flips[0].fit, FitLevel::Low);
}

#[test]
fn favorites_are_priced_for_speed() {
    let engine = fixture_engine();
    let rows = || {
        vec![(
            make_item(30, "Lobster", Some(6_000)),
            make_quote(290, 310, NOW),
            150_000,
        )]
    };

    let plain = engine.score_snapshot(&snapshot_of(rows(), NOW), &FlipRequest::default());
    let favored = engine.score_snapshot(
        &snapshot_of(rows(), NOW),
        &FlipRequest {
            favorite_ids: [30].into_iter().collect(),
            ..Default::default()
        },
    );

    // Favorite boost (0.05) concedes 1 gp more per side on a 20 gp spread.
    assert_eq!(plain[0].recommended_buy_price, 294);
    assert_eq!(favored[0].recommended_buy_price, 295);
    assert_eq!(plain[0].recommended_sell_price, 306);
    assert_eq!(favored[0].recommended_sell_price, 305);
}

#[test]
fn auto_distribute_splits_the_bankroll() {
    let engine = fixture_engine();
    let rows = || {
        vec![(
            make_item(1, "Bulk item", None),
            make_quote(1000, 1100, NOW),
            100_000,
        )]
    };

    let full = engine.score_snapshot(&snapshot_of(rows(), NOW), &FlipRequest::default());
    let split = engine.score_snapshot(
        &snapshot_of(rows(), NOW),
        &FlipRequest {
            auto_distribute: true,
            ..Default::default()
        },
    );

    // One slot of six: 10m → 1,666,666 gp to spend on this item.
    assert_eq!(full[0].max_affordable_qty, 9_803);
    assert_eq!(split[0].max_affordable_qty, 1_633);
    assert!(split[0].effective_qty < full[0].effective_qty);
}

#[test]
fn result_limit_is_enforced() {
    let engine = fixture_engine();

    let rows: Vec<(CatalogItem, Quote, u64)> = (1..=40)
        .map(|id| {
            (
                make_item(id, &format!("Item {id}"), Some(100 + id)),
                make_quote(1000, 1100, NOW),
                100_000,
            )
        })
        .collect();
    let snapshot = snapshot_of(rows, NOW);

    let flips = engine.score_snapshot(
        &snapshot,
        &FlipRequest {
            limit: 10,
            ..Default::default()
        },
    );
    assert_eq!(flips.len(), 10);
    // Largest buy limits carry the largest profits here.
    assert_eq!(flips[0].name, "Item 40");
}

#[test]
fn empty_market_is_a_valid_answer() {
    let engine = fixture_engine();
    let snapshot = snapshot_of(Vec::new(), NOW);
    assert!(engine.score_snapshot(&snapshot, &FlipRequest::default()).is_empty());
}
