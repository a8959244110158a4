//! Core engine — snapshot fetch, per-item scoring, and global ranking.
//!
//! `FlipEngine` fetches one consistent snapshot (catalog, latest quotes,
//! daily volumes) and hands it to a pure scoring pass. All per-item
//! computation is independent; the only cross-item step is the final
//! sort by estimated profit.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::feed::{FeedError, MarketSnapshot, SnapshotSource};
use crate::strategy::{FlipScorer, ScoringPolicy};
use crate::types::{FlipCandidate, FlipRequest};

pub struct FlipEngine {
    source: Arc<dyn SnapshotSource>,
    scorer: FlipScorer,
}

impl FlipEngine {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self::with_policy(source, ScoringPolicy::default())
    }

    pub fn with_policy(source: Arc<dyn SnapshotSource>, policy: ScoringPolicy) -> Self {
        Self {
            source,
            scorer: FlipScorer::new(policy),
        }
    }

    /// The feed this engine scans.
    pub fn source(&self) -> &Arc<dyn SnapshotSource> {
        &self.source
    }

    /// Fetch a fresh snapshot and return the ranked flip candidates.
    ///
    /// The only failure mode is the snapshot fetch itself; per-item data
    /// problems are silent skips. An empty result is a valid answer.
    pub async fn find_best_flips(
        &self,
        request: &FlipRequest,
    ) -> Result<Vec<FlipCandidate>, FeedError> {
        let (catalog, quotes, volumes) = tokio::try_join!(
            self.source.fetch_catalog(),
            self.source.fetch_latest(),
            self.source.fetch_volumes(),
        )?;

        let snapshot = MarketSnapshot {
            catalog,
            quotes,
            volumes,
            taken_at: Utc::now().timestamp(),
        };

        Ok(self.score_snapshot(&snapshot, request))
    }

    /// Score a snapshot against a request.
    ///
    /// Pure and deterministic: identical snapshot + request always produce
    /// the identical ordered list. The wall clock never enters — staleness
    /// is measured against the snapshot's own `taken_at`.
    pub fn score_snapshot(
        &self,
        snapshot: &MarketSnapshot,
        request: &FlipRequest,
    ) -> Vec<FlipCandidate> {
        let params = request.normalized();

        let mut candidates: Vec<FlipCandidate> = snapshot
            .catalog
            .iter()
            .filter_map(|item| {
                self.scorer.evaluate(
                    item,
                    snapshot.quote(item.id),
                    snapshot.volume(item.id),
                    &params,
                    snapshot.taken_at,
                )
            })
            .collect();

        // Stable sort keeps catalog order between equal profits.
        candidates.sort_by(|a, b| b.estimated_profit.cmp(&a.estimated_profit));
        candidates.truncate(params.limit);

        info!(
            scanned = snapshot.catalog.len(),
            returned = candidates.len(),
            budget = params.budget,
            "Scan complete"
        );

        candidates
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
