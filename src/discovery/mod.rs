//! Discovery of watchlist candidates and the queue that tracks them
//!
//! A discovery run scores trending and listing coins against quality gates
//! and upserts the best into the discovery queue. Queue entries are then
//! staged, promoted or ignored by hand through [`promote::apply`]; the alert
//! engine reads the same queue as its discovery feed.

pub mod promote;
pub mod queue;
pub mod scoring;
pub mod types;

pub use promote::{apply, ActionOutcome, ListState, QueueAction};
pub use queue::{select_candidates, sync_queue};
pub use scoring::{discovery_score, is_likely_stablecoin, meets_quality_gates};
pub use types::{DiscoveryInput, MarketCoin, ScoredCandidate, TrendingCoin, TrendingRank, WatchlistEntry};

use chrono::{DateTime, Utc};

use crate::config::DiscoveryConfig;
use crate::logger::{self, LogTag};

/// Select this run's candidates and fold them into the queue
///
/// Coins already on the main watchlist, and queue entries already PROMOTED
/// or IGNORED, are never suggested again.
pub fn run(
    input: &DiscoveryInput,
    state: &mut ListState,
    cfg: &DiscoveryConfig,
    now: DateTime<Utc>,
) -> Vec<ScoredCandidate> {
    let watchlist = queue::watchlist_ids(&state.watchlist);
    let staging = queue::watchlist_ids(&state.staging);
    let mut excluded = queue::settled_ids(&state.queue);
    excluded.extend(watchlist.iter().cloned());

    let candidates = select_candidates(input, &excluded, cfg);
    sync_queue(&mut state.queue, &candidates, &watchlist, &staging, cfg, now);

    logger::info(
        LogTag::Discovery,
        &format!(
            "Discovery: {} trending, {} listed, {} candidates, queue size {}",
            input.trending.len(),
            input.markets.len(),
            candidates.len(),
            state.queue.candidates.len()
        ),
    );
    for candidate in &candidates {
        logger::debug(
            LogTag::Discovery,
            &format!(
                "{} score={:.1} source={:?}",
                candidate.coin_id().unwrap_or_default(),
                candidate.discovery_score,
                candidate.source
            ),
        );
    }
    candidates
}
