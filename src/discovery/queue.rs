/// Candidate selection and queue upkeep for one discovery run
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::scoring::{discovery_score, is_likely_stablecoin, meets_quality_gates};
use super::types::{DiscoveryInput, MarketCoin, ScoredCandidate, TrendingRank, WatchlistEntry};
use crate::alerts::{DiscoveryCandidate, DiscoveryFeed, DiscoverySource, DiscoveryStatus};
use crate::config::DiscoveryConfig;
use crate::facts::{finite, normalize_coin_id};

pub const QUEUE_SCHEMA_VERSION: u32 = 1;

/// Normalized ids of a watchlist
pub fn watchlist_ids(entries: &[WatchlistEntry]) -> BTreeSet<String> {
    entries.iter().filter_map(WatchlistEntry::coin_id).collect()
}

/// Queue ids already decided (PROMOTED or IGNORED)
pub fn settled_ids(queue: &DiscoveryFeed) -> BTreeSet<String> {
    queue
        .candidates
        .iter()
        .filter(|c| c.status.is_some_and(|s| s.is_settled()))
        .filter_map(DiscoveryCandidate::coin_id)
        .collect()
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Pick, score and rank this run's candidates
///
/// Trending coins must pass the quality gates; the listing is gated first
/// and capped at `criteria_limit` matches. Stablecoins and ids in `excluded`
/// never qualify. The best `candidate_limit` are returned, best first.
pub fn select_candidates(
    input: &DiscoveryInput,
    excluded: &BTreeSet<String>,
    cfg: &DiscoveryConfig,
) -> Vec<ScoredCandidate> {
    let trending_markets: HashMap<String, &MarketCoin> = input
        .trending_markets
        .iter()
        .chain(input.markets.iter())
        .filter_map(|m| normalize_coin_id(m.id.as_deref()).map(|id| (id, m)))
        .rev()
        .collect();

    // id -> candidate, in first-seen order
    let mut order: Vec<String> = Vec::new();
    let mut selected: BTreeMap<String, ScoredCandidate> = BTreeMap::new();

    let total = input.trending.len();
    for (idx, trending) in input.trending.iter().enumerate() {
        let Some(id) = normalize_coin_id(trending.id.as_deref()) else {
            continue;
        };
        if excluded.contains(&id) || selected.contains_key(&id) {
            continue;
        }
        let Some(market) = trending_markets.get(&id) else {
            continue;
        };
        if is_likely_stablecoin(market) || !meets_quality_gates(market, cfg) {
            continue;
        }
        let mut coin = (*market).clone();
        coin.market_cap_rank = coin.market_cap_rank.or(trending.market_cap_rank);
        order.push(id.clone());
        selected.insert(
            id,
            ScoredCandidate {
                coin,
                source: DiscoverySource::Trending,
                trending: Some(TrendingRank { rank: idx + 1, total }),
                discovery_score: 0.0,
                volume_to_mcap: None,
            },
        );
    }

    let criteria = input
        .markets
        .iter()
        .filter(|m| meets_quality_gates(m, cfg))
        .take(cfg.criteria_limit);
    for market in criteria {
        let Some(id) = normalize_coin_id(market.id.as_deref()) else {
            continue;
        };
        if excluded.contains(&id) || is_likely_stablecoin(market) {
            continue;
        }
        match selected.get_mut(&id) {
            Some(existing) => existing.source = DiscoverySource::Both,
            None => {
                order.push(id.clone());
                selected.insert(
                    id,
                    ScoredCandidate {
                        coin: market.clone(),
                        source: DiscoverySource::Criteria,
                        trending: None,
                        discovery_score: 0.0,
                        volume_to_mcap: None,
                    },
                );
            }
        }
    }

    let mut scored: Vec<ScoredCandidate> = order
        .into_iter()
        .filter_map(|id| selected.remove(&id))
        .map(|mut candidate| {
            candidate.discovery_score = discovery_score(&candidate.coin, cfg, candidate.trending);
            candidate.volume_to_mcap = finite(candidate.coin.market_cap)
                .zip(finite(candidate.coin.total_volume))
                .filter(|(mcap, _)| *mcap > 0.0)
                .map(|(mcap, volume)| volume / mcap);
            candidate
        })
        .collect();

    // stable, so equal scores keep first-seen order
    scored.sort_by(|a, b| by_score_desc(a.discovery_score, b.discovery_score));
    scored.truncate(cfg.candidate_limit);
    scored
}

/// Bring queue statuses in line with the watchlists, then upsert this run's
/// candidates
///
/// Entries on the main watchlist become PROMOTED and staged entries STAGED.
/// Existing entries keep their status and notes. The queue ends up ordered
/// by score, best first.
pub fn sync_queue(
    queue: &mut DiscoveryFeed,
    candidates: &[ScoredCandidate],
    watchlist: &BTreeSet<String>,
    staging: &BTreeSet<String>,
    criteria: &DiscoveryConfig,
    now: DateTime<Utc>,
) {
    dedupe(queue);

    for entry in queue.candidates.iter_mut() {
        let Some(id) = entry.coin_id() else {
            continue;
        };
        if watchlist.contains(&id) {
            entry.status = Some(DiscoveryStatus::Promoted);
        } else if staging.contains(&id) {
            entry.status = Some(DiscoveryStatus::Staged);
        }
        normalize_entry(entry);
    }

    for candidate in candidates {
        let Some(id) = candidate.coin_id() else {
            continue;
        };
        let staged = staging.contains(&id);
        match queue.get_mut(&id) {
            Some(existing) => {
                apply_candidate(existing, candidate, now);
                existing.first_seen_at.get_or_insert(now);
                let status = existing.status.get_or_insert(if staged {
                    DiscoveryStatus::Staged
                } else {
                    DiscoveryStatus::New
                });
                if *status == DiscoveryStatus::New && staged {
                    *status = DiscoveryStatus::Staged;
                }
            }
            None => {
                let mut entry = DiscoveryCandidate {
                    coin_gecko_id: candidate.coin.id.clone(),
                    status: Some(if staged {
                        DiscoveryStatus::Staged
                    } else {
                        DiscoveryStatus::New
                    }),
                    notes: Some(String::new()),
                    first_seen_at: Some(now),
                    ..Default::default()
                };
                apply_candidate(&mut entry, candidate, now);
                queue.candidates.push(entry);
            }
        }
    }

    queue
        .candidates
        .sort_by(|a, b| by_score_desc(a.discovery_score.unwrap_or(0.0), b.discovery_score.unwrap_or(0.0)));
    queue.schema_version = Some(QUEUE_SCHEMA_VERSION);
    queue.generated_at = Some(now);
    queue.criteria = serde_json::to_value(criteria).ok();
}

/// One entry per id; a later duplicate replaces the earlier entry in place
pub fn dedupe(queue: &mut DiscoveryFeed) {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<DiscoveryCandidate> = Vec::with_capacity(queue.candidates.len());
    for entry in queue.candidates.drain(..) {
        let Some(id) = entry.coin_id() else {
            continue;
        };
        match positions.get(&id) {
            Some(&idx) => kept[idx] = entry,
            None => {
                positions.insert(id, kept.len());
                kept.push(entry);
            }
        }
    }
    queue.candidates = kept;
}

/// Fill `coinGeckoId` from a legacy `id` and default empty notes
pub fn normalize_entry(entry: &mut DiscoveryCandidate) {
    if entry.coin_gecko_id.as_deref().map_or(true, |id| id.trim().is_empty()) && entry.id.is_some() {
        entry.coin_gecko_id = entry.id.clone();
    }
    entry.notes.get_or_insert_with(String::new);
}

fn apply_candidate(entry: &mut DiscoveryCandidate, candidate: &ScoredCandidate, now: DateTime<Utc>) {
    entry.symbol = candidate.coin.symbol.clone();
    entry.name = candidate.coin.name.clone();
    entry.discovery_score = Some(candidate.discovery_score);
    entry.market_cap = finite(candidate.coin.market_cap);
    entry.volume_24h = finite(candidate.coin.total_volume);
    entry.volume_to_mcap = candidate.volume_to_mcap;
    entry.price_change_7d = finite(candidate.coin.price_change_percentage_7d_in_currency);
    entry.market_cap_rank = candidate.coin.market_cap_rank;
    entry.source = Some(candidate.source);
    entry.last_seen_at = Some(now);
}
