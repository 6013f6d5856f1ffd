//! Fact summarizers
//!
//! Pure functions the provider layer calls after parsing raw responses. Each
//! one turns loosely shaped provider data into the typed summaries carried by
//! [`InstrumentFacts`](crate::facts::InstrumentFacts). Missing inputs produce
//! `UNKNOWN`/`None` summaries, never errors. Time is always passed in.

pub mod catalysts;
pub mod dilution;
pub mod holders;
pub mod traction;
pub mod unlocks;
pub mod volume;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::config::EnrichmentConfig;
use crate::facts::InstrumentFacts;
use crate::logger::{self, LogTag};

pub use catalysts::{detect as detect_catalysts, FeedItem, Release};
pub use dilution::DilutionMetrics;
pub use holders::{concentration, HolderBalance};
pub use traction::DevActivity;
pub use unlocks::UnlockEvent;
pub use volume::{VolumeStats, VolumeTrend};

// =============================================================================
// RAW PROVIDER DATA
// =============================================================================

/// Unsummarized provider data for one instrument
///
/// Each section that is present replaces the matching summary on the facts;
/// absent sections leave whatever the facts already carry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFacts {
    /// Daily volumes, oldest first
    pub daily_volumes: Option<Vec<f64>>,
    pub holders: Option<Vec<HolderBalance>>,
    pub unlock_events: Option<Vec<UnlockEvent>>,
    pub releases: Option<Vec<Release>>,
    pub feed_items: Option<Vec<FeedItem>>,
    pub tvl_usd: Option<f64>,
    pub dev_activity: Option<DevActivity>,
}

/// Fold raw provider data into the facts' summaries
pub fn enrich(
    facts: &mut InstrumentFacts,
    raw: &RawFacts,
    now: DateTime<Utc>,
    cfg: &EnrichmentConfig,
) {
    if let Some(volumes) = &raw.daily_volumes {
        let baseline = VolumeStats::from_daily(volumes).baseline();
        facts.volume_baseline = baseline.map(|(value, _)| value);
        facts.volume_baseline_window = baseline.map(|(_, window)| window);
    }

    if let Some(holders) = &raw.holders {
        let supply = facts.total_supply.or(facts.max_supply);
        facts.holders = concentration(Some(holders.as_slice()), supply, cfg);
    }

    if let Some(events) = &raw.unlock_events {
        facts.unlocks = unlocks::summarize(
            Some(events.as_slice()),
            facts.market_cap,
            facts.circulating_supply,
            now,
            cfg,
        );
    }

    if raw.releases.is_some() || raw.feed_items.is_some() {
        facts.catalyst = detect_catalysts(
            raw.releases.as_deref().unwrap_or_default(),
            raw.feed_items.as_deref().unwrap_or_default(),
            now,
            cfg,
        );
    }

    if raw.tvl_usd.is_some() || raw.dev_activity.is_some() {
        facts.traction = traction::summarize(raw.tvl_usd, raw.dev_activity.as_ref(), cfg);
    }
}

/// Enrich every instrument that has a raw entry under its stable id
///
/// Raw entries are matched case-insensitively on the external id, else the
/// symbol. Returns how many instruments were enriched.
pub fn enrich_all(
    instruments: &mut [InstrumentFacts],
    raw: &BTreeMap<String, RawFacts>,
    now: DateTime<Utc>,
    cfg: &EnrichmentConfig,
) -> usize {
    if raw.is_empty() {
        return 0;
    }
    let by_id: HashMap<String, &RawFacts> =
        raw.iter().map(|(k, v)| (k.trim().to_lowercase(), v)).collect();

    let mut enriched = 0;
    for facts in instruments.iter_mut() {
        let Some(id) = facts.stable_id().map(str::to_lowercase) else {
            continue;
        };
        if let Some(entry) = by_id.get(&id) {
            enrich(facts, entry, now, cfg);
            enriched += 1;
        }
    }

    let unmatched = by_id.len().saturating_sub(enriched);
    if unmatched > 0 {
        logger::debug(
            LogTag::Pipeline,
            &format!("{} raw entries matched no instrument", unmatched),
        );
    }
    enriched
}

/// Compact USD rendering used in evidence strings ($1.25M, $3.40B)
pub fn format_usd_compact(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("${:.2}B", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("${:.2}K", value / 1_000.0)
    } else {
        format!("${:.2}", value)
    }
}
