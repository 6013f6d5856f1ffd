/// Presentation ranking
///
/// The sort key is the ordered list in [`RANKING_CRITERIA`]; each criterion
/// only breaks ties left by the ones before it. Remaining ties keep input
/// order (stable sort), so the result is deterministic for a given snapshot.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::config::RankingConfig;
use crate::facts::{finite, ListSource};
use crate::gates::{HygieneLabel, LabeledInstrument};
use crate::logger::{self, LogTag};

// =============================================================================
// CRITERIA
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankCriterion {
    /// Instruments with a clean catalyst first
    CleanCatalyst,
    /// Outperforming the benchmark over 7 days first
    OutperformingBenchmark,
    /// Chasing instruments sink
    NotChasing,
    /// High dilution risk sinks
    NotHighDilution,
    /// 7d relative strength, descending, missing last
    RelativeStrength7d,
    /// 24h volume, descending, missing as zero
    Volume24h,
}

pub const RANKING_CRITERIA: [RankCriterion; 6] = [
    RankCriterion::CleanCatalyst,
    RankCriterion::OutperformingBenchmark,
    RankCriterion::NotChasing,
    RankCriterion::NotHighDilution,
    RankCriterion::RelativeStrength7d,
    RankCriterion::Volume24h,
];

impl RankCriterion {
    /// `Less` means `a` ranks ahead of `b`
    pub fn compare(&self, a: &LabeledInstrument, b: &LabeledInstrument) -> Ordering {
        match self {
            RankCriterion::CleanCatalyst => b.facts.has_catalyst().cmp(&a.facts.has_catalyst()),
            RankCriterion::OutperformingBenchmark => b
                .flags
                .outperforming_benchmark
                .cmp(&a.flags.outperforming_benchmark),
            RankCriterion::NotChasing => a.flags.chasing.cmp(&b.flags.chasing),
            RankCriterion::NotHighDilution => a
                .flags
                .high_dilution_risk
                .cmp(&b.flags.high_dilution_risk),
            RankCriterion::RelativeStrength7d => {
                let rs = |i: &LabeledInstrument| {
                    finite(i.metrics.relative_strength_7d).unwrap_or(f64::NEG_INFINITY)
                };
                rs(b).total_cmp(&rs(a))
            }
            RankCriterion::Volume24h => {
                let vol = |i: &LabeledInstrument| finite(i.facts.volume_24h).unwrap_or(0.0);
                vol(b).total_cmp(&vol(a))
            }
        }
    }
}

/// Lexicographic comparison over all criteria
pub fn compare_instruments(a: &LabeledInstrument, b: &LabeledInstrument) -> Ordering {
    RANKING_CRITERIA
        .iter()
        .map(|criterion| criterion.compare(a, b))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Largest of the 7d and 24h changes, missing as zero
fn run_up(instrument: &LabeledInstrument) -> f64 {
    let change_7d = finite(instrument.facts.price_change_7d).unwrap_or(0.0);
    let change_24h = finite(instrument.facts.price_change_24h).unwrap_or(0.0);
    change_7d.max(change_24h)
}

// =============================================================================
// RANKING
// =============================================================================

#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    /// Non-DROP instruments in rank order
    pub ordered: Vec<&'a LabeledInstrument>,
    pub top_watch: Vec<&'a LabeledInstrument>,
    /// Chasing instruments from the full set, largest run-up first
    pub top_avoid: Vec<&'a LabeledInstrument>,
}

pub fn rank<'a>(instruments: &'a [LabeledInstrument], cfg: &RankingConfig) -> Ranking<'a> {
    let mut ordered: Vec<&LabeledInstrument> = instruments
        .iter()
        .filter(|i| i.hygiene_label != HygieneLabel::Drop)
        .collect();
    ordered.sort_by(|a, b| compare_instruments(a, b));

    let top_watch = ordered.iter().take(cfg.top_watch_count).copied().collect();

    let mut avoid: Vec<&LabeledInstrument> = instruments.iter().filter(|i| i.flags.chasing).collect();
    avoid.sort_by(|a, b| run_up(b).total_cmp(&run_up(a)));
    avoid.truncate(cfg.top_avoid_count);

    logger::debug(
        LogTag::Ranking,
        &format!(
            "ranked={} excluded_drop={} avoid_candidates={}",
            ordered.len(),
            instruments.len() - ordered.len(),
            avoid.len()
        ),
    );

    Ranking {
        ordered,
        top_watch,
        top_avoid: avoid,
    }
}

// =============================================================================
// REPORT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub symbol: String,
    pub watchlist_source: ListSource,
    pub hygiene_label: HygieneLabel,
    pub chasing: bool,
    pub high_dilution_risk: bool,
    pub volume_24h: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub symbol: String,
    pub watchlist_source: ListSource,
    pub hygiene_label: HygieneLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidEntry {
    pub symbol: String,
    pub watchlist_source: ListSource,
    pub reason: String,
}

/// Persisted form of a [`Ranking`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RankingReport {
    pub ordered: Vec<RankedEntry>,
    pub top_watch: Vec<WatchEntry>,
    pub top_avoid: Vec<AvoidEntry>,
}

impl Ranking<'_> {
    pub fn to_report(&self) -> RankingReport {
        RankingReport {
            ordered: self
                .ordered
                .iter()
                .enumerate()
                .map(|(idx, i)| RankedEntry {
                    rank: idx + 1,
                    symbol: i.symbol().to_string(),
                    watchlist_source: i.facts.watchlist_source,
                    hygiene_label: i.hygiene_label,
                    chasing: i.flags.chasing,
                    high_dilution_risk: i.flags.high_dilution_risk,
                    volume_24h: i.facts.volume_24h,
                })
                .collect(),
            top_watch: self
                .top_watch
                .iter()
                .map(|i| WatchEntry {
                    symbol: i.symbol().to_string(),
                    watchlist_source: i.facts.watchlist_source,
                    hygiene_label: i.hygiene_label,
                })
                .collect(),
            top_avoid: self
                .top_avoid
                .iter()
                .map(|i| AvoidEntry {
                    symbol: i.symbol().to_string(),
                    watchlist_source: i.facts.watchlist_source,
                    reason: "chasing=true".to_string(),
                })
                .collect(),
        }
    }
}
