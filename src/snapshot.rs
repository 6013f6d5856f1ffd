/// Labeled snapshot: the complete output of one evaluation run
///
/// Built once per run from the provider facts and persisted verbatim. Past
/// snapshots are only ever read back (for diffing), never modified.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::Config;
use crate::errors::EngineError;
use crate::facts::{BenchmarkChanges, DataSources, InstrumentFacts};
use crate::gates::{label_instrument, HygieneLabel, LabeledInstrument};
use crate::logger::{self, LogTag};
use crate::ranking::{rank, RankingReport};

pub const WARN_MISSING_UNLOCKS: &str = "Some coins missing unlock data; actionability may be blocked.";
pub const WARN_MISSING_CATALYSTS: &str = "Some coins missing catalyst data.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub data_sources: DataSources,
    #[serde(default)]
    pub benchmark: BenchmarkChanges,
    pub warnings: Vec<String>,
    pub actionable_today: bool,
    pub instruments: Vec<LabeledInstrument>,
    pub ranking: RankingReport,
}

impl Snapshot {
    pub fn count_by_label(&self, label: HygieneLabel) -> usize {
        self.instruments
            .iter()
            .filter(|i| i.hygiene_label == label)
            .count()
    }
}

/// Label every instrument and assemble the run snapshot
///
/// Instruments without identity, or repeating a key already seen in this
/// run, are skipped with a warning; the rest of the run continues.
pub fn build_snapshot(
    facts: Vec<InstrumentFacts>,
    benchmark: BenchmarkChanges,
    data_sources: DataSources,
    cfg: &Config,
    generated_at: DateTime<Utc>,
) -> Snapshot {
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();
    let mut instruments = Vec::with_capacity(facts.len());

    for item in facts {
        let Some(key) = item.key() else {
            let err = EngineError::MissingIdentity {
                name: item.name.clone(),
            };
            logger::warning(LogTag::Gates, &format!("Skipping instrument: {}", err));
            warnings.push(err.to_string());
            continue;
        };
        if !seen.insert(key.clone()) {
            let err = EngineError::DuplicateInstrument(key.to_string());
            logger::warning(LogTag::Gates, &format!("Skipping instrument: {}", err));
            warnings.push(err.to_string());
            continue;
        }

        let row = label_instrument(item, &benchmark, &cfg.gates);
        logger::verbose(
            LogTag::Gates,
            &format!(
                "{} label={} failed={:?}",
                row.symbol(),
                row.hygiene_label,
                row.gates_failed.iter().map(|g| g.as_str()).collect::<Vec<_>>()
            ),
        );
        instruments.push(row);
    }

    if data_sources.unlocks.is_none() {
        warnings.push(WARN_MISSING_UNLOCKS.to_string());
    }
    if data_sources.catalysts.is_none() {
        warnings.push(WARN_MISSING_CATALYSTS.to_string());
    }

    let ranking = rank(&instruments, &cfg.ranking).to_report();
    let actionable_today = instruments
        .iter()
        .any(|i| i.hygiene_label == HygieneLabel::Keep);

    let snapshot = Snapshot {
        generated_at,
        data_sources,
        benchmark,
        warnings,
        actionable_today,
        instruments,
        ranking,
    };

    logger::debug(
        LogTag::Gates,
        &format!(
            "instruments={} keep={} watch_only={} drop={}",
            snapshot.instruments.len(),
            snapshot.count_by_label(HygieneLabel::Keep),
            snapshot.count_by_label(HygieneLabel::WatchOnly),
            snapshot.count_by_label(HygieneLabel::Drop)
        ),
    );

    snapshot
}
