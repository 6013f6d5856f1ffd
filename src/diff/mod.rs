//! Run-to-run change detection
//!
//! Instruments are matched by [`InstrumentKey`] (external id, else
//! lowercase symbol). Each matched pair is compared on list membership,
//! label, a fixed set of risk flags, catalyst presence and price. The result
//! is ordered by severity (CRITICAL first), then symbol ignoring case.

pub mod types;

pub use types::{ChangeDetails, ChangeEvent, ChangeType, DiffOutcome, DiffReport, RiskFlag, Severity};

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::DiffConfig;
use crate::facts::{finite, InstrumentKey};
use crate::gates::LabeledInstrument;
use crate::logger::{self, LogTag};
use crate::snapshot::Snapshot;

fn index(snapshot: &Snapshot) -> BTreeMap<InstrumentKey, &LabeledInstrument> {
    snapshot
        .instruments
        .iter()
        .filter_map(|i| i.key().map(|k| (k, i)))
        .collect()
}

/// Signed percentage change; `None` when either side is unusable or zero base
fn pct_change(previous: Option<f64>, current: Option<f64>) -> Option<f64> {
    let previous = finite(previous).filter(|p| *p != 0.0)?;
    let current = finite(current)?;
    Some((current - previous) / previous * 100.0)
}

/// Compare two consecutive snapshots
pub fn diff(previous: Option<&Snapshot>, current: &Snapshot, cfg: &DiffConfig) -> DiffOutcome {
    let Some(previous) = previous else {
        logger::debug(LogTag::Diff, "No previous snapshot, skipping diff");
        return DiffOutcome::NoHistory;
    };

    let prev_map = index(previous);
    let curr_map = index(current);

    let mut changes = Vec::new();
    for (key, prev) in &prev_map {
        match curr_map.get(key) {
            Some(curr) => compare_pair(key, prev, curr, cfg, &mut changes),
            None => changes.push(event(
                key,
                prev,
                Severity::Info,
                ChangeType::RemovedCoin,
                "Coin no longer present in scan".to_string(),
                ChangeDetails::Empty {},
            )),
        }
    }
    for (key, curr) in curr_map.iter().filter(|(k, _)| !prev_map.contains_key(*k)) {
        changes.push(event(
            key,
            curr,
            Severity::Info,
            ChangeType::NewCoin,
            "New coin appeared in scan".to_string(),
            ChangeDetails::Empty {},
        ));
    }

    changes.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| a.symbol.to_lowercase().cmp(&b.symbol.to_lowercase()))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let report = DiffReport {
        previous_scan_date: previous.generated_at,
        current_scan_date: current.generated_at,
        changes,
    };

    logger::debug(
        LogTag::Diff,
        &format!(
            "changes={} critical={} warning={} positive={} info={}",
            report.changes.len(),
            report.count_by_severity(Severity::Critical),
            report.count_by_severity(Severity::Warning),
            report.count_by_severity(Severity::Positive),
            report.count_by_severity(Severity::Info)
        ),
    );

    DiffOutcome::Report(report)
}

fn compare_pair(
    key: &InstrumentKey,
    prev: &LabeledInstrument,
    curr: &LabeledInstrument,
    cfg: &DiffConfig,
    changes: &mut Vec<ChangeEvent>,
) {
    let prev_list = prev.facts.watchlist_source;
    let curr_list = curr.facts.watchlist_source;
    if prev_list != curr_list {
        changes.push(event(
            key,
            curr,
            Severity::Info,
            ChangeType::ListChanged,
            format!("Moved from {} to {}", prev_list, curr_list),
            ChangeDetails::ListMove {
                previous_list: prev_list,
                current_list: curr_list,
            },
        ));
    }

    let prev_label = prev.hygiene_label;
    let curr_label = curr.hygiene_label;
    if prev_label != curr_label {
        let (severity, change_type) = match curr_label.rank().cmp(&prev_label.rank()) {
            Ordering::Less => (Severity::Critical, ChangeType::LabelDowngrade),
            Ordering::Greater => (Severity::Positive, ChangeType::LabelUpgrade),
            Ordering::Equal => (Severity::Warning, ChangeType::LabelChange),
        };
        changes.push(event(
            key,
            curr,
            severity,
            change_type,
            format!("Label changed {} → {}", prev_label, curr_label),
            ChangeDetails::Label {
                previous_label: prev_label,
                current_label: curr_label,
            },
        ));
    }

    for flag in RiskFlag::TRACKED {
        let (was, is) = (flag.read(prev), flag.read(curr));
        if was == is {
            continue;
        }
        let (severity, change_type, verb) = if is {
            (Severity::Warning, ChangeType::FlagTriggered, "New")
        } else {
            (Severity::Positive, ChangeType::FlagCleared, "Cleared")
        };
        changes.push(event(
            key,
            curr,
            severity,
            change_type,
            format!("{} flag: {}", verb, flag.as_str()),
            ChangeDetails::Flag {
                flag,
                previous: was,
                current: is,
            },
        ));
    }

    // Catalyst transitions are informational, never a risk
    match (prev.facts.has_catalyst(), curr.facts.has_catalyst()) {
        (false, true) => changes.push(event(
            key,
            curr,
            Severity::Info,
            ChangeType::CatalystDetected,
            "Clean catalyst detected".to_string(),
            ChangeDetails::Empty {},
        )),
        (true, false) => changes.push(event(
            key,
            curr,
            Severity::Info,
            ChangeType::CatalystCleared,
            "Catalyst no longer detected".to_string(),
            ChangeDetails::Empty {},
        )),
        _ => {}
    }

    if let Some(pct) = pct_change(prev.facts.price, curr.facts.price) {
        if pct.abs() >= cfg.price_move_pct {
            if let (Some(previous_price), Some(current_price)) = (prev.facts.price, curr.facts.price) {
                changes.push(event(
                    key,
                    curr,
                    Severity::Info,
                    ChangeType::PriceMove,
                    format!("Price moved {:+.1}% since last scan", pct),
                    ChangeDetails::PriceMove {
                        previous_price,
                        current_price,
                        pct,
                    },
                ));
            }
        }
    }
}

fn event(
    key: &InstrumentKey,
    instrument: &LabeledInstrument,
    severity: Severity,
    change_type: ChangeType,
    description: String,
    details: ChangeDetails,
) -> ChangeEvent {
    ChangeEvent {
        key: key.clone(),
        symbol: instrument.symbol().to_string(),
        name: instrument.facts.name.clone(),
        watchlist_source: instrument.facts.watchlist_source,
        severity,
        change_type,
        description,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::HygieneLabel;
    use crate::test_support::{labeled, snapshot_of, ts};

    fn cfg() -> DiffConfig {
        DiffConfig::default()
    }

    fn report(outcome: DiffOutcome) -> DiffReport {
        match outcome {
            DiffOutcome::Report(report) => report,
            DiffOutcome::NoHistory => panic!("expected a report"),
        }
    }

    #[test]
    fn test_first_run_has_no_history() {
        let current = snapshot_of("2026-04-02T00:00:00Z", vec![labeled("AAA", HygieneLabel::Keep)]);
        let outcome = diff(None, &current, &cfg());
        assert_eq!(outcome, DiffOutcome::NoHistory);
        assert!(outcome.report().is_none());
    }

    #[test]
    fn test_diff_against_itself_is_empty() {
        let mut chaser = labeled("BBB", HygieneLabel::WatchOnly);
        chaser.flags.chasing = true;
        let snapshot = snapshot_of(
            "2026-04-02T00:00:00Z",
            vec![labeled("AAA", HygieneLabel::Keep), chaser, labeled("CCC", HygieneLabel::Drop)],
        );
        let report = report(diff(Some(&snapshot), &snapshot, &cfg()));
        assert!(report.changes.is_empty());
    }

    #[test]
    fn test_keep_to_watch_only_is_one_critical_event() {
        let previous = snapshot_of("2026-04-01T00:00:00Z", vec![labeled("XXX", HygieneLabel::Keep)]);
        let current = snapshot_of("2026-04-02T00:00:00Z", vec![labeled("XXX", HygieneLabel::WatchOnly)]);

        let report = report(diff(Some(&previous), &current, &cfg()));
        assert_eq!(report.changes.len(), 1);
        let change = &report.changes[0];
        assert_eq!(change.change_type, ChangeType::LabelDowngrade);
        assert_eq!(change.severity, Severity::Critical);
        assert_eq!(change.description, "Label changed KEEP → WATCH-ONLY");
        assert_eq!(report.previous_scan_date, ts("2026-04-01T00:00:00Z"));
    }

    #[test]
    fn test_new_removed_and_ordering() {
        let mut stays_prev = labeled("MID", HygieneLabel::WatchOnly);
        stays_prev.flags.chasing = true;
        stays_prev.facts.unlocks.unlock_risk_flag = false;
        let mut stays_curr = labeled("MID", HygieneLabel::Keep);
        stays_curr.flags.chasing = false;
        stays_curr.facts.unlocks.unlock_risk_flag = true;

        let previous = snapshot_of(
            "2026-04-01T00:00:00Z",
            vec![labeled("OLD", HygieneLabel::Keep), stays_prev],
        );
        let current = snapshot_of(
            "2026-04-02T00:00:00Z",
            vec![stays_curr, labeled("FRESH", HygieneLabel::Drop)],
        );

        let report = report(diff(Some(&previous), &current, &cfg()));
        let kinds: Vec<(Severity, ChangeType, &str)> = report
            .changes
            .iter()
            .map(|c| (c.severity, c.change_type, c.symbol.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (Severity::Warning, ChangeType::FlagTriggered, "MID"),
                (Severity::Positive, ChangeType::LabelUpgrade, "MID"),
                (Severity::Positive, ChangeType::FlagCleared, "MID"),
                (Severity::Info, ChangeType::NewCoin, "FRESH"),
                (Severity::Info, ChangeType::RemovedCoin, "OLD"),
            ]
        );
        assert_eq!(
            report.changes[0].details,
            ChangeDetails::Flag {
                flag: RiskFlag::UnlockRisk,
                previous: false,
                current: true
            }
        );
    }

    #[test]
    fn test_catalyst_transitions_are_info() {
        let mut prev = labeled("AAA", HygieneLabel::Keep);
        prev.facts.catalyst.has_clean_catalyst = false;
        let curr = labeled("AAA", HygieneLabel::Keep);

        let previous = snapshot_of("2026-04-01T00:00:00Z", vec![prev]);
        let current = snapshot_of("2026-04-02T00:00:00Z", vec![curr]);
        let report = report(diff(Some(&previous), &current, &cfg()));
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].change_type, ChangeType::CatalystDetected);
        assert_eq!(report.changes[0].severity, Severity::Info);

        let back = report_of(&current, &previous);
        assert_eq!(back.changes[0].change_type, ChangeType::CatalystCleared);
    }

    fn report_of(previous: &Snapshot, current: &Snapshot) -> DiffReport {
        report(diff(Some(previous), current, &cfg()))
    }

    #[test]
    fn test_price_move_threshold_and_sign() {
        let mut prev = labeled("AAA", HygieneLabel::Keep);
        prev.facts.price = Some(100.0);
        let mut small = prev.clone();
        small.facts.price = Some(109.0);
        let mut drop = prev.clone();
        drop.facts.price = Some(85.0);

        let previous = snapshot_of("2026-04-01T00:00:00Z", vec![prev]);
        let quiet = report_of(&previous, &snapshot_of("2026-04-02T00:00:00Z", vec![small]));
        assert!(quiet.changes.is_empty());

        let moved = report_of(&previous, &snapshot_of("2026-04-02T00:00:00Z", vec![drop]));
        assert_eq!(moved.changes.len(), 1);
        assert_eq!(moved.changes[0].change_type, ChangeType::PriceMove);
        assert_eq!(moved.changes[0].description, "Price moved -15.0% since last scan");
        match &moved.changes[0].details {
            ChangeDetails::PriceMove { pct, .. } => assert!((pct + 15.0).abs() < 1e-9),
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_symbol_ties_ignore_case() {
        let previous = snapshot_of("2026-04-01T00:00:00Z", vec![labeled("OLD", HygieneLabel::Keep)]);
        let current = snapshot_of(
            "2026-04-02T00:00:00Z",
            vec![
                labeled("zed", HygieneLabel::Keep),
                labeled("Abd", HygieneLabel::Keep),
                labeled("aBC", HygieneLabel::Keep),
            ],
        );
        let report = report(diff(Some(&previous), &current, &cfg()));
        let symbols: Vec<&str> = report.changes.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["aBC", "Abd", "OLD", "zed"]);
    }

    #[test]
    fn test_zero_previous_price_is_ignored() {
        let mut prev = labeled("AAA", HygieneLabel::Keep);
        prev.facts.price = Some(0.0);
        let curr = labeled("AAA", HygieneLabel::Keep);
        let report = report_of(
            &snapshot_of("2026-04-01T00:00:00Z", vec![prev]),
            &snapshot_of("2026-04-02T00:00:00Z", vec![curr]),
        );
        assert!(report.changes.is_empty());
    }

    #[test]
    fn test_list_change() {
        let prev = labeled("AAA", HygieneLabel::Keep);
        let mut curr = prev.clone();
        curr.facts.watchlist_source = crate::facts::ListSource::Staging;
        let report = report_of(
            &snapshot_of("2026-04-01T00:00:00Z", vec![prev]),
            &snapshot_of("2026-04-02T00:00:00Z", vec![curr]),
        );
        assert_eq!(report.changes[0].change_type, ChangeType::ListChanged);
        assert_eq!(report.changes[0].description, "Moved from main to staging");
    }
}
