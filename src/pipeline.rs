/// One evaluation cycle end to end
///
/// Order: snapshot, diff, alerts (with optional suppression), prediction
/// recording, one batched price fetch for matured predictions, resolution,
/// statistics. Only the price fetch touches the network; a failed fetch
/// leaves predictions unresolved and the cycle completes.
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::alerts::{self, Alert, AlertState, AlertsReport, DiscoveryFeed, ProtocolFeed};
use crate::apis::PriceSource;
use crate::backtest::{self, BacktestReport, Prediction};
use crate::config::Config;
use crate::diff::{self, DiffOutcome};
use crate::enrichment;
use crate::errors::{EngineError, StoreError};
use crate::facts::ScanInput;
use crate::gates::HygieneLabel;
use crate::logger::{self, LogTag};
use crate::snapshot::{build_snapshot, Snapshot};
use crate::store::ArtifactStore;

/// Everything a cycle consumes from outside the engine
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    pub scan: ScanInput,
    pub protocols: ProtocolFeed,
    pub discovery: DiscoveryFeed,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub snapshot: Snapshot,
    pub diff: DiffOutcome,
    pub alerts: AlertsReport,
    /// Alerts not shown in a previous invocation; empty unless notifications are on
    pub new_alerts: Vec<Alert>,
    pub alert_state: AlertState,
    pub predictions: Vec<Prediction>,
    pub predictions_added: usize,
    pub predictions_resolved: usize,
    /// `None` when backtesting is disabled
    pub backtest: Option<BacktestReport>,
}

/// Run a full cycle over already-loaded inputs
///
/// `prices` is `None` when running offline; due predictions then stay open.
pub async fn run_cycle(
    inputs: RunInputs,
    previous: Option<&Snapshot>,
    predictions: Vec<Prediction>,
    alert_state: AlertState,
    prices: Option<&dyn PriceSource>,
    cfg: &Config,
    now: DateTime<Utc>,
) -> Result<RunOutput, EngineError> {
    let RunInputs {
        scan,
        protocols,
        discovery,
    } = inputs;
    let generated_at = scan.generated_at.unwrap_or(now);

    let mut instruments = scan.instruments;
    let enriched = enrichment::enrich_all(&mut instruments, &scan.raw, now, &cfg.enrichment);
    if enriched > 0 {
        logger::debug(
            LogTag::Pipeline,
            &format!("Summarized raw provider data for {} instruments", enriched),
        );
    }

    let snapshot = build_snapshot(
        instruments,
        scan.benchmark,
        scan.data_sources,
        cfg,
        generated_at,
    );
    logger::info(
        LogTag::Pipeline,
        &format!(
            "Labeled {} instruments: KEEP={} WATCH-ONLY={} DROP={}",
            snapshot.instruments.len(),
            snapshot.count_by_label(HygieneLabel::Keep),
            snapshot.count_by_label(HygieneLabel::WatchOnly),
            snapshot.count_by_label(HygieneLabel::Drop)
        ),
    );

    let diff = diff::diff(previous, &snapshot, &cfg.diff);
    match diff.report() {
        Some(report) => logger::info(
            LogTag::Pipeline,
            &format!("Diff against {}: {} changes", report.previous_scan_date, report.changes.len()),
        ),
        None => logger::info(LogTag::Pipeline, "First scan, no previous snapshot to diff"),
    }

    let thresholds = cfg.alerts.thresholds();
    let computed = alerts::compute(&snapshot, &protocols, &discovery, &thresholds);
    let (new_alerts, alert_state) = if cfg.alerts.notify_enabled {
        let (fresh, state) = alerts::select_unseen(&computed, alert_state);
        alerts::notify(&fresh, cfg.alerts.notify_max_lines);
        (fresh, state)
    } else {
        (Vec::new(), alert_state)
    };
    let alerts_report = alerts::build_report(generated_at, thresholds, computed);

    let mut output = RunOutput {
        snapshot,
        diff,
        alerts: alerts_report,
        new_alerts,
        alert_state,
        predictions,
        predictions_added: 0,
        predictions_resolved: 0,
        backtest: None,
    };

    if cfg.backtest.enabled {
        run_backtest(&mut output, prices, cfg, now).await?;
    }

    Ok(output)
}

async fn run_backtest(
    output: &mut RunOutput,
    prices: Option<&dyn PriceSource>,
    cfg: &Config,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let existing = std::mem::take(&mut output.predictions);
    let (predictions, added) = backtest::record(&output.snapshot, existing)?;

    let due: Vec<String> = backtest::due_price_keys(&predictions, now)
        .into_iter()
        .collect();
    let price_map = fetch_due_prices(&due, prices).await;

    let (predictions, resolved) =
        backtest::resolve(predictions, |id| price_map.get(id).copied(), now);
    let stats = backtest::compute_stats(&predictions, cfg.backtest.leaderboard_size);

    logger::info(
        LogTag::Backtest,
        &format!(
            "Predictions: added={} due={} resolved={} tracked={}",
            added,
            due.len(),
            resolved,
            predictions.len()
        ),
    );

    output.predictions = predictions;
    output.predictions_added = added;
    output.predictions_resolved = resolved;
    output.backtest = Some(BacktestReport::new(now, stats));
    Ok(())
}

async fn fetch_due_prices(due: &[String], prices: Option<&dyn PriceSource>) -> HashMap<String, f64> {
    if due.is_empty() {
        return HashMap::new();
    }
    let Some(source) = prices else {
        logger::info(
            LogTag::Prices,
            &format!("Offline: {} predictions due, resolution skipped", due.len()),
        );
        return HashMap::new();
    };

    match source.fetch_prices(due).await {
        Ok(map) => {
            logger::debug(
                LogTag::Prices,
                &format!("{} returned {} of {} prices", source.name(), map.len(), due.len()),
            );
            map
        }
        Err(e) => {
            logger::warning(
                LogTag::Prices,
                &format!("Price fetch from {} failed, resolution skipped: {}", source.name(), e),
            );
            HashMap::new()
        }
    }
}

/// Write every artifact of a cycle
pub fn persist_run(store: &ArtifactStore, output: &RunOutput, cfg: &Config) -> Result<(), StoreError> {
    store.save_snapshot(&output.snapshot)?;
    store.save_diff_report(output.diff.report())?;
    store.save_alerts_report(&output.alerts)?;
    if cfg.alerts.notify_enabled {
        store.save_alert_state(&output.alert_state)?;
    }
    if let Some(report) = &output.backtest {
        store.save_predictions(&output.predictions)?;
        store.save_backtest_report(report)?;
    }
    logger::debug(LogTag::Store, "All run artifacts written");
    Ok(())
}

/// Recompute the accuracy report from the predictions store alone
pub fn recompute_backtest_report(
    store: &ArtifactStore,
    cfg: &Config,
    now: DateTime<Utc>,
) -> Result<BacktestReport, StoreError> {
    let predictions = store.load_predictions()?;
    let stats = backtest::compute_stats(&predictions, cfg.backtest.leaderboard_size);
    let report = BacktestReport::new(now, stats);
    store.save_backtest_report(&report)?;
    Ok(report)
}
