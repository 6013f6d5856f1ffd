use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};

use super::types::{Prediction, PredictionFlags};
use crate::errors::EngineError;
use crate::facts::{finite, normalize_coin_id, InstrumentFacts};
use crate::logger::{self, LogTag};
use crate::snapshot::Snapshot;

/// `<run stamp>_<external id, else symbol>`, with a filename-safe stamp
pub fn prediction_id(generated_at: DateTime<Utc>, facts: &InstrumentFacts) -> String {
    let stamp = generated_at.format("%Y-%m-%dT%H-%M-%SZ");
    let id = normalize_coin_id(facts.coin_id.as_deref())
        .or_else(|| facts.symbol.clone())
        .unwrap_or_else(|| "unknown".to_string());
    format!("{}_{}", stamp, id)
}

/// Append one prediction per priced instrument not yet recorded for this run
///
/// Re-recording the same snapshot adds nothing. A store that already holds
/// the same id twice is corrupt and rejected.
pub fn record(
    snapshot: &Snapshot,
    mut predictions: Vec<Prediction>,
) -> Result<(Vec<Prediction>, usize), EngineError> {
    let mut existing: HashSet<String> = HashSet::with_capacity(predictions.len());
    for prediction in &predictions {
        if !existing.insert(prediction.prediction_id.clone()) {
            return Err(EngineError::DuplicatePredictionId(
                prediction.prediction_id.clone(),
            ));
        }
    }

    let mut added = 0;
    for row in &snapshot.instruments {
        let Some(price) = finite(row.facts.price) else {
            continue;
        };
        let id = prediction_id(snapshot.generated_at, &row.facts);
        if !existing.insert(id.clone()) {
            continue;
        }

        predictions.push(Prediction {
            prediction_id: id,
            symbol: row.facts.symbol.clone(),
            name: row.facts.name.clone(),
            coin_id: row.facts.coin_id.clone(),
            watchlist_source: row.facts.watchlist_source,
            scan_date: snapshot.generated_at,
            price_at_scan: price,
            market_cap_at_scan: finite(row.facts.market_cap),
            volume_24h_at_scan: finite(row.facts.volume_24h),
            hygiene_label: row.hygiene_label,
            flags: PredictionFlags::capture(row),
            outcomes: Default::default(),
        });
        added += 1;
    }

    logger::debug(
        LogTag::Backtest,
        &format!("recorded={} total={}", added, predictions.len()),
    );
    Ok((predictions, added))
}

/// Key a prediction is priced under, shared by [`due_price_keys`] and [`resolve`]
fn price_key(prediction: &Prediction) -> Option<String> {
    normalize_coin_id(prediction.coin_id.as_deref())
}

/// External ids that need a fresh price to resolve at least one horizon
pub fn due_price_keys(predictions: &[Prediction], now: DateTime<Utc>) -> BTreeSet<String> {
    predictions
        .iter()
        .filter(|p| !p.due_horizons(now).is_empty())
        .filter_map(price_key)
        .collect()
}

/// Fill every due horizon for which the lookup has a price
///
/// Returns the predictions and how many of them gained at least one outcome.
/// Resolved horizons are never touched again.
pub fn resolve<F>(
    mut predictions: Vec<Prediction>,
    price_lookup: F,
    now: DateTime<Utc>,
) -> (Vec<Prediction>, usize)
where
    F: Fn(&str) -> Option<f64>,
{
    let mut resolved = 0;

    for prediction in predictions.iter_mut() {
        let due = prediction.due_horizons(now);
        if due.is_empty() || prediction.price_at_scan == 0.0 || !prediction.price_at_scan.is_finite() {
            continue;
        }
        let Some(current) = price_key(prediction)
            .and_then(|key| price_lookup(&key))
            .filter(|p| p.is_finite())
        else {
            continue;
        };

        let return_pct = (current - prediction.price_at_scan) / prediction.price_at_scan * 100.0;
        for horizon in due {
            prediction.outcomes.set(horizon, current, return_pct);
        }
        prediction.outcomes.outcome_updated_at = Some(now);
        resolved += 1;
    }

    logger::debug(
        LogTag::Backtest,
        &format!("resolved={} of {}", resolved, predictions.len()),
    );
    (predictions, resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::types::Horizon;
    use crate::gates::HygieneLabel;
    use crate::test_support::{labeled, snapshot_of, ts};
    use chrono::Duration;

    fn snapshot() -> Snapshot {
        let mut unpriced = labeled("NOPRICE", HygieneLabel::Drop);
        unpriced.facts.price = None;
        let mut by_symbol = labeled("SYM", HygieneLabel::WatchOnly);
        by_symbol.facts.coin_id = None;
        snapshot_of(
            "2026-04-01T08:30:00Z",
            vec![labeled("AAA", HygieneLabel::Keep), unpriced, by_symbol],
        )
    }

    #[test]
    fn test_record_is_idempotent() {
        let snapshot = snapshot();
        let (first, added) = record(&snapshot, Vec::new()).unwrap();
        assert_eq!(added, 2);
        assert_eq!(first[0].prediction_id, "2026-04-01T08-30-00Z_aaa");
        assert_eq!(first[1].prediction_id, "2026-04-01T08-30-00Z_SYM");
        assert_eq!(first[0].outcomes, Default::default());
        assert!(first[0].flags.has_clean_catalyst);

        let (second, added) = record(&snapshot, first.clone()).unwrap();
        assert_eq!(added, 0);
        assert_eq!(second, first);
    }

    #[test]
    fn test_record_rejects_corrupt_store() {
        let (mut predictions, _) = record(&snapshot(), Vec::new()).unwrap();
        predictions.push(predictions[0].clone());
        let err = record(&snapshot(), predictions).unwrap_err();
        assert_eq!(
            err,
            EngineError::DuplicatePredictionId("2026-04-01T08-30-00Z_aaa".to_string())
        );
    }

    #[test]
    fn test_resolution_follows_age() {
        let (predictions, _) = record(&snapshot(), Vec::new()).unwrap();
        let scan = ts("2026-04-01T08:30:00Z");

        let early = scan + Duration::days(6);
        assert!(due_price_keys(&predictions, early).is_empty());
        let (predictions, resolved) = resolve(predictions, |_| Some(12.0), early);
        assert_eq!(resolved, 0);

        let week = scan + Duration::days(8);
        let keys = due_price_keys(&predictions, week);
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["aaa".to_string()]);

        let (predictions, resolved) = resolve(predictions, |_| Some(12.0), week);
        assert_eq!(resolved, 1);
        let outcomes = &predictions[0].outcomes;
        assert_eq!(outcomes.price_7d, Some(12.0));
        assert!((outcomes.return_7d_pct.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(outcomes.price_14d, None);
        assert_eq!(outcomes.outcome_updated_at, Some(week));
        // keyed by external id, so the symbol-only prediction never resolves
        assert!(!predictions[1].outcomes.is_resolved(Horizon::Days7));
    }

    #[test]
    fn test_resolved_horizon_is_write_once() {
        let (predictions, _) = record(&snapshot(), Vec::new()).unwrap();
        let scan = ts("2026-04-01T08:30:00Z");

        let (predictions, _) = resolve(predictions, |_| Some(15.0), scan + Duration::days(15));
        assert!((predictions[0].outcomes.return_14d_pct.unwrap() - 50.0).abs() < 1e-9);

        let later = scan + Duration::days(31);
        let (predictions, resolved) = resolve(predictions, |_| Some(5.0), later);
        assert_eq!(resolved, 1);
        let outcomes = &predictions[0].outcomes;
        assert!((outcomes.return_14d_pct.unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(outcomes.price_7d, Some(15.0));
        assert_eq!(outcomes.price_30d, Some(5.0));

        let (again, resolved) = resolve(predictions.clone(), |_| Some(99.0), later);
        assert_eq!(resolved, 0);
        assert_eq!(again, predictions);
    }

    #[test]
    fn test_padded_id_is_priced_under_its_normal_form() {
        let mut padded = labeled("FOO", HygieneLabel::Keep);
        padded.facts.coin_id = Some(" Foo ".to_string());
        let snapshot = snapshot_of("2026-04-01T08:30:00Z", vec![padded]);
        let (predictions, _) = record(&snapshot, Vec::new()).unwrap();
        assert_eq!(predictions[0].prediction_id, "2026-04-01T08-30-00Z_foo");

        let week = ts("2026-04-09T00:00:00Z");
        let keys = due_price_keys(&predictions, week);
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["foo".to_string()]);

        let (predictions, resolved) = resolve(predictions, |id| (id == "foo").then_some(11.0), week);
        assert_eq!(resolved, 1);
        assert_eq!(predictions[0].outcomes.price_7d, Some(11.0));
    }

    #[test]
    fn test_missing_price_leaves_outcome_empty() {
        let (predictions, _) = record(&snapshot(), Vec::new()).unwrap();
        let now = ts("2026-04-20T00:00:00Z");
        let (predictions, resolved) = resolve(predictions, |_| None, now);
        assert_eq!(resolved, 0);
        assert_eq!(predictions[0].due_horizons(now), vec![Horizon::Days7, Horizon::Days14]);
    }
}
