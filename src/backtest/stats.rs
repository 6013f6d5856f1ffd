/// Aggregate accuracy of past labels
///
/// Only resolved outcomes feed the means; unresolved predictions still count
/// toward `count` and `predictions_tracked`.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Horizon, Prediction, PredictionFlag};
use crate::gates::HygieneLabel;

const DEFAULT_LEADERBOARD_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelStats {
    pub count: usize,
    pub avg_return_7d: Option<f64>,
    pub avg_return_14d: Option<f64>,
    pub avg_return_30d: Option<f64>,
    pub win_rate_14d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccuracyByLabel {
    #[serde(rename = "KEEP")]
    pub keep: LabelStats,
    #[serde(rename = "WATCH-ONLY")]
    pub watch_only: LabelStats,
    #[serde(rename = "DROP")]
    pub drop: LabelStats,
}

impl AccuracyByLabel {
    pub fn get(&self, label: HygieneLabel) -> &LabelStats {
        match label {
            HygieneLabel::Keep => &self.keep,
            HygieneLabel::WatchOnly => &self.watch_only,
            HygieneLabel::Drop => &self.drop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderEntry {
    pub symbol: Option<String>,
    pub coin_gecko_id: Option<String>,
    pub hygiene_label: HygieneLabel,
    pub return_14d_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagEdge {
    pub flag: PredictionFlag,
    pub count_with: usize,
    pub avg_with_14d: Option<f64>,
    pub count_without: usize,
    pub avg_without_14d: Option<f64>,
    /// `avg_with_14d - avg_without_14d` when both sides have data
    pub edge_14d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BacktestStats {
    pub predictions_tracked: usize,
    pub oldest_prediction: Option<DateTime<Utc>>,
    pub accuracy_by_label: AccuracyByLabel,
    pub best_14d: Vec<LeaderEntry>,
    pub worst_14d: Vec<LeaderEntry>,
    pub flag_effectiveness_14d: Vec<FlagEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: BacktestStats,
}

impl BacktestReport {
    pub fn new(generated_at: DateTime<Utc>, stats: BacktestStats) -> Self {
        Self {
            generated_at,
            stats,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn returns<'a, I>(predictions: I, horizon: Horizon) -> Vec<f64>
where
    I: IntoIterator<Item = &'a Prediction>,
{
    predictions
        .into_iter()
        .filter_map(|p| p.outcomes.return_pct(horizon))
        .filter(|r| r.is_finite())
        .collect()
}

fn label_stats(predictions: &[Prediction], label: HygieneLabel) -> LabelStats {
    let group: Vec<&Prediction> = predictions
        .iter()
        .filter(|p| p.hygiene_label == label)
        .collect();
    let returns_14d = returns(group.iter().copied(), Horizon::Days14);
    let win_rate_14d = if returns_14d.is_empty() {
        None
    } else {
        Some(returns_14d.iter().filter(|r| **r > 0.0).count() as f64 / returns_14d.len() as f64)
    };

    LabelStats {
        count: group.len(),
        avg_return_7d: mean(&returns(group.iter().copied(), Horizon::Days7)),
        avg_return_14d: mean(&returns_14d),
        avg_return_30d: mean(&returns(group.iter().copied(), Horizon::Days30)),
        win_rate_14d,
    }
}

fn flag_edge(resolved: &[(&Prediction, f64)], flag: PredictionFlag) -> FlagEdge {
    let (with, without): (Vec<&(&Prediction, f64)>, Vec<&(&Prediction, f64)>) = resolved
        .iter()
        .partition(|(p, _)| flag.read(&p.flags));
    let with: Vec<f64> = with.into_iter().map(|entry| entry.1).collect();
    let without: Vec<f64> = without.into_iter().map(|entry| entry.1).collect();
    let avg_with_14d = mean(&with);
    let avg_without_14d = mean(&without);

    FlagEdge {
        flag,
        count_with: with.len(),
        avg_with_14d,
        count_without: without.len(),
        avg_without_14d,
        edge_14d: avg_with_14d.zip(avg_without_14d).map(|(a, b)| a - b),
    }
}

fn leader(prediction: &Prediction, return_14d_pct: f64) -> LeaderEntry {
    LeaderEntry {
        symbol: prediction.symbol.clone(),
        coin_gecko_id: prediction.coin_id.clone(),
        hygiene_label: prediction.hygiene_label,
        return_14d_pct,
    }
}

/// Aggregate with leaderboards of the given size
pub fn compute_stats(predictions: &[Prediction], leaderboard_size: usize) -> BacktestStats {
    let resolved_14d: Vec<(&Prediction, f64)> = predictions
        .iter()
        .filter_map(|p| {
            p.outcomes
                .return_14d_pct
                .filter(|r| r.is_finite())
                .map(|r| (p, r))
        })
        .collect();

    let mut best = resolved_14d.clone();
    best.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut worst = resolved_14d.clone();
    worst.sort_by(|a, b| a.1.total_cmp(&b.1));

    BacktestStats {
        predictions_tracked: predictions.len(),
        oldest_prediction: predictions.iter().map(|p| p.scan_date).min(),
        accuracy_by_label: AccuracyByLabel {
            keep: label_stats(predictions, HygieneLabel::Keep),
            watch_only: label_stats(predictions, HygieneLabel::WatchOnly),
            drop: label_stats(predictions, HygieneLabel::Drop),
        },
        best_14d: best
            .iter()
            .take(leaderboard_size)
            .map(|(p, r)| leader(p, *r))
            .collect(),
        worst_14d: worst
            .iter()
            .take(leaderboard_size)
            .map(|(p, r)| leader(p, *r))
            .collect(),
        flag_effectiveness_14d: PredictionFlag::ALL
            .iter()
            .map(|flag| flag_edge(&resolved_14d, *flag))
            .collect(),
    }
}

/// `stats(predictions)` with the default top/bottom 5
pub fn stats(predictions: &[Prediction]) -> BacktestStats {
    compute_stats(predictions, DEFAULT_LEADERBOARD_SIZE)
}
