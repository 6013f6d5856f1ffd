//! Forward-return tracking of past labels
//!
//! One [`Prediction`] is recorded per (run, instrument). Later runs resolve
//! matured horizons against fresh prices, and [`stats`] aggregates whatever
//! has resolved so far into a [`BacktestReport`].

pub mod stats;
pub mod tracker;
pub mod types;

pub use stats::{compute_stats, stats, BacktestReport, BacktestStats, FlagEdge, LabelStats, LeaderEntry};
pub use tracker::{due_price_keys, prediction_id, record, resolve};
pub use types::{Horizon, Outcomes, Prediction, PredictionFlag, PredictionFlags};
