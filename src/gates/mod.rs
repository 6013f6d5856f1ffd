//! Gate evaluation and hygiene labelling
//!
//! Five independent boolean gates are computed from an instrument's facts,
//! then an ordered decision turns them into a `KEEP`/`WATCH-ONLY`/`DROP`
//! label. Instrument-level flags and metrics used downstream by ranking,
//! diffing and alerting are derived alongside.

pub mod engine;
pub mod types;

pub use engine::{decide_label, derive, evaluate, evaluate_gates, is_chasing, label_instrument};
pub use types::{DerivedMetrics, GateName, GateResult, HygieneLabel, LabeledInstrument, RiskFlags};
