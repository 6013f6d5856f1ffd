/// Gate evaluation, label decision and derived flags
///
/// Every function here is pure. Thresholds come from `GateConfig`; the
/// reference values are documented on the config fields.
use super::types::{DerivedMetrics, GateResult, HygieneLabel, LabeledInstrument, RiskFlags};
use crate::config::GateConfig;
use crate::enrichment::{dilution, volume};
use crate::facts::{finite, BenchmarkChanges, Confidence, InstrumentFacts, TractionStatus};

// =============================================================================
// GATES
// =============================================================================

/// Evaluate the five gates
pub fn evaluate_gates(facts: &InstrumentFacts, cfg: &GateConfig) -> GateResult {
    GateResult {
        trackable_data: check_trackable_data(facts),
        liquidity: check_liquidity(facts, cfg),
        unlock_transparency: check_unlock_transparency(facts),
        traction: check_traction(facts),
        concentration_risk: check_concentration(facts),
    }
}

fn check_trackable_data(facts: &InstrumentFacts) -> bool {
    let required = [
        facts.price,
        facts.price_change_24h,
        facts.price_change_7d,
        facts.price_change_30d,
        facts.volume_24h,
        facts.circulating_supply,
    ];
    let has_supply_reference = [facts.fdv, facts.total_supply, facts.max_supply]
        .iter()
        .any(|v| finite(*v).is_some());

    required.iter().all(|v| finite(*v).is_some()) && has_supply_reference
}

/// Unknown volume fails
fn check_liquidity(facts: &InstrumentFacts, cfg: &GateConfig) -> bool {
    finite(facts.volume_24h).map_or(false, |vol| vol >= cfg.low_volume_usd)
}

fn check_unlock_transparency(facts: &InstrumentFacts) -> bool {
    facts.unlocks.unlock_confidence != Confidence::Unknown
}

fn check_traction(facts: &InstrumentFacts) -> bool {
    facts.traction.traction_status == TractionStatus::Ok
}

/// Passes unless the holder data is trusted and flags concentration
fn check_concentration(facts: &InstrumentFacts) -> bool {
    if facts.holders.holder_confidence.is_known() {
        !facts.holders.high_concentration_risk
    } else {
        true
    }
}

// =============================================================================
// LABEL
// =============================================================================

/// Ordered label decision, first match wins
///
/// 1. Untrackable or severely illiquid -> DROP
/// 2. Score >= 3 without a concentration flag -> KEEP, else WATCH-ONLY
/// 3. KEEP with UNKNOWN unlock confidence -> WATCH-ONLY
/// 4. KEEP with a concentration flag -> WATCH-ONLY
///
/// The concentration flag in steps 2 and 4 is read regardless of holder
/// confidence, while the gate ignores it at low confidence.
pub fn decide_label(facts: &InstrumentFacts, gates: &GateResult, cfg: &GateConfig) -> HygieneLabel {
    let severe_illiquidity = finite(facts.volume_24h).map_or(false, |vol| vol < cfg.drop_volume_usd);
    let severe_concentration = facts.holders.high_concentration_risk;

    let mut label = if !gates.trackable_data || severe_illiquidity {
        HygieneLabel::Drop
    } else if gates.score() >= 3 && !severe_concentration {
        HygieneLabel::Keep
    } else {
        HygieneLabel::WatchOnly
    };

    if label == HygieneLabel::Keep && facts.unlocks.unlock_confidence == Confidence::Unknown {
        label = HygieneLabel::WatchOnly;
    }

    if label == HygieneLabel::Keep && severe_concentration {
        label = HygieneLabel::WatchOnly;
    }

    label
}

/// `evaluate(facts) -> (GateResult, HygieneLabel)`
pub fn evaluate(facts: &InstrumentFacts, cfg: &GateConfig) -> (GateResult, HygieneLabel) {
    let gates = evaluate_gates(facts, cfg);
    let label = decide_label(facts, &gates, cfg);
    (gates, label)
}

// =============================================================================
// DERIVED FLAGS
// =============================================================================

/// Momentum without a catalyst; any catalyst suppresses it
pub fn is_chasing(facts: &InstrumentFacts, cfg: &GateConfig) -> bool {
    if facts.has_catalyst() {
        return false;
    }
    finite(facts.price_change_7d).map_or(false, |c| c > cfg.chasing_7d_pct)
        || finite(facts.price_change_24h).map_or(false, |c| c > cfg.chasing_24h_pct)
}

fn relative_strength(change: Option<f64>, benchmark: Option<f64>) -> Option<f64> {
    Some(finite(change)? - finite(benchmark)?)
}

/// Flags and metrics derived from facts and the benchmark
pub fn derive(
    facts: &InstrumentFacts,
    benchmark: &BenchmarkChanges,
    cfg: &GateConfig,
) -> (RiskFlags, DerivedMetrics) {
    let dilution = dilution::compute(facts, cfg);
    let vol = finite(facts.volume_24h);
    let baseline = finite(facts.volume_baseline);

    let metrics = DerivedMetrics {
        relative_strength_24h: relative_strength(facts.price_change_24h, benchmark.price_change_24h),
        relative_strength_7d: relative_strength(facts.price_change_7d, benchmark.price_change_7d),
        relative_strength_30d: relative_strength(facts.price_change_30d, benchmark.price_change_30d),
        float_percent: dilution.float_percent,
        marketcap_to_fdv: dilution.market_cap_to_fdv,
        volume_trend: volume::trend(vol, baseline),
    };

    let thin_fragile = match (finite(facts.price_change_7d), vol, baseline) {
        (Some(change), Some(vol), Some(base)) => change > 0.0 && vol < base,
        _ => false,
    };

    let flags = RiskFlags {
        chasing: is_chasing(facts, cfg),
        low_liquidity: vol.map_or(false, |v| v < cfg.low_volume_usd),
        high_slippage_risk: vol.map_or(false, |v| v >= cfg.drop_volume_usd && v < cfg.low_volume_usd),
        thin_fragile,
        high_dilution_risk: dilution.high_dilution_risk,
        low_float_risk: dilution.low_float_risk,
        outperforming_benchmark: metrics.relative_strength_7d.map_or(false, |rs| rs > 0.0),
    };

    (flags, metrics)
}

/// Full per-instrument evaluation producing one snapshot row
pub fn label_instrument(
    facts: InstrumentFacts,
    benchmark: &BenchmarkChanges,
    cfg: &GateConfig,
) -> LabeledInstrument {
    let (gates, label) = evaluate(&facts, cfg);
    let (flags, metrics) = derive(&facts, benchmark, cfg);

    LabeledInstrument {
        gates_failed: gates.failed(),
        hygiene_label: label,
        gates,
        flags,
        metrics,
        facts,
    }
}
