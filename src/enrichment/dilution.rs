/// Supply dilution metrics
use crate::config::GateConfig;
use crate::facts::{finite, InstrumentFacts};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DilutionMetrics {
    pub float_percent: Option<f64>,
    pub market_cap_to_fdv: Option<f64>,
    pub high_dilution_risk: bool,
    pub low_float_risk: bool,
}

/// Float uses total supply, else max supply, as the denominator
pub fn compute(facts: &InstrumentFacts, cfg: &GateConfig) -> DilutionMetrics {
    let circulating = finite(facts.circulating_supply);
    let supply = finite(facts.total_supply).or(finite(facts.max_supply));
    let market_cap = finite(facts.market_cap);
    let fdv = finite(facts.fdv);

    let float_percent = match (circulating, supply) {
        (Some(circ), Some(total)) if total != 0.0 => Some(circ / total * 100.0),
        _ => None,
    };
    let market_cap_to_fdv = match (market_cap, fdv) {
        (Some(mcap), Some(fdv)) if fdv != 0.0 => Some(mcap / fdv),
        _ => None,
    };

    let low_float_risk = float_percent.map_or(false, |f| f < cfg.low_float_pct);
    let fdv_overhang = match (market_cap, fdv) {
        (Some(mcap), Some(fdv)) => fdv >= mcap * cfg.max_fdv_multiple,
        _ => false,
    };
    let high_dilution_risk = low_float_risk
        || market_cap_to_fdv.map_or(false, |r| r < cfg.min_mcap_to_fdv)
        || fdv_overhang;

    DilutionMetrics {
        float_percent,
        market_cap_to_fdv,
        high_dilution_risk,
        low_float_risk,
    }
}
