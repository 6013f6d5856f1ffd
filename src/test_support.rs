//! Fixtures shared by unit tests across modules
use chrono::{DateTime, Utc};

use crate::facts::{
    BenchmarkChanges, CatalystSummary, Confidence, DataSources, InstrumentFacts, TractionStatus,
    TractionSummary, UnlockSummary,
};
use crate::gates::{GateResult, HygieneLabel, LabeledInstrument};
use crate::ranking::RankingReport;
use crate::snapshot::Snapshot;

pub fn ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .expect("valid RFC 3339 timestamp")
        .with_timezone(&Utc)
}

/// Fully populated instrument that passes every gate at the given volume
pub fn healthy_facts(symbol: &str, volume: f64) -> InstrumentFacts {
    InstrumentFacts {
        symbol: Some(symbol.to_string()),
        name: Some(format!("{} Token", symbol)),
        coin_id: Some(symbol.to_lowercase()),
        price: Some(10.0),
        price_change_24h: Some(1.0),
        price_change_7d: Some(2.0),
        price_change_30d: Some(3.0),
        volume_24h: Some(volume),
        circulating_supply: Some(100_000_000.0),
        total_supply: Some(120_000_000.0),
        market_cap: Some(1_000_000_000.0),
        fdv: Some(1_200_000_000.0),
        catalyst: CatalystSummary {
            has_clean_catalyst: true,
            clean_catalyst: Some(format!("{} v2 mainnet launch (2026-03-28)", symbol)),
            catalyst_sources: Vec::new(),
        },
        unlocks: UnlockSummary {
            unlock_confidence: Confidence::Medium,
            ..Default::default()
        },
        traction: TractionSummary {
            traction_status: TractionStatus::Ok,
            missing_traction: false,
            traction_signals: vec!["TVL: $2.50M".to_string()],
            tvl_current: Some(2_500_000.0),
        },
        ..Default::default()
    }
}

/// Labeled row with the given label, a catalyst, no flags and all gates passed
pub fn labeled(symbol: &str, label: HygieneLabel) -> LabeledInstrument {
    LabeledInstrument {
        facts: healthy_facts(symbol, 6_000_000.0),
        metrics: Default::default(),
        flags: Default::default(),
        gates: GateResult {
            trackable_data: true,
            liquidity: true,
            unlock_transparency: true,
            traction: true,
            concentration_risk: true,
        },
        hygiene_label: label,
        gates_failed: Vec::new(),
    }
}

pub fn snapshot_of(generated_at: &str, instruments: Vec<LabeledInstrument>) -> Snapshot {
    Snapshot {
        generated_at: ts(generated_at),
        data_sources: full_sources(),
        benchmark: BenchmarkChanges::default(),
        warnings: Vec::new(),
        actionable_today: instruments
            .iter()
            .any(|i| i.hygiene_label == HygieneLabel::Keep),
        instruments,
        ranking: RankingReport::default(),
    }
}

pub fn full_sources() -> DataSources {
    DataSources {
        market_data: Some("coingecko".to_string()),
        tvl: Some("defillama".to_string()),
        unlocks: Some("tokenomist".to_string()),
        catalysts: Some("github+rss".to_string()),
        developer_data: Some("coingecko".to_string()),
        onchain: Some("etherscan".to_string()),
    }
}
