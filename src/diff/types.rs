use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::facts::{InstrumentKey, ListSource};
use crate::gates::{HygieneLabel, LabeledInstrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Warning,
    Positive,
    Info,
}

impl Severity {
    /// Sort rank: CRITICAL first, INFO last
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Positive => 2,
            Severity::Info => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Positive => "POSITIVE",
            Severity::Info => "INFO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    NewCoin,
    RemovedCoin,
    ListChanged,
    LabelDowngrade,
    LabelUpgrade,
    LabelChange,
    FlagTriggered,
    FlagCleared,
    CatalystDetected,
    CatalystCleared,
    PriceMove,
}

/// Boolean risk flags tracked for run-to-run transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskFlag {
    #[serde(rename = "chasing")]
    Chasing,
    #[serde(rename = "unlock_risk_flag")]
    UnlockRisk,
    #[serde(rename = "high_concentration_risk")]
    HighConcentration,
    #[serde(rename = "low_liquidity")]
    LowLiquidity,
    #[serde(rename = "high_dilution_risk")]
    HighDilution,
}

impl RiskFlag {
    pub const TRACKED: [RiskFlag; 5] = [
        RiskFlag::Chasing,
        RiskFlag::UnlockRisk,
        RiskFlag::HighConcentration,
        RiskFlag::LowLiquidity,
        RiskFlag::HighDilution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlag::Chasing => "chasing",
            RiskFlag::UnlockRisk => "unlock_risk_flag",
            RiskFlag::HighConcentration => "high_concentration_risk",
            RiskFlag::LowLiquidity => "low_liquidity",
            RiskFlag::HighDilution => "high_dilution_risk",
        }
    }

    pub fn read(&self, instrument: &LabeledInstrument) -> bool {
        match self {
            RiskFlag::Chasing => instrument.flags.chasing,
            RiskFlag::UnlockRisk => instrument.facts.unlocks.unlock_risk_flag,
            RiskFlag::HighConcentration => instrument.facts.holders.high_concentration_risk,
            RiskFlag::LowLiquidity => instrument.flags.low_liquidity,
            RiskFlag::HighDilution => instrument.flags.high_dilution_risk,
        }
    }
}

/// Structured payload of a change; shape depends on the change type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeDetails {
    ListMove {
        previous_list: ListSource,
        current_list: ListSource,
    },
    Label {
        previous_label: HygieneLabel,
        current_label: HygieneLabel,
    },
    Flag {
        flag: RiskFlag,
        previous: bool,
        current: bool,
    },
    PriceMove {
        previous_price: f64,
        current_price: f64,
        pct: f64,
    },
    Empty {},
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub key: InstrumentKey,
    pub symbol: String,
    pub name: Option<String>,
    pub watchlist_source: ListSource,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub description: String,
    pub details: ChangeDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub previous_scan_date: DateTime<Utc>,
    pub current_scan_date: DateTime<Utc>,
    pub changes: Vec<ChangeEvent>,
}

impl DiffReport {
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.changes.iter().filter(|c| c.severity == severity).count()
    }
}

/// First runs have nothing to compare against
#[derive(Debug, Clone, PartialEq)]
pub enum DiffOutcome {
    NoHistory,
    Report(DiffReport),
}

impl DiffOutcome {
    pub fn report(&self) -> Option<&DiffReport> {
        match self {
            DiffOutcome::NoHistory => None,
            DiffOutcome::Report(report) => Some(report),
        }
    }

    pub fn into_report(self) -> Option<DiffReport> {
        match self {
            DiffOutcome::NoHistory => None,
            DiffOutcome::Report(report) => Some(report),
        }
    }
}
