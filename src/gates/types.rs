use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enrichment::VolumeTrend;
use crate::facts::{InstrumentFacts, InstrumentKey};

// =============================================================================
// LABEL
// =============================================================================

/// Categorical verdict for one instrument in one run
///
/// Closed set: any other string fails deserialization, so an unrecognized
/// label can never reach ranking or diffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HygieneLabel {
    #[serde(rename = "KEEP")]
    Keep,
    #[serde(rename = "WATCH-ONLY")]
    WatchOnly,
    #[serde(rename = "DROP")]
    Drop,
}

impl HygieneLabel {
    pub const ALL: [HygieneLabel; 3] = [HygieneLabel::Keep, HygieneLabel::WatchOnly, HygieneLabel::Drop];

    /// KEEP > WATCH-ONLY > DROP
    pub fn rank(&self) -> u8 {
        match self {
            HygieneLabel::Keep => 2,
            HygieneLabel::WatchOnly => 1,
            HygieneLabel::Drop => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HygieneLabel::Keep => "KEEP",
            HygieneLabel::WatchOnly => "WATCH-ONLY",
            HygieneLabel::Drop => "DROP",
        }
    }
}

impl fmt::Display for HygieneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// GATES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    TrackableData,
    Liquidity,
    UnlockTransparency,
    Traction,
    ConcentrationRisk,
}

impl GateName {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateName::TrackableData => "trackable_data",
            GateName::Liquidity => "liquidity",
            GateName::UnlockTransparency => "unlock_transparency",
            GateName::Traction => "traction",
            GateName::ConcentrationRisk => "concentration_risk",
        }
    }
}

/// Outcome of the five gates; `true` means passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GateResult {
    pub trackable_data: bool,
    pub liquidity: bool,
    pub unlock_transparency: bool,
    pub traction: bool,
    pub concentration_risk: bool,
}

impl GateResult {
    fn entries(&self) -> [(GateName, bool); 5] {
        [
            (GateName::TrackableData, self.trackable_data),
            (GateName::Liquidity, self.liquidity),
            (GateName::UnlockTransparency, self.unlock_transparency),
            (GateName::Traction, self.traction),
            (GateName::ConcentrationRisk, self.concentration_risk),
        ]
    }

    /// Number of passed gates (0-5)
    pub fn score(&self) -> usize {
        self.entries().iter().filter(|(_, passed)| *passed).count()
    }

    /// Failed gates in declaration order
    pub fn failed(&self) -> Vec<GateName> {
        self.entries()
            .iter()
            .filter(|(_, passed)| !*passed)
            .map(|(name, _)| *name)
            .collect()
    }
}

// =============================================================================
// DERIVED VIEWS
// =============================================================================

/// Instrument-level flags consumed by ranking, diffing and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskFlags {
    pub chasing: bool,
    pub low_liquidity: bool,
    pub high_slippage_risk: bool,
    pub thin_fragile: bool,
    pub high_dilution_risk: bool,
    pub low_float_risk: bool,
    pub outperforming_benchmark: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub relative_strength_24h: Option<f64>,
    pub relative_strength_7d: Option<f64>,
    pub relative_strength_30d: Option<f64>,
    pub float_percent: Option<f64>,
    pub marketcap_to_fdv: Option<f64>,
    pub volume_trend: Option<VolumeTrend>,
}

/// One row of a snapshot: facts plus everything the engine derived from them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledInstrument {
    #[serde(flatten)]
    pub facts: InstrumentFacts,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    #[serde(flatten)]
    pub flags: RiskFlags,
    #[serde(flatten)]
    pub gates: GateResult,
    pub hygiene_label: HygieneLabel,
    pub gates_failed: Vec<GateName>,
}

impl LabeledInstrument {
    pub fn key(&self) -> Option<InstrumentKey> {
        self.facts.key()
    }

    pub fn symbol(&self) -> &str {
        self.facts.display_symbol()
    }
}
