/// Per-instrument facts consumed by the engine
///
/// Everything here is already normalized by the provider layer: a fact that
/// could not be obtained is `None`, never a sentinel value. Summaries are
/// flattened into the instrument record so the persisted snapshot keeps one
/// flat object per instrument.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::enrichment::RawFacts;

// =============================================================================
// ENUMS
// =============================================================================

/// Which watchlist an instrument was tracked from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListSource {
    #[default]
    Main,
    Staging,
}

impl ListSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListSource::Main => "main",
            ListSource::Staging => "staging",
        }
    }
}

impl fmt::Display for ListSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trailing window used for the volume baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeWindow {
    #[serde(rename = "7d")]
    SevenDay,
    #[serde(rename = "30d")]
    ThirtyDay,
}

/// Confidence attached to unlock and holder data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Whether the data behind a flag is trusted enough to act on it
    pub fn is_known(&self) -> bool {
        matches!(self, Confidence::Medium | Confidence::High)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Unknown => "UNKNOWN",
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TractionStatus {
    Ok,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalystKind {
    GithubRelease,
    BlogPost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Contract,
    Eoa,
}

// =============================================================================
// SUMMARIES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalystSource {
    #[serde(rename = "type")]
    pub kind: CatalystKind,
    pub title: String,
    pub url: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalystSummary {
    pub has_clean_catalyst: bool,
    pub clean_catalyst: Option<String>,
    pub catalyst_sources: Vec<CatalystSource>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockSummary {
    pub unlock_confidence: Confidence,
    pub unlock_next_30d: Option<f64>,
    pub unlock_next_30d_value: Option<f64>,
    pub unlock_next_30d_percent: Option<f64>,
    pub unlock_risk_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TractionSummary {
    pub traction_status: TractionStatus,
    pub missing_traction: bool,
    pub traction_signals: Vec<String>,
    pub tvl_current: Option<f64>,
}

impl Default for TractionSummary {
    fn default() -> Self {
        Self {
            traction_status: TractionStatus::Unknown,
            missing_traction: true,
            traction_signals: Vec::new(),
            tvl_current: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderEntry {
    pub rank: u32,
    pub address: Option<String>,
    pub address_type: Option<AddressKind>,
    pub percent_of_supply: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HolderSummary {
    pub top_10_holder_percent: Option<f64>,
    pub top_20_holder_percent: Option<f64>,
    pub high_concentration_risk: bool,
    pub holder_confidence: Confidence,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_holders: Vec<HolderEntry>,
}

// =============================================================================
// INSTRUMENT FACTS
// =============================================================================

/// Matching key across runs: stable external id when known, else symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentKey(String);

impl InstrumentKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentFacts {
    pub symbol: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "coin_gecko_id")]
    pub coin_id: Option<String>,
    pub watchlist_source: ListSource,

    pub price: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub price_change_7d: Option<f64>,
    pub price_change_30d: Option<f64>,

    pub volume_24h: Option<f64>,
    pub volume_baseline: Option<f64>,
    pub volume_baseline_window: Option<VolumeWindow>,

    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub market_cap: Option<f64>,
    pub fdv: Option<f64>,

    #[serde(flatten)]
    pub catalyst: CatalystSummary,
    #[serde(flatten)]
    pub unlocks: UnlockSummary,
    #[serde(flatten)]
    pub traction: TractionSummary,
    #[serde(flatten)]
    pub holders: HolderSummary,
}

impl InstrumentFacts {
    /// `None` when the instrument carries no usable identity
    pub fn key(&self) -> Option<InstrumentKey> {
        if let Some(id) = non_empty(&self.coin_id) {
            return Some(InstrumentKey(format!("id:{}", id.to_lowercase())));
        }
        non_empty(&self.symbol).map(|sym| InstrumentKey(format!("sym:{}", sym.to_lowercase())))
    }

    /// Symbol for display, falling back to the external id
    pub fn display_symbol(&self) -> &str {
        non_empty(&self.symbol)
            .or_else(|| non_empty(&self.coin_id))
            .unwrap_or("?")
    }

    /// Identifier used in alert and prediction ids: external id, else symbol
    pub fn stable_id(&self) -> Option<&str> {
        non_empty(&self.coin_id).or_else(|| non_empty(&self.symbol))
    }

    pub fn has_catalyst(&self) -> bool {
        self.catalyst.has_clean_catalyst
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Trimmed, lowercased external id; blank ids are `None`
pub fn normalize_coin_id(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

/// Finite value or nothing
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

// =============================================================================
// RUN-LEVEL INPUTS
// =============================================================================

/// Benchmark percentage changes used for relative strength
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkChanges {
    pub price_change_24h: Option<f64>,
    pub price_change_7d: Option<f64>,
    pub price_change_30d: Option<f64>,
}

/// Which upstream providers actually delivered data this run
///
/// `None` means the provider was unavailable for every instrument.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSources {
    pub market_data: Option<String>,
    pub tvl: Option<String>,
    pub unlocks: Option<String>,
    pub catalysts: Option<String>,
    pub developer_data: Option<String>,
    pub onchain: Option<String>,
}

/// One run's worth of facts as handed over by the provider layer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanInput {
    pub generated_at: Option<DateTime<Utc>>,
    pub benchmark: BenchmarkChanges,
    pub data_sources: DataSources,
    pub instruments: Vec<InstrumentFacts>,
    /// Raw provider data still to be summarized, keyed by external id or symbol
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub raw: BTreeMap<String, RawFacts>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefers_external_id() {
        let facts = InstrumentFacts {
            symbol: Some("ETH".into()),
            coin_id: Some("Ethereum".into()),
            ..Default::default()
        };
        assert_eq!(facts.key().unwrap().as_str(), "id:ethereum");
    }

    #[test]
    fn test_key_falls_back_to_symbol() {
        let facts = InstrumentFacts {
            symbol: Some("ARB".into()),
            coin_id: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(facts.key().unwrap().as_str(), "sym:arb");
        assert!(InstrumentFacts::default().key().is_none());
    }

    #[test]
    fn test_flat_json_deserialization() {
        let json = r#"{
            "symbol": "SOL",
            "coin_gecko_id": "solana",
            "watchlist_source": "staging",
            "price": 150,
            "volume_24h": null,
            "has_clean_catalyst": true,
            "unlock_confidence": "MEDIUM",
            "traction_status": "OK",
            "holder_confidence": "UNKNOWN",
            "volume_baseline_window": "30d"
        }"#;
        let facts: InstrumentFacts = serde_json::from_str(json).unwrap();
        assert_eq!(facts.price, Some(150.0));
        assert_eq!(facts.volume_24h, None);
        assert_eq!(facts.watchlist_source, ListSource::Staging);
        assert!(facts.catalyst.has_clean_catalyst);
        assert_eq!(facts.unlocks.unlock_confidence, Confidence::Medium);
        assert_eq!(facts.traction.traction_status, TractionStatus::Ok);
        assert_eq!(facts.volume_baseline_window, Some(VolumeWindow::ThirtyDay));
    }

    #[test]
    fn test_missing_summaries_default_to_unknown() {
        let facts: InstrumentFacts = serde_json::from_str(r#"{"symbol":"X"}"#).unwrap();
        assert_eq!(facts.unlocks.unlock_confidence, Confidence::Unknown);
        assert_eq!(facts.holders.holder_confidence, Confidence::Unknown);
        assert_eq!(facts.traction.traction_status, TractionStatus::Unknown);
        assert!(!facts.has_catalyst());
    }

    #[test]
    fn test_known_confidence_levels() {
        assert!(!Confidence::Unknown.is_known());
        assert!(!Confidence::Low.is_known());
        assert!(Confidence::Medium.is_known());
        assert!(Confidence::High.is_known());
    }
}
