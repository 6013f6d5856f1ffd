use serde::{Deserialize, Serialize};

use crate::alerts::ProtocolLinks;

/// Raw metrics for one protocol, as gathered from TVL and market providers
///
/// Every metric is optional; scoring substitutes a neutral component score
/// for anything unknown.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub category: Option<String>,

    /// TVL on the tracked chains
    pub focus_tvl: Option<f64>,
    pub tvl_change_30d_pct: Option<f64>,
    pub tvl_change_7d_pct: Option<f64>,

    pub gecko_id: Option<String>,
    pub token_symbol: Option<String>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,

    pub audits: Option<f64>,
    pub audit_links: Vec<String>,
    pub hack_count: usize,

    pub commits_4w: Option<f64>,

    pub top10_holder_pct: Option<f64>,
    pub top20_holder_pct: Option<f64>,

    pub links: ProtocolLinks,
}

/// Input file for `coinscan defi`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolUniverse {
    pub protocols: Vec<ProtocolInput>,
}
