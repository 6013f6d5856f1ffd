use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::AlertsConfig;
use crate::facts::{normalize_coin_id, ListSource};
use crate::gates::HygieneLabel;

// =============================================================================
// FEEDS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProtocolBucket {
    Candidate,
    Watch,
    Avoid,
    Ignore,
    #[serde(other)]
    Other,
}

impl ProtocolBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolBucket::Candidate => "CANDIDATE",
            ProtocolBucket::Watch => "WATCH",
            ProtocolBucket::Avoid => "AVOID",
            ProtocolBucket::Ignore => "IGNORE",
            ProtocolBucket::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Yes,
    No,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Component scores; `total` is their sum
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolScores {
    pub total: Option<f64>,
    pub traction: Option<f64>,
    pub dev: Option<f64>,
    pub security: Option<f64>,
    pub market: Option<f64>,
    pub token_risk: Option<f64>,
    /// Share of scoring inputs that were known, 0..=1
    pub coverage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolMarket {
    pub token_symbol: Option<String>,
    pub gecko_id: Option<String>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub volume_to_mcap: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolLinks {
    pub defillama: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolTvl {
    pub focus_current: Option<f64>,
    pub change_30d_pct: Option<f64>,
    pub change_7d_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolSecurity {
    pub audit_status: AuditStatus,
    pub hack_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolFlags {
    pub tvl_collapse: bool,
    pub liquidity_trap: bool,
    pub dead_dev: bool,
    pub whale_concentration: bool,
}

/// One scored protocol from the protocol-quality feed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolCandidate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub category: Option<String>,
    pub bucket: Option<ProtocolBucket>,
    pub scores: ProtocolScores,
    pub market: ProtocolMarket,
    pub links: ProtocolLinks,
    pub tvl: ProtocolTvl,
    pub security: ProtocolSecurity,
    pub flags: ProtocolFlags,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolFeed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub protocols: Vec<ProtocolCandidate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscoveryStatus {
    #[default]
    New,
    Staged,
    Promoted,
    Ignored,
    #[serde(other)]
    Other,
}

impl DiscoveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryStatus::New => "NEW",
            DiscoveryStatus::Staged => "STAGED",
            DiscoveryStatus::Promoted => "PROMOTED",
            DiscoveryStatus::Ignored => "IGNORED",
            DiscoveryStatus::Other => "OTHER",
        }
    }

    /// Still awaiting a decision
    pub fn is_open(&self) -> bool {
        matches!(self, DiscoveryStatus::New | DiscoveryStatus::Staged)
    }

    /// Excluded from future discovery runs
    pub fn is_settled(&self) -> bool {
        matches!(self, DiscoveryStatus::Promoted | DiscoveryStatus::Ignored)
    }
}

/// Which market scan surfaced a discovery candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoverySource {
    #[serde(rename = "trending")]
    Trending,
    #[serde(rename = "criteria")]
    Criteria,
    #[serde(rename = "trending+criteria")]
    Both,
    #[serde(other)]
    Other,
}

/// One entry of the discovery queue
///
/// Older queue files key entries by `id`, newer ones by `coinGeckoId`; both
/// are accepted and [`coin_id`](Self::coin_id) prefers `coinGeckoId`. Keys
/// this type does not model are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryCandidate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "coinGeckoId")]
    pub coin_gecko_id: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub discovery_score: Option<f64>,
    pub status: Option<DiscoveryStatus>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub volume_to_mcap: Option<f64>,
    pub price_change_7d: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub source: Option<DiscoverySource>,
    pub notes: Option<String>,
    pub first_seen_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl DiscoveryCandidate {
    /// Trimmed, lowercased coin id
    pub fn coin_id(&self) -> Option<String> {
        normalize_coin_id(self.coin_gecko_id.as_deref()).or_else(|| normalize_coin_id(self.id.as_deref()))
    }
}

/// The discovery queue file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryFeed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Value>,
    pub candidates: Vec<DiscoveryCandidate>,
}

impl DiscoveryFeed {
    pub fn position(&self, coin_id: &str) -> Option<usize> {
        self.candidates
            .iter()
            .position(|c| c.coin_id().as_deref() == Some(coin_id))
    }

    pub fn get_mut(&mut self, coin_id: &str) -> Option<&mut DiscoveryCandidate> {
        let idx = self.position(coin_id)?;
        self.candidates.get_mut(idx)
    }
}

// =============================================================================
// ALERTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    Watchlist,
    Defi,
    Discovery,
}

impl AlertSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSource::Watchlist => "watchlist",
            AlertSource::Defi => "defi",
            AlertSource::Discovery => "discovery",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertDetails {
    Watchlist {
        hygiene_label: HygieneLabel,
        catalyst: Option<String>,
    },
    Discovery {
        status: DiscoveryStatus,
        market_cap: Option<f64>,
        volume_24h: Option<f64>,
        price_change_7d: Option<f64>,
    },
    // Every field optional, so it must stay last
    Defi {
        bucket: Option<ProtocolBucket>,
        token_gecko_id: Option<String>,
        tvl: Option<f64>,
        tvl_30d: Option<f64>,
        tvl_7d: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// `source:id`, stable across runs
    pub key: String,
    pub source: AlertSource,
    pub watchlist_source: Option<ListSource>,
    pub symbol: Option<String>,
    pub title: String,
    pub score: Option<f64>,
    pub url: Option<String>,
    pub details: AlertDetails,
}

/// Effective thresholds; a `None` threshold disables its rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub defi_score_threshold: Option<f64>,
    pub discovery_score_threshold: Option<f64>,
    pub alert_actionable: bool,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        AlertsConfig::default().thresholds()
    }
}

impl AlertsConfig {
    pub fn thresholds(&self) -> AlertThresholds {
        let enabled = |on: bool, value: f64| Some(value).filter(|v| on && v.is_finite());
        AlertThresholds {
            defi_score_threshold: enabled(self.defi_enabled, self.defi_score_threshold),
            discovery_score_threshold: enabled(self.discovery_enabled, self.discovery_score_threshold),
            alert_actionable: self.alert_actionable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertsReport {
    pub generated_at: DateTime<Utc>,
    pub thresholds: AlertThresholds,
    pub alerts: Vec<Alert>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ts;

    const QUEUE_FIXTURE: &str = r#"{
      "schema_version": 1,
      "generated_at": "2026-03-30T12:00:00.000Z",
      "criteria": {"min_volume_24h": "$5M", "excluded": "stablecoins/pegged assets", "market_pages_scanned": 5},
      "candidates": [
        {
          "coinGeckoId": "render-token",
          "symbol": "rndr",
          "name": "Render",
          "discovery_score": 84.2,
          "market_cap": 2100000000,
          "volume_24h": 180000000,
          "volume_to_mcap": 0.0857,
          "price_change_7d": 22.4,
          "market_cap_rank": 41,
          "source": "trending+criteria",
          "status": "STAGED",
          "notes": "",
          "first_seen_at": "2026-03-28T12:00:00.000Z",
          "last_seen_at": "2026-03-30T12:00:00.000Z"
        },
        {
          "id": "Old-Entry",
          "symbol": "old",
          "discovery_score": 71,
          "status": "ARCHIVED",
          "notes": "kept from an older queue",
          "manual_tag": "review"
        },
        {
          "id": "dup",
          "coinGeckoId": "dup",
          "symbol": "DUP",
          "discovery_score": 90,
          "source": "newsletter"
        }
      ]
    }"#;

    const PROTOCOL_FIXTURE: &str = r#"{
      "generated_at": "2026-03-30T06:00:00Z",
      "config": {"chains": ["Ethereum", "Solana"], "tvl_include_min": 10000000},
      "protocols": [
        {
          "defillama_id": 111,
          "slug": "aave-v3",
          "name": "Aave V3",
          "category": "Lending",
          "chains": ["Ethereum"],
          "tvl": {"focus_current": 12000000000, "tvl_7d_ago": 11500000000, "change_7d_pct": 4.3, "change_30d_pct": 9.1, "source": "defillama"},
          "market": {"gecko_id": "aave", "token_symbol": "AAVE", "token_name": "Aave", "market_cap": 1500000000, "volume_24h": 120000000},
          "dev": {"commit_count_4_weeks": 48, "github_orgs": ["aave"], "source": "coingecko"},
          "security": {"audits": 4, "audit_status": "YES", "hack_count": 0, "hack_sources": []},
          "flags": {"tvl_collapse": false, "liquidity_trap": false, "dead_dev": false, "whale_concentration": false},
          "scores": {"total": 83.5, "traction": 33.1, "dev": 19.8, "security": 10, "market": 13.6, "token_risk": 5, "coverage": 1},
          "bucket": "CANDIDATE",
          "reasons": ["TVL (ETH+SOL): $12B"],
          "onchain": null
        },
        {
          "slug": "newfarm",
          "bucket": "EXPERIMENTAL",
          "security": {"audit_status": "PARTIAL"},
          "scores": {"total": 41}
        }
      ]
    }"#;

    #[test]
    fn test_queue_fixture_parses_mixed_entries() {
        let feed: DiscoveryFeed = serde_json::from_str(QUEUE_FIXTURE).unwrap();
        assert_eq!(feed.schema_version, Some(1));
        assert_eq!(feed.generated_at, Some(ts("2026-03-30T12:00:00Z")));
        assert_eq!(feed.criteria.as_ref().unwrap()["market_pages_scanned"], 5);

        let ids: Vec<Option<String>> = feed.candidates.iter().map(|c| c.coin_id()).collect();
        assert_eq!(
            ids,
            vec![
                Some("render-token".to_string()),
                Some("old-entry".to_string()),
                Some("dup".to_string())
            ]
        );

        let render = &feed.candidates[0];
        assert_eq!(render.status, Some(DiscoveryStatus::Staged));
        assert_eq!(render.source, Some(DiscoverySource::Both));
        assert_eq!(render.market_cap_rank, Some(41));
        assert_eq!(render.first_seen_at, Some(ts("2026-03-28T12:00:00Z")));
        assert!(render.extra.is_empty());

        let old = &feed.candidates[1];
        assert_eq!(old.status, Some(DiscoveryStatus::Other));
        assert_eq!(old.notes.as_deref(), Some("kept from an older queue"));
        assert_eq!(old.extra.get("manual_tag"), Some(&Value::from("review")));

        assert_eq!(feed.candidates[2].source, Some(DiscoverySource::Other));
        assert_eq!(feed.position("dup"), Some(2));
    }

    #[test]
    fn test_queue_fixture_keeps_unmodelled_keys_on_write() {
        let feed: DiscoveryFeed = serde_json::from_str(QUEUE_FIXTURE).unwrap();
        let value = serde_json::to_value(&feed).unwrap();
        let old = &value["candidates"][1];
        assert_eq!(old["manual_tag"], "review");
        assert_eq!(old["id"], "Old-Entry");
        assert!(old["coinGeckoId"].is_null());
        assert_eq!(value["candidates"][0]["coinGeckoId"], "render-token");
        assert!(value["candidates"][0].get("id").is_none());
    }

    #[test]
    fn test_protocol_fixture_ignores_extra_keys() {
        let feed: ProtocolFeed = serde_json::from_str(PROTOCOL_FIXTURE).unwrap();
        assert_eq!(feed.protocols.len(), 2);

        let aave = &feed.protocols[0];
        assert_eq!(aave.bucket, Some(ProtocolBucket::Candidate));
        assert_eq!(aave.category.as_deref(), Some("Lending"));
        assert_eq!(aave.scores.total, Some(83.5));
        assert_eq!(aave.scores.coverage, Some(1.0));
        assert_eq!(aave.market.gecko_id.as_deref(), Some("aave"));
        assert_eq!(aave.security.audit_status, AuditStatus::Yes);
        assert_eq!(aave.tvl.change_30d_pct, Some(9.1));

        let farm = &feed.protocols[1];
        assert_eq!(farm.bucket, Some(ProtocolBucket::Other));
        assert_eq!(farm.security.audit_status, AuditStatus::Unknown);
        assert_eq!(farm.market, ProtocolMarket::default());
    }
}
