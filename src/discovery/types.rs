use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::alerts::DiscoverySource;
use crate::facts::normalize_coin_id;

/// One row of a market listing (`/coins/markets` shape)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketCoin {
    pub id: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub price_change_percentage_7d_in_currency: Option<f64>,
    pub market_cap_rank: Option<u32>,
}

/// One entry of the trending list, best first
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingCoin {
    pub id: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub market_cap_rank: Option<u32>,
}

/// Market data for one discovery run
///
/// `markets` is the paged listing in market-cap order; `trending_markets`
/// carries the market rows of trending coins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryInput {
    pub trending: Vec<TrendingCoin>,
    pub trending_markets: Vec<MarketCoin>,
    pub markets: Vec<MarketCoin>,
}

/// Position in the trending list, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingRank {
    pub rank: usize,
    pub total: usize,
}

/// A scored coin selected by one discovery run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub coin: MarketCoin,
    pub source: DiscoverySource,
    pub trending: Option<TrendingRank>,
    pub discovery_score: f64,
    pub volume_to_mcap: Option<f64>,
}

impl ScoredCandidate {
    pub fn coin_id(&self) -> Option<String> {
        normalize_coin_id(self.coin.id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistUrls {
    pub official: String,
    pub x: String,
    pub blog: String,
    pub github: String,
}

/// One entry of the main or staging watchlist
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistEntry {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "coinGeckoId")]
    pub coin_gecko_id: String,
    pub category: String,
    pub urls: WatchlistUrls,
    pub notes: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl WatchlistEntry {
    pub fn coin_id(&self) -> Option<String> {
        normalize_coin_id(Some(&self.coin_gecko_id))
    }
}
