/// Discovery candidate filters and score
use super::types::{MarketCoin, TrendingRank};
use crate::config::DiscoveryConfig;
use crate::facts::finite;

const KNOWN_STABLE_IDS: [&str; 15] = [
    "tether",
    "usd-coin",
    "dai",
    "usdd",
    "true-usd",
    "pax-dollar",
    "paxos-standard",
    "frax",
    "first-digital-usd",
    "paypal-usd",
    "gemini-dollar",
    "liquity-usd",
    "terrausd",
    "euro-coin",
    "tether-eurt",
];

/// Whole tokens of an id or symbol that mark a pegged asset
const STABLE_TOKENS: [&str; 18] = [
    "usd", "usdt", "usdc", "dai", "tusd", "usdd", "busd", "usdp", "pax", "gusd", "susd", "frax", "lusd", "eurt",
    "eurs", "eur", "gbp", "jpy",
];

/// Substrings of a name that mark a pegged asset
const STABLE_NAME_PARTS: [&str; 9] = [
    "stablecoin",
    "stable coin",
    "usd",
    "us dollar",
    "dollar",
    "usdt",
    "usdc",
    "euro",
    "gbp",
];

/// 24h volume at which the liquidity score saturates
const LIQUIDITY_CAP_USD: f64 = 5_000_000_000.0;
/// Volume/market-cap ratio at which the turnover score saturates
const TURNOVER_CAP: f64 = 0.2;

fn has_stable_token(text: &str) -> bool {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| STABLE_TOKENS.contains(&token))
}

/// Heuristic peg detection on id, symbol and name
pub fn is_likely_stablecoin(coin: &MarketCoin) -> bool {
    let id = coin.id.as_deref().unwrap_or_default().to_lowercase();
    if KNOWN_STABLE_IDS.contains(&id.as_str()) {
        return true;
    }
    if has_stable_token(&id) || has_stable_token(coin.symbol.as_deref().unwrap_or_default()) {
        return true;
    }
    let name = coin.name.as_deref().unwrap_or_default().to_lowercase();
    STABLE_NAME_PARTS.iter().any(|part| name.contains(part))
}

/// Volume floor, market-cap band and 7d change band, all inclusive
pub fn meets_quality_gates(coin: &MarketCoin, cfg: &DiscoveryConfig) -> bool {
    let (Some(volume), Some(mcap), Some(change_7d)) = (
        finite(coin.total_volume),
        finite(coin.market_cap),
        finite(coin.price_change_percentage_7d_in_currency),
    ) else {
        return false;
    };
    volume >= cfg.min_volume_24h
        && (cfg.min_market_cap..=cfg.max_market_cap).contains(&mcap)
        && (cfg.min_price_change_7d..=cfg.max_price_change_7d).contains(&change_7d)
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// 0..=100: momentum 40, liquidity 25, turnover 20, small-cap 15, trending 10
///
/// Any missing input scores 0.
pub fn discovery_score(coin: &MarketCoin, cfg: &DiscoveryConfig, trending: Option<TrendingRank>) -> f64 {
    let (Some(volume), Some(mcap), Some(change_7d)) = (
        finite(coin.total_volume),
        finite(coin.market_cap),
        finite(coin.price_change_percentage_7d_in_currency),
    ) else {
        return 0.0;
    };

    let momentum = unit((change_7d - cfg.min_price_change_7d) / (cfg.max_price_change_7d - cfg.min_price_change_7d)) * 40.0;
    let liquidity = unit((volume + 1.0).log10() / (LIQUIDITY_CAP_USD + 1.0).log10()) * 25.0;
    let turnover = if mcap > 0.0 {
        unit(volume / mcap / TURNOVER_CAP) * 20.0
    } else {
        0.0
    };

    let min_log = cfg.min_market_cap.log10();
    let max_log = cfg.max_market_cap.log10();
    let size = (1.0 - unit((mcap.log10() - min_log) / (max_log - min_log))) * 15.0;

    let trend_bonus = trending
        .filter(|t| t.rank > 0 && t.total > 0)
        .map(|t| (1.0 - (t.rank - 1) as f64 / t.total.saturating_sub(1).max(1) as f64) * 10.0)
        .unwrap_or(0.0);

    (momentum + liquidity + turnover + size + trend_bonus).clamp(0.0, 100.0)
}
