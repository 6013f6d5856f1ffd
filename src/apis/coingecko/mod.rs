/// CoinGecko price client
///
/// API Documentation: https://docs.coingecko.com/reference/introduction
///
/// Endpoints implemented:
/// 1. /simple/price?ids=..&vs_currencies=.. - Current price for a batch of coin ids
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

use super::client::{HttpClient, RetryPolicy};
use super::PriceSource;
use crate::config::PricesConfig;
use crate::errors::ApiError;
use crate::logger::{self, LogTag};

/// `{id: {currency: price}}`; missing or null prices are skipped
type SimplePriceResponse = HashMap<String, HashMap<String, Option<f64>>>;

pub struct CoinGeckoClient {
    http_client: HttpClient,
    base_url: String,
    api_key: Option<(String, String)>,
    vs_currency: String,
    chunk_size: usize,
    worker_count: usize,
    enabled: bool,
}

impl CoinGeckoClient {
    pub fn new(cfg: &PricesConfig) -> Result<Self, ApiError> {
        let http_client = HttpClient::new(cfg.timeout_secs, RetryPolicy::from_config(cfg))?;
        let api_key = Some(cfg.api_key.trim())
            .filter(|k| !k.is_empty())
            .map(|k| (cfg.api_key_header.clone(), k.to_string()));

        Ok(Self {
            http_client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            vs_currency: cfg.vs_currency.to_lowercase(),
            chunk_size: cfg.chunk_size.max(1),
            worker_count: cfg.worker_count.max(1),
            enabled: cfg.enabled,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn fetch_chunk(&self, chunk: &[String]) -> Result<HashMap<String, f64>, ApiError> {
        let url = format!("{}/simple/price", self.base_url);
        let ids = chunk.join(",");
        let query = [("ids", ids.as_str()), ("vs_currencies", self.vs_currency.as_str())];
        let headers: Vec<(&str, &str)> = self
            .api_key
            .iter()
            .map(|(name, key)| (name.as_str(), key.as_str()))
            .collect();

        let data: SimplePriceResponse = self.http_client.get_json(&url, &query, &headers).await?;
        Ok(extract_prices(chunk, &data, &self.vs_currency))
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    fn name(&self) -> &str {
        "coingecko"
    }

    /// Chunks run through a fixed-size worker pool; a failed chunk is
    /// skipped, and only a batch where every chunk failed is an error
    async fn fetch_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>, ApiError> {
        if !self.enabled {
            return Err(ApiError::Disabled);
        }
        let chunks = plan_chunks(ids, self.chunk_size);
        if chunks.is_empty() {
            return Ok(HashMap::new());
        }
        let total_chunks = chunks.len();

        let results: Vec<Result<HashMap<String, f64>, ApiError>> = stream::iter(chunks.into_iter())
            .map(|chunk| async move { self.fetch_chunk(&chunk).await })
            .buffer_unordered(self.worker_count)
            .collect()
            .await;

        let mut prices = HashMap::new();
        let mut last_error = None;
        for result in results {
            match result {
                Ok(chunk_prices) => prices.extend(chunk_prices),
                Err(err) => {
                    let message = match &err {
                        ApiError::HttpStatus { body, .. } => friendly_error(body).unwrap_or_else(|| err.to_string()),
                        _ => err.to_string(),
                    };
                    logger::warning(LogTag::Prices, &format!("Price chunk failed: {}", message));
                    last_error = Some(err);
                }
            }
        }

        if prices.is_empty() {
            if let Some(err) = last_error {
                return Err(err);
            }
        }

        logger::debug(
            LogTag::Prices,
            &format!("prices={} chunks={} workers={}", prices.len(), total_chunks, self.worker_count),
        );
        Ok(prices)
    }
}

/// Trim, drop empties, deduplicate, then split into request-sized chunks
pub fn plan_chunks(ids: &[String], chunk_size: usize) -> Vec<Vec<String>> {
    let unique: BTreeSet<&str> = ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .collect();
    let unique: Vec<String> = unique.into_iter().map(str::to_string).collect();
    unique
        .chunks(chunk_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

fn extract_prices(chunk: &[String], data: &SimplePriceResponse, vs_currency: &str) -> HashMap<String, f64> {
    chunk
        .iter()
        .filter_map(|id| {
            let price = data.get(id)?.get(vs_currency).copied().flatten()?;
            price.is_finite().then(|| (id.clone(), price))
        })
        .collect()
}

/// Human-readable message for CoinGecko error payloads
pub fn friendly_error(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body).ok()?;
    let status = payload.get("status");
    let code = status
        .and_then(|s| s.get("error_code"))
        .or_else(|| payload.get("error_code"))
        .and_then(Value::as_i64);
    let message = status
        .and_then(|s| s.get("error_message"))
        .or_else(|| payload.get("error_message"))
        .or_else(|| payload.get("error"))
        .and_then(Value::as_str);

    let text = match (code, message) {
        (None, None) => return None,
        (Some(10002), _) => "CoinGecko API key missing; check the key and header name.".to_string(),
        (Some(10005), _) => "CoinGecko endpoint not available on your plan.".to_string(),
        (Some(10010), _) => "CoinGecko Pro key used with the demo base URL.".to_string(),
        (Some(10011), _) => "CoinGecko Demo key used with the pro base URL.".to_string(),
        (Some(1020), _) => "CoinGecko access denied by CDN firewall.".to_string(),
        (Some(code), message) => format!(
            "CoinGecko error {}: {}",
            code,
            message.unwrap_or("Request failed.")
        ),
        (None, Some(message)) => format!("CoinGecko error: {}", message),
    };
    Some(text)
}
