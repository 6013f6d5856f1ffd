//! Upstream data providers
//!
//! Only current prices are fetched here; they feed prediction resolution.
//! Everything else the engine consumes arrives already normalized in the
//! facts file.

pub mod client;
pub mod coingecko;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::ApiError;

pub use client::{HttpClient, RetryPolicy};
pub use coingecko::CoinGeckoClient;

/// Current price lookup by external coin id
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    /// Prices for as many of `ids` as the provider knows; unknown ids are absent
    async fn fetch_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>, ApiError>;
}
