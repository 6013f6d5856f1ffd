/// Base HTTP client with bounded retries
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::PricesConfig;
use crate::errors::ApiError;
use crate::logger::{self, LogTag};

/// How failed requests are retried
///
/// HTTP 429 waits for the provider's `Retry-After` hint, or the fallback when
/// none is given. Other retryable failures wait a short fixed backoff. Both
/// share the same retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub rate_limit_fallback: Duration,
    pub transient_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PricesConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &PricesConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            rate_limit_fallback: Duration::from_secs(cfg.rate_limit_fallback_secs),
            transient_backoff: Duration::from_millis(cfg.transient_backoff_ms),
        }
    }

    /// Wait before the next attempt, `None` when the error is final
    pub fn delay_for(&self, err: &ApiError, retries_used: u32) -> Option<Duration> {
        if retries_used >= self.max_retries || !err.is_retryable() {
            return None;
        }
        match err {
            ApiError::RateLimited {
                retry_after: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            ApiError::RateLimited { retry_after: None } => Some(self.rate_limit_fallback),
            _ => Some(self.transient_backoff),
        }
    }
}

/// HTTP client wrapper with timeout and retry logic
pub struct HttpClient {
    client: Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, retry: RetryPolicy) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: Duration::from_secs(timeout_secs),
            retry,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// GET and decode JSON, retrying per the policy
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut retries_used = 0;
        loop {
            let err = match self.get_once(url, query, headers).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match self.retry.delay_for(&err, retries_used) {
                Some(wait) => {
                    retries_used += 1;
                    logger::debug(
                        LogTag::Prices,
                        &format!(
                            "retry {}/{} in {}ms after: {}",
                            retries_used,
                            self.retry.max_retries,
                            wait.as_millis(),
                            err
                        ),
                    );
                    tokio::time::sleep(wait).await;
                }
                None if retries_used > 0 || err.is_retryable() => {
                    return Err(ApiError::RetriesExhausted {
                        attempts: retries_used + 1,
                        last: Box::new(err),
                    });
                }
                None => return Err(err),
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut request = self
            .client
            .get(url)
            .query(query)
            .header("Accept", "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(ApiError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}
