/// Error taxonomy for coinscan
///
/// - `EngineError`: contract breaches between engine components. These fail
///   loudly and propagate to the caller.
/// - `ApiError`: an upstream fetch failed, possibly after retries. Callers
///   degrade (leave the dependent field empty) instead of aborting the run.
/// - `StoreError`: artifact persistence failures.
///
/// Missing facts are never errors; they are `None` fields handled by the
/// gate policies.
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// ENGINE INVARIANT VIOLATIONS
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Instrument has neither an external id nor a symbol (name: {name:?})")]
    MissingIdentity { name: Option<String> },

    #[error("Duplicate prediction id: {0}")]
    DuplicatePredictionId(String),

    #[error("Duplicate instrument key in snapshot: {0}")]
    DuplicateInstrument(String),
}

// =============================================================================
// PROVIDER ERRORS
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API disabled")]
    Disabled,

    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ApiError> },
}

impl ApiError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Timeout => true,
            ApiError::RateLimited { .. } => true,
            ApiError::HttpStatus { status, .. } => *status >= 500,
            ApiError::InvalidResponse(_) => false,
            ApiError::Disabled => false,
            ApiError::RetriesExhausted { .. } => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<ApiError> for String {
    fn from(err: ApiError) -> String {
        err.to_string()
    }
}

// =============================================================================
// PERSISTENCE ERRORS
// =============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::RateLimited { retry_after: Some(3) }.is_retryable());
        assert!(ApiError::HttpStatus {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!ApiError::HttpStatus {
            status: 404,
            body: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Disabled.is_retryable());
    }

    #[test]
    fn test_exhausted_message_names_last_error() {
        let err = ApiError::RetriesExhausted {
            attempts: 3,
            last: Box::new(ApiError::Timeout),
        };
        assert_eq!(
            err.to_string(),
            "Retries exhausted after 3 attempts: Request timeout"
        );
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::DuplicatePredictionId("2026-01-01T00-00-00Z_bitcoin".into());
        assert!(err.to_string().contains("2026-01-01T00-00-00Z_bitcoin"));
    }
}
