//! Vultr driver configuration
//!
//! The credential and transport knobs arrive here as explicit values owned
//! by the caller; nothing in the driver reads process state after
//! construction.

use cumulus_cloud::{CloudError, Result, RetryConfig};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.vultr.com";

/// Configuration for the Vultr driver
#[derive(Debug, Clone)]
pub struct VultrConfig {
    /// API key, sent as the `API-Key` header. Never logged.
    pub api_key: String,

    /// API endpoint; overridable for tests and gateways
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Retry policy for idempotent requests
    pub retry: RetryConfig,
}

impl VultrConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            // initial attempt + one retry
            retry: RetryConfig {
                max_attempts: 2,
                ..RetryConfig::default()
            },
        }
    }

    /// Create config from the `VULTR_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("VULTR_API_KEY")
            .map_err(|_| CloudError::MissingConfig("VULTR_API_KEY"))?;
        if api_key.trim().is_empty() {
            return Err(CloudError::MissingConfig("VULTR_API_KEY"));
        }
        Ok(Self::new(api_key.trim()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
