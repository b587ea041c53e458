//! Instance lifecycle error types

use crate::instance::Instance;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by instance providers.
///
/// Every variant is either retryable (the same request may succeed later)
/// or terminal (retrying is pointless); [`CloudError::is_retryable`] is the
/// single place that distinction lives.
#[derive(Error, Debug)]
pub enum CloudError {
    /// Connection-level failure: timeout, reset, or a 5xx from the
    /// provider. Safe to retry.
    #[error("network error: {0}")]
    Network(String),

    /// The provider's rate limiter rejected the request (HTTP 429).
    /// `retry_after` carries the provider's hint when it sent one.
    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    /// The referenced instance does not exist.
    #[error("instance not found: {0}")]
    NotFound(String),

    /// The request itself was malformed or rejected outright. Never
    /// retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A required configuration value was absent at construction.
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    /// The provider reported the instance in an `error` state. Terminal
    /// for that instance; the driver never auto-recovers it.
    #[error("provider reported error state for instance {0}")]
    ProviderError(String),

    /// The provider's response could not be parsed. The truncated body is
    /// kept for diagnostics.
    #[error("could not decode provider response (http {status}): {body}")]
    Decode { status: u16, body: String },

    /// The create request failed at the transport level before the
    /// provider returned an instance id. The instance may or may not
    /// exist; the caller reconciles via `list()`.
    #[error("create not acknowledged by provider: {0}")]
    AmbiguousCreate(String),

    /// The polling budget ran out before the instance reached `target`.
    /// The instance may still converge later; `last` is the most recent
    /// observation so the caller never loses the id.
    #[error("deadline exceeded waiting for instance {id} to reach {target}")]
    DeadlineExceeded {
        id: String,
        target: String,
        last: Option<Box<Instance>>,
    },

    /// The provider has no API for this operation.
    #[error("not supported by this provider: {0}")]
    Unsupported(&'static str),
}

impl CloudError {
    /// Whether the transport/poller retry loops may re-issue the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CloudError::Network(_) | CloudError::RateLimited { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
