//! Authenticated HTTP transport for the Vultr v1 API
//!
//! Owns the reqwest client, the `API-Key` header, request timeouts, and
//! the classification of HTTP outcomes into the shared error vocabulary.
//! Retryable failures (timeouts, 429, 5xx) are re-attempted with jittered
//! exponential backoff; terminal failures surface immediately.

use crate::config::VultrConfig;
use cumulus_cloud::{CloudError, Result, RetryConfig, jittered};
use reqwest::Method;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// A successful (2xx) provider response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP transport with authentication and retry policy.
pub struct Transport {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    retry: RetryConfig,
}

impl Transport {
    pub fn new(config: &VultrConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CloudError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry.clone(),
        })
    }

    /// GET with the configured retry policy.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse> {
        with_retries(&self.retry, || {
            self.dispatch(Method::GET, path, query, None)
        })
        .await
    }

    /// Form-encoded POST with the configured retry policy. Only for calls
    /// that are safe to repeat (start, halt, destroy).
    pub async fn post_form(&self, path: &str, form: &[(&str, String)]) -> Result<RawResponse> {
        with_retries(&self.retry, || {
            self.dispatch(Method::POST, path, &[], Some(form))
        })
        .await
    }

    /// Single-attempt form-encoded POST. Used for create, where a blind
    /// retry could provision a duplicate instance.
    pub async fn post_form_once(&self, path: &str, form: &[(&str, String)]) -> Result<RawResponse> {
        self.dispatch(Method::POST, path, &[], Some(form)).await
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        form: Option<&[(&str, String)]>,
    ) -> Result<RawResponse> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("API-Key", &self.api_key);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(form) = form {
            request = request.form(form);
        }

        tracing::debug!(%method, %url, "sending provider request");

        let response = request.send().await.map_err(from_reqwest)?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.map_err(from_reqwest)?;

        match classify(status, retry_after, &body) {
            None => Ok(RawResponse { status, body }),
            Some(e) => Err(e),
        }
    }
}

/// Run `op` until it succeeds, returns a terminal error, or the attempt
/// budget is spent. Retry delays back off exponentially with jitter, and
/// stretch to honor a provider-supplied `Retry-After` hint.
pub(crate) async fn with_retries<F, Fut>(retry: &RetryConfig, mut op: F) -> Result<RawResponse>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RawResponse>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_retryable() && attempt + 1 < retry.max_attempts => {
                let mut delay = jittered(retry.delay_for_attempt(attempt));
                if let CloudError::RateLimited {
                    retry_after: Some(hint),
                } = &e
                {
                    delay = delay.max(*hint);
                }
                tracing::warn!(error = %e, attempt = attempt + 1, "retrying provider request");
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Map an HTTP outcome to the shared error vocabulary. `None` is success.
pub(crate) fn classify(status: u16, retry_after: Option<Duration>, body: &str) -> Option<CloudError> {
    match status {
        200..=299 => None,
        429 => Some(CloudError::RateLimited { retry_after }),
        500..=599 => Some(CloudError::Network(format!(
            "provider returned http {status}"
        ))),
        404 => Some(CloudError::NotFound(truncated(body))),
        // The v1 API reports unknown SUBIDs as 412 "Invalid server"
        412 if body.contains("Invalid server") => Some(CloudError::NotFound(truncated(body))),
        400..=499 => Some(CloudError::InvalidRequest(format!(
            "http {status}: {}",
            truncated(body)
        ))),
        _ => Some(CloudError::Network(format!("unexpected http {status}"))),
    }
}

fn from_reqwest(e: reqwest::Error) -> CloudError {
    if e.is_timeout() {
        CloudError::Network("request timed out".to_string())
    } else {
        CloudError::Network(e.to_string())
    }
}

/// Cap a response body for inclusion in error messages.
pub(crate) fn truncated(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        return trimmed.to_string();
    }
    let mut end = MAX;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}
