//! Instance provider trait definition

use crate::error::Result;
use crate::instance::{Instance, InstanceSpec};
use async_trait::async_trait;
use std::time::Duration;

/// Instance lifecycle capability.
///
/// Provider adapters (Vultr, etc.) implement this trait to expose a
/// uniform, normalized interface. Every operation is idempotent from the
/// caller's perspective: deleting a gone instance succeeds, starting a
/// running instance is a no-op. Implementations hold no shared mutable
/// state, so a single provider value can be used from many tasks at once.
///
/// All methods are async and cancel when their future is dropped; the
/// convergence-polling operations (`create`, `start`, `stop`) are the only
/// ones that block for more than one round trip.
#[async_trait]
pub trait InstanceProvider: Send + Sync {
    /// Returns the provider name (e.g., "vultr")
    fn name(&self) -> &str;

    /// Create an instance and wait for it to become active.
    ///
    /// Failures after the provider accepted the create always carry the
    /// assigned instance id, so the caller can inspect or delete the
    /// half-provisioned instance.
    async fn create(&self, spec: &InstanceSpec) -> Result<Instance>;

    /// Destroy an instance. Deleting an instance that no longer exists is
    /// success.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Power on an instance and wait for it to become active.
    async fn start(&self, id: &str) -> Result<Instance>;

    /// Power off an instance and wait for it to stop.
    async fn stop(&self, id: &str) -> Result<Instance>;

    /// Snapshot of all instances visible to the credential.
    async fn list(&self) -> Result<Vec<Instance>>;

    /// Fetch a single instance by id.
    async fn get_by_id(&self, id: &str) -> Result<Instance>;

    /// Fetch console logs, where the provider has an endpoint for them.
    async fn logs(&self, id: &str) -> Result<String>;
}

/// Retry configuration for transport-level requests
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,

    /// Initial delay between attempts
    pub initial_delay: Duration,

    /// Maximum delay between attempts
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before the retry following `attempt` (0-based), capped at
    /// `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((delay as u64).min(self.max_delay.as_millis() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_doubles_and_caps() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        };

        assert_eq!(retry.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(retry.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_secs(8));
        assert_eq!(retry.delay_for_attempt(4), Duration::from_secs(10)); // capped at max
    }
}
