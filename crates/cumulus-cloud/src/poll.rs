//! Convergence polling (exponential backoff)
//!
//! Mutating provider calls return before the instance actually reaches the
//! requested state. [`poll_until`] re-fetches the instance until its status
//! lands in a target set, the poll budget runs out, or the provider reports
//! a terminal failure.

use crate::error::{CloudError, Result};
use crate::instance::{Instance, InstanceStatus};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Budget and target for one convergence wait.
#[derive(Debug, Clone)]
pub struct PollSpec {
    /// Statuses that count as converged
    pub target: Vec<InstanceStatus>,
    /// Maximum number of fetches
    pub max_attempts: u32,
    /// Delay after the first fetch
    pub initial_delay: Duration,
    /// Cap on the inter-fetch delay
    pub max_delay: Duration,
    /// Exponential backoff multiplier
    pub multiplier: f64,
    /// Overall wall-clock budget
    pub deadline: Duration,
}

impl PollSpec {
    pub fn new(target: impl Into<Vec<InstanceStatus>>) -> Self {
        Self {
            target: target.into(),
            max_attempts: 30,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(15),
            multiplier: 1.5,
            deadline: Duration::from_secs(120),
        }
    }

    /// Budget for first boot after create. Cloud instances restore a
    /// snapshot and boot in this window, so the deadline is minutes, not
    /// seconds.
    pub fn boot() -> Self {
        Self {
            target: vec![InstanceStatus::Active],
            max_attempts: 60,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(20),
            multiplier: 1.5,
            deadline: Duration::from_secs(300),
        }
    }

    /// Budget for power transitions (start/stop).
    pub fn power(target: InstanceStatus) -> Self {
        Self {
            target: vec![target],
            max_attempts: 30,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            multiplier: 1.5,
            deadline: Duration::from_secs(120),
        }
    }

    /// Delay before the fetch following `attempt` (0-based), capped at
    /// `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis((delay as u64).min(self.max_delay.as_millis() as u64))
    }

    /// Human-readable target set for error messages.
    pub fn target_label(&self) -> String {
        self.target
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Apply ±20% jitter so many waiters don't hammer the provider in step.
pub fn jittered(base: Duration) -> Duration {
    if base.is_zero() {
        return base;
    }
    base.mul_f64(rand::thread_rng().gen_range(0.8..1.2))
}

/// Poll `fetch` until the instance reaches a status in `spec.target`.
///
/// - A fetch that lands in the target set returns immediately, with no
///   trailing delay.
/// - An `Error` status outside the target set returns
///   [`CloudError::ProviderError`] immediately; a failed instance is never
///   polled further.
/// - Retryable fetch failures consume the same attempt budget instead of
///   surfacing individually; terminal failures (not-found, invalid
///   request) abort the poll.
/// - Exhausting `max_attempts` or `deadline` returns
///   [`CloudError::DeadlineExceeded`] carrying the last observed instance,
///   so the caller can keep waiting out-of-band.
///
/// Dropping the returned future cancels the poll between fetches.
pub async fn poll_until<F, Fut>(id: &str, spec: &PollSpec, mut fetch: F) -> Result<Instance>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Instance>>,
{
    let started = Instant::now();
    let mut last: Option<Instance> = None;

    for attempt in 0..spec.max_attempts {
        match fetch().await {
            Ok(instance) => {
                if spec.target.contains(&instance.status) {
                    tracing::debug!(
                        id,
                        status = %instance.status,
                        attempts = attempt + 1,
                        "instance converged"
                    );
                    return Ok(instance);
                }
                if instance.status == InstanceStatus::Error {
                    return Err(CloudError::ProviderError(id.to_string()));
                }
                tracing::debug!(id, status = %instance.status, "instance not yet converged");
                last = Some(instance);
            }
            Err(e) if e.is_retryable() => {
                tracing::debug!(id, error = %e, "transient fetch failure during poll");
            }
            Err(e) => return Err(e),
        }

        if attempt + 1 == spec.max_attempts {
            break;
        }
        let delay = jittered(spec.delay_for_attempt(attempt));
        if started.elapsed() + delay >= spec.deadline {
            break;
        }
        sleep(delay).await;
    }

    tracing::warn!(id, target = %spec.target_label(), "poll budget exhausted");
    Err(CloudError::DeadlineExceeded {
        id: id.to_string(),
        target: spec.target_label(),
        last: last.map(Box::new),
    })
}
