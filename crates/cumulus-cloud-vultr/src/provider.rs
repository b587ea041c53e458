//! Vultr lifecycle driver
//!
//! Sequences a mutating call with convergence polling and maps the v1
//! quirks onto the idempotent semantics the `InstanceProvider` contract
//! promises: delete-after-delete succeeds, start-on-running is a no-op,
//! and every failure after an instance id exists carries that id.

use crate::codec;
use crate::config::VultrConfig;
use crate::transport::Transport;
use async_trait::async_trait;
use cumulus_cloud::{
    CloudError, Instance, InstanceProvider, InstanceSpec, InstanceStatus, LifecycleRequest,
    PollSpec, Result, RetryConfig, jittered, poll_until,
};
use tokio::time::sleep;

/// Vultr v1 provider
pub struct VultrProvider {
    transport: Transport,
    retry: RetryConfig,
}

impl VultrProvider {
    pub fn new(config: VultrConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(&config)?,
            retry: config.retry,
        })
    }

    /// Fetch one instance, pinning not-found errors to the id so callers
    /// never get a bare transport message where an id belongs.
    async fn fetch(&self, id: &str) -> Result<Instance> {
        let response = self
            .transport
            .get(codec::LIST_PATH, &[("SUBID", id.to_string())])
            .await
            .map_err(|e| pin_not_found(e, id))?;
        codec::decode_server(response.status, &response.body)
    }

    async fn mutate(&self, request: &LifecycleRequest) -> Result<()> {
        let (path, form) = codec::encode(request);
        self.transport.post_form(path, &form).await?;
        Ok(())
    }

    async fn converge(&self, id: &str, spec: PollSpec) -> Result<Instance> {
        poll_until(id, &spec, || self.fetch(id)).await
    }
}

#[async_trait]
impl InstanceProvider for VultrProvider {
    fn name(&self) -> &str {
        "vultr"
    }

    async fn create(&self, spec: &InstanceSpec) -> Result<Instance> {
        spec.validate()?;
        let request = LifecycleRequest::Create(spec.clone());
        let (path, form) = codec::encode(&request);

        // The create POST is the one request we never blindly retry: a
        // timed-out POST may still have provisioned an instance. Only a
        // rate-limit rejection proves the provider did nothing.
        let mut attempt = 0;
        let response = loop {
            match self.transport.post_form_once(path, &form).await {
                Ok(response) => break response,
                Err(CloudError::RateLimited { retry_after })
                    if attempt + 1 < self.retry.max_attempts =>
                {
                    let mut delay = jittered(self.retry.delay_for_attempt(attempt));
                    if let Some(hint) = retry_after {
                        delay = delay.max(hint);
                    }
                    tracing::warn!(attempt = attempt + 1, "create rate limited, retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(CloudError::Network(reason)) => {
                    return Err(CloudError::AmbiguousCreate(reason));
                }
                Err(e) => return Err(e),
            }
        };

        let id = codec::decode_created(response.status, &response.body)?;
        tracing::info!(%id, "create accepted by provider");

        let instance = self.converge(&id, PollSpec::boot()).await?;
        tracing::info!(id = %instance.id, public_ip = ?instance.public_ip, "instance active");
        Ok(instance)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = self
            .mutate(&LifecycleRequest::Delete(id.to_string()))
            .await;
        absorb_not_found(result)?;
        tracing::info!(id, "instance destroyed");
        Ok(())
    }

    async fn start(&self, id: &str) -> Result<Instance> {
        let current = self.fetch(id).await?;
        if current.status == InstanceStatus::Active {
            tracing::debug!(id, "instance already active, nothing to do");
            return Ok(current);
        }

        self.mutate(&LifecycleRequest::Start(id.to_string())).await?;
        self.converge(id, PollSpec::power(InstanceStatus::Active))
            .await
    }

    async fn stop(&self, id: &str) -> Result<Instance> {
        let current = self.fetch(id).await?;
        if current.status == InstanceStatus::Stopped {
            tracing::debug!(id, "instance already stopped, nothing to do");
            return Ok(current);
        }

        self.mutate(&LifecycleRequest::Stop(id.to_string())).await?;
        self.converge(id, PollSpec::power(InstanceStatus::Stopped))
            .await
    }

    async fn list(&self) -> Result<Vec<Instance>> {
        let response = self.transport.get(codec::LIST_PATH, &[]).await?;
        codec::decode_server_list(response.status, &response.body)
    }

    async fn get_by_id(&self, id: &str) -> Result<Instance> {
        self.fetch(id).await
    }

    async fn logs(&self, _id: &str) -> Result<String> {
        // The v1 API has no console-log endpoint. An explicit error keeps
        // "unsupported" distinguishable from "no logs yet".
        Err(CloudError::Unsupported("instance console logs"))
    }
}

/// Destroying an instance that is already gone counts as success.
fn absorb_not_found(result: Result<()>) -> Result<()> {
    match result {
        Err(CloudError::NotFound(_)) => Ok(()),
        other => other,
    }
}

fn pin_not_found(e: CloudError, id: &str) -> CloudError {
    match e {
        CloudError::NotFound(_) => CloudError::NotFound(id.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> VultrProvider {
        VultrProvider::new(VultrConfig::new("test-key")).unwrap()
    }

    #[tokio::test]
    async fn create_rejects_incomplete_specs_before_any_request() {
        let spec = InstanceSpec::new("", "201", "1");
        let err = provider().create(&spec).await.unwrap_err();
        assert!(matches!(err, CloudError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn logs_are_reported_unsupported() {
        let err = provider().logs("576965").await.unwrap_err();
        assert!(matches!(err, CloudError::Unsupported(_)));
    }

    #[test]
    fn delete_treats_not_found_as_success() {
        assert!(absorb_not_found(Err(CloudError::NotFound("576965".into()))).is_ok());
        assert!(absorb_not_found(Ok(())).is_ok());
        assert!(absorb_not_found(Err(CloudError::InvalidRequest("bad".into()))).is_err());
    }

    #[test]
    fn fetch_errors_carry_the_instance_id() {
        let pinned = pin_not_found(CloudError::NotFound("Invalid server".into()), "576965");
        assert!(matches!(pinned, CloudError::NotFound(id) if id == "576965"));

        let passthrough = pin_not_found(CloudError::Network("reset".into()), "576965");
        assert!(passthrough.is_retryable());
    }
}
