//! Normalized instance model
//!
//! Provider adapters decode their wire formats into these types; nothing
//! provider-specific crosses the caller boundary.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller intent for a new instance. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSpec {
    /// Image or snapshot identifier to boot from
    pub image: String,

    /// Plan/size identifier
    pub plan: String,

    /// Region/datacenter identifier
    pub region: String,

    /// Optional display name
    pub name: Option<String>,

    /// Optional tags
    pub tags: Vec<String>,
}

impl InstanceSpec {
    pub fn new(
        image: impl Into<String>,
        plan: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            image: image.into(),
            plan: plan.into(),
            region: region.into(),
            name: None,
            tags: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Reject specs missing a required identifier before anything is sent
    /// to the provider.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("image", &self.image),
            ("plan", &self.plan),
            ("region", &self.region),
        ] {
            if value.trim().is_empty() {
                return Err(CloudError::InvalidRequest(format!(
                    "instance spec is missing required field `{field}`"
                )));
            }
        }
        Ok(())
    }
}

/// A provisioned instance as reported by the provider.
///
/// `id` is the only field guaranteed stable across calls; everything else
/// is eventually consistent. IPs are `None` until the provider assigns
/// them. Values are only ever constructed from provider responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Provider-assigned identifier, stable and unique
    pub id: String,

    /// Display name
    pub name: String,

    /// Current status
    pub status: InstanceStatus,

    /// When the instance was created, if the provider reported it
    pub created_at: Option<DateTime<Utc>>,

    /// Private/internal address, absent until assigned
    pub private_ip: Option<String>,

    /// Public address, absent until assigned
    pub public_ip: Option<String>,
}

impl Instance {
    pub fn is_running(&self) -> bool {
        self.status == InstanceStatus::Active
    }
}

/// Normalized instance status.
///
/// Providers report their own vocabularies; adapters map them here and map
/// anything unrecognized to `Unknown` rather than failing the decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    /// Accepted but still booting/installing
    Provisioning,
    /// Running
    Active,
    /// Powered off
    Stopped,
    /// Power-off in progress
    Stopping,
    /// Power-on in progress
    Starting,
    /// Deletion in progress
    Deleting,
    /// Provider reported a failure state
    Error,
    /// Provider reported something we don't recognize
    Unknown,
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceStatus::Provisioning => write!(f, "provisioning"),
            InstanceStatus::Active => write!(f, "active"),
            InstanceStatus::Stopped => write!(f, "stopped"),
            InstanceStatus::Stopping => write!(f, "stopping"),
            InstanceStatus::Starting => write!(f, "starting"),
            InstanceStatus::Deleting => write!(f, "deleting"),
            InstanceStatus::Error => write!(f, "error"),
            InstanceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// A mutating lifecycle call, tagged by kind. The codec encode input.
#[derive(Debug, Clone)]
pub enum LifecycleRequest {
    Create(InstanceSpec),
    Delete(String),
    Start(String),
    Stop(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_complete_spec() {
        let spec = InstanceSpec::new("snap-1", "201", "1").with_name("worker");
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_identifiers() {
        let spec = InstanceSpec::new("snap-1", "  ", "1");
        match spec.validate() {
            Err(CloudError::InvalidRequest(msg)) => assert!(msg.contains("plan")),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn status_display_is_lowercase() {
        assert_eq!(InstanceStatus::Provisioning.to_string(), "provisioning");
        assert_eq!(InstanceStatus::Unknown.to_string(), "unknown");
    }
}
