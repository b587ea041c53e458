//! Vultr provider for Cumulus
//!
//! This crate implements the InstanceProvider trait against the Vultr v1
//! ("legacy") API, enabling Cumulus to create, power-cycle, and destroy
//! Vultr compute instances.
//!
//! The v1 API is form-encoded, asynchronous, and eventually consistent: a
//! create returns a `SUBID` long before the instance finishes booting, and
//! start/halt return before the power state changes. The driver here pairs
//! every mutating call with convergence polling so callers get back an
//! instance in the state they asked for, or a typed error that still
//! carries the instance id.
//!
//! # Layout
//!
//! - [`transport`] — authenticated HTTP with timeout, classification, and
//!   jittered retries
//! - [`codec`] — v1 field names, form encoding, response decoding
//! - [`provider`] — the lifecycle driver implementing `InstanceProvider`
//!
//! # Example
//!
//! ```ignore
//! use cumulus_cloud::{InstanceProvider, InstanceSpec};
//! use cumulus_cloud_vultr::{VultrConfig, VultrProvider};
//!
//! let provider = VultrProvider::new(VultrConfig::from_env()?)?;
//!
//! let spec = InstanceSpec::new("snapshot-id", "201", "1").with_name("worker-1");
//! let instance = provider.create(&spec).await?;
//! println!("{} is {}", instance.id, instance.status);
//! ```

pub mod codec;
pub mod config;
pub mod provider;
pub mod transport;

pub use config::VultrConfig;
pub use provider::VultrProvider;
