//! Cumulus Cloud Instances
//!
//! This crate provides the provider abstraction for Cumulus instance
//! management: a normalized instance model, a typed error vocabulary, and a
//! convergence poller that waits for a remote instance to reach a target
//! state.
//!
//! Cloud provider APIs are asynchronous and eventually consistent: a create
//! call returns before the instance boots, a halt call returns before it
//! powers down. The pieces in this crate let a provider adapter turn those
//! fire-and-forget calls into operations that either converge or fail with
//! a typed, actionable error.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    Caller                        │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                cumulus-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        Provider Abstraction               │   │
//! │  │  trait InstanceProvider { ... }           │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │   Poller     │  │  Error model │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │     vultr     │
//! │   provider    │
//! └───────────────┘
//! ```

pub mod error;
pub mod instance;
pub mod poll;
pub mod provider;

// Re-exports
pub use error::{CloudError, Result};
pub use instance::{Instance, InstanceSpec, InstanceStatus, LifecycleRequest};
pub use poll::{PollSpec, jittered, poll_until};
pub use provider::{InstanceProvider, RetryConfig};
