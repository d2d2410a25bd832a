//! Redis-backed work queue and event notifier.
//!
//! This crate provides:
//! - [`WorkQueue`], a Redis Streams consumer group with claim-by-delete
//! - [`RedisNotifier`], JSON completion/failure events over Pub/Sub
//! - The [`QueueGateway`] and [`Notifier`] capabilities used by the worker

pub mod error;
pub mod gateway;
pub mod notify;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use gateway::QueueGateway;
pub use notify::{Notifier, NotifierConfig, RedisNotifier};
pub use queue::{QueueConfig, WorkQueue};
