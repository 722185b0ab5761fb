//! Post-commit fan-out of messaging events.

pub mod channel;
pub mod events;

pub use channel::ChannelPublisher;

use crate::domain::UserId;
use async_trait::async_trait;
use event_schema::MessagingEvent;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("event bus closed")]
    Closed,

    #[error("event bus error: {0}")]
    Bus(String),
}

/// Delivery of one event to a set of users. Retry and ordering belong to the
/// bus behind the implementation.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_for_users(
        &self,
        users: &[UserId],
        event: MessagingEvent,
    ) -> Result<(), PublishError>;
}
