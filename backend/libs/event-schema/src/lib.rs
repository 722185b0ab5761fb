//! Event Schema Registry for messaging fan-out topics
//!
//! Defines the versioned envelope and the event payloads published after a
//! committed chat or update write. Each event has a required `schema_version`
//! field so consumers (presence hub, notification service) can evolve
//! independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Messaging events enumeration
pub mod events;

// Re-export commonly used types
pub use events::{FileInfo, MessagingEvent};

/// Current schema version for all events
pub const SCHEMA_VERSION: u32 = 1;

/// Base event envelope for all fan-out messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Unique event ID for idempotency and tracing
    pub event_id: Uuid,
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Schema version for compatibility checking
    pub schema_version: u32,
    /// Source service that generated the event
    pub source: String,
    /// Correlation ID for distributed tracing
    pub correlation_id: Option<Uuid>,
    /// Actual event payload
    pub data: T,
}

impl<T> EventEnvelope<T> {
    pub fn new(source: impl Into<String>, data: T) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            schema_version: SCHEMA_VERSION,
            source: source.into(),
            correlation_id: None,
            data,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// An envelope addressed to the users who should receive it.
///
/// The bus delivers `envelope` once per receiver; ordering and retries are the
/// bus's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutMessage {
    pub receivers: Vec<Uuid>,
    pub envelope: EventEnvelope<MessagingEvent>,
}

impl FanoutMessage {
    pub fn new(source: impl Into<String>, receivers: Vec<Uuid>, event: MessagingEvent) -> Self {
        Self {
            receivers,
            envelope: EventEnvelope::new(source, event),
        }
    }

    /// Kafka-style routing key; events for one chat stay on one partition.
    pub fn partition_key(&self) -> String {
        self.envelope.data.chat_id().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_schema_version_and_source() {
        let chat_id = Uuid::new_v4();
        let envelope = EventEnvelope::new(
            "messaging-service",
            MessagingEvent::ChatDeleted {
                sender_id: Uuid::new_v4(),
                chat_id,
            },
        );

        assert_eq!(envelope.schema_version, SCHEMA_VERSION);
        assert_eq!(envelope.source, "messaging-service");
        assert!(envelope.correlation_id.is_none());
        assert_eq!(envelope.data.chat_id(), chat_id);
    }

    #[test]
    fn fanout_message_is_keyed_by_chat() {
        let chat_id = Uuid::new_v4();
        let correlation = Uuid::new_v4();
        let mut message = FanoutMessage::new(
            "messaging-service",
            vec![Uuid::new_v4()],
            MessagingEvent::ChatBlocked {
                sender_id: Uuid::new_v4(),
                chat_id,
            },
        );
        message.envelope = message.envelope.with_correlation_id(correlation);

        assert_eq!(message.partition_key(), chat_id.to_string());
        assert_eq!(message.envelope.correlation_id, Some(correlation));
    }
}
