use super::{EventPublisher, PublishError};
use crate::domain::UserId;
use async_trait::async_trait;
use event_schema::{FanoutMessage, MessagingEvent};
use tokio::sync::mpsc;

/// Publisher that hands envelopes to an in-process consumer.
pub struct ChannelPublisher {
    source: String,
    tx: mpsc::UnboundedSender<FanoutMessage>,
}

impl ChannelPublisher {
    pub fn new(source: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<FanoutMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                source: source.into(),
                tx,
            },
            rx,
        )
    }
}

#[async_trait]
impl EventPublisher for ChannelPublisher {
    async fn publish_for_users(
        &self,
        users: &[UserId],
        event: MessagingEvent,
    ) -> Result<(), PublishError> {
        if users.is_empty() {
            return Ok(());
        }
        let receivers = users.iter().map(|u| u.as_uuid()).collect();
        let message = FanoutMessage::new(self.source.clone(), receivers, event);
        tracing::debug!(
            event_type = message.envelope.data.event_type(),
            event_id = %message.envelope.event_id,
            receivers = users.len(),
            "publishing event"
        );
        self.tx.send(message).map_err(|_| PublishError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn event() -> MessagingEvent {
        MessagingEvent::ChatDeleted {
            chat_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn wraps_event_in_envelope() {
        let (publisher, mut rx) = ChannelPublisher::new("messaging-service");
        let user = UserId::new();

        publisher.publish_for_users(&[user], event()).await.unwrap();

        let message = rx.recv().await.unwrap();
        assert_eq!(message.receivers, vec![user.as_uuid()]);
        assert_eq!(message.envelope.source, "messaging-service");
        assert_eq!(message.envelope.data.event_type(), "chat_deleted");
    }

    #[tokio::test]
    async fn empty_audience_is_a_no_op() {
        let (publisher, mut rx) = ChannelPublisher::new("messaging-service");
        publisher.publish_for_users(&[], event()).await.unwrap();
        drop(publisher);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_consumer_is_reported() {
        let (publisher, rx) = ChannelPublisher::new("messaging-service");
        drop(rx);
        assert_eq!(
            publisher.publish_for_users(&[UserId::new()], event()).await,
            Err(PublishError::Closed)
        );
    }
}
