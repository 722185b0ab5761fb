use crate::domain::{Clock, UserId};
use crate::error::ServiceResult;
use crate::publish::EventPublisher;
use crate::storage::{Transaction, TransactionProvider};
use event_schema::MessagingEvent;
use std::sync::Arc;

/// Collaborators every orchestration service needs.
#[derive(Clone)]
pub struct ServiceContext {
    pub tx_provider: Arc<dyn TransactionProvider>,
    pub publisher: Arc<dyn EventPublisher>,
    pub clock: Arc<dyn Clock>,
}

impl ServiceContext {
    pub fn new(
        tx_provider: Arc<dyn TransactionProvider>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tx_provider,
            publisher,
            clock,
        }
    }

    pub async fn begin(&self) -> ServiceResult<Box<dyn Transaction>> {
        Ok(self.tx_provider.begin().await?)
    }

    /// Publishes to every member except `sender`. Runs after commit; a
    /// failure is logged and swallowed because the write already happened.
    pub async fn publish(&self, members: &[UserId], sender: UserId, event: MessagingEvent) {
        let receivers = audience(members, sender);
        self.publish_to(&receivers, event).await;
    }

    pub async fn publish_to(&self, receivers: &[UserId], event: MessagingEvent) {
        let event_type = event.event_type();
        let chat_id = event.chat_id();
        if let Err(e) = self.publisher.publish_for_users(receivers, event).await {
            tracing::warn!(
                error = %e,
                event_type,
                chat_id = %chat_id,
                "failed to publish event after commit"
            );
        }
    }
}

pub fn audience(members: &[UserId], sender: UserId) -> Vec<UserId> {
    members.iter().copied().filter(|m| *m != sender).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audience_excludes_sender_only() {
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        assert_eq!(audience(&[a, b, c], b), vec![a, c]);
        assert_eq!(audience(&[a], a), Vec::<UserId>::new());
    }
}
