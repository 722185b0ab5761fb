//! History reads over any chat type.

use crate::domain::{AnyUpdate, Chat, ChatId, Chatter, Clock, DomainError, UpdateId, UserId};
use crate::error::{ServiceError, ServiceResult, StorageResultExt};
use crate::generic::GenericUpdate;
use crate::services::ServiceContext;
use crate::storage::{
    finish_tx, FetchLastOptions, GenericChatRepository, GenericUpdateRepository, Transaction,
};
use std::sync::Arc;
use tracing::instrument;

pub struct GenericUpdateService {
    ctx: ServiceContext,
    chat_repo: Arc<dyn GenericChatRepository>,
    update_repo: Arc<dyn GenericUpdateRepository>,
    max_range: u64,
}

impl GenericUpdateService {
    pub fn new(
        ctx: ServiceContext,
        chat_repo: Arc<dyn GenericChatRepository>,
        update_repo: Arc<dyn GenericUpdateRepository>,
        max_range: u64,
    ) -> Self {
        Self {
            ctx,
            chat_repo,
            update_repo,
            max_range,
        }
    }

    async fn member_chat(
        &self,
        tx: &mut dyn Transaction,
        sender: UserId,
        chat_id: ChatId,
    ) -> ServiceResult<Chat> {
        let chat = self
            .chat_repo
            .get_by_chat_id(tx, chat_id)
            .await
            .or_not_found(ServiceError::ChatNotFound)?;
        if !chat.is_member(sender) {
            return Err(DomainError::UserNotMember.into());
        }
        Ok(chat)
    }

    /// Updates with ids in `from..=to` that `sender` can see.
    #[instrument(skip(self), fields(chat_id = %chat_id, sender_id = %sender))]
    pub async fn get_updates_range(
        &self,
        sender: UserId,
        chat_id: ChatId,
        from: UpdateId,
        to: UpdateId,
    ) -> ServiceResult<Vec<GenericUpdate>> {
        if from > to {
            return Err(ServiceError::BadRequest(format!(
                "range start {from} is after end {to}"
            )));
        }
        if to.value() - from.value() >= self.max_range {
            return Err(ServiceError::BadRequest(format!(
                "range {from}..={to} exceeds {} updates",
                self.max_range
            )));
        }

        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.member_chat(tx.as_mut(), sender, chat_id).await?;
            let updates = self
                .update_repo
                .get_range(tx.as_mut(), sender, chat_id, from, to)
                .await?;
            Ok::<_, ServiceError>(hide_expired(&chat, updates, self.ctx.clock.as_ref()))
        }
        .await;
        let updates = finish_tx(tx, outcome).await?;

        tracing::debug!(count = updates.len(), "loaded update range");
        Ok(updates.iter().map(GenericUpdate::from).collect())
    }

    #[instrument(skip(self), fields(chat_id = %chat_id, sender_id = %sender, update_id = %id))]
    pub async fn get_update(
        &self,
        sender: UserId,
        chat_id: ChatId,
        id: UpdateId,
    ) -> ServiceResult<GenericUpdate> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.member_chat(tx.as_mut(), sender, chat_id).await?;
            let update = self
                .update_repo
                .get(tx.as_mut(), sender, chat_id, id)
                .await
                .or_not_found(ServiceError::UpdateNotFound)?;
            hide_expired(&chat, vec![update], self.ctx.clock.as_ref())
                .pop()
                .ok_or(ServiceError::UpdateNotFound)
        }
        .await;
        let update = finish_tx(tx, outcome).await?;
        Ok(GenericUpdate::from(&update))
    }

    /// Latest updates, oldest first; see [`FetchLastOptions`] for what counts.
    #[instrument(skip(self), fields(chat_id = %chat_id, sender_id = %sender))]
    pub async fn fetch_last(
        &self,
        sender: UserId,
        chat_id: ChatId,
        opts: FetchLastOptions,
    ) -> ServiceResult<Vec<GenericUpdate>> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.member_chat(tx.as_mut(), sender, chat_id).await?;
            let updates = self
                .update_repo
                .fetch_last(tx.as_mut(), sender, chat_id, opts)
                .await?;
            Ok::<_, ServiceError>(hide_expired(&chat, updates, self.ctx.clock.as_ref()))
        }
        .await;
        let updates = finish_tx(tx, outcome).await?;
        Ok(updates.iter().map(GenericUpdate::from).collect())
    }
}

/// Drops secret updates whose chat expiration has elapsed. Storage keeps them.
pub(crate) fn hide_expired(chat: &Chat, updates: Vec<AnyUpdate>, clock: &dyn Clock) -> Vec<AnyUpdate> {
    let Some(expiration) = chat.expiration() else {
        return updates;
    };
    updates
        .into_iter()
        .filter(|update| match update {
            AnyUpdate::SecretUpdate(secret) => !secret.expired(expiration, clock),
            _ => true,
        })
        .collect()
}
