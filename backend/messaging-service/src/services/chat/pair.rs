//! Lifecycle of two-member chats.

use crate::domain::{ChatId, Chatter, DomainError, PairChatter, PersonalChat, SecretPersonalChat, UserId};
use crate::error::{ServiceError, ServiceResult, StorageResultExt};
use crate::publish::events;
use crate::request::{ChatAction, CreatePersonalChat, SetExpiration};
use crate::services::ServiceContext;
use crate::storage::{finish_tx, PairChatRepository, StorageError, Transaction};
use std::sync::Arc;
use tracing::instrument;

pub type PersonalChatService = PairChatService<PersonalChat>;
pub type SecretPersonalChatService = PairChatService<SecretPersonalChat>;

pub struct PairChatService<P> {
    ctx: ServiceContext,
    chat_repo: Arc<dyn PairChatRepository<P>>,
}

impl<P> PairChatService<P>
where
    P: PairChatter + Send + Sync + 'static,
{
    pub fn new(ctx: ServiceContext, chat_repo: Arc<dyn PairChatRepository<P>>) -> Self {
        Self { ctx, chat_repo }
    }

    async fn find_chat(&self, tx: &mut dyn Transaction, id: ChatId) -> ServiceResult<P> {
        self.chat_repo
            .find_by_id(tx, id)
            .await
            .or_not_found(ServiceError::ChatNotFound)
    }

    /// Loads the chat, rejects non-members, applies `mutate` and stores the
    /// result.
    async fn modify<F>(&self, chat_id: ChatId, mutate: F) -> ServiceResult<P>
    where
        F: FnOnce(&mut P) -> Result<(), DomainError> + Send,
    {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let mut chat = self.find_chat(tx.as_mut(), chat_id).await?;
            mutate(&mut chat)?;
            self.chat_repo.update(tx.as_mut(), &mut chat).await?;
            Ok::<_, ServiceError>(chat)
        }
        .await;
        finish_tx(tx, outcome).await
    }

    /// Fails with `ChatAlreadyExists` when the two users already share a chat
    /// of this kind.
    #[instrument(skip(self, req), fields(sender_id = %req.sender_id, member_id = %req.member_id))]
    pub async fn create_chat(&self, req: CreatePersonalChat) -> ServiceResult<P> {
        let members = [req.sender_id, req.member_id];
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            match self.chat_repo.find_by_members(tx.as_mut(), members).await {
                Ok(_) => return Err(ServiceError::ChatAlreadyExists),
                Err(StorageError::NotFound) => {}
                Err(e) => return Err(e.into()),
            }
            let chat = P::new_pair(self.ctx.clock.as_ref(), members)?;
            self.chat_repo.create(tx.as_mut(), &chat).await?;
            Ok::<_, ServiceError>(chat)
        }
        .await;
        let chat = finish_tx(tx, outcome).await?;

        tracing::info!(chat_id = %chat.chat_id(), chat_type = %chat.chat_type(), "chat created");
        self.ctx
            .publish(chat.members(), req.sender_id, events::chat_created(&chat, req.sender_id))
            .await;
        Ok(chat)
    }

    #[instrument(skip(self))]
    pub async fn get_chat(&self, sender: UserId, chat_id: ChatId) -> ServiceResult<P> {
        let mut tx = self.ctx.begin().await?;
        let outcome = self.find_chat(tx.as_mut(), chat_id).await;
        let chat = finish_tx(tx, outcome).await?;
        if !chat.is_member(sender) {
            return Err(DomainError::UserNotMember.into());
        }
        Ok(chat)
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id))]
    pub async fn delete_chat(&self, req: ChatAction) -> ServiceResult<()> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.find_chat(tx.as_mut(), req.chat_id).await?;
            chat.delete(req.sender_id)?;
            self.chat_repo.delete(tx.as_mut(), req.chat_id).await?;
            Ok::<_, ServiceError>(chat)
        }
        .await;
        let chat = finish_tx(tx, outcome).await?;

        tracing::info!("chat deleted");
        self.ctx
            .publish(
                chat.members(),
                req.sender_id,
                events::chat_deleted(req.chat_id, req.sender_id),
            )
            .await;
        Ok(())
    }
}

impl PairChatService<PersonalChat> {
    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id))]
    pub async fn block_chat(&self, req: ChatAction) -> ServiceResult<PersonalChat> {
        let chat = self
            .modify(req.chat_id, |chat| chat.block_by(req.sender_id))
            .await?;

        tracing::info!("chat blocked");
        self.ctx
            .publish(
                chat.members(),
                req.sender_id,
                events::chat_blocked(req.chat_id, req.sender_id),
            )
            .await;
        Ok(chat)
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id))]
    pub async fn unblock_chat(&self, req: ChatAction) -> ServiceResult<PersonalChat> {
        let chat = self
            .modify(req.chat_id, |chat| chat.unblock_by(req.sender_id))
            .await?;

        tracing::info!("chat unblocked");
        self.ctx
            .publish(
                chat.members(),
                req.sender_id,
                events::chat_unblocked(req.chat_id, req.sender_id),
            )
            .await;
        Ok(chat)
    }
}

impl PairChatService<SecretPersonalChat> {
    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id))]
    pub async fn set_expiration(&self, req: SetExpiration) -> ServiceResult<SecretPersonalChat> {
        let chat = self
            .modify(req.chat_id, |chat| {
                chat.set_expiration(req.sender_id, req.expiration)
            })
            .await?;

        tracing::info!(expiration = ?req.expiration, "expiration set");
        self.ctx
            .publish(
                chat.members(),
                req.sender_id,
                events::expiration_set(req.chat_id, req.sender_id, req.expiration),
            )
            .await;
        Ok(chat)
    }
}
