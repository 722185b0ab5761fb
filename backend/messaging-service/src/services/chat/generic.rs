//! Read-only projection of chats of any type.

use crate::domain::{Chat, ChatId, Chatter, DomainError, UserId};
use crate::error::{ServiceError, ServiceResult, StorageResultExt};
use crate::generic::{GenericChat, GenericUpdate};
use crate::services::update::generic::hide_expired;
use crate::services::ServiceContext;
use crate::storage::{
    finish_tx, FetchLastMode, FetchLastOptions, GenericChatRepository, GenericUpdateRepository,
    StorageError, Transaction,
};
use std::sync::Arc;
use tracing::instrument;

/// What to load next to each chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatLoadOptions {
    pub last_update_id: bool,
    pub preview: bool,
}

pub struct GenericChatService {
    ctx: ServiceContext,
    chat_repo: Arc<dyn GenericChatRepository>,
    update_repo: Arc<dyn GenericUpdateRepository>,
    preview_count: usize,
}

impl GenericChatService {
    pub fn new(
        ctx: ServiceContext,
        chat_repo: Arc<dyn GenericChatRepository>,
        update_repo: Arc<dyn GenericUpdateRepository>,
        preview_count: usize,
    ) -> Self {
        Self {
            ctx,
            chat_repo,
            update_repo,
            preview_count,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_by_member_id(
        &self,
        member: UserId,
        opts: ChatLoadOptions,
    ) -> ServiceResult<Vec<GenericChat>> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chats = self.chat_repo.get_by_member_id(tx.as_mut(), member).await?;
            let mut projected = Vec::with_capacity(chats.len());
            for chat in &chats {
                projected.push(self.project(tx.as_mut(), member, chat, opts).await?);
            }
            Ok::<_, ServiceError>(projected)
        }
        .await;
        let chats = finish_tx(tx, outcome).await?;

        tracing::debug!(count = chats.len(), "loaded member chats");
        Ok(chats)
    }

    #[instrument(skip(self))]
    pub async fn get_by_chat_id(
        &self,
        sender: UserId,
        chat_id: ChatId,
        opts: ChatLoadOptions,
    ) -> ServiceResult<GenericChat> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self
                .chat_repo
                .get_by_chat_id(tx.as_mut(), chat_id)
                .await
                .or_not_found(ServiceError::ChatNotFound)?;
            if !chat.is_member(sender) {
                return Err(DomainError::UserNotMember.into());
            }
            self.project(tx.as_mut(), sender, &chat, opts).await
        }
        .await;
        finish_tx(tx, outcome).await
    }

    async fn project(
        &self,
        tx: &mut dyn Transaction,
        viewer: UserId,
        chat: &Chat,
        opts: ChatLoadOptions,
    ) -> ServiceResult<GenericChat> {
        let mut generic = GenericChat::from(chat);

        if opts.last_update_id {
            generic.last_update_id = match self.update_repo.get_last_update_id(tx, chat.chat_id()).await {
                Ok(id) => Some(id),
                Err(StorageError::NotFound) => None,
                Err(e) => return Err(e.into()),
            };
        }

        if opts.preview {
            // Secret chats hold no plain messages; count every update there.
            let mode = if chat.chat_type().is_secret() {
                FetchLastMode::All
            } else {
                FetchLastMode::Messages
            };
            let fetch = FetchLastOptions::default()
                .with_count(self.preview_count)
                .with_mode(mode);
            let updates = self
                .update_repo
                .fetch_last(tx, viewer, chat.chat_id(), fetch)
                .await?;
            let updates = hide_expired(chat, updates, self.ctx.clock.as_ref());
            generic.update_preview = Some(updates.iter().map(GenericUpdate::from).collect());
        }

        Ok(generic)
    }
}
