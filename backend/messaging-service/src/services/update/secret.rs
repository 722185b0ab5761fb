use crate::domain::{
    ChatId, Deletion, SecretChatter, SecretData, SecretGroupChat, SecretPersonalChat,
    SecretUpdate,
};
use crate::error::{ServiceError, ServiceResult, StorageResultExt};
use crate::publish::events;
use crate::request::{DeleteSecretUpdate, SendSecretUpdate};
use crate::services::ServiceContext;
use crate::storage::{finish_tx, ChatRepository, SecretUpdateRepository, Transaction};
use std::sync::Arc;
use tracing::instrument;

pub type SecretPersonalUpdateService = SecretUpdateService<SecretPersonalChat>;
pub type SecretGroupUpdateService = SecretUpdateService<SecretGroupChat>;

/// Opaque encrypted updates for secret chats.
pub struct SecretUpdateService<C> {
    ctx: ServiceContext,
    chat_repo: Arc<dyn ChatRepository<C>>,
    update_repo: Arc<dyn SecretUpdateRepository>,
}

impl<C> SecretUpdateService<C>
where
    C: SecretChatter + Send + Sync + 'static,
{
    pub fn new(
        ctx: ServiceContext,
        chat_repo: Arc<dyn ChatRepository<C>>,
        update_repo: Arc<dyn SecretUpdateRepository>,
    ) -> Self {
        Self {
            ctx,
            chat_repo,
            update_repo,
        }
    }

    async fn find_chat(&self, tx: &mut dyn Transaction, id: ChatId) -> ServiceResult<C> {
        self.chat_repo
            .find_by_id(tx, id)
            .await
            .or_not_found(ServiceError::ChatNotFound)
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id))]
    pub async fn send_secret_update(&self, req: SendSecretUpdate) -> ServiceResult<SecretUpdate> {
        let SendSecretUpdate {
            chat_id,
            sender_id,
            key_id,
            payload,
            initialization_vector,
        } = req;
        let data = SecretData {
            key_id,
            payload,
            initialization_vector,
        };

        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.find_chat(tx.as_mut(), chat_id).await?;
            let mut update = SecretUpdate::new(&chat, sender_id, data, self.ctx.clock.as_ref())?;
            self.update_repo
                .create_secret_update(tx.as_mut(), &mut update)
                .await?;
            Ok::<_, ServiceError>((chat, update))
        }
        .await;
        let (chat, update) = finish_tx(tx, outcome).await?;

        tracing::info!(
            update_id = %update.base.id,
            payload_len = update.data.payload.len(),
            "secret update sent"
        );
        self.ctx
            .publish(chat.members(), sender_id, events::secret_update_sent(&update))
            .await;
        Ok(update)
    }

    /// Fans out to every other member in both modes, like `delete_message`.
    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id, secret_update_id = %req.secret_update_id))]
    pub async fn delete_secret_update(&self, req: DeleteSecretUpdate) -> ServiceResult<Deletion> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.find_chat(tx.as_mut(), req.chat_id).await?;
            let update = self
                .update_repo
                .find_secret_update(tx.as_mut(), req.chat_id, req.secret_update_id)
                .await
                .or_not_found(ServiceError::SecretUpdateNotFound)?;

            let mut deletion =
                update
                    .base
                    .delete(&chat, req.sender_id, req.mode, self.ctx.clock.as_ref())?;
            self.update_repo
                .create_update_deleted(tx.as_mut(), &mut deletion)
                .await?;
            Ok::<_, ServiceError>((chat, deletion))
        }
        .await;
        let (chat, deletion) = finish_tx(tx, outcome).await?;

        tracing::info!(update_id = %deletion.base.id, mode = deletion.mode.as_str(), "secret update deleted");
        self.ctx
            .publish(chat.members(), req.sender_id, events::update_deleted(&deletion))
            .await;
        Ok(deletion)
    }
}
