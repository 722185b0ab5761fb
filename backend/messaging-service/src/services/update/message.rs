//! Message, reaction, edit, delete and forward flows for personal and group
//! chats.

use crate::domain::{
    ChatId, Chatter, Deletion, FileMessage, GroupChat, Message, PersonalChat, Reaction,
    TextMessage, TextMessageEdited, UpdateId,
};
use crate::error::{ServiceError, ServiceResult, StorageResultExt};
use crate::external::FileStorage;
use crate::publish::events;
use crate::request::{
    DeleteMessage, DeleteReaction, EditTextMessage, ForwardMessage, SendFileMessage,
    SendReaction, SendTextMessage,
};
use crate::services::ServiceContext;
use crate::storage::{finish_tx, ChatRepository, ChatterRepository, Transaction, UpdateRepository};
use std::sync::Arc;
use tracing::instrument;

pub type PersonalUpdateService = MessageUpdateService<PersonalChat>;
pub type GroupUpdateService = MessageUpdateService<GroupChat>;

pub struct MessageUpdateService<C> {
    ctx: ServiceContext,
    chat_repo: Arc<dyn ChatRepository<C>>,
    chatter_repo: Arc<dyn ChatterRepository>,
    update_repo: Arc<dyn UpdateRepository>,
    file_storage: Arc<dyn FileStorage>,
}

impl<C> MessageUpdateService<C>
where
    C: Chatter + Send + Sync + 'static,
{
    pub fn new(
        ctx: ServiceContext,
        chat_repo: Arc<dyn ChatRepository<C>>,
        chatter_repo: Arc<dyn ChatterRepository>,
        update_repo: Arc<dyn UpdateRepository>,
        file_storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            ctx,
            chat_repo,
            chatter_repo,
            update_repo,
            file_storage,
        }
    }

    async fn find_chat(&self, tx: &mut dyn Transaction, id: ChatId) -> ServiceResult<C> {
        self.chat_repo
            .find_by_id(tx, id)
            .await
            .or_not_found(ServiceError::ChatNotFound)
    }

    async fn find_reply(
        &self,
        tx: &mut dyn Transaction,
        chat: &C,
        reply_to: Option<UpdateId>,
    ) -> ServiceResult<Option<Message>> {
        match reply_to {
            Some(id) => self
                .update_repo
                .find_message(tx, chat.chat_id(), id)
                .await
                .or_not_found(ServiceError::MessageNotFound)
                .map(Some),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id))]
    pub async fn send_text_message(&self, req: SendTextMessage) -> ServiceResult<TextMessage> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.find_chat(tx.as_mut(), req.chat_id).await?;
            let reply = self.find_reply(tx.as_mut(), &chat, req.reply_to_message).await?;

            let mut msg = TextMessage::new(
                &chat,
                req.sender_id,
                &req.text,
                reply.as_ref(),
                self.ctx.clock.as_ref(),
            )?;
            self.update_repo
                .create_text_message(tx.as_mut(), &mut msg)
                .await?;
            Ok::<_, ServiceError>((chat, msg))
        }
        .await;
        let (chat, msg) = finish_tx(tx, outcome).await?;

        tracing::info!(update_id = %msg.base.id, "text message sent");
        self.ctx
            .publish(chat.members(), req.sender_id, events::text_message_sent(&msg))
            .await;
        Ok(msg)
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id, message_id = %req.message_id))]
    pub async fn edit_text_message(&self, req: EditTextMessage) -> ServiceResult<TextMessageEdited> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.find_chat(tx.as_mut(), req.chat_id).await?;
            let mut msg = self
                .update_repo
                .find_text_message(tx.as_mut(), req.chat_id, req.message_id)
                .await
                .or_not_found(ServiceError::MessageNotFound)?;

            let mut edited = msg.edit(&chat, req.sender_id, &req.new_text, self.ctx.clock.as_ref())?;
            self.update_repo
                .create_text_message_edited(tx.as_mut(), &mut edited)
                .await?;
            msg.edited = Some(edited.clone());
            self.update_repo.update_text_message(tx.as_mut(), &msg).await?;
            Ok::<_, ServiceError>((chat, edited))
        }
        .await;
        let (chat, edited) = finish_tx(tx, outcome).await?;

        tracing::info!(update_id = %edited.base.id, "text message edited");
        self.ctx
            .publish(chat.members(), req.sender_id, events::text_message_edited(&edited))
            .await;
        Ok(edited)
    }

    /// Both modes fan out to every other member; readers other than the actor
    /// drop a `ForSender` record through `AnyUpdate::visible_to`.
    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id, message_id = %req.message_id))]
    pub async fn delete_message(&self, req: DeleteMessage) -> ServiceResult<Deletion> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.find_chat(tx.as_mut(), req.chat_id).await?;
            let msg = self
                .update_repo
                .find_message(tx.as_mut(), req.chat_id, req.message_id)
                .await
                .or_not_found(ServiceError::MessageNotFound)?;

            let mut deletion = msg.delete(&chat, req.sender_id, req.mode, self.ctx.clock.as_ref())?;
            self.update_repo
                .create_update_deleted(tx.as_mut(), &mut deletion)
                .await?;
            Ok::<_, ServiceError>((chat, deletion))
        }
        .await;
        let (chat, deletion) = finish_tx(tx, outcome).await?;

        tracing::info!(update_id = %deletion.base.id, mode = deletion.mode.as_str(), "message deleted");
        self.ctx
            .publish(chat.members(), req.sender_id, events::update_deleted(&deletion))
            .await;
        Ok(deletion)
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id, message_id = %req.message_id))]
    pub async fn send_reaction(&self, req: SendReaction) -> ServiceResult<Reaction> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.find_chat(tx.as_mut(), req.chat_id).await?;
            let target = self
                .update_repo
                .find_message(tx.as_mut(), req.chat_id, req.message_id)
                .await
                .or_not_found(ServiceError::MessageNotFound)?;

            let mut reaction = Reaction::new(
                &chat,
                req.sender_id,
                &target,
                &req.reaction_type,
                self.ctx.clock.as_ref(),
            )?;
            self.update_repo
                .create_reaction(tx.as_mut(), &mut reaction)
                .await?;
            Ok::<_, ServiceError>((chat, reaction))
        }
        .await;
        let (chat, reaction) = finish_tx(tx, outcome).await?;

        tracing::info!(update_id = %reaction.base.id, reaction = %reaction.reaction_type, "reaction sent");
        self.ctx
            .publish(chat.members(), req.sender_id, events::reaction_sent(&reaction))
            .await;
        Ok(reaction)
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id, reaction_id = %req.reaction_id))]
    pub async fn delete_reaction(&self, req: DeleteReaction) -> ServiceResult<Deletion> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.find_chat(tx.as_mut(), req.chat_id).await?;
            let reaction = self
                .update_repo
                .find_reaction(tx.as_mut(), req.chat_id, req.reaction_id)
                .await
                .or_not_found(ServiceError::ReactionNotFound)?;

            let mut deletion = reaction.delete(&chat, req.sender_id, self.ctx.clock.as_ref())?;
            self.update_repo
                .create_update_deleted(tx.as_mut(), &mut deletion)
                .await?;
            Ok::<_, ServiceError>((chat, deletion))
        }
        .await;
        let (chat, deletion) = finish_tx(tx, outcome).await?;

        tracing::info!(update_id = %deletion.base.id, "reaction deleted");
        self.ctx
            .publish(chat.members(), req.sender_id, events::update_deleted(&deletion))
            .await;
        Ok(deletion)
    }

    #[instrument(skip(self, req), fields(from_chat_id = %req.from_chat_id, to_chat_id = %req.to_chat_id, sender_id = %req.sender_id))]
    pub async fn forward_text_message(&self, req: ForwardMessage) -> ServiceResult<TextMessage> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let source = self
                .chatter_repo
                .find_chatter(tx.as_mut(), req.from_chat_id)
                .await
                .or_not_found(ServiceError::ChatNotFound)?;
            let dest = self.find_chat(tx.as_mut(), req.to_chat_id).await?;
            let msg = self
                .update_repo
                .find_text_message(tx.as_mut(), req.from_chat_id, req.message_id)
                .await
                .or_not_found(ServiceError::MessageNotFound)?;

            let mut forwarded = msg.forward(&source, &dest, req.sender_id, self.ctx.clock.as_ref())?;
            self.update_repo
                .create_text_message(tx.as_mut(), &mut forwarded)
                .await?;
            Ok::<_, ServiceError>((dest, forwarded))
        }
        .await;
        let (dest, forwarded) = finish_tx(tx, outcome).await?;

        tracing::info!(update_id = %forwarded.base.id, "text message forwarded");
        self.ctx
            .publish(dest.members(), req.sender_id, events::text_message_sent(&forwarded))
            .await;
        Ok(forwarded)
    }

    #[instrument(skip(self, req), fields(from_chat_id = %req.from_chat_id, to_chat_id = %req.to_chat_id, sender_id = %req.sender_id))]
    pub async fn forward_file_message(&self, req: ForwardMessage) -> ServiceResult<FileMessage> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let source = self
                .chatter_repo
                .find_chatter(tx.as_mut(), req.from_chat_id)
                .await
                .or_not_found(ServiceError::ChatNotFound)?;
            let dest = self.find_chat(tx.as_mut(), req.to_chat_id).await?;
            let msg = self
                .update_repo
                .find_file_message(tx.as_mut(), req.from_chat_id, req.message_id)
                .await
                .or_not_found(ServiceError::MessageNotFound)?;

            let mut forwarded = msg.forward(&source, &dest, req.sender_id, self.ctx.clock.as_ref())?;
            self.update_repo
                .create_file_message(tx.as_mut(), &mut forwarded)
                .await?;
            Ok::<_, ServiceError>((dest, forwarded))
        }
        .await;
        let (dest, forwarded) = finish_tx(tx, outcome).await?;

        tracing::info!(update_id = %forwarded.base.id, "file message forwarded");
        self.ctx
            .publish(dest.members(), req.sender_id, events::file_message_sent(&forwarded))
            .await;
        Ok(forwarded)
    }

    /// File metadata is resolved before the transaction starts.
    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id, file_id = %req.file_id))]
    pub async fn send_file_message(&self, req: SendFileMessage) -> ServiceResult<FileMessage> {
        let file = self.file_storage.get_by_id(req.file_id).await?;

        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.find_chat(tx.as_mut(), req.chat_id).await?;
            let reply = self.find_reply(tx.as_mut(), &chat, req.reply_to_message).await?;

            let mut msg = FileMessage::new(
                &chat,
                req.sender_id,
                file,
                reply.as_ref(),
                self.ctx.clock.as_ref(),
            )?;
            self.update_repo
                .create_file_message(tx.as_mut(), &mut msg)
                .await?;
            Ok::<_, ServiceError>((chat, msg))
        }
        .await;
        let (chat, msg) = finish_tx(tx, outcome).await?;

        tracing::info!(update_id = %msg.base.id, file_size = msg.file.file_size, "file message sent");
        self.ctx
            .publish(chat.members(), req.sender_id, events::file_message_sent(&msg))
            .await;
        Ok(msg)
    }
}
