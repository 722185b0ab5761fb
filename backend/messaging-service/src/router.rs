//! Chat-type dispatch. Each call resolves the chat's type, forwards to the
//! service for that type and runs under the configured deadline.

use crate::domain::{
    Chat, ChatId, ChatType, Deletion, FileMessage, PersonalChat, Reaction, SecretUpdate,
    TextMessage, TextMessageEdited, UpdateId, UserId,
};
use crate::error::{ServiceError, ServiceResult, StorageResultExt};
use crate::generic::{GenericChat, GenericUpdate};
use crate::request::{
    ChatAction, CreateGroup, CreatePersonalChat, DeleteMessage, DeleteReaction,
    DeleteSecretUpdate, EditTextMessage, ForwardMessage, GroupMember, SendFileMessage,
    SendReaction, SendSecretUpdate, SendTextMessage, SetExpiration, UpdateGroupInfo,
    UpdateGroupPhoto,
};
use crate::services::{
    ChatLoadOptions, GenericChatService, GenericUpdateService, GroupChatService,
    GroupUpdateService, PersonalChatService, PersonalUpdateService, SecretGroupChatService,
    SecretGroupUpdateService, SecretPersonalChatService, SecretPersonalUpdateService,
};
use crate::storage::{finish_tx, FetchLastOptions, GenericChatRepository, TransactionProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// One service per chat type and concern.
#[derive(Clone)]
pub struct Services {
    pub personal_chats: Arc<PersonalChatService>,
    pub secret_personal_chats: Arc<SecretPersonalChatService>,
    pub groups: Arc<GroupChatService>,
    pub secret_groups: Arc<SecretGroupChatService>,
    pub personal_updates: Arc<PersonalUpdateService>,
    pub group_updates: Arc<GroupUpdateService>,
    pub secret_personal_updates: Arc<SecretPersonalUpdateService>,
    pub secret_group_updates: Arc<SecretGroupUpdateService>,
    pub generic_chats: Arc<GenericChatService>,
    pub generic_updates: Arc<GenericUpdateService>,
}

#[derive(Clone)]
pub struct MessagingRouter {
    services: Services,
    chats: Arc<dyn GenericChatRepository>,
    tx_provider: Arc<dyn TransactionProvider>,
    timeout: Duration,
}

fn unsupported(chat_type: ChatType, operation: &'static str) -> ServiceError {
    ServiceError::InvalidChatType {
        chat_type: chat_type.to_string(),
        operation,
    }
}

impl MessagingRouter {
    pub fn new(
        services: Services,
        chats: Arc<dyn GenericChatRepository>,
        tx_provider: Arc<dyn TransactionProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            services,
            chats,
            tx_provider,
            timeout,
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Runs in its own short transaction, finished before the target service
    /// opens the one doing the work.
    async fn chat_type(&self, chat_id: ChatId, operation: &'static str) -> ServiceResult<ChatType> {
        let mut tx = self.tx_provider.begin().await?;
        let outcome = self
            .chats
            .get_chat_type(tx.as_mut(), chat_id)
            .await
            .or_not_found(ServiceError::ChatNotFound);
        let chat_type = finish_tx(tx, outcome).await?;
        tracing::debug!(%chat_id, %chat_type, operation, "dispatching");
        Ok(chat_type)
    }

    /// Dropping the inner future on expiry rolls back its open transaction.
    async fn with_deadline<T, F>(&self, operation: &'static str, fut: F) -> ServiceResult<T>
    where
        F: Future<Output = ServiceResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "deadline exceeded");
                Err(ServiceError::DeadlineExceeded)
            }
        }
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn send_text_message(&self, req: SendTextMessage) -> ServiceResult<TextMessage> {
        const OP: &str = "send_text_message";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Personal => self.services.personal_updates.send_text_message(req).await,
                ChatType::Group => self.services.group_updates.send_text_message(req).await,
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn edit_text_message(&self, req: EditTextMessage) -> ServiceResult<TextMessageEdited> {
        const OP: &str = "edit_text_message";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Personal => self.services.personal_updates.edit_text_message(req).await,
                ChatType::Group => self.services.group_updates.edit_text_message(req).await,
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn delete_message(&self, req: DeleteMessage) -> ServiceResult<Deletion> {
        const OP: &str = "delete_message";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Personal => self.services.personal_updates.delete_message(req).await,
                ChatType::Group => self.services.group_updates.delete_message(req).await,
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn send_reaction(&self, req: SendReaction) -> ServiceResult<Reaction> {
        const OP: &str = "send_reaction";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Personal => self.services.personal_updates.send_reaction(req).await,
                ChatType::Group => self.services.group_updates.send_reaction(req).await,
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn delete_reaction(&self, req: DeleteReaction) -> ServiceResult<Deletion> {
        const OP: &str = "delete_reaction";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Personal => self.services.personal_updates.delete_reaction(req).await,
                ChatType::Group => self.services.group_updates.delete_reaction(req).await,
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    /// Dispatches on the destination chat.
    #[instrument(skip(self, req), fields(to_chat_id = %req.to_chat_id))]
    pub async fn forward_text_message(&self, req: ForwardMessage) -> ServiceResult<TextMessage> {
        const OP: &str = "forward_text_message";
        self.with_deadline(OP, async {
            match self.chat_type(req.to_chat_id, OP).await? {
                ChatType::Personal => self.services.personal_updates.forward_text_message(req).await,
                ChatType::Group => self.services.group_updates.forward_text_message(req).await,
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    /// Dispatches on the destination chat.
    #[instrument(skip(self, req), fields(to_chat_id = %req.to_chat_id))]
    pub async fn forward_file_message(&self, req: ForwardMessage) -> ServiceResult<FileMessage> {
        const OP: &str = "forward_file_message";
        self.with_deadline(OP, async {
            match self.chat_type(req.to_chat_id, OP).await? {
                ChatType::Personal => self.services.personal_updates.forward_file_message(req).await,
                ChatType::Group => self.services.group_updates.forward_file_message(req).await,
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn send_file_message(&self, req: SendFileMessage) -> ServiceResult<FileMessage> {
        const OP: &str = "send_file_message";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Personal => self.services.personal_updates.send_file_message(req).await,
                ChatType::Group => self.services.group_updates.send_file_message(req).await,
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn send_secret_update(&self, req: SendSecretUpdate) -> ServiceResult<SecretUpdate> {
        const OP: &str = "send_secret_update";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::SecretPersonal => {
                    self.services.secret_personal_updates.send_secret_update(req).await
                }
                ChatType::SecretGroup => {
                    self.services.secret_group_updates.send_secret_update(req).await
                }
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn delete_secret_update(&self, req: DeleteSecretUpdate) -> ServiceResult<Deletion> {
        const OP: &str = "delete_secret_update";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::SecretPersonal => {
                    self.services.secret_personal_updates.delete_secret_update(req).await
                }
                ChatType::SecretGroup => {
                    self.services.secret_group_updates.delete_secret_update(req).await
                }
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    pub async fn create_personal_chat(&self, req: CreatePersonalChat) -> ServiceResult<Chat> {
        self.with_deadline("create_personal_chat", async {
            self.services.personal_chats.create_chat(req).await.map(Chat::from)
        })
        .await
    }

    pub async fn create_secret_personal_chat(&self, req: CreatePersonalChat) -> ServiceResult<Chat> {
        self.with_deadline("create_secret_personal_chat", async {
            self.services
                .secret_personal_chats
                .create_chat(req)
                .await
                .map(Chat::from)
        })
        .await
    }

    pub async fn create_group(&self, req: CreateGroup) -> ServiceResult<Chat> {
        self.with_deadline("create_group", async {
            self.services.groups.create_group(req).await.map(Chat::from)
        })
        .await
    }

    pub async fn create_secret_group(&self, req: CreateGroup) -> ServiceResult<Chat> {
        self.with_deadline("create_secret_group", async {
            self.services.secret_groups.create_group(req).await.map(Chat::from)
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn block_chat(&self, req: ChatAction) -> ServiceResult<PersonalChat> {
        const OP: &str = "block_chat";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Personal => self.services.personal_chats.block_chat(req).await,
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn unblock_chat(&self, req: ChatAction) -> ServiceResult<PersonalChat> {
        const OP: &str = "unblock_chat";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Personal => self.services.personal_chats.unblock_chat(req).await,
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn update_group_info(&self, req: UpdateGroupInfo) -> ServiceResult<Chat> {
        const OP: &str = "update_group_info";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Group => self.services.groups.update_group_info(req).await.map(Chat::from),
                ChatType::SecretGroup => self
                    .services
                    .secret_groups
                    .update_group_info(req)
                    .await
                    .map(Chat::from),
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn update_group_photo(&self, req: UpdateGroupPhoto) -> ServiceResult<Chat> {
        const OP: &str = "update_group_photo";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Group => self.services.groups.update_group_photo(req).await.map(Chat::from),
                ChatType::SecretGroup => self
                    .services
                    .secret_groups
                    .update_group_photo(req)
                    .await
                    .map(Chat::from),
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn delete_group_photo(&self, req: ChatAction) -> ServiceResult<Chat> {
        const OP: &str = "delete_group_photo";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Group => self.services.groups.delete_group_photo(req).await.map(Chat::from),
                ChatType::SecretGroup => self
                    .services
                    .secret_groups
                    .delete_group_photo(req)
                    .await
                    .map(Chat::from),
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn add_member(&self, req: GroupMember) -> ServiceResult<Chat> {
        const OP: &str = "add_member";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Group => self.services.groups.add_member(req).await.map(Chat::from),
                ChatType::SecretGroup => {
                    self.services.secret_groups.add_member(req).await.map(Chat::from)
                }
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn delete_member(&self, req: GroupMember) -> ServiceResult<Chat> {
        const OP: &str = "delete_member";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Group => self.services.groups.delete_member(req).await.map(Chat::from),
                ChatType::SecretGroup => {
                    self.services.secret_groups.delete_member(req).await.map(Chat::from)
                }
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn set_expiration(&self, req: SetExpiration) -> ServiceResult<Chat> {
        const OP: &str = "set_expiration";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::SecretPersonal => self
                    .services
                    .secret_personal_chats
                    .set_expiration(req)
                    .await
                    .map(Chat::from),
                ChatType::SecretGroup => self
                    .services
                    .secret_groups
                    .set_expiration(req)
                    .await
                    .map(Chat::from),
                other => Err(unsupported(other, OP)),
            }
        })
        .await
    }

    /// Works for every chat type; who may delete depends on the type.
    #[instrument(skip(self, req), fields(chat_id = %req.chat_id))]
    pub async fn delete_chat(&self, req: ChatAction) -> ServiceResult<()> {
        const OP: &str = "delete_chat";
        self.with_deadline(OP, async {
            match self.chat_type(req.chat_id, OP).await? {
                ChatType::Personal => self.services.personal_chats.delete_chat(req).await,
                ChatType::SecretPersonal => {
                    self.services.secret_personal_chats.delete_chat(req).await
                }
                ChatType::Group => self.services.groups.delete_group(req).await,
                ChatType::SecretGroup => self.services.secret_groups.delete_group(req).await,
            }
        })
        .await
    }

    pub async fn get_chats(
        &self,
        member: UserId,
        opts: ChatLoadOptions,
    ) -> ServiceResult<Vec<GenericChat>> {
        self.with_deadline(
            "get_chats",
            self.services.generic_chats.get_by_member_id(member, opts),
        )
        .await
    }

    pub async fn get_chat(
        &self,
        sender: UserId,
        chat_id: ChatId,
        opts: ChatLoadOptions,
    ) -> ServiceResult<GenericChat> {
        self.with_deadline(
            "get_chat",
            self.services.generic_chats.get_by_chat_id(sender, chat_id, opts),
        )
        .await
    }

    pub async fn get_updates_range(
        &self,
        sender: UserId,
        chat_id: ChatId,
        from: UpdateId,
        to: UpdateId,
    ) -> ServiceResult<Vec<GenericUpdate>> {
        self.with_deadline(
            "get_updates_range",
            self.services
                .generic_updates
                .get_updates_range(sender, chat_id, from, to),
        )
        .await
    }

    pub async fn get_update(
        &self,
        sender: UserId,
        chat_id: ChatId,
        id: UpdateId,
    ) -> ServiceResult<GenericUpdate> {
        self.with_deadline(
            "get_update",
            self.services.generic_updates.get_update(sender, chat_id, id),
        )
        .await
    }

    pub async fn fetch_last(
        &self,
        sender: UserId,
        chat_id: ChatId,
        opts: FetchLastOptions,
    ) -> ServiceResult<Vec<GenericUpdate>> {
        self.with_deadline(
            "fetch_last",
            self.services.generic_updates.fetch_last(sender, chat_id, opts),
        )
        .await
    }
}
