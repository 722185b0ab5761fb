use super::{StorageError, Transaction};
use crate::domain::{
    AnyUpdate, Chat, ChatId, Deletion, FileMessage, Message, Reaction, SecretUpdate, TextMessage,
    TextMessageEdited, UpdateId, UserId,
};
use async_trait::async_trait;

/// Aggregate repository for one chat variant.
///
/// Personal, group, secret personal and secret group chats each get their own
/// instance of this trait.
#[async_trait]
pub trait ChatRepository<C>: Send + Sync
where
    C: Send + Sync + 'static,
{
    /// Returns [`StorageError::NotFound`] if no chat of this variant has `id`.
    async fn find_by_id(&self, tx: &mut dyn Transaction, id: ChatId) -> Result<C, StorageError>;

    async fn create(&self, tx: &mut dyn Transaction, chat: &C) -> Result<(), StorageError>;

    /// Rejects the write with [`StorageError::VersionConflict`] if the stored
    /// version differs from `chat`'s, then bumps the version on both sides.
    async fn update(&self, tx: &mut dyn Transaction, chat: &mut C) -> Result<(), StorageError>;

    /// Removes the chat and its update log.
    async fn delete(&self, tx: &mut dyn Transaction, id: ChatId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait PairChatRepository<C>: ChatRepository<C>
where
    C: Send + Sync + 'static,
{
    /// Member order does not matter.
    async fn find_by_members(
        &self,
        tx: &mut dyn Transaction,
        members: [UserId; 2],
    ) -> Result<C, StorageError>;
}

/// Loads any chat when the variant is not known up front.
#[async_trait]
pub trait ChatterRepository: Send + Sync {
    async fn find_chatter(&self, tx: &mut dyn Transaction, id: ChatId)
        -> Result<Chat, StorageError>;
}

/// Message, reaction and edit log of non-secret chats.
///
/// Every lookup is scoped to `chat_id`; creates assign the next update id of
/// that chat.
#[async_trait]
pub trait UpdateRepository: Send + Sync {
    async fn find_message(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<Message, StorageError>;

    async fn find_text_message(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<TextMessage, StorageError>;

    async fn find_file_message(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<FileMessage, StorageError>;

    async fn find_reaction(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<Reaction, StorageError>;

    async fn create_text_message(
        &self,
        tx: &mut dyn Transaction,
        message: &mut TextMessage,
    ) -> Result<(), StorageError>;

    async fn update_text_message(
        &self,
        tx: &mut dyn Transaction,
        message: &TextMessage,
    ) -> Result<(), StorageError>;

    async fn create_text_message_edited(
        &self,
        tx: &mut dyn Transaction,
        edited: &mut TextMessageEdited,
    ) -> Result<(), StorageError>;

    async fn create_file_message(
        &self,
        tx: &mut dyn Transaction,
        message: &mut FileMessage,
    ) -> Result<(), StorageError>;

    async fn create_reaction(
        &self,
        tx: &mut dyn Transaction,
        reaction: &mut Reaction,
    ) -> Result<(), StorageError>;

    /// Records the deletion and appends it to the deleted update's log.
    async fn create_update_deleted(
        &self,
        tx: &mut dyn Transaction,
        deletion: &mut Deletion,
    ) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SecretUpdateRepository: Send + Sync {
    async fn find_secret_update(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<SecretUpdate, StorageError>;

    async fn create_secret_update(
        &self,
        tx: &mut dyn Transaction,
        update: &mut SecretUpdate,
    ) -> Result<(), StorageError>;

    /// Records the deletion and appends it to the deleted update's log.
    async fn create_update_deleted(
        &self,
        tx: &mut dyn Transaction,
        deletion: &mut Deletion,
    ) -> Result<(), StorageError>;
}

#[async_trait]
pub trait GenericChatRepository: Send + Sync {
    /// Empty when the user has no chats.
    async fn get_by_member_id(
        &self,
        tx: &mut dyn Transaction,
        member: UserId,
    ) -> Result<Vec<Chat>, StorageError>;

    async fn get_by_chat_id(&self, tx: &mut dyn Transaction, id: ChatId)
        -> Result<Chat, StorageError>;

    async fn get_chat_type(
        &self,
        tx: &mut dyn Transaction,
        id: ChatId,
    ) -> Result<crate::domain::ChatType, StorageError>;
}

/// Which updates count towards [`FetchLastOptions::count`]. Uncounted updates
/// inside the fetched window are returned as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchLastMode {
    #[default]
    Messages,
    MessagesReactions,
    All,
}

impl FetchLastMode {
    pub fn counts(&self, update: &AnyUpdate) -> bool {
        match self {
            FetchLastMode::Messages => update.is_message(),
            FetchLastMode::MessagesReactions => {
                update.is_message() || matches!(update, AnyUpdate::Reaction(_))
            }
            FetchLastMode::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLastOptions {
    pub mode: FetchLastMode,
    pub count: usize,
}

impl Default for FetchLastOptions {
    fn default() -> Self {
        Self {
            mode: FetchLastMode::Messages,
            count: 5,
        }
    }
}

impl FetchLastOptions {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_mode(mut self, mode: FetchLastMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Read side of the update log. Results only contain updates visible to
/// `viewer`, in ascending id order.
#[async_trait]
pub trait GenericUpdateRepository: Send + Sync {
    /// [`StorageError::NotFound`] if the chat has no updates yet.
    async fn get_last_update_id(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
    ) -> Result<UpdateId, StorageError>;

    /// Inclusive on both ends.
    async fn get_range(
        &self,
        tx: &mut dyn Transaction,
        viewer: UserId,
        chat_id: ChatId,
        from: UpdateId,
        to: UpdateId,
    ) -> Result<Vec<AnyUpdate>, StorageError>;

    async fn get(
        &self,
        tx: &mut dyn Transaction,
        viewer: UserId,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<AnyUpdate, StorageError>;

    async fn fetch_last(
        &self,
        tx: &mut dyn Transaction,
        viewer: UserId,
        chat_id: ChatId,
        opts: FetchLastOptions,
    ) -> Result<Vec<AnyUpdate>, StorageError>;
}
