//! Lifecycle and administration of group chats.

use crate::domain::{
    ChatId, Chatter, DomainError, FileMeta, GroupChat, GroupChatter, SecretGroupChat, UserId,
};
use crate::error::{ServiceError, ServiceResult, StorageResultExt};
use crate::external::FileStorage;
use crate::publish::events;
use crate::request::{ChatAction, CreateGroup, GroupMember, SetExpiration, UpdateGroupInfo, UpdateGroupPhoto};
use crate::services::ServiceContext;
use crate::storage::{finish_tx, ChatRepository, Transaction};
use std::sync::Arc;
use tracing::instrument;

/// Upper bound for a group photo, in bytes.
pub const MAX_GROUP_PHOTO_SIZE: u64 = 2 << 20;

pub const GROUP_PHOTO_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/heif",
    "image/heic",
];

pub type GroupChatService = GroupService<GroupChat>;
pub type SecretGroupChatService = GroupService<SecretGroupChat>;

pub struct GroupService<G> {
    ctx: ServiceContext,
    chat_repo: Arc<dyn ChatRepository<G>>,
    file_storage: Arc<dyn FileStorage>,
}

impl<G> GroupService<G>
where
    G: GroupChatter + Send + Sync + 'static,
{
    pub fn new(
        ctx: ServiceContext,
        chat_repo: Arc<dyn ChatRepository<G>>,
        file_storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            ctx,
            chat_repo,
            file_storage,
        }
    }

    async fn find_chat(&self, tx: &mut dyn Transaction, id: ChatId) -> ServiceResult<G> {
        self.chat_repo
            .find_by_id(tx, id)
            .await
            .or_not_found(ServiceError::ChatNotFound)
    }

    /// Loads the group, applies `mutate` and stores it. Returns the stored
    /// group together with its members from before the change.
    async fn modify<F>(&self, chat_id: ChatId, mutate: F) -> ServiceResult<(G, Vec<UserId>)>
    where
        F: FnOnce(&mut G) -> Result<(), DomainError> + Send,
    {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let mut chat = self.find_chat(tx.as_mut(), chat_id).await?;
            let before = chat.members().to_vec();
            mutate(&mut chat)?;
            self.chat_repo.update(tx.as_mut(), &mut chat).await?;
            Ok::<_, ServiceError>((chat, before))
        }
        .await;
        finish_tx(tx, outcome).await
    }

    /// `sender` becomes the admin and must be listed in `members`.
    #[instrument(skip(self, req), fields(sender_id = %req.sender_id, members = req.members.len()))]
    pub async fn create_group(&self, req: CreateGroup) -> ServiceResult<G> {
        let chat = G::new_group(
            self.ctx.clock.as_ref(),
            req.sender_id,
            req.members,
            &req.name,
        )?;

        let mut tx = self.ctx.begin().await?;
        let outcome = self
            .chat_repo
            .create(tx.as_mut(), &chat)
            .await
            .map_err(ServiceError::from);
        finish_tx(tx, outcome).await?;

        tracing::info!(chat_id = %chat.chat_id(), chat_type = %chat.chat_type(), "group created");
        self.ctx
            .publish(chat.members(), req.sender_id, events::chat_created(&chat, req.sender_id))
            .await;
        Ok(chat)
    }

    #[instrument(skip(self))]
    pub async fn get_group(&self, sender: UserId, chat_id: ChatId) -> ServiceResult<G> {
        let mut tx = self.ctx.begin().await?;
        let outcome = self.find_chat(tx.as_mut(), chat_id).await;
        let chat = finish_tx(tx, outcome).await?;
        if !chat.is_member(sender) {
            return Err(DomainError::UserNotMember.into());
        }
        Ok(chat)
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id))]
    pub async fn update_group_info(&self, req: UpdateGroupInfo) -> ServiceResult<G> {
        let (chat, _) = self
            .modify(req.chat_id, |chat| {
                chat.update_info(req.sender_id, &req.name, &req.description)
            })
            .await?;

        tracing::info!("group info updated");
        self.ctx
            .publish(
                chat.members(),
                req.sender_id,
                events::group_info_updated(&chat, req.sender_id),
            )
            .await;
        Ok(chat)
    }

    /// The photo must be a supported image no larger than
    /// [`MAX_GROUP_PHOTO_SIZE`].
    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id, file_id = %req.file_id))]
    pub async fn update_group_photo(&self, req: UpdateGroupPhoto) -> ServiceResult<G> {
        let file = self.file_storage.get_by_id(req.file_id).await?;
        validate_group_photo(&file)?;

        let (chat, _) = self
            .modify(req.chat_id, |chat| {
                chat.update_photo(req.sender_id, file.file_url.clone())
            })
            .await?;

        tracing::info!(mime_type = %file.mime_type, "group photo updated");
        self.ctx
            .publish(
                chat.members(),
                req.sender_id,
                events::group_info_updated(&chat, req.sender_id),
            )
            .await;
        Ok(chat)
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id))]
    pub async fn delete_group_photo(&self, req: ChatAction) -> ServiceResult<G> {
        let (chat, _) = self
            .modify(req.chat_id, |chat| chat.delete_photo(req.sender_id))
            .await?;

        tracing::info!("group photo deleted");
        self.ctx
            .publish(
                chat.members(),
                req.sender_id,
                events::group_info_updated(&chat, req.sender_id),
            )
            .await;
        Ok(chat)
    }

    /// The new member is told as well, since the event carries the updated
    /// member list.
    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id, member_id = %req.member_id))]
    pub async fn add_member(&self, req: GroupMember) -> ServiceResult<G> {
        let (chat, _) = self
            .modify(req.chat_id, |chat| chat.add_member(req.sender_id, req.member_id))
            .await?;

        tracing::info!("group member added");
        self.ctx
            .publish(
                chat.members(),
                req.sender_id,
                events::group_members_added(req.chat_id, req.sender_id, &[req.member_id]),
            )
            .await;
        Ok(chat)
    }

    /// The removed member is still part of the audience.
    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id, member_id = %req.member_id))]
    pub async fn delete_member(&self, req: GroupMember) -> ServiceResult<G> {
        let (chat, before) = self
            .modify(req.chat_id, |chat| {
                chat.delete_member(req.sender_id, req.member_id)
            })
            .await?;

        tracing::info!("group member removed");
        self.ctx
            .publish(
                &before,
                req.sender_id,
                events::group_members_removed(req.chat_id, req.sender_id, &[req.member_id]),
            )
            .await;
        Ok(chat)
    }

    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id))]
    pub async fn delete_group(&self, req: ChatAction) -> ServiceResult<()> {
        let mut tx = self.ctx.begin().await?;
        let outcome = async {
            let chat = self.find_chat(tx.as_mut(), req.chat_id).await?;
            GroupChatter::delete(&chat, req.sender_id)?;
            self.chat_repo.delete(tx.as_mut(), req.chat_id).await?;
            Ok::<_, ServiceError>(chat)
        }
        .await;
        let chat = finish_tx(tx, outcome).await?;

        tracing::info!("group deleted");
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

impl GroupService<SecretGroupChat> {
    /// Admin only.
    #[instrument(skip(self, req), fields(chat_id = %req.chat_id, sender_id = %req.sender_id))]
    pub async fn set_expiration(&self, req: SetExpiration) -> ServiceResult<SecretGroupChat> {
        let (chat, _) = self
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

pub fn validate_group_photo(file: &FileMeta) -> ServiceResult<()> {
    if file.file_size > MAX_GROUP_PHOTO_SIZE {
        return Err(ServiceError::InvalidPhoto);
    }
    if !GROUP_PHOTO_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(ServiceError::InvalidPhoto);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FileId, Url};
    use chrono::Utc;

    fn photo(mime_type: &str, file_size: u64) -> FileMeta {
        FileMeta {
            file_id: FileId::new(),
            file_name: "avatar".to_string(),
            mime_type: mime_type.to_string(),
            file_size,
            file_url: Url::new("https://files.local/avatar"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn group_photo_limits() {
        assert!(validate_group_photo(&photo("image/png", 1024)).is_ok());
        assert!(validate_group_photo(&photo("image/heic", MAX_GROUP_PHOTO_SIZE)).is_ok());
        assert!(matches!(
            validate_group_photo(&photo("image/png", MAX_GROUP_PHOTO_SIZE + 1)),
            Err(ServiceError::InvalidPhoto)
        ));
        assert!(matches!(
            validate_group_photo(&photo("application/pdf", 10)),
            Err(ServiceError::InvalidPhoto)
        ));
    }
}
