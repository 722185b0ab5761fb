//! Updates: the ordered content log of a chat.

mod file;
mod reaction;
mod secret;
mod text;

pub use file::{FileMessage, FileMeta, MAX_FILE_SIZE};
pub use reaction::{Reaction, ReactionType, ALLOWED_REACTION_TYPES};
pub use secret::{SecretData, SecretUpdate};
pub use text::{TextMessage, TextMessageEdited, MAX_TEXT_RUNES};

use super::{ChatId, Chatter, Clock, DomainError, Timestamp, UpdateId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header shared by every update plus its append-only deletion log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBase {
    /// Assigned by storage on create.
    pub id: UpdateId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub created_at: Timestamp,
    pub deletions: Vec<Deletion>,
}

impl UpdateBase {
    pub fn new(chat_id: ChatId, sender_id: UserId, clock: &dyn Clock) -> Self {
        Self {
            id: UpdateId::UNASSIGNED,
            chat_id,
            sender_id,
            created_at: clock.now(),
            deletions: Vec::new(),
        }
    }

    /// Hidden from `user` if deleted for everyone or deleted by `user` for themselves.
    pub fn deleted_for(&self, user: UserId) -> bool {
        self.deletions.iter().any(|d| match d.mode {
            DeleteMode::ForAll => true,
            DeleteMode::ForSender => d.base.sender_id == user,
        })
    }

    /// Appends unconditionally; earlier records are never dropped.
    pub fn add_deletion(&mut self, deletion: Deletion) {
        self.deletions.push(deletion);
    }

    /// Builds a deletion record for this update.
    ///
    /// `ForAll` is reserved for the update's author.
    pub fn delete(
        &self,
        chat: &dyn Chatter,
        sender: UserId,
        mode: DeleteMode,
        clock: &dyn Clock,
    ) -> Result<Deletion, DomainError> {
        chat.validate_can_send(sender)?;
        self.ensure_from_chat(chat)?;
        if self.deleted_for(sender) {
            return Err(DomainError::UpdateDeleted);
        }
        if mode == DeleteMode::ForAll && self.sender_id != sender {
            return Err(DomainError::UserNotSender);
        }
        Ok(Deletion::new(self, sender, mode, clock))
    }

    pub(crate) fn ensure_from_chat(&self, chat: &dyn Chatter) -> Result<(), DomainError> {
        if self.chat_id != chat.chat_id() {
            return Err(DomainError::UpdateNotFromChat);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    ForSender,
    ForAll,
}

impl DeleteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteMode::ForSender => "for_sender",
            DeleteMode::ForAll => "for_all",
        }
    }
}

/// Record hiding an update. `base.sender_id` is the acting user, not the
/// author of the deleted update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    pub base: UpdateBase,
    pub deleted_id: UpdateId,
    pub mode: DeleteMode,
}

impl Deletion {
    fn new(target: &UpdateBase, acting_user: UserId, mode: DeleteMode, clock: &dyn Clock) -> Self {
        Self {
            base: UpdateBase::new(target.chat_id, acting_user, clock),
            deleted_id: target.id,
            mode,
        }
    }

    pub fn acting_user(&self) -> UserId {
        self.base.sender_id
    }
}

/// Access to the shared header of a concrete update.
pub trait Updater {
    fn base(&self) -> &UpdateBase;

    fn base_mut(&mut self) -> &mut UpdateBase;

    fn deleted_for(&self, user: UserId) -> bool {
        self.base().deleted_for(user)
    }
}

macro_rules! impl_updater {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Updater for $ty {
                fn base(&self) -> &UpdateBase {
                    &self.base
                }

                fn base_mut(&mut self) -> &mut UpdateBase {
                    &mut self.base
                }
            }
        )+
    };
}

impl_updater!(
    Deletion,
    TextMessage,
    TextMessageEdited,
    FileMessage,
    Reaction,
    SecretUpdate,
);

/// A user-authored message that can be replied to and reacted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(TextMessage),
    File(FileMessage),
}

impl Message {
    pub fn delete(
        &self,
        chat: &dyn Chatter,
        sender: UserId,
        mode: DeleteMode,
        clock: &dyn Clock,
    ) -> Result<Deletion, DomainError> {
        self.base().delete(chat, sender, mode, clock)
    }
}

impl Updater for Message {
    fn base(&self) -> &UpdateBase {
        match self {
            Message::Text(m) => &m.base,
            Message::File(m) => &m.base,
        }
    }

    fn base_mut(&mut self) -> &mut UpdateBase {
        match self {
            Message::Text(m) => &mut m.base,
            Message::File(m) => &mut m.base,
        }
    }
}

/// Fails unless `target` can be referenced (replied to, reacted on) by `sender`
/// from `chat`.
pub(crate) fn validate_reference(
    chat: &dyn Chatter,
    sender: UserId,
    target: &UpdateBase,
) -> Result<(), DomainError> {
    target.ensure_from_chat(chat)?;
    if target.deleted_for(sender) {
        return Err(DomainError::UpdateDeleted);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    TextMessage,
    TextMessageEdited,
    FileMessage,
    Reaction,
    UpdateDeleted,
    SecretUpdate,
}

impl UpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::TextMessage => "text_message",
            UpdateType::TextMessageEdited => "text_message_edited",
            UpdateType::FileMessage => "file_message",
            UpdateType::Reaction => "reaction",
            UpdateType::UpdateDeleted => "update_deleted",
            UpdateType::SecretUpdate => "secret_update",
        }
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of update variants as stored in a chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyUpdate {
    TextMessage(TextMessage),
    TextMessageEdited(TextMessageEdited),
    FileMessage(FileMessage),
    Reaction(Reaction),
    Deletion(Deletion),
    SecretUpdate(SecretUpdate),
}

impl AnyUpdate {
    pub fn update_type(&self) -> UpdateType {
        match self {
            AnyUpdate::TextMessage(_) => UpdateType::TextMessage,
            AnyUpdate::TextMessageEdited(_) => UpdateType::TextMessageEdited,
            AnyUpdate::FileMessage(_) => UpdateType::FileMessage,
            AnyUpdate::Reaction(_) => UpdateType::Reaction,
            AnyUpdate::Deletion(_) => UpdateType::UpdateDeleted,
            AnyUpdate::SecretUpdate(_) => UpdateType::SecretUpdate,
        }
    }

    pub fn id(&self) -> UpdateId {
        self.base().id
    }

    pub fn is_message(&self) -> bool {
        matches!(self, AnyUpdate::TextMessage(_) | AnyUpdate::FileMessage(_))
    }

    /// Whether `viewer` currently sees this update.
    ///
    /// Deletion records made for the acting user alone are only shown to that
    /// user.
    pub fn visible_to(&self, viewer: UserId) -> bool {
        if self.base().deleted_for(viewer) {
            return false;
        }
        match self {
            AnyUpdate::Deletion(d) => d.mode == DeleteMode::ForAll || d.acting_user() == viewer,
            _ => true,
        }
    }

    pub fn into_message(self) -> Option<Message> {
        match self {
            AnyUpdate::TextMessage(m) => Some(Message::Text(m)),
            AnyUpdate::FileMessage(m) => Some(Message::File(m)),
            _ => None,
        }
    }
}

impl Updater for AnyUpdate {
    fn base(&self) -> &UpdateBase {
        match self {
            AnyUpdate::TextMessage(u) => &u.base,
            AnyUpdate::TextMessageEdited(u) => &u.base,
            AnyUpdate::FileMessage(u) => &u.base,
            AnyUpdate::Reaction(u) => &u.base,
            AnyUpdate::Deletion(u) => &u.base,
            AnyUpdate::SecretUpdate(u) => &u.base,
        }
    }

    fn base_mut(&mut self) -> &mut UpdateBase {
        match self {
            AnyUpdate::TextMessage(u) => &mut u.base,
            AnyUpdate::TextMessageEdited(u) => &mut u.base,
            AnyUpdate::FileMessage(u) => &mut u.base,
            AnyUpdate::Reaction(u) => &mut u.base,
            AnyUpdate::Deletion(u) => &mut u.base,
            AnyUpdate::SecretUpdate(u) => &mut u.base,
        }
    }
}

impl From<Message> for AnyUpdate {
    fn from(message: Message) -> Self {
        match message {
            Message::Text(m) => AnyUpdate::TextMessage(m),
            Message::File(m) => AnyUpdate::FileMessage(m),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::{Chatter, Clock, GroupChat, PersonalChat, SystemClock, UserId};

    pub struct Pair {
        pub chat: PersonalChat,
        pub a: UserId,
        pub b: UserId,
    }

    pub fn pair() -> Pair {
        let (a, b) = (UserId::new(), UserId::new());
        Pair {
            chat: PersonalChat::new(&SystemClock, [a, b]).unwrap(),
            a,
            b,
        }
    }

    pub fn group(clock: &dyn Clock, admin: UserId, members: &[UserId]) -> GroupChat {
        let mut all = vec![admin];
        all.extend_from_slice(members);
        let chat = GroupChat::new(clock, admin, all, "Team").unwrap();
        assert!(chat.is_member(admin));
        chat
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::pair;
    use super::*;
    use crate::domain::{SystemClock, TextMessage};

    fn stored_text(chat: &dyn Chatter, sender: UserId, id: u64) -> TextMessage {
        let mut msg = TextMessage::new(chat, sender, "hi", None, &SystemClock).unwrap();
        msg.base.id = UpdateId::new(id);
        msg
    }

    #[test]
    fn for_sender_deletion_hides_only_for_actor() {
        let p = pair();
        let mut msg = stored_text(&p.chat, p.a, 1);

        let deletion = msg.base.delete(&p.chat, p.a, DeleteMode::ForSender, &SystemClock).unwrap();
        assert_eq!(deletion.deleted_id, UpdateId::new(1));
        assert_eq!(deletion.acting_user(), p.a);
        msg.base.add_deletion(deletion);

        assert!(msg.deleted_for(p.a));
        assert!(!msg.deleted_for(p.b));
    }

    #[test]
    fn for_all_deletion_hides_for_everyone_and_is_author_only() {
        let p = pair();
        let mut msg = stored_text(&p.chat, p.a, 1);

        assert_eq!(
            msg.base.delete(&p.chat, p.b, DeleteMode::ForAll, &SystemClock),
            Err(DomainError::UserNotSender)
        );

        let deletion = msg.base.delete(&p.chat, p.a, DeleteMode::ForAll, &SystemClock).unwrap();
        msg.base.add_deletion(deletion);
        assert!(msg.deleted_for(p.a));
        assert!(msg.deleted_for(p.b));
    }

    #[test]
    fn deletion_log_is_append_only() {
        let p = pair();
        let mut msg = stored_text(&p.chat, p.a, 1);

        let for_b = msg.base.delete(&p.chat, p.b, DeleteMode::ForSender, &SystemClock).unwrap();
        msg.base.add_deletion(for_b.clone());
        msg.base.add_deletion(for_b);
        let for_all = msg.base.delete(&p.chat, p.a, DeleteMode::ForAll, &SystemClock).unwrap();
        msg.base.add_deletion(for_all);

        assert_eq!(msg.base.deletions.len(), 3);
        assert_eq!(msg.base.deletions[0].mode, DeleteMode::ForSender);
    }

    #[test]
    fn deleting_twice_for_self_fails() {
        let p = pair();
        let mut msg = stored_text(&p.chat, p.a, 1);
        let deletion = msg.base.delete(&p.chat, p.b, DeleteMode::ForSender, &SystemClock).unwrap();
        msg.base.add_deletion(deletion);

        assert_eq!(
            msg.base.delete(&p.chat, p.b, DeleteMode::ForSender, &SystemClock),
            Err(DomainError::UpdateDeleted)
        );
    }

    #[test]
    fn delete_requires_same_chat_and_send_rights() {
        let p = pair();
        let other = pair();
        let msg = stored_text(&p.chat, p.a, 1);

        assert_eq!(
            msg.base.delete(&other.chat, other.a, DeleteMode::ForSender, &SystemClock),
            Err(DomainError::UpdateNotFromChat)
        );

        let mut blocked = p.chat.clone();
        blocked.block_by(p.b).unwrap();
        assert_eq!(
            msg.base.delete(&blocked, p.a, DeleteMode::ForSender, &SystemClock),
            Err(DomainError::ChatBlocked)
        );
    }

    #[test]
    fn private_deletion_records_are_shown_to_actor_only() {
        let p = pair();
        let msg = stored_text(&p.chat, p.a, 1);
        let deletion = msg.base.delete(&p.chat, p.b, DeleteMode::ForSender, &SystemClock).unwrap();
        let record = AnyUpdate::Deletion(deletion);

        assert!(record.visible_to(p.b));
        assert!(!record.visible_to(p.a));
        assert_eq!(record.update_type().as_str(), "update_deleted");
    }
}
