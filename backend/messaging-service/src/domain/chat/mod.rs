//! Chat aggregates and the capabilities they share.

mod group;
mod personal;
mod secret_group;
mod secret_personal;

pub use group::{GroupChat, GroupCore, MAX_DESCRIPTION_LEN, MAX_GROUP_NAME_LEN};
pub use personal::PersonalChat;
pub use secret_group::SecretGroupChat;
pub use secret_personal::SecretPersonalChat;

use super::{ChatId, Clock, DomainError, Timestamp, UserId};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity and bookkeeping common to every chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMeta {
    pub id: ChatId,
    pub created_at: Timestamp,
    /// Optimistic-concurrency token, bumped by storage on every update.
    pub version: u64,
}

impl ChatMeta {
    pub fn new(clock: &dyn Clock) -> Self {
        Self {
            id: ChatId::new(),
            created_at: clock.now(),
            version: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    Personal,
    Group,
    SecretPersonal,
    SecretGroup,
}

impl ChatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatType::Personal => "personal",
            ChatType::Group => "group",
            ChatType::SecretPersonal => "secret_personal",
            ChatType::SecretGroup => "secret_group",
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, ChatType::SecretPersonal | ChatType::SecretGroup)
    }
}

impl fmt::Display for ChatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(ChatType::Personal),
            "group" => Ok(ChatType::Group),
            "secret_personal" => Ok(ChatType::SecretPersonal),
            "secret_group" => Ok(ChatType::SecretGroup),
            other => Err(format!("unknown chat type: {other}")),
        }
    }
}

/// Capability every chat variant exposes. Decidable without I/O.
pub trait Chatter {
    fn meta(&self) -> &ChatMeta;

    fn meta_mut(&mut self) -> &mut ChatMeta;

    fn chat_type(&self) -> ChatType;

    fn members(&self) -> &[UserId];

    fn validate_can_send(&self, user: UserId) -> Result<(), DomainError>;

    fn chat_id(&self) -> ChatId {
        self.meta().id
    }

    fn is_member(&self, user: UserId) -> bool {
        self.members().contains(&user)
    }
}

pub trait SecretChatter: Chatter {
    /// `None` means secret updates never expire.
    fn expiration(&self) -> Option<Duration>;
}

/// Longest expiration a secret chat accepts.
pub const MAX_EXPIRATION_DAYS: i64 = 366;

/// An expiration must be positive and no longer than [`MAX_EXPIRATION_DAYS`].
pub fn validate_expiration(expiration: Option<Duration>) -> Result<(), DomainError> {
    match expiration {
        Some(ttl) if ttl <= Duration::zero() || ttl > Duration::days(MAX_EXPIRATION_DAYS) => {
            Err(DomainError::InvalidExpiration)
        }
        _ => Ok(()),
    }
}

/// Two-member chats: personal and secret personal.
pub trait PairChatter: Chatter + Sized {
    fn new_pair(clock: &dyn Clock, members: [UserId; 2]) -> Result<Self, DomainError>;

    fn pair(&self) -> [UserId; 2];

    /// Either member may delete a two-member chat.
    fn delete(&self, sender: UserId) -> Result<(), DomainError> {
        if !self.is_member(sender) {
            return Err(DomainError::UserNotMember);
        }
        Ok(())
    }
}

/// Admin-governed chats: group and secret group.
///
/// Every mutator requires `sender` to be the admin.
pub trait GroupChatter: Chatter + Sized {
    fn new_group(
        clock: &dyn Clock,
        admin: UserId,
        members: Vec<UserId>,
        name: &str,
    ) -> Result<Self, DomainError>;

    fn core(&self) -> &GroupCore;

    fn core_mut(&mut self) -> &mut GroupCore;

    fn admin(&self) -> UserId {
        self.core().admin
    }

    fn update_info(
        &mut self,
        sender: UserId,
        name: &str,
        description: &str,
    ) -> Result<(), DomainError> {
        self.core_mut().update_info(sender, name, description)
    }

    fn update_photo(&mut self, sender: UserId, photo: super::Url) -> Result<(), DomainError> {
        self.core_mut().update_photo(sender, photo)
    }

    fn delete_photo(&mut self, sender: UserId) -> Result<(), DomainError> {
        self.core_mut().delete_photo(sender)
    }

    fn add_member(&mut self, sender: UserId, member: UserId) -> Result<(), DomainError> {
        self.core_mut().add_member(sender, member)
    }

    fn delete_member(&mut self, sender: UserId, member: UserId) -> Result<(), DomainError> {
        self.core_mut().delete_member(sender, member)
    }

    fn delete(&self, sender: UserId) -> Result<(), DomainError> {
        self.core().ensure_admin(sender)
    }
}

/// Closed set of chat variants, used wherever the concrete type is only
/// known at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chat {
    Personal(PersonalChat),
    Group(GroupChat),
    SecretPersonal(SecretPersonalChat),
    SecretGroup(SecretGroupChat),
}

impl Chat {
    /// Expiration of secret updates, `None` for non-secret chats.
    pub fn expiration(&self) -> Option<Duration> {
        match self {
            Chat::SecretPersonal(chat) => chat.expiration(),
            Chat::SecretGroup(chat) => chat.expiration(),
            Chat::Personal(_) | Chat::Group(_) => None,
        }
    }
}

impl Chatter for Chat {
    fn meta(&self) -> &ChatMeta {
        match self {
            Chat::Personal(chat) => chat.meta(),
            Chat::Group(chat) => chat.meta(),
            Chat::SecretPersonal(chat) => chat.meta(),
            Chat::SecretGroup(chat) => chat.meta(),
        }
    }

    fn meta_mut(&mut self) -> &mut ChatMeta {
        match self {
            Chat::Personal(chat) => chat.meta_mut(),
            Chat::Group(chat) => chat.meta_mut(),
            Chat::SecretPersonal(chat) => chat.meta_mut(),
            Chat::SecretGroup(chat) => chat.meta_mut(),
        }
    }

    fn chat_type(&self) -> ChatType {
        match self {
            Chat::Personal(_) => ChatType::Personal,
            Chat::Group(_) => ChatType::Group,
            Chat::SecretPersonal(_) => ChatType::SecretPersonal,
            Chat::SecretGroup(_) => ChatType::SecretGroup,
        }
    }

    fn members(&self) -> &[UserId] {
        match self {
            Chat::Personal(chat) => chat.members(),
            Chat::Group(chat) => chat.members(),
            Chat::SecretPersonal(chat) => chat.members(),
            Chat::SecretGroup(chat) => chat.members(),
        }
    }

    fn validate_can_send(&self, user: UserId) -> Result<(), DomainError> {
        match self {
            Chat::Personal(chat) => chat.validate_can_send(user),
            Chat::Group(chat) => chat.validate_can_send(user),
            Chat::SecretPersonal(chat) => chat.validate_can_send(user),
            Chat::SecretGroup(chat) => chat.validate_can_send(user),
        }
    }
}

impl From<PersonalChat> for Chat {
    fn from(chat: PersonalChat) -> Self {
        Chat::Personal(chat)
    }
}

impl From<GroupChat> for Chat {
    fn from(chat: GroupChat) -> Self {
        Chat::Group(chat)
    }
}

impl From<SecretPersonalChat> for Chat {
    fn from(chat: SecretPersonalChat) -> Self {
        Chat::SecretPersonal(chat)
    }
}

impl From<SecretGroupChat> for Chat {
    fn from(chat: SecretGroupChat) -> Self {
        Chat::SecretGroup(chat)
    }
}

pub(crate) fn normalize_members(members: Vec<UserId>) -> Vec<UserId> {
    let mut normalized = Vec::with_capacity(members.len());
    for member in members {
        if !normalized.contains(&member) {
            normalized.push(member);
        }
    }
    normalized
}
