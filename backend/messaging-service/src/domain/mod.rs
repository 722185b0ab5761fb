//! Chat & update domain model.
//!
//! Everything in this module is synchronous and free of I/O. Constructors and
//! mutators validate authorization and content rules and either return the new
//! state or a [`DomainError`]; persistence and publishing live in the service
//! layer.

pub mod chat;
pub mod clock;
pub mod errors;
pub mod update;
pub mod value;

pub use chat::{
    Chat, ChatMeta, ChatType, Chatter, GroupChat, GroupChatter, GroupCore, PairChatter,
    PersonalChat, SecretChatter, SecretGroupChat, SecretPersonalChat, MAX_EXPIRATION_DAYS,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::DomainError;
pub use update::{
    AnyUpdate, DeleteMode, Deletion, FileMessage, FileMeta, Message, Reaction, ReactionType,
    SecretData, SecretUpdate, TextMessage, TextMessageEdited, UpdateBase, UpdateType, Updater,
};
pub use value::{ChatId, FileId, SecretKeyId, Timestamp, UpdateId, Url, UserId};
