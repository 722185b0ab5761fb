//! Orchestration services: one transaction per call, domain rules applied to
//! loaded aggregates, events published after commit.

pub mod chat;
pub mod common;
pub mod update;

pub use chat::{
    ChatLoadOptions, GenericChatService, GroupChatService, PersonalChatService,
    SecretGroupChatService, SecretPersonalChatService,
};
pub use common::{audience, ServiceContext};
pub use update::{
    GenericUpdateService, GroupUpdateService, PersonalUpdateService, SecretGroupUpdateService,
    SecretPersonalUpdateService,
};
