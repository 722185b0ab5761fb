//! Persistence seams: transactions, repository traits and the in-process store.

pub mod memory;
pub mod repository;
pub mod tx;

pub use memory::MemoryStore;
pub use repository::{
    ChatRepository, ChatterRepository, FetchLastMode, FetchLastOptions, GenericChatRepository,
    GenericUpdateRepository, PairChatRepository, SecretUpdateRepository, UpdateRepository,
};
pub use tx::{finish_tx, Transaction, TransactionProvider};

use crate::domain::ChatId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("stale write to chat {chat_id}")]
    VersionConflict { chat_id: ChatId },

    #[error("transaction belongs to a different store")]
    ForeignTransaction,

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound)
    }
}
